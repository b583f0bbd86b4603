//! # DraftSync Store
//!
//! Local draft persistence for the DraftSync engine.
//!
//! This crate provides:
//! - The synchronous [`DraftStore`] trait
//! - [`MemoryDraftStore`] for tests and ephemeral sessions
//! - [`FileDraftStore`] for durable, file-per-draft persistence
//!
//! ## Key Invariants
//!
//! - Every call is synchronous and never awaits anything — the unload-safety
//!   save path depends on this
//! - `save` stamps `last_modified` from the store clock at call time
//! - Quota exhaustion evicts the oldest draft under a *different* key before
//!   giving up
//! - One draft per key; saves overwrite, nothing is deleted automatically

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod file;
mod memory;
mod store;

pub use error::{StoreError, StoreResult};
pub use file::FileDraftStore;
pub use memory::MemoryDraftStore;
pub use store::DraftStore;
