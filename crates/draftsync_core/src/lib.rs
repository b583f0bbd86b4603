//! # DraftSync Core
//!
//! Data model for the DraftSync engine.
//!
//! This crate provides:
//! - Dynamic field values and document snapshots
//! - Draft and remote document records with typed identifiers
//! - Millisecond timestamps and a clock abstraction
//!
//! ## Key Invariants
//!
//! - A snapshot is an atomic blob: replicas replace it wholesale, never
//!   merge it field by field
//! - `DraftKey` with no document id denotes the never-persisted-remotely
//!   draft (the sentinel key for crash recovery)
//! - Timestamps are totally ordered and compared for last-writer-wins

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod record;
mod snapshot;
mod time;
mod value;

pub use record::{DocumentId, DocumentType, DraftKey, DraftRecord, OwnerId, RemoteDocument};
pub use snapshot::DocumentSnapshot;
pub use time::{Clock, ManualClock, SystemClock, Timestamp};
pub use value::FieldValue;
