//! # DraftSync Engine
//!
//! Draft/cloud synchronization and conflict-resolution engine.
//!
//! This crate provides:
//! - Reconciliation between the local draft and the remote document
//! - Sync state machine (idle → dirty → syncing → synced / queued / errored)
//! - Coalescing offline mutation queue with in-order replay
//! - Save-trigger orchestration (explicit save, debounced autosave,
//!   unload-safety save)
//! - Remote store abstraction with a mock for testing
//!
//! ## Architecture
//!
//! The engine keeps two independently writable replicas of one document
//! reconciled without a central lock: the local draft store is the fast,
//! synchronous cache written on **every** persist call, and the remote store
//! is the asynchronous, fallible authority. Conflict resolution is
//! whole-document last-writer-wins by timestamp.
//!
//! ## Key Invariants
//!
//! - Every persist writes the local draft before attempting the remote store
//! - The unload-safety path never awaits and never enters the state machine
//! - `queued_changes > 0` implies the status is `Queued` or `Syncing`
//! - Queued mutations replay strictly in insertion order
//! - The winning snapshot is adopted verbatim — no field-level merge

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod env;
mod error;
mod queue;
mod reconcile;
mod remote;
mod session;
mod state;

pub use config::EngineConfig;
pub use env::{
    AuthProvider, ConnectivityProvider, CooldownNotifier, Environment, FailureNotifier,
    LogNotifier, RecordingNotifier, StaticAuth, ToggleConnectivity,
};
pub use error::{SyncError, SyncResult};
pub use queue::{OfflineQueue, QueuedMutation};
pub use reconcile::{reconcile, Reconciled, ReplicaSource};
pub use remote::{MockRemoteStore, RemoteStore};
pub use session::{DraftSyncEngine, FlushOutcome, LoadedSession, SaveOutcome};
pub use state::{SyncState, SyncStats, SyncStatus};
