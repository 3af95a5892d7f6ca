//! # stencil-sync
//!
//! Reconciliation between generated artifacts and the blueprint containers
//! that produced them.
//!
//! - [`hasher`] — SHA-256 content hashes
//! - [`container`] — load / edit / save blueprint containers
//! - [`reconcile`] — classify tracked artifacts and fold edits back (`sync_all`)
//! - [`tracker`] — `make`, `rm_temp`, and transfer into curated containers
//! - [`registry`] — rebuild and verify the aggregate command registry
//! - [`diff`] — unified diff preview of pending syncs
//! - [`formatter`] — optional external formatter pass

pub mod container;
pub mod diff;
pub mod error;
pub mod formatter;
pub mod hasher;
pub mod reconcile;
pub mod registry;
pub mod tracker;

pub use container::{Container, DeleteOutcome, Placement, SaveOutcome, WriteOutcome};
pub use diff::{diff_all, diff_artifact, LiteralDiff};
pub use error::{ErrorKind, SyncError};
pub use reconcile::{
    classify, status, sync_all, ArtifactOutcome, ArtifactState, StatusEntry, SyncOptions,
    SyncReport,
};
pub use tracker::{make, rm_temp, transfer, MakeOutcome, RmTempOutcome, TransferOutcome};
