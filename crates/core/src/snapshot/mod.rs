//! Aggregate snapshot: domain model and the single-writer cache.

mod snapshot_cache;
mod snapshot_model;

pub use snapshot_cache::{ReplaceOutcome, SnapshotCache};
pub use snapshot_model::{
    AcquirerFigures, ReceiptRow, ReconciliationStatus, SaleRow, Snapshot, SnapshotDetail,
};
