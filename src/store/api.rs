//! Public API for the store

pub use crate::store::directory::DirectoryStore;
pub use crate::store::error::{StoreError, StoreResult};
pub use crate::store::memory::{FailPoint, MemoryStore, ALWAYS};
pub use crate::store::traits::{
    derive_job_id, RawResult, RawResultSource, ScanJobSource, SnapshotStore,
};
