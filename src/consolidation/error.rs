//! Consolidation error types
//!
//! Per-tool and per-record failures never surface here; they are recorded in the snapshot.
//! Only failures that would leave the stored snapshot wrong or incomplete are errors.

use crate::core::error_handling::ContextualError;
use crate::core::validation::ValidationError;
use crate::store::api::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum ConsolidationError {
    /// Persisting failed; the previous snapshot is still the stored one
    #[error("could not store snapshot for {target_id}: {source}")]
    StoreWrite {
        target_id: String,
        #[source]
        source: StoreError,
    },

    #[error("could not read snapshot for {target_id}: {source}")]
    SnapshotRead {
        target_id: String,
        #[source]
        source: StoreError,
    },

    #[error(transparent)]
    InvalidTarget(#[from] ValidationError),
}

impl ContextualError for ConsolidationError {
    fn is_user_actionable(&self) -> bool {
        match self {
            ConsolidationError::InvalidTarget(_) => true,
            ConsolidationError::StoreWrite { source, .. }
            | ConsolidationError::SnapshotRead { source, .. } => source.is_user_actionable(),
        }
    }

    fn user_message(&self) -> Option<&str> {
        match self {
            ConsolidationError::InvalidTarget(e) => Some(e.message()),
            _ => None,
        }
    }
}

pub type ConsolidationResult<T> = Result<T, ConsolidationError>;
