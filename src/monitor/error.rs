//! Monitor error types

use crate::core::error_handling::ContextualError;
use crate::model::api::ToolId;
use crate::registry::api::RegistryError;
use crate::store::api::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    /// The job-status collaborator could not be queried
    #[error("status query for {target_id}/{tool} failed: {source}")]
    TransientQuery {
        target_id: String,
        tool: ToolId,
        #[source]
        source: StoreError,
    },

    #[error("could not start a {tool} job for {target_id}: {source}")]
    Launch {
        target_id: String,
        tool: ToolId,
        #[source]
        source: StoreError,
    },

    #[error("monitor task for {target_id}/{tool} ended abnormally: {reason}")]
    TaskFailed {
        target_id: String,
        tool: ToolId,
        reason: String,
    },

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("monitor bookkeeping failed: {0}")]
    Internal(String),
}

impl ContextualError for MonitorError {
    fn is_user_actionable(&self) -> bool {
        match self {
            MonitorError::Launch { source, .. } => source.is_user_actionable(),
            _ => false,
        }
    }

    fn user_message(&self) -> Option<&str> {
        match self {
            MonitorError::Launch { source, .. } => source.user_message(),
            _ => None,
        }
    }
}

pub type MonitorResult<T> = Result<T, MonitorError>;
