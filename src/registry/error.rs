//! Registry error types

use crate::model::api::ToolId;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// The payload is non-empty but nothing in it matches the tool's registered shape
    #[error("malformed {tool} payload: {reason}")]
    MalformedPayload { tool: ToolId, reason: String },

    #[error("tool {tool} has no registry entry")]
    Unregistered { tool: ToolId },
}

impl crate::core::error_handling::ContextualError for RegistryError {
    fn is_user_actionable(&self) -> bool {
        false
    }

    fn user_message(&self) -> Option<&str> {
        None
    }
}

pub type RegistryResult<T> = Result<T, RegistryError>;
