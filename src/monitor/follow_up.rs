//! Hook invoked when a monitored job succeeds

use async_trait::async_trait;

use crate::model::api::{AssetKind, ToolId};

pub type FollowUpError = Box<dyn std::error::Error + Send + Sync>;

/// Receives `Consolidate(kinds)` follow-ups from monitors
#[async_trait]
pub trait FollowUpHandler: Send + Sync {
    async fn on_success(
        &self,
        target_id: &str,
        tool: ToolId,
        kinds: &[AssetKind],
    ) -> Result<(), FollowUpError>;
}
