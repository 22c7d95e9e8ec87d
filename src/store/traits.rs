//! Collaborator contracts
//!
//! The job scheduler, raw result storage and snapshot storage are external to this crate;
//! these traits are the only way the monitor and the consolidation engine reach them.

use std::sync::Arc;

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use crate::model::api::{
    ConsolidatedSnapshot, DiscoveryEdge, JobStatus, JobStatusReport, ScanJob, ScanParams,
    ToolId,
};
use crate::store::error::StoreResult;

/// The payload of a tool's most recent successful job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResult {
    pub job_id: String,
    pub payload: String,
}

#[async_trait]
pub trait ScanJobSource: Send + Sync {
    /// Most recently created job for the pair, or `None` if the tool never ran
    async fn latest_scan_job(&self, target_id: &str, tool: ToolId) -> StoreResult<Option<ScanJob>>;

    async fn scan_job_status(&self, job_id: &str) -> StoreResult<JobStatusReport>;

    /// Enqueue a new job and return its id
    async fn start_scan_job(
        &self,
        target_id: &str,
        tool: ToolId,
        params: &ScanParams,
    ) -> StoreResult<String>;
}

#[async_trait]
pub trait RawResultSource: Send + Sync {
    async fn read_raw_result(&self, target_id: &str, tool: ToolId)
        -> StoreResult<Option<RawResult>>;
}

#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Replace the target's snapshot; readers see either the old or the new one
    async fn write_snapshot(&self, snapshot: ConsolidatedSnapshot) -> StoreResult<()>;

    async fn read_snapshot(&self, target_id: &str) -> StoreResult<Option<Arc<ConsolidatedSnapshot>>>;

    /// Edges whose parent is `target_id`
    async fn discovery_edges(&self, target_id: &str) -> StoreResult<Vec<DiscoveryEdge>>;
}

/// `job-` plus the first 12 hex digits of `sha256(target|tool|stamp)`
pub fn derive_job_id(target_id: &str, tool: ToolId, stamp: &str) -> String {
    let digest = Sha256::digest(format!("{target_id}|{tool}|{stamp}").as_bytes());
    let hex: String = digest.iter().take(6).map(|b| format!("{b:02x}")).collect();
    format!("job-{hex}")
}

/// Newest job by `created_at`; on a tie the one recorded later wins
pub fn latest_job(history: &[ScanJob]) -> Option<&ScanJob> {
    history.iter().max_by_key(|job| job.created_at)
}

/// Payload of the newest successful job by `created_at`
pub fn latest_success(history: &[ScanJob]) -> Option<RawResult> {
    history
        .iter()
        .filter(|job| job.status == JobStatus::Success)
        .max_by_key(|job| job.created_at)
        .and_then(|job| {
            job.result.as_ref().map(|payload| RawResult {
                job_id: job.job_id.clone(),
                payload: payload.clone(),
            })
        })
}
