//! Scan jobs as reported by the execution backend

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use crate::model::tool::ToolId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Running,
    Success,
    Error,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Success | JobStatus::Error)
    }

    /// Position in the lifecycle; terminal states share the top rank
    pub fn rank(&self) -> u8 {
        match self {
            JobStatus::Pending => 0,
            JobStatus::Running => 1,
            JobStatus::Success | JobStatus::Error => 2,
        }
    }
}

/// One invocation of one tool against one target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanJob {
    pub job_id: String,
    pub target_id: String,
    pub tool: ToolId,
    pub status: JobStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ScanJob {
    pub fn new(
        job_id: impl Into<String>,
        target_id: impl Into<String>,
        tool: ToolId,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            job_id: job_id.into(),
            target_id: target_id.into(),
            tool,
            status: JobStatus::Pending,
            result: None,
            created_at,
            completed_at: None,
            error: None,
        }
    }

    pub fn with_status(mut self, status: JobStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_result(mut self, result: impl Into<String>) -> Self {
        self.result = Some(result.into());
        self
    }

    pub fn report(&self) -> JobStatusReport {
        JobStatusReport {
            status: self.status,
            result: self.result.clone(),
            error: self.error.clone(),
        }
    }
}

/// Answer to a status query for a known job id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobStatusReport {
    pub status: JobStatus,
    pub result: Option<String>,
    pub error: Option<String>,
}

/// Parameters passed through to the execution backend when launching a tool
pub type ScanParams = serde_json::Map<String, serde_json::Value>;
