//! Monitor states and the monotonic lifecycle tracker

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use crate::model::api::JobStatus;

/// What a monitor last knew about its (target, tool) pair
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MonitorState {
    /// No scan job exists for the pair
    #[default]
    NotStarted,
    Pending,
    Running,
    Success,
    Error,
    /// The status query failed; the monitor stopped until triggered again
    Inactive,
}

impl MonitorState {
    /// States after which a monitor stops polling
    pub fn is_final(&self) -> bool {
        matches!(
            self,
            MonitorState::NotStarted
                | MonitorState::Success
                | MonitorState::Error
                | MonitorState::Inactive
        )
    }
}

impl From<JobStatus> for MonitorState {
    fn from(status: JobStatus) -> Self {
        match status {
            JobStatus::Pending => MonitorState::Pending,
            JobStatus::Running => MonitorState::Running,
            JobStatus::Success => MonitorState::Success,
            JobStatus::Error => MonitorState::Error,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    /// First status seen, or a forward move
    Advanced,
    Unchanged,
    /// Backwards or out of a terminal state; ignored
    Regressed,
    /// A different job replaced the tracked one
    NewJob,
}

/// Status history of one job, which only ever moves forward
#[derive(Debug, Clone, Default)]
pub struct LifecycleTracker {
    job_id: Option<String>,
    observed: Vec<JobStatus>,
}

impl LifecycleTracker {
    pub fn job_id(&self) -> Option<&str> {
        self.job_id.as_deref()
    }

    pub fn current(&self) -> Option<JobStatus> {
        self.observed.last().copied()
    }

    /// Distinct statuses accepted so far, in order
    pub fn observed(&self) -> &[JobStatus] {
        &self.observed
    }

    pub fn observe(&mut self, job_id: &str, status: JobStatus) -> Observation {
        if self.job_id.as_deref() != Some(job_id) {
            let replaced = self.job_id.is_some();
            self.job_id = Some(job_id.to_string());
            self.observed = vec![status];
            return if replaced {
                Observation::NewJob
            } else {
                Observation::Advanced
            };
        }

        match self.current() {
            Some(last) if last == status => Observation::Unchanged,
            Some(last) if last.is_terminal() || status.rank() < last.rank() => {
                Observation::Regressed
            }
            _ => {
                self.observed.push(status);
                Observation::Advanced
            }
        }
    }
}
