//! Shared fixtures for monitor tests

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;

use crate::model::api::{AssetKind, JobStatus, JobStatusReport, ScanJob, ToolId};
use crate::monitor::api::{FollowUpError, FollowUpHandler, MonitorManager, MonitorState};
use crate::notifications::api::{detached_bus, Event, EventFilter, EventReceiver};
use crate::store::api::MemoryStore;

pub struct Fixture {
    pub store: Arc<MemoryStore>,
    pub manager: MonitorManager,
    pub events: EventReceiver,
}

pub async fn fixture() -> Fixture {
    let store = Arc::new(MemoryStore::new());
    let bus = detached_bus();
    let events = bus.lock().await.subscribe(
        "monitor-test".to_string(),
        EventFilter::MonitorOnly,
        "test:monitor".to_string(),
    );
    let manager = MonitorManager::new(store.clone(), bus);
    Fixture {
        store,
        manager,
        events,
    }
}

pub fn pending_job(store: &MemoryStore, target: &str, tool: ToolId, job_id: &str) {
    store
        .record_job(ScanJob::new(job_id, target, tool, Utc::now()))
        .unwrap();
}

pub fn report(status: JobStatus, result: Option<&str>) -> JobStatusReport {
    JobStatusReport {
        status,
        result: result.map(str::to_string),
        error: None,
    }
}

/// States carried by `StateChanged` events, in arrival order
pub fn state_changes(events: &mut EventReceiver) -> Vec<MonitorState> {
    let mut states = Vec::new();
    while let Ok(event) = events.try_recv() {
        if let Event::Monitor(event) = event {
            if event.event_type == crate::notifications::api::MonitorEventType::StateChanged {
                states.push(event.state);
            }
        }
    }
    states
}

/// Follow-up handler that records its calls and optionally fails
#[derive(Default)]
pub struct RecordingFollowUp {
    pub calls: Mutex<Vec<(String, ToolId, Vec<AssetKind>)>>,
    pub fail: bool,
}

#[async_trait]
impl FollowUpHandler for RecordingFollowUp {
    async fn on_success(
        &self,
        target_id: &str,
        tool: ToolId,
        kinds: &[AssetKind],
    ) -> Result<(), FollowUpError> {
        self.calls
            .lock()
            .unwrap()
            .push((target_id.to_string(), tool, kinds.to_vec()));
        if self.fail {
            return Err("consolidation unavailable".into());
        }
        Ok(())
    }
}
