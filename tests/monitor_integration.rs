//! Monitor and consolidation wired together
//!
//! A successful job should hand its tool's kinds to the consolidation engine before the
//! monitor stops.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use surfacewatch::consolidation::api::Consolidator;
use surfacewatch::model::api::{AssetKind, JobStatus, JobStatusReport, ScanJob, ScanParams, ToolId};
use surfacewatch::monitor::api::{MonitorManager, MonitorStart, MonitorState, PollSchedule};
use surfacewatch::notifications::api::{
    detached_bus, ConsolidationEventType, Event, EventFilter, MonitorEventType,
};
use surfacewatch::store::api::MemoryStore;

fn report(status: JobStatus, result: Option<&str>) -> JobStatusReport {
    JobStatusReport {
        status,
        result: result.map(str::to_string),
        error: None,
    }
}

#[tokio::test(start_paused = true)]
async fn test_success_triggers_consolidation() {
    let store = Arc::new(MemoryStore::new());
    let bus = detached_bus();
    let mut events = bus.lock().await.subscribe(
        "monitor-integration".to_string(),
        EventFilter::Target("acme".to_string()),
        "test".to_string(),
    );
    let consolidator = Arc::new(Consolidator::new(store.clone(), store.clone(), bus.clone()));
    let manager = MonitorManager::new(store.clone(), bus).with_follow_up(consolidator.clone());

    store
        .record_job(ScanJob::new("job-httpx", "acme", ToolId::Httpx, chrono::Utc::now()))
        .unwrap();
    store
        .script_statuses(
            "job-httpx",
            vec![
                report(JobStatus::Pending, None),
                report(JobStatus::Running, None),
                report(
                    JobStatus::Success,
                    Some(r#"{"url":"https://a.example.com","status_code":200}"#),
                ),
            ],
        )
        .unwrap();

    let started = Instant::now();
    assert_eq!(
        manager.start_monitor("acme", ToolId::Httpx).unwrap(),
        MonitorStart::Spawned
    );
    let state = manager.wait_for_terminal("acme", ToolId::Httpx).await.unwrap();

    assert_eq!(state, MonitorState::Success);
    assert_eq!(started.elapsed(), Duration::from_secs(6));

    let snapshot = consolidator.snapshot("acme").await.unwrap().unwrap();
    assert_eq!(snapshot.kinds, vec![AssetKind::LiveWebServer]);
    assert_eq!(snapshot.assets_of(AssetKind::LiveWebServer).len(), 1);

    let mut transitions = Vec::new();
    let mut consolidated = false;
    while let Ok(event) = events.try_recv() {
        match event {
            Event::Monitor(e) if e.event_type == MonitorEventType::StateChanged => {
                transitions.push(e.state)
            }
            Event::Consolidation(e) if e.event_type == ConsolidationEventType::Completed => {
                consolidated = true
            }
            _ => {}
        }
    }
    assert_eq!(
        transitions,
        vec![MonitorState::Pending, MonitorState::Running, MonitorState::Success]
    );
    assert!(consolidated);
}

#[tokio::test(start_paused = true)]
async fn test_launch_uses_configured_interval() {
    let store = Arc::new(MemoryStore::new());
    let mut schedule = PollSchedule::default();
    schedule
        .intervals
        .insert(ToolId::Ctl, Duration::from_secs(1));
    let manager = MonitorManager::new(store.clone(), detached_bus()).with_schedule(schedule);

    let outcome = manager
        .launch_scan("acme", ToolId::Ctl, &ScanParams::new())
        .await
        .unwrap();
    let job_id = outcome.job_id.unwrap();
    store
        .script_statuses(
            &job_id,
            vec![
                report(JobStatus::Pending, None),
                report(JobStatus::Error, None),
            ],
        )
        .unwrap();

    let started = Instant::now();
    let state = manager.wait_for_terminal("acme", ToolId::Ctl).await.unwrap();
    assert_eq!(state, MonitorState::Error);
    assert_eq!(started.elapsed(), Duration::from_secs(1));
    assert_eq!(store.jobs_for("acme", ToolId::Ctl).len(), 1);
}
