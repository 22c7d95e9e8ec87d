//! In-process store
//!
//! Backs tests and embedding callers that already hold job data in memory. Besides the
//! collaborator traits it offers hooks to record jobs, script the statuses a job reports on
//! successive queries, and inject failures per (target, tool).

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use async_trait::async_trait;

use crate::core::sync::{handle_mutex_poison, handle_rwlock_read, handle_rwlock_write};
use crate::core::time::{SystemTimeProvider, TimeProvider};
use crate::model::api::{
    ConsolidatedSnapshot, DiscoveryEdge, JobStatus, JobStatusReport, ScanJob, ScanParams, ToolId,
};
use crate::store::error::{StoreError, StoreResult};
use crate::store::traits::{
    derive_job_id, latest_job, latest_success, RawResult, RawResultSource, ScanJobSource,
    SnapshotStore,
};

/// Which collaborator call an injected failure applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailPoint {
    LatestJob,
    JobStatus,
    StartJob,
    RawResult,
}

/// Injected failures with this count never run out
pub const ALWAYS: usize = usize::MAX;

type PairKey = (String, ToolId);

pub struct MemoryStore {
    time: Arc<dyn TimeProvider>,
    jobs: RwLock<HashMap<PairKey, Vec<ScanJob>>>,
    scripts: Mutex<HashMap<String, VecDeque<JobStatusReport>>>,
    failures: Mutex<HashMap<(FailPoint, String, ToolId), usize>>,
    raw_reads: Mutex<HashMap<PairKey, usize>>,
    snapshots: RwLock<HashMap<String, Arc<ConsolidatedSnapshot>>>,
    edges: RwLock<Vec<DiscoveryEdge>>,
    fail_writes: AtomicBool,
    sequence: AtomicU64,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_time_provider(Arc::new(SystemTimeProvider))
    }

    pub fn with_time_provider(time: Arc<dyn TimeProvider>) -> Self {
        Self {
            time,
            jobs: RwLock::new(HashMap::new()),
            scripts: Mutex::new(HashMap::new()),
            failures: Mutex::new(HashMap::new()),
            raw_reads: Mutex::new(HashMap::new()),
            snapshots: RwLock::new(HashMap::new()),
            edges: RwLock::new(Vec::new()),
            fail_writes: AtomicBool::new(false),
            sequence: AtomicU64::new(0),
        }
    }

    /// Append a job to the pair's history; the last recorded job is the latest
    pub fn record_job(&self, job: ScanJob) -> StoreResult<()> {
        let mut jobs = handle_rwlock_write(self.jobs.write(), StoreError::Backend)?;
        jobs.entry((job.target_id.clone(), job.tool))
            .or_default()
            .push(job);
        Ok(())
    }

    /// Record a job that already finished successfully with `payload`
    pub fn record_success(&self, target_id: &str, tool: ToolId, payload: &str) -> StoreResult<String> {
        let now = self.time.utc_now();
        let job_id = self.next_job_id(target_id, tool);
        let mut job = ScanJob::new(job_id.clone(), target_id, tool, now)
            .with_status(JobStatus::Success)
            .with_result(payload);
        job.completed_at = Some(now);
        self.record_job(job)?;
        Ok(job_id)
    }

    /// Queue the reports `scan_job_status` returns for `job_id`, one per query
    ///
    /// Once the queue is drained the job keeps its last status.
    pub fn script_statuses(&self, job_id: &str, reports: Vec<JobStatusReport>) -> StoreResult<()> {
        let mut scripts = handle_mutex_poison(self.scripts.lock(), StoreError::Backend)?;
        scripts.entry(job_id.to_string()).or_default().extend(reports);
        Ok(())
    }

    /// Fail the next `times` calls of `point` for the pair
    pub fn inject_failure(&self, point: FailPoint, target_id: &str, tool: ToolId, times: usize) -> StoreResult<()> {
        let mut failures = handle_mutex_poison(self.failures.lock(), StoreError::Backend)?;
        failures.insert((point, target_id.to_string(), tool), times);
        Ok(())
    }

    pub fn fail_snapshot_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn add_discovery_edge(&self, edge: DiscoveryEdge) -> StoreResult<()> {
        let mut edges = handle_rwlock_write(self.edges.write(), StoreError::Backend)?;
        if !edges.contains(&edge) {
            edges.push(edge);
        }
        Ok(())
    }

    /// How many times `read_raw_result` was called for the pair
    pub fn raw_read_count(&self, target_id: &str, tool: ToolId) -> usize {
        self.raw_reads
            .lock()
            .ok()
            .and_then(|reads| reads.get(&(target_id.to_string(), tool)).copied())
            .unwrap_or(0)
    }

    pub fn jobs_for(&self, target_id: &str, tool: ToolId) -> Vec<ScanJob> {
        self.jobs
            .read()
            .ok()
            .and_then(|jobs| jobs.get(&(target_id.to_string(), tool)).cloned())
            .unwrap_or_default()
    }

    fn next_job_id(&self, target_id: &str, tool: ToolId) -> String {
        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst);
        let stamp = format!("{}#{sequence}", self.time.utc_now().to_rfc3339());
        derive_job_id(target_id, tool, &stamp)
    }

    fn check_failure(&self, point: FailPoint, target_id: &str, tool: ToolId) -> StoreResult<()> {
        let mut failures = handle_mutex_poison(self.failures.lock(), StoreError::Backend)?;
        let key = (point, target_id.to_string(), tool);
        match failures.get_mut(&key) {
            Some(remaining) if *remaining > 0 => {
                if *remaining != ALWAYS {
                    *remaining -= 1;
                }
                Err(StoreError::Backend(format!(
                    "injected {point:?} failure for {target_id}/{tool}"
                )))
            }
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl ScanJobSource for MemoryStore {
    async fn latest_scan_job(&self, target_id: &str, tool: ToolId) -> StoreResult<Option<ScanJob>> {
        self.check_failure(FailPoint::LatestJob, target_id, tool)?;
        let jobs = handle_rwlock_read(self.jobs.read(), StoreError::Backend)?;
        Ok(jobs
            .get(&(target_id.to_string(), tool))
            .and_then(|history| latest_job(history).cloned()))
    }

    async fn scan_job_status(&self, job_id: &str) -> StoreResult<JobStatusReport> {
        let pair = {
            let jobs = handle_rwlock_read(self.jobs.read(), StoreError::Backend)?;
            jobs.values()
                .flatten()
                .find(|job| job.job_id == job_id)
                .map(|job| (job.target_id.clone(), job.tool))
        };
        let (target_id, tool) = pair.ok_or_else(|| StoreError::JobNotFound {
            job_id: job_id.to_string(),
        })?;
        self.check_failure(FailPoint::JobStatus, &target_id, tool)?;

        let next = {
            let mut scripts = handle_mutex_poison(self.scripts.lock(), StoreError::Backend)?;
            scripts.get_mut(job_id).and_then(VecDeque::pop_front)
        };

        let now = self.time.utc_now();
        let mut jobs = handle_rwlock_write(self.jobs.write(), StoreError::Backend)?;
        let job = jobs
            .get_mut(&(target_id, tool))
            .and_then(|history| history.iter_mut().find(|job| job.job_id == job_id))
            .ok_or_else(|| StoreError::JobNotFound {
                job_id: job_id.to_string(),
            })?;

        if let Some(report) = next {
            job.status = report.status;
            if report.result.is_some() {
                job.result = report.result;
            }
            if report.error.is_some() {
                job.error = report.error;
            }
            if job.status.is_terminal() && job.completed_at.is_none() {
                job.completed_at = Some(now);
            }
        }
        Ok(job.report())
    }

    async fn start_scan_job(
        &self,
        target_id: &str,
        tool: ToolId,
        _params: &ScanParams,
    ) -> StoreResult<String> {
        self.check_failure(FailPoint::StartJob, target_id, tool)?;
        let job_id = self.next_job_id(target_id, tool);
        self.record_job(ScanJob::new(
            job_id.clone(),
            target_id,
            tool,
            self.time.utc_now(),
        ))?;
        Ok(job_id)
    }
}

#[async_trait]
impl RawResultSource for MemoryStore {
    async fn read_raw_result(
        &self,
        target_id: &str,
        tool: ToolId,
    ) -> StoreResult<Option<RawResult>> {
        {
            let mut reads = handle_mutex_poison(self.raw_reads.lock(), StoreError::Backend)?;
            *reads.entry((target_id.to_string(), tool)).or_default() += 1;
        }
        self.check_failure(FailPoint::RawResult, target_id, tool)?;

        let jobs = handle_rwlock_read(self.jobs.read(), StoreError::Backend)?;
        Ok(jobs
            .get(&(target_id.to_string(), tool))
            .and_then(|history| latest_success(history)))
    }
}

#[async_trait]
impl SnapshotStore for MemoryStore {
    async fn write_snapshot(&self, snapshot: ConsolidatedSnapshot) -> StoreResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Backend(format!(
                "injected snapshot write failure for {}",
                snapshot.target_id
            )));
        }
        let snapshot = Arc::new(snapshot);
        let mut snapshots = handle_rwlock_write(self.snapshots.write(), StoreError::Backend)?;
        snapshots.insert(snapshot.target_id.clone(), snapshot);
        Ok(())
    }

    async fn read_snapshot(&self, target_id: &str) -> StoreResult<Option<Arc<ConsolidatedSnapshot>>> {
        let snapshots = handle_rwlock_read(self.snapshots.read(), StoreError::Backend)?;
        Ok(snapshots.get(target_id).cloned())
    }

    async fn discovery_edges(&self, target_id: &str) -> StoreResult<Vec<DiscoveryEdge>> {
        let edges = handle_rwlock_read(self.edges.read(), StoreError::Backend)?;
        Ok(edges
            .iter()
            .filter(|edge| edge.parent_target == target_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    use crate::core::time::FixedTimeProvider;

    fn store() -> MemoryStore {
        let clock = FixedTimeProvider::new(Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap());
        MemoryStore::with_time_provider(Arc::new(clock))
    }

    fn report(status: JobStatus, result: Option<&str>) -> JobStatusReport {
        JobStatusReport {
            status,
            result: result.map(str::to_string),
            error: None,
        }
    }

    #[tokio::test]
    async fn test_latest_job_is_last_recorded() {
        let store = store();
        assert!(store.latest_scan_job("acme", ToolId::Ctl).await.unwrap().is_none());

        let first = store.start_scan_job("acme", ToolId::Ctl, &ScanParams::new()).await.unwrap();
        let second = store.start_scan_job("acme", ToolId::Ctl, &ScanParams::new()).await.unwrap();
        assert_ne!(first, second);

        let latest = store.latest_scan_job("acme", ToolId::Ctl).await.unwrap().unwrap();
        assert_eq!(latest.job_id, second);
        assert_eq!(latest.status, JobStatus::Pending);
    }

    #[tokio::test]
    async fn test_scripted_statuses_apply_to_job() {
        let store = store();
        let job_id = store.start_scan_job("acme", ToolId::Gau, &ScanParams::new()).await.unwrap();
        store
            .script_statuses(
                &job_id,
                vec![
                    report(JobStatus::Running, None),
                    report(JobStatus::Success, Some("a.example.com")),
                ],
            )
            .unwrap();

        assert!(store.read_raw_result("acme", ToolId::Gau).await.unwrap().is_none());
        assert_eq!(store.scan_job_status(&job_id).await.unwrap().status, JobStatus::Running);
        let done = store.scan_job_status(&job_id).await.unwrap();
        assert_eq!(done.status, JobStatus::Success);
        // Drained scripts leave the job where it ended
        assert_eq!(store.scan_job_status(&job_id).await.unwrap(), done);

        let raw = store.read_raw_result("acme", ToolId::Gau).await.unwrap().unwrap();
        assert_eq!(raw.job_id, job_id);
        assert_eq!(raw.payload, "a.example.com");
        assert!(store.jobs_for("acme", ToolId::Gau)[0].completed_at.is_some());
    }

    #[tokio::test]
    async fn test_unknown_job_status() {
        let err = store().scan_job_status("job-missing").await.unwrap_err();
        assert!(matches!(err, StoreError::JobNotFound { .. }));
    }

    #[tokio::test]
    async fn test_injected_failures_run_out() {
        let store = store();
        store.record_success("acme", ToolId::Ctl, "a.example.com").unwrap();
        store.inject_failure(FailPoint::RawResult, "acme", ToolId::Ctl, 1).unwrap();

        assert!(store.read_raw_result("acme", ToolId::Ctl).await.is_err());
        assert!(store.read_raw_result("acme", ToolId::Ctl).await.unwrap().is_some());
        assert_eq!(store.raw_read_count("acme", ToolId::Ctl), 2);

        store.inject_failure(FailPoint::LatestJob, "acme", ToolId::Ctl, ALWAYS).unwrap();
        for _ in 0..3 {
            assert!(store.latest_scan_job("acme", ToolId::Ctl).await.is_err());
        }
    }

    #[tokio::test]
    async fn test_raw_result_prefers_latest_success() {
        let store = store();
        store.record_success("acme", ToolId::Ctl, "old.example.com").unwrap();
        store.record_success("acme", ToolId::Ctl, "new.example.com").unwrap();
        let failed = ScanJob::new("job-failed", "acme", ToolId::Ctl, Utc::now())
            .with_status(JobStatus::Error);
        store.record_job(failed).unwrap();

        let raw = store.read_raw_result("acme", ToolId::Ctl).await.unwrap().unwrap();
        assert_eq!(raw.payload, "new.example.com");
    }

    #[tokio::test]
    async fn test_latest_ignores_recording_order() {
        let store = store();
        let now = Utc::now();
        store
            .record_job(
                ScanJob::new("job-new", "acme", ToolId::Ctl, now)
                    .with_status(JobStatus::Success)
                    .with_result("new.example.com"),
            )
            .unwrap();
        store
            .record_job(
                ScanJob::new("job-old", "acme", ToolId::Ctl, now - chrono::Duration::hours(1))
                    .with_status(JobStatus::Success)
                    .with_result("old.example.com"),
            )
            .unwrap();

        let latest = store.latest_scan_job("acme", ToolId::Ctl).await.unwrap().unwrap();
        assert_eq!(latest.job_id, "job-new");
        let raw = store.read_raw_result("acme", ToolId::Ctl).await.unwrap().unwrap();
        assert_eq!(raw.payload, "new.example.com");
    }

    #[tokio::test]
    async fn test_discovery_edges_by_parent() {
        let store = store();
        store
            .add_discovery_edge(DiscoveryEdge {
                child_target: "acme-wildcard".to_string(),
                parent_target: "acme".to_string(),
            })
            .unwrap();
        assert_eq!(store.discovery_edges("acme").await.unwrap().len(), 1);
        assert!(store.discovery_edges("acme-wildcard").await.unwrap().is_empty());
    }
}
