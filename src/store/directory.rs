//! Directory-backed store
//!
//! Layout under the root:
//!
//! ```text
//! <target>/jobs/<tool>.json   job history, oldest first
//! <target>/snapshot.json      consolidated snapshot
//! <target>/edges.json         discovery edges whose parent is <target>
//! ```
//!
//! Job files are written by whatever schedules the tools; this store only appends new
//! `pending` jobs. Every write goes to a temporary file that is then renamed over the
//! destination.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, trace};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::fs;

use crate::core::time::{SystemTimeProvider, TimeProvider};
use crate::core::validation::validate_target_id;
use crate::model::api::{
    ConsolidatedSnapshot, DiscoveryEdge, JobStatusReport, ScanJob, ScanParams, ToolId,
};
use crate::store::error::{StoreError, StoreResult};
use crate::store::traits::{
    derive_job_id, latest_job, latest_success, RawResult, RawResultSource, ScanJobSource,
    SnapshotStore,
};

const SNAPSHOT_FILE: &str = "snapshot.json";
const EDGES_FILE: &str = "edges.json";
const JOBS_DIR: &str = "jobs";

pub struct DirectoryStore {
    root: PathBuf,
    time: Arc<dyn TimeProvider>,
}

impl DirectoryStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_time_provider(root, Arc::new(SystemTimeProvider))
    }

    pub fn with_time_provider(root: impl Into<PathBuf>, time: Arc<dyn TimeProvider>) -> Self {
        Self {
            root: root.into(),
            time,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn target_dir(&self, target_id: &str) -> StoreResult<PathBuf> {
        validate_target_id(target_id)?;
        Ok(self.root.join(target_id))
    }

    fn jobs_path(&self, target_id: &str, tool: ToolId) -> StoreResult<PathBuf> {
        Ok(self
            .target_dir(target_id)?
            .join(JOBS_DIR)
            .join(format!("{tool}.json")))
    }

    async fn read_jobs(&self, target_id: &str, tool: ToolId) -> StoreResult<Vec<ScanJob>> {
        let path = self.jobs_path(target_id, tool)?;
        Ok(read_json(&path).await?.unwrap_or_default())
    }

    /// Insert or replace (by job id) a job in its pair's history
    pub async fn record_job(&self, job: ScanJob) -> StoreResult<()> {
        let path = self.jobs_path(&job.target_id, job.tool)?;
        let mut history: Vec<ScanJob> = read_json(&path).await?.unwrap_or_default();
        match history.iter_mut().find(|existing| existing.job_id == job.job_id) {
            Some(existing) => *existing = job,
            None => history.push(job),
        }
        write_json_atomic(&path, &history).await
    }

    pub async fn add_discovery_edge(&self, edge: DiscoveryEdge) -> StoreResult<()> {
        validate_target_id(&edge.child_target)?;
        let path = self.target_dir(&edge.parent_target)?.join(EDGES_FILE);
        let mut edges: Vec<DiscoveryEdge> = read_json(&path).await?.unwrap_or_default();
        if !edges.contains(&edge) {
            edges.push(edge);
        }
        write_json_atomic(&path, &edges).await
    }

    /// Every job file under the root, for lookups by job id
    async fn all_job_files(&self) -> StoreResult<Vec<PathBuf>> {
        let mut files = Vec::new();
        let mut targets = match fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(files),
            Err(e) => return Err(StoreError::io(&self.root, e)),
        };
        while let Some(target) = targets
            .next_entry()
            .await
            .map_err(|e| StoreError::io(&self.root, e))?
        {
            let jobs_dir = target.path().join(JOBS_DIR);
            let Ok(mut entries) = fs::read_dir(&jobs_dir).await else {
                continue;
            };
            while let Some(entry) = entries
                .next_entry()
                .await
                .map_err(|e| StoreError::io(&jobs_dir, e))?
            {
                let path = entry.path();
                if path.extension().is_some_and(|ext| ext == "json") {
                    files.push(path);
                }
            }
        }
        files.sort();
        Ok(files)
    }
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> StoreResult<Option<T>> {
    let text = match fs::read_to_string(path).await {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            trace!("No file at {}", path.display());
            return Ok(None);
        }
        Err(e) => return Err(StoreError::io(path, e)),
    };
    serde_json::from_str(&text)
        .map(Some)
        .map_err(|source| StoreError::Decode {
            path: path.to_path_buf(),
            source,
        })
}

async fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> StoreResult<()> {
    let json = serde_json::to_string_pretty(value).map_err(|source| StoreError::Encode {
        what: path.display().to_string(),
        source,
    })?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| StoreError::io(parent, e))?;
    }

    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let temp = path.with_file_name(format!(".{file_name}.{}.tmp", std::process::id()));
    fs::write(&temp, json)
        .await
        .map_err(|e| StoreError::io(&temp, e))?;
    if let Err(e) = fs::rename(&temp, path).await {
        let _ = fs::remove_file(&temp).await;
        return Err(StoreError::io(path, e));
    }
    debug!("Wrote {}", path.display());
    Ok(())
}

#[async_trait]
impl ScanJobSource for DirectoryStore {
    async fn latest_scan_job(&self, target_id: &str, tool: ToolId) -> StoreResult<Option<ScanJob>> {
        Ok(latest_job(&self.read_jobs(target_id, tool).await?).cloned())
    }

    async fn scan_job_status(&self, job_id: &str) -> StoreResult<JobStatusReport> {
        for path in self.all_job_files().await? {
            let history: Vec<ScanJob> = read_json(&path).await?.unwrap_or_default();
            if let Some(job) = history.iter().find(|job| job.job_id == job_id) {
                return Ok(job.report());
            }
        }
        Err(StoreError::JobNotFound {
            job_id: job_id.to_string(),
        })
    }

    async fn start_scan_job(
        &self,
        target_id: &str,
        tool: ToolId,
        _params: &ScanParams,
    ) -> StoreResult<String> {
        let created_at = self.time.utc_now();
        let stamp = created_at.to_rfc3339_opts(chrono::SecondsFormat::Nanos, true);
        let job_id = derive_job_id(target_id, tool, &stamp);
        self.record_job(ScanJob::new(job_id.clone(), target_id, tool, created_at))
            .await?;
        Ok(job_id)
    }
}

#[async_trait]
impl RawResultSource for DirectoryStore {
    async fn read_raw_result(
        &self,
        target_id: &str,
        tool: ToolId,
    ) -> StoreResult<Option<RawResult>> {
        Ok(latest_success(&self.read_jobs(target_id, tool).await?))
    }
}

#[async_trait]
impl SnapshotStore for DirectoryStore {
    async fn write_snapshot(&self, snapshot: ConsolidatedSnapshot) -> StoreResult<()> {
        let path = self.target_dir(&snapshot.target_id)?.join(SNAPSHOT_FILE);
        write_json_atomic(&path, &snapshot).await
    }

    async fn read_snapshot(&self, target_id: &str) -> StoreResult<Option<Arc<ConsolidatedSnapshot>>> {
        let path = self.target_dir(target_id)?.join(SNAPSHOT_FILE);
        Ok(read_json(&path).await?.map(Arc::new))
    }

    async fn discovery_edges(&self, target_id: &str) -> StoreResult<Vec<DiscoveryEdge>> {
        let path = self.target_dir(target_id)?.join(EDGES_FILE);
        let edges: Vec<DiscoveryEdge> = read_json(&path).await?.unwrap_or_default();
        Ok(edges
            .into_iter()
            .filter(|edge| edge.parent_target == target_id)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::api::JobStatus;
    use tempfile::TempDir;

    fn store() -> (TempDir, DirectoryStore) {
        let dir = TempDir::new().unwrap();
        let store = DirectoryStore::new(dir.path());
        (dir, store)
    }

    #[tokio::test]
    async fn test_start_job_appends_pending() {
        let (dir, store) = store();
        let job_id = store
            .start_scan_job("acme", ToolId::Httpx, &ScanParams::new())
            .await
            .unwrap();
        assert!(job_id.starts_with("job-"));
        assert!(dir.path().join("acme/jobs/httpx.json").exists());

        let latest = store.latest_scan_job("acme", ToolId::Httpx).await.unwrap().unwrap();
        assert_eq!(latest.job_id, job_id);
        assert_eq!(latest.status, JobStatus::Pending);
        assert_eq!(store.scan_job_status(&job_id).await.unwrap().status, JobStatus::Pending);
    }

    #[tokio::test]
    async fn test_missing_files_read_as_empty() {
        let (_dir, store) = store();
        assert!(store.latest_scan_job("acme", ToolId::Ctl).await.unwrap().is_none());
        assert!(store.read_raw_result("acme", ToolId::Ctl).await.unwrap().is_none());
        assert!(store.read_snapshot("acme").await.unwrap().is_none());
        assert!(store.discovery_edges("acme").await.unwrap().is_empty());
        assert!(matches!(
            store.scan_job_status("job-000000000000").await,
            Err(StoreError::JobNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_record_job_replaces_by_id() {
        let (_dir, store) = store();
        let job = ScanJob::new("job-1", "acme", ToolId::Ctl, chrono::Utc::now());
        store.record_job(job.clone()).await.unwrap();
        store
            .record_job(job.with_status(JobStatus::Success).with_result("a.example.com"))
            .await
            .unwrap();

        let raw = store.read_raw_result("acme", ToolId::Ctl).await.unwrap().unwrap();
        assert_eq!(raw.payload, "a.example.com");
        assert_eq!(store.read_jobs("acme", ToolId::Ctl).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_latest_ignores_job_file_order() {
        let (_dir, store) = store();
        let now = chrono::Utc::now();
        let newer = ScanJob::new("job-new", "acme", ToolId::Ctl, now)
            .with_status(JobStatus::Success)
            .with_result("new.example.com");
        let older = ScanJob::new("job-old", "acme", ToolId::Ctl, now - chrono::Duration::hours(1))
            .with_status(JobStatus::Success)
            .with_result("old.example.com");
        store.record_job(newer).await.unwrap();
        store.record_job(older).await.unwrap();

        let latest = store.latest_scan_job("acme", ToolId::Ctl).await.unwrap().unwrap();
        assert_eq!(latest.job_id, "job-new");
        let raw = store.read_raw_result("acme", ToolId::Ctl).await.unwrap().unwrap();
        assert_eq!(raw.job_id, "job-new");
    }

    #[tokio::test]
    async fn test_target_ids_cannot_escape_root() {
        let (_dir, store) = store();
        let err = store.latest_scan_job("../etc", ToolId::Ctl).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidTarget(_)));
    }

    #[tokio::test]
    async fn test_corrupt_job_file_is_a_decode_error() {
        let (dir, store) = store();
        std::fs::create_dir_all(dir.path().join("acme/jobs")).unwrap();
        std::fs::write(dir.path().join("acme/jobs/ctl.json"), "{not json").unwrap();
        let err = store.latest_scan_job("acme", ToolId::Ctl).await.unwrap_err();
        assert!(matches!(err, StoreError::Decode { .. }));
    }

    #[tokio::test]
    async fn test_edges_round_trip() {
        let (_dir, store) = store();
        let edge = DiscoveryEdge {
            child_target: "acme-wild".to_string(),
            parent_target: "acme".to_string(),
        };
        store.add_discovery_edge(edge.clone()).await.unwrap();
        store.add_discovery_edge(edge.clone()).await.unwrap();
        assert_eq!(store.discovery_edges("acme").await.unwrap(), vec![edge]);
    }
}
