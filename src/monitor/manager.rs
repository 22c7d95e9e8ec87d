//! Monitor Manager
//!
//! One generic poller per (target, tool) pair, parameterized by the tool's registry entry.
//! A per-pair liveness flag keeps a second launch from spawning a duplicate poller.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use log::{debug, info, warn};
use tokio::task::JoinHandle;
use tokio::time::sleep;

use crate::core::sync::handle_mutex_poison;
use crate::model::api::{ScanParams, ToolId};
use crate::monitor::error::{MonitorError, MonitorResult};
use crate::monitor::follow_up::FollowUpHandler;
use crate::monitor::state::{LifecycleTracker, MonitorState, Observation};
use crate::notifications::api::{
    publish_event, Event, MonitorEvent, MonitorEventType, NotificationBus,
};
use crate::registry::api::{tool_spec, FollowUp, ToolSpec};
use crate::store::api::ScanJobSource;

type PairKey = (String, ToolId);

fn pair(target_id: &str, tool: ToolId) -> PairKey {
    (target_id.to_string(), tool)
}

/// Poll interval overrides on top of the registry's per-tool intervals
///
/// Precedence: per-tool override, then the global override, then the registry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollSchedule {
    pub default_interval: Option<Duration>,
    pub intervals: HashMap<ToolId, Duration>,
}

impl PollSchedule {
    pub fn interval_for(&self, spec: &ToolSpec) -> Duration {
        self.intervals
            .get(&spec.tool)
            .copied()
            .or(self.default_interval)
            .unwrap_or(spec.poll_interval)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorStart {
    Spawned,
    /// A monitor was already running for the pair and is reused
    AlreadyActive,
}

/// Result of a single poll cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollOutcome {
    pub state: MonitorState,
    pub job_id: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchOutcome {
    /// Id of the job this call started; `None` when an active monitor was reused
    pub job_id: Option<String>,
    pub start: MonitorStart,
}

/// State shared between the manager and its polling tasks
#[derive(Clone)]
struct Poller {
    jobs: Arc<dyn ScanJobSource>,
    follow_up: Option<Arc<dyn FollowUpHandler>>,
    bus: NotificationBus,
    states: Arc<RwLock<HashMap<PairKey, MonitorState>>>,
    active: Arc<Mutex<HashSet<PairKey>>>,
}

impl Poller {
    async fn publish(
        &self,
        event_type: MonitorEventType,
        target_id: &str,
        tool: ToolId,
        state: MonitorState,
        message: Option<String>,
    ) {
        let event = match message {
            Some(message) => MonitorEvent::with_message(
                event_type,
                target_id.to_string(),
                tool,
                state,
                message,
            ),
            None => MonitorEvent::new(event_type, target_id.to_string(), tool, state),
        };
        publish_event(&self.bus, Event::Monitor(event)).await;
    }

    fn current_state(&self, target_id: &str, tool: ToolId) -> MonitorState {
        self.states
            .read()
            .ok()
            .and_then(|states| states.get(&pair(target_id, tool)).copied())
            .unwrap_or_default()
    }

    async fn set_state(&self, target_id: &str, tool: ToolId, state: MonitorState) {
        let previous = match self.states.write() {
            Ok(mut states) => states
                .insert(pair(target_id, tool), state)
                .unwrap_or_default(),
            Err(_) => MonitorState::default(),
        };
        if previous != state {
            info!("{target_id}/{tool}: {previous} -> {state}");
            self.publish(MonitorEventType::StateChanged, target_id, tool, state, None)
                .await;
        }
    }

    /// One status query and its bookkeeping
    ///
    /// The first cycle for a tracker looks up the pair's latest job; later cycles refresh
    /// that job's status.
    async fn cycle(
        &self,
        target_id: &str,
        tool: ToolId,
        tracker: &mut LifecycleTracker,
    ) -> PollOutcome {
        debug!("Polling {target_id}/{tool}");
        let observed = match tracker.job_id().map(str::to_string) {
            None => match self.jobs.latest_scan_job(target_id, tool).await {
                Ok(Some(job)) => Ok((job.job_id, job.status)),
                Ok(None) => {
                    self.set_state(target_id, tool, MonitorState::NotStarted)
                        .await;
                    return PollOutcome {
                        state: MonitorState::NotStarted,
                        job_id: None,
                        error: None,
                    };
                }
                Err(source) => Err(source),
            },
            Some(job_id) => self
                .jobs
                .scan_job_status(&job_id)
                .await
                .map(|report| (job_id, report.status)),
        };

        let (job_id, status) = match observed {
            Ok(observed) => observed,
            Err(source) => {
                let error = MonitorError::TransientQuery {
                    target_id: target_id.to_string(),
                    tool,
                    source,
                };
                warn!("{error}; monitor stopped until triggered again");
                self.set_state(target_id, tool, MonitorState::Inactive).await;
                self.publish(
                    MonitorEventType::QueryFailed,
                    target_id,
                    tool,
                    MonitorState::Inactive,
                    Some(error.to_string()),
                )
                .await;
                return PollOutcome {
                    state: MonitorState::Inactive,
                    job_id: tracker.job_id().map(str::to_string),
                    error: Some(error.to_string()),
                };
            }
        };

        match tracker.observe(&job_id, status) {
            Observation::Regressed => warn!(
                "Ignoring status {status} for job {job_id} ({target_id}/{tool}); already {}",
                tracker.current().map(|s| s.to_string()).unwrap_or_default()
            ),
            Observation::Unchanged => debug!("{target_id}/{tool}: still {status}"),
            Observation::Advanced | Observation::NewJob => {}
        }

        let state = tracker
            .current()
            .map(MonitorState::from)
            .unwrap_or_default();
        self.set_state(target_id, tool, state).await;
        PollOutcome {
            state,
            job_id: Some(job_id),
            error: None,
        }
    }

    async fn run_follow_up(&self, target_id: &str, tool: ToolId, follow_up: FollowUp) {
        let FollowUp::Consolidate(kinds) = follow_up else {
            return;
        };
        let Some(handler) = &self.follow_up else {
            debug!("No follow-up handler registered for {target_id}/{tool}");
            return;
        };
        info!("{target_id}/{tool} succeeded; running {follow_up}");
        if let Err(e) = handler.on_success(target_id, tool, kinds).await {
            warn!("Follow-up for {target_id}/{tool} failed: {e}");
            self.publish(
                MonitorEventType::FollowUpFailed,
                target_id,
                tool,
                MonitorState::Success,
                Some(e.to_string()),
            )
            .await;
        }
    }

    async fn run(
        self,
        target_id: String,
        tool: ToolId,
        interval: Duration,
        follow_up: FollowUp,
    ) -> MonitorState {
        self.publish(
            MonitorEventType::Started,
            &target_id,
            tool,
            self.current_state(&target_id, tool),
            None,
        )
        .await;

        let mut tracker = LifecycleTracker::default();
        let state = loop {
            let outcome = self.cycle(&target_id, tool, &mut tracker).await;
            if outcome.state.is_final() {
                break outcome.state;
            }
            sleep(interval).await;
        };

        if state == MonitorState::Success {
            self.run_follow_up(&target_id, tool, follow_up).await;
        }

        if let Ok(mut active) = self.active.lock() {
            active.remove(&pair(&target_id, tool));
        }
        self.publish(MonitorEventType::Stopped, &target_id, tool, state, None)
            .await;
        state
    }
}

pub struct MonitorManager {
    poller: Poller,
    schedule: PollSchedule,
    tasks: Mutex<HashMap<PairKey, JoinHandle<MonitorState>>>,
    retired: Mutex<Vec<JoinHandle<MonitorState>>>,
}

impl MonitorManager {
    pub fn new(jobs: Arc<dyn ScanJobSource>, bus: NotificationBus) -> Self {
        Self {
            poller: Poller {
                jobs,
                follow_up: None,
                bus,
                states: Arc::new(RwLock::new(HashMap::new())),
                active: Arc::new(Mutex::new(HashSet::new())),
            },
            schedule: PollSchedule::default(),
            tasks: Mutex::new(HashMap::new()),
            retired: Mutex::new(Vec::new()),
        }
    }

    pub fn with_follow_up(mut self, handler: Arc<dyn FollowUpHandler>) -> Self {
        self.poller.follow_up = Some(handler);
        self
    }

    pub fn with_schedule(mut self, schedule: PollSchedule) -> Self {
        self.schedule = schedule;
        self
    }

    /// Claim the pair's liveness flag; false if a monitor already holds it
    fn reserve(&self, key: &PairKey) -> MonitorResult<bool> {
        let mut active = handle_mutex_poison(self.poller.active.lock(), MonitorError::Internal)?;
        Ok(active.insert(key.clone()))
    }

    fn release(&self, key: &PairKey) {
        if let Ok(mut active) = self.poller.active.lock() {
            active.remove(key);
        }
    }

    /// Spawn and register while holding `tasks`; a displaced running handle is kept for `shutdown`
    fn spawn_reserved(&self, key: PairKey, spec: &ToolSpec) -> MonitorResult<()> {
        let interval = self.schedule.interval_for(spec);
        let mut tasks = handle_mutex_poison(self.tasks.lock(), MonitorError::Internal)?;
        debug!("Spawning monitor for {}/{} every {interval:?}", key.0, key.1);
        let poller = self.poller.clone();
        let handle = tokio::spawn(poller.run(key.0.clone(), key.1, interval, spec.follow_up));

        if let Some(previous) = tasks.insert(key, handle) {
            // Released its flag but is still publishing `Stopped`
            if !previous.is_finished() {
                let mut retired =
                    handle_mutex_poison(self.retired.lock(), MonitorError::Internal)?;
                retired.retain(|handle| !handle.is_finished());
                retired.push(previous);
            }
        }
        Ok(())
    }

    /// Start polling the pair unless a monitor is already active for it
    pub fn start_monitor(&self, target_id: &str, tool: ToolId) -> MonitorResult<MonitorStart> {
        let spec = tool_spec(tool)?;
        let key = pair(target_id, tool);
        if !self.reserve(&key)? {
            debug!("Monitor for {target_id}/{tool} already active");
            return Ok(MonitorStart::AlreadyActive);
        }
        if let Err(e) = self.spawn_reserved(key.clone(), spec) {
            self.release(&key);
            return Err(e);
        }
        Ok(MonitorStart::Spawned)
    }

    /// A single fresh status check for the pair, with no follow-up
    pub async fn poll_once(&self, target_id: &str, tool: ToolId) -> PollOutcome {
        let mut tracker = LifecycleTracker::default();
        self.poller.cycle(target_id, tool, &mut tracker).await
    }

    /// Start a scan job for the pair and monitor it
    ///
    /// When a monitor is already active for the pair no job is started; the existing
    /// monitor is reused.
    pub async fn launch_scan(
        &self,
        target_id: &str,
        tool: ToolId,
        params: &ScanParams,
    ) -> MonitorResult<LaunchOutcome> {
        let spec = tool_spec(tool)?;
        let key = pair(target_id, tool);
        if !self.reserve(&key)? {
            info!("{target_id}/{tool} is already being monitored; not starting another job");
            return Ok(LaunchOutcome {
                job_id: None,
                start: MonitorStart::AlreadyActive,
            });
        }

        let job_id = match self.poller.jobs.start_scan_job(target_id, tool, params).await {
            Ok(job_id) => job_id,
            Err(source) => {
                self.release(&key);
                return Err(MonitorError::Launch {
                    target_id: target_id.to_string(),
                    tool,
                    source,
                });
            }
        };
        info!("Started {tool} job {job_id} for {target_id}");

        if let Err(e) = self.spawn_reserved(key.clone(), spec) {
            self.release(&key);
            return Err(e);
        }
        Ok(LaunchOutcome {
            job_id: Some(job_id),
            start: MonitorStart::Spawned,
        })
    }

    pub fn state(&self, target_id: &str, tool: ToolId) -> MonitorState {
        self.poller.current_state(target_id, tool)
    }

    /// Known states for every tool of the target, in tool order
    pub fn states_for_target(&self, target_id: &str) -> Vec<(ToolId, MonitorState)> {
        let mut states: Vec<(ToolId, MonitorState)> = self
            .poller
            .states
            .read()
            .map(|states| {
                states
                    .iter()
                    .filter(|((target, _), _)| target == target_id)
                    .map(|((_, tool), state)| (*tool, *state))
                    .collect()
            })
            .unwrap_or_default();
        states.sort_by_key(|(tool, _)| *tool);
        states
    }

    pub fn is_active(&self, target_id: &str, tool: ToolId) -> bool {
        self.poller
            .active
            .lock()
            .map(|active| active.contains(&pair(target_id, tool)))
            .unwrap_or(false)
    }

    /// Wait for the pair's monitor to stop and return its final state
    ///
    /// Returns the last known state when no monitor task exists.
    pub async fn wait_for_terminal(
        &self,
        target_id: &str,
        tool: ToolId,
    ) -> MonitorResult<MonitorState> {
        let handle = {
            let mut tasks = handle_mutex_poison(self.tasks.lock(), MonitorError::Internal)?;
            tasks.remove(&pair(target_id, tool))
        };
        match handle {
            Some(handle) => handle.await.map_err(|e| MonitorError::TaskFailed {
                target_id: target_id.to_string(),
                tool,
                reason: e.to_string(),
            }),
            None => Ok(self.state(target_id, tool)),
        }
    }

    /// Abort every poller and clear the liveness flags
    pub fn shutdown(&self) {
        if let Ok(mut tasks) = self.tasks.lock() {
            for ((target_id, tool), handle) in tasks.drain() {
                if !handle.is_finished() {
                    debug!("Aborting monitor for {target_id}/{tool}");
                }
                handle.abort();
            }
        }
        if let Ok(mut retired) = self.retired.lock() {
            retired.drain(..).for_each(|handle| handle.abort());
        }
        if let Ok(mut active) = self.poller.active.lock() {
            active.clear();
        }
    }
}

impl Drop for MonitorManager {
    fn drop(&mut self) {
        self.shutdown();
    }
}
