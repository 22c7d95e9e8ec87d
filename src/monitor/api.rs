//! Public API for the Scan Lifecycle Monitor

pub use crate::monitor::error::{MonitorError, MonitorResult};
pub use crate::monitor::follow_up::{FollowUpError, FollowUpHandler};
pub use crate::monitor::manager::{
    LaunchOutcome, MonitorManager, MonitorStart, PollOutcome, PollSchedule,
};
pub use crate::monitor::state::{LifecycleTracker, MonitorState, Observation};
