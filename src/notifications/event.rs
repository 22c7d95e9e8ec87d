//! Event types for the notification bus

use std::time::SystemTime;

use crate::model::api::ToolId;
use crate::monitor::api::MonitorState;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MonitorEventType {
    Started,
    StateChanged,
    QueryFailed,
    FollowUpFailed,
    Stopped,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConsolidationEventType {
    Started,
    SourceSkipped,
    Completed,
    Failed,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SystemEventType {
    Startup,
    Shutdown,
}

/// A lifecycle transition of one (target, tool) monitor
#[derive(Clone, Debug)]
pub struct MonitorEvent {
    pub event_type: MonitorEventType,
    pub timestamp: SystemTime,
    pub target_id: String,
    pub tool: ToolId,
    pub state: MonitorState,
    pub message: Option<String>,
}

impl MonitorEvent {
    pub fn new(
        event_type: MonitorEventType,
        target_id: String,
        tool: ToolId,
        state: MonitorState,
    ) -> Self {
        Self {
            event_type,
            timestamp: SystemTime::now(),
            target_id,
            tool,
            state,
            message: None,
        }
    }

    pub fn with_message(
        event_type: MonitorEventType,
        target_id: String,
        tool: ToolId,
        state: MonitorState,
        message: String,
    ) -> Self {
        Self {
            message: Some(message),
            ..Self::new(event_type, target_id, tool, state)
        }
    }
}

#[derive(Clone, Debug)]
pub struct ConsolidationEvent {
    pub event_type: ConsolidationEventType,
    pub timestamp: SystemTime,
    pub target_id: String,
    pub message: Option<String>,
}

impl ConsolidationEvent {
    pub fn new(event_type: ConsolidationEventType, target_id: String) -> Self {
        Self {
            event_type,
            timestamp: SystemTime::now(),
            target_id,
            message: None,
        }
    }

    pub fn with_message(
        event_type: ConsolidationEventType,
        target_id: String,
        message: String,
    ) -> Self {
        Self {
            event_type,
            timestamp: SystemTime::now(),
            target_id,
            message: Some(message),
        }
    }
}

#[derive(Clone, Debug)]
pub struct SystemEvent {
    pub event_type: SystemEventType,
    pub timestamp: SystemTime,
    pub message: Option<String>,
}

impl SystemEvent {
    pub fn new(event_type: SystemEventType) -> Self {
        Self {
            event_type,
            timestamp: SystemTime::now(),
            message: None,
        }
    }

    pub fn with_message(event_type: SystemEventType, message: String) -> Self {
        Self {
            event_type,
            timestamp: SystemTime::now(),
            message: Some(message),
        }
    }
}

/// Unified event enum that encompasses all event types
#[derive(Clone, Debug)]
pub enum Event {
    Monitor(MonitorEvent),
    Consolidation(ConsolidationEvent),
    System(SystemEvent),
}

impl Event {
    pub fn category(&self) -> &'static str {
        match self {
            Event::Monitor(_) => "Monitor",
            Event::Consolidation(_) => "Consolidation",
            Event::System(_) => "System",
        }
    }

    /// Target the event concerns, if any
    pub fn target_id(&self) -> Option<&str> {
        match self {
            Event::Monitor(e) => Some(&e.target_id),
            Event::Consolidation(e) => Some(&e.target_id),
            Event::System(_) => None,
        }
    }
}

/// Event filtering options for subscribers
#[derive(Clone, Debug, PartialEq)]
pub enum EventFilter {
    MonitorOnly,
    ConsolidationOnly,
    SystemOnly,
    MonitorAndConsolidation,
    /// Monitor and consolidation events for one target
    Target(String),
    All,
}

impl EventFilter {
    /// Check if an event should be accepted by this filter
    pub fn accepts(&self, event: &Event) -> bool {
        match (self, event) {
            (EventFilter::Target(target), event) => event.target_id() == Some(target.as_str()),
            _ => matches!(
                (self, event),
                (EventFilter::MonitorOnly, Event::Monitor(_))
                    | (EventFilter::ConsolidationOnly, Event::Consolidation(_))
                    | (EventFilter::SystemOnly, Event::System(_))
                    | (EventFilter::MonitorAndConsolidation, Event::Monitor(_))
                    | (EventFilter::MonitorAndConsolidation, Event::Consolidation(_))
                    | (EventFilter::All, _)
            ),
        }
    }
}
