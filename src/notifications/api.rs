//! Public API for the notification bus
//!
//! External modules should import from here rather than directly from internal modules.

use std::sync::{Arc, LazyLock};
use tokio::sync::Mutex;

pub use crate::notifications::error::{NotificationError, NotificationResult};
pub use crate::notifications::event::{
    ConsolidationEvent, ConsolidationEventType, Event, EventFilter, MonitorEvent,
    MonitorEventType, SystemEvent, SystemEventType,
};
pub use crate::notifications::manager::{AsyncNotificationManager, EventReceiver};

/// Shared handle components publish through
pub type NotificationBus = Arc<Mutex<AsyncNotificationManager>>;

/// Global notification service instance
static NOTIFICATION_SERVICE: LazyLock<NotificationBus> = LazyLock::new(|| {
    log::trace!("Initializing notification service");
    Arc::new(Mutex::new(AsyncNotificationManager::new()))
});

/// Access notification service
///
/// Returns a guard over the global notification service. Each call returns the same
/// shared instance.
///
/// # Examples
/// ```no_run
/// # use surfacewatch::notifications::api::{get_notification_service, Event, SystemEvent, SystemEventType};
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let mut manager = get_notification_service().await;
/// let event = Event::System(SystemEvent::new(SystemEventType::Startup));
/// manager.publish(event).await?;
/// # Ok(())
/// # }
/// ```
pub async fn get_notification_service() -> tokio::sync::MutexGuard<'static, AsyncNotificationManager>
{
    log::trace!("Acquiring notification service lock");
    NOTIFICATION_SERVICE.lock().await
}

/// Arc reference to the global service, for injecting into components
pub fn get_notification_service_arc() -> NotificationBus {
    NOTIFICATION_SERVICE.clone()
}

/// A bus with no connection to the global service
pub fn detached_bus() -> NotificationBus {
    Arc::new(Mutex::new(AsyncNotificationManager::new()))
}

/// Publish and swallow delivery failures; a dropped subscriber never fails the publisher
pub async fn publish_event(bus: &NotificationBus, event: Event) {
    if let Err(e) = bus.lock().await.publish(event).await {
        log::debug!("Notification delivery: {e}");
    }
}
