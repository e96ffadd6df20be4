//! Proximity notifications
//!
//! This module provides:
//! - **NotificationHistory**: cooldown and hourly rate-limit bookkeeping,
//!   with the pure [`can_notify`] decision
//! - **NotificationSink**: display backends (desktop, log)
//! - **ProximityNotifier**: throttled, non-reentrant evaluation of the
//!   closest eligible place

mod history;
mod notifier;
mod sink;


pub use history::{NotificationHistory, NotificationRecord, RATE_WINDOW_MS, can_notify};
pub use notifier::{CHECK_THROTTLE_MS, CheckOutcome, NotifierStatus, ProximityNotifier, closest_eligible};
pub use sink::{
    AUTO_CLOSE, AnyNotificationSink, ClickHandler, DEFAULT_ACTION, DesktopNotifier, LogNotifier,
    NOTIFICATION_BADGE, NOTIFICATION_ICON, NotificationSink, NotifyError, ProximityNotification,
    VIBRATE_PATTERN, handle_action, replace_id,
};
