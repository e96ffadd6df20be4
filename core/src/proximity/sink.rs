//! Notification display backends

use std::future::Future;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::Arc;
use std::time::Duration;

use lugabiz_types::{NotificationPermission, NotificationSettings};
use thiserror::Error;
use tokio::sync::oneshot;

use crate::places::PointOfInterest;

pub const NOTIFICATION_ICON: &str = "mark-location";
pub const NOTIFICATION_BADGE: &str = "lugabiz-badge";
pub const AUTO_CLOSE: Duration = Duration::from_secs(5);
pub const VIBRATE_PATTERN: [u32; 3] = [200, 100, 200];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotifyError {
    #[error("notifications are not supported on this device")]
    Unsupported,

    #[error("failed to display notification: {reason}")]
    Display { reason: String },
}

/// One "you are near X" alert
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProximityNotification {
    pub place_id: String,
    pub title: String,
    pub body: String,
    /// Platform coalescing key, unique per place
    pub tag: String,
    pub icon: &'static str,
    pub badge: &'static str,
    pub distance_m: u32,
    pub auto_close: Duration,
    pub vibrate: [u32; 3],
    pub require_interaction: bool,
    /// Clicking hands the notification to the sink's click handler
    pub focus_on_click: bool,
}

impl ProximityNotification {
    /// `None` for places without a name
    pub fn for_place(place: &PointOfInterest, distance_m: f64) -> Option<Self> {
        let name = place.name()?;
        let distance_m = distance_m.round().max(0.0) as u32;
        let emoji = place.category().emoji;

        Some(Self {
            place_id: place.place_id(),
            title: format!("{emoji} {name}"),
            body: format!("You're {distance_m} m from {name}. Stop by and take a look!"),
            tag: format!("place-{}", place.id),
            icon: NOTIFICATION_ICON,
            badge: NOTIFICATION_BADGE,
            distance_m,
            auto_close: AUTO_CLOSE,
            vibrate: VIBRATE_PATTERN,
            require_interaction: false,
            focus_on_click: true,
        })
    }
}

/// Platform notification capability
pub trait NotificationSink: Send + Sync + 'static {
    fn is_supported(&self) -> bool;

    /// Current decision without prompting
    fn permission(&self) -> NotificationPermission;

    fn request_permission(&self) -> impl Future<Output = NotificationPermission> + Send;

    fn show(
        &self,
        notification: &ProximityNotification,
    ) -> impl Future<Output = Result<(), NotifyError>> + Send;
}

// ─────────────────────────────────────────────────────────────────────────────
// Desktop
// ─────────────────────────────────────────────────────────────────────────────

/// Called with the notification the user clicked
pub type ClickHandler = Arc<dyn Fn(&ProximityNotification) + Send + Sync>;

/// Action key the notification server reports for a click on the body
pub const DEFAULT_ACTION: &str = "default";

/// System notifications through the desktop notification service
#[derive(Clone)]
pub struct DesktopNotifier {
    app_name: String,
    on_click: Option<ClickHandler>,
}

impl std::fmt::Debug for DesktopNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DesktopNotifier")
            .field("app_name", &self.app_name)
            .field("on_click", &self.on_click.is_some())
            .finish()
    }
}

impl DesktopNotifier {
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
            on_click: None,
        }
    }

    /// Run `handler` when a notification with `focus_on_click` is clicked.
    /// Only freedesktop servers report clicks back.
    pub fn with_click_handler(mut self, handler: ClickHandler) -> Self {
        self.on_click = Some(handler);
        self
    }
}

impl NotificationSink for DesktopNotifier {
    fn is_supported(&self) -> bool {
        true
    }

    // Desktop notification services do not prompt; the first request grants
    fn permission(&self) -> NotificationPermission {
        NotificationPermission::Default
    }

    async fn request_permission(&self) -> NotificationPermission {
        NotificationPermission::Granted
    }

    async fn show(&self, notification: &ProximityNotification) -> Result<(), NotifyError> {
        let app_name = self.app_name.clone();
        let on_click = self.on_click.clone().filter(|_| notification.focus_on_click);
        let notification = notification.clone();
        let (shown_tx, shown_rx) = oneshot::channel();

        // Blocks on D-Bus / the OS API, then on the click until the popup closes
        tokio::task::spawn_blocking(move || display(&app_name, &notification, on_click, shown_tx));

        shown_rx.await.map_err(|_| NotifyError::Display {
            reason: "notification task ended before showing".to_string(),
        })?
    }
}

fn display(
    app_name: &str,
    notification: &ProximityNotification,
    on_click: Option<ClickHandler>,
    shown: oneshot::Sender<Result<(), NotifyError>>,
) {
    let mut desktop = notify_rust::Notification::new();
    desktop
        .appname(app_name)
        .summary(&notification.title)
        .body(&notification.body)
        .icon(notification.icon)
        .timeout(notify_rust::Timeout::Milliseconds(
            notification.auto_close.as_millis() as u32,
        ));

    #[cfg(all(unix, not(target_os = "macos")))]
    {
        desktop.id(replace_id(&notification.tag));
        if on_click.is_some() {
            desktop.action(DEFAULT_ACTION, "Open");
        }
    }

    let handle = match desktop.show() {
        Ok(handle) => handle,
        Err(err) => {
            let _ = shown.send(Err(NotifyError::Display {
                reason: err.to_string(),
            }));
            return;
        }
    };
    let _ = shown.send(Ok(()));

    #[cfg(all(unix, not(target_os = "macos")))]
    {
        if let Some(on_click) = on_click {
            handle.wait_for_action(|action| {
                handle_action(action, notification, &on_click);
            });
        }
    }
    #[cfg(not(all(unix, not(target_os = "macos"))))]
    {
        // No click reporting from this platform's notification API
        let _ = (handle, on_click);
    }
}

/// Forward a reported action to the click handler; true if it was a click
pub fn handle_action(action: &str, notification: &ProximityNotification, on_click: &ClickHandler) -> bool {
    if action != DEFAULT_ACTION {
        tracing::debug!(tag = %notification.tag, action, "Notification closed without click");
        return false;
    }
    tracing::info!(tag = %notification.tag, "Notification clicked");
    on_click(notification);
    true
}

/// Stable per-process id so a repeated tag replaces the earlier popup
pub fn replace_id(tag: &str) -> u32 {
    let mut hasher = DefaultHasher::new();
    tag.hash(&mut hasher);
    // 0 asks the notification server for a new id
    (hasher.finish() as u32).max(1)
}

// ─────────────────────────────────────────────────────────────────────────────
// Headless
// ─────────────────────────────────────────────────────────────────────────────

/// Writes notifications to the log instead of the screen
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl NotificationSink for LogNotifier {
    fn is_supported(&self) -> bool {
        true
    }

    fn permission(&self) -> NotificationPermission {
        NotificationPermission::Granted
    }

    async fn request_permission(&self) -> NotificationPermission {
        NotificationPermission::Granted
    }

    async fn show(&self, notification: &ProximityNotification) -> Result<(), NotifyError> {
        tracing::info!(
            tag = %notification.tag,
            title = %notification.title,
            distance_m = notification.distance_m,
            "{}",
            notification.body
        );
        Ok(())
    }
}

/// Sink chosen at startup from the notification settings
#[derive(Debug, Clone)]
pub enum AnyNotificationSink {
    Desktop(DesktopNotifier),
    Log(LogNotifier),
    /// Notifications switched off in the settings
    Disabled,
}

impl AnyNotificationSink {
    pub fn from_settings(settings: &NotificationSettings, app_name: &str) -> Self {
        match (settings.enabled, settings.desktop) {
            (false, _) => Self::Disabled,
            (true, true) => Self::Desktop(DesktopNotifier::new(app_name)),
            (true, false) => Self::Log(LogNotifier),
        }
    }

    /// Attach a click handler to the desktop backend; other backends have no clicks
    pub fn with_click_handler(self, handler: ClickHandler) -> Self {
        match self {
            Self::Desktop(desktop) => Self::Desktop(desktop.with_click_handler(handler)),
            other => other,
        }
    }

    pub fn backend_name(&self) -> &'static str {
        match self {
            Self::Desktop(_) => "desktop",
            Self::Log(_) => "log",
            Self::Disabled => "disabled",
        }
    }
}

impl NotificationSink for AnyNotificationSink {
    fn is_supported(&self) -> bool {
        match self {
            Self::Desktop(s) => s.is_supported(),
            Self::Log(s) => s.is_supported(),
            Self::Disabled => false,
        }
    }

    fn permission(&self) -> NotificationPermission {
        match self {
            Self::Desktop(s) => s.permission(),
            Self::Log(s) => s.permission(),
            Self::Disabled => NotificationPermission::Default,
        }
    }

    async fn request_permission(&self) -> NotificationPermission {
        match self {
            Self::Desktop(s) => s.request_permission().await,
            Self::Log(s) => s.request_permission().await,
            Self::Disabled => NotificationPermission::Default,
        }
    }

    async fn show(&self, notification: &ProximityNotification) -> Result<(), NotifyError> {
        match self {
            Self::Desktop(s) => s.show(notification).await,
            Self::Log(s) => s.show(notification).await,
            Self::Disabled => Err(NotifyError::Unsupported),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn place(tags: &[(&str, &str)]) -> PointOfInterest {
        PointOfInterest {
            id: 42,
            lat: Some(4.6),
            lon: Some(-74.08),
            tags: Some(
                tags.iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            ),
        }
    }

    #[test]
    fn test_notification_fields() {
        let cafe = place(&[("name", "Café Quindío"), ("amenity", "cafe")]);
        let notification = ProximityNotification::for_place(&cafe, 63.4).unwrap();

        assert_eq!(notification.title, "☕ Café Quindío");
        assert_eq!(notification.tag, "place-42");
        assert_eq!(notification.place_id, "42");
        assert_eq!(notification.distance_m, 63);
        assert!(notification.body.contains("63 m"));
        assert!(notification.body.contains("Café Quindío"));
        assert_eq!(notification.auto_close, Duration::from_secs(5));
        assert_eq!(notification.vibrate, [200, 100, 200]);
        assert!(!notification.require_interaction);
        assert!(notification.focus_on_click);
    }

    #[test]
    fn test_unnamed_place_has_no_notification() {
        let unnamed = place(&[("amenity", "bar")]);
        assert!(ProximityNotification::for_place(&unnamed, 10.0).is_none());
    }

    #[test]
    fn test_replace_id_is_stable_and_nonzero() {
        assert_eq!(replace_id("place-42"), replace_id("place-42"));
        assert_ne!(replace_id("place-42"), 0);
    }

    #[test]
    fn test_click_action_reaches_handler() {
        use std::sync::Mutex;

        let cafe = place(&[("name", "Café Quindío"), ("amenity", "cafe")]);
        let notification = ProximityNotification::for_place(&cafe, 20.0).unwrap();
        let clicked = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&clicked);
        let handler: ClickHandler = Arc::new(move |n| sink.lock().unwrap().push(n.tag.clone()));

        assert!(!handle_action("__closed", &notification, &handler));
        assert!(clicked.lock().unwrap().is_empty());

        assert!(handle_action(DEFAULT_ACTION, &notification, &handler));
        assert_eq!(*clicked.lock().unwrap(), vec!["place-42"]);
    }

    #[test]
    fn test_click_handler_only_attaches_to_desktop() {
        let handler: ClickHandler = Arc::new(|_| {});
        let desktop = AnyNotificationSink::from_settings(&NotificationSettings::default(), "Lugabiz")
            .with_click_handler(Arc::clone(&handler));
        assert!(format!("{desktop:?}").contains("on_click: true"));

        let log = AnyNotificationSink::Log(LogNotifier).with_click_handler(handler);
        assert_eq!(log.backend_name(), "log");
    }

    #[test]
    fn test_sink_selection() {
        let mut settings = NotificationSettings::default();
        assert_eq!(AnyNotificationSink::from_settings(&settings, "Lugabiz").backend_name(), "desktop");

        settings.desktop = false;
        assert_eq!(AnyNotificationSink::from_settings(&settings, "Lugabiz").backend_name(), "log");

        settings.enabled = false;
        let sink = AnyNotificationSink::from_settings(&settings, "Lugabiz");
        assert_eq!(sink.backend_name(), "disabled");
        assert!(!sink.is_supported());
    }

    #[tokio::test]
    async fn test_log_notifier_always_shows() {
        let cafe = place(&[("name", "Café Quindío"), ("amenity", "cafe")]);
        let notification = ProximityNotification::for_place(&cafe, 12.0).unwrap();
        assert!(LogNotifier.permission().is_granted());
        assert_eq!(LogNotifier.show(&notification).await, Ok(()));
    }
}
