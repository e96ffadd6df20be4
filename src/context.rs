use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use lugabiz_core::context::{AppConfig, AppConfigExt, BackgroundTasks, NotificationPermission};
use lugabiz_core::location::AnyLocationProvider;
use lugabiz_core::overpass::{OverpassClient, PoiCache};
use lugabiz_core::pipeline::{PipelineHandle, PipelineService};
use lugabiz_core::proximity::{AnyNotificationSink, NotifierStatus, ProximityNotification};
use lugabiz_core::system_clock;
use tokio::sync::{Mutex, RwLock, watch};

use crate::repl::PROMPT;

const APP_DISPLAY_NAME: &str = "Lugabiz";
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// Which concrete backends the pipeline was built with
#[derive(Debug, Clone)]
pub struct Backends {
    pub location: &'static str,
    pub notifications: &'static str,
    pub overpass_endpoint: String,
}

/// Holds all shared state for the interactive shell.
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<RwLock<AppConfig>>,
    pub pipeline: PipelineHandle,
    pub tasks: Arc<Mutex<BackgroundTasks>>,
    pub cache: Arc<PoiCache>,
    pub backends: Backends,
}

impl AppContext {
    /// Build the backends from `config` and spawn the pipeline
    pub fn start(config: AppConfig) -> Result<Self, String> {
        let clock = system_clock();
        let provider = AnyLocationProvider::from_config(&config.location, Arc::clone(&clock));
        let client = OverpassClient::new(&config.overpass).map_err(|e| e.to_string())?;
        let sink = AnyNotificationSink::from_settings(&config.notifications, APP_DISPLAY_NAME)
            .with_click_handler(Arc::new(bring_to_front));

        let backends = Backends {
            location: provider.backend_name(),
            notifications: sink.backend_name(),
            overpass_endpoint: client.endpoint().to_string(),
        };
        tracing::info!(
            location = backends.location,
            notifications = backends.notifications,
            endpoint = %backends.overpass_endpoint,
            "Starting pipeline"
        );

        let cache = Arc::new(PoiCache::new());
        let (service, pipeline) = PipelineService::new(
            Arc::new(provider),
            Arc::new(client),
            Arc::new(sink),
            Arc::clone(&cache),
            clock,
            &config,
        );

        let config = Arc::new(RwLock::new(config));
        let tasks = BackgroundTasks {
            pipeline: Some(tokio::spawn(service.run())),
            permission_sync: Some(tokio::spawn(sync_permission(
                pipeline.status_rx.clone(),
                Arc::clone(&config),
            ))),
        };

        Ok(Self {
            config,
            pipeline,
            tasks: Arc::new(Mutex::new(tasks)),
            cache,
            backends,
        })
    }

    /// Stop the pipeline, giving it a moment to tear down cleanly
    pub async fn shutdown(&self) {
        if let Err(err) = self.pipeline.shutdown().await {
            tracing::debug!(error = %err, "Pipeline already stopped");
        }

        let mut tasks = self.tasks.lock().await;
        if let Some(mut handle) = tasks.pipeline.take() {
            if tokio::time::timeout(SHUTDOWN_GRACE, &mut handle).await.is_err() {
                tracing::warn!("Pipeline did not stop in time");
                handle.abort();
            }
        }
        tasks.abort_all();
    }
}

/// A clicked notification surfaces the place in the shell
fn bring_to_front(notification: &ProximityNotification) {
    let mut stdout = std::io::stdout();
    let _ = writeln!(stdout, "\n{}\n{}", notification.title, notification.body);
    let _ = write!(stdout, "{}", PROMPT);
    let _ = stdout.flush();
}

/// Persist the notification permission decision so a denial is not re-asked
async fn sync_permission(
    mut status_rx: watch::Receiver<NotifierStatus>,
    config: Arc<RwLock<AppConfig>>,
) {
    while status_rx.changed().await.is_ok() {
        let status = status_rx.borrow_and_update().clone();
        let permission = if status.permission_granted {
            NotificationPermission::Granted
        } else if status.permission_denied {
            NotificationPermission::Denied
        } else {
            continue;
        };

        let mut config = config.write().await;
        if !config.remember_permission(permission) {
            continue;
        }
        match config.save() {
            Ok(()) => tracing::info!(?permission, "Remembered notification permission"),
            Err(err) => tracing::warn!(error = %err, "Failed to save notification permission"),
        }
    }
}
