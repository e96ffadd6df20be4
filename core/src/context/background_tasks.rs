use tokio::task::JoinHandle;

/// Long-running tasks owned by the running application
#[derive(Default)]
pub struct BackgroundTasks {
    pub pipeline: Option<JoinHandle<()>>,
    pub permission_sync: Option<JoinHandle<()>>,
}

impl BackgroundTasks {
    pub fn abort_all(&mut self) {
        if let Some(handle) = self.permission_sync.take() {
            handle.abort();
        }
        if let Some(handle) = self.pipeline.take() {
            handle.abort();
        }
    }
}

impl Drop for BackgroundTasks {
    fn drop(&mut self) {
        self.abort_all();
    }
}
