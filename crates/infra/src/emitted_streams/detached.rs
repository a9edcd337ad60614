use std::future::Future;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// A best-effort write running on its own tokio task.
///
/// Dropping a `DetachedTask` does **not** cancel the work: the task keeps
/// running and its outcome is only ever logged. Awaiting [`DetachedTask::wait`]
/// is for callers that need to know the work has finished (tests, shutdown,
/// the end of a sweep).
#[derive(Debug, Default)]
pub struct DetachedTask {
    handle: Option<JoinHandle<()>>,
}

impl DetachedTask {
    /// Spawn `work` on the current tokio runtime.
    ///
    /// Outside a runtime nothing is spawned and the work is dropped with a
    /// warning.
    pub(crate) fn spawn<F>(label: &'static str, work: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        match Handle::try_current() {
            Ok(runtime) => Self {
                handle: Some(runtime.spawn(work)),
            },
            Err(_) => {
                tracing::warn!(task = label, "no tokio runtime; detached write dropped");
                Self::none()
            }
        }
    }

    /// A task that did nothing.
    pub fn none() -> Self {
        Self { handle: None }
    }

    /// True if no work was spawned.
    pub fn is_none(&self) -> bool {
        self.handle.is_none()
    }

    /// Wait for the work to finish. A panic inside the task is logged, not
    /// propagated.
    pub async fn wait(self) {
        if let Some(handle) = self.handle {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "detached task did not complete");
            }
        }
    }
}
