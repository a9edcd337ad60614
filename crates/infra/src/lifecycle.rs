//! Job teardown: what happens to a job's outputs when the job is deleted.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::emitted_streams::{EmittedStreamManager, ReclaimError, SweepReport};
use crate::log_store::LogStore;

/// Options of a job deletion request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeardownOptions {
    /// Delete every stream the job emitted to. Off by default: emitted
    /// streams usually outlive the job that produced them.
    pub delete_emitted_streams: bool,
}

impl TeardownOptions {
    pub fn delete_emitted_streams() -> Self {
        Self {
            delete_emitted_streams: true,
        }
    }

    pub fn keep_emitted_streams() -> Self {
        Self::default()
    }
}

/// Retires a job's emitted streams according to [`TeardownOptions`].
pub struct JobTeardown<S> {
    manager: Arc<EmittedStreamManager<S>>,
}

impl<S> JobTeardown<S>
where
    S: LogStore + 'static,
{
    pub fn new(manager: Arc<EmittedStreamManager<S>>) -> Self {
        Self { manager }
    }

    /// Retire the job's outputs and invoke `on_complete` once done.
    ///
    /// When emitted streams are kept, no store call is made and
    /// `on_complete` runs immediately; the result is `Ok(None)`.
    pub async fn retire<F>(
        &self,
        options: TeardownOptions,
        on_complete: F,
    ) -> Result<Option<SweepReport>, ReclaimError>
    where
        F: FnOnce() + Send + 'static,
    {
        if !options.delete_emitted_streams {
            info!(
                log = %self.manager.names().tracking_log(),
                "keeping emitted streams"
            );
            on_complete();
            return Ok(None);
        }

        let report = self
            .manager
            .delete_emitted_streams(on_complete)
            .await
            .map_err(|e| ReclaimError::Task(e.to_string()))??;

        Ok(Some(report))
    }
}
