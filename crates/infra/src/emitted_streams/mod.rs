//! Tracking and reclamation of the streams a job emits to.
//!
//! ## Components
//!
//! - `EmittedStreamManager`: per-job facade (track on write, sweep on delete)
//! - `Reclaimer`: the checkpointed deletion sweep
//! - `DetachedTask`: handle of a best-effort write that never blocks the caller

pub mod detached;
pub mod reclaimer;
mod tracker;

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, error};

use logsweep_events::EmittedEvent;

use crate::config::ReclaimConfig;
use crate::log_store::LogStore;
use crate::naming::EmittedStreamNames;

pub use detached::DetachedTask;
pub use reclaimer::{FinalizeReport, ReclaimError, Reclaimer, SweepReport};

/// Records the streams one job emits to, and deletes them when the job goes away.
///
/// The manager itself holds no sweep state: every call to [`sweep`] or
/// [`delete_emitted_streams`] runs with its own counters, so repeated sweeps
/// cannot corrupt each other. Running two sweeps of the same job at once is
/// still wasteful (both walk the same tracking log) and should be avoided by
/// the caller.
///
/// [`sweep`]: EmittedStreamManager::sweep
/// [`delete_emitted_streams`]: EmittedStreamManager::delete_emitted_streams
pub struct EmittedStreamManager<S> {
    store: Arc<S>,
    names: Arc<dyn EmittedStreamNames>,
    config: ReclaimConfig,
}

impl<S> EmittedStreamManager<S>
where
    S: LogStore + 'static,
{
    pub fn new(store: Arc<S>, names: Arc<dyn EmittedStreamNames>, config: ReclaimConfig) -> Self {
        Self {
            store,
            names,
            config,
        }
    }

    pub fn names(&self) -> &dyn EmittedStreamNames {
        self.names.as_ref()
    }

    /// Append one tracking record per event to the job's tracking log.
    ///
    /// Never blocks and never fails: the appends run on a detached task and
    /// failures are only logged. With tracking disabled nothing is written.
    pub fn track_emitted_stream(&self, events: &[EmittedEvent]) -> DetachedTask {
        if !self.config.track_emitted_streams {
            debug!(count = events.len(), "emitted stream tracking disabled");
            return DetachedTask::none();
        }
        tracker::track(self.store.clone(), self.names.tracking_log(), events)
    }

    /// Run a deletion sweep and wait for it.
    pub async fn sweep(&self) -> Result<SweepReport, ReclaimError> {
        self.reclaimer().run().await
    }

    /// Start a deletion sweep on the current tokio runtime.
    ///
    /// `on_complete` is invoked exactly once when the sweep finalizes, whether
    /// or not the bookkeeping logs could be deleted. If the sweep aborts on a
    /// tracking-log read failure it is not invoked; the error is logged and
    /// returned through the join handle.
    ///
    /// Must be called from within a tokio runtime.
    pub fn delete_emitted_streams<F>(&self, on_complete: F) -> JoinHandle<Result<SweepReport, ReclaimError>>
    where
        F: FnOnce() + Send + 'static,
    {
        let reclaimer = self.reclaimer();
        tokio::spawn(async move {
            match reclaimer.run().await {
                Ok(report) => {
                    on_complete();
                    Ok(report)
                }
                Err(e) => {
                    error!(error = %e, "emitted stream deletion aborted");
                    Err(e)
                }
            }
        })
    }

    fn reclaimer(&self) -> Reclaimer<S> {
        Reclaimer::new(self.store.clone(), self.names.clone(), self.config.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use logsweep_core::{EventId, StreamId};
    use logsweep_events::CheckpointTag;

    use crate::log_store::{InMemoryLogStore, StoreOp};
    use crate::naming::JobNames;

    fn emitted(target: &str) -> EmittedEvent {
        EmittedEvent::new(
            StreamId::new(target).unwrap(),
            EventId::new(),
            "type1",
            true,
            Some("data".to_string()),
            CheckpointTag::from_position(0, 100, 50),
        )
    }

    fn manager(store: &Arc<InMemoryLogStore>, config: ReclaimConfig) -> EmittedStreamManager<InMemoryLogStore> {
        EmittedStreamManager::new(
            store.clone(),
            Arc::new(JobNames::new("test_projection").unwrap()),
            config,
        )
    }

    #[tokio::test]
    async fn tracking_appends_one_record_per_event() {
        let store = Arc::new(InMemoryLogStore::new());
        let m = manager(&store, ReclaimConfig::default());

        m.track_emitted_stream(&[emitted("a"), emitted("b"), emitted("a")])
            .wait()
            .await;

        let records = store.records(&m.names().tracking_log());
        let payloads: Vec<&[u8]> = records.iter().map(|r| r.data.as_slice()).collect();
        assert_eq!(payloads, vec![&b"a"[..], &b"b"[..], &b"a"[..]]);
        assert!(records.iter().all(|r| r.event_type == "$StreamTracked" && !r.is_json));
    }

    #[tokio::test]
    async fn tracking_disabled_makes_no_store_calls() {
        let store = Arc::new(InMemoryLogStore::new());
        let m = manager(&store, ReclaimConfig::default().with_tracking(false));

        let task = m.track_emitted_stream(&[emitted("test_stream")]);
        assert!(task.is_none());
        task.wait().await;

        assert!(store.journal().is_empty());
        assert!(store.records(&m.names().tracking_log()).is_empty());
    }

    #[tokio::test]
    async fn empty_batch_makes_no_store_calls() {
        let store = Arc::new(InMemoryLogStore::new());
        let m = manager(&store, ReclaimConfig::default());

        m.track_emitted_stream(&[]).wait().await;
        assert!(store.journal().is_empty());
    }

    #[tokio::test]
    async fn failed_tracking_append_is_dropped_silently() {
        let store = Arc::new(InMemoryLogStore::new());
        let m = manager(&store, ReclaimConfig::default());
        store.fail_appends(
            &m.names().tracking_log(),
            1,
            crate::log_store::OperationResult::CommitTimeout,
        );

        m.track_emitted_stream(&[emitted("lost"), emitted("kept")])
            .wait()
            .await;

        let records = store.records(&m.names().tracking_log());
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].data, b"kept");
        let attempts = store
            .journal()
            .into_iter()
            .filter(|op| matches!(op, StoreOp::Append { .. }))
            .count();
        assert_eq!(attempts, 2);
    }

    #[tokio::test]
    async fn completion_callback_runs_once_on_finalize() {
        let store = Arc::new(InMemoryLogStore::new());
        let m = manager(&store, ReclaimConfig::default());
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        let report = m
            .delete_emitted_streams(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .await
            .unwrap()
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(report.deleted, 0);
    }

    #[tokio::test]
    async fn aborted_sweep_does_not_call_back() {
        let store = Arc::new(InMemoryLogStore::new());
        let m = manager(&store, ReclaimConfig::default());
        m.track_emitted_stream(&[emitted("a")]).wait().await;
        store.fail_reads(&m.names().tracking_log(), 1);
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        let result = m
            .delete_emitted_streams(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .await
            .unwrap();

        assert!(matches!(result, Err(ReclaimError::TrackingLogRead { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
