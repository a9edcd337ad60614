//! Checkpointed deletion sweep over a job's tracking log.
//!
//! The sweep is an explicit state machine driven by [`Reclaimer::run`]:
//!
//! ```text
//! ReadCheckpoint -> Paginate -> DeleteItem -> Paginate -> ... -> Finalize -> Done
//! ```
//!
//! - At most one main-progression store call is in flight; each step is
//!   issued after the previous one completed.
//! - Every `checkpoint_threshold` successful deletions the current tracking
//!   index is persisted on a detached task. The main loop does not wait for
//!   it; outstanding writes are only awaited when the sweep ends.
//! - Checkpoint writes are chained: each one waits for its predecessor, so
//!   they land in dispatch order and the stored position never moves back.
//! - "Already deleted" counts as success, so replaying from a checkpoint is safe.
//! - A stream whose delete keeps failing is abandoned after `retry_limit`
//!   retries; the sweep moves on.
//! - Counters live in a per-run [`SweepState`], never on the manager.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use logsweep_core::{ExpectedVersion, Principal, StreamId};
use logsweep_events::event_types::DELETION_CHECKPOINT;

use crate::config::ReclaimConfig;
use crate::log_store::{LogStore, NewRecord, OperationResult, ReadFrom, ReadStatus, RecordedEvent};
use crate::naming::EmittedStreamNames;

use super::detached::DetachedTask;

/// Sweep failure surfaced to the caller. The completion callback is not
/// invoked and the tracking log is left in place for a later sweep.
#[derive(Debug, Error)]
pub enum ReclaimError {
    #[error("failed to read tracking log '{log}' at index {index}: {reason}")]
    TrackingLogRead {
        log: StreamId,
        index: u64,
        reason: String,
    },

    #[error("sweep task failed: {0}")]
    Task(String),
}

/// Outcome of the two bookkeeping-log deletions at the end of a sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FinalizeReport {
    pub checkpoint_log_deleted: bool,
    pub tracking_log_deleted: bool,
}

/// What a completed sweep did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// Tracking index the sweep resumed from.
    pub started_from: u64,
    /// Streams confirmed gone (including those that already were).
    pub deleted: u64,
    /// Subset of `deleted` the store reported as already deleted.
    pub already_deleted: u64,
    /// Tracking records given up on.
    pub abandoned: u64,
    pub retries: u64,
    pub gaps_skipped: u64,
    pub checkpoints_dispatched: u64,
    pub finalize: FinalizeReport,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum SweepStep {
    ReadCheckpoint,
    Paginate,
    DeleteItem { stream: StreamId, index: u64 },
    Finalize,
    Done,
}

/// Mutable state of one sweep invocation.
#[derive(Debug)]
struct SweepState {
    cursor: u64,
    retry_limit: u32,
    retries_left: u32,
    processed_since_checkpoint: u32,
    /// Most recently dispatched checkpoint write; it awaits the one before.
    pending_checkpoint: Option<DetachedTask>,
    report: SweepReport,
}

impl SweepState {
    fn new(retry_limit: u32) -> Self {
        Self {
            cursor: 0,
            retry_limit,
            retries_left: retry_limit,
            processed_since_checkpoint: 0,
            pending_checkpoint: None,
            report: SweepReport::default(),
        }
    }
}

/// The checkpoint record persisted every `checkpoint_threshold` deletions.
pub(crate) fn checkpoint_record(index: u64) -> NewRecord {
    NewRecord::new(DELETION_CHECKPOINT, true, index.to_string().into_bytes())
}

/// Resume index stored in the first checkpoint record of `records`.
pub(crate) fn checkpoint_position(records: &[RecordedEvent]) -> Option<u64> {
    let record = records
        .iter()
        .find(|r| r.event_type == DELETION_CHECKPOINT)?;

    match serde_json::from_slice::<u64>(&record.data) {
        Ok(index) => Some(index),
        Err(e) => {
            warn!(
                log = %record.log_id,
                event_number = record.event_number,
                error = %e,
                "unreadable deletion checkpoint; sweeping from start"
            );
            None
        }
    }
}

async fn drain_checkpoints(state: &mut SweepState) {
    if let Some(pending) = state.pending_checkpoint.take() {
        pending.wait().await;
    }
}

/// Drives one deletion sweep for a job.
pub struct Reclaimer<S> {
    store: Arc<S>,
    names: Arc<dyn EmittedStreamNames>,
    config: ReclaimConfig,
}

impl<S> Reclaimer<S>
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

    /// Run the sweep to completion.
    ///
    /// Returns once both bookkeeping logs have been deleted (or their
    /// deletion failed and was logged), or with an error if the tracking log
    /// could not be read.
    pub async fn run(&self) -> Result<SweepReport, ReclaimError> {
        let mut state = SweepState::new(self.config.retry_limit);
        let mut step = SweepStep::ReadCheckpoint;

        loop {
            step = match step {
                SweepStep::ReadCheckpoint => {
                    state.cursor = self.read_checkpoint().await;
                    state.report.started_from = state.cursor;
                    info!(
                        log = %self.names.tracking_log(),
                        from = state.cursor,
                        "deleting emitted streams"
                    );
                    SweepStep::Paginate
                }
                SweepStep::Paginate => match self.paginate(&mut state).await {
                    Ok(next) => next,
                    Err(e) => {
                        // Keep whatever progress was made for the next sweep.
                        drain_checkpoints(&mut state).await;
                        return Err(e);
                    }
                },
                SweepStep::DeleteItem { stream, index } => {
                    self.delete_item(&mut state, stream, index).await
                }
                SweepStep::Finalize => {
                    self.finalize(&mut state).await;
                    SweepStep::Done
                }
                SweepStep::Done => {
                    info!(
                        log = %self.names.tracking_log(),
                        deleted = state.report.deleted,
                        abandoned = state.report.abandoned,
                        "emitted streams deleted"
                    );
                    return Ok(state.report);
                }
            };
        }
    }

    async fn read_checkpoint(&self) -> u64 {
        let log = self.names.checkpoint_log();
        match self
            .store
            .read_backward(&log, ReadFrom::End, 1, false, &Principal::System)
            .await
        {
            Ok(slice) if slice.status == ReadStatus::Success => {
                checkpoint_position(&slice.records).unwrap_or(0)
            }
            Ok(slice) => {
                debug!(log = %log, status = ?slice.status, "no deletion checkpoint");
                0
            }
            Err(e) => {
                warn!(log = %log, error = %e, "failed to read deletion checkpoint; sweeping from start");
                0
            }
        }
    }

    async fn paginate(&self, state: &mut SweepState) -> Result<SweepStep, ReclaimError> {
        let log = self.names.tracking_log();
        let index = state.cursor;

        let slice = self
            .store
            .read_forward(&log, index, 1, false, &Principal::System)
            .await
            .map_err(|e| e.to_string())
            .and_then(|slice| match slice.status {
                ReadStatus::Success | ReadStatus::NoStream | ReadStatus::StreamDeleted => Ok(slice),
                other => Err(format!("read status {other:?}")),
            });

        let slice = match slice {
            Ok(slice) => slice,
            Err(reason) => {
                error!(log = %log, index, reason = %reason, "failed to read tracking log; aborting sweep");
                return Err(ReclaimError::TrackingLogRead { log, index, reason });
            }
        };

        if slice.status != ReadStatus::Success {
            // Nothing left to walk; finalize still clears the bookkeeping logs.
            debug!(log = %log, status = ?slice.status, "tracking log absent");
            return Ok(SweepStep::Finalize);
        }

        let Some(record) = slice.records.into_iter().next() else {
            if slice.is_end_of_log {
                return Ok(SweepStep::Finalize);
            }
            debug!(log = %log, from = index, to = slice.next_index, "skipping gap in tracking log");
            state.report.gaps_skipped += 1;
            state.cursor = slice.next_index;
            return Ok(SweepStep::Paginate);
        };

        let target = String::from_utf8(record.data)
            .map_err(|e| e.to_string())
            .and_then(|name| StreamId::new(name).map_err(|e| e.to_string()));

        match target {
            Ok(stream) => Ok(SweepStep::DeleteItem {
                stream,
                index: record.event_number,
            }),
            Err(reason) => {
                error!(
                    log = %log,
                    index = record.event_number,
                    reason = %reason,
                    "tracking record does not name a stream; skipping"
                );
                state.report.abandoned += 1;
                state.cursor = record.event_number + 1;
                Ok(SweepStep::Paginate)
            }
        }
    }

    async fn delete_item(&self, state: &mut SweepState, stream: StreamId, index: u64) -> SweepStep {
        let outcome = self
            .store
            .delete_log(&stream, ExpectedVersion::Any, false, &Principal::System)
            .await;

        let failure = match outcome {
            Ok(result) if result.is_deleted() => {
                state.retries_left = state.retry_limit;
                state.report.deleted += 1;
                if result == OperationResult::StreamDeleted {
                    state.report.already_deleted += 1;
                }

                state.processed_since_checkpoint += 1;
                if state.processed_since_checkpoint >= self.config.checkpoint_threshold {
                    state.processed_since_checkpoint = 0;
                    self.dispatch_checkpoint(state, index);
                }

                state.cursor = index + 1;
                return SweepStep::Paginate;
            }
            Ok(result) => format!("{result:?}"),
            Err(e) => e.to_string(),
        };

        if state.retries_left == 0 {
            error!(
                stream = %stream,
                index,
                reason = %failure,
                "retry limit reached, could not delete stream; manual intervention may be required"
            );
            state.report.abandoned += 1;
            state.retries_left = state.retry_limit;
            state.cursor = index + 1;
            return SweepStep::Paginate;
        }

        warn!(
            stream = %stream,
            attempt = state.retry_limit - state.retries_left + 1,
            limit = state.retry_limit,
            reason = %failure,
            "failed to delete emitted stream; retrying"
        );
        state.retries_left -= 1;
        state.report.retries += 1;
        SweepStep::DeleteItem { stream, index }
    }

    fn dispatch_checkpoint(&self, state: &mut SweepState, index: u64) {
        let store = self.store.clone();
        let log = self.names.checkpoint_log();
        let previous = state.pending_checkpoint.take();

        state.report.checkpoints_dispatched += 1;
        state.pending_checkpoint = Some(DetachedTask::spawn(
            "deletion-checkpoint",
            async move {
                if let Some(previous) = previous {
                    previous.wait().await;
                }
                match store
                    .append(&log, ExpectedVersion::Any, checkpoint_record(index), &Principal::System)
                    .await
                {
                    Ok(write) if write.result.is_success() => {
                        debug!(log = %log, index, "deletion checkpoint written");
                    }
                    Ok(write) => {
                        warn!(log = %log, index, result = ?write.result, "failed to write deletion checkpoint");
                    }
                    Err(e) => {
                        warn!(log = %log, index, error = %e, "failed to write deletion checkpoint");
                    }
                }
            },
        ));
    }

    async fn finalize(&self, state: &mut SweepState) {
        // A checkpoint landing after the delete below would recreate the log.
        drain_checkpoints(state).await;

        state.report.finalize.checkpoint_log_deleted =
            self.delete_bookkeeping_log(self.names.checkpoint_log()).await;
        state.report.finalize.tracking_log_deleted =
            self.delete_bookkeeping_log(self.names.tracking_log()).await;
    }

    async fn delete_bookkeeping_log(&self, log: StreamId) -> bool {
        match self
            .store
            .delete_log(&log, ExpectedVersion::Any, false, &Principal::System)
            .await
        {
            Ok(result) if result.is_deleted() => {
                info!(log = %log, "bookkeeping log deleted");
                true
            }
            Ok(result) => {
                error!(log = %log, result = ?result, "failed to delete bookkeeping log");
                false
            }
            Err(e) => {
                error!(log = %log, error = %e, "failed to delete bookkeeping log");
                false
            }
        }
    }
}
