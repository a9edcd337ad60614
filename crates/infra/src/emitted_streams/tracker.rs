use std::sync::Arc;

use tracing::{debug, warn};

use logsweep_core::{ExpectedVersion, Principal, StreamId};
use logsweep_events::EmittedEvent;
use logsweep_events::event_types::STREAM_TRACKED;

use crate::log_store::{LogStore, NewRecord};

use super::detached::DetachedTask;

/// Tracking record for one emitted event: the raw target stream name.
pub(crate) fn tracking_record(event: &EmittedEvent) -> NewRecord {
    NewRecord::new(STREAM_TRACKED, false, event.stream_id().as_bytes().to_vec())
}

/// Append one tracking record per event to `tracking_log`, in input order, on
/// a detached task.
///
/// Appends are unconstrained (`ExpectedVersion::Any`) so concurrent trackers
/// interleave safely. A failed append is logged and dropped; the stream it
/// named will not be reclaimed.
pub(crate) fn track<S>(store: Arc<S>, tracking_log: StreamId, events: &[EmittedEvent]) -> DetachedTask
where
    S: LogStore + 'static,
{
    if events.is_empty() {
        return DetachedTask::none();
    }

    let records: Vec<NewRecord> = events.iter().map(tracking_record).collect();
    debug!(log = %tracking_log, count = records.len(), "tracking emitted streams");

    DetachedTask::spawn("track-emitted-streams", async move {
        for record in records {
            let stream = String::from_utf8_lossy(&record.data).into_owned();
            match store
                .append(&tracking_log, ExpectedVersion::Any, record, &Principal::System)
                .await
            {
                Ok(write) if write.result.is_success() => {}
                Ok(write) => {
                    warn!(
                        log = %tracking_log,
                        stream = %stream,
                        result = ?write.result,
                        "failed to track emitted stream"
                    );
                }
                Err(e) => {
                    warn!(
                        log = %tracking_log,
                        stream = %stream,
                        error = %e,
                        "failed to track emitted stream"
                    );
                }
            }
        }
    })
}
