//! System event types written by the emitted-stream bookkeeping.
//!
//! Every reader that filters on one of these must use the same constant the
//! writer used. A mismatch makes reclamation silently restart from index 0.

/// One record per emitted event, appended to a job's tracking log.
/// Payload: the raw UTF-8 name of the stream the event was emitted to.
pub const STREAM_TRACKED: &str = "$StreamTracked";

/// Resume position of an emitted-stream deletion sweep.
/// Payload: the tracking-log index as a JSON integer.
pub const DELETION_CHECKPOINT: &str = "$ProjectionCheckpoint";
