use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use logsweep_core::{EventId, ExpectedVersion, Principal, StreamId};

/// A record ready to be appended to a log (not yet assigned an event number).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRecord {
    pub event_id: EventId,
    pub event_type: String,
    pub is_json: bool,
    pub data: Vec<u8>,
    pub metadata: Option<Vec<u8>>,
}

impl NewRecord {
    pub fn new(event_type: impl Into<String>, is_json: bool, data: Vec<u8>) -> Self {
        Self {
            event_id: EventId::new(),
            event_type: event_type.into(),
            is_json,
            data,
            metadata: None,
        }
    }

    /// Stamp the record with its position in `log_id`.
    pub fn into_recorded(
        self,
        log_id: StreamId,
        event_number: u64,
        created_at: DateTime<Utc>,
    ) -> RecordedEvent {
        RecordedEvent {
            event_id: self.event_id,
            log_id,
            event_number,
            event_type: self.event_type,
            is_json: self.is_json,
            data: self.data,
            metadata: self.metadata,
            created_at,
        }
    }
}

/// A record persisted in a log.
///
/// Event numbers start at 0 and increase by one per append within a log. They
/// keep increasing across a soft delete, so a recreated log starts where the
/// deleted one ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedEvent {
    pub event_id: EventId,
    pub log_id: StreamId,
    pub event_number: u64,
    pub event_type: String,
    pub is_json: bool,
    pub data: Vec<u8>,
    pub metadata: Option<Vec<u8>>,
    pub created_at: DateTime<Utc>,
}

/// Outcome of a read, as reported by the store.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadStatus {
    Success,
    /// The log has never been written, or was soft-deleted.
    NoStream,
    /// The log was hard-deleted (tombstoned).
    StreamDeleted,
    AccessDenied,
    Error,
}

/// Result of a write or delete, as reported by the store.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationResult {
    Success,
    /// The log is already deleted.
    StreamDeleted,
    WrongExpectedVersion,
    AccessDenied,
    CommitTimeout,
    ForwardTimeout,
    PrepareTimeout,
}

impl OperationResult {
    pub fn is_success(self) -> bool {
        matches!(self, OperationResult::Success)
    }

    /// For deletes: the log is gone, whether this call removed it or not.
    pub fn is_deleted(self) -> bool {
        matches!(self, OperationResult::Success | OperationResult::StreamDeleted)
    }
}

/// Where a backward read starts.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadFrom {
    /// The last record of the log.
    End,
    Index(u64),
}

/// One page of a forward read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardSlice {
    pub status: ReadStatus,
    pub records: Vec<RecordedEvent>,
    /// Index to continue reading from.
    pub next_index: u64,
    pub is_end_of_log: bool,
}

/// One page of a backward read (newest first).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackwardSlice {
    pub status: ReadStatus,
    pub records: Vec<RecordedEvent>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteResult {
    pub result: OperationResult,
    /// Event number assigned to the record when the write succeeded.
    pub event_number: Option<u64>,
}

/// Log store operation error.
///
/// These are transport/infrastructure failures: the call did not produce a
/// store verdict at all. Store verdicts (deleted, access denied, version
/// mismatch) are reported through [`ReadStatus`] / [`OperationResult`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LogStoreError {
    #[error("log store unavailable: {0}")]
    Unavailable(String),

    #[error("log store lock poisoned")]
    Poisoned,

    #[error("invalid record: {0}")]
    InvalidRecord(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// Asynchronous append-only log store.
///
/// The store is an injected collaborator: tracking and reclamation only ever
/// talk to it through this trait, so they run unchanged against a real node
/// client or against [`super::InMemoryLogStore`].
///
/// ## Semantics
///
/// - `append` with [`ExpectedVersion::Any`] never conflicts; concurrent
///   writers interleave.
/// - `delete_log` with `hard_delete = false` is a soft delete: the log reads as
///   [`ReadStatus::NoStream`] afterwards and may be recreated by a later append.
/// - Deleting a log that is already gone reports
///   [`OperationResult::StreamDeleted`].
/// - A forward read may return zero records without being at the end of the
///   log (e.g. the requested range was truncated); callers continue from
///   `next_index`.
#[async_trait::async_trait]
pub trait LogStore: Send + Sync {
    async fn read_forward(
        &self,
        log: &StreamId,
        from_index: u64,
        max_count: usize,
        resolve_links: bool,
        principal: &Principal,
    ) -> Result<ForwardSlice, LogStoreError>;

    async fn read_backward(
        &self,
        log: &StreamId,
        from: ReadFrom,
        max_count: usize,
        resolve_links: bool,
        principal: &Principal,
    ) -> Result<BackwardSlice, LogStoreError>;

    async fn append(
        &self,
        log: &StreamId,
        expected_version: ExpectedVersion,
        record: NewRecord,
        principal: &Principal,
    ) -> Result<WriteResult, LogStoreError>;

    async fn delete_log(
        &self,
        log: &StreamId,
        expected_version: ExpectedVersion,
        hard_delete: bool,
        principal: &Principal,
    ) -> Result<OperationResult, LogStoreError>;
}

#[async_trait::async_trait]
impl<S> LogStore for Arc<S>
where
    S: LogStore + ?Sized,
{
    async fn read_forward(
        &self,
        log: &StreamId,
        from_index: u64,
        max_count: usize,
        resolve_links: bool,
        principal: &Principal,
    ) -> Result<ForwardSlice, LogStoreError> {
        (**self)
            .read_forward(log, from_index, max_count, resolve_links, principal)
            .await
    }

    async fn read_backward(
        &self,
        log: &StreamId,
        from: ReadFrom,
        max_count: usize,
        resolve_links: bool,
        principal: &Principal,
    ) -> Result<BackwardSlice, LogStoreError> {
        (**self)
            .read_backward(log, from, max_count, resolve_links, principal)
            .await
    }

    async fn append(
        &self,
        log: &StreamId,
        expected_version: ExpectedVersion,
        record: NewRecord,
        principal: &Principal,
    ) -> Result<WriteResult, LogStoreError> {
        (**self).append(log, expected_version, record, principal).await
    }

    async fn delete_log(
        &self,
        log: &StreamId,
        expected_version: ExpectedVersion,
        hard_delete: bool,
        principal: &Principal,
    ) -> Result<OperationResult, LogStoreError> {
        (**self)
            .delete_log(log, expected_version, hard_delete, principal)
            .await
    }
}
