use std::collections::HashMap;
use std::sync::{Mutex, RwLock};

use chrono::Utc;

use logsweep_core::{ExpectedVersion, Principal, StreamId};

use super::r#trait::{
    BackwardSlice, ForwardSlice, LogStore, LogStoreError, NewRecord, OperationResult, ReadFrom,
    ReadStatus, RecordedEvent, WriteResult,
};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum LogState {
    Live,
    SoftDeleted,
    HardDeleted,
}

#[derive(Debug)]
struct LogEntry {
    state: LogState,
    /// Event number of `records[0]`. Everything below was removed by a soft delete.
    first_live: u64,
    next_number: u64,
    records: Vec<RecordedEvent>,
}

impl LogEntry {
    fn new() -> Self {
        Self {
            state: LogState::Live,
            first_live: 0,
            next_number: 0,
            records: Vec::new(),
        }
    }

    fn current_version(&self) -> Option<u64> {
        match self.state {
            LogState::Live if !self.records.is_empty() => Some(self.next_number - 1),
            _ => None,
        }
    }
}

/// A call observed by [`InMemoryLogStore`], in call order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOp {
    ReadForward {
        log: StreamId,
        from_index: u64,
        max_count: usize,
    },
    ReadBackward {
        log: StreamId,
        from: ReadFrom,
        max_count: usize,
    },
    Append {
        log: StreamId,
        event_type: String,
        data: Vec<u8>,
        result: OperationResult,
    },
    Delete {
        log: StreamId,
        hard_delete: bool,
        result: OperationResult,
    },
}

#[derive(Debug, Default)]
struct Faults {
    deletes: HashMap<StreamId, (u32, OperationResult)>,
    appends: HashMap<StreamId, (u32, OperationResult)>,
    reads: HashMap<StreamId, u32>,
}

fn take_fault(
    faults: &mut HashMap<StreamId, (u32, OperationResult)>,
    log: &StreamId,
) -> Option<OperationResult> {
    let (remaining, result) = faults.get_mut(log)?;
    let result = *result;
    *remaining -= 1;
    if *remaining == 0 {
        faults.remove(log);
    }
    Some(result)
}

/// In-memory append-only log store.
///
/// Intended for tests/dev/benchmarks. Not optimized for performance.
///
/// Besides the [`LogStore`] operations it offers fault injection
/// (`fail_*`) and a journal of every call, so callers' store traffic can be
/// asserted on. Logs whose names start with `$` are system logs and are only
/// accessible to [`Principal::System`].
#[derive(Debug, Default)]
pub struct InMemoryLogStore {
    logs: RwLock<HashMap<StreamId, LogEntry>>,
    faults: Mutex<Faults>,
    journal: Mutex<Vec<StoreOp>>,
}

impl InMemoryLogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The next `times` deletes of `log` report `result` without touching it.
    pub fn fail_deletes(&self, log: &StreamId, times: u32, result: OperationResult) {
        if times == 0 {
            return;
        }
        if let Ok(mut faults) = self.faults.lock() {
            faults.deletes.insert(log.clone(), (times, result));
        }
    }

    /// The next `times` appends to `log` report `result` without writing.
    pub fn fail_appends(&self, log: &StreamId, times: u32, result: OperationResult) {
        if times == 0 {
            return;
        }
        if let Ok(mut faults) = self.faults.lock() {
            faults.appends.insert(log.clone(), (times, result));
        }
    }

    /// The next `times` reads of `log`, in either direction, fail with
    /// [`LogStoreError::Unavailable`].
    pub fn fail_reads(&self, log: &StreamId, times: u32) {
        if times == 0 {
            return;
        }
        if let Ok(mut faults) = self.faults.lock() {
            faults.reads.insert(log.clone(), times);
        }
    }

    /// Every call made so far, oldest first.
    pub fn journal(&self) -> Vec<StoreOp> {
        self.journal.lock().map(|j| j.clone()).unwrap_or_default()
    }

    pub fn clear_journal(&self) {
        if let Ok(mut journal) = self.journal.lock() {
            journal.clear();
        }
    }

    /// Live records of `log` (empty when missing or deleted).
    pub fn records(&self, log: &StreamId) -> Vec<RecordedEvent> {
        let Ok(logs) = self.logs.read() else {
            return Vec::new();
        };
        logs.get(log)
            .filter(|entry| entry.state == LogState::Live)
            .map(|entry| entry.records.clone())
            .unwrap_or_default()
    }

    /// True if `log` has been written and is not deleted.
    pub fn exists(&self, log: &StreamId) -> bool {
        let Ok(logs) = self.logs.read() else {
            return false;
        };
        logs.get(log)
            .is_some_and(|entry| entry.state == LogState::Live && !entry.records.is_empty())
    }

    fn record(&self, op: StoreOp) {
        if let Ok(mut journal) = self.journal.lock() {
            journal.push(op);
        }
    }

    fn take_read_fault(&self, log: &StreamId) -> Result<(), LogStoreError> {
        let mut faults = self.faults.lock().map_err(|_| LogStoreError::Poisoned)?;
        let Some(remaining) = faults.reads.get_mut(log) else {
            return Ok(());
        };
        *remaining -= 1;
        if *remaining == 0 {
            faults.reads.remove(log);
        }
        Err(LogStoreError::Unavailable(format!(
            "injected read failure on '{log}'"
        )))
    }

    fn denied(log: &StreamId, principal: &Principal) -> bool {
        log.is_system() && !principal.is_system()
    }
}

#[async_trait::async_trait]
impl LogStore for InMemoryLogStore {
    async fn read_forward(
        &self,
        log: &StreamId,
        from_index: u64,
        max_count: usize,
        _resolve_links: bool,
        principal: &Principal,
    ) -> Result<ForwardSlice, LogStoreError> {
        self.record(StoreOp::ReadForward {
            log: log.clone(),
            from_index,
            max_count,
        });

        if max_count == 0 {
            return Err(LogStoreError::InvalidRequest(
                "max_count must be positive".to_string(),
            ));
        }

        self.take_read_fault(log)?;

        let empty = |status: ReadStatus| ForwardSlice {
            status,
            records: Vec::new(),
            next_index: from_index,
            is_end_of_log: true,
        };

        if Self::denied(log, principal) {
            return Ok(empty(ReadStatus::AccessDenied));
        }

        let logs = self.logs.read().map_err(|_| LogStoreError::Poisoned)?;
        let Some(entry) = logs.get(log) else {
            return Ok(empty(ReadStatus::NoStream));
        };

        match entry.state {
            LogState::HardDeleted => return Ok(empty(ReadStatus::StreamDeleted)),
            LogState::SoftDeleted => return Ok(empty(ReadStatus::NoStream)),
            LogState::Live => {}
        }

        if from_index < entry.first_live {
            // Requested range was truncated: nothing to return, continue at the first live record.
            return Ok(ForwardSlice {
                status: ReadStatus::Success,
                records: Vec::new(),
                next_index: entry.first_live,
                is_end_of_log: entry.first_live >= entry.next_number,
            });
        }

        let offset = (from_index - entry.first_live) as usize;
        let records: Vec<RecordedEvent> = entry
            .records
            .iter()
            .skip(offset)
            .take(max_count)
            .cloned()
            .collect();

        let next_index = records
            .last()
            .map(|r| r.event_number + 1)
            .unwrap_or(from_index);

        Ok(ForwardSlice {
            status: ReadStatus::Success,
            records,
            next_index,
            is_end_of_log: next_index >= entry.next_number,
        })
    }

    async fn read_backward(
        &self,
        log: &StreamId,
        from: ReadFrom,
        max_count: usize,
        _resolve_links: bool,
        principal: &Principal,
    ) -> Result<BackwardSlice, LogStoreError> {
        self.record(StoreOp::ReadBackward {
            log: log.clone(),
            from,
            max_count,
        });

        if max_count == 0 {
            return Err(LogStoreError::InvalidRequest(
                "max_count must be positive".to_string(),
            ));
        }

        self.take_read_fault(log)?;

        let empty = |status: ReadStatus| BackwardSlice {
            status,
            records: Vec::new(),
        };

        if Self::denied(log, principal) {
            return Ok(empty(ReadStatus::AccessDenied));
        }

        let logs = self.logs.read().map_err(|_| LogStoreError::Poisoned)?;
        let Some(entry) = logs.get(log) else {
            return Ok(empty(ReadStatus::NoStream));
        };

        match entry.state {
            LogState::HardDeleted => return Ok(empty(ReadStatus::StreamDeleted)),
            LogState::SoftDeleted => return Ok(empty(ReadStatus::NoStream)),
            LogState::Live => {}
        }

        let Some(last) = entry.current_version() else {
            return Ok(empty(ReadStatus::Success));
        };
        let start = match from {
            ReadFrom::End => last,
            ReadFrom::Index(i) => i.min(last),
        };
        if start < entry.first_live {
            return Ok(empty(ReadStatus::Success));
        }

        let upto = (start - entry.first_live) as usize;
        let records = entry.records[..=upto]
            .iter()
            .rev()
            .take(max_count)
            .cloned()
            .collect();

        Ok(BackwardSlice {
            status: ReadStatus::Success,
            records,
        })
    }

    async fn append(
        &self,
        log: &StreamId,
        expected_version: ExpectedVersion,
        record: NewRecord,
        principal: &Principal,
    ) -> Result<WriteResult, LogStoreError> {
        if record.event_type.is_empty() {
            return Err(LogStoreError::InvalidRecord("empty event type".to_string()));
        }

        let event_type = record.event_type.clone();
        let data = record.data.clone();
        let outcome = self.append_inner(log, expected_version, record, principal)?;

        self.record(StoreOp::Append {
            log: log.clone(),
            event_type,
            data,
            result: outcome.result,
        });
        Ok(outcome)
    }

    async fn delete_log(
        &self,
        log: &StreamId,
        expected_version: ExpectedVersion,
        hard_delete: bool,
        principal: &Principal,
    ) -> Result<OperationResult, LogStoreError> {
        let result = self.delete_inner(log, expected_version, hard_delete, principal)?;

        self.record(StoreOp::Delete {
            log: log.clone(),
            hard_delete,
            result,
        });
        Ok(result)
    }
}

impl InMemoryLogStore {
    fn append_inner(
        &self,
        log: &StreamId,
        expected_version: ExpectedVersion,
        record: NewRecord,
        principal: &Principal,
    ) -> Result<WriteResult, LogStoreError> {
        let rejected = |result| WriteResult {
            result,
            event_number: None,
        };

        {
            let mut faults = self.faults.lock().map_err(|_| LogStoreError::Poisoned)?;
            if let Some(result) = take_fault(&mut faults.appends, log) {
                return Ok(rejected(result));
            }
        }

        if Self::denied(log, principal) {
            return Ok(rejected(OperationResult::AccessDenied));
        }

        let mut logs = self.logs.write().map_err(|_| LogStoreError::Poisoned)?;
        let current = match logs.get(log) {
            Some(entry) if entry.state == LogState::HardDeleted => {
                return Ok(rejected(OperationResult::StreamDeleted));
            }
            Some(entry) => entry.current_version(),
            None => None,
        };
        if !expected_version.matches(current) {
            return Ok(rejected(OperationResult::WrongExpectedVersion));
        }

        let entry = logs.entry(log.clone()).or_insert_with(LogEntry::new);
        // A soft-deleted log is recreated; numbering continues.
        entry.state = LogState::Live;

        let event_number = entry.next_number;
        entry
            .records
            .push(record.into_recorded(log.clone(), event_number, Utc::now()));
        entry.next_number += 1;

        Ok(WriteResult {
            result: OperationResult::Success,
            event_number: Some(event_number),
        })
    }

    fn delete_inner(
        &self,
        log: &StreamId,
        expected_version: ExpectedVersion,
        hard_delete: bool,
        principal: &Principal,
    ) -> Result<OperationResult, LogStoreError> {
        {
            let mut faults = self.faults.lock().map_err(|_| LogStoreError::Poisoned)?;
            if let Some(result) = take_fault(&mut faults.deletes, log) {
                return Ok(result);
            }
        }

        if Self::denied(log, principal) {
            return Ok(OperationResult::AccessDenied);
        }

        let mut logs = self.logs.write().map_err(|_| LogStoreError::Poisoned)?;
        let Some(entry) = logs.get_mut(log) else {
            return Ok(OperationResult::StreamDeleted);
        };

        match entry.state {
            LogState::HardDeleted => Ok(OperationResult::StreamDeleted),
            LogState::SoftDeleted if !hard_delete => Ok(OperationResult::StreamDeleted),
            LogState::SoftDeleted => {
                entry.state = LogState::HardDeleted;
                Ok(OperationResult::Success)
            }
            LogState::Live => {
                if !expected_version.matches(entry.current_version()) {
                    return Ok(OperationResult::WrongExpectedVersion);
                }
                entry.records.clear();
                entry.first_live = entry.next_number;
                entry.state = if hard_delete {
                    LogState::HardDeleted
                } else {
                    LogState::SoftDeleted
                };
                Ok(OperationResult::Success)
            }
        }
    }
}
