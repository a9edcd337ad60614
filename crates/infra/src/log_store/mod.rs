//! Append-only log store boundary.
//!
//! This module defines the asynchronous store interface that tracking and
//! reclamation are written against, plus an in-memory implementation for
//! tests, dev and benchmarks.

pub mod in_memory;
pub mod r#trait;

pub use in_memory::{InMemoryLogStore, StoreOp};
pub use r#trait::{
    BackwardSlice, ForwardSlice, LogStore, LogStoreError, NewRecord, OperationResult, ReadFrom,
    ReadStatus, RecordedEvent, WriteResult,
};
