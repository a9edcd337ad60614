//! Infrastructure for emitted-stream bookkeeping: the log store boundary,
//! naming, configuration, tracking and the deletion sweep.

pub mod config;
pub mod emitted_streams;
pub mod lifecycle;
pub mod log_store;
pub mod naming;


pub use config::{ConfigError, ReclaimConfig};
pub use emitted_streams::{
    DetachedTask, EmittedStreamManager, FinalizeReport, ReclaimError, Reclaimer, SweepReport,
};
pub use lifecycle::{JobTeardown, TeardownOptions};
pub use log_store::{InMemoryLogStore, LogStore, LogStoreError};
pub use naming::{EmittedStreamNames, JobNames};
