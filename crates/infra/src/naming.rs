//! Names of the bookkeeping logs that belong to a job.

use logsweep_core::{DomainError, StreamId};

const PROJECTIONS_PREFIX: &str = "$projections-";
const EMITTED_STREAMS_SUFFIX: &str = "-emittedstreams";
const CHECKPOINT_SUFFIX: &str = "-checkpoint";

/// Derives the tracking and checkpoint log names of one job.
///
/// Implementations must be deterministic: the names are computed again at
/// deletion time, possibly by a different process than the one that tracked.
pub trait EmittedStreamNames: Send + Sync {
    /// Log holding one `$StreamTracked` record per emitted event.
    fn tracking_log(&self) -> StreamId;

    /// Log holding the deletion sweep's resume position.
    fn checkpoint_log(&self) -> StreamId;
}

/// Default naming scheme:
/// `$projections-{job}-emittedstreams` and
/// `$projections-{job}-emittedstreams-checkpoint`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobNames {
    tracking_log: StreamId,
    checkpoint_log: StreamId,
}

impl JobNames {
    pub fn new(job_name: impl Into<String>) -> Result<Self, DomainError> {
        let job_name = job_name.into();
        if job_name.trim().is_empty() {
            return Err(DomainError::validation("job name must not be empty"));
        }

        let tracking = format!("{PROJECTIONS_PREFIX}{job_name}{EMITTED_STREAMS_SUFFIX}");
        let checkpoint = format!("{tracking}{CHECKPOINT_SUFFIX}");

        Ok(Self {
            tracking_log: StreamId::new(tracking)?,
            checkpoint_log: StreamId::new(checkpoint)?,
        })
    }
}

impl EmittedStreamNames for JobNames {
    fn tracking_log(&self) -> StreamId {
        self.tracking_log.clone()
    }

    fn checkpoint_log(&self) -> StreamId {
        self.checkpoint_log.clone()
    }
}
