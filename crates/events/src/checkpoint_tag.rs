use serde::{Deserialize, Serialize};

/// Logical position in a job's input at which an event was produced.
///
/// Ordered by `(phase, commit_position, prepare_position)`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CheckpointTag {
    pub phase: u32,
    pub commit_position: i64,
    pub prepare_position: i64,
}

impl CheckpointTag {
    pub fn from_position(phase: u32, commit_position: i64, prepare_position: i64) -> Self {
        Self {
            phase,
            commit_position,
            prepare_position,
        }
    }
}

impl core::fmt::Display for CheckpointTag {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "{}:C:{}/P:{}",
            self.phase, self.commit_position, self.prepare_position
        )
    }
}
