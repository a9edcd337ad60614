//! Optimistic concurrency expectations for log writes and deletes.

use serde::{Deserialize, Serialize};

/// Expected state of a log at the time of a write or delete.
///
/// `current` is the event number of the last record in the log, or `None`
/// when the log has no records (never written, or soft-deleted).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpectedVersion {
    /// Skip version checking. Concurrent writers may interleave freely.
    Any,
    /// Require the log to be empty.
    NoStream,
    /// Require the last record of the log to have exactly this event number.
    Exact(u64),
}

impl ExpectedVersion {
    pub fn matches(self, current: Option<u64>) -> bool {
        match self {
            ExpectedVersion::Any => true,
            ExpectedVersion::NoStream => current.is_none(),
            ExpectedVersion::Exact(v) => current == Some(v),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn any_matches_everything() {
        assert!(ExpectedVersion::Any.matches(None));
        assert!(ExpectedVersion::Any.matches(Some(41)));
    }

    #[test]
    fn no_stream_and_exact() {
        assert!(ExpectedVersion::NoStream.matches(None));
        assert!(!ExpectedVersion::NoStream.matches(Some(0)));
        assert!(ExpectedVersion::Exact(3).matches(Some(3)));
        assert!(!ExpectedVersion::Exact(3).matches(Some(4)));
    }
}
