use serde::{Deserialize, Serialize};

/// Identity on whose behalf a store call is made.
///
/// Housekeeping (tracking, reclamation) always runs as [`Principal::System`];
/// the variant exists so store implementations can apply their own access
/// rules to user-initiated calls.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Principal {
    System,
    User(String),
}

impl Principal {
    pub fn is_system(&self) -> bool {
        matches!(self, Principal::System)
    }
}

impl core::fmt::Display for Principal {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Principal::System => f.write_str("$system"),
            Principal::User(name) => f.write_str(name),
        }
    }
}
