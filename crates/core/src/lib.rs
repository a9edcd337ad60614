//! `logsweep-core`: shared building blocks for the log store boundary.
//!
//! This crate contains **pure** primitives (no IO, no async runtime).

pub mod error;
pub mod id;
pub mod principal;
pub mod version;

pub use error::DomainError;
pub use id::{EventId, StreamId};
pub use principal::Principal;
pub use version::ExpectedVersion;
