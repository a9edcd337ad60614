//! Events written by stream-processing jobs and the system records that
//! track them.

pub mod checkpoint_tag;
pub mod emitted;
pub mod event_types;

pub use checkpoint_tag::CheckpointTag;
pub use emitted::EmittedEvent;
