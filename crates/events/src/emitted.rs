use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use logsweep_core::{EventId, StreamId};

use crate::checkpoint_tag::CheckpointTag;

/// An event a stream-processing job wants written to one of its output streams.
///
/// `EmittedEvent` is immutable once built: the optional parts are attached with
/// the consuming `with_*` methods before the event is handed to a writer.
///
/// - `caused_by` is the input position that produced the event.
/// - `expected_tag` is an optional hint used by writers to detect that the
///   target stream was written by a later position than the job expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmittedEvent {
    stream_id: StreamId,
    event_id: EventId,
    event_type: String,
    is_json: bool,
    data: Option<String>,
    extra_metadata: Option<BTreeMap<String, JsonValue>>,
    caused_by: CheckpointTag,
    expected_tag: Option<CheckpointTag>,
}

impl EmittedEvent {
    pub fn new(
        stream_id: StreamId,
        event_id: EventId,
        event_type: impl Into<String>,
        is_json: bool,
        data: Option<String>,
        caused_by: CheckpointTag,
    ) -> Self {
        Self {
            stream_id,
            event_id,
            event_type: event_type.into(),
            is_json,
            data,
            extra_metadata: None,
            caused_by,
            expected_tag: None,
        }
    }

    pub fn with_metadata(mut self, metadata: BTreeMap<String, JsonValue>) -> Self {
        self.extra_metadata = Some(metadata);
        self
    }

    pub fn with_expected_tag(mut self, tag: CheckpointTag) -> Self {
        self.expected_tag = Some(tag);
        self
    }

    pub fn stream_id(&self) -> &StreamId {
        &self.stream_id
    }

    pub fn event_id(&self) -> EventId {
        self.event_id
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn is_json(&self) -> bool {
        self.is_json
    }

    pub fn data(&self) -> Option<&str> {
        self.data.as_deref()
    }

    pub fn extra_metadata(&self) -> Option<&BTreeMap<String, JsonValue>> {
        self.extra_metadata.as_ref()
    }

    pub fn caused_by(&self) -> CheckpointTag {
        self.caused_by
    }

    pub fn expected_tag(&self) -> Option<CheckpointTag> {
        self.expected_tag
    }
}
