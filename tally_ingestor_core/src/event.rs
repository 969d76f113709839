use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::{IngestorError, Result};

/// Field every event must carry.
pub const NAME_FIELD: &str = "name";
/// Field set by the server when the event is received.
pub const RECEIVED_AT_FIELD: &str = "receivedAt";

/// An analytics event.
///
/// Apart from `name` and `receivedAt` the payload is opaque. Field order is
/// kept as received. Deserialization applies the same checks as [`EventRecord::parse`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "Map<String, Value>")]
pub struct EventRecord(Map<String, Value>);

impl TryFrom<Map<String, Value>> for EventRecord {
    type Error = IngestorError;

    fn try_from(fields: Map<String, Value>) -> Result<Self> {
        Self::parse(Value::Object(fields))
    }
}

impl Serialize for EventRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl EventRecord {
    /// Validate a JSON payload and turn it into a record.
    ///
    /// The payload must be an object with a non-empty string `name`.
    pub fn parse(value: Value) -> Result<Self> {
        let Value::Object(fields) = value else {
            return Err(IngestorError::validation("event must be a JSON object"));
        };

        match fields.get(NAME_FIELD) {
            None => Err(IngestorError::validation("event name is required")),
            Some(Value::String(name)) if name.is_empty() => {
                Err(IngestorError::validation("event name must not be empty"))
            }
            Some(Value::String(_)) => Ok(Self(fields)),
            Some(_) => Err(IngestorError::validation("event name must be a string")),
        }
    }

    pub fn name(&self) -> &str {
        self.0
            .get(NAME_FIELD)
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    pub fn received_at(&self) -> Option<&str> {
        self.0.get(RECEIVED_AT_FIELD).and_then(Value::as_str)
    }

    /// Set `receivedAt`, replacing any value sent by the client.
    pub fn stamp_received_at(&mut self, received_at: DateTime<Utc>) {
        self.0.insert(
            RECEIVED_AT_FIELD.to_string(),
            Value::String(format_timestamp(received_at)),
        );
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

/// ISO-8601 with millisecond precision in UTC, e.g. `2024-05-01T12:30:45.123Z`.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}
