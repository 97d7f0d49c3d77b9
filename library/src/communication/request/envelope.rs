use super::RequestError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Frame around an outbound request payload carrying the correlation id
///
/// The payload's fields are flattened into the envelope so the wire format is
/// a single flat object, `{ ...payloadFields, "id": n }`. The `id` field is
/// owned by the envelope; payload types must not serialize a field of that
/// name themselves.
#[derive(Serialize, Debug)]
pub struct RequestEnvelope<'a, B: Serialize> {
    #[serde(flatten)]
    body: &'a B,
    id: u64,
}

impl<'a, B: Serialize> RequestEnvelope<'a, B> {
    /// Creates a new frame around a payload
    pub fn new(id: u64, body: &'a B) -> Self {
        Self { body, id }
    }
}

/// Inbound counterpart of a [`RequestEnvelope`]
///
/// Exactly one of `response` and `error` is expected to be present. An
/// envelope carrying neither is considered malformed; note that a JSON `null`
/// response deserializes to `None` and thus lands in the malformed branch as
/// well, matching the behaviour of the original wire protocol.
///
/// Parsing rejects unknown fields. Requests and responses share a path, so a
/// listener may see request envelopes flowing in the opposite direction; their
/// payload fields make them fail to parse as a response and they are ignored
/// instead of being mistaken for an answer.
#[derive(Serialize, Deserialize, Debug, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ResponseEnvelope {
    pub id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ResponseEnvelope {
    /// Creates a success envelope answering the given correlation id
    pub fn success(id: u64, response: Value) -> Self {
        Self {
            id,
            response: Some(response),
            error: None,
        }
    }

    /// Creates a failure envelope answering the given correlation id
    pub fn failure(id: u64, error: impl Into<String>) -> Self {
        Self {
            id,
            response: None,
            error: Some(error.into()),
        }
    }

    /// Consumes the envelope, classifying it for the waiting caller
    pub(crate) fn into_outcome(self) -> Result<Value, RequestError> {
        match self.error {
            Some(error) if !error.is_empty() => Err(RequestError::Rejected(error)),
            _ => match self.response {
                Some(response) => Ok(response),
                None => Err(RequestError::MalformedResponse),
            },
        }
    }
}
