use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// A poll of a REST endpoint has been initiated
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollRequestEvent {
    /// URI that was polled
    pub uri: String,

    /// When the poll was initiated
    pub request_timestamp: DateTime<Utc>,
}

impl PollRequestEvent {
    /// Records a poll initiated now
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            request_timestamp: Utc::now(),
        }
    }
}

/// A poll has returned a response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollSuccessEvent {
    /// The poll this event concludes
    pub request: PollRequestEvent,

    /// HTTP status code of the response
    pub status_code: u16,

    /// Length of the response body in bytes
    pub response_length: u64,

    /// When the response arrived
    pub success_timestamp: DateTime<Utc>,
}

impl PollSuccessEvent {
    /// Records a response that arrived now
    pub fn new(request: PollRequestEvent, status_code: u16, response_length: u64) -> Self {
        Self {
            request,
            status_code,
            response_length,
            success_timestamp: Utc::now(),
        }
    }

    /// Round-trip time of the poll
    pub fn request_time(&self) -> Duration {
        self.success_timestamp - self.request.request_timestamp
    }
}

/// A poll has failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollFailedEvent {
    /// The poll this event concludes
    pub request: PollRequestEvent,

    /// Description of the failure
    pub error: String,

    /// When the failure was observed
    pub failed_timestamp: DateTime<Utc>,
}

impl PollFailedEvent {
    /// Records a failure observed now
    pub fn new(request: PollRequestEvent, error: impl Into<String>) -> Self {
        Self {
            request,
            error: error.into(),
            failed_timestamp: Utc::now(),
        }
    }

    /// Time from initiation to failure
    pub fn request_time(&self) -> Duration {
        self.failed_timestamp - self.request.request_timestamp
    }
}
