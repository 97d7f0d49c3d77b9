use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Publication of a polled value has been initiated
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicationRequestEvent {
    /// Topic path the value is published on
    pub path: String,

    /// Length of the published value in bytes
    pub value_length: u64,

    /// When the publication was initiated
    pub request_timestamp: DateTime<Utc>,
}

impl PublicationRequestEvent {
    /// Records a publication initiated now
    pub fn new(path: impl Into<String>, value_length: u64) -> Self {
        Self {
            path: path.into(),
            value_length,
            request_timestamp: Utc::now(),
        }
    }
}

/// A publication has been acknowledged
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicationSuccessEvent {
    /// The publication this event concludes
    pub request: PublicationRequestEvent,

    /// When the acknowledgement arrived
    pub success_timestamp: DateTime<Utc>,
}

impl PublicationSuccessEvent {
    /// Records an acknowledgement that arrived now
    pub fn new(request: PublicationRequestEvent) -> Self {
        Self {
            request,
            success_timestamp: Utc::now(),
        }
    }

    /// Round-trip time of the publication
    pub fn request_time(&self) -> Duration {
        self.success_timestamp - self.request.request_timestamp
    }
}

/// A publication has failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicationFailedEvent {
    /// The publication this event concludes
    pub request: PublicationRequestEvent,

    /// Description of the failure
    pub error: String,

    /// When the failure was observed
    pub failed_timestamp: DateTime<Utc>,
}

impl PublicationFailedEvent {
    /// Records a failure observed now
    pub fn new(request: PublicationRequestEvent, error: impl Into<String>) -> Self {
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
