use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Type of the topic a value is published on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TopicType {
    Json,
    String,
    Binary,
}

/// Creation of a topic has been requested
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicCreationRequestEvent {
    /// Path of the topic being created
    pub path: String,

    /// Type of the topic being created
    pub topic_type: TopicType,

    /// Length of the initial value in bytes, zero when there is none
    pub initial_value_length: u64,

    /// When the creation was requested
    pub request_timestamp: DateTime<Utc>,
}

impl TopicCreationRequestEvent {
    /// Records a creation requested now
    pub fn new(path: impl Into<String>, topic_type: TopicType, initial_value_length: u64) -> Self {
        Self {
            path: path.into(),
            topic_type,
            initial_value_length,
            request_timestamp: Utc::now(),
        }
    }
}

/// A topic has been created
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicCreationSuccessEvent {
    /// The creation this event concludes
    pub request: TopicCreationRequestEvent,

    /// When the creation was confirmed
    pub success_timestamp: DateTime<Utc>,
}

impl TopicCreationSuccessEvent {
    /// Records a confirmation that arrived now
    pub fn new(request: TopicCreationRequestEvent) -> Self {
        Self {
            request,
            success_timestamp: Utc::now(),
        }
    }

    /// Round-trip time of the creation
    pub fn request_time(&self) -> Duration {
        self.success_timestamp - self.request.request_timestamp
    }
}

/// A topic creation has failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicCreationFailedEvent {
    /// The creation this event concludes
    pub request: TopicCreationRequestEvent,

    /// Reason reported by the server, e.g. `EXISTS` or `PERMISSIONS_FAILURE`
    pub reason: String,

    /// When the failure was observed
    pub failed_timestamp: DateTime<Utc>,
}

impl TopicCreationFailedEvent {
    /// Records a failure observed now
    pub fn new(request: TopicCreationRequestEvent, reason: impl Into<String>) -> Self {
        Self {
            request,
            reason: reason.into(),
            failed_timestamp: Utc::now(),
        }
    }

    /// Time from initiation to failure
    pub fn request_time(&self) -> Duration {
        self.failed_timestamp - self.request.request_timestamp
    }
}
