//! Configuration model describing the REST services the adapter polls

use serde::{Deserialize, Serialize};

/// Root of the configuration model
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Model {
    /// The REST services the adapter polls
    pub services: Vec<ServiceConfig>,
}

impl Model {
    /// Looks up a service by name
    pub fn service(&self, name: &str) -> Option<&ServiceConfig> {
        self.services.iter().find(|service| service.name == name)
    }
}

/// Description of one polled REST service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceConfig {
    /// Name identifying the service, unique within the model
    pub name: String,

    /// Host of the REST service
    pub host: String,

    /// Port of the REST service
    pub port: u16,

    /// Whether the service is polled over TLS
    pub secure: bool,

    /// The endpoints the service makes available
    pub endpoints: Vec<EndpointConfig>,

    /// Root of the topic tree the service's values are published under,
    /// unique within the model
    pub topic_path_root: String,

    /// Time between polls in milliseconds
    pub poll_period: u64,

    /// Security directives applied when polling
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security: Option<SecurityConfig>,
}

impl ServiceConfig {
    /// Looks up an endpoint by name
    pub fn endpoint(&self, name: &str) -> Option<&EndpointConfig> {
        self.endpoints.iter().find(|endpoint| endpoint.name == name)
    }
}

/// Description of one endpoint of a polled REST service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointConfig {
    /// Name identifying the endpoint, unique within its service
    pub name: String,

    /// Topic path the endpoint's value is published on, relative to the
    /// service's topic path root and unique within its service
    pub topic_path: String,

    /// URL queried when polling the endpoint
    pub url: String,

    /// Content type produced by the endpoint, e.g. `json` or `string`
    pub produces: String,
}

/// Security directives applied when polling a service
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityConfig {
    /// Basic authentication credentials
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub basic: Option<BasicAuthenticationConfig>,
}

/// Credentials for HTTP basic authentication
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BasicAuthenticationConfig {
    /// User to authenticate as
    pub userid: String,

    /// Password of the user
    pub password: String,
}
