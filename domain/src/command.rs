//! Command vocabulary understood by the model store

use crate::model::{EndpointConfig, ServiceConfig};
use serde::{Deserialize, Serialize};

/// Request payload accepted by the model store
///
/// On the wire a command is a flat object tagged by its `type` field; the
/// correlation layer adds the `id` alongside. Mutating commands answer an
/// empty object, `list-services` answers the full [`Model`](crate::model::Model).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum StoreCommand {
    /// Retrieves the full configuration model
    ListServices,

    /// Adds a new service to the model
    #[serde(rename_all = "camelCase")]
    CreateService {
        /// The service to add
        service: ServiceConfig,
    },

    /// Adds a new endpoint to an existing service
    #[serde(rename_all = "camelCase")]
    CreateEndpoint {
        /// Name of the service to extend
        service_name: String,

        /// The endpoint to add
        endpoint: EndpointConfig,
    },

    /// Removes a service and all its endpoints
    #[serde(rename_all = "camelCase")]
    DeleteService {
        /// Name of the service to remove
        service_name: String,
    },

    /// Removes one endpoint of a service
    #[serde(rename_all = "camelCase")]
    DeleteEndpoint {
        /// Name of the service owning the endpoint
        service_name: String,

        /// Name of the endpoint to remove
        endpoint_name: String,
    },
}
