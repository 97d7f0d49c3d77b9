use super::RequestHandler;
use async_trait::async_trait;
use domain::command::StoreCommand;
use domain::model::{EndpointConfig, Model, ServiceConfig};
use serde_json::{json, Value};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Reason a store mutation was refused
///
/// The display of each variant is exactly the error string the console shows,
/// so it goes onto the wire unchanged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("service name conflict")]
    ServiceNameConflict,
    #[error("service root topic conflict")]
    ServiceRootTopicConflict,
    #[error("service missing")]
    ServiceMissing,
    #[error("endpoint name conflict")]
    EndpointNameConflict,
    #[error("endpoint topic conflict")]
    EndpointTopicConflict,
}

/// In-memory configuration model with uniqueness guarantees
///
/// Service names and topic path roots are unique across the model, endpoint
/// names and topic paths unique within their service. Mutations either apply
/// fully or refuse with a [`StoreError`], there is no partial application.
#[derive(Debug, Default)]
pub struct ModelStore {
    model: Model,
}

impl ModelStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_model(model: Model) -> Self {
        Self { model }
    }

    /// Current state of the model
    pub fn model(&self) -> &Model {
        &self.model
    }

    /// Adds a new service
    ///
    /// The service starts out without endpoints regardless of what the
    /// request carried; endpoints are added individually afterwards.
    pub fn create_service(&mut self, service: ServiceConfig) -> Result<(), StoreError> {
        if self.model.service(&service.name).is_some() {
            return Err(StoreError::ServiceNameConflict);
        }

        if self
            .model
            .services
            .iter()
            .any(|existing| existing.topic_path_root == service.topic_path_root)
        {
            return Err(StoreError::ServiceRootTopicConflict);
        }

        self.model.services.push(ServiceConfig {
            endpoints: Vec::new(),
            ..service
        });

        Ok(())
    }

    /// Adds a new endpoint to an existing service
    pub fn create_endpoint(
        &mut self,
        service_name: &str,
        endpoint: EndpointConfig,
    ) -> Result<(), StoreError> {
        let service = self
            .model
            .services
            .iter_mut()
            .find(|service| service.name == service_name)
            .ok_or(StoreError::ServiceMissing)?;

        if service.endpoint(&endpoint.name).is_some() {
            return Err(StoreError::EndpointNameConflict);
        }

        if service
            .endpoints
            .iter()
            .any(|existing| existing.topic_path == endpoint.topic_path)
        {
            return Err(StoreError::EndpointTopicConflict);
        }

        service.endpoints.push(endpoint);

        Ok(())
    }

    /// Removes a service, doing nothing when it does not exist
    pub fn delete_service(&mut self, name: &str) {
        self.model.services.retain(|service| service.name != name);
    }

    /// Removes an endpoint, doing nothing when it does not exist
    pub fn delete_endpoint(&mut self, service_name: &str, endpoint_name: &str) {
        if let Some(service) = self
            .model
            .services
            .iter_mut()
            .find(|service| service.name == service_name)
        {
            service
                .endpoints
                .retain(|endpoint| endpoint.name != endpoint_name);
        }
    }
}

/// Reason a request to the controller was not answered with a response
#[derive(Error, Debug)]
pub enum ControllerError {
    /// The request did not parse as a known command
    #[error("Unknown request type")]
    UnknownRequestType,

    /// The command was refused by the store
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The model could not be put into a response payload
    #[error("unable to serialize the model")]
    Serialization(#[from] serde_json::Error),
}

/// [`RequestHandler`] applying [`StoreCommand`]s to a [`ModelStore`]
///
/// Mutating commands answer an empty object, `list-services` answers the
/// model's service list. Deletes are idempotent and always succeed.
#[derive(Default)]
pub struct ModelController {
    store: Mutex<ModelStore>,
}

impl ModelController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_store(store: ModelStore) -> Self {
        Self {
            store: Mutex::new(store),
        }
    }

    /// Snapshot of the current model
    pub async fn model(&self) -> Model {
        self.store.lock().await.model().clone()
    }
}

#[async_trait]
impl RequestHandler for ModelController {
    type Error = ControllerError;

    async fn handle(&self, request: Value) -> Result<Value, ControllerError> {
        let command = match serde_json::from_value::<StoreCommand>(request) {
            Ok(command) => command,
            Err(error) => {
                warn!(%error, "request is not a known store command");
                return Err(ControllerError::UnknownRequestType);
            }
        };

        debug!(?command, "applying store command");
        let mut store = self.store.lock().await;

        match command {
            StoreCommand::ListServices => Ok(serde_json::to_value(&store.model().services)?),
            StoreCommand::CreateService { service } => {
                store.create_service(service)?;
                Ok(json!({}))
            }
            StoreCommand::CreateEndpoint {
                service_name,
                endpoint,
            } => {
                store.create_endpoint(&service_name, endpoint)?;
                Ok(json!({}))
            }
            StoreCommand::DeleteService { service_name } => {
                store.delete_service(&service_name);
                Ok(json!({}))
            }
            StoreCommand::DeleteEndpoint {
                service_name,
                endpoint_name,
            } => {
                store.delete_endpoint(&service_name, &endpoint_name);
                Ok(json!({}))
            }
        }
    }
}
