//! Client façade the console UI talks to

use domain::command::StoreCommand;
use domain::model::{EndpointConfig, Model, ServiceConfig};
use library::communication::request::{RequestContext, RequestError};
use library::communication::transport::MessageTransport;
use library::BoxedError;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::instrument;

/// Reason a model operation failed
#[derive(Error, Debug)]
pub enum ClientError {
    /// The conversation with the store failed
    #[error(transparent)]
    Request(#[from] RequestError),

    /// The store answered with a payload of an unexpected shape
    #[error("response payload has an unexpected shape")]
    UnexpectedResponse(#[source] serde_json::Error),
}

/// Console-side view of the model store
///
/// Owns a conversation with the store and a local copy of the model. The copy
/// is only ever mutated after the store confirmed an operation; a refused or
/// failed request leaves it untouched, so the console never displays state the
/// store did not accept.
pub struct ModelClient<T: MessageTransport> {
    context: RequestContext<T>,
    model: Mutex<Model>,
}

impl<T> ModelClient<T>
where
    T: MessageTransport + Send + Sync,
{
    /// Opens a conversation with the store reachable over the given transport
    pub async fn new(transport: Arc<T>) -> Result<Self, BoxedError> {
        Ok(Self {
            context: RequestContext::new(transport, domain::STORE_PATH).await?,
            model: Mutex::default(),
        })
    }

    /// Fetches the model from the store, refreshing the local copy
    #[instrument(skip(self))]
    pub async fn model(&self) -> Result<Model, ClientError> {
        let response = self.context.request(&StoreCommand::ListServices).await?;
        let services =
            serde_json::from_value(response).map_err(ClientError::UnexpectedResponse)?;

        let model = Model { services };
        *self.model.lock().await = model.clone();

        Ok(model)
    }

    /// Local copy of the model as of the last confirmed operation
    pub async fn cached(&self) -> Model {
        self.model.lock().await.clone()
    }

    /// Looks up a service in the local copy
    pub async fn service(&self, name: &str) -> Option<ServiceConfig> {
        self.model.lock().await.service(name).cloned()
    }

    /// Asks the store to add a service
    ///
    /// The store registers the service without endpoints; they are added one
    /// by one through [`create_endpoint`](Self::create_endpoint).
    #[instrument(skip(self, service), fields(service = %service.name))]
    pub async fn create_service(&self, service: ServiceConfig) -> Result<(), ClientError> {
        self.context
            .request(&StoreCommand::CreateService {
                service: service.clone(),
            })
            .await?;

        self.model.lock().await.services.push(ServiceConfig {
            endpoints: Vec::new(),
            ..service
        });

        Ok(())
    }

    /// Asks the store to add an endpoint to a service
    #[instrument(skip(self, endpoint), fields(endpoint = %endpoint.name))]
    pub async fn create_endpoint(
        &self,
        service_name: &str,
        endpoint: EndpointConfig,
    ) -> Result<(), ClientError> {
        self.context
            .request(&StoreCommand::CreateEndpoint {
                service_name: service_name.into(),
                endpoint: endpoint.clone(),
            })
            .await?;

        let mut model = self.model.lock().await;
        if let Some(service) = model
            .services
            .iter_mut()
            .find(|service| service.name == service_name)
        {
            service.endpoints.push(endpoint);
        }

        Ok(())
    }

    /// Asks the store to remove a service
    #[instrument(skip(self))]
    pub async fn delete_service(&self, name: &str) -> Result<(), ClientError> {
        self.context
            .request(&StoreCommand::DeleteService {
                service_name: name.into(),
            })
            .await?;

        self.model
            .lock()
            .await
            .services
            .retain(|service| service.name != name);

        Ok(())
    }

    /// Asks the store to remove an endpoint
    #[instrument(skip(self))]
    pub async fn delete_endpoint(
        &self,
        service_name: &str,
        endpoint_name: &str,
    ) -> Result<(), ClientError> {
        self.context
            .request(&StoreCommand::DeleteEndpoint {
                service_name: service_name.into(),
                endpoint_name: endpoint_name.into(),
            })
            .await?;

        let mut model = self.model.lock().await;
        if let Some(service) = model
            .services
            .iter_mut()
            .find(|service| service.name == service_name)
        {
            service
                .endpoints
                .retain(|endpoint| endpoint.name != endpoint_name);
        }

        Ok(())
    }
}
