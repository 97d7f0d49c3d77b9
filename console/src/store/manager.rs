use async_trait::async_trait;
use futures::StreamExt;
use library::communication::request::ResponseEnvelope;
use library::communication::transport::MessageTransport;
use library::BoxedError;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::fmt::Display;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{trace, warn};

/// Application side of the responding end
///
/// Receives the request payload with the envelope already stripped and
/// answers with either a response value or an error message; the
/// [`RequestManager`] puts the verdict on the wire.
#[async_trait]
pub trait RequestHandler: Send + Sync {
    type Error: Display + Send;

    async fn handle(&self, request: Value) -> Result<Value, Self::Error>;
}

#[derive(Deserialize)]
struct InboundRequest {
    id: u64,
    #[serde(flatten)]
    body: Map<String, Value>,
}

/// Wire side of the responding end
///
/// Listens on a path, hands every request envelope to its handler and sends
/// the verdict back on the same path, echoing the request's correlation id.
/// Inbound messages that are not requests are dropped: unparseable payloads
/// and payloads without an id are logged, while response envelopes (the
/// manager's own answers flowing back on a broadcast transport) are silently
/// skipped.
pub struct RequestManager {
    worker: JoinHandle<()>,
}

impl RequestManager {
    /// Starts answering requests arriving on the given path
    pub async fn spawn<T, H>(
        transport: Arc<T>,
        path: impl Into<String>,
        handler: Arc<H>,
    ) -> Result<Self, BoxedError>
    where
        T: MessageTransport + Send + Sync + 'static,
        H: RequestHandler + 'static,
    {
        let path = path.into();
        let mut stream = transport.listen(&path).await?;

        let worker = tokio::spawn(async move {
            while let Some(payload) = stream.next().await {
                answer(&*transport, &path, &*handler, &payload).await;
            }
        });

        Ok(Self { worker })
    }
}

impl Drop for RequestManager {
    fn drop(&mut self) {
        self.worker.abort();
    }
}

async fn answer<T, H>(transport: &T, path: &str, handler: &H, payload: &[u8])
where
    T: MessageTransport,
    H: RequestHandler,
{
    let request = match serde_json::from_slice::<InboundRequest>(payload) {
        Ok(request) => request,
        Err(error) => {
            warn!(%error, "discarding inbound message that is not a request");
            return;
        }
    };

    if request.body.contains_key("response") || request.body.contains_key("error") {
        trace!(id = request.id, "skipping response traffic");
        return;
    }

    let id = request.id;
    trace!(id, "answering request");

    let envelope = match handler.handle(Value::Object(request.body)).await {
        Ok(response) => ResponseEnvelope::success(id, response),
        Err(error) => ResponseEnvelope::failure(id, error.to_string()),
    };

    let reply = match serde_json::to_vec(&envelope) {
        Ok(reply) => reply,
        Err(error) => {
            warn!(id, %error, "unable to serialize response");
            return;
        }
    };

    if let Err(error) = transport.send(path, &reply).await {
        warn!(id, %error, "unable to send response");
    }
}
