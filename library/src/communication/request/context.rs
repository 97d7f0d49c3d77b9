use super::envelope::{RequestEnvelope, ResponseEnvelope};
use crate::communication::transport::MessageTransport;
use crate::BoxedError;
use futures::StreamExt;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

/// Error type for requests that could not be completed
#[derive(Error, Debug)]
pub enum RequestError {
    /// The outbound publish itself failed, no response envelope exists
    #[error("sending of request failed")]
    SendingFailure(#[source] BoxedError),
    /// The far end answered with an error envelope; the display of this
    /// variant is exactly the error string from the wire
    #[error("{0}")]
    Rejected(String),
    /// The far end answered with an envelope carrying neither a response
    /// nor an error
    #[error("Badly formatted response")]
    MalformedResponse,
    /// No response arrived within the deadline passed to
    /// [`RequestContext::request_with_timeout`]
    #[error("timed out waiting for a response")]
    TimedOut,
    /// The context's dispatch task has gone away while the caller was waiting
    #[error("request context has been shut down")]
    ContextClosed,
}

type PendingRequest = oneshot::Sender<Result<Value, RequestError>>;
type CorrelationTable = Arc<Mutex<HashMap<u64, PendingRequest>>>;

/// Requesting side of a conversation multiplexed over a single path
///
/// A context owns the correlation state for one path: a monotonically
/// increasing id counter and the table of requests still waiting for their
/// response. Construction registers the single standing subscription on the
/// path; it lives for as long as the context and is torn down when the
/// context is dropped.
///
/// No retries are performed at this level. A request settles exactly once,
/// through a matching response, a malformed response, a transport-level send
/// failure, or (only for [`request_with_timeout`](Self::request_with_timeout))
/// an expired deadline. A response that never arrives leaves its table entry
/// in place indefinitely, so callers conversing with unreliable counterparts
/// should prefer the deadline-carrying variant.
pub struct RequestContext<T: MessageTransport> {
    transport: Arc<T>,
    path: String,
    next_id: AtomicU64,
    pending: CorrelationTable,
    dispatcher: JoinHandle<()>,
}

impl<T> RequestContext<T>
where
    T: MessageTransport + Send + Sync,
{
    /// Creates a new context conversing on the given path
    ///
    /// The inbound subscription is established before this returns, so a
    /// response can never outrun the listener.
    pub async fn new(transport: Arc<T>, path: impl Into<String>) -> Result<Self, BoxedError> {
        let path = path.into();
        let pending: CorrelationTable = Arc::default();

        let mut stream = transport.listen(&path).await?;
        let table = pending.clone();
        let dispatcher = tokio::spawn(async move {
            while let Some(payload) = stream.next().await {
                dispatch(&table, &payload).await;
            }
            debug!("inbound message stream ended");
        });

        Ok(Self {
            transport,
            path,
            next_id: AtomicU64::new(0),
            pending,
            dispatcher,
        })
    }

    /// Sends a request and waits for the matching response
    ///
    /// Note that this waits indefinitely when the far end never answers.
    pub async fn request<B>(&self, body: &B) -> Result<Value, RequestError>
    where
        B: Serialize + Sync,
    {
        let (_, receiver) = self.send_enveloped(body).await?;

        match receiver.await {
            Ok(outcome) => outcome,
            Err(_) => Err(RequestError::ContextClosed),
        }
    }

    /// Sends a request and waits for the matching response, at most for the
    /// given duration
    ///
    /// On expiry the pending entry is evicted, so a response straggling in
    /// afterwards is ignored like any other unmatched message.
    pub async fn request_with_timeout<B>(
        &self,
        body: &B,
        timeout: Duration,
    ) -> Result<Value, RequestError>
    where
        B: Serialize + Sync,
    {
        let (id, receiver) = self.send_enveloped(body).await?;

        match tokio::time::timeout(timeout, receiver).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(_)) => Err(RequestError::ContextClosed),
            Err(_) => {
                self.pending.lock().await.remove(&id);
                debug!(id, "request timed out");
                Err(RequestError::TimedOut)
            }
        }
    }

    /// Path this context converses on
    pub fn path(&self) -> &str {
        &self.path
    }

    async fn send_enveloped<B>(
        &self,
        body: &B,
    ) -> Result<(u64, oneshot::Receiver<Result<Value, RequestError>>), RequestError>
    where
        B: Serialize + Sync,
    {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let envelope = RequestEnvelope::new(id, body);
        let payload =
            serde_json::to_vec(&envelope).map_err(|e| RequestError::SendingFailure(e.into()))?;

        let (sender, receiver) = oneshot::channel();
        self.pending.lock().await.insert(id, sender);

        trace!(id, path = %self.path, "sending request");

        if let Err(error) = self.transport.send(&self.path, &payload).await {
            self.pending.lock().await.remove(&id);
            debug!(id, %error, "sending request failed");
            return Err(RequestError::SendingFailure(error));
        }

        Ok((id, receiver))
    }
}

impl<T: MessageTransport> Drop for RequestContext<T> {
    fn drop(&mut self) {
        self.dispatcher.abort();
    }
}

/// Routes one inbound payload to the request waiting for its id
///
/// Unmatched ids are expected here: they belong to conversations of other
/// contexts on the same path, or to requests that have already settled.
async fn dispatch(pending: &Mutex<HashMap<u64, PendingRequest>>, payload: &[u8]) {
    let envelope = match serde_json::from_slice::<ResponseEnvelope>(payload) {
        Ok(envelope) => envelope,
        Err(error) => {
            warn!(%error, "discarding inbound message that is not a response envelope");
            return;
        }
    };

    let id = envelope.id;

    match pending.lock().await.remove(&id) {
        Some(handler) => {
            trace!(id, "routing response");
            // The receiver may have been dropped by a timeout eviction racing
            // with this delivery; that request has already settled.
            handler.send(envelope.into_outcome()).ok();
        }
        None => trace!(id, "received a response with no outstanding request"),
    }
}

#[cfg(test)]
mod does {
    use super::*;
    use crate::communication::implementation::mock::MockTransport;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    async fn context_over(
        path: &str,
    ) -> (Arc<MockTransport>, RequestContext<MockTransport>) {
        let transport = Arc::new(MockTransport::new());
        let context = RequestContext::new(transport.clone(), path).await.unwrap();
        (transport, context)
    }

    async fn wait_for_sent(transport: &MockTransport, count: usize) {
        while transport.sent().len() < count {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    }

    fn success_bytes(id: u64, response: Value) -> Vec<u8> {
        serde_json::to_vec(&json!({ "id": id, "response": response })).unwrap()
    }

    #[tokio::test]
    async fn register_its_listener_on_construction() {
        let (transport, _context) = context_over("path").await;
        assert_eq!(transport.listener_count("path"), 1);
    }

    #[tokio::test]
    async fn assign_sequential_ids() {
        let (transport, context) = context_over("path").await;

        for expected in 0..4u64 {
            let body = json!({});
            let request = context.request(&body);
            let driver = async {
                wait_for_sent(&transport, (expected + 1) as usize).await;
                transport.deliver("path", &success_bytes(expected, json!({})));
            };

            let (result, _) = tokio::join!(request, driver);
            result.unwrap();

            let sent = transport.sent();
            assert_eq!(sent[expected as usize].payload_json()["id"], json!(expected));
        }
    }

    #[tokio::test]
    async fn correlate_out_of_order_responses() {
        let (transport, context) = context_over("path").await;

        let first_body = json!({ "type": "a" });
        let first = tokio::time::timeout(
            Duration::from_millis(50),
            context.request(&first_body),
        );
        let second_body = json!({ "type": "b" });
        let second = context.request(&second_body);
        let driver = async {
            wait_for_sent(&transport, 2).await;
            transport.deliver("path", &success_bytes(1, json!("second")));
        };

        let (first_result, second_result, _) = tokio::join!(first, second, driver);

        assert_eq!(second_result.unwrap(), json!("second"));
        assert!(
            first_result.is_err(),
            "request 0 should still be waiting for its response"
        );
    }

    #[tokio::test]
    async fn surface_wire_errors_verbatim() {
        let (transport, context) = context_over("path").await;

        let body = json!({});
        let request = context.request(&body);
        let driver = async {
            wait_for_sent(&transport, 1).await;
            transport.deliver(
                "path",
                &serde_json::to_vec(&json!({ "id": 0, "error": "boom" })).unwrap(),
            );
        };

        let (result, _) = tokio::join!(request, driver);
        let error = result.unwrap_err();

        assert!(matches!(error, RequestError::Rejected(_)));
        assert_eq!(error.to_string(), "boom");
    }

    #[tokio::test]
    async fn reject_responses_without_a_verdict() {
        let (transport, context) = context_over("path").await;

        let body = json!({});
        let request = context.request(&body);
        let driver = async {
            wait_for_sent(&transport, 1).await;
            transport.deliver("path", &serde_json::to_vec(&json!({ "id": 0 })).unwrap());
        };

        let (result, _) = tokio::join!(request, driver);
        let error = result.unwrap_err();

        assert!(matches!(error, RequestError::MalformedResponse));
        assert_eq!(error.to_string(), "Badly formatted response");
    }

    #[tokio::test]
    async fn ignore_request_traffic_on_the_same_path() {
        let (transport, context) = context_over("path").await;

        let body = json!({ "type": "probe" });
        let pending = tokio::time::timeout(
            Duration::from_millis(50),
            context.request(&body),
        );
        let driver = async {
            wait_for_sent(&transport, 1).await;
            // Echo the request back, as a broadcast transport would
            let echo = transport.sent()[0].payload.clone();
            transport.deliver("path", &echo);
        };

        let (result, _) = tokio::join!(pending, driver);
        assert!(
            result.is_err(),
            "the echoed request must not settle the conversation"
        );
    }

    #[tokio::test]
    async fn ignore_responses_nobody_is_waiting_for() {
        let (transport, context) = context_over("path").await;

        // Nothing is pending, this must simply be dropped
        transport.deliver("path", &success_bytes(42, json!("ghost")));

        let body = json!({});
        let request = context.request(&body);
        let driver = async {
            wait_for_sent(&transport, 1).await;
            transport.deliver("path", &success_bytes(0, json!("real")));
        };

        let (result, _) = tokio::join!(request, driver);
        assert_eq!(result.unwrap(), json!("real"));
    }

    #[tokio::test]
    async fn short_circuit_on_send_failure() {
        let (transport, context) = context_over("path").await;

        transport.fail_next_send("connection lost");
        let error = context.request(&json!({})).await.unwrap_err();

        assert!(matches!(error, RequestError::SendingFailure(_)));

        // The entry was evicted, a late response for it has no effect and the
        // next request proceeds normally with the next id
        transport.deliver("path", &success_bytes(0, json!("late")));

        let body = json!({});
        let request = context.request(&body);
        let driver = async {
            wait_for_sent(&transport, 1).await;
            transport.deliver("path", &success_bytes(1, json!("fresh")));
        };

        let (result, _) = tokio::join!(request, driver);
        assert_eq!(result.unwrap(), json!("fresh"));

        assert_eq!(transport.sent()[0].payload_json()["id"], json!(1));
    }

    #[tokio::test]
    async fn settle_each_request_exactly_once() {
        let (transport, context) = context_over("path").await;

        let body = json!({});
        let request = context.request(&body);
        let driver = async {
            wait_for_sent(&transport, 1).await;
            transport.deliver("path", &success_bytes(0, json!("first")));
            transport.deliver("path", &success_bytes(0, json!("second")));
        };

        let (result, _) = tokio::join!(request, driver);
        assert_eq!(result.unwrap(), json!("first"));

        // The duplicate is gone; a new conversation is unaffected by it
        let body = json!({});
        let request = context.request(&body);
        let driver = async {
            wait_for_sent(&transport, 2).await;
            transport.deliver("path", &success_bytes(1, json!("next")));
        };

        let (result, _) = tokio::join!(request, driver);
        assert_eq!(result.unwrap(), json!("next"));
    }

    #[tokio::test]
    async fn evict_the_entry_when_the_deadline_expires() {
        let (transport, context) = context_over("path").await;

        let error = context
            .request_with_timeout(&json!({}), Duration::from_millis(10))
            .await
            .unwrap_err();
        assert!(matches!(error, RequestError::TimedOut));

        // A straggling response for the expired request is ignored
        transport.deliver("path", &success_bytes(0, json!("late")));

        let body = json!({});
        let request = context.request(&body);
        let driver = async {
            wait_for_sent(&transport, 2).await;
            transport.deliver("path", &success_bytes(1, json!("fresh")));
        };

        let (result, _) = tokio::join!(request, driver);
        assert_eq!(result.unwrap(), json!("fresh"));
    }

    #[tokio::test]
    async fn complete_a_store_conversation() {
        let (transport, context) = context_over("svc/store").await;

        let body = json!({
            "type": "create-service",
            "service": { "name": "s0" }
        });
        let request = context.request(&body);
        let driver = async {
            wait_for_sent(&transport, 1).await;

            let sent = transport.sent();
            assert_eq!(sent[0].path, "svc/store");
            assert_eq!(
                sent[0].payload_json(),
                json!({
                    "type": "create-service",
                    "service": { "name": "s0" },
                    "id": 0
                })
            );

            transport.deliver("svc/store", &success_bytes(0, json!({})));
        };

        let (result, _) = tokio::join!(request, driver);
        assert_eq!(result.unwrap(), json!({}));
    }
}
