use crate::communication::transport::MessageTransport;
use crate::{BoxedError, EmptyResult};
use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// Record of one payload handed to [`MessageTransport::send`]
#[derive(Debug, Clone)]
pub struct SentMessage {
    pub path: String,
    pub payload: Vec<u8>,
}

impl SentMessage {
    /// Parses the payload as JSON, panicking when it is not
    pub fn payload_json(&self) -> Value {
        serde_json::from_slice(&self.payload).unwrap()
    }
}

#[derive(Default)]
struct Shared {
    sent: Mutex<Vec<SentMessage>>,
    listeners: Mutex<HashMap<String, Vec<mpsc::UnboundedSender<Vec<u8>>>>>,
    send_failures: Mutex<VecDeque<String>>,
}

impl Shared {
    fn push(&self, path: &str, payload: &[u8]) {
        if let Some(listeners) = self.listeners.lock().unwrap().get(path) {
            for listener in listeners {
                listener.send(payload.to_vec()).ok();
            }
        }
    }
}

/// In-memory [`MessageTransport`] for tests
///
/// A standalone instance built with [`new`](MockTransport::new) records what
/// is sent and delivers nothing on its own; tests inject inbound payloads
/// through [`deliver`](MockTransport::deliver). A crossed pair built with
/// [`pair`](MockTransport::pair) wires two instances together so that what one
/// side sends arrives at the other side's listeners, which is enough to run
/// both ends of a conversation in a single test.
#[derive(Clone)]
pub struct MockTransport {
    local: Arc<Shared>,
    remote: Option<Arc<Shared>>,
}

impl MockTransport {
    /// Creates a standalone instance that swallows everything sent to it
    pub fn new() -> Self {
        Self {
            local: Arc::default(),
            remote: None,
        }
    }

    /// Creates two instances wired up back-to-back
    pub fn pair() -> (Self, Self) {
        let a: Arc<Shared> = Arc::default();
        let b: Arc<Shared> = Arc::default();

        (
            Self {
                local: a.clone(),
                remote: Some(b.clone()),
            },
            Self {
                local: b,
                remote: Some(a),
            },
        )
    }

    /// Injects a payload into every local listener on the path
    pub fn deliver(&self, path: &str, payload: &[u8]) {
        self.local.push(path, payload);
    }

    /// Makes the next call to [`send`](MessageTransport::send) fail
    pub fn fail_next_send(&self, message: impl Into<String>) {
        self.local
            .send_failures
            .lock()
            .unwrap()
            .push_back(message.into());
    }

    /// Everything sent through this instance so far
    pub fn sent(&self) -> Vec<SentMessage> {
        self.local.sent.lock().unwrap().clone()
    }

    /// Number of listeners currently registered on the path
    pub fn listener_count(&self, path: &str) -> usize {
        self.local
            .listeners
            .lock()
            .unwrap()
            .get(path)
            .map(Vec::len)
            .unwrap_or(0)
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessageTransport for MockTransport {
    async fn send(&self, path: &str, payload: &[u8]) -> EmptyResult {
        if let Some(message) = self.local.send_failures.lock().unwrap().pop_front() {
            return Err(message.into());
        }

        self.local.sent.lock().unwrap().push(SentMessage {
            path: path.into(),
            payload: payload.to_vec(),
        });

        if let Some(remote) = &self.remote {
            remote.push(path, payload);
        }

        Ok(())
    }

    async fn listen(&self, path: &str) -> Result<BoxStream<'static, Vec<u8>>, BoxedError> {
        let (sender, receiver) = mpsc::unbounded_channel();

        self.local
            .listeners
            .lock()
            .unwrap()
            .entry(path.into())
            .or_default()
            .push(sender);

        let stream = futures::stream::unfold(receiver, |mut receiver| async move {
            receiver.recv().await.map(|payload| (payload, receiver))
        });

        Ok(stream.boxed())
    }
}

#[cfg(test)]
mod does {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn record_sent_payloads() {
        let transport = MockTransport::new();

        transport.send("some/path", b"hello").await.unwrap();

        let sent = transport.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].path, "some/path");
        assert_eq!(sent[0].payload, b"hello");
    }

    #[tokio::test]
    async fn deliver_to_listeners_on_the_same_path_only() {
        let transport = MockTransport::new();

        let mut matching = transport.listen("a").await.unwrap();
        let mut other = transport.listen("b").await.unwrap();

        transport.deliver("a", b"payload");

        assert_eq!(matching.next().await.unwrap(), b"payload");

        let pending = tokio::time::timeout(std::time::Duration::from_millis(10), other.next());
        assert!(pending.await.is_err());
    }

    #[tokio::test]
    async fn cross_deliver_between_a_pair() {
        let (a, b) = MockTransport::pair();

        let mut a_inbound = a.listen("path").await.unwrap();
        let mut b_inbound = b.listen("path").await.unwrap();

        a.send("path", b"from a").await.unwrap();
        b.send("path", b"from b").await.unwrap();

        assert_eq!(b_inbound.next().await.unwrap(), b"from a");
        assert_eq!(a_inbound.next().await.unwrap(), b"from b");
    }

    #[tokio::test]
    async fn fail_a_send_on_demand() {
        let transport = MockTransport::new();

        transport.fail_next_send("broken");

        let error = transport.send("path", b"payload").await.unwrap_err();
        assert_eq!(error.to_string(), "broken");

        transport.send("path", b"payload").await.unwrap();
        assert_eq!(transport.sent().len(), 1);
    }
}
