//! Session management for the console's connection to the messaging backend

use async_trait::async_trait;
use library::communication::transport::MessageTransport;
use library::BoxedError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Time waited between two connection attempts
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(5);

/// Connection parameters for the messaging backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionOptions {
    /// Host the backend is reachable on
    pub host: String,

    /// Port the backend is reachable on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Whether the connection uses TLS
    #[serde(default)]
    pub secure: bool,
}

fn default_port() -> u16 {
    8080
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            host: "localhost".into(),
            port: default_port(),
            secure: false,
        }
    }
}

/// Strategy performing a single connection attempt
///
/// Kept separate from the [`SessionManager`] so the retry behaviour can be
/// exercised without a real backend.
#[async_trait]
pub trait Connector {
    type Transport: MessageTransport;

    async fn connect(&self, options: &SessionOptions) -> Result<Self::Transport, BoxedError>;
}

/// Lazily connecting, reconnecting provider of the console's transport
///
/// The first call to [`session`](Self::session) connects, retrying on a fixed
/// deferral until an attempt succeeds, and every later call hands out the
/// established transport. [`invalidate`](Self::invalidate) drops the cached
/// transport so the next call connects anew, which is how the console recovers
/// after the backend went away.
pub struct SessionManager<C: Connector> {
    connector: C,
    options: SessionOptions,
    retry_interval: Duration,
    session: Mutex<Option<Arc<C::Transport>>>,
}

impl<C: Connector> SessionManager<C> {
    pub fn new(connector: C, options: SessionOptions) -> Self {
        Self {
            connector,
            options,
            retry_interval: DEFAULT_RETRY_INTERVAL,
            session: Mutex::default(),
        }
    }

    /// Overrides the deferral between two connection attempts
    pub fn with_retry_interval(mut self, interval: Duration) -> Self {
        self.retry_interval = interval;
        self
    }

    /// Returns the established transport, connecting first if there is none
    ///
    /// Does not return until a connection attempt succeeds. Concurrent callers
    /// share one attempt instead of racing their own.
    pub async fn session(&self) -> Arc<C::Transport> {
        let mut slot = self.session.lock().await;

        if let Some(session) = &*slot {
            return session.clone();
        }

        loop {
            match self.connector.connect(&self.options).await {
                Ok(transport) => {
                    debug!(host = %self.options.host, port = self.options.port, "session established");
                    let session = Arc::new(transport);
                    *slot = Some(session.clone());
                    return session;
                }
                Err(error) => {
                    warn!(%error, deferral = ?self.retry_interval, "connection attempt failed");
                    tokio::time::sleep(self.retry_interval).await;
                }
            }
        }
    }

    /// Drops the cached transport so the next [`session`](Self::session) call
    /// connects anew
    pub async fn invalidate(&self) {
        *self.session.lock().await = None;
    }
}

#[cfg(test)]
mod does {
    use super::*;
    use library::communication::implementation::mock::MockTransport;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FlakyConnector {
        attempts: AtomicUsize,
        failures: usize,
    }

    impl FlakyConnector {
        fn failing(failures: usize) -> Self {
            Self {
                attempts: AtomicUsize::new(0),
                failures,
            }
        }
    }

    #[async_trait]
    impl Connector for FlakyConnector {
        type Transport = MockTransport;

        async fn connect(&self, _options: &SessionOptions) -> Result<MockTransport, BoxedError> {
            let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);

            if attempt < self.failures {
                Err("connection refused".into())
            } else {
                Ok(MockTransport::new())
            }
        }
    }

    fn manager(failures: usize) -> SessionManager<FlakyConnector> {
        SessionManager::new(FlakyConnector::failing(failures), SessionOptions::default())
            .with_retry_interval(Duration::from_millis(1))
    }

    #[tokio::test]
    async fn retry_until_an_attempt_succeeds() {
        let manager = manager(3);

        manager.session().await;

        assert_eq!(manager.connector.attempts.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn hand_out_the_cached_session() {
        let manager = manager(0);

        let first = manager.session().await;
        let second = manager.session().await;

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(manager.connector.attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn reconnect_after_invalidation() {
        let manager = manager(0);

        let first = manager.session().await;
        manager.invalidate().await;
        let second = manager.session().await;

        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(manager.connector.attempts.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn deserialize_options_with_defaults() {
        let options: SessionOptions =
            serde_json::from_str(r#"{ "host": "diffusion.example.com" }"#).unwrap();

        assert_eq!(
            options,
            SessionOptions {
                host: "diffusion.example.com".into(),
                port: 8080,
                secure: false,
            }
        );
    }
}
