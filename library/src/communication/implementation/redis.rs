use crate::communication::transport::MessageTransport;
use crate::{BoxedError, EmptyResult};
use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client};
use tracing::debug;

/// [`MessageTransport`] backed by Redis Pub/Sub
///
/// Paths map directly onto channel names. All sends share one multiplexed
/// connection; every call to [`listen`](MessageTransport::listen) opens a
/// dedicated connection because a Redis connection in subscriber mode can not
/// issue regular commands anymore.
pub struct RedisTransport {
    client: Client,
    connection: MultiplexedConnection,
}

impl RedisTransport {
    /// Connects to the Redis instance at the given URL
    pub async fn new(url: &str) -> Result<Self, BoxedError> {
        debug!(url, "connecting to redis");
        let client = Client::open(url)?;
        let connection = client.get_multiplexed_tokio_connection().await?;

        Ok(Self { client, connection })
    }
}

#[async_trait]
impl MessageTransport for RedisTransport {
    async fn send(&self, path: &str, payload: &[u8]) -> EmptyResult {
        let mut connection = self.connection.clone();
        connection.publish::<_, _, ()>(path, payload).await?;

        Ok(())
    }

    async fn listen(&self, path: &str) -> Result<BoxStream<'static, Vec<u8>>, BoxedError> {
        let mut pubsub = self.client.get_async_connection().await?.into_pubsub();
        pubsub.subscribe(path).await?;

        let stream = pubsub
            .into_on_message()
            .map(|message| message.get_payload_bytes().to_vec())
            .boxed();

        Ok(stream)
    }
}
