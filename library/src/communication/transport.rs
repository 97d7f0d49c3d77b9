use crate::{BoxedError, EmptyResult};
use async_trait::async_trait;
use futures::stream::BoxStream;

/// One-way messaging primitive on which conversations are built
///
/// Implementations wrap a concrete messaging system. The two operations are
/// deliberately asymmetric: sending is fire-and-forget (with transport-level
/// failures surfacing through the returned result) while listening yields a
/// standing stream of every payload that arrives on the path, in broker order.
/// Nothing at this level interprets the payloads.
#[async_trait]
pub trait MessageTransport {
    /// Sends an opaque payload to a path
    async fn send(&self, path: &str, payload: &[u8]) -> EmptyResult;

    /// Registers a standing subscription on a path
    ///
    /// The returned stream ends when the underlying connection is closed.
    async fn listen(&self, path: &str) -> Result<BoxStream<'static, Vec<u8>>, BoxedError>;
}
