//! Implementations of the [`MessageTransport`](super::transport::MessageTransport) trait
//!
//! The [`redis`] implementation maps paths onto Redis Pub/Sub channels and is
//! the one deployments run on. The [`mock`] implementation keeps everything in
//! process memory and only exists for tests; it is compiled in when the `test`
//! feature is enabled so downstream crates can use it in their own tests.

#[cfg(any(test, feature = "test"))]
pub mod mock;
pub mod redis;
