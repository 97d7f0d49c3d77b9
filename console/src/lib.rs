//! Control plane of the admin console
//!
//! Ties the generic conversation layer from the `library` crate to the
//! adapter's domain model: the [`client`] module is what the console UI talks
//! to, the [`store`] module is the far end answering its requests, and the
//! [`session`] module supplies both with a connected transport.

pub mod client;
pub mod session;
pub mod store;
