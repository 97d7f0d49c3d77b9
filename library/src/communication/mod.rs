//! Structures to converse with services over a one-way messaging primitive
//!
//! The underlying messaging system only offers two operations: sending an
//! opaque payload to a path and listening for payloads that arrive on a path
//! (see the [`MessageTransport`](transport::MessageTransport) trait). On top of
//! that, this module synthesizes a request/response pattern: the
//! [`RequestContext`](request::RequestContext) stamps every outbound message
//! with a locally unique correlation id and routes inbound responses back to
//! the caller that is waiting for them.
//!
//! Responses are not crash-tolerant. If the requesting process goes away, the
//! conversation state goes with it and the far end's reply is silently
//! discarded. This is by design as whatever triggered the request is lost as
//! well and the surrounding workflow will be repeated from scratch.

pub mod implementation;
pub mod request;
pub mod transport;
