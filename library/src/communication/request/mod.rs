//! Structures to realise a request-response pattern over one-way messaging
//!
//! When talking about the request-response pattern, there are two parties
//! involved:
//!
//! - Requesting side
//! - Responding side
//!
//! On the requesting side, a [`RequestContext`] multiplexes any number of
//! concurrent conversations over a single path. Each outbound payload is
//! wrapped in a [`RequestEnvelope`] carrying a correlation id and each inbound
//! [`ResponseEnvelope`] is routed to the caller waiting for that id. The
//! responding side is free-standing: it merely has to echo the id of a request
//! back in its response envelope (the console's store module implements one).

mod context;
mod envelope;

pub use context::*;
pub use envelope::*;
