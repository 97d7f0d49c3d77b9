//! Responding side of the store conversation
//!
//! The [`RequestManager`] owns the wire concerns: it listens on the store
//! path, unwraps request envelopes and wraps the handler's verdict into
//! response envelopes. The [`ModelController`] owns the semantics: it parses
//! each request as a [`StoreCommand`](domain::command::StoreCommand) and
//! applies it to the in-memory [`ModelStore`].

mod controller;
mod manager;

pub use controller::*;
pub use manager::*;
