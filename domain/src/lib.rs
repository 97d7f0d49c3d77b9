//! Domain specific structures shared by the adapter and its console
//!
//! Everything in here is plain data: the configuration model that describes
//! which REST services are polled and where their values are published, the
//! command vocabulary understood by the model store, and the immutable event
//! records emitted while polling and publishing. Behaviour lives in the
//! `console` crate.

/// Path on which the model store answers [`StoreCommand`](command::StoreCommand) requests
pub const STORE_PATH: &str = "adapter/rest/model/store";

pub mod command;
pub mod metrics;
pub mod model;
