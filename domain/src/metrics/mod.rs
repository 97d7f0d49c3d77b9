//! Immutable event records describing the adapter's interactions
//!
//! Each interaction produces a request event when it is initiated and either a
//! success or a failure event when it concludes. The concluding event embeds
//! the request event it answers; the round-trip time is derived from the two
//! embedded timestamps instead of being stored.

mod poll;
mod publication;
mod topic_creation;

pub use poll::*;
pub use publication::*;
pub use topic_creation::*;
