//! Independent and project agnostic building blocks
//!
//! Nothing in this crate knows about the console or the adapter's domain model.
//! The submodules are written so that any of them could be extracted into its
//! own crate at any given time; everything domain specific lives in the
//! `domain` crate and everything console specific in the `console` crate.

pub mod communication;

/// Generic error type
pub type BoxedError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result with no value and a [`BoxedError`]
pub type EmptyResult = Result<(), BoxedError>;
