//! Core types and trait definitions for the Outbox review client.
//!
//! No HTTP or runtime dependencies. The REST client, the draft controller and
//! the terminal UI all build on these types.

// Implementations use native `async fn`; the trait spells out `Send` futures.
#![allow(async_fn_in_trait)]

pub mod error;
pub mod store;
pub mod submission;

pub use error::{Error, Result};
