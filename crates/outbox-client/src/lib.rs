//! Async HTTP client for the Outbox admin REST API.
//!
//! [`ApiClient`] implements [`outbox_core::store::SubmissionStore`] on top of
//! `reqwest`. Authentication state lives in an explicit [`Session`] that the
//! caller constructs and hands to the client.

mod client;

pub mod error;
pub mod session;

pub use client::{ApiClient, ApiConfig};
pub use error::{Error, Result};
pub use session::{Admin, Session};
