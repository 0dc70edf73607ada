//! Error type for `outbox-client` operations that are not store calls
//! (building the client, logging in).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("failed to build HTTP client: {0}")]
  Build(#[source] reqwest::Error),

  #[error("invalid base url {0:?}")]
  BaseUrl(String),

  #[error(transparent)]
  Store(#[from] outbox_core::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
