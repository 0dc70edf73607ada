//! Explicit authentication session.
//!
//! A [`Session`] is created empty, filled by a successful login, and cleared
//! by logout. Clones share state, so the handle given to the [`ApiClient`]
//! observes logins performed through any other clone.
//!
//! [`ApiClient`]: crate::ApiClient

use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};

/// The administrator a session belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Admin {
  #[serde(default)]
  pub id:    Option<serde_json::Value>,
  pub email: String,
  #[serde(default)]
  pub name:  Option<String>,
}

impl Admin {
  /// Name if set, otherwise the email address.
  pub fn display_name(&self) -> &str {
    self.name.as_deref().filter(|n| !n.is_empty()).unwrap_or(&self.email)
  }
}

#[derive(Debug, Clone)]
struct SessionState {
  token: String,
  admin: Admin,
}

/// Shared, cloneable bearer-token session.
#[derive(Debug, Clone, Default)]
pub struct Session {
  inner: Arc<RwLock<Option<SessionState>>>,
}

impl Session {
  pub fn new() -> Self { Self::default() }

  /// Populate the session after a successful login or registration.
  pub fn establish(&self, token: String, admin: Admin) {
    let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
    *guard = Some(SessionState { token, admin });
  }

  /// Drop the token and admin identity.
  pub fn clear(&self) {
    let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
    *guard = None;
  }

  pub fn is_authenticated(&self) -> bool { self.token().is_some() }

  pub fn token(&self) -> Option<String> {
    let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
    guard.as_ref().map(|s| s.token.clone())
  }

  pub fn admin(&self) -> Option<Admin> {
    let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
    guard.as_ref().map(|s| s.admin.clone())
  }
}
