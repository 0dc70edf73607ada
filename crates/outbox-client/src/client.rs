//! Async HTTP client wrapping the Outbox admin JSON API.

use std::time::Duration;

use outbox_core::{
  Error as StoreError,
  store::{ListQuery, SubmissionPage, SubmissionStats, SubmissionStore},
  submission::{DraftFields, Submission, SubmissionId},
};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::{
  Error, Result,
  session::{Admin, Session},
};

/// Connection settings for the admin API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  pub base_url: String,
  pub timeout:  Duration,
}

impl ApiConfig {
  pub fn new(base_url: impl Into<String>) -> Self {
    Self { base_url: base_url.into(), timeout: Duration::from_secs(30) }
  }
}

/// Async HTTP client for the admin REST API.
///
/// Cheap to clone: the inner [`reqwest::Client`] and the [`Session`] are
/// both `Arc`-based.
#[derive(Clone)]
pub struct ApiClient {
  client:  Client,
  config:  ApiConfig,
  session: Session,
}

#[derive(Serialize)]
struct LoginBody<'a> {
  email:    &'a str,
  password: &'a str,
  #[serde(skip_serializing_if = "Option::is_none")]
  name:     Option<&'a str>,
}

#[derive(Deserialize)]
struct AuthResponse {
  token: String,
  admin: Admin,
}

impl ApiClient {
  pub fn new(config: ApiConfig, session: Session) -> Result<Self> {
    if !config.base_url.starts_with("http://") && !config.base_url.starts_with("https://") {
      return Err(Error::BaseUrl(config.base_url));
    }
    let client = Client::builder()
      .timeout(config.timeout)
      .build()
      .map_err(Error::Build)?;
    Ok(Self { client, config, session })
  }

  pub fn session(&self) -> &Session { &self.session }

  fn url(&self, path: &str) -> String {
    format!(
      "{}/api/admin{}",
      self.config.base_url.trim_end_matches('/'),
      path
    )
  }

  fn request(&self, method: Method, path: &str) -> RequestBuilder {
    let req = self.client.request(method, self.url(path));
    match self.session.token() {
      Some(token) => req.bearer_auth(token),
      None => req,
    }
  }

  // ── Session ───────────────────────────────────────────────────────────────

  /// `POST /api/admin/login`. Populates the session on success.
  pub async fn login(&self, email: &str, password: &str) -> Result<Admin> {
    let body = LoginBody { email, password, name: None };
    self.authenticate("/login", &body).await
  }

  /// `POST /api/admin/register`. Populates the session on success.
  pub async fn register(&self, email: &str, password: &str, name: &str) -> Result<Admin> {
    let body = LoginBody { email, password, name: Some(name) };
    self.authenticate("/register", &body).await
  }

  /// Forget the current token. Purely local; the backend is not told.
  pub fn logout(&self) {
    self.session.clear();
    tracing::info!("logged out");
  }

  async fn authenticate(&self, path: &str, body: &LoginBody<'_>) -> Result<Admin> {
    let resp = send(self.client.post(self.url(path)).json(body), path).await?;
    let auth: AuthResponse = decode(resp, path).await?;
    tracing::info!(email = %auth.admin.email, "authenticated");
    self.session.establish(auth.token, auth.admin.clone());
    Ok(auth.admin)
  }

  async fn call<T: DeserializeOwned>(&self, req: RequestBuilder, what: &str) -> Result<T, StoreError> {
    let resp = send(req, what).await?;
    decode(resp, what).await
  }
}

// ─── Response handling ────────────────────────────────────────────────────────

async fn send(req: RequestBuilder, what: &str) -> Result<Response, StoreError> {
  req
    .send()
    .await
    .map_err(|e| StoreError::Transport(format!("{what}: {e}")))
}

async fn decode<T: DeserializeOwned>(resp: Response, what: &str) -> Result<T, StoreError> {
  let status = resp.status();
  if !status.is_success() {
    let body = resp.text().await.unwrap_or_default();
    return Err(status_error(status, &body, what));
  }
  resp
    .json()
    .await
    .map_err(|e| StoreError::Decode(format!("{what}: {e}")))
}

/// Map a non-success response onto the store error taxonomy.
fn status_error(status: StatusCode, body: &str, what: &str) -> StoreError {
  let message = error_message(body).unwrap_or_else(|| format!("{what} → {status}"));
  match status {
    StatusCode::NOT_FOUND => StoreError::NotFound(SubmissionId::new(id_from_path(what))),
    StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => StoreError::Validation(message),
    StatusCode::CONFLICT => StoreError::Conflict(message),
    StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => StoreError::Unauthorized,
    _ => StoreError::Http { status: status.as_u16(), message },
  }
}

/// `/submissions/<id>[/action]` → `<id>`.
fn id_from_path(path: &str) -> &str {
  path
    .strip_prefix("/submissions/")
    .and_then(|rest| rest.split('/').next())
    .unwrap_or(path)
}

/// Pull `message` (or `error`) out of a JSON error body.
fn error_message(body: &str) -> Option<String> {
  let value: serde_json::Value = serde_json::from_str(body).ok()?;
  value
    .get("message")
    .or_else(|| value.get("error"))
    .and_then(|m| m.as_str())
    .map(str::to_string)
}

// ─── Store ────────────────────────────────────────────────────────────────────

impl SubmissionStore for ApiClient {
  /// `GET /api/admin/submissions/<id>`
  async fn get_submission<'a>(&'a self, id: &'a SubmissionId) -> Result<Submission, StoreError> {
    let path = format!("/submissions/{id}");
    self.call(self.request(Method::GET, &path), &path).await
  }

  /// `PATCH /api/admin/submissions/<id>`
  async fn update_submission<'a>(
    &'a self,
    id: &'a SubmissionId,
    fields: &'a DraftFields,
  ) -> Result<Submission, StoreError> {
    let path = format!("/submissions/{id}");
    self
      .call(self.request(Method::PATCH, &path).json(fields), &path)
      .await
  }

  /// `POST /api/admin/submissions/<id>/approve`
  async fn approve_submission<'a>(&'a self, id: &'a SubmissionId) -> Result<Submission, StoreError> {
    let path = format!("/submissions/{id}/approve");
    self.call(self.request(Method::POST, &path), &path).await
  }

  /// `POST /api/admin/submissions/<id>/reject`
  async fn reject_submission<'a>(&'a self, id: &'a SubmissionId) -> Result<Submission, StoreError> {
    let path = format!("/submissions/{id}/reject");
    self.call(self.request(Method::POST, &path), &path).await
  }

  /// `GET /api/admin/submissions?status=&challengeType=&search=&page=&limit=`
  async fn list_submissions<'a>(&'a self, query: &'a ListQuery) -> Result<SubmissionPage, StoreError> {
    let req = self
      .request(Method::GET, "/submissions")
      .query(&query.to_pairs());
    self.call(req, "/submissions").await
  }

  /// `GET /api/admin/submissions/stats`
  async fn stats(&self) -> Result<SubmissionStats, StoreError> {
    let path = "/submissions/stats";
    self.call(self.request(Method::GET, path), path).await
  }
}
