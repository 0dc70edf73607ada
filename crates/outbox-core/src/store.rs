//! The `SubmissionStore` trait and supporting query types.
//!
//! The trait is implemented by the REST client (`outbox-client`) and by test
//! doubles. The draft controller and the UI depend on this abstraction, not
//! on HTTP.

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::{
  Result,
  submission::{DraftFields, Submission, SubmissionId, SubmissionStatus},
};

// ─── Query types ─────────────────────────────────────────────────────────────

/// Parameters for [`SubmissionStore::list_submissions`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
  /// `None` lists every status.
  pub status:         Option<SubmissionStatus>,
  /// `None` lists every challenge type.
  pub challenge_type: Option<String>,
  /// Free-text match on the recipient email.
  pub search:         Option<String>,
  /// 1-based page number.
  pub page:           u32,
  pub limit:          u32,
}

impl Default for ListQuery {
  fn default() -> Self {
    Self { status: None, challenge_type: None, search: None, page: 1, limit: 10 }
  }
}

impl ListQuery {
  /// Query-string pairs for the list endpoint. Unset filters are omitted.
  pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
    let mut pairs = Vec::new();
    if let Some(status) = self.status {
      pairs.push(("status", status.as_str().to_string()));
    }
    if let Some(ct) = self.challenge_type.as_deref().filter(|s| !s.is_empty()) {
      pairs.push(("challengeType", ct.to_string()));
    }
    if let Some(q) = self.search.as_deref().filter(|s| !s.is_empty()) {
      pairs.push(("search", q.to_string()));
    }
    pairs.push(("page", self.page.max(1).to_string()));
    pairs.push(("limit", self.limit.to_string()));
    pairs
  }
}

/// One page of [`SubmissionStore::list_submissions`] results.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionPage {
  #[serde(default)]
  pub submissions: Vec<Submission>,
  #[serde(default)]
  pub total:       u64,
  #[serde(default = "first_page")]
  pub page:        u32,
  #[serde(default = "first_page")]
  pub total_pages: u32,
}

fn first_page() -> u32 { 1 }

impl SubmissionPage {
  pub fn has_next(&self) -> bool { self.page < self.total_pages }

  pub fn has_prev(&self) -> bool { self.page > 1 }
}

/// Dashboard counters. Counters the backend omits read as zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubmissionStats {
  pub total:            u64,
  pub processing:       u64,
  pub pending_approval: u64,
  pub sent:             u64,
  pub failed:           u64,
  pub rejected:         u64,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over the backend's submission resource.
///
/// All methods return `Send` futures so implementations can be driven from
/// spawned tokio tasks.
pub trait SubmissionStore: Send + Sync {
  // ── Single record ─────────────────────────────────────────────────────

  /// Fetch one submission. Fails with [`Error::NotFound`](crate::Error::NotFound)
  /// when the id is unknown.
  fn get_submission<'a>(
    &'a self,
    id: &'a SubmissionId,
  ) -> impl Future<Output = Result<Submission>> + Send + 'a;

  /// Replace the editable fields of a submission with `fields`.
  ///
  /// Fails with `Validation` for a malformed field or `Conflict` when the
  /// submission is no longer editable.
  fn update_submission<'a>(
    &'a self,
    id: &'a SubmissionId,
    fields: &'a DraftFields,
  ) -> impl Future<Output = Result<Submission>> + Send + 'a;

  /// Approve and send. Fails with `Conflict` when not editable.
  fn approve_submission<'a>(
    &'a self,
    id: &'a SubmissionId,
  ) -> impl Future<Output = Result<Submission>> + Send + 'a;

  /// Reject. Fails with `Conflict` when not editable.
  fn reject_submission<'a>(
    &'a self,
    id: &'a SubmissionId,
  ) -> impl Future<Output = Result<Submission>> + Send + 'a;

  // ── Listing ───────────────────────────────────────────────────────────

  fn list_submissions<'a>(
    &'a self,
    query: &'a ListQuery,
  ) -> impl Future<Output = Result<SubmissionPage>> + Send + 'a;

  fn stats(&self) -> impl Future<Output = Result<SubmissionStats>> + Send + '_;
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  #[test]
  fn list_query_omits_unset_filters() {
    let q = ListQuery::default();
    assert_eq!(
      q.to_pairs(),
      vec![("page", "1".to_string()), ("limit", "10".to_string())]
    );
  }

  #[test]
  fn list_query_includes_filters() {
    let q = ListQuery {
      status: Some(SubmissionStatus::Sent),
      challenge_type: Some("Persona-Based".into()),
      search: Some("a@b".into()),
      page: 3,
      limit: 10,
    };
    let pairs = q.to_pairs();
    assert!(pairs.contains(&("status", "sent".to_string())));
    assert!(pairs.contains(&("challengeType", "Persona-Based".to_string())));
    assert!(pairs.contains(&("search", "a@b".to_string())));
    assert!(pairs.contains(&("page", "3".to_string())));
  }

  #[test]
  fn page_decodes_camel_case() {
    let page: SubmissionPage = serde_json::from_value(json!({
      "submissions": [],
      "total": 21,
      "page": 2,
      "totalPages": 3
    }))
    .unwrap();
    assert_eq!(page.total_pages, 3);
    assert!(page.has_next());
    assert!(page.has_prev());
  }

  #[test]
  fn stats_default_missing_counters() {
    let stats: SubmissionStats =
      serde_json::from_value(json!({ "total": 5, "sent": 2 })).unwrap();
    assert_eq!(stats.total, 5);
    assert_eq!(stats.failed, 0);
  }
}
