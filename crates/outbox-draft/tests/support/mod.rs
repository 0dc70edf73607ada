//! In-memory `SubmissionStore` with a call log and fault injection.

#![allow(dead_code)]

use std::{
  sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
  },
  time::Duration,
};

use outbox_core::{
  Error, Result,
  store::{ListQuery, SubmissionPage, SubmissionStats, SubmissionStore},
  submission::{Activity, DraftFields, Submission, SubmissionId, SubmissionStatus},
};
use outbox_draft::{DraftConfig, DraftController, DraftSnapshot};
use tokio::time::{sleep, timeout};

#[derive(Default)]
struct Log {
  fetches:   usize,
  updates:   Vec<DraftFields>,
  approvals: usize,
  rejections: usize,
}

pub struct ScriptedStore {
  record:         Mutex<Submission>,
  log:            Mutex<Log>,
  fail_fetch:     Mutex<Option<Error>>,
  fail_updates:   Mutex<Option<Error>>,
  fail_approve:   Mutex<Option<Error>>,
  update_latency: Mutex<Duration>,
  in_flight:      AtomicUsize,
  max_in_flight:  AtomicUsize,
}

impl ScriptedStore {
  pub fn new(record: Submission) -> Arc<Self> {
    Arc::new(Self {
      record:         Mutex::new(record),
      log:            Mutex::default(),
      fail_fetch:     Mutex::new(None),
      fail_updates:   Mutex::new(None),
      fail_approve:   Mutex::new(None),
      update_latency: Mutex::new(Duration::from_millis(50)),
      in_flight:      AtomicUsize::new(0),
      max_in_flight:  AtomicUsize::new(0),
    })
  }

  pub fn set_update_latency(&self, latency: Duration) {
    *self.update_latency.lock().unwrap() = latency;
  }

  pub fn fail_fetch(&self, err: Error) { *self.fail_fetch.lock().unwrap() = Some(err); }

  pub fn fail_updates(&self, err: Option<Error>) { *self.fail_updates.lock().unwrap() = err; }

  pub fn fail_approve(&self, err: Option<Error>) { *self.fail_approve.lock().unwrap() = err; }

  pub fn updates(&self) -> Vec<DraftFields> { self.log.lock().unwrap().updates.clone() }

  pub fn update_count(&self) -> usize { self.log.lock().unwrap().updates.len() }

  pub fn approvals(&self) -> usize { self.log.lock().unwrap().approvals }

  pub fn rejections(&self) -> usize { self.log.lock().unwrap().rejections }

  pub fn max_in_flight(&self) -> usize { self.max_in_flight.load(Ordering::SeqCst) }

  pub fn record(&self) -> Submission { self.record.lock().unwrap().clone() }

  fn transition(&self, to: SubmissionStatus) -> Result<Submission> {
    let mut record = self.record.lock().unwrap();
    if !record.is_editable() {
      return Err(Error::Conflict(format!("submission is {}", record.status)));
    }
    record.status = to;
    Ok(record.clone())
  }
}

impl SubmissionStore for ScriptedStore {
  async fn get_submission<'a>(&'a self, id: &'a SubmissionId) -> Result<Submission> {
    self.log.lock().unwrap().fetches += 1;
    if let Some(err) = self.fail_fetch.lock().unwrap().clone() {
      return Err(err);
    }
    let record = self.record();
    if &record.id != id {
      return Err(Error::NotFound(id.clone()));
    }
    Ok(record)
  }

  async fn update_submission<'a>(
    &'a self,
    _id: &'a SubmissionId,
    fields: &'a DraftFields,
  ) -> Result<Submission> {
    self.log.lock().unwrap().updates.push(fields.clone());
    let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
    self.max_in_flight.fetch_max(now, Ordering::SeqCst);

    let latency = *self.update_latency.lock().unwrap();
    sleep(latency).await;
    self.in_flight.fetch_sub(1, Ordering::SeqCst);

    if let Some(err) = self.fail_updates.lock().unwrap().clone() {
      return Err(err);
    }
    let mut record = self.record.lock().unwrap();
    if !record.is_editable() {
      return Err(Error::Conflict("submission is no longer editable".into()));
    }
    record.apply(fields);
    Ok(record.clone())
  }

  async fn approve_submission<'a>(&'a self, _id: &'a SubmissionId) -> Result<Submission> {
    self.log.lock().unwrap().approvals += 1;
    if let Some(err) = self.fail_approve.lock().unwrap().clone() {
      return Err(err);
    }
    self.transition(SubmissionStatus::Sent)
  }

  async fn reject_submission<'a>(&'a self, _id: &'a SubmissionId) -> Result<Submission> {
    self.log.lock().unwrap().rejections += 1;
    self.transition(SubmissionStatus::Rejected)
  }

  async fn list_submissions<'a>(&'a self, query: &'a ListQuery) -> Result<SubmissionPage> {
    Ok(SubmissionPage {
      submissions: vec![self.record()],
      total:       1,
      page:        query.page,
      total_pages: 1,
    })
  }

  async fn stats(&self) -> Result<SubmissionStats> {
    Ok(SubmissionStats { total: 1, ..SubmissionStats::default() })
  }
}

// ─── Fixtures ────────────────────────────────────────────────────────────────

pub const DEBOUNCE: Duration = Duration::from_secs(2);
pub const GRACE: Duration = Duration::from_millis(500);

pub fn config() -> DraftConfig {
  DraftConfig { debounce: DEBOUNCE, load_grace: GRACE }
}

/// The record from the end-to-end review scenario.
pub fn pending_record() -> Submission {
  let mut s = Submission::new(42u64, SubmissionStatus::PendingApproval);
  s.subject = "Hi".into();
  s.user_email = "a@b.com".into();
  s.invitation_script = "come".into();
  s.activities = vec![Activity::named("Hike")];
  s
}

/// Load `store`'s record and wait out the load grace period.
pub async fn open(store: &Arc<ScriptedStore>) -> DraftController {
  let id = store.record().id;
  let draft = DraftController::load(Arc::clone(store), id, config())
    .await
    .expect("load");
  sleep(GRACE + Duration::from_millis(100)).await;
  assert!(!draft.snapshot().suppressed);
  draft
}

/// Wait (in paused time) until the draft satisfies `pred`.
pub async fn wait_until(
  draft: &DraftController,
  pred: impl FnMut(&DraftSnapshot) -> bool,
) -> DraftSnapshot {
  let mut rx = draft.subscribe();
  let snap = timeout(Duration::from_secs(60), rx.wait_for(pred))
    .await
    .expect("condition not reached")
    .expect("draft closed");
  snap.clone()
}
