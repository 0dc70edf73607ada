//! Auto-save behaviour of `DraftController`, driven in paused tokio time.

mod support;

use std::time::Duration;

use outbox_core::{
  Error as StoreError,
  submission::{ActivityEdit, ActivityField, FieldEdit, SubmissionId, SubmissionStatus},
};
use outbox_draft::{DraftController, DraftError, SaveStatus};
use support::{DEBOUNCE, ScriptedStore, config, open, pending_record, wait_until};
use tokio::time::sleep;

fn subject(s: &str) -> FieldEdit { FieldEdit::Subject(s.to_string()) }

// ─── Load ────────────────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn load_populates_fields_without_saving() {
  let store = ScriptedStore::new(pending_record());
  let draft = DraftController::load(store.clone(), SubmissionId::from(42u64), config())
    .await
    .unwrap();

  let snap = draft.snapshot();
  assert!(snap.suppressed);
  assert_eq!(snap.fields.subject, "Hi");
  assert_eq!(snap.fields.user_email, "a@b.com");
  assert_eq!(snap.save_status, SaveStatus::Idle);

  sleep(Duration::from_secs(10)).await;
  assert_eq!(store.update_count(), 0);
  assert!(!draft.snapshot().suppressed);
  assert!(!draft.snapshot().dirty);
}

#[tokio::test(start_paused = true)]
async fn edits_during_load_grace_are_not_saved() {
  let store = ScriptedStore::new(pending_record());
  let draft = DraftController::load(store.clone(), SubmissionId::from(42u64), config())
    .await
    .unwrap();

  draft.set_field(subject("settling")).await.unwrap();
  let snap = draft.snapshot();
  assert_eq!(snap.fields.subject, "settling");
  assert!(!snap.dirty);
  assert_eq!(snap.save_status, SaveStatus::Idle);

  sleep(DEBOUNCE * 3).await;
  assert_eq!(store.update_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn failed_fetch_is_fatal() {
  let store = ScriptedStore::new(pending_record());
  store.fail_fetch(StoreError::NotFound(SubmissionId::new("7")));

  let err = DraftController::load(store.clone(), SubmissionId::new("7"), config())
    .await
    .err()
    .unwrap();
  assert_eq!(err, DraftError::Load(StoreError::NotFound(SubmissionId::new("7"))));
}

// ─── Debounce ────────────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn burst_of_edits_coalesces_into_one_write() {
  let store = ScriptedStore::new(pending_record());
  let draft = open(&store).await;

  for text in ["H", "He", "Hel", "Hell", "Hello"] {
    draft.set_field(subject(text)).await.unwrap();
    assert_eq!(draft.snapshot().save_status, SaveStatus::Pending);
    sleep(Duration::from_millis(1500)).await;
  }
  assert_eq!(store.update_count(), 0);

  let snap = wait_until(&draft, |s| s.save_status == SaveStatus::Saved).await;
  assert!(!snap.dirty);
  assert!(snap.last_saved_at.is_some());

  let updates = store.updates();
  assert_eq!(updates.len(), 1);
  assert_eq!(updates[0].subject, "Hello");
  assert_eq!(updates[0].user_email, "a@b.com");
}

#[tokio::test(start_paused = true)]
async fn clean_draft_never_writes_again() {
  let store = ScriptedStore::new(pending_record());
  let draft = open(&store).await;

  draft.set_field(subject("Hello")).await.unwrap();
  wait_until(&draft, |s| s.save_status == SaveStatus::Saved).await;

  sleep(DEBOUNCE * 5).await;
  draft.save_now().await.unwrap();
  assert_eq!(store.update_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn every_field_kind_schedules_a_save() {
  let store = ScriptedStore::new(pending_record());
  let draft = open(&store).await;

  draft
    .set_field(FieldEdit::PersonaBridge("both love trails".into()))
    .await
    .unwrap();
  draft
    .set_activity_field(ActivityEdit {
      index: 0,
      field: ActivityField::Hours,
      value: "9-5".into(),
    })
    .await
    .unwrap();
  wait_until(&draft, |s| s.save_status == SaveStatus::Saved).await;

  let updates = store.updates();
  assert_eq!(updates.len(), 1);
  assert_eq!(updates[0].persona_bridge, "both love trails");
  assert_eq!(updates[0].activities[0].hours, "9-5");
  assert_eq!(updates[0].activities[0].name, "Hike");
}

#[tokio::test(start_paused = true)]
async fn missing_activity_edit_is_ignored() {
  let store = ScriptedStore::new(pending_record());
  let draft = open(&store).await;

  draft
    .set_activity_field(ActivityEdit {
      index: 5,
      field: ActivityField::Name,
      value: "Ghost".into(),
    })
    .await
    .unwrap();
  let snap = draft.snapshot();
  assert!(!snap.dirty);
  assert_eq!(snap.fields.activities.len(), 1);

  sleep(DEBOUNCE * 2).await;
  assert_eq!(store.update_count(), 0);
}

// ─── Manual save ─────────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn manual_save_skips_the_debounce() {
  let store = ScriptedStore::new(pending_record());
  let draft = open(&store).await;

  draft.set_field(subject("Hello")).await.unwrap();
  draft.save_now().await.unwrap();
  assert_eq!(store.update_count(), 1);
  assert_eq!(draft.snapshot().save_status, SaveStatus::Saved);

  // The cancelled debounce must not produce a second write.
  sleep(DEBOUNCE * 3).await;
  assert_eq!(store.update_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn manual_save_during_flight_is_serialized() {
  let store = ScriptedStore::new(pending_record());
  store.set_update_latency(Duration::from_secs(1));
  let draft = open(&store).await;

  draft.set_field(subject("first")).await.unwrap();
  sleep(DEBOUNCE + Duration::from_millis(100)).await;
  assert_eq!(draft.snapshot().save_status, SaveStatus::Saving);
  assert_eq!(store.update_count(), 1);

  draft.set_field(subject("second")).await.unwrap();
  draft.save_now().await.unwrap();

  assert_eq!(store.max_in_flight(), 1);
  let updates = store.updates();
  assert_eq!(updates.len(), 2);
  assert_eq!(updates[0].subject, "first");
  assert_eq!(updates[1].subject, "second");

  let snap = draft.snapshot();
  assert!(!snap.dirty);
  assert_eq!(snap.save_status, SaveStatus::Saved);

  sleep(DEBOUNCE * 3).await;
  assert_eq!(store.update_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn manual_save_with_nothing_new_waits_for_flight() {
  let store = ScriptedStore::new(pending_record());
  store.set_update_latency(Duration::from_secs(1));
  let draft = open(&store).await;

  draft.set_field(subject("only")).await.unwrap();
  sleep(DEBOUNCE + Duration::from_millis(100)).await;
  draft.save_now().await.unwrap();

  assert_eq!(store.update_count(), 1);
  assert_eq!(draft.snapshot().save_status, SaveStatus::Saved);
}

#[tokio::test(start_paused = true)]
async fn manual_save_failure_is_reported() {
  let store = ScriptedStore::new(pending_record());
  store.fail_updates(Some(StoreError::Validation("subject too long".into())));
  let draft = open(&store).await;

  draft.set_field(subject("x".repeat(500).as_str())).await.unwrap();
  let err = draft.save_now().await.unwrap_err();
  assert_eq!(
    err,
    DraftError::Save(StoreError::Validation("subject too long".into()))
  );
  assert!(draft.snapshot().dirty);
}

// ─── Single flight ───────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn edit_during_flight_triggers_a_follow_up_write() {
  let store = ScriptedStore::new(pending_record());
  store.set_update_latency(Duration::from_secs(3));
  let draft = open(&store).await;

  draft.set_field(subject("A")).await.unwrap();
  sleep(DEBOUNCE + Duration::from_millis(100)).await;
  assert_eq!(store.update_count(), 1);

  // Newer edit while the first write is outstanding; its debounce expires
  // before the write returns.
  draft.set_field(subject("AB")).await.unwrap();
  assert_eq!(draft.snapshot().save_status, SaveStatus::Saving);

  sleep(Duration::from_millis(1000)).await;
  let snap = wait_until(&draft, |s| s.last_saved_at.is_some()).await;
  // The response must not roll the field back to "A".
  assert_eq!(snap.fields.subject, "AB");
  assert!(snap.dirty);

  let snap = wait_until(&draft, |s| s.save_status == SaveStatus::Saved).await;
  assert!(!snap.dirty);
  assert_eq!(store.max_in_flight(), 1);
  let updates = store.updates();
  assert_eq!(updates.len(), 2);
  assert_eq!(updates[1].subject, "AB");
}

// ─── Failure ─────────────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn failed_auto_save_keeps_edits_and_retries_on_next_edit() {
  let store = ScriptedStore::new(pending_record());
  store.fail_updates(Some(StoreError::Transport("connection reset".into())));
  let draft = open(&store).await;

  draft.set_field(subject("Hello")).await.unwrap();
  let snap = wait_until(&draft, |s| s.save_status == SaveStatus::Failed).await;
  assert!(snap.dirty);
  assert_eq!(snap.fields.subject, "Hello");
  assert!(snap.last_saved_at.is_none());

  // Nothing retries on its own.
  sleep(DEBOUNCE * 3).await;
  assert_eq!(store.update_count(), 1);

  store.fail_updates(None);
  draft.set_field(subject("Hello!")).await.unwrap();
  assert_eq!(draft.snapshot().save_status, SaveStatus::Pending);
  let snap = wait_until(&draft, |s| s.save_status == SaveStatus::Saved).await;
  assert!(!snap.dirty);

  let updates = store.updates();
  assert_eq!(updates.len(), 2);
  assert_eq!(updates[1].subject, "Hello!");
  assert_eq!(store.record().subject, "Hello!");
}

// ─── Teardown ────────────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn close_cancels_pending_save() {
  let store = ScriptedStore::new(pending_record());
  let draft = open(&store).await;

  draft.set_field(subject("never sent")).await.unwrap();
  draft.close().await;

  sleep(DEBOUNCE * 3).await;
  assert_eq!(store.update_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn close_discards_in_flight_result() {
  let store = ScriptedStore::new(pending_record());
  store.set_update_latency(Duration::from_secs(1));
  let draft = open(&store).await;
  let mut view = draft.subscribe();

  draft.set_field(subject("late")).await.unwrap();
  sleep(DEBOUNCE + Duration::from_millis(100)).await;
  assert_eq!(draft.snapshot().save_status, SaveStatus::Saving);

  draft.close().await;
  sleep(Duration::from_secs(5)).await;

  // The write itself completed on the backend...
  assert_eq!(store.record().subject, "late");
  // ...but the torn-down draft never observed it.
  assert_eq!(view.borrow_and_update().save_status, SaveStatus::Saving);
  assert!(view.has_changed().is_err());
}

#[tokio::test(start_paused = true)]
async fn terminal_submission_ignores_edits() {
  let mut record = pending_record();
  record.status = SubmissionStatus::Sent;
  let store = ScriptedStore::new(record);
  let draft = open(&store).await;

  draft.set_field(subject("too late")).await.unwrap();
  let snap = draft.snapshot();
  assert!(!snap.dirty);
  assert_eq!(snap.save_status, SaveStatus::Idle);

  sleep(DEBOUNCE * 3).await;
  assert_eq!(store.update_count(), 0);
  assert_eq!(
    draft.save_now().await,
    Err(DraftError::Locked(SubmissionStatus::Sent))
  );
}
