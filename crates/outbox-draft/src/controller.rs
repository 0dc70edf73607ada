//! The draft controller: a handle plus the task that owns the draft.
//!
//! All draft state lives in one spawned task. Edits, timer expiry and write
//! completions are handled one at a time on its `select!` loop, so no two
//! events ever mutate the draft concurrently. The handle only sends commands
//! and reads snapshots.

use std::{future, mem, sync::Arc};

use chrono::Utc;
use outbox_core::{
  Error as StoreError,
  store::SubmissionStore,
  submission::{
    ActivityEdit, DraftFields, FieldEdit, Submission, SubmissionId, SubmissionStatus,
  },
};
use tokio::{
  sync::{mpsc, oneshot, watch},
  task::{JoinError, JoinHandle},
};
use tracing::{debug, info, warn};

use crate::{
  config::DraftConfig,
  error::{DraftError, Result},
  snapshot::{DraftSnapshot, SaveStatus},
  timer::DebounceTimer,
  validate::check_approval,
};

const COMMAND_BUFFER: usize = 64;

// ─── Handle ───────────────────────────────────────────────────────────────────

/// Editor-facing handle to one submission's draft.
///
/// Dropping the handle (or calling [`close`](Self::close)) tears the draft
/// down: the pending auto-save is cancelled and the result of a write still
/// in flight is discarded when it arrives.
pub struct DraftController {
  id:       SubmissionId,
  commands: mpsc::Sender<Command>,
  state:    watch::Receiver<DraftSnapshot>,
  task:     JoinHandle<()>,
}

impl DraftController {
  /// Fetch `id` from `store` and start a draft for it.
  ///
  /// A failed fetch is returned as [`DraftError::Load`] and is not retried.
  pub async fn load<S>(store: Arc<S>, id: SubmissionId, config: DraftConfig) -> Result<Self>
  where
    S: SubmissionStore + 'static,
  {
    let submission = store.get_submission(&id).await.map_err(DraftError::Load)?;
    info!(%id, status = %submission.status, "loaded submission");
    Ok(Self::start(store, submission, config))
  }

  /// Start a draft from an already-fetched record. Must be called from
  /// within a tokio runtime.
  pub fn start<S>(store: Arc<S>, submission: Submission, config: DraftConfig) -> Self
  where
    S: SubmissionStore + 'static,
  {
    let config = config.normalized();
    let id = submission.id.clone();
    let fields = DraftFields::from(&submission);

    let mut grace = DebounceTimer::new(config.load_grace);
    grace.arm();

    let initial = DraftSnapshot {
      submission:    submission.clone(),
      fields:        fields.clone(),
      dirty:         false,
      save_status:   SaveStatus::Idle,
      last_saved_at: None,
      suppressed:    true,
    };
    let (state_tx, state_rx) = watch::channel(initial);
    let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_BUFFER);

    let draft = Draft {
      store,
      id: id.clone(),
      submission,
      fields,
      edit_revision: 0,
      saved_revision: 0,
      save_status: SaveStatus::Idle,
      last_saved_at: None,
      suppressed: true,
      debounce: DebounceTimer::new(config.debounce),
      grace,
      in_flight: None,
      flush_queued: false,
      next_waiters: Vec::new(),
      state: state_tx,
    };
    let task = tokio::spawn(draft.run(cmd_rx));

    Self { id, commands: cmd_tx, state: state_rx, task }
  }

  pub fn id(&self) -> &SubmissionId { &self.id }

  /// The most recently published state.
  pub fn snapshot(&self) -> DraftSnapshot { self.state.borrow().clone() }

  /// A receiver notified on every state change.
  pub fn subscribe(&self) -> watch::Receiver<DraftSnapshot> { self.state.clone() }

  /// Replace one editable field. Schedules an auto-save when the submission
  /// is editable and the initial load has settled.
  pub async fn set_field(&self, edit: FieldEdit) -> Result<()> {
    self.request(|ack| Command::SetField(edit, ack)).await
  }

  /// Replace one attribute of one activity. Out-of-range indices are
  /// ignored.
  pub async fn set_activity_field(&self, edit: ActivityEdit) -> Result<()> {
    self.request(|ack| Command::SetActivity(edit, ack)).await
  }

  /// Save now instead of waiting for the debounce. Resolves once the edits
  /// made so far are stored, or immediately when there is nothing to save.
  pub async fn save_now(&self) -> Result<()> {
    self.request(Command::SaveNow).await?
  }

  /// Validate, flush the current fields, then approve and send.
  pub async fn approve(&self) -> Result<Submission> {
    self.request(Command::Approve).await?
  }

  /// Reject the submission. No flush is attempted first.
  pub async fn reject(&self) -> Result<Submission> {
    self.request(Command::Reject).await?
  }

  /// Tear the draft down and wait for its task to stop.
  pub async fn close(self) {
    let Self { commands, task, .. } = self;
    drop(commands);
    if let Err(e) = task.await {
      warn!("draft task ended abnormally: {e}");
    }
  }

  async fn request<T>(&self, make: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
    let (tx, rx) = oneshot::channel();
    self
      .commands
      .send(make(tx))
      .await
      .map_err(|_| DraftError::Closed)?;
    rx.await.map_err(|_| DraftError::Closed)
  }
}

// ─── Task ─────────────────────────────────────────────────────────────────────

type Reply<T> = oneshot::Sender<Result<T>>;

enum Command {
  SetField(FieldEdit, oneshot::Sender<()>),
  SetActivity(ActivityEdit, oneshot::Sender<()>),
  SaveNow(Reply<()>),
  Approve(Reply<Submission>),
  Reject(Reply<Submission>),
}

/// A write that has been handed to the store and not yet answered.
struct InFlight {
  revision: u64,
  fields:   DraftFields,
  handle:   JoinHandle<outbox_core::Result<Submission>>,
  /// Manual saves satisfied by this write.
  waiters:  Vec<Reply<()>>,
}

struct Draft<S> {
  store: Arc<S>,
  id:    SubmissionId,

  submission: Submission,
  fields:     DraftFields,

  /// Bumped on every edit that should eventually be written.
  edit_revision:  u64,
  /// Highest revision the store has acknowledged.
  saved_revision: u64,

  save_status:   SaveStatus,
  last_saved_at: Option<chrono::DateTime<Utc>>,
  suppressed:    bool,

  debounce: DebounceTimer,
  grace:    DebounceTimer,

  in_flight:    Option<InFlight>,
  /// A flush was requested while another was in flight.
  flush_queued: bool,
  /// Manual saves waiting for the next write to start.
  next_waiters: Vec<Reply<()>>,

  state: watch::Sender<DraftSnapshot>,
}

impl<S> Draft<S>
where
  S: SubmissionStore + 'static,
{
  async fn run(mut self, mut commands: mpsc::Receiver<Command>) {
    loop {
      tokio::select! {
        cmd = commands.recv() => match cmd {
          Some(cmd) => self.handle(cmd).await,
          None => break,
        },
        () = self.grace.fired() => {
          self.suppressed = false;
          debug!(id = %self.id, "load settled; auto-save enabled");
        }
        () = self.debounce.fired() => self.on_debounce(),
        result = wait_in_flight(&mut self.in_flight) => self.on_flush_done(result),
      }
      self.publish();
    }

    self.debounce.cancel();
    if self.in_flight.take().is_some() {
      debug!(id = %self.id, "draft closed with a write in flight; its result will be dropped");
    }
    debug!(id = %self.id, "draft closed");
  }

  fn dirty(&self) -> bool { self.edit_revision != self.saved_revision }

  fn editable(&self) -> bool { self.submission.is_editable() }

  fn snapshot(&self) -> DraftSnapshot {
    DraftSnapshot {
      submission:    self.submission.clone(),
      fields:        self.fields.clone(),
      dirty:         self.dirty(),
      save_status:   self.save_status,
      last_saved_at: self.last_saved_at,
      suppressed:    self.suppressed,
    }
  }

  /// Push the current state to subscribers. Called before any reply so a
  /// caller that awaited a command observes its effect.
  fn publish(&self) {
    let next = self.snapshot();
    self.state.send_if_modified(|current| {
      if *current == next {
        false
      } else {
        *current = next;
        true
      }
    });
  }

  // ── Commands ─────────────────────────────────────────────────────────────

  async fn handle(&mut self, cmd: Command) {
    match cmd {
      Command::SetField(edit, ack) => {
        let name = edit.name();
        self.fields.apply(edit);
        self.note_edit(name.as_ref());
        self.publish();
        let _ = ack.send(());
      }
      Command::SetActivity(edit, ack) => {
        match self.fields.activities.get_mut(edit.index) {
          Some(activity) => {
            activity.set(edit.field, edit.value);
            self.note_edit("activities");
          }
          None => warn!(
            id = %self.id,
            index = edit.index,
            "ignoring edit to a missing activity"
          ),
        }
        self.publish();
        let _ = ack.send(());
      }
      Command::SaveNow(reply) => self.save_now(reply),
      Command::Approve(reply) => {
        let result = self.approve().await;
        self.publish();
        let _ = reply.send(result);
      }
      Command::Reject(reply) => {
        let result = self.reject().await;
        self.publish();
        let _ = reply.send(result);
      }
    }
  }

  /// Record that a field changed and (re)arm the auto-save.
  fn note_edit(&mut self, field: &str) {
    if self.suppressed || !self.editable() {
      return;
    }
    self.edit_revision += 1;
    if self.in_flight.is_none() {
      self.save_status = SaveStatus::Pending;
    }
    self.debounce.arm();
    debug!(id = %self.id, field, revision = self.edit_revision, "edit buffered");
  }

  fn save_now(&mut self, reply: Reply<()>) {
    if !self.editable() {
      let _ = reply.send(Err(DraftError::Locked(self.submission.status)));
      return;
    }
    self.debounce.cancel();

    if let Some(flight) = &mut self.in_flight {
      if self.edit_revision > flight.revision {
        self.next_waiters.push(reply);
        self.flush_queued = true;
      } else {
        flight.waiters.push(reply);
      }
    } else if self.dirty() {
      self.next_waiters.push(reply);
      self.start_flush();
    } else {
      let _ = reply.send(Ok(()));
    }
  }

  async fn approve(&mut self) -> Result<Submission> {
    if !self.editable() {
      return Err(DraftError::Locked(self.submission.status));
    }
    check_approval(&self.fields)?;

    // The forced flush below covers anything the debounce or queue would
    // have written.
    self.debounce.cancel();
    self.flush_queued = false;

    if let Some(flight) = self.in_flight.as_mut() {
      let result = (&mut flight.handle).await;
      self.on_flush_done(result);
    }

    let revision = self.edit_revision;
    let fields = self.fields.clone();
    let waiters = mem::take(&mut self.next_waiters);
    self.save_status = SaveStatus::Saving;
    self.publish();
    debug!(id = %self.id, revision, "flushing before approval");
    let result = self.store.update_submission(&self.id, &fields).await;
    if let Err(e) = self.finish_flush(revision, fields, waiters, result) {
      return Err(DraftError::Action(e));
    }
    self.publish();

    let approved = self
      .store
      .approve_submission(&self.id)
      .await
      .map_err(|e| {
        warn!(id = %self.id, "approve failed: {e}");
        DraftError::Action(e)
      })?;
    self.settle(approved.status, SubmissionStatus::Sent);
    info!(id = %self.id, status = %self.submission.status, "submission approved");
    Ok(self.submission.clone())
  }

  async fn reject(&mut self) -> Result<Submission> {
    if !self.editable() {
      return Err(DraftError::Locked(self.submission.status));
    }
    let rejected = self
      .store
      .reject_submission(&self.id)
      .await
      .map_err(|e| {
        warn!(id = %self.id, "reject failed: {e}");
        DraftError::Action(e)
      })?;
    self.settle(rejected.status, SubmissionStatus::Rejected);
    info!(id = %self.id, status = %self.submission.status, "submission rejected");
    Ok(self.submission.clone())
  }

  /// Move to a terminal status after approve/reject and stop auto-saving.
  fn settle(&mut self, reported: SubmissionStatus, expected: SubmissionStatus) {
    self.submission.status = if reported.is_terminal() { reported } else { expected };
    self.debounce.cancel();
    self.flush_queued = false;
    let status = self.submission.status;

    let mut waiters = mem::take(&mut self.next_waiters);
    if let Some(flight) = self.in_flight.take() {
      // Dropping the handle detaches the write; its outcome no longer
      // touches the draft.
      debug!(
        id = %self.id,
        revision = flight.revision,
        "draft locked with a write in flight; its result will be dropped"
      );
      waiters.extend(flight.waiters);
    }
    for waiter in waiters {
      let _ = waiter.send(Err(DraftError::Locked(status)));
    }

    // Unwritten edits stay visible through `dirty` but nothing will save them.
    if matches!(self.save_status, SaveStatus::Pending | SaveStatus::Saving) {
      self.save_status = SaveStatus::Idle;
    }
  }

  // ── Flushing ─────────────────────────────────────────────────────────────

  fn on_debounce(&mut self) {
    if self.in_flight.is_some() {
      self.flush_queued = true;
    } else if self.dirty() {
      self.start_flush();
    }
  }

  /// Hand the current fields to the store on a separate task.
  fn start_flush(&mut self) {
    if !self.editable() || self.in_flight.is_some() {
      return;
    }
    self.debounce.cancel();
    self.flush_queued = false;

    let revision = self.edit_revision;
    let fields = self.fields.clone();
    let store = Arc::clone(&self.store);
    let id = self.id.clone();
    let payload = fields.clone();
    let handle = tokio::spawn(async move { store.update_submission(&id, &payload).await });

    debug!(id = %self.id, revision, "auto-save started");
    self.save_status = SaveStatus::Saving;
    self.in_flight = Some(InFlight {
      revision,
      fields,
      handle,
      waiters: mem::take(&mut self.next_waiters),
    });
  }

  fn on_flush_done(&mut self, result: Result<outbox_core::Result<Submission>, JoinError>) {
    let Some(flight) = self.in_flight.take() else {
      return;
    };
    let result = result.unwrap_or_else(|e| Err(StoreError::Transport(format!("save task: {e}"))));
    if let Err(e) = self.finish_flush(flight.revision, flight.fields, flight.waiters, result) {
      warn!(id = %self.id, "auto-save failed: {e}");
    }

    if self.dirty() && self.flush_queued {
      self.start_flush();
    } else if !self.dirty() {
      self.publish();
      for waiter in self.next_waiters.drain(..) {
        let _ = waiter.send(Ok(()));
      }
    }
  }

  /// Apply the outcome of a write and answer the saves waiting on it.
  ///
  /// Only the status of the returned record is adopted. Field values always
  /// come from the draft, which may already hold newer edits.
  fn finish_flush(
    &mut self,
    revision: u64,
    fields: DraftFields,
    waiters: Vec<Reply<()>>,
    result: outbox_core::Result<Submission>,
  ) -> outbox_core::Result<()> {
    match result {
      Ok(stored) => {
        self.saved_revision = self.saved_revision.max(revision);
        self.last_saved_at = Some(Utc::now());
        self.submission.apply(&fields);
        if self.submission.status.is_editable() {
          self.submission.status = stored.status;
        }
        self.save_status = if self.dirty() { SaveStatus::Pending } else { SaveStatus::Saved };
        info!(id = %self.id, revision, "draft saved");
        self.publish();
        for waiter in waiters {
          let _ = waiter.send(Ok(()));
        }
        Ok(())
      }
      Err(e) => {
        self.save_status = SaveStatus::Failed;
        self.publish();
        for waiter in waiters {
          let _ = waiter.send(Err(DraftError::Save(e.clone())));
        }
        Err(e)
      }
    }
  }
}

/// Resolve with the in-flight write's result; pending forever when idle.
async fn wait_in_flight(
  slot: &mut Option<InFlight>,
) -> Result<outbox_core::Result<Submission>, JoinError> {
  match slot {
    Some(flight) => (&mut flight.handle).await,
    None => future::pending().await,
  }
}
