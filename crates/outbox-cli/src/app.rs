//! Application state machine and event dispatcher.

use std::sync::Arc;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use outbox_client::ApiClient;
use outbox_core::{
  store::{ListQuery, SubmissionPage, SubmissionStats, SubmissionStore},
  submission::{
    ActivityEdit, ActivityField, DraftFields, FieldEdit, FieldName, Submission, SubmissionId,
    SubmissionStatus,
  },
};
use outbox_draft::{DraftConfig, DraftController, DraftSnapshot};
use tokio::sync::watch;
use tracing::warn;

use crate::settings::Settings;

// ─── Screen ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
  /// Paginated submission list with filters.
  List,
  /// One submission open in a draft controller.
  Edit,
}

// ─── Filters ──────────────────────────────────────────────────────────────────

const STATUS_FILTERS: [SubmissionStatus; 4] = [
  SubmissionStatus::Processing,
  SubmissionStatus::Sent,
  SubmissionStatus::Rejected,
  SubmissionStatus::Failed,
];

pub const CHALLENGE_FILTERS: [&str; 2] = ["Persona-Based", "Social Recommendation"];

/// all → processing → sent → rejected → failed → all
pub fn next_status_filter(current: Option<SubmissionStatus>) -> Option<SubmissionStatus> {
  match current {
    None => Some(STATUS_FILTERS[0]),
    Some(status) => STATUS_FILTERS
      .iter()
      .position(|s| *s == status)
      .and_then(|i| STATUS_FILTERS.get(i + 1))
      .copied(),
  }
}

/// all → Persona-Based → Social Recommendation → all
pub fn next_challenge_filter(current: Option<&str>) -> Option<String> {
  match current {
    None => Some(CHALLENGE_FILTERS[0].to_string()),
    Some(c) => CHALLENGE_FILTERS
      .iter()
      .position(|f| *f == c)
      .and_then(|i| CHALLENGE_FILTERS.get(i + 1))
      .map(|f| f.to_string()),
  }
}

// ─── Editor focus ─────────────────────────────────────────────────────────────

const TEXT_FIELDS: [FieldName; 4] = [
  FieldName::Subject,
  FieldName::RecipientEmail,
  FieldName::PersonaBridge,
  FieldName::InvitationScript,
];

/// The input that receives typed characters on the edit screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
  Field(FieldName),
  Activity(usize, ActivityField),
}

impl Focus {
  /// Tab order for a draft with `activities` activities.
  pub fn order(activities: usize) -> Vec<Focus> {
    TEXT_FIELDS
      .into_iter()
      .map(Focus::Field)
      .chain((0..activities).flat_map(|i| {
        ActivityField::ALL
          .into_iter()
          .map(move |f| Focus::Activity(i, f))
      }))
      .collect()
  }

  pub fn value(self, fields: &DraftFields) -> Option<&str> {
    match self {
      Focus::Field(name) => fields.text(name),
      Focus::Activity(i, f) => fields.activities.get(i).map(|a| a.get(f)),
    }
  }

  /// Multi-line inputs accept Enter as a newline.
  pub fn is_multiline(self) -> bool {
    matches!(
      self,
      Focus::Field(FieldName::PersonaBridge | FieldName::InvitationScript)
    )
  }

  fn step(self, activities: usize, forward: bool) -> Focus {
    let order = Focus::order(activities);
    let len = order.len();
    let at = order.iter().position(|f| *f == self).unwrap_or(0);
    let next = if forward { (at + 1) % len } else { (at + len - 1) % len };
    order[next]
  }
}

// ─── Editor ───────────────────────────────────────────────────────────────────

/// An action waiting for y/n confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirm {
  Approve,
  Reject,
}

pub struct Editor {
  pub draft:    DraftController,
  view:         watch::Receiver<DraftSnapshot>,
  /// Last state published by the controller.
  pub snapshot: DraftSnapshot,
  pub focus:    Focus,
  pub confirm:  Option<Confirm>,
  pub scroll:   u16,
}

impl Editor {
  fn new(draft: DraftController) -> Self {
    let mut view = draft.subscribe();
    let snapshot = view.borrow_and_update().clone();
    Self {
      draft,
      view,
      snapshot,
      focus: Focus::Field(FieldName::Subject),
      confirm: None,
      scroll: 0,
    }
  }

  /// Pull the controller's latest state. Returns true when it changed.
  pub fn refresh(&mut self) -> bool {
    if !self.view.has_changed().unwrap_or(false) {
      return false;
    }
    self.snapshot = self.view.borrow_and_update().clone();
    if self.focus.value(&self.snapshot.fields).is_none() {
      self.focus = Focus::Field(FieldName::Subject);
    }
    true
  }

  /// Replace the focused input's text with `change` applied to it.
  async fn edit_focused(&mut self, change: impl FnOnce(&mut String)) {
    let Some(current) = self.focus.value(&self.snapshot.fields) else {
      return;
    };
    let mut value = current.to_string();
    change(&mut value);

    let result = match self.focus {
      Focus::Field(name) => match FieldEdit::text(name, value) {
        Some(edit) => self.draft.set_field(edit).await,
        None => Ok(()),
      },
      Focus::Activity(index, field) => {
        self
          .draft
          .set_activity_field(ActivityEdit { index, field, value })
          .await
      }
    };
    if let Err(e) = result {
      warn!("edit dropped: {e}");
    }
    // The controller publishes before acknowledging.
    self.refresh();
  }
}

// ─── App ──────────────────────────────────────────────────────────────────────

/// Top-level application state.
pub struct App {
  pub screen: Screen,

  pub client:       Arc<ApiClient>,
  pub draft_config: DraftConfig,

  /// Filters and page of the list screen.
  pub query:       ListQuery,
  pub page:        SubmissionPage,
  pub stats:       SubmissionStats,
  pub list_cursor: usize,

  /// Search text being typed (only while `search_active`).
  pub search:        String,
  pub search_active: bool,

  pub editor: Option<Editor>,

  /// One-line status message shown in the status bar.
  pub status_msg: String,
}

impl App {
  pub fn new(client: ApiClient, settings: &Settings) -> Self {
    Self {
      screen: Screen::List,
      client: Arc::new(client),
      draft_config: settings.draft_config(),
      query: ListQuery { limit: settings.page_size.max(1), ..ListQuery::default() },
      page: SubmissionPage::default(),
      stats: SubmissionStats::default(),
      list_cursor: 0,
      search: String::new(),
      search_active: false,
      editor: None,
      status_msg: String::new(),
    }
  }

  // ── Data loading ──────────────────────────────────────────────────────────

  /// Fetch the current page and the dashboard counters.
  pub async fn load_list(&mut self) -> anyhow::Result<()> {
    self.status_msg = "Loading submissions…".into();
    let result = tokio::try_join!(
      self.client.list_submissions(&self.query),
      self.client.stats()
    );
    match result {
      Ok((page, stats)) => {
        self.page = page;
        self.stats = stats;
        self.list_cursor = self
          .list_cursor
          .min(self.page.submissions.len().saturating_sub(1));
        self.status_msg = String::new();
        Ok(())
      }
      Err(e) => {
        self.status_msg = format!("Error: {e}");
        Err(e.into())
      }
    }
  }

  async fn reload(&mut self) {
    if let Err(e) = self.load_list().await {
      warn!("list reload failed: {e:#}");
    }
  }

  pub fn cursor_submission(&self) -> Option<&Submission> {
    self.page.submissions.get(self.list_cursor)
  }

  /// Pull controller state into the editor. Returns true when it changed.
  pub fn refresh(&mut self) -> bool {
    self.editor.as_mut().is_some_and(Editor::refresh)
  }

  /// Flush and close any open draft before exiting.
  pub async fn shutdown(&mut self) {
    let Some(editor) = self.editor.take() else {
      return;
    };
    if editor.snapshot.dirty && editor.snapshot.is_editable() {
      if let Err(e) = editor.draft.save_now().await {
        warn!("final save failed: {e}");
      }
    }
    editor.draft.close().await;
  }

  // ── Key handling ──────────────────────────────────────────────────────────

  /// Process a key event. Returns `true` to continue, `false` to quit.
  pub async fn handle_key(&mut self, key: KeyEvent) -> anyhow::Result<bool> {
    // Global: Ctrl-C quits from anywhere.
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
      return Ok(false);
    }

    if self.search_active {
      return self.handle_search_key(key).await;
    }

    match self.screen {
      Screen::List => self.handle_list_key(key).await,
      Screen::Edit => self.handle_edit_key(key).await,
    }
  }

  async fn handle_search_key(&mut self, key: KeyEvent) -> anyhow::Result<bool> {
    match key.code {
      KeyCode::Esc => {
        self.search_active = false;
        self.search.clear();
      }
      KeyCode::Enter => {
        self.search_active = false;
        let term = self.search.trim();
        self.query.search = (!term.is_empty()).then(|| term.to_string());
        self.query.page = 1;
        self.list_cursor = 0;
        self.reload().await;
      }
      KeyCode::Backspace => {
        self.search.pop();
      }
      KeyCode::Char(c) => self.search.push(c),
      _ => {}
    }
    Ok(true)
  }

  async fn handle_list_key(&mut self, key: KeyEvent) -> anyhow::Result<bool> {
    match key.code {
      KeyCode::Char('q') => return Ok(false),

      // Navigation
      KeyCode::Down | KeyCode::Char('j') => {
        if self.list_cursor + 1 < self.page.submissions.len() {
          self.list_cursor += 1;
        }
      }
      KeyCode::Up | KeyCode::Char('k') => {
        self.list_cursor = self.list_cursor.saturating_sub(1);
      }

      // Paging
      KeyCode::Char('n') | KeyCode::PageDown if self.page.has_next() => {
        self.query.page = self.page.page + 1;
        self.list_cursor = 0;
        self.reload().await;
      }
      KeyCode::Char('p') | KeyCode::PageUp if self.page.has_prev() => {
        self.query.page = self.page.page - 1;
        self.list_cursor = 0;
        self.reload().await;
      }

      // Filters
      KeyCode::Char('s') => {
        self.query.status = next_status_filter(self.query.status);
        self.query.page = 1;
        self.list_cursor = 0;
        self.reload().await;
      }
      KeyCode::Char('t') => {
        self.query.challenge_type = next_challenge_filter(self.query.challenge_type.as_deref());
        self.query.page = 1;
        self.list_cursor = 0;
        self.reload().await;
      }
      KeyCode::Char('/') => {
        self.search_active = true;
        self.search = self.query.search.clone().unwrap_or_default();
      }
      KeyCode::Char('r') => self.reload().await,

      KeyCode::Enter | KeyCode::Right | KeyCode::Char('l') => {
        if let Some(id) = self.cursor_submission().map(|s| s.id.clone()) {
          self.open_editor(id).await;
        }
      }

      _ => {}
    }
    Ok(true)
  }

  async fn handle_edit_key(&mut self, key: KeyEvent) -> anyhow::Result<bool> {
    let Some(editor) = self.editor.as_mut() else {
      self.screen = Screen::List;
      return Ok(true);
    };

    if let Some(action) = editor.confirm.take() {
      if matches!(key.code, KeyCode::Char('y' | 'Y')) {
        self.run_action(action).await;
      } else {
        self.status_msg = "Cancelled".into();
      }
      return Ok(true);
    }

    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    // Terminal submissions are shown read-only.
    let editable = editor.snapshot.is_editable();
    match key.code {
      KeyCode::Esc => self.close_editor().await,

      KeyCode::Char('s') if ctrl => {
        self.status_msg = match editor.draft.save_now().await {
          Ok(()) => "Changes saved".into(),
          Err(e) => format!("Error: {e}"),
        };
        editor.refresh();
      }
      KeyCode::Char('a') if ctrl => self.ask(Confirm::Approve),
      KeyCode::Char('r') if ctrl => self.ask(Confirm::Reject),
      KeyCode::Char(_) if ctrl => {}

      KeyCode::Tab => {
        let n = editor.snapshot.fields.activities.len();
        editor.focus = editor.focus.step(n, true);
      }
      KeyCode::BackTab => {
        let n = editor.snapshot.fields.activities.len();
        editor.focus = editor.focus.step(n, false);
      }
      KeyCode::PageDown => editor.scroll = editor.scroll.saturating_add(5),
      KeyCode::PageUp => editor.scroll = editor.scroll.saturating_sub(5),

      KeyCode::Char(c) if editable => editor.edit_focused(|v| v.push(c)).await,
      KeyCode::Backspace if editable => {
        editor.edit_focused(|v| {
          v.pop();
        })
        .await;
      }
      KeyCode::Enter if editable && editor.focus.is_multiline() => {
        editor.edit_focused(|v| v.push('\n')).await;
      }

      _ => {}
    }
    Ok(true)
  }

  // ── Edit screen actions ───────────────────────────────────────────────────

  async fn open_editor(&mut self, id: SubmissionId) {
    self.status_msg = format!("Opening submission {id}…");
    match DraftController::load(Arc::clone(&self.client), id, self.draft_config).await {
      Ok(draft) => {
        self.editor = Some(Editor::new(draft));
        self.screen = Screen::Edit;
        self.status_msg = String::new();
      }
      Err(e) => self.status_msg = format!("Error: {e}"),
    }
  }

  async fn close_editor(&mut self) {
    if let Some(editor) = self.editor.take() {
      editor.draft.close().await;
    }
    self.screen = Screen::List;
    self.reload().await;
  }

  fn ask(&mut self, action: Confirm) {
    let Some(editor) = self.editor.as_mut() else {
      return;
    };
    if !editor.snapshot.is_editable() {
      self.status_msg = format!(
        "This submission is {} and can no longer be changed",
        editor.snapshot.status().label()
      );
      return;
    }
    self.status_msg = match action {
      Confirm::Approve => format!(
        "Approve and send this email to {}? (y/n)",
        editor.snapshot.fields.user_email
      ),
      Confirm::Reject => "Reject this submission? (y/n)".into(),
    };
    editor.confirm = Some(action);
  }

  async fn run_action(&mut self, action: Confirm) {
    let Some(editor) = self.editor.as_mut() else {
      return;
    };
    self.status_msg = match action {
      Confirm::Approve => "Sending…".into(),
      Confirm::Reject => "Rejecting…".into(),
    };
    let result = match action {
      Confirm::Approve => editor.draft.approve().await,
      Confirm::Reject => editor.draft.reject().await,
    };
    editor.refresh();
    self.status_msg = match (action, result) {
      (Confirm::Approve, Ok(_)) => "Email approved and sent".into(),
      (Confirm::Reject, Ok(_)) => "Submission rejected".into(),
      (_, Err(e)) => format!("Error: {e}"),
    };
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn status_filter_cycles_back_to_all() {
    let mut f = None;
    let mut seen = Vec::new();
    for _ in 0..5 {
      f = next_status_filter(f);
      seen.push(f);
    }
    assert_eq!(
      seen,
      vec![
        Some(SubmissionStatus::Processing),
        Some(SubmissionStatus::Sent),
        Some(SubmissionStatus::Rejected),
        Some(SubmissionStatus::Failed),
        None,
      ]
    );
    // A status outside the cycle resets to all.
    assert_eq!(next_status_filter(Some(SubmissionStatus::Pending)), None);
  }

  #[test]
  fn challenge_filter_cycles_back_to_all() {
    assert_eq!(next_challenge_filter(None).as_deref(), Some("Persona-Based"));
    assert_eq!(
      next_challenge_filter(Some("Persona-Based")).as_deref(),
      Some("Social Recommendation")
    );
    assert_eq!(next_challenge_filter(Some("Social Recommendation")), None);
  }

  #[test]
  fn focus_order_walks_fields_then_activities() {
    let order = Focus::order(2);
    assert_eq!(order.len(), 4 + 2 * ActivityField::ALL.len());
    assert_eq!(order[0], Focus::Field(FieldName::Subject));
    assert_eq!(order[4], Focus::Activity(0, ActivityField::Name));
    assert_eq!(order.last(), Some(&Focus::Activity(1, ActivityField::Link)));

    let last = Focus::Activity(1, ActivityField::Link);
    assert_eq!(last.step(2, true), Focus::Field(FieldName::Subject));
    assert_eq!(Focus::Field(FieldName::Subject).step(2, false), last);
    assert_eq!(
      Focus::Field(FieldName::Subject).step(0, false),
      Focus::Field(FieldName::InvitationScript)
    );
  }

  #[test]
  fn focus_reads_current_text() {
    let mut fields = DraftFields { subject: "Hi".into(), ..DraftFields::default() };
    fields.activities.push(outbox_core::submission::Activity::named("Hike"));
    assert_eq!(Focus::Field(FieldName::Subject).value(&fields), Some("Hi"));
    assert_eq!(Focus::Activity(0, ActivityField::Name).value(&fields), Some("Hike"));
    assert_eq!(Focus::Activity(3, ActivityField::Name).value(&fields), None);
  }
}
