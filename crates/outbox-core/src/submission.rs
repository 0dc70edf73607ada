//! Submission: the backend record an administrator reviews.
//!
//! The backend owns every submission. The client holds a cached copy and may
//! only change the five [`DraftFields`]; everything else is display data.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use strum::{AsRefStr, Display, EnumString, IntoStaticStr};

// ─── Identity ────────────────────────────────────────────────────────────────

/// Opaque submission identifier.
///
/// The backend emits numeric ids, but nothing on the client relies on that;
/// both JSON numbers and strings are accepted and kept as text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct SubmissionId(String);

impl SubmissionId {
  pub fn new(id: impl Into<String>) -> Self { Self(id.into()) }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for SubmissionId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

impl From<u64> for SubmissionId {
  fn from(id: u64) -> Self { Self(id.to_string()) }
}

impl From<&str> for SubmissionId {
  fn from(id: &str) -> Self { Self(id.to_string()) }
}

impl<'de> Deserialize<'de> for SubmissionId {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
      Number(serde_json::Number),
      Text(String),
    }
    Ok(match Raw::deserialize(deserializer)? {
      Raw::Number(n) => Self(n.to_string()),
      Raw::Text(s) => Self(s),
    })
  }
}

// ─── Status ──────────────────────────────────────────────────────────────────

/// Where a submission is in its review lifecycle.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
  IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SubmissionStatus {
  Processing,
  Pending,
  PendingApproval,
  Sent,
  Rejected,
  Failed,
}

impl SubmissionStatus {
  /// `processing`, `pending` and `pending_approval` form one editable family.
  /// Every other status is terminal and read-only.
  pub fn is_editable(self) -> bool {
    matches!(self, Self::Processing | Self::Pending | Self::PendingApproval)
  }

  pub fn is_terminal(self) -> bool { !self.is_editable() }

  /// Wire form, e.g. `"pending_approval"`.
  pub fn as_str(self) -> &'static str { self.into() }

  /// Human-readable label for badges and filters.
  pub fn label(self) -> &'static str {
    match self {
      Self::Processing => "Processing",
      Self::Pending => "Pending",
      Self::PendingApproval => "Pending Approval",
      Self::Sent => "Sent",
      Self::Rejected => "Rejected",
      Self::Failed => "Failed",
    }
  }
}

// ─── Activities ──────────────────────────────────────────────────────────────

/// One stop in a connection plan.
///
/// Attributes are edited as text. Those the backend sent as JSON numbers are
/// written back as numbers for as long as their text still parses as one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "ActivityWire", into = "ActivityWire")]
pub struct Activity {
  pub name:    String,
  pub rating:  String,
  pub hours:   String,
  pub address: String,
  pub link:    String,
  numeric:     Vec<ActivityField>,
}

impl Activity {
  pub fn named(name: impl Into<String>) -> Self {
    Self { name: name.into(), ..Self::default() }
  }

  pub fn get(&self, field: ActivityField) -> &str {
    match field {
      ActivityField::Name => &self.name,
      ActivityField::Rating => &self.rating,
      ActivityField::Hours => &self.hours,
      ActivityField::Address => &self.address,
      ActivityField::Link => &self.link,
    }
  }

  pub fn set(&mut self, field: ActivityField, value: String) {
    let slot = match field {
      ActivityField::Name => &mut self.name,
      ActivityField::Rating => &mut self.rating,
      ActivityField::Hours => &mut self.hours,
      ActivityField::Address => &mut self.address,
      ActivityField::Link => &mut self.link,
    };
    *slot = value;
  }
}

/// Names one attribute of an [`Activity`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum ActivityField {
  Name,
  Rating,
  Hours,
  Address,
  Link,
}

impl ActivityField {
  pub const ALL: [Self; 5] =
    [Self::Name, Self::Rating, Self::Hours, Self::Address, Self::Link];
}

// ─── Submission ──────────────────────────────────────────────────────────────

/// The administrator who approved or rejected a submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Approver {
  #[serde(default)]
  pub name: Option<String>,
}

/// A connection-plan submission as returned by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
  pub id:     SubmissionId,
  pub status: SubmissionStatus,

  // ── Editable ──────────────────────────────────────────────────────────
  #[serde(default, deserialize_with = "null_as_empty")]
  pub subject:           String,
  #[serde(default, deserialize_with = "null_as_empty")]
  pub user_email:        String,
  #[serde(default, deserialize_with = "null_as_empty")]
  pub persona_bridge:    String,
  #[serde(default, deserialize_with = "null_as_empty")]
  pub invitation_script: String,
  #[serde(default, deserialize_with = "activities_or_empty")]
  pub activities:        Vec<Activity>,

  // ── Read-only ─────────────────────────────────────────────────────────
  #[serde(default)]
  pub location:                Option<String>,
  #[serde(default)]
  pub user_location:           Option<String>,
  #[serde(default)]
  pub user_location_formatted: Option<String>,
  #[serde(default)]
  pub budget:                  Option<String>,
  #[serde(default)]
  pub preferred_date:          Option<NaiveDate>,
  #[serde(default)]
  pub planning_mode:           Option<String>,
  #[serde(default)]
  pub social_goal:             Option<String>,
  #[serde(default)]
  pub challenge_type:          Option<String>,
  #[serde(default)]
  pub admins:                  Option<Approver>,
  #[serde(default)]
  pub created_at:              Option<DateTime<Utc>>,
  #[serde(default)]
  pub updated_at:              Option<DateTime<Utc>>,
  #[serde(default)]
  pub approved_at:             Option<DateTime<Utc>>,
}

impl Submission {
  /// A bare submission with empty fields, mostly for tests and fixtures.
  pub fn new(id: impl Into<SubmissionId>, status: SubmissionStatus) -> Self {
    Self {
      id: id.into(),
      status,
      subject: String::new(),
      user_email: String::new(),
      persona_bridge: String::new(),
      invitation_script: String::new(),
      activities: Vec::new(),
      location: None,
      user_location: None,
      user_location_formatted: None,
      budget: None,
      preferred_date: None,
      planning_mode: None,
      social_goal: None,
      challenge_type: None,
      admins: None,
      created_at: None,
      updated_at: None,
      approved_at: None,
    }
  }

  pub fn is_editable(&self) -> bool { self.status.is_editable() }

  /// Overwrite the editable fields with `fields`.
  pub fn apply(&mut self, fields: &DraftFields) {
    self.subject = fields.subject.clone();
    self.user_email = fields.user_email.clone();
    self.persona_bridge = fields.persona_bridge.clone();
    self.invitation_script = fields.invitation_script.clone();
    self.activities = fields.activities.clone();
  }

  /// Challenge label shown next to the submission: persona plans are
  /// labelled as such, everything else by its social goal.
  pub fn challenge_label(&self) -> &str {
    if self.planning_mode.as_deref() == Some("personas") {
      return "Persona-Based";
    }
    self
      .social_goal
      .as_deref()
      .or(self.challenge_type.as_deref())
      .unwrap_or("Unknown Type")
  }

  /// The most specific location the submitter gave, if any.
  pub fn display_location(&self) -> Option<&str> {
    self
      .user_location_formatted
      .as_deref()
      .or(self.user_location.as_deref())
      .or(self.location.as_deref())
  }

  pub fn approver_name(&self) -> Option<&str> {
    self.admins.as_ref().and_then(|a| a.name.as_deref())
  }
}

// ─── Draft fields ────────────────────────────────────────────────────────────

/// The editable subset of a [`Submission`]. Serialises as the PATCH body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftFields {
  #[serde(default)]
  pub subject:           String,
  #[serde(default)]
  pub user_email:        String,
  #[serde(default)]
  pub persona_bridge:    String,
  #[serde(default)]
  pub invitation_script: String,
  #[serde(default)]
  pub activities:        Vec<Activity>,
}

impl From<&Submission> for DraftFields {
  fn from(s: &Submission) -> Self {
    Self {
      subject:           s.subject.clone(),
      user_email:        s.user_email.clone(),
      persona_bridge:    s.persona_bridge.clone(),
      invitation_script: s.invitation_script.clone(),
      activities:        s.activities.clone(),
    }
  }
}

impl DraftFields {
  /// Apply a single-field edit.
  pub fn apply(&mut self, edit: FieldEdit) {
    match edit {
      FieldEdit::Subject(v) => self.subject = v,
      FieldEdit::RecipientEmail(v) => self.user_email = v,
      FieldEdit::PersonaBridge(v) => self.persona_bridge = v,
      FieldEdit::InvitationScript(v) => self.invitation_script = v,
      FieldEdit::Activities(v) => self.activities = v,
    }
  }

  /// Current text of a text field; `None` for [`FieldName::Activities`].
  pub fn text(&self, name: FieldName) -> Option<&str> {
    match name {
      FieldName::Subject => Some(&self.subject),
      FieldName::RecipientEmail => Some(&self.user_email),
      FieldName::PersonaBridge => Some(&self.persona_bridge),
      FieldName::InvitationScript => Some(&self.invitation_script),
      FieldName::Activities => None,
    }
  }
}

/// The five editable fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum FieldName {
  Subject,
  RecipientEmail,
  PersonaBridge,
  InvitationScript,
  Activities,
}

/// A replacement value for exactly one editable field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldEdit {
  Subject(String),
  RecipientEmail(String),
  PersonaBridge(String),
  InvitationScript(String),
  Activities(Vec<Activity>),
}

impl FieldEdit {
  pub fn name(&self) -> FieldName {
    match self {
      Self::Subject(_) => FieldName::Subject,
      Self::RecipientEmail(_) => FieldName::RecipientEmail,
      Self::PersonaBridge(_) => FieldName::PersonaBridge,
      Self::InvitationScript(_) => FieldName::InvitationScript,
      Self::Activities(_) => FieldName::Activities,
    }
  }

  /// Build a text edit for `name`. Returns `None` for
  /// [`FieldName::Activities`], which is not a text field.
  pub fn text(name: FieldName, value: String) -> Option<Self> {
    match name {
      FieldName::Subject => Some(Self::Subject(value)),
      FieldName::RecipientEmail => Some(Self::RecipientEmail(value)),
      FieldName::PersonaBridge => Some(Self::PersonaBridge(value)),
      FieldName::InvitationScript => Some(Self::InvitationScript(value)),
      FieldName::Activities => None,
    }
  }
}

/// Edit one attribute of the activity at `index`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityEdit {
  pub index: usize,
  pub field: ActivityField,
  pub value: String,
}

// ─── Lenient decoding ────────────────────────────────────────────────────────

fn null_as_empty<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
  Ok(Option::<String>::deserialize(d)?.unwrap_or_default())
}

#[derive(Serialize, Deserialize)]
struct ActivityWire {
  #[serde(default)]
  name:    serde_json::Value,
  #[serde(default)]
  rating:  serde_json::Value,
  #[serde(default)]
  hours:   serde_json::Value,
  #[serde(default)]
  address: serde_json::Value,
  #[serde(default)]
  link:    serde_json::Value,
}

impl From<ActivityWire> for Activity {
  fn from(wire: ActivityWire) -> Self {
    let values = [wire.name, wire.rating, wire.hours, wire.address, wire.link];
    let mut activity = Self::default();
    for (field, value) in ActivityField::ALL.into_iter().zip(values) {
      let text = match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s,
        serde_json::Value::Number(n) => {
          activity.numeric.push(field);
          n.to_string()
        }
        other => other.to_string(),
      };
      activity.set(field, text);
    }
    activity
  }
}

impl From<Activity> for ActivityWire {
  fn from(activity: Activity) -> Self {
    let value = |field: ActivityField| {
      let text = activity.get(field);
      let number = activity
        .numeric
        .contains(&field)
        .then(|| text.parse::<serde_json::Number>().ok())
        .flatten();
      match number {
        Some(n) => serde_json::Value::Number(n),
        None => serde_json::Value::String(text.to_string()),
      }
    };
    Self {
      name:    value(ActivityField::Name),
      rating:  value(ActivityField::Rating),
      hours:   value(ActivityField::Hours),
      address: value(ActivityField::Address),
      link:    value(ActivityField::Link),
    }
  }
}

/// Older records sometimes carry `activities` as a JSON string; anything that
/// is not an array decodes as no activities.
fn activities_or_empty<'de, D: Deserializer<'de>>(
  d: D,
) -> Result<Vec<Activity>, D::Error> {
  match serde_json::Value::deserialize(d)? {
    serde_json::Value::Array(items) => items
      .into_iter()
      .map(|v| serde_json::from_value(v).map_err(serde::de::Error::custom))
      .collect(),
    _ => Ok(Vec::new()),
  }
}
