//! Approval preconditions.

use outbox_core::submission::DraftFields;

use crate::error::ApprovalError;

/// Check that `fields` are complete enough to send. The first unmet
/// precondition wins: recipient, subject, script, then activities.
pub fn check_approval(fields: &DraftFields) -> Result<(), ApprovalError> {
  if fields.user_email.is_empty() || !fields.user_email.contains('@') {
    return Err(ApprovalError::InvalidRecipientEmail);
  }
  if fields.subject.trim().is_empty() {
    return Err(ApprovalError::MissingSubject);
  }
  if fields.invitation_script.trim().is_empty() {
    return Err(ApprovalError::MissingInvitationScript);
  }
  if fields.activities.is_empty() {
    return Err(ApprovalError::NoActivities);
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use outbox_core::submission::Activity;

  use super::*;

  fn complete() -> DraftFields {
    DraftFields {
      subject:           "Hi".into(),
      user_email:        "a@b.com".into(),
      persona_bridge:    String::new(),
      invitation_script: "come".into(),
      activities:        vec![Activity::named("Hike")],
    }
  }

  #[test]
  fn complete_fields_pass() {
    assert_eq!(check_approval(&complete()), Ok(()));
  }

  #[test]
  fn email_checked_first() {
    let fields = DraftFields {
      user_email: String::new(),
      subject: String::new(),
      activities: Vec::new(),
      ..complete()
    };
    assert_eq!(check_approval(&fields), Err(ApprovalError::InvalidRecipientEmail));
  }

  #[test]
  fn email_needs_at_sign() {
    let fields = DraftFields { user_email: "nobody".into(), ..complete() };
    assert_eq!(check_approval(&fields), Err(ApprovalError::InvalidRecipientEmail));
  }

  #[test]
  fn blank_subject_after_trim() {
    let fields = DraftFields { subject: "   ".into(), ..complete() };
    assert_eq!(check_approval(&fields), Err(ApprovalError::MissingSubject));
  }

  #[test]
  fn blank_script_after_trim() {
    let fields = DraftFields { invitation_script: "\n\t".into(), ..complete() };
    assert_eq!(check_approval(&fields), Err(ApprovalError::MissingInvitationScript));
  }

  #[test]
  fn needs_an_activity() {
    let fields = DraftFields { activities: Vec::new(), ..complete() };
    assert_eq!(check_approval(&fields), Err(ApprovalError::NoActivities));
  }

  #[test]
  fn persona_bridge_is_optional() {
    let fields = DraftFields { persona_bridge: String::new(), ..complete() };
    assert!(check_approval(&fields).is_ok());
  }
}
