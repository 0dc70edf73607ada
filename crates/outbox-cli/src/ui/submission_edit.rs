//! Edit screen: the draft's fields on the left, submission details on the
//! right.

use outbox_core::submission::{ActivityField, FieldName, Submission, SubmissionStatus};
use outbox_draft::SaveStatus;
use ratatui::{
  Frame,
  layout::{Constraint, Direction, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, Paragraph, Wrap},
};

use super::submission_list::status_color;
use crate::{
  app::{Editor, Focus},
  format,
};

// ─── Public entry ─────────────────────────────────────────────────────────────

pub fn draw(f: &mut Frame, area: Rect, editor: &Editor) {
  let cols = Layout::default()
    .direction(Direction::Horizontal)
    .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
    .split(area);

  draw_fields(f, cols[0], editor);
  draw_details(f, cols[1], &editor.snapshot.submission);
}

// ─── Fields ───────────────────────────────────────────────────────────────────

fn field_label(name: FieldName) -> &'static str {
  match name {
    FieldName::Subject => "Subject",
    FieldName::RecipientEmail => "Recipient email",
    FieldName::PersonaBridge => "Persona bridge",
    FieldName::InvitationScript => "Invitation script",
    FieldName::Activities => "Activities",
  }
}

fn activity_label(field: ActivityField) -> &'static str {
  match field {
    ActivityField::Name => "name",
    ActivityField::Rating => "rating",
    ActivityField::Hours => "hours",
    ActivityField::Address => "address",
    ActivityField::Link => "link",
  }
}

fn draw_fields(f: &mut Frame, area: Rect, editor: &Editor) {
  let snap = &editor.snapshot;
  let editable = snap.is_editable();

  let mut block = Block::default()
    .title(format!(" Submission {} ", snap.submission.id))
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::DarkGray));
  if let Some(text) = format::save_indicator(snap) {
    let color = match snap.save_status {
      SaveStatus::Failed => Color::Red,
      SaveStatus::Saved => Color::Green,
      _ => Color::Yellow,
    };
    block = block.title_top(
      Line::from(Span::styled(format!(" {text} "), Style::default().fg(color))).right_aligned(),
    );
  }

  let mut lines: Vec<Line> = Vec::new();
  if !editable {
    lines.push(locked_banner(&snap.submission));
    lines.push(Line::from(""));
  }

  let label_style = |focused: bool| {
    let base = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
    if focused && editable { base.fg(Color::Yellow) } else { base }
  };
  let value_style = if editable {
    Style::default()
  } else {
    Style::default().fg(Color::Gray)
  };

  for focus in Focus::order(0) {
    let Focus::Field(name) = focus else { continue };
    let focused = editor.focus == focus;
    let marker = if focused && editable { "▸ " } else { "  " };
    lines.push(Line::from(Span::styled(
      format!("{marker}{}", field_label(name)),
      label_style(focused),
    )));
    let value = focus.value(&snap.fields).unwrap_or_default();
    for text in value.split('\n') {
      lines.push(Line::from(Span::styled(format!("    {text}"), value_style)));
    }
    lines.push(Line::from(""));
  }

  lines.push(Line::from(Span::styled(
    format!("  Activities ({})", snap.fields.activities.len()),
    label_style(false),
  )));
  for (i, activity) in snap.fields.activities.iter().enumerate() {
    for field in ActivityField::ALL {
      let focus = Focus::Activity(i, field);
      let focused = editor.focus == focus;
      let marker = if focused && editable { "▸" } else { " " };
      let prefix = if field == ActivityField::Name { format!("{:>3}.", i + 1) } else { "    ".into() };
      lines.push(Line::from(vec![
        Span::raw(format!("  {prefix}{marker}")),
        Span::styled(format!("{:<8}", activity_label(field)), label_style(focused)),
        Span::styled(activity.get(field).to_string(), value_style),
      ]));
    }
  }

  let para = Paragraph::new(lines)
    .block(block)
    .wrap(Wrap { trim: false })
    .scroll((editor.scroll, 0));
  f.render_widget(para, area);
}

fn locked_banner(s: &Submission) -> Line<'static> {
  let verb = match s.status {
    SubmissionStatus::Sent => "Approved and sent",
    SubmissionStatus::Rejected => "Rejected",
    _ => "Closed",
  };
  let mut text = format!("  {verb}");
  if let Some(name) = s.approver_name() {
    text.push_str(&format!(" by {name}"));
  }
  if let Some(at) = s.approved_at.or(s.updated_at) {
    text.push_str(&format!(" on {}", format::long_date(at)));
  }
  text.push_str(". This submission can no longer be edited.");
  Line::from(Span::styled(
    text,
    Style::default()
      .fg(status_color(s.status))
      .add_modifier(Modifier::BOLD),
  ))
}

// ─── Details ──────────────────────────────────────────────────────────────────

fn draw_details(f: &mut Frame, area: Rect, s: &Submission) {
  let block = Block::default()
    .title(" Details ")
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::DarkGray));

  let row = |label: &'static str, value: String| {
    Line::from(vec![
      Span::styled(
        format!("{label:<12}"),
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
      ),
      Span::raw(value),
    ])
  };
  let or_na = |v: Option<&str>| v.unwrap_or("N/A").to_string();

  let lines = vec![
    Line::from(vec![
      Span::styled(
        format!("{:<12}", "Status"),
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
      ),
      Span::styled(s.status.label(), Style::default().fg(status_color(s.status))),
    ]),
    row("Challenge", s.challenge_label().to_string()),
    row("Location", or_na(s.display_location())),
    row("Budget", or_na(s.budget.as_deref())),
    row(
      "Date",
      s.preferred_date
        .map(format::calendar_date)
        .unwrap_or_else(|| "N/A".into()),
    ),
    row("Created", s.created_at.map(format::short_date).unwrap_or_default()),
    row("Approver", or_na(s.approver_name())),
  ];

  f.render_widget(
    Paragraph::new(lines).block(block).wrap(Wrap { trim: true }),
    area,
  );
}
