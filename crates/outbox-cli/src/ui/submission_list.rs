//! List screen: counters, filters and one page of submissions.

use chrono::Utc;
use outbox_core::submission::{Submission, SubmissionStatus};
use ratatui::{
  Frame,
  layout::{Constraint, Direction, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};

use crate::{app::App, format};

pub fn draw(f: &mut Frame, area: Rect, app: &App) {
  let rows = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(3), // stats
      Constraint::Length(1), // filters
      Constraint::Min(0),    // list
    ])
    .split(area);

  draw_stats(f, rows[0], app);
  draw_filters(f, rows[1], app);
  draw_list(f, rows[2], app);
}

pub fn status_color(status: SubmissionStatus) -> Color {
  match status {
    SubmissionStatus::Processing => Color::Yellow,
    SubmissionStatus::Pending | SubmissionStatus::PendingApproval => Color::Blue,
    SubmissionStatus::Sent => Color::Green,
    SubmissionStatus::Rejected => Color::Gray,
    SubmissionStatus::Failed => Color::Red,
  }
}

fn draw_stats(f: &mut Frame, area: Rect, app: &App) {
  let s = &app.stats;
  let counter = |label: &'static str, n: u64, color: Color| {
    vec![
      Span::styled(format!(" {n} "), Style::default().fg(color).add_modifier(Modifier::BOLD)),
      Span::styled(format!("{label}   "), Style::default().fg(Color::Gray)),
    ]
  };
  let spans: Vec<Span> = [
    counter("total", s.total, Color::White),
    counter("processing", s.processing, Color::Yellow),
    counter("sent", s.sent, Color::Green),
    counter("failed", s.failed, Color::Red),
    counter("rejected", s.rejected, Color::Gray),
  ]
  .into_iter()
  .flatten()
  .collect();

  let block = Block::default()
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::DarkGray));
  f.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

fn draw_filters(f: &mut Frame, area: Rect, app: &App) {
  let status = app.query.status.map_or("all", SubmissionStatus::label);
  let challenge = app.query.challenge_type.as_deref().unwrap_or("all");
  let search = if app.search_active {
    format!("/{}_", app.search)
  } else {
    app.query.search.clone().unwrap_or_default()
  };

  let dim = Style::default().fg(Color::DarkGray);
  let on = Style::default().fg(Color::Yellow);
  let line = Line::from(vec![
    Span::styled(" status: ", dim),
    Span::styled(status, on),
    Span::styled("   type: ", dim),
    Span::styled(challenge, on),
    Span::styled("   search: ", dim),
    Span::styled(search, on),
  ]);
  f.render_widget(Paragraph::new(line), area);
}

fn draw_list(f: &mut Frame, area: Rect, app: &App) {
  let page = &app.page;
  let title = format!(
    " Submissions ({})  page {}/{} ",
    page.total,
    page.page,
    page.total_pages.max(1)
  );
  let block = Block::default()
    .title(title)
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::DarkGray));

  if page.submissions.is_empty() {
    let empty = Paragraph::new("No submissions match these filters.")
      .style(Style::default().fg(Color::DarkGray))
      .block(block);
    f.render_widget(empty, area);
    return;
  }

  let now = Utc::now();
  let items: Vec<ListItem> = page
    .submissions
    .iter()
    .map(|s| ListItem::new(row(s, now)))
    .collect();

  let mut state = ListState::default();
  state.select(Some(app.list_cursor));
  f.render_stateful_widget(
    List::new(items).block(block).highlight_style(
      Style::default()
        .bg(Color::Blue)
        .fg(Color::White)
        .add_modifier(Modifier::BOLD),
    ),
    area,
    &mut state,
  );
}

fn row(s: &Submission, now: chrono::DateTime<Utc>) -> Line<'static> {
  let recipient = if s.user_email.is_empty() { "(no recipient)" } else { &s.user_email };
  let location = s
    .display_location()
    .map(format::first_segment)
    .unwrap_or("No location");
  let budget = s
    .budget
    .as_deref()
    .map(format::first_word)
    .filter(|b| !b.is_empty())
    .unwrap_or("N/A");
  let created = s
    .created_at
    .map(|t| format::relative_time(t, now))
    .unwrap_or_default();

  Line::from(vec![
    Span::styled(
      format!("{:<17}", s.status.label()),
      Style::default().fg(status_color(s.status)),
    ),
    Span::raw(format!("{recipient:<32} ")),
    Span::styled(
      format!("{:<24}", s.challenge_label()),
      Style::default().fg(Color::Magenta),
    ),
    Span::raw(format!("{location:<18} {budget:<8} ")),
    Span::styled(created, Style::default().fg(Color::DarkGray)),
  ])
}
