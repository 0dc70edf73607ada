//! TUI rendering. `draw` lays out the header, the active screen and the
//! status bar.

pub mod submission_edit;
pub mod submission_list;

use chrono::Local;
use ratatui::{
  Frame,
  layout::{Constraint, Direction, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Paragraph},
};

use crate::app::{App, Screen};

// ─── Root draw ────────────────────────────────────────────────────────────────

/// Main draw function called each frame.
pub fn draw(f: &mut Frame, app: &App) {
  let rows = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1), // header
      Constraint::Min(0),    // body
      Constraint::Length(1), // status bar
    ])
    .split(f.area());

  draw_header(f, rows[0], app);
  match (app.screen, &app.editor) {
    (Screen::Edit, Some(editor)) => submission_edit::draw(f, rows[1], editor),
    _ => submission_list::draw(f, rows[1], app),
  }
  draw_status(f, rows[2], app);
}

// ─── Header ───────────────────────────────────────────────────────────────────

fn draw_header(f: &mut Frame, area: Rect, app: &App) {
  let admin = app
    .client
    .session()
    .admin()
    .map(|a| a.display_name().to_string())
    .unwrap_or_default();
  let date = Local::now().format("%Y-%m-%d").to_string();

  let left = Span::styled(
    " outbox  email review",
    Style::default()
      .fg(Color::White)
      .add_modifier(Modifier::BOLD),
  );
  let right = Span::styled(
    format!("{admin}  {date} "),
    Style::default().fg(Color::Gray),
  );

  let pad = area
    .width
    .saturating_sub(left.width() as u16)
    .saturating_sub(right.width() as u16);
  let line = Line::from(vec![left, Span::raw(" ".repeat(pad as usize)), right]);

  let block = Block::default().style(Style::default().bg(Color::DarkGray));
  let inner = block.inner(area);
  f.render_widget(block, area);
  f.render_widget(Paragraph::new(line), inner);
}

// ─── Status bar ───────────────────────────────────────────────────────────────

fn draw_status(f: &mut Frame, area: Rect, app: &App) {
  let confirming = app.editor.as_ref().is_some_and(|e| e.confirm.is_some());
  let (mode_label, hints) = match app.screen {
    Screen::List if app.search_active => ("SEARCH", "Type an email  Enter apply  Esc cancel"),
    Screen::List => (
      "LIST",
      "jk move  Enter open  n/p page  s status  t type  / search  r reload  q quit",
    ),
    Screen::Edit if confirming => ("CONFIRM", "y confirm  any other key cancels"),
    Screen::Edit => (
      "EDIT",
      "Tab next field  ^S save  ^A approve  ^R reject  PgUp/PgDn scroll  Esc back",
    ),
  };

  let status = if app.status_msg.is_empty() {
    hints.to_string()
  } else {
    app.status_msg.clone()
  };

  let mode_bg = if confirming { Color::Yellow } else { Color::Cyan };
  let line = Line::from(vec![
    Span::styled(
      format!(" {mode_label} "),
      Style::default()
        .fg(Color::Black)
        .bg(mode_bg)
        .add_modifier(Modifier::BOLD),
    ),
    Span::styled(format!("  {status}"), Style::default().fg(Color::Gray)),
  ]);
  f.render_widget(
    Paragraph::new(line).style(Style::default().bg(Color::Black)),
    area,
  );
}
