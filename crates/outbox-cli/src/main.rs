//! `outbox`: terminal dashboard for reviewing connection-plan emails.
//!
//! # Usage
//!
//! ```
//! outbox --url http://localhost:3000 --email ops@example.com --password secret
//! outbox --config ~/.config/outbox/config.toml
//! ```

mod app;
mod format;
mod logging;
mod settings;
mod ui;

use std::{io, path::PathBuf, time::Duration};

use anyhow::{Context, Result, bail};
use app::App;
use clap::Parser;
use crossterm::{
  event::{self, Event},
  execute,
  terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use outbox_client::{ApiClient, ApiConfig, Session};
use ratatui::{Terminal, backend::CrosstermBackend};
use settings::Settings;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "outbox", about = "Review and approve connection-plan emails")]
struct Args {
  /// Path to a TOML config file.
  #[arg(short, long, value_name = "FILE")]
  config: Option<PathBuf>,

  /// Base URL of the admin backend (default: http://localhost:3000).
  #[arg(long, env = "OUTBOX_URL")]
  url: Option<String>,

  /// Administrator email.
  #[arg(long, env = "OUTBOX_EMAIL")]
  email: Option<String>,

  /// Administrator password.
  #[arg(long, env = "OUTBOX_PASSWORD", hide_env_values = true)]
  password: Option<String>,

  /// Where to write logs while the TUI owns the terminal.
  #[arg(long, value_name = "FILE", default_value = "outbox.log")]
  log_file: PathBuf,
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  let args = Args::parse();
  logging::init(&args.log_file)?;

  // Flags win over the environment, which wins over the file.
  let mut settings = Settings::load(args.config.as_deref()).context("reading settings")?;
  if let Some(url) = args.url {
    settings.url = url;
  }
  if let Some(email) = args.email {
    settings.email = email;
  }
  if let Some(password) = args.password {
    settings.password = password;
  }
  if settings.email.is_empty() {
    bail!("no administrator email configured; pass --email or set OUTBOX_EMAIL");
  }

  let client = ApiClient::new(ApiConfig::new(settings.url.clone()), Session::new())
    .context("creating API client")?;
  client
    .login(&settings.email, &settings.password)
    .await
    .with_context(|| format!("logging in to {}", settings.url))?;

  let mut app = App::new(client, &settings);

  // Set up the terminal.
  enable_raw_mode().context("enabling raw mode")?;
  let mut stdout = io::stdout();
  execute!(stdout, EnterAlternateScreen).context("entering alternate screen")?;
  let backend = CrosstermBackend::new(stdout);
  let mut terminal = Terminal::new(backend).context("creating terminal")?;

  // Run the event loop; restore terminal even on error.
  let run_result = match app.load_list().await {
    Ok(()) => run_event_loop(&mut terminal, &mut app).await,
    Err(e) => Err(e),
  };
  app.shutdown().await;

  disable_raw_mode().ok();
  execute!(terminal.backend_mut(), LeaveAlternateScreen).ok();
  terminal.show_cursor().ok();

  run_result
}

// ─── Event loop ───────────────────────────────────────────────────────────────

async fn run_event_loop(
  terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
  app: &mut App,
) -> Result<()> {
  loop {
    // Auto-save progress arrives from the draft task between key presses.
    app.refresh();
    terminal.draw(|f| ui::draw(f, app)).context("drawing frame")?;

    // Poll for an event, yielding control to tokio while waiting.
    let maybe_event = tokio::task::block_in_place(|| {
      if event::poll(Duration::from_millis(50))? {
        Ok::<_, io::Error>(Some(event::read()?))
      } else {
        Ok(None)
      }
    })?;

    if let Some(Event::Key(key)) = maybe_event {
      if !app.handle_key(key).await? {
        break;
      }
    }
  }

  Ok(())
}
