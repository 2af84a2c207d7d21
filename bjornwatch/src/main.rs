//! bjornwatch - Björn parent dashboard
//!
//! Terminal UI for watching a child's live conversation with Björn, the
//! AI-powered teddy bear.

mod app;
mod message_format;
mod ui;

use std::io;
use std::sync::Arc;

use anyhow::{Context, Result};
use bjornwatch_core::{Config, FileCredentialStore, SessionClient, SessionPoller};
use clap::Parser;
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use crate::app::App;

#[derive(Parser)]
#[command(name = "bjornwatch")]
#[command(about = "Watch a child's live conversation with Björn")]
#[command(version)]
struct Args {
    /// Session code to watch (skips the login form when --pin is also given)
    #[arg(long)]
    session: Option<String>,

    /// 4-digit parent password
    #[arg(long)]
    pin: Option<String>,

    /// Milliseconds between transcript fetches (overrides the config file)
    #[arg(long)]
    interval_ms: Option<u64>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration
    let config = Config::load().context("failed to load configuration")?;

    // Initialize logging (to file, not stdout since we have a TUI)
    let _log_guard = bjornwatch_core::logging::init(&config.logging)
        .context("failed to initialize logging")?;

    tracing::info!("bjornwatch TUI starting up");

    let interval = args
        .interval_ms
        .map(std::time::Duration::from_millis)
        .unwrap_or_else(|| config.poll.interval());

    // Wire the poller to the backend and the stored login
    let client = SessionClient::new(&config.api).context("failed to build session client")?;
    let store = Arc::new(FileCredentialStore::new());
    let poller = SessionPoller::new(client, store.clone(), interval);

    // Exports land in the directory the dashboard was started from
    let export_dir = std::env::current_dir().context("failed to resolve working directory")?;

    let mut app = App::new(poller, store, export_dir);
    app.startup(args.session, args.pin);

    // Setup terminal
    enable_raw_mode().context("failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("failed to create terminal")?;

    // Run the main loop
    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor().context("failed to show cursor")?;

    tracing::info!("bjornwatch TUI shutting down");

    result
}

/// Run the main application loop.
fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    loop {
        // Apply whatever the poll worker produced since the last frame
        app.drain_poll_events();
        app.tick();

        // Render
        terminal.draw(|frame| ui::render(frame, app))?;

        // Handle events
        if event::poll(std::time::Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                app.handle_key(key);
            }
        }

        // Check if we should quit
        if app.should_quit {
            break;
        }
    }

    Ok(())
}
