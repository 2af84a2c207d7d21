//! bjornwatch-export - one-shot transcript exporter
//!
//! Fetches a session transcript once and writes it to `session_{code}.json`
//! in the output directory. Suited for cron jobs and keeping records outside
//! the dashboard.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use bjornwatch_core::store::CredentialStore;
use bjornwatch_core::types::{
    normalize_pin, normalize_session_code, pin_is_valid, session_code_is_valid, SessionResponse,
};
use bjornwatch_core::{export, Config, FileCredentialStore, SessionClient};
use clap::Parser;

#[derive(Parser)]
#[command(name = "bjornwatch-export")]
#[command(about = "Export a session transcript to JSON")]
#[command(version)]
struct Args {
    /// Session code to export
    session: String,

    /// 4-digit parent password (defaults to the stored login's PIN)
    #[arg(long)]
    pin: Option<String>,

    /// Directory to write the export into
    #[arg(long, default_value = ".")]
    out: PathBuf,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration
    let config = Config::load().context("failed to load configuration")?;

    // Initialize logging (to file; stdout is for the result line)
    let _log_guard = bjornwatch_core::logging::init(&config.logging)
        .context("failed to initialize logging")?;

    let code = normalize_session_code(&args.session);
    if !session_code_is_valid(&code) {
        bail!("Session code must be 6 characters.");
    }

    let pin = match args.pin {
        Some(pin) => normalize_pin(&pin),
        None => {
            // Reuse the remembered PIN, but only for its own session.
            let store = FileCredentialStore::new();
            match store.load() {
                Some(login) if login.matches_code(&code) => normalize_pin(&login.parent_password),
                _ => bail!("no PIN given and no stored login for session {}", code),
            }
        }
    };
    if !pin_is_valid(&pin) {
        bail!("Parent password must be 4 digits.");
    }

    tracing::info!(session_code = %code, "one-shot transcript export");

    let client = SessionClient::new(&config.api).context("failed to build session client")?;

    // One fetch, one file: a throwaway current-thread runtime is enough.
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to build async runtime")?;

    match runtime.block_on(client.fetch_session(&code, &pin)) {
        SessionResponse::Success {
            child_name,
            messages,
        } => {
            let path = export::write_transcript(&args.out, &code, &messages)
                .context("failed to write transcript")?;
            println!(
                "Exported {} message(s) for {} to {}",
                messages.len(),
                child_name,
                path.display()
            );
            Ok(())
        }
        SessionResponse::Failure { message } => bail!("{}", message),
    }
}
