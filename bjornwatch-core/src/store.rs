//! Credential storage for "remember me"
//!
//! One JSON record `{sessionCode, parentPassword, childName}` lives at
//! `~/.local/share/bjornwatch/login.json`. Loading is deliberately
//! forgiving: a missing or unparseable file reads as "no stored login",
//! never as an error, so a damaged record cannot lock a parent out of the
//! login form.

use std::path::PathBuf;

use crate::config::Config;
use crate::error::Result;
use crate::types::StoredLogin;

/// Persistent storage for the "remember me" login record.
///
/// Injected into the poll loop and the view rather than reached through a
/// global, so tests substitute a temp-dir store.
pub trait CredentialStore: Send + Sync {
    /// The stored login, or `None` when absent or corrupt.
    fn load(&self) -> Option<StoredLogin>;

    /// Write the record, or delete it when `login` is `None`.
    fn save(&self, login: Option<&StoredLogin>) -> Result<()>;
}

/// File-backed credential store
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    /// Store at the default XDG location
    pub fn new() -> Self {
        Self {
            path: Config::login_path(),
        }
    }

    /// Store at an explicit path (tests point this into a temp dir)
    pub fn at_path(path: PathBuf) -> Self {
        Self { path }
    }

    /// Path of the backing file
    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

impl Default for FileCredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialStore for FileCredentialStore {
    fn load(&self) -> Option<StoredLogin> {
        let content = std::fs::read_to_string(&self.path).ok()?;
        match serde_json::from_str(&content) {
            Ok(login) => Some(login),
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "stored login is unreadable, treating as absent"
                );
                None
            }
        }
    }

    fn save(&self, login: Option<&StoredLogin>) -> Result<()> {
        match login {
            Some(login) => {
                if let Some(parent) = self.path.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                let json = serde_json::to_string_pretty(login)?;
                std::fs::write(&self.path, json)?;
                tracing::debug!(path = %self.path.display(), "stored login written");
            }
            None => match std::fs::remove_file(&self.path) {
                Ok(()) => {
                    tracing::debug!(path = %self.path.display(), "stored login removed");
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            },
        }
        Ok(())
    }
}
