//! # bjornwatch-core
//!
//! Core library for bjornwatch - a parent dashboard for "Björn", the
//! AI-powered toy. Parents authenticate with a short session code and a
//! 4-digit PIN, then watch a live transcript of the child's conversation.
//!
//! This library provides:
//! - Domain types for transcripts, fetch results, and stored logins
//! - A never-failing session fetcher over the backend's JSON endpoint
//! - An epoch-guarded poll loop feeding transcript snapshots to a UI
//! - The scroll-follow policy for live transcript views
//! - Credential storage, transcript export, configuration, and logging
//!
//! ## Architecture
//!
//! Polling is pull-only and layered so each piece is testable alone:
//! - **Fetcher** ([`client`]): one HTTP lookup, every outcome normalized
//!   into a [`SessionResponse`] (no error path)
//! - **Poll loop** ([`poll`]): a worker per watch applies fetch results to
//!   a pure [`PollState`] and streams epoch-tagged snapshots to the UI
//! - **Policy** ([`scroll`]): pure decision on whether the view follows
//!   the newest message after an update
//!
//! ## Example
//!
//! ```rust,no_run
//! use bjornwatch_core::{Config, FileCredentialStore, SessionClient, SessionPoller};
//! use std::sync::Arc;
//!
//! // Load configuration and start watching a session
//! let config = Config::load().expect("failed to load config");
//! let client = SessionClient::new(&config.api).expect("failed to build client");
//! let store = Arc::new(FileCredentialStore::new());
//! let poller = SessionPoller::new(client, store, config.poll.interval());
//! poller.watch("ABC123", "1234");
//!
//! // Drain transcript snapshots from the UI loop
//! while let Some(event) = poller.try_next_event() {
//!     println!("{} messages", event.snapshot.messages.len());
//! }
//! ```

// Re-export commonly used items at the crate root
pub use client::SessionClient;
pub use config::Config;
pub use error::{Error, Result};
pub use poll::{PollEvent, PollState, SessionPoller, TranscriptSnapshot};
pub use scroll::{FollowState, ScrollAction, ScrollMetrics};
pub use store::{CredentialStore, FileCredentialStore};
pub use types::*;

// Public modules
pub mod client;
pub mod config;
pub mod error;
pub mod export;
pub mod logging;
pub mod poll;
pub mod scroll;
pub mod store;
pub mod types;
