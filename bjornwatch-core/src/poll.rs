//! Transcript polling
//!
//! A watch is one polling run for a single session: an immediate fetch,
//! then one fetch per interval, each tick delivered to the consumer as a
//! [`PollEvent`]. Watches carry an epoch token; starting a new watch
//! (session switch, pause/resume, manual refresh) bumps the epoch and
//! orphans the previous worker, whose late results are discarded on both
//! sides of the channel so a stale transcript is never applied.
//!
//! [`PollState`] is the pure per-watch state machine, kept separate from
//! the worker thread so replacement and new-arrival rules are testable
//! without a backend.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::client::SessionClient;
use crate::store::CredentialStore;
use crate::types::{LogItem, SessionResponse, StoredLogin};

// ============================================
// Poll State
// ============================================

/// Pure per-watch state: the transcript as last fetched, plus the
/// bookkeeping for new-arrival detection.
#[derive(Debug, Default)]
pub struct PollState {
    messages: Vec<LogItem>,
    child_name: Option<String>,
    last_error: Option<String>,
}

/// What applying one tick meant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickOutcome {
    /// True iff this tick's last message timestamp is strictly newer than
    /// the previous tick's, with both transcripts non-empty
    pub new_arrival: bool,
}

impl PollState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one fetch result.
    ///
    /// Success replaces the transcript wholesale (no merging); failure
    /// clears it and records the message, leaving the watch free to
    /// recover on the next tick.
    pub fn apply(&mut self, response: SessionResponse) -> TickOutcome {
        match response {
            SessionResponse::Success {
                child_name,
                messages,
            } => {
                let previous_ts = self.messages.last().map(|m| m.ts);
                let current_ts = messages.last().map(|m| m.ts);
                let new_arrival = match (previous_ts, current_ts) {
                    (Some(previous), Some(current)) => current > previous,
                    _ => false,
                };

                self.messages = messages;
                self.child_name = Some(child_name);
                self.last_error = None;

                TickOutcome { new_arrival }
            }
            SessionResponse::Failure { message } => {
                self.messages.clear();
                self.last_error = Some(message);

                TickOutcome { new_arrival: false }
            }
        }
    }

    /// Current view of the watch, cloned for the channel.
    pub fn snapshot(&self) -> TranscriptSnapshot {
        TranscriptSnapshot {
            child_name: self.child_name.clone(),
            messages: self.messages.clone(),
            last_error: self.last_error.clone(),
        }
    }

    pub fn messages(&self) -> &[LogItem] {
        &self.messages
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }
}

/// One tick's view of a session, as delivered to the UI.
#[derive(Debug, Clone)]
pub struct TranscriptSnapshot {
    /// Child display name from the most recent success, if any
    pub child_name: Option<String>,
    /// Transcript from the most recent success; empty after a failure
    pub messages: Vec<LogItem>,
    /// Failure message from the most recent tick, `None` after a success
    pub last_error: Option<String>,
}

/// One tick's result, tagged with the watch epoch that produced it.
#[derive(Debug, Clone)]
pub struct PollEvent {
    /// Epoch of the watch that produced this event
    pub epoch: u64,
    /// Tick number within the watch, starting at 1
    pub tick: u64,
    /// State after applying the tick
    pub snapshot: TranscriptSnapshot,
    /// New-arrival flag for the scroll reconciler
    pub new_arrival: bool,
}

// ============================================
// Session Poller
// ============================================

/// Owns transcript polling for the UI.
///
/// One worker thread runs per watch. The handle hands out events and the
/// current epoch; [`SessionPoller::stop`] or a new [`SessionPoller::watch`]
/// orphans the running worker, which exits at its next epoch check without
/// fetching again.
pub struct SessionPoller {
    client: Arc<SessionClient>,
    store: Arc<dyn CredentialStore>,
    interval: Duration,
    epoch: Arc<AtomicU64>,
    events_tx: Sender<PollEvent>,
    events_rx: Receiver<PollEvent>,
}

impl SessionPoller {
    pub fn new(
        client: SessionClient,
        store: Arc<dyn CredentialStore>,
        interval: Duration,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::channel();
        Self {
            client: Arc::new(client),
            store,
            interval,
            epoch: Arc::new(AtomicU64::new(0)),
            events_tx,
            events_rx,
        }
    }

    /// Epoch of the active watch; events from any other epoch are stale.
    pub fn current_epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    /// Start watching a session, cancelling any previous watch.
    ///
    /// The worker fetches immediately, then once per interval. Returns the
    /// new watch's epoch.
    pub fn watch(&self, session_code: &str, pin: &str) -> u64 {
        let epoch = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::info!(session_code, epoch, "starting watch");

        let worker = PollWorker {
            epoch,
            current_epoch: Arc::clone(&self.epoch),
            client: Arc::clone(&self.client),
            store: Arc::clone(&self.store),
            events: self.events_tx.clone(),
            session_code: session_code.to_string(),
            pin: pin.to_string(),
            interval: self.interval,
        };
        thread::spawn(move || worker.run());

        epoch
    }

    /// Stop polling without starting a new watch.
    pub fn stop(&self) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        tracing::info!("watch stopped");
    }

    /// Next pending event for the active watch, if any.
    ///
    /// Stale-epoch events are dropped here so callers only ever observe
    /// the watch they most recently started.
    pub fn try_next_event(&self) -> Option<PollEvent> {
        loop {
            match self.events_rx.try_recv() {
                Ok(event) if event.epoch == self.current_epoch() => return Some(event),
                Ok(stale) => {
                    tracing::debug!(
                        epoch = stale.epoch,
                        tick = stale.tick,
                        "dropping stale poll event"
                    );
                }
                Err(_) => return None,
            }
        }
    }
}

/// State moved onto the watch worker thread.
struct PollWorker {
    epoch: u64,
    current_epoch: Arc<AtomicU64>,
    client: Arc<SessionClient>,
    store: Arc<dyn CredentialStore>,
    events: Sender<PollEvent>,
    session_code: String,
    pin: String,
    interval: Duration,
}

impl PollWorker {
    fn run(self) {
        // Each worker owns a small current-thread runtime and blocks on the
        // async client, which keeps ticks strictly sequential: a fetch must
        // finish (or time out) before the next one can start.
        let runtime = match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(e) => {
                tracing::error!(error = %e, "failed to create poll runtime");
                self.send_event(
                    1,
                    PollState::new(),
                    SessionResponse::failure(format!("poll worker failed to start: {}", e)),
                );
                return;
            }
        };

        let mut state = PollState::new();
        let mut synced_name: Option<String> = None;
        let mut tick: u64 = 0;

        loop {
            if self.cancelled() {
                break;
            }

            let response =
                runtime.block_on(self.client.fetch_session(&self.session_code, &self.pin));

            // The session may have been switched while the request was in
            // flight; a stale result must not be applied or sent.
            if self.cancelled() {
                break;
            }

            tick += 1;

            if let SessionResponse::Success { child_name, .. } = &response {
                self.sync_child_name(child_name, &mut synced_name);
            }

            let outcome = state.apply(response);
            tracing::debug!(
                session_code = %self.session_code,
                epoch = self.epoch,
                tick,
                messages = state.messages().len(),
                error = state.last_error().unwrap_or(""),
                new_arrival = outcome.new_arrival,
                "poll tick applied"
            );

            let event = PollEvent {
                epoch: self.epoch,
                tick,
                snapshot: state.snapshot(),
                new_arrival: outcome.new_arrival,
            };
            if self.events.send(event).is_err() {
                // Consumer is gone; nothing left to poll for.
                break;
            }

            thread::sleep(self.interval);
        }

        tracing::debug!(session_code = %self.session_code, epoch = self.epoch, "watch ended");
    }

    fn cancelled(&self) -> bool {
        self.current_epoch.load(Ordering::SeqCst) != self.epoch
    }

    /// Apply `response` to a fresh state and send the resulting event.
    fn send_event(&self, tick: u64, mut state: PollState, response: SessionResponse) {
        let outcome = state.apply(response);
        let _ = self.events.send(PollEvent {
            epoch: self.epoch,
            tick,
            snapshot: state.snapshot(),
            new_arrival: outcome.new_arrival,
        });
    }

    /// Write a corrected child name through to a stored login that matches
    /// this watch's session code.
    ///
    /// `synced` caches the last name pushed so the store file is only read
    /// when the backend actually reports something new.
    fn sync_child_name(&self, child_name: &str, synced: &mut Option<String>) {
        if synced.as_deref() == Some(child_name) {
            return;
        }
        *synced = Some(child_name.to_string());

        let Some(stored) = self.store.load() else {
            return;
        };
        if !stored.matches_code(&self.session_code) || stored.child_name == child_name {
            return;
        }

        let updated = StoredLogin {
            child_name: child_name.to_string(),
            ..stored
        };
        match self.store.save(Some(&updated)) {
            Ok(()) => {
                tracing::info!(child_name, "stored login updated with corrected child name");
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to write corrected child name");
            }
        }
    }
}
