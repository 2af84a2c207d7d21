//! Application state for the dashboard TUI.

use std::path::PathBuf;
use std::sync::Arc;

use bjornwatch_core::client::{MSG_INCORRECT_LOGIN, MSG_INVALID_PASSWORD, MSG_INVALID_SESSION};
use bjornwatch_core::export;
use bjornwatch_core::poll::{PollEvent, SessionPoller, TranscriptSnapshot};
use bjornwatch_core::scroll::{FollowState, ScrollAction, ScrollMetrics};
use bjornwatch_core::store::CredentialStore;
use bjornwatch_core::types::{
    normalize_pin, normalize_session_code, pin_is_valid, session_code_is_valid, StoredLogin,
};
use crossterm::event::{KeyCode, KeyEvent};

/// Toast copy for a short or malformed session code
pub const MSG_CODE_LENGTH: &str = "Session code must be 6 characters.";
/// Toast copy for a short or malformed PIN
pub const MSG_PIN_LENGTH: &str = "Parent password must be 4 digits.";

/// How many render ticks a toast stays up (~3 seconds at 100ms per tick)
const TOAST_TICKS: u32 = 30;

/// The follow reconciler thinks in the same units its slack constant is
/// sized for, which assumes pixel-like scales. One terminal row maps to
/// this many units, putting the at-bottom slack at two rows.
const ROW_UNITS: f64 = 20.0;

/// Current view mode
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum ViewMode {
    /// Login form
    #[default]
    Login,
    /// Live transcript view
    Transcript,
}

/// Which login field has focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginField {
    SessionCode,
    Pin,
    Remember,
}

impl LoginField {
    fn next(self) -> Self {
        match self {
            LoginField::SessionCode => LoginField::Pin,
            LoginField::Pin => LoginField::Remember,
            LoginField::Remember => LoginField::SessionCode,
        }
    }

    fn previous(self) -> Self {
        match self {
            LoginField::SessionCode => LoginField::Remember,
            LoginField::Pin => LoginField::SessionCode,
            LoginField::Remember => LoginField::Pin,
        }
    }
}

/// Main application state.
pub struct App {
    /// Transcript poller (owns the watch worker threads)
    poller: SessionPoller,
    /// Credential store for "remember me"
    store: Arc<dyn CredentialStore>,
    /// Directory the `e` key exports into
    export_dir: PathBuf,
    /// Current view mode
    pub view_mode: ViewMode,
    /// Login form: session code input (kept normalized)
    pub code_input: String,
    /// Login form: PIN input (kept normalized)
    pub pin_input: String,
    /// Login form: remember-me toggle
    pub remember: bool,
    /// Login form: focused field
    pub focus: LoginField,
    /// Session code of the active watch
    pub active_code: String,
    /// PIN of the active watch
    active_pin: String,
    /// Latest snapshot from the active watch
    pub snapshot: Option<TranscriptSnapshot>,
    /// True between starting a watch and its first event
    pub loading: bool,
    /// Whether polling is paused
    pub paused: bool,
    /// Scroll offset into the transcript, in lines
    pub scroll_offset: usize,
    /// Bottom-follow state for the transcript view
    follow: FollowState,
    /// Viewport height of the last rendered frame, in lines
    pub viewport_rows: usize,
    /// Content height of the last rendered frame, in lines
    pub content_rows: usize,
    /// Login to persist once the watch's first fetch succeeds
    pending_remember: Option<StoredLogin>,
    /// Transient notice and its remaining ticks
    pub toast: Option<(String, u32)>,
    /// Whether the app should exit
    pub should_quit: bool,
}

impl App {
    /// Create a new App around a poller and credential store.
    pub fn new(
        poller: SessionPoller,
        store: Arc<dyn CredentialStore>,
        export_dir: PathBuf,
    ) -> Self {
        Self {
            poller,
            store,
            export_dir,
            view_mode: ViewMode::default(),
            code_input: String::new(),
            pin_input: String::new(),
            remember: true,
            focus: LoginField::SessionCode,
            active_code: String::new(),
            active_pin: String::new(),
            snapshot: None,
            loading: false,
            paused: false,
            scroll_offset: 0,
            follow: FollowState::mount(ScrollMetrics {
                offset: 0.0,
                viewport: 0.0,
                content: 0.0,
            }),
            viewport_rows: 0,
            content_rows: 0,
            pending_remember: None,
            toast: None,
            should_quit: false,
        }
    }

    /// Decide the starting view from CLI flags and the stored login.
    ///
    /// A complete pair of credentials (flags, or the stored record when it
    /// matches) opens the transcript view directly; anything less lands on
    /// the login form, prefilled as far as possible.
    pub fn startup(&mut self, session: Option<String>, pin: Option<String>) {
        let stored = self.store.load();

        if let Some(stored) = &stored {
            self.code_input = normalize_session_code(&stored.session_code);
            self.pin_input = normalize_pin(&stored.parent_password);
            self.remember = true;
        }

        let (code, pin) = match (session, pin) {
            (Some(code), Some(pin)) => (normalize_session_code(&code), normalize_pin(&pin)),
            (Some(code), None) => {
                let code = normalize_session_code(&code);
                // Borrow the stored PIN only for its own session.
                match &stored {
                    Some(stored) if stored.matches_code(&code) => {
                        let pin = normalize_pin(&stored.parent_password);
                        (code, pin)
                    }
                    _ => {
                        self.code_input = code;
                        self.pin_input.clear();
                        return;
                    }
                }
            }
            (None, pin) => match &stored {
                Some(stored) => {
                    let code = normalize_session_code(&stored.session_code);
                    let pin = pin
                        .map(|p| normalize_pin(&p))
                        .unwrap_or_else(|| normalize_pin(&stored.parent_password));
                    (code, pin)
                }
                None => {
                    if let Some(pin) = pin {
                        self.pin_input = normalize_pin(&pin);
                    }
                    return;
                }
            },
        };

        if session_code_is_valid(&code) && pin_is_valid(&pin) {
            self.start_watch(code, pin);
        } else {
            self.code_input = code;
            self.pin_input = pin;
        }
    }

    /// Advance the render tick (drives toast expiry).
    pub fn tick(&mut self) {
        if let Some((_, ticks)) = &mut self.toast {
            *ticks = ticks.saturating_sub(1);
            if *ticks == 0 {
                self.toast = None;
            }
        }
    }

    /// Apply every poll event that arrived since the last frame.
    pub fn drain_poll_events(&mut self) {
        while let Some(event) = self.poller.try_next_event() {
            self.apply_poll_event(event);
        }
    }

    /// Apply one poll event to the view state.
    pub fn apply_poll_event(&mut self, event: PollEvent) {
        self.loading = false;

        match &event.snapshot.last_error {
            None => self.persist_pending_login(event.snapshot.child_name.as_deref()),
            Some(message) => {
                // The in-view error line carries repeats; only a changed
                // error raises a toast.
                let previous = self.snapshot.as_ref().and_then(|s| s.last_error.as_deref());
                if previous != Some(message.as_str()) {
                    self.show_toast(message.clone());
                }
                if is_login_rejection(message) {
                    self.discard_rejected_login();
                }
            }
        }

        self.snapshot = Some(event.snapshot);

        match self.follow.reconcile(event.new_arrival) {
            ScrollAction::PinToBottom => {
                // Clamped against the freshly rendered content next frame.
                self.scroll_offset = usize::MAX;
            }
            ScrollAction::Preserve => {}
        }
    }

    /// Handle keyboard input.
    pub fn handle_key(&mut self, key: KeyEvent) {
        match self.view_mode {
            ViewMode::Login => self.handle_login_key(key),
            ViewMode::Transcript => self.handle_transcript_key(key),
        }
    }

    // ========== Login View ==========

    fn handle_login_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.should_quit = true;
            }
            KeyCode::Enter => {
                self.submit_login();
            }
            KeyCode::Tab | KeyCode::Down => {
                self.focus = self.focus.next();
            }
            KeyCode::BackTab | KeyCode::Up => {
                self.focus = self.focus.previous();
            }
            KeyCode::Backspace => match self.focus {
                LoginField::SessionCode => {
                    self.code_input.pop();
                }
                LoginField::Pin => {
                    self.pin_input.pop();
                }
                LoginField::Remember => {}
            },
            KeyCode::Char(' ') if self.focus == LoginField::Remember => {
                self.remember = !self.remember;
            }
            KeyCode::Char(c) => match self.focus {
                LoginField::SessionCode => {
                    self.code_input.push(c);
                    self.code_input = normalize_session_code(&self.code_input);
                }
                LoginField::Pin => {
                    self.pin_input.push(c);
                    self.pin_input = normalize_pin(&self.pin_input);
                }
                LoginField::Remember => {}
            },
            _ => {}
        }
    }

    /// Validate the form and start watching.
    fn submit_login(&mut self) {
        if !session_code_is_valid(&self.code_input) {
            self.show_toast(MSG_CODE_LENGTH);
            return;
        }
        if !pin_is_valid(&self.pin_input) {
            self.show_toast(MSG_PIN_LENGTH);
            return;
        }

        let code = self.code_input.clone();
        let pin = self.pin_input.clone();
        self.start_watch(code, pin);
    }

    /// Start a watch for `code` and switch to the transcript view.
    fn start_watch(&mut self, code: String, pin: String) {
        tracing::info!(session_code = %code, "starting transcript watch");

        if self.remember {
            self.pending_remember = Some(StoredLogin {
                session_code: code.clone(),
                parent_password: pin.clone(),
                child_name: String::new(),
            });
        } else {
            self.pending_remember = None;
            // Opting out also clears whatever was remembered before.
            if let Err(e) = self.store.save(None) {
                tracing::warn!(error = %e, "failed to clear stored login");
            }
        }

        self.snapshot = None;
        self.loading = true;
        self.paused = false;
        self.scroll_offset = 0;
        self.viewport_rows = 0;
        self.content_rows = 0;
        self.follow = FollowState::mount(self.metrics());
        self.active_code = code;
        self.active_pin = pin;
        self.view_mode = ViewMode::Transcript;
        self.poller.watch(&self.active_code, &self.active_pin);
    }

    // ========== Transcript View ==========

    fn handle_transcript_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => {
                self.should_quit = true;
            }
            KeyCode::Esc => {
                self.close_transcript();
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.scroll_to(self.scroll_offset.saturating_add(1));
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.scroll_to(self.scroll_offset.saturating_sub(1));
            }
            KeyCode::PageDown | KeyCode::Char('d') => {
                self.scroll_to(self.scroll_offset.saturating_add(self.half_page()));
            }
            KeyCode::PageUp | KeyCode::Char('u') => {
                self.scroll_to(self.scroll_offset.saturating_sub(self.half_page()));
            }
            KeyCode::Home | KeyCode::Char('g') => {
                self.scroll_to(0);
            }
            KeyCode::End | KeyCode::Char('G') => {
                self.scroll_to(usize::MAX);
            }
            KeyCode::Char('p') => {
                self.toggle_pause();
            }
            KeyCode::Char('r') => {
                self.refresh();
            }
            KeyCode::Char('e') => {
                self.export_transcript();
            }
            _ => {}
        }
    }

    /// Stop polling and return to the login form.
    fn close_transcript(&mut self) {
        self.poller.stop();
        self.view_mode = ViewMode::Login;
        self.snapshot = None;
        self.loading = false;
        self.paused = false;
        self.pending_remember = None;
        self.toast = None;
    }

    /// Pause or resume polling; resuming fetches immediately.
    fn toggle_pause(&mut self) {
        if self.paused {
            self.paused = false;
            self.poller.watch(&self.active_code, &self.active_pin);
        } else {
            self.paused = true;
            self.poller.stop();
        }
    }

    /// Restart the watch for an immediate fetch.
    fn refresh(&mut self) {
        self.paused = false;
        self.poller.watch(&self.active_code, &self.active_pin);
    }

    /// Write the current transcript into the working directory.
    fn export_transcript(&mut self) {
        let messages = self
            .snapshot
            .as_ref()
            .map(|s| s.messages.clone())
            .unwrap_or_default();
        if messages.is_empty() {
            self.show_toast("Nothing to export yet");
            return;
        }

        match export::write_transcript(&self.export_dir, &self.active_code, &messages) {
            Ok(path) => self.show_toast(format!("Exported to {}", path.display())),
            Err(e) => {
                tracing::warn!(error = %e, "transcript export failed");
                self.show_toast(format!("Export failed: {}", e));
            }
        }
    }

    // ========== Scrolling ==========

    /// Move to `requested`, clamped to the last rendered geometry.
    fn scroll_to(&mut self, requested: usize) {
        let max_scroll = self.content_rows.saturating_sub(self.viewport_rows);
        self.scroll_offset = requested.min(max_scroll);
        self.follow.on_scroll(self.metrics());
    }

    fn half_page(&self) -> usize {
        (self.viewport_rows / 2).max(1)
    }

    fn metrics(&self) -> ScrollMetrics {
        ScrollMetrics {
            offset: self.scroll_offset as f64 * ROW_UNITS,
            viewport: self.viewport_rows as f64 * ROW_UNITS,
            content: self.content_rows as f64 * ROW_UNITS,
        }
    }

    // ========== Shared ==========

    /// First successful fetch of a watch confirms the credentials; only
    /// then is the "remember me" record written.
    fn persist_pending_login(&mut self, child_name: Option<&str>) {
        let Some(pending) = self.pending_remember.take() else {
            return;
        };
        let login = StoredLogin {
            child_name: child_name.unwrap_or_default().to_string(),
            ..pending
        };
        if let Err(e) = self.store.save(Some(&login)) {
            tracing::warn!(error = %e, "failed to persist login");
            self.show_toast("Could not save login");
        }
    }

    /// A backend rejection invalidates any remembered login for the
    /// session being watched.
    fn discard_rejected_login(&mut self) {
        match self.store.load() {
            Some(stored) if stored.matches_code(&self.active_code) => {
                if let Err(e) = self.store.save(None) {
                    tracing::warn!(error = %e, "failed to clear rejected login");
                }
            }
            _ => {}
        }
    }

    fn show_toast(&mut self, message: impl Into<String>) {
        self.toast = Some((message.into(), TOAST_TICKS));
    }
}

/// Whether a failure message means the backend rejected the credentials,
/// as opposed to a transport or server fault.
fn is_login_rejection(message: &str) -> bool {
    message == MSG_INVALID_SESSION
        || message == MSG_INVALID_PASSWORD
        || message == MSG_INCORRECT_LOGIN
}
