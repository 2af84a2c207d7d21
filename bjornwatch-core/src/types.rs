//! Core domain types for bjornwatch
//!
//! These types model the parent-facing view of one toy session: the wire
//! shape served by the session endpoint, the credential record kept for
//! "remember me", and the normalization rules for login input.
//!
//! ## Terminology
//!
//! | Term | Definition |
//! |------|------------|
//! | **Session** | One child/toy conversation, named by a short session code |
//! | **Session code** | 6-character identifier (A-Z, 0-9) spoken by the toy |
//! | **PIN** | 4-digit parent password gating transcript access |
//! | **Transcript** | Ordered sequence of [`LogItem`] for a session |
//! | **Watch** | One epoch-tagged polling run for a single session |

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================
// Transcript Entries
// ============================================

/// Who authored a transcript entry.
///
/// The wire protocol only distinguishes the child ("user") from the
/// toy ("assistant").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// The child talking to the toy
    User,
    /// The toy's reply
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            _ => Err(format!("unknown role: {}", s)),
        }
    }
}

/// One transcript entry, immutable once received.
///
/// Wire shape:
/// `{"role": "user", "content": "...", "ts": 1700000000, "lang": "sv"}`
/// with `lang` optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogItem {
    /// Who said it
    pub role: Role,
    /// Message text
    pub content: String,
    /// Seconds since the Unix epoch; non-decreasing within a session in
    /// the common case, but the backend does not guarantee it
    pub ts: i64,
    /// Optional language tag (e.g. "sv", "en")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
}

impl LogItem {
    /// The entry's timestamp as UTC, or `None` when `ts` is out of the
    /// representable range.
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.ts, 0)
    }
}

// ============================================
// Fetch Results
// ============================================

/// Result of one authenticated session lookup.
///
/// The fetcher never returns `Err`: every network, decoding, and
/// HTTP-status failure collapses into [`SessionResponse::Failure`], so
/// call sites handle exactly two cases.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionResponse {
    /// The backend returned the transcript
    Success {
        /// Child display name, `"(unknown)"` when the backend omits it
        child_name: String,
        /// Full ordered transcript; replaces any previous list wholesale
        messages: Vec<LogItem>,
    },
    /// Anything else, normalized to a user-facing message
    Failure {
        /// Human-readable description, already mapped to user copy
        message: String,
    },
}

impl SessionResponse {
    /// Shorthand for building a failure
    pub fn failure(message: impl Into<String>) -> Self {
        SessionResponse::Failure {
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, SessionResponse::Success { .. })
    }
}

// ============================================
// Stored Credentials
// ============================================

/// Persisted "remember me" record.
///
/// The on-disk `login.json` uses camelCase keys (`sessionCode`,
/// `parentPassword`, `childName`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredLogin {
    /// Session code the credentials belong to
    pub session_code: String,
    /// 4-digit parent PIN
    pub parent_password: String,
    /// Child display name reported by the backend at login
    pub child_name: String,
}

impl StoredLogin {
    /// Whether this record belongs to `code`, compared case-insensitively.
    ///
    /// Callers must check this before reusing the stored PIN for a fetch,
    /// so cached credentials are never applied to a different session.
    pub fn matches_code(&self, code: &str) -> bool {
        self.session_code.eq_ignore_ascii_case(code)
    }
}

// ============================================
// Login Input Normalization
// ============================================

/// Required session code length
pub const SESSION_CODE_LEN: usize = 6;

/// Required PIN length
pub const PIN_LEN: usize = 4;

/// Normalize free-form session code input: uppercase, keep only `A-Z`
/// and `0-9`, truncate to [`SESSION_CODE_LEN`].
pub fn normalize_session_code(input: &str) -> String {
    input
        .chars()
        .map(|c| c.to_ascii_uppercase())
        .filter(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
        .take(SESSION_CODE_LEN)
        .collect()
}

/// Normalize PIN input: keep only ASCII digits, truncate to [`PIN_LEN`].
pub fn normalize_pin(input: &str) -> String {
    input
        .chars()
        .filter(|c| c.is_ascii_digit())
        .take(PIN_LEN)
        .collect()
}

/// Whether `code` is a fully-entered session code.
pub fn session_code_is_valid(code: &str) -> bool {
    code.len() == SESSION_CODE_LEN
        && code
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
}

/// Whether `pin` is a fully-entered PIN.
pub fn pin_is_valid(pin: &str) -> bool {
    pin.len() == PIN_LEN && pin.chars().all(|c| c.is_ascii_digit())
}
