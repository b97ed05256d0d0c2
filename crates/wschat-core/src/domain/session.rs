//! The local participant and validation of user-supplied input.
//!
//! Everything the user types (their own ID and name, a target ID, message
//! text) arrives as raw strings.  The functions here are the only place those
//! strings are checked; callers receive either a typed value or a
//! [`ValidationError`] describing what to fix.

use thiserror::Error;

/// Numeric user identifier assigned by the chat server.  Always positive.
pub type UserId = u64;

/// Bad or missing user input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("user ID is required")]
    MissingUserId,

    #[error("user ID must be a positive integer, got {0:?}")]
    InvalidUserId(String),

    #[error("username is required")]
    MissingUsername,

    #[error("message content is required")]
    EmptyContent,

    #[error("target user ID is required")]
    MissingTarget,

    #[error("target user ID must be a positive integer, got {0:?}")]
    InvalidTarget(String),
}

/// Identity of the local participant for the lifetime of one connection.
///
/// Immutable once created; the connection state machine discards it on
/// disconnect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    user_id: UserId,
    username: String,
}

impl Session {
    /// Builds a session from raw form input.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] if the user ID is missing or not a positive
    /// integer, or if the username is blank.
    pub fn from_input(user_id: &str, username: &str) -> Result<Self, ValidationError> {
        let user_id = parse_user_id(user_id)?;
        let username = validate_username(username)?;
        Ok(Self { user_id, username })
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn username(&self) -> &str {
        &self.username
    }
}

/// Parses the local user's ID.
///
/// # Errors
///
/// [`ValidationError::MissingUserId`] for blank input,
/// [`ValidationError::InvalidUserId`] for anything that is not a positive
/// integer.
pub fn parse_user_id(raw: &str) -> Result<UserId, ValidationError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ValidationError::MissingUserId);
    }
    parse_positive(raw).ok_or_else(|| ValidationError::InvalidUserId(raw.to_string()))
}

/// Parses the recipient ID of an outbound private message.
///
/// # Errors
///
/// [`ValidationError::MissingTarget`] for blank input,
/// [`ValidationError::InvalidTarget`] for anything that is not a positive
/// integer.
pub fn parse_target_user_id(raw: &str) -> Result<UserId, ValidationError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ValidationError::MissingTarget);
    }
    parse_positive(raw).ok_or_else(|| ValidationError::InvalidTarget(raw.to_string()))
}

/// Returns the trimmed username.
///
/// # Errors
///
/// [`ValidationError::MissingUsername`] if nothing but whitespace was given.
pub fn validate_username(raw: &str) -> Result<String, ValidationError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(ValidationError::MissingUsername);
    }
    Ok(name.to_string())
}

/// Returns the trimmed message content.
///
/// # Errors
///
/// [`ValidationError::EmptyContent`] if nothing but whitespace was given.
pub fn validate_content(raw: &str) -> Result<String, ValidationError> {
    let content = raw.trim();
    if content.is_empty() {
        return Err(ValidationError::EmptyContent);
    }
    Ok(content.to_string())
}

fn parse_positive(raw: &str) -> Option<UserId> {
    raw.parse::<UserId>().ok().filter(|id| *id > 0)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
