use std::fmt;

use crate::bot::format::FormatError;

/// Errors surfaced by the controller. Nothing is retried; callers decide.
#[derive(Debug)]
pub enum BotError {
    /// The Telegram API call failed (network or API error).
    Transport(String),
    /// A repository read or write failed.
    Database(rusqlite::Error),
    /// No catalog entry for the requested code.
    UnknownMessageCode(String),
    /// Positional arguments did not fit the template.
    Format(FormatError),
    /// A callback answer was requested while handling a plain message.
    NoCallbackQuery,
    /// The event carries no message to edit or delete.
    NoMessageId,
    /// Telegram only accepts inline keyboards on edited messages.
    NotInlineKeyboard,
    /// A message id outside Telegram's 32-bit range.
    InvalidMessageId(i64),
}

impl fmt::Display for BotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(msg) => write!(f, "telegram request failed: {}", msg),
            Self::Database(e) => write!(f, "database error: {}", e),
            Self::UnknownMessageCode(code) => write!(f, "unknown message code '{}'", code),
            Self::Format(e) => write!(f, "failed to format message: {}", e),
            Self::NoCallbackQuery => write!(f, "event is not a callback query"),
            Self::NoMessageId => write!(f, "event has no message id"),
            Self::NotInlineKeyboard => write!(f, "only inline keyboards can be attached to edits"),
            Self::InvalidMessageId(id) => write!(f, "message id {} is out of range", id),
        }
    }
}

impl std::error::Error for BotError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Database(e) => Some(e),
            Self::Format(e) => Some(e),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for BotError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Database(e)
    }
}

impl From<FormatError> for BotError {
    fn from(e: FormatError) -> Self {
        Self::Format(e)
    }
}
