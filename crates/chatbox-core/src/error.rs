//! Error types for chatbox-core

use thiserror::Error;

/// Errors that can occur while running a chat session
#[derive(Debug, Error)]
pub enum ChatError {
    /// The key-value store could not be read or written
    #[error("Storage error: {0}")]
    Storage(String),

    /// The persisted history is not a JSON array of messages
    #[error("Corrupt chat history: {0}")]
    CorruptHistory(String),

    /// The reply service could not be reached
    #[error("Transport error: {0}")]
    Transport(String),

    /// The reply service body was not `{"reply": string}`
    #[error("Could not decode reply: {0}")]
    Decode(String),
}

impl From<rusqlite::Error> for ChatError {
    fn from(err: rusqlite::Error) -> Self {
        ChatError::Storage(err.to_string())
    }
}

impl From<reqwest::Error> for ChatError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ChatError::Decode(err.to_string())
        } else {
            ChatError::Transport(err.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, ChatError>;
