//! UI-agnostic message types
//!
//! These are shared by every render surface and by the persisted history, so
//! they don't depend on any specific UI framework.

use serde::{Deserialize, Serialize};

/// Shown when the reply service can't be reached. Never persisted.
pub const CONNECTION_ERROR_TEXT: &str = "⚠️ Connection Error. Please try again.";

/// Bot notice shown by a fresh surface before any history exists.
pub const WELCOME_TEXT: &str = "Hello! I'm your assistant. How can I help you today?";

/// Bot notice shown after the history has been cleared.
pub const CLEARED_TEXT: &str = "Chat history cleared.";

/// A single chat message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub sender: Sender,
    pub text: String,
}

/// Who sent a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::User,
            text: text.into(),
        }
    }

    pub fn bot(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::Bot,
            text: text.into(),
        }
    }

    /// Display lines: every literal `\n` becomes a line break, nothing else
    /// is interpreted.
    pub fn display_lines(&self) -> impl Iterator<Item = &str> {
        self.text.split('\n')
    }
}

impl Sender {
    /// Avatar icon drawn next to the content block
    pub fn avatar(&self) -> &'static str {
        match self {
            Sender::User => "👤",
            Sender::Bot => "🤖",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_serializes_with_lowercase_sender() {
        let json = serde_json::to_string(&Message::user("Hello")).unwrap();
        assert_eq!(json, r#"{"sender":"user","text":"Hello"}"#);
    }

    #[test]
    fn test_message_parses_stored_bot_entry() {
        let msg: Message = serde_json::from_str(r#"{"sender":"bot","text":"Hi there"}"#).unwrap();
        assert_eq!(msg, Message::bot("Hi there"));
    }

    #[test]
    fn test_display_lines_splits_on_newline_only() {
        let msg = Message::bot("one\ntwo <b>three</b>\n\nfour");
        let lines: Vec<&str> = msg.display_lines().collect();
        assert_eq!(lines, vec!["one", "two <b>three</b>", "", "four"]);
    }
}
