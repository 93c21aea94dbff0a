//! Persisted transcript under the `chatHistory` key
//!
//! The stored value is a JSON array of `{sender, text}` objects, in append
//! order. Writes replace the whole array.
//!
//! Persistence assumes a single writer: one `ChatSession` owns the store and
//! keeps an in-memory mirror of the history, so each append writes the mirror
//! back instead of re-reading the stored array. Two sessions sharing one store
//! would race and the later write would win.

use tracing::debug;

use crate::error::{ChatError, Result};
use crate::message::Message;
use crate::store::{KeyValueStore, HISTORY_KEY};

/// Read the stored history. Absent or empty values yield an empty transcript.
pub fn load(store: &dyn KeyValueStore) -> Result<Vec<Message>> {
    let Some(raw) = store.get(HISTORY_KEY)? else {
        return Ok(Vec::new());
    };

    if raw.trim().is_empty() || raw.trim() == "null" {
        return Ok(Vec::new());
    }

    let messages: Vec<Message> =
        serde_json::from_str(&raw).map_err(|e| ChatError::CorruptHistory(e.to_string()))?;
    debug!(count = messages.len(), "loaded chat history");
    Ok(messages)
}

/// Overwrite the stored history with `messages`
pub fn save(store: &mut dyn KeyValueStore, messages: &[Message]) -> Result<()> {
    let raw = serde_json::to_string(messages)
        .map_err(|e| ChatError::Storage(format!("failed to encode history: {}", e)))?;
    store.set(HISTORY_KEY, &raw)
}

/// Erase the stored history
pub fn clear(store: &mut dyn KeyValueStore) -> Result<()> {
    store.remove(HISTORY_KEY)
}
