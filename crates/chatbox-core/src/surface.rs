//! Render surface contract and the in-memory chat log

use std::sync::atomic::{AtomicU64, Ordering};

use crate::message::{Message, WELCOME_TEXT};

static NEXT_TOKEN: AtomicU64 = AtomicU64::new(1);

/// Identifies one loading placeholder. Unique for the life of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LoadingToken(u64);

impl LoadingToken {
    pub fn next() -> Self {
        LoadingToken(NEXT_TOKEN.fetch_add(1, Ordering::Relaxed))
    }
}

/// Append-only visual log the session writes into
pub trait RenderSurface {
    fn append_message(&mut self, message: &Message);
    fn append_loading(&mut self) -> LoadingToken;
    /// No-op if the placeholder is already gone
    fn remove_loading(&mut self, token: LoadingToken);
    /// Drop every node, including the default welcome notice
    fn clear(&mut self);
    /// Back to the welcome state: a single bot notice
    fn reset(&mut self, notice: &str);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    Message(Message),
    Loading(LoadingToken),
}

/// In-memory surface: the ordered nodes a front end draws
#[derive(Debug, Clone)]
pub struct ChatLog {
    entries: Vec<Entry>,
    // Set on every append, taken by the front end to scroll to the newest node
    scroll_pending: bool,
}

impl Default for ChatLog {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatLog {
    /// A fresh log showing the built-in welcome message
    pub fn new() -> Self {
        Self {
            entries: vec![Entry::Message(Message::bot(WELCOME_TEXT))],
            scroll_pending: true,
        }
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Displayed messages, skipping placeholders
    pub fn messages(&self) -> impl Iterator<Item = &Message> {
        self.entries.iter().filter_map(|entry| match entry {
            Entry::Message(message) => Some(message),
            Entry::Loading(_) => None,
        })
    }

    pub fn loading_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| matches!(entry, Entry::Loading(_)))
            .count()
    }

    /// Returns true once after each append
    pub fn take_scroll_request(&mut self) -> bool {
        std::mem::take(&mut self.scroll_pending)
    }
}

impl RenderSurface for ChatLog {
    fn append_message(&mut self, message: &Message) {
        self.entries.push(Entry::Message(message.clone()));
        self.scroll_pending = true;
    }

    fn append_loading(&mut self) -> LoadingToken {
        let token = LoadingToken::next();
        self.entries.push(Entry::Loading(token));
        self.scroll_pending = true;
        token
    }

    fn remove_loading(&mut self, token: LoadingToken) {
        self.entries.retain(|entry| *entry != Entry::Loading(token));
    }

    fn clear(&mut self) {
        self.entries.clear();
    }

    fn reset(&mut self, notice: &str) {
        self.entries = vec![Entry::Message(Message::bot(notice))];
        self.scroll_pending = true;
    }
}
