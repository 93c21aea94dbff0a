//! Chat session controller
//!
//! Owns the transcript, the injected key-value store and the render surface.
//! A turn is split in two so the caller is never blocked on the network:
//! [`ChatSession::submit`] renders and persists the user message and shows a
//! loading placeholder, the caller dispatches the returned [`PendingReply`],
//! and [`ChatSession::complete`] settles it. Several turns may be in flight
//! at once; replies are appended in completion order.

use std::collections::HashSet;

use tracing::{debug, info, warn};

use crate::error::{ChatError, Result};
use crate::message::{Message, CLEARED_TEXT, CONNECTION_ERROR_TEXT};
use crate::reply::ReplyService;
use crate::store::{KeyValueStore, THEME_KEY};
use crate::surface::{LoadingToken, RenderSurface};
use crate::theme::Theme;
use crate::transcript;

/// A dispatched turn awaiting its reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingReply {
    pub token: LoadingToken,
    pub message: String,
}

pub struct ChatSession<S, R> {
    store: S,
    surface: R,
    transcript: Vec<Message>,
    pending: HashSet<LoadingToken>,
    theme: Theme,
}

impl<S: KeyValueStore, R: RenderSurface> ChatSession<S, R> {
    /// `surface` is expected to show its built-in welcome content.
    pub fn new(store: S, surface: R) -> Self {
        Self {
            store,
            surface,
            transcript: Vec::new(),
            pending: HashSet::new(),
            theme: Theme::default(),
        }
    }

    /// Load the theme and the stored history, repopulating the surface.
    ///
    /// Corrupt history is logged and treated as empty; the next append
    /// overwrites it.
    pub fn initialize(&mut self) -> Result<()> {
        self.theme = self
            .store
            .get(THEME_KEY)?
            .as_deref()
            .and_then(Theme::from_str)
            .unwrap_or_default();

        self.transcript = match transcript::load(&self.store) {
            Ok(messages) => messages,
            Err(ChatError::CorruptHistory(reason)) => {
                warn!(%reason, "ignoring corrupt chat history");
                Vec::new()
            }
            Err(e) => return Err(e),
        };

        if !self.transcript.is_empty() {
            self.surface.clear();
            for message in &self.transcript {
                self.surface.append_message(message);
            }
        }

        info!(
            messages = self.transcript.len(),
            theme = self.theme.as_str(),
            "chat session initialized"
        );
        Ok(())
    }

    /// Start a turn. Returns `None` when `raw_text` is blank.
    pub fn submit(&mut self, raw_text: &str) -> Result<Option<PendingReply>> {
        let text = raw_text.trim();
        if text.is_empty() {
            return Ok(None);
        }

        self.append(Message::user(text), true)?;

        let token = self.surface.append_loading();
        self.pending.insert(token);
        debug!(?token, "awaiting reply");

        Ok(Some(PendingReply {
            token,
            message: text.to_string(),
        }))
    }

    /// Settle a turn started by [`submit`](Self::submit).
    ///
    /// A successful reply is rendered and persisted verbatim. A failure
    /// renders the connection error notice, which is never persisted.
    pub fn complete(&mut self, token: LoadingToken, outcome: Result<String>) -> Result<()> {
        self.surface.remove_loading(token);
        self.pending.remove(&token);

        match outcome {
            Ok(reply) => self.append(Message::bot(reply), true),
            Err(e) => {
                warn!(error = %e, "reply service failed");
                self.append(Message::bot(CONNECTION_ERROR_TEXT), false)
            }
        }
    }

    /// Run a whole turn inline against `service`
    pub async fn send(&mut self, service: &dyn ReplyService, raw_text: &str) -> Result<()> {
        let Some(pending) = self.submit(raw_text)? else {
            return Ok(());
        };
        let outcome = service.reply(&pending.message).await;
        self.complete(pending.token, outcome)
    }

    /// Erase the stored history and reset the surface. The theme is kept.
    pub fn clear(&mut self) -> Result<()> {
        transcript::clear(&mut self.store)?;
        self.transcript.clear();
        self.pending.clear();
        self.surface.reset(CLEARED_TEXT);
        info!("chat history cleared");
        Ok(())
    }

    pub fn toggle_theme(&mut self) -> Result<Theme> {
        let theme = self.theme.toggled();
        self.store.set(THEME_KEY, theme.as_str())?;
        self.theme = theme;
        Ok(theme)
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    /// Persisted messages, in order
    pub fn transcript(&self) -> &[Message] {
        &self.transcript
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn surface(&self) -> &R {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut R {
        &mut self.surface
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    fn append(&mut self, message: Message, persist: bool) -> Result<()> {
        self.surface.append_message(&message);
        if persist {
            self.transcript.push(message);
            transcript::save(&mut self.store, &self.transcript)?;
        }
        Ok(())
    }
}
