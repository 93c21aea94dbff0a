use std::sync::Arc;

use anyhow::Result;
use chatbox_core::{ChatError, ChatLog, ChatSession, KeyValueStore, LoadingToken, ReplyService};
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

use crate::tui::AppEvent;

/// Rows the input box may grow to before it scrolls
pub const MAX_INPUT_ROWS: u16 = 6;

pub type Session = ChatSession<Box<dyn KeyValueStore>, ChatLog>;

pub struct App {
    // Core state
    pub should_quit: bool,
    pub session: Session,
    pub service: Arc<dyn ReplyService>,
    pub endpoint: String,
    events: UnboundedSender<AppEvent>,

    // Input state
    pub input: String,
    pub cursor: usize, // cursor position in input, in chars

    // Chat log scroll state
    pub scroll: u16,
    pub follow: bool, // stick to the newest message
    pub chat_height: u16, // Height of chat area for scroll calculations

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation
}

impl App {
    pub fn new(
        session: Session,
        service: Arc<dyn ReplyService>,
        endpoint: String,
        events: UnboundedSender<AppEvent>,
    ) -> Self {
        Self {
            should_quit: false,
            session,
            service,
            endpoint,
            events,
            input: String::new(),
            cursor: 0,
            scroll: 0,
            follow: true,
            chat_height: 0,
            animation_frame: 0,
        }
    }

    /// Send the input box contents and dispatch the reply request in the background
    pub fn submit_input(&mut self) -> Result<()> {
        let text = std::mem::take(&mut self.input);
        self.cursor = 0;

        let Some(pending) = self.session.submit(&text)? else {
            return Ok(());
        };
        self.follow = true;

        let service = Arc::clone(&self.service);
        let events = self.events.clone();
        tokio::spawn(async move {
            let outcome = service.reply(&pending.message).await;
            // Receiver is gone only when the app is shutting down
            let _ = events.send(AppEvent::Reply(pending.token, outcome));
        });

        Ok(())
    }

    pub fn finish_reply(&mut self, token: LoadingToken, outcome: Result<String, ChatError>) -> Result<()> {
        debug!(?token, ok = outcome.is_ok(), "reply settled");
        self.session.complete(token, outcome)?;
        if self.session.pending_count() == 0 {
            self.animation_frame = 0;
        }
        Ok(())
    }

    pub fn clear_chat(&mut self) -> Result<()> {
        self.session.clear()?;
        self.scroll = 0;
        self.follow = true;
        Ok(())
    }

    pub fn toggle_theme(&mut self) -> Result<()> {
        self.session.toggle_theme()?;
        Ok(())
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.session.pending_count() > 0 {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    pub fn scroll_up(&mut self, rows: u16) {
        self.follow = false;
        self.scroll = self.scroll.saturating_sub(rows);
    }

    /// Scrolling past the end is clamped at render time, which re-enables follow
    pub fn scroll_down(&mut self, rows: u16) {
        self.scroll = self.scroll.saturating_add(rows);
    }

    pub fn scroll_to_bottom(&mut self) {
        self.follow = true;
    }

    /// Clamp the scroll offset for a log of `total_lines` rows
    pub fn fit_scroll(&mut self, total_lines: u16) {
        if self.session.surface_mut().take_scroll_request() {
            self.follow = true;
        }

        let max_scroll = total_lines.saturating_sub(self.chat_height);
        if self.follow || self.scroll >= max_scroll {
            self.scroll = max_scroll;
            self.follow = true;
        }
    }

    /// Visible rows of the input box, growing with its content
    pub fn input_rows(&self) -> u16 {
        let lines = self.input.split('\n').count() as u16;
        lines.clamp(1, MAX_INPUT_ROWS)
    }

    /// Cursor as (row, column) within the input text
    pub fn input_cursor_position(&self) -> (usize, usize) {
        let before: String = self.input.chars().take(self.cursor).collect();
        let row = before.matches('\n').count();
        let col = before
            .rsplit('\n')
            .next()
            .map(|line| line.chars().count())
            .unwrap_or(0);
        (row, col)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chatbox_core::MemoryStore;
    use tokio::sync::mpsc;

    struct Echo;

    #[async_trait]
    impl ReplyService for Echo {
        async fn reply(&self, message: &str) -> Result<String, ChatError> {
            Ok(format!("echo: {}", message))
        }
    }

    fn new_app() -> (App, mpsc::UnboundedReceiver<AppEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut session = ChatSession::new(
            Box::new(MemoryStore::new()) as Box<dyn KeyValueStore>,
            ChatLog::new(),
        );
        session.initialize().unwrap();
        let app = App::new(session, Arc::new(Echo), "http://test/chat".to_string(), tx);
        (app, rx)
    }

    #[tokio::test]
    async fn test_submit_dispatches_reply_event() {
        let (mut app, mut rx) = new_app();
        app.input = "Hello".to_string();
        app.cursor = 5;

        app.submit_input().unwrap();
        assert!(app.input.is_empty());
        assert_eq!(app.cursor, 0);
        assert_eq!(app.session.pending_count(), 1);

        let Some(AppEvent::Reply(token, outcome)) = rx.recv().await else {
            panic!("expected a reply event");
        };
        app.finish_reply(token, outcome).unwrap();

        let texts: Vec<&str> = app
            .session
            .transcript()
            .iter()
            .map(|m| m.text.as_str())
            .collect();
        assert_eq!(texts, vec!["Hello", "echo: Hello"]);
        assert_eq!(app.session.surface().loading_count(), 0);
    }

    #[tokio::test]
    async fn test_blank_submit_sends_nothing() {
        let (mut app, mut rx) = new_app();
        app.input = "   ".to_string();

        app.submit_input().unwrap();

        assert!(app.session.transcript().is_empty());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_input_rows_grow_and_cap() {
        let (mut app, _rx) = new_app();
        assert_eq!(app.input_rows(), 1);

        app.input = "a\nb\nc".to_string();
        assert_eq!(app.input_rows(), 3);

        app.input = "\n".repeat(20);
        assert_eq!(app.input_rows(), MAX_INPUT_ROWS);
    }

    #[test]
    fn test_cursor_position_tracks_lines() {
        let (mut app, _rx) = new_app();
        app.input = "ab\ncdé".to_string();

        app.cursor = 2;
        assert_eq!(app.input_cursor_position(), (0, 2));

        app.cursor = 6;
        assert_eq!(app.input_cursor_position(), (1, 3));
    }

    #[test]
    fn test_scroll_follows_until_user_scrolls_up() {
        let (mut app, _rx) = new_app();
        app.chat_height = 10;

        app.fit_scroll(30);
        assert_eq!(app.scroll, 20);

        app.scroll_up(5);
        app.fit_scroll(30);
        assert_eq!(app.scroll, 15);
        assert!(!app.follow);

        app.scroll_down(100);
        app.fit_scroll(30);
        assert_eq!(app.scroll, 20);
        assert!(app.follow);
    }
}
