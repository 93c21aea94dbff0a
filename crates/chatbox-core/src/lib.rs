pub mod config;
pub mod error;
pub mod message;
pub mod reply;
pub mod session;
pub mod store;
pub mod surface;
pub mod theme;
pub mod transcript;

// Re-export main types for convenience
pub use config::Config;
pub use error::ChatError;
pub use message::{Message, Sender};
pub use reply::{HttpReplyClient, ReplyService};
pub use session::{ChatSession, PendingReply};
pub use store::{KeyValueStore, MemoryStore, SqliteStore};
pub use surface::{ChatLog, Entry, LoadingToken, RenderSurface};
pub use theme::Theme;
