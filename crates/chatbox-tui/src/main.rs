use std::sync::Arc;

use anyhow::Result;
use chatbox_core::{ChatLog, ChatSession, Config, HttpReplyClient, KeyValueStore, SqliteStore};
use tracing::{info, warn};

mod app;
mod handler;
mod logging;
mod tui;
mod ui;

use app::App;
use tui::{EventHandler, Tui};

#[tokio::main]
async fn main() -> Result<()> {
    let log_path = logging::init(&Config::data_dir()?)?;

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            warn!(error = %e, "could not read config, using defaults");
            Config::new()
        }
    };

    let store_path = config.resolve_store_path()?;
    let store: Box<dyn KeyValueStore> = Box::new(SqliteStore::open(&store_path)?);
    let endpoint = config.resolve_endpoint();
    info!(store = %store_path.display(), log = %log_path.display(), %endpoint, "starting chatbox");

    let mut session = ChatSession::new(store, ChatLog::new());
    session.initialize()?;

    let mut events = EventHandler::new();
    let service = Arc::new(HttpReplyClient::new(&endpoint));
    let endpoint = service.endpoint().to_string();
    let mut app = App::new(session, service, endpoint, events.sender());

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let result = run(&mut terminal, &mut app, &mut events).await;
    tui::restore()?;

    result
}

async fn run(terminal: &mut Tui, app: &mut App, events: &mut EventHandler) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        let Some(event) = events.next().await else {
            break;
        };
        handler::handle_event(app, event)?;
    }
    info!("exiting");
    Ok(())
}
