use anyhow::Result;

use crate::client::GatewayClient;
use crate::config::ClientConfig;
use crate::events::{AppEvent, TuiEvent};
use crate::ui::conversation::{ConversationAction, ConversationManager};
use crate::ui::tui::{self, EventHandler, Tui};

/// Run the terminal chat client until the user quits
pub async fn run(config: ClientConfig) -> Result<()> {
    let client = GatewayClient::new(&config)?;
    log::info!("chat client using gateway {}", client.endpoint());

    tui::install_panic_hook();
    let mut terminal = tui::init()?;

    let result = event_loop(&mut terminal, client).await;

    tui::restore()?;
    result
}

async fn event_loop(terminal: &mut Tui, client: GatewayClient) -> Result<()> {
    let mut events = EventHandler::new();
    let mut manager = ConversationManager::new(client, events.sender());

    loop {
        terminal.draw(|frame| frame.render_widget(&manager, frame.size()))?;

        let Some(event) = events.next().await else {
            break;
        };

        match event {
            AppEvent::Tui(TuiEvent::Key(key)) => {
                if manager.handle_key(key) == ConversationAction::Exit {
                    break;
                }
            }
            AppEvent::Tui(TuiEvent::Paste(text)) => manager.handle_paste(&text),
            AppEvent::Tui(TuiEvent::Resize) | AppEvent::Tick => {}
            AppEvent::ReplyReceived { turn, outcome } => manager.handle_reply(turn, outcome),
        }
    }

    Ok(())
}
