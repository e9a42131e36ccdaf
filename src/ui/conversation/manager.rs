use crate::client::{ClientError, GatewayClient};
use crate::events::AppEvent;
use crate::transcript::{ConversationStore, PendingTurn};
use crate::ui::conversation::{
    get_help_text, ComposerResult, ConversationComposer, ConversationHistory, SlashCommand,
};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    widgets::{Paragraph, Widget, Wrap},
};
use tokio::sync::mpsc;

const COMPOSER_PLACEHOLDER: &str =
    "Type your message... (Press Enter to send, Shift+Enter for new line)";

/// Actions that can be requested by the conversation manager
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversationAction {
    None,
    Exit,
}

/// Ties the transcript, the composer and the gateway client together
pub struct ConversationManager {
    store: ConversationStore,
    composer: ConversationComposer,
    client: GatewayClient,
    events: mpsc::UnboundedSender<AppEvent>,
    /// Transient notice (help text), cleared by the next key press
    notice: Option<String>,
}

impl ConversationManager {
    pub fn new(client: GatewayClient, events: mpsc::UnboundedSender<AppEvent>) -> Self {
        Self {
            store: ConversationStore::new(),
            composer: ConversationComposer::new(COMPOSER_PLACEHOLDER),
            client,
            events,
            notice: None,
        }
    }

    /// Handle key input
    pub fn handle_key(&mut self, key: KeyEvent) -> ConversationAction {
        if key.kind != KeyEventKind::Press {
            return ConversationAction::None;
        }

        let is_ctrl_c =
            key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c');
        if is_ctrl_c || key.code == KeyCode::Esc {
            return ConversationAction::Exit;
        }

        self.notice = None;

        match self.composer.handle_key(key) {
            ComposerResult::Submitted(input) => {
                self.submit(&input);
                ConversationAction::None
            }
            ComposerResult::Command(command) => self.handle_slash_command(command),
            ComposerResult::None => ConversationAction::None,
        }
    }

    pub fn handle_paste(&mut self, text: &str) {
        self.composer.paste(text);
    }

    /// Submit user input and start the gateway call in the background.
    /// Returns false when the store rejected the input.
    pub fn submit(&mut self, input: &str) -> bool {
        let Some(turn) = self.store.submit(input) else {
            return false;
        };

        self.composer.clear();
        self.composer.set_enabled(false);

        let client = self.client.clone();
        let events = self.events.clone();
        tokio::spawn(async move {
            let outcome = client.send(turn.payload()).await;
            // Receiver gone means the loop has exited; the turn is dropped
            // unresolved, which only happens at shutdown.
            let _ = events.send(AppEvent::ReplyReceived { turn, outcome });
        });

        true
    }

    /// Apply a finished gateway call (called from main loop)
    pub fn handle_reply(&mut self, turn: PendingTurn, outcome: Result<String, ClientError>) {
        self.store.resolve(turn, outcome);
        self.composer.set_enabled(!self.store.is_pending());
    }

    pub fn store(&self) -> &ConversationStore {
        &self.store
    }

    pub fn composer(&self) -> &ConversationComposer {
        &self.composer
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    /// Handle slash commands
    fn handle_slash_command(&mut self, command: SlashCommand) -> ConversationAction {
        match command {
            SlashCommand::Help => {
                self.notice = Some(get_help_text());
                ConversationAction::None
            }
            SlashCommand::Bye => ConversationAction::Exit,
        }
    }
}

impl Widget for &ConversationManager {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let notice_height = self
            .notice
            .as_ref()
            .map(|notice| notice.lines().count() as u16)
            .unwrap_or(0);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(3),                        // History
                Constraint::Length(notice_height),         // Notice
                Constraint::Length(self.composer.height()), // Composer
            ])
            .split(area);

        ConversationHistory::new(self.store.messages(), self.store.is_pending())
            .render(chunks[0], buf);

        if let Some(notice) = &self.notice {
            Paragraph::new(notice.as_str())
                .style(Style::default().fg(Color::Yellow))
                .wrap(Wrap { trim: false })
                .render(chunks[1], buf);
        }

        self.composer.render(chunks[2], buf);
    }
}
