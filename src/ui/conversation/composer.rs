use crate::ui::conversation::commands::{parse_slash_command, SlashCommand};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Widget},
};

/// Most input lines shown before the composer stops growing
const MAX_VISIBLE_LINES: u16 = 6;

/// Result returned when the user interacts with the conversation composer
#[derive(Debug, PartialEq)]
pub enum ComposerResult {
    Submitted(String),
    Command(SlashCommand),
    None,
}

/// Multi-line text input at the bottom of the conversation
#[derive(Debug, Clone)]
pub struct ConversationComposer {
    content: String,
    /// Cursor position in chars, not bytes
    cursor: usize,
    placeholder: String,
    enabled: bool,
}

impl ConversationComposer {
    pub fn new(placeholder: impl Into<String>) -> Self {
        Self {
            content: String::new(),
            cursor: 0,
            placeholder: placeholder.into(),
            enabled: true,
        }
    }

    /// Handle key input. Ignored entirely while the composer is disabled.
    pub fn handle_key(&mut self, key: KeyEvent) -> ComposerResult {
        if key.kind != KeyEventKind::Press || !self.enabled {
            return ComposerResult::None;
        }

        match key.code {
            KeyCode::Enter => {
                if key.modifiers.contains(KeyModifiers::SHIFT) {
                    self.insert_char('\n');
                } else if !self.content.trim().is_empty() {
                    if let Some(command) = parse_slash_command(&self.content) {
                        self.clear();
                        return ComposerResult::Command(command);
                    }
                    return ComposerResult::Submitted(self.content.clone());
                }
            }
            KeyCode::Char(c) => {
                if key.modifiers.contains(KeyModifiers::CONTROL) {
                    return ComposerResult::None;
                }
                self.insert_char(c);
            }
            KeyCode::Backspace => {
                if self.cursor > 0 {
                    self.cursor -= 1;
                    let at = self.byte_index(self.cursor);
                    self.content.remove(at);
                }
            }
            KeyCode::Delete => {
                if self.cursor < self.char_count() {
                    let at = self.byte_index(self.cursor);
                    self.content.remove(at);
                }
            }
            KeyCode::Left => {
                self.cursor = self.cursor.saturating_sub(1);
            }
            KeyCode::Right => {
                self.cursor = (self.cursor + 1).min(self.char_count());
            }
            KeyCode::Home => {
                self.cursor = 0;
            }
            KeyCode::End => {
                self.cursor = self.char_count();
            }
            _ => {}
        }

        ComposerResult::None
    }

    /// Insert pasted text at the cursor
    pub fn paste(&mut self, text: &str) {
        if !self.enabled {
            return;
        }
        for c in text.chars().filter(|c| *c != '\r') {
            self.insert_char(c);
        }
    }

    fn insert_char(&mut self, c: char) {
        let at = self.byte_index(self.cursor);
        self.content.insert(at, c);
        self.cursor += 1;
    }

    fn byte_index(&self, char_pos: usize) -> usize {
        self.content
            .char_indices()
            .nth(char_pos)
            .map(|(i, _)| i)
            .unwrap_or(self.content.len())
    }

    fn char_count(&self) -> usize {
        self.content.chars().count()
    }

    /// Enable or disable input (disabled while a reply is pending)
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Clear content
    pub fn clear(&mut self) {
        self.content.clear();
        self.cursor = 0;
    }

    /// Rows needed to draw the composer, borders included
    pub fn height(&self) -> u16 {
        let lines = self.content.split('\n').count() as u16;
        lines.clamp(1, MAX_VISIBLE_LINES) + 2
    }
}

impl Widget for &ConversationComposer {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let (title, border_style) = if self.enabled {
            (" Message ", Style::default().fg(Color::Green))
        } else {
            (" Waiting for reply ", Style::default().fg(Color::DarkGray))
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .title(title)
            .border_style(border_style);

        let inner_area = block.inner(area);
        block.render(area, buf);

        if self.content.is_empty() {
            let placeholder_line = Line::from(vec![Span::styled(
                self.placeholder.as_str(),
                Style::default().fg(Color::DarkGray),
            )]);
            buf.set_line(inner_area.x, inner_area.y, &placeholder_line, inner_area.width);
            return;
        }

        let mut content = self.content.clone();
        if self.enabled {
            content.insert(self.byte_index(self.cursor), '▌');
        }

        // keep the cursor's end of long input in view
        let lines: Vec<&str> = content.split('\n').collect();
        let height = inner_area.height as usize;
        let start = lines.len().saturating_sub(height);
        for (i, line_text) in lines[start..].iter().enumerate() {
            let line = Line::from(vec![Span::raw(*line_text)]);
            buf.set_line(inner_area.x, inner_area.y + i as u16, &line, inner_area.width);
        }
    }
}
