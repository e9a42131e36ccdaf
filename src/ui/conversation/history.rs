//! Conversation history display component

use crate::events::{ConversationEntry, ConversationRole};
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

pub const EMPTY_PLACEHOLDER: &str = "Start a conversation with your AI assistant";
pub const THINKING_TEXT: &str = "Thinking...";

/// Read-only view of the transcript. Drawing depends only on the messages
/// and the pending flag; the thinking row is never part of the transcript.
pub struct ConversationHistory<'a> {
    messages: &'a [ConversationEntry],
    pending: bool,
}

impl<'a> ConversationHistory<'a> {
    pub fn new(messages: &'a [ConversationEntry], pending: bool) -> Self {
        Self { messages, pending }
    }

    /// All lines of the conversation, oldest first
    pub fn lines(&self, width: u16) -> Vec<Line<'static>> {
        let mut all_lines: Vec<Line> = Vec::new();
        for message in self.messages {
            all_lines.append(&mut render_message(message, width));
            // spacing between messages
            all_lines.push(Line::default());
        }

        if self.pending {
            all_lines.push(header_line(ConversationRole::Assistant, None));
            all_lines.push(Line::from(vec![
                Span::raw("  "),
                Span::styled(THINKING_TEXT, Style::default().fg(Color::DarkGray)),
            ]));
        }

        all_lines
    }
}

impl Widget for ConversationHistory<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(" Conversation ");

        let inner_area = block.inner(area);
        block.render(area, buf);

        if self.messages.is_empty() && !self.pending {
            if inner_area.height > 1 {
                let placeholder_area = Rect {
                    y: inner_area.y + 1,
                    height: 1,
                    ..inner_area
                };
                Paragraph::new(EMPTY_PLACEHOLDER)
                    .style(Style::default().fg(Color::Gray))
                    .alignment(Alignment::Center)
                    .render(placeholder_area, buf);
            }
            return;
        }

        let all_lines = self.lines(inner_area.width);

        // Stick to the bottom so the newest message is always visible
        let height = inner_area.height as usize;
        let start = all_lines.len().saturating_sub(height);
        for (i, line) in all_lines[start..].iter().enumerate() {
            buf.set_line(inner_area.x, inner_area.y + i as u16, line, inner_area.width);
        }
    }
}

fn header_line(role: ConversationRole, timestamp: Option<String>) -> Line<'static> {
    let mut spans = vec![Span::styled(
        role.display_name(),
        role_style(role).add_modifier(Modifier::BOLD),
    )];
    if let Some(timestamp) = timestamp {
        spans.push(Span::styled(
            format!(" {}", timestamp),
            Style::default().fg(Color::DarkGray),
        ));
    }
    Line::from(spans)
}

/// Render a single message into lines
fn render_message(message: &ConversationEntry, width: u16) -> Vec<Line<'static>> {
    let timestamp = message
        .timestamp()
        .with_timezone(&chrono::Local)
        .format("%H:%M:%S")
        .to_string();
    let mut lines = vec![header_line(message.role(), Some(timestamp))];

    for content_line in wrap_text(message.content(), width.saturating_sub(2) as usize) {
        lines.push(Line::from(vec![Span::raw("  "), Span::raw(content_line)]));
    }

    lines
}

fn role_style(role: ConversationRole) -> Style {
    match role {
        ConversationRole::User => Style::default().fg(Color::White),
        ConversationRole::Assistant => Style::default().fg(Color::Green),
    }
}

/// Wrap text to the given width, keeping the message's own line breaks,
/// leading indentation and runs of spaces. Words longer than the width are
/// split across lines.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return text.split('\n').map(str::to_string).collect();
    }

    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        wrap_paragraph(paragraph, width, &mut lines);
    }
    lines
}

fn wrap_paragraph(paragraph: &str, width: usize, lines: &mut Vec<String>) {
    let body = paragraph.trim_start();
    let indent = &paragraph[..paragraph.len() - body.len()];

    let mut current = indent.to_string();
    let mut current_len = indent.chars().count();
    let mut has_word = false;

    // splitting on single spaces keeps space runs as empty words
    for word in body.split(' ') {
        let word_len = word.chars().count();
        if has_word && current_len + 1 + word_len > width {
            lines.push(std::mem::take(&mut current));
            current_len = 0;
            has_word = false;
        }
        if word.is_empty() && current_len == 0 {
            continue;
        }
        if has_word {
            current.push(' ');
            current_len += 1;
        }

        let chars: Vec<char> = word.chars().collect();
        let mut rest = chars.as_slice();
        while current_len + rest.len() > width {
            let room = width.saturating_sub(current_len);
            current.extend(&rest[..room]);
            lines.push(std::mem::take(&mut current));
            current_len = 0;
            rest = &rest[room..];
        }
        current.extend(rest);
        current_len += rest.len();
        has_word = true;
    }

    lines.push(current);
}
