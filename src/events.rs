use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::client::ClientError;
use crate::transcript::PendingTurn;

/// Internal application events for coordinating between components
#[derive(Debug)]
pub enum AppEvent {
    /// Terminal input or redraw request
    Tui(TuiEvent),

    /// The gateway call for a pending turn finished
    ReplyReceived {
        turn: PendingTurn,
        outcome: Result<String, ClientError>,
    },

    /// Periodic tick used to animate the thinking row
    Tick,
}

/// TUI-specific events (keyboard, mouse, etc.)
#[derive(Debug, Clone)]
pub enum TuiEvent {
    /// Key press event
    Key(crossterm::event::KeyEvent),

    /// Paste event
    Paste(String),

    /// Terminal resize
    Resize,
}

/// Role in conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversationRole {
    User,
    Assistant,
}

impl ConversationRole {
    pub fn display_name(&self) -> &'static str {
        match self {
            ConversationRole::User => "You",
            ConversationRole::Assistant => "Assistant",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConversationRole::User => "user",
            ConversationRole::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for ConversationRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single transcript entry. Fields are private so an entry cannot be
/// edited once it is in the transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationEntry {
    role: ConversationRole,
    content: String,
    #[serde(skip, default = "Utc::now")]
    timestamp: DateTime<Utc>,
}

impl ConversationEntry {
    pub fn new(role: ConversationRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(ConversationRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(ConversationRole::Assistant, content)
    }

    pub fn role(&self) -> ConversationRole {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

// The display timestamp is local-only and not part of an entry's identity.
impl PartialEq for ConversationEntry {
    fn eq(&self, other: &Self) -> bool {
        self.role == other.role && self.content == other.content
    }
}

/// Body posted to `/api/chat` at every hop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<ConversationEntry>,
}

/// Successful `/api/chat` response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatReply {
    pub reply: String,
}

/// Error body returned by the gateway and the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
