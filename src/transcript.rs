//! Conversation transcript and the single-slot request gate

use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::client::ClientError;
use crate::events::{ChatRequest, ConversationEntry};

/// Assistant text appended when a request fails for any reason
pub const FALLBACK_REPLY: &str = "Sorry, I encountered an error. Please try again.";

/// A submitted turn waiting for its reply. Holds the only request permit
/// until it is handed back to [`ConversationStore::resolve`].
/// Dropping it unresolved frees the permit and appends nothing.
#[derive(Debug)]
pub struct PendingTurn {
    payload: ChatRequest,
    _permit: OwnedSemaphorePermit,
}

impl PendingTurn {
    /// Full transcript to send, ending with the message just submitted
    pub fn payload(&self) -> &ChatRequest {
        &self.payload
    }
}

/// Owns the append-only transcript and the pending gate
#[derive(Debug)]
pub struct ConversationStore {
    messages: Vec<ConversationEntry>,
    gate: Arc<Semaphore>,
}

impl Default for ConversationStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversationStore {
    pub fn new() -> Self {
        Self {
            messages: Vec::new(),
            gate: Arc::new(Semaphore::new(1)),
        }
    }

    /// Accept user input. Returns `None` without touching any state when the
    /// trimmed text is empty or a request is already outstanding.
    pub fn submit(&mut self, text: &str) -> Option<PendingTurn> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        let permit = Arc::clone(&self.gate).try_acquire_owned().ok()?;

        self.messages.push(ConversationEntry::user(text));

        Some(PendingTurn {
            payload: ChatRequest {
                messages: self.messages.clone(),
            },
            _permit: permit,
        })
    }

    /// Apply the outcome of a pending turn and release the gate
    pub fn resolve(&mut self, turn: PendingTurn, outcome: Result<String, ClientError>) {
        let entry = match outcome {
            Ok(reply) => ConversationEntry::assistant(reply),
            Err(e) => {
                log::warn!("chat request failed: {}", e);
                ConversationEntry::assistant(FALLBACK_REPLY)
            }
        };
        self.messages.push(entry);

        // permit released here, after the transcript is updated
        drop(turn);
    }

    /// True exactly while a submitted turn has not been resolved
    pub fn is_pending(&self) -> bool {
        self.gate.available_permits() == 0
    }

    pub fn messages(&self) -> &[ConversationEntry] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::ConversationRole;

    #[test]
    fn submit_appends_trimmed_user_message_and_sets_pending() {
        let mut store = ConversationStore::new();
        let turn = store.submit("  Hello \n").expect("turn");

        assert!(store.is_pending());
        assert_eq!(store.messages(), &[ConversationEntry::user("Hello")]);
        assert_eq!(turn.payload().messages, vec![ConversationEntry::user("Hello")]);
    }

    #[test]
    fn blank_input_is_a_no_op() {
        let mut store = ConversationStore::new();
        for input in ["", "   ", "\n\t "] {
            assert!(store.submit(input).is_none());
        }
        assert!(store.is_empty());
        assert!(!store.is_pending());
    }

    #[test]
    fn submit_while_pending_is_a_no_op() {
        let mut store = ConversationStore::new();
        let _turn = store.submit("first").unwrap();

        assert!(store.submit("second").is_none());
        assert!(store.submit("third").is_none());
        assert_eq!(store.len(), 1);
        assert!(store.is_pending());
    }

    #[test]
    fn successful_reply_appends_assistant_and_clears_pending() {
        let mut store = ConversationStore::new();
        let turn = store.submit("Hello").unwrap();
        store.resolve(turn, Ok("Hi there".to_string()));

        assert!(!store.is_pending());
        assert_eq!(
            store.messages(),
            &[
                ConversationEntry::user("Hello"),
                ConversationEntry::assistant("Hi there"),
            ]
        );
    }

    #[test]
    fn failed_reply_appends_fallback_text() {
        let mut store = ConversationStore::new();
        let turn = store.submit("Hi").unwrap();
        store.resolve(turn, Err(ClientError::Status(500)));

        assert!(!store.is_pending());
        let last = store.messages().last().unwrap();
        assert_eq!(last.role(), ConversationRole::Assistant);
        assert_eq!(last.content(), FALLBACK_REPLY);
    }

    #[test]
    fn payload_carries_prior_history() {
        let mut store = ConversationStore::new();
        let turn = store.submit("one").unwrap();
        store.resolve(turn, Ok("two".to_string()));

        let turn = store.submit("three").unwrap();
        let roles: Vec<_> = turn.payload().messages.iter().map(|m| m.role()).collect();
        assert_eq!(
            roles,
            vec![
                ConversationRole::User,
                ConversationRole::Assistant,
                ConversationRole::User,
            ]
        );
        assert_eq!(turn.payload().messages.last().unwrap().content(), "three");
    }

    #[test]
    fn gate_reopens_after_failure() {
        let mut store = ConversationStore::new();
        let turn = store.submit("a").unwrap();
        store.resolve(turn, Err(ClientError::Malformed("no reply".into())));

        assert!(store.submit("b").is_some());
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn dropped_turn_releases_gate_without_reply() {
        let mut store = ConversationStore::new();
        let turn = store.submit("bye").unwrap();
        drop(turn);

        assert!(!store.is_pending());
        assert_eq!(store.messages(), &[ConversationEntry::user("bye")]);
    }
}
