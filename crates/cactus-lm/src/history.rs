//! Conversation history tracking.
//!
//! The engine keeps an incremental context, so each completion should send
//! only the messages the engine has not seen. Callers, however, pass the
//! full conversation every time. [`ConversationHistoryManager`] bridges
//! the two by remembering what was committed and diffing against it.

use crate::Message;

/// Outcome of comparing the caller's conversation against tracked state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    /// Messages to hand to the engine.
    pub to_send: Vec<Message>,
    /// Tracked state no longer matches; the engine context must be rewound first.
    pub requires_reset: bool,
}

/// Tracks the messages the engine has already consumed.
#[derive(Debug, Default)]
pub struct ConversationHistoryManager {
    state: Vec<Message>,
    invalidated: bool,
}

impl ConversationHistoryManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compare `full` against the tracked state.
    ///
    /// When the tracked state is a prefix of `full`, only the remaining
    /// suffix is sent. Otherwise the whole list is sent after a reset.
    pub fn reconcile(&self, full: &[Message]) -> Reconciliation {
        if !self.invalidated && full.starts_with(&self.state) {
            return Reconciliation {
                to_send: full[self.state.len()..].to_vec(),
                requires_reset: false,
            };
        }
        Reconciliation {
            to_send: full.to_vec(),
            requires_reset: true,
        }
    }

    /// Record a completed exchange: the messages sent, then the engine's reply.
    pub fn commit(&mut self, sent: Vec<Message>, reply: Message) {
        self.state.extend(sent);
        self.state.push(reply);
    }

    pub fn reset(&mut self) {
        self.state.clear();
        self.invalidated = false;
    }

    /// Mark the tracked state as out of sync with the engine.
    ///
    /// The next [`reconcile`](Self::reconcile) requires a reset.
    pub fn invalidate(&mut self) {
        self.invalidated = true;
    }

    pub fn is_invalidated(&self) -> bool {
        self.invalidated
    }

    pub fn messages(&self) -> &[Message] {
        &self.state
    }

    pub fn len(&self) -> usize {
        self.state.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.is_empty()
    }
}
