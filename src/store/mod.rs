//! Append-only message log with a bounded context window.

use crate::types::{Message, MessageId, Role};

/// Default number of trailing messages sent to the backend with each request.
pub const DEFAULT_CONTEXT_WINDOW: usize = 10;

/// Ordered log of conversation turns, oldest first.
///
/// There is no way to mutate or remove an entry once appended; the only
/// writers are [`MessageStore::append`] and [`MessageStore::restore`].
#[derive(Debug, Clone)]
pub struct MessageStore {
    messages: Vec<Message>,
    next_id: u64,
    context_window: usize,
}

impl Default for MessageStore {
    fn default() -> Self {
        Self::new(DEFAULT_CONTEXT_WINDOW)
    }
}

impl MessageStore {
    pub fn new(context_window: usize) -> Self {
        Self {
            messages: Vec::new(),
            next_id: 1,
            context_window: context_window.max(1),
        }
    }

    /// Append a new turn and return it.
    pub fn append(&mut self, role: Role, text: impl Into<String>) -> &Message {
        let id = MessageId(self.next_id);
        self.next_id += 1;
        self.messages.push(Message::new(id, role, text));
        &self.messages[self.messages.len() - 1]
    }

    /// Replay recovered messages into an empty store.
    ///
    /// Returns the number of messages restored. A non-empty store is left
    /// untouched so recovery can never duplicate turns. Ids that are not
    /// strictly increasing, or that leave no room for the next append, are
    /// reassigned `1..=n` in stored order.
    pub fn restore(&mut self, mut messages: Vec<Message>) -> usize {
        if !self.messages.is_empty() {
            return 0;
        }
        if !ids_strictly_increasing(&messages) {
            for (n, message) in (1u64..).zip(messages.iter_mut()) {
                message.id = MessageId(n);
            }
        }
        let next = messages
            .last()
            .and_then(|m| m.id.0.checked_add(1))
            .unwrap_or(1);
        self.next_id = self.next_id.max(next);
        let count = messages.len();
        self.messages = messages;
        count
    }

    /// The trailing context window, oldest first.
    pub fn context_window(&self) -> &[Message] {
        let start = self.messages.len().saturating_sub(self.context_window);
        &self.messages[start..]
    }

    /// Point-in-time copy of the whole log.
    pub fn snapshot(&self) -> Vec<Message> {
        self.messages.clone()
    }

    pub fn as_slice(&self) -> &[Message] {
        &self.messages
    }

    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// `true` when ids rise strictly and the last one is below `u64::MAX`.
pub(crate) fn ids_strictly_increasing(messages: &[Message]) -> bool {
    messages.windows(2).all(|pair| pair[0].id < pair[1].id)
        && !messages.last().is_some_and(|m| m.id.0 == u64::MAX)
}
