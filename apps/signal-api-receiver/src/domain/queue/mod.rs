//! Message Queue
//!
//! Unbounded FIFO buffer of accepted messages, shared between the single
//! receive loop (producer) and HTTP handlers (consumers).
//!
//! Every operation takes the same lock, so a `flush` always observes a
//! prefix of the arrival sequence and `pop` never skips or repeats an entry.

use std::collections::VecDeque;

use parking_lot::Mutex;

use super::message::Message;

/// Mutex-guarded FIFO of messages.
#[derive(Debug, Default)]
pub struct MessageQueue {
    messages: Mutex<VecDeque<Message>>,
}

impl MessageQueue {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message and return the new depth.
    pub fn push(&self, message: Message) -> usize {
        let mut messages = self.messages.lock();
        messages.push_back(message);
        messages.len()
    }

    /// Remove and return the oldest message.
    pub fn pop(&self) -> Option<Message> {
        self.messages.lock().pop_front()
    }

    /// Take every buffered message in arrival order, leaving the queue empty.
    pub fn flush(&self) -> Vec<Message> {
        let drained = std::mem::take(&mut *self.messages.lock());
        Vec::from(drained)
    }

    /// Number of buffered messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.lock().len()
    }

    /// Whether nothing is buffered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.lock().is_empty()
    }
}

impl FromIterator<Message> for MessageQueue {
    fn from_iter<I: IntoIterator<Item = Message>>(iter: I) -> Self {
        Self {
            messages: Mutex::new(iter.into_iter().collect()),
        }
    }
}
