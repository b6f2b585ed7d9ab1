//! In-memory session log
//!
//! The ordered entry sequence for the single running session. Entries are only
//! appended or the whole sequence replaced; windowing happens at submission
//! time (see `window`), so nothing is pruned here.

use crate::session::Message;

/// Append-only conversation log; at most one system entry, always at index 0
#[derive(Clone, Debug, Default)]
pub struct ConversationLog {
    entries: Vec<Message>,
}

impl ConversationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: Message) {
        self.entries.push(entry);
    }

    /// Replaces the whole sequence with a single system entry, discarding any
    /// prior turns.
    pub fn reinitialize(&mut self, system_content: impl Into<String>) {
        self.entries.clear();
        self.entries.push(Message::system(system_content));
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn messages(&self) -> &[Message] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
