//! Scripted backend (for tests, no API needed)
//!
//! Queues canned outcomes and records every window it is handed, so tests can
//! assert exactly what would have been submitted. With an empty queue it
//! echoes the last user entry.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::llm::{BackendError, LlmBackend};
use crate::session::{Message, Role};

#[derive(Debug, Default)]
pub struct MockBackend {
    outcomes: Mutex<VecDeque<Result<String, BackendError>>>,
    calls: Mutex<Vec<Vec<Message>>>,
    delay: Mutex<Option<Duration>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues the reply for the next call.
    pub fn push_reply(&self, reply: impl Into<String>) {
        self.outcomes.lock().unwrap().push_back(Ok(reply.into()));
    }

    /// Queues a failure for the next call.
    pub fn push_failure(&self, message: impl Into<String>) {
        self.outcomes
            .lock()
            .unwrap()
            .push_back(Err(BackendError::Completion(message.into())));
    }

    /// Makes every call sleep before answering; pair with a paused tokio
    /// clock to exercise timeout paths.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    /// Windows handed to `complete`, in call order
    pub fn calls(&self) -> Vec<Vec<Message>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmBackend for MockBackend {
    async fn complete(&self, messages: &[Message]) -> Result<String, BackendError> {
        self.calls.lock().unwrap().push(messages.to_vec());

        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(outcome) = self.outcomes.lock().unwrap().pop_front() {
            return outcome;
        }

        let last_user = messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
            .unwrap_or("(no input)");
        Ok(format!(r#"{{"action": "none", "echo": "{}"}}"#, last_user))
    }
}
