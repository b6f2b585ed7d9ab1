//! Backend abstraction
//!
//! Everything that can answer a submission window implements `LlmBackend`;
//! the service layer only ever sees this trait.

use async_trait::async_trait;
use thiserror::Error;

use crate::session::Message;

/// Chat completion failures, including a completion with no content at all
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("chat completion failed: {0}")]
    Completion(String),

    #[error("chat completion returned no content")]
    EmptyCompletion,
}

/// Language-understanding backend: one submission window in, one reply out
#[async_trait]
pub trait LlmBackend: Send + Sync {
    async fn complete(&self, messages: &[Message]) -> Result<String, BackendError>;
}
