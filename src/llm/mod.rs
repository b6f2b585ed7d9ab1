//! Backend layer: completion abstraction and its implementations (Azure /
//! OpenAI-compatible / Mock)

pub mod mock;
pub mod openai;
pub mod traits;

pub use mock::MockBackend;
pub use openai::ChatCompletionBackend;
pub use traits::{BackendError, LlmBackend};

use std::sync::Arc;

use crate::config::LlmSection;

/// Builds the backend selected by `[llm] provider`; anything unrecognized
/// falls back to the Azure deployment path.
pub fn backend_from_config(llm: &LlmSection) -> Arc<dyn LlmBackend> {
    match llm.provider.as_str() {
        "openai" => {
            tracing::info!("LLM backend: openai-compatible, model {}", llm.model);
            Arc::new(ChatCompletionBackend::openai(llm))
        }
        "mock" => {
            tracing::info!("LLM backend: mock");
            Arc::new(MockBackend::new())
        }
        _ => {
            let deployment = llm.azure.deployment.as_deref().unwrap_or(&llm.model);
            tracing::info!("LLM backend: azure, deployment {}", deployment);
            Arc::new(ChatCompletionBackend::azure(llm))
        }
    }
}
