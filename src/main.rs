//! Atrium - session manager for an LLM-backed spatial command interpreter
//!
//! Entry point: initialize logging, load configuration, build the service and
//! serve the HTTP routes.

use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use atrium::config::load_config;
use atrium::llm::backend_from_config;
use atrium::prompt::SystemPromptTemplate;
use atrium::server::router;
use atrium::service::SpatialService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logging: info by default, RUST_LOG overrides
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .with(fmt::layer())
        .init();

    let config = load_config(None)?;
    let backend = backend_from_config(&config.llm);
    let template = SystemPromptTemplate::load();
    let service = Arc::new(SpatialService::new(&config, backend, template));

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    tracing::info!("Spatial session service listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router(service)).await?;

    Ok(())
}
