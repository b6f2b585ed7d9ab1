//! Atrium - session manager for an LLM-backed spatial command interpreter
//!
//! Module map:
//! - **config**: application configuration (TOML + environment variables)
//! - **error**: error taxonomy and its HTTP mapping
//! - **layout**: the opaque uploaded layout document
//! - **llm**: backend abstraction and implementations (Azure / OpenAI / Mock)
//! - **prompt**: system instruction template with the layout spliced in
//! - **server**: axum routes in front of the service
//! - **service**: the session orchestrator (ingest / query / reset)
//! - **session**: entries, the append-only log, windowing, the disk mirror

pub mod config;
pub mod error;
pub mod layout;
pub mod llm;
pub mod prompt;
pub mod server;
pub mod service;
pub mod session;

pub use error::{PersistenceError, ServiceError};
pub use service::{QueryRequest, SpatialService};
