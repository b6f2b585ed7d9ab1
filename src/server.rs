//! HTTP surface
//!
//! Four routes in front of the service: multipart layout upload, the runtime
//! query, history reset, and a liveness probe. CORS is wide open — the scene
//! client runs on another origin.

use std::sync::Arc;

use axum::extract::{Multipart, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::error::ServiceError;
use crate::service::{QueryRequest, SpatialService};

#[derive(Debug, Serialize)]
struct AckBody {
    message: &'static str,
}

#[derive(Debug, Serialize)]
struct ReplyBody {
    response: String,
}

#[derive(Debug, Serialize)]
struct StatusBody {
    status: &'static str,
}

pub fn router(service: Arc<SpatialService>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/upload_layout", post(upload_layout))
        .route("/runtime_query", post(runtime_query))
        .route("/reset_history", post(reset_history))
        .route("/ping", get(ping))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(service)
}

/// POST /upload_layout — multipart upload, field `file`, `.json` only
async fn upload_layout(
    State(service): State<Arc<SpatialService>>,
    mut multipart: Multipart,
) -> Result<Json<AckBody>, ServiceError> {
    let mut payload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServiceError::Validation(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        if !file_name.ends_with(".json") {
            return Err(ServiceError::Validation("Only JSON files allowed".to_string()));
        }
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ServiceError::Validation(e.to_string()))?;
        payload = Some(bytes);
        break;
    }

    let payload =
        payload.ok_or_else(|| ServiceError::Validation("No file uploaded".to_string()))?;
    service.ingest_layout(&payload).await?;
    Ok(Json(AckBody {
        message: "Layout uploaded and conversation initialized.",
    }))
}

/// POST /runtime_query — interprets one spatial command in session context
async fn runtime_query(
    State(service): State<Arc<SpatialService>>,
    Json(req): Json<QueryRequest>,
) -> Result<Json<ReplyBody>, ServiceError> {
    let reply = service.handle_query(req).await?;
    Ok(Json(ReplyBody { response: reply }))
}

/// POST /reset_history — clears the session, keeps the layout
async fn reset_history(State(service): State<Arc<SpatialService>>) -> Json<AckBody> {
    service.reset().await;
    Json(AckBody {
        message: "Conversation history reset.",
    })
}

/// GET /ping — liveness probe
async fn ping() -> Json<StatusBody> {
    Json(StatusBody { status: "ok" })
}
