//! Session service: layout ingest, runtime queries, reset
//!
//! Owns the one running session (layout + conversation log) behind a single
//! lock. Every operation holds the lock end to end, so ingest / query / reset
//! are mutually exclusive and no concurrent request can interleave its user
//! entry between another turn's user/assistant pair.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::config::AppConfig;
use crate::error::ServiceError;
use crate::layout::{LayoutDocument, LATEST_LAYOUT_FILE};
use crate::llm::LlmBackend;
use crate::prompt::SystemPromptTemplate;
use crate::session::{submission_window, ConversationLog, HistoryMirror, Message};

/// Runtime query payload (wire shape of POST /runtime_query)
#[derive(Debug, Clone, Deserialize)]
pub struct QueryRequest {
    #[serde(default)]
    pub query: String,
    pub user_position: Option<Value>,
    pub user_forward: Option<Value>,
    pub user_right: Option<Value>,
    pub target_object: Option<String>,
    pub target_position: Option<Value>,
    pub reference_object: Option<String>,
    pub prev_target_object: Option<String>,
    #[serde(default)]
    pub interaction_mode: String,
}

struct SessionInner {
    layout: Option<LayoutDocument>,
    log: ConversationLog,
}

/// The session manager: one layout, one conversation, one lock
pub struct SpatialService {
    state: Mutex<SessionInner>,
    mirror: HistoryMirror,
    backend: Arc<dyn LlmBackend>,
    template: SystemPromptTemplate,
    layout_path: PathBuf,
    max_history_turns: usize,
    mode_override: Option<String>,
    request_timeout: Duration,
}

impl SpatialService {
    pub fn new(
        config: &AppConfig,
        backend: Arc<dyn LlmBackend>,
        template: SystemPromptTemplate,
    ) -> Self {
        // An empty override means the client's interaction_mode is authoritative.
        let mode_override = config
            .session
            .mode_override
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from);

        Self {
            state: Mutex::new(SessionInner {
                layout: None,
                log: ConversationLog::new(),
            }),
            mirror: HistoryMirror::new(&config.storage.history_path),
            backend,
            template,
            layout_path: config.storage.layout_dir.join(LATEST_LAYOUT_FILE),
            max_history_turns: config.session.max_history_turns,
            mode_override,
            request_timeout: Duration::from_secs(config.llm.timeouts.request),
        }
    }

    /// Validates and stores a new layout, writes its canonical copy, and
    /// rebuilds the session around a fresh system entry. Discards any prior
    /// turns. The canonical write is the one persistence failure that aborts.
    pub async fn ingest_layout(&self, raw: &[u8]) -> Result<(), ServiceError> {
        let layout =
            LayoutDocument::from_bytes(raw).map_err(|e| ServiceError::Validation(e.to_string()))?;

        let mut state = self.state.lock().await;
        layout.persist_to(&self.layout_path)?;

        let rendered = self.template.render(layout.canonical_text());
        state.log.reinitialize(rendered);
        state.layout = Some(layout);
        self.mirror_history(&state.log);
        tracing::info!("layout ingested, conversation reinitialized");
        Ok(())
    }

    /// Validates the query, composes the user turn, submits the window and
    /// records the reply. When the backend fails or times out the already
    /// appended user entry stays in place: the query remains recorded as an
    /// unanswered turn.
    pub async fn handle_query(&self, req: QueryRequest) -> Result<String, ServiceError> {
        let turn = self.compose_turn(&req)?;

        let mut state = self.state.lock().await;
        if state.layout.is_none() {
            return Err(ServiceError::MissingLayout);
        }

        state.log.push(Message::user(turn));
        self.mirror_history(&state.log);

        let window = submission_window(state.log.messages(), self.max_history_turns);
        tracing::debug!(window_len = window.len(), "submitting window to backend");

        let completion =
            tokio::time::timeout(self.request_timeout, self.backend.complete(&window)).await;
        let reply = match completion {
            Ok(Ok(text)) => text.trim().to_string(),
            Ok(Err(e)) => return Err(ServiceError::Upstream(e.to_string())),
            Err(_) => {
                return Err(ServiceError::Upstream(format!(
                    "backend call timed out after {}s",
                    self.request_timeout.as_secs()
                )))
            }
        };

        state.log.push(Message::assistant(reply.clone()));
        self.mirror_history(&state.log);
        Ok(reply)
    }

    /// Clears the session and snapshots the empty sequence. The layout store
    /// is left intact.
    pub async fn reset(&self) {
        let mut state = self.state.lock().await;
        state.log.clear();
        self.mirror_history(&state.log);
        tracing::info!("conversation history reset");
    }

    /// Copy of the in-memory entry sequence
    pub async fn history(&self) -> Vec<Message> {
        self.state.lock().await.log.messages().to_vec()
    }

    pub async fn has_layout(&self) -> bool {
        self.state.lock().await.layout.is_some()
    }

    pub fn mirror(&self) -> &HistoryMirror {
        &self.mirror
    }

    fn mirror_history(&self, log: &ConversationLog) {
        if let Err(e) = self.mirror.snapshot(log.messages()) {
            tracing::error!("Failed to persist conversation history: {}", e);
        }
    }

    /// Builds the composed user turn, running all input validation first;
    /// no state is touched until every check has passed.
    fn compose_turn(&self, req: &QueryRequest) -> Result<String, ServiceError> {
        let query = req.query.trim();
        if query.is_empty() {
            return Err(ServiceError::Validation("No query provided".to_string()));
        }

        let mode = match self.mode_override.as_deref() {
            Some(mode) => mode,
            None => {
                let mode = req.interaction_mode.trim();
                if mode.is_empty() {
                    return Err(ServiceError::Validation(
                        "No action type provided".to_string(),
                    ));
                }
                mode
            }
        };

        let position = required_vec3(req.user_position.as_ref(), "user_position")?;
        let forward = required_vec3(req.user_forward.as_ref(), "user_forward")?;
        let right = required_vec3(req.user_right.as_ref(), "user_right")?;

        // The scene client encodes "not pointing" as null or an empty array.
        let pointed_position = match req.target_position.as_ref() {
            None | Some(Value::Null) => None,
            Some(Value::Array(items)) if items.is_empty() => None,
            Some(value) => Some(parse_vec3(value).ok_or_else(|| {
                ServiceError::Validation(
                    "Invalid target_position. Provide as [x, y, z].".to_string(),
                )
            })?),
        };

        let mut turn = format!(
            "{}. Current interaction mode is: {}. The user's current position in the room is approximately at coordinates user_position= {:?}. The user's current forward direction vector in the room is approximately user_forward= {:?}. The user's current right direction vector in the room is approximately user_right= {:?}.",
            query, mode, position, forward, right
        );
        if let Some(object) = non_empty(req.target_object.as_deref()) {
            turn.push_str(&format!(" The user is pointing at this object: '{}'. In the user command, check if there is a target object or not. If yes, then this pointed object is the reference object. If there is no target object in the command, then most likely this pointed object is meant to be the target object", object));
        }
        if let Some(position) = pointed_position {
            turn.push_str(&format!(" The user is pointing to this position : '{:?}'. If user says 'here' or 'there' in the command, then assume this pointed position to be the target_position. ", position));
        }
        if let Some(reference) = non_empty(req.reference_object.as_deref()) {
            turn.push_str(&format!(
                " This pointed position is on this reference object : '{}' ",
                reference
            ));
        }
        if let Some(previous) = non_empty(req.prev_target_object.as_deref()) {
            turn.push_str(&format!(
                " The last object that the user acted upon was (i.e. previous target object): '{}' ",
                previous
            ));
        }
        Ok(turn)
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

fn parse_vec3(value: &Value) -> Option<[f64; 3]> {
    let items = value.as_array()?;
    if items.len() != 3 {
        return None;
    }
    let mut out = [0.0; 3];
    for (slot, item) in out.iter_mut().zip(items) {
        *slot = item.as_f64()?;
    }
    Some(out)
}

fn required_vec3(value: Option<&Value>, field: &str) -> Result<[f64; 3], ServiceError> {
    value.and_then(parse_vec3).ok_or_else(|| {
        ServiceError::Validation(format!("Invalid or missing {}. Provide as [x, y, z].", field))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockBackend;
    use serde_json::json;
    use tempfile::TempDir;

    fn test_config(dir: &TempDir) -> AppConfig {
        let mut config = AppConfig::default();
        config.storage.layout_dir = dir.path().join("layouts");
        config.storage.history_path = dir.path().join("history.json");
        config
    }

    fn test_service(config: &AppConfig) -> (Arc<MockBackend>, SpatialService) {
        let backend = Arc::new(MockBackend::new());
        let service = SpatialService::new(
            config,
            backend.clone(),
            SystemPromptTemplate::from_text("Rules.\n{layout_json}"),
        );
        (backend, service)
    }

    fn valid_query(text: &str) -> QueryRequest {
        QueryRequest {
            query: text.to_string(),
            user_position: Some(json!([1.0, 0.0, 2.0])),
            user_forward: Some(json!([0.0, 0.0, 1.0])),
            user_right: Some(json!([1.0, 0.0, 0.0])),
            target_object: None,
            target_position: None,
            reference_object: None,
            prev_target_object: None,
            interaction_mode: String::new(),
        }
    }

    #[test]
    fn composed_turn_embeds_query_mode_and_vectors() {
        let dir = TempDir::new().unwrap();
        let (_backend, service) = test_service(&test_config(&dir));

        let turn = service.compose_turn(&valid_query("Move the chair")).unwrap();
        assert_eq!(
            turn,
            "Move the chair. Current interaction mode is: free. \
             The user's current position in the room is approximately at coordinates user_position= [1.0, 0.0, 2.0]. \
             The user's current forward direction vector in the room is approximately user_forward= [0.0, 0.0, 1.0]. \
             The user's current right direction vector in the room is approximately user_right= [1.0, 0.0, 0.0]."
        );
    }

    #[test]
    fn pointing_context_appends_fixed_clauses() {
        let dir = TempDir::new().unwrap();
        let (_backend, service) = test_service(&test_config(&dir));

        let mut req = valid_query("Put it there");
        req.target_object = Some("red lamp".to_string());
        req.target_position = Some(json!([0.5, 0.0, 1.5]));
        req.reference_object = Some("desk".to_string());
        req.prev_target_object = Some("blue chair".to_string());

        let turn = service.compose_turn(&req).unwrap();
        assert!(turn.contains(
            " The user is pointing at this object: 'red lamp'. In the user command, check if there is a target object or not."
        ));
        assert!(turn.contains(
            " The user is pointing to this position : '[0.5, 0.0, 1.5]'. If user says 'here' or 'there' in the command, then assume this pointed position to be the target_position. "
        ));
        assert!(turn.contains(" This pointed position is on this reference object : 'desk' "));
        assert!(turn.ends_with(
            " The last object that the user acted upon was (i.e. previous target object): 'blue chair' "
        ));
    }

    #[test]
    fn blank_optional_fields_are_ignored() {
        let dir = TempDir::new().unwrap();
        let (_backend, service) = test_service(&test_config(&dir));

        let mut req = valid_query("Rotate the sofa");
        req.target_object = Some("   ".to_string());
        req.reference_object = Some(String::new());
        req.target_position = Some(Value::Null);

        let turn = service.compose_turn(&req).unwrap();
        assert!(!turn.contains("pointing"));
        assert!(!turn.contains("reference object"));
    }

    #[test]
    fn empty_query_is_rejected() {
        let dir = TempDir::new().unwrap();
        let (_backend, service) = test_service(&test_config(&dir));

        let err = service.compose_turn(&valid_query("   ")).unwrap_err();
        assert_eq!(err.to_string(), "No query provided");
    }

    #[test]
    fn vectors_must_be_exactly_three_numbers() {
        let dir = TempDir::new().unwrap();
        let (_backend, service) = test_service(&test_config(&dir));

        let mut req = valid_query("Move it");
        req.user_position = None;
        let err = service.compose_turn(&req).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid or missing user_position. Provide as [x, y, z]."
        );

        let mut req = valid_query("Move it");
        req.user_forward = Some(json!([0.0, 1.0]));
        let err = service.compose_turn(&req).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid or missing user_forward. Provide as [x, y, z]."
        );

        let mut req = valid_query("Move it");
        req.user_right = Some(json!(["a", "b", "c"]));
        let err = service.compose_turn(&req).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid or missing user_right. Provide as [x, y, z]."
        );
    }

    #[test]
    fn empty_target_position_array_means_no_pointing() {
        let dir = TempDir::new().unwrap();
        let (_backend, service) = test_service(&test_config(&dir));

        // The scene client serializes a cleared pointer as [] and the other
        // optional fields as empty strings.
        let mut req = valid_query("Move the chair closer to the desk");
        req.target_object = Some(String::new());
        req.target_position = Some(json!([]));
        req.reference_object = Some(String::new());
        req.prev_target_object = Some(String::new());

        let turn = service.compose_turn(&req).unwrap();
        assert!(turn.starts_with("Move the chair closer to the desk."));
        assert!(!turn.contains("pointing"));
        assert!(!turn.contains("previous target object"));
    }

    #[test]
    fn malformed_target_position_is_rejected() {
        let dir = TempDir::new().unwrap();
        let (_backend, service) = test_service(&test_config(&dir));

        let mut req = valid_query("Put it here");
        req.target_position = Some(json!("over there"));
        let err = service.compose_turn(&req).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid target_position. Provide as [x, y, z]."
        );

        // Non-empty but wrong-length arrays stay rejected.
        let mut req = valid_query("Put it here");
        req.target_position = Some(json!([0.5, 1.5]));
        let err = service.compose_turn(&req).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid target_position. Provide as [x, y, z]."
        );
    }

    #[test]
    fn client_mode_is_authoritative_without_override() {
        let dir = TempDir::new().unwrap();
        let mut config = test_config(&dir);
        config.session.mode_override = None;
        let (_backend, service) = test_service(&config);

        let err = service.compose_turn(&valid_query("Move it")).unwrap_err();
        assert_eq!(err.to_string(), "No action type provided");

        let mut req = valid_query("Move it");
        req.interaction_mode = "constrained".to_string();
        let turn = service.compose_turn(&req).unwrap();
        assert!(turn.contains("Current interaction mode is: constrained."));
    }

    #[test]
    fn override_replaces_whatever_the_client_sends() {
        let dir = TempDir::new().unwrap();
        let (_backend, service) = test_service(&test_config(&dir));

        let mut req = valid_query("Move it");
        req.interaction_mode = "constrained".to_string();
        let turn = service.compose_turn(&req).unwrap();
        assert!(turn.contains("Current interaction mode is: free."));
    }

    #[test]
    fn integer_coordinates_are_accepted() {
        let dir = TempDir::new().unwrap();
        let (_backend, service) = test_service(&test_config(&dir));

        let mut req = valid_query("Move it");
        req.user_position = Some(json!([1, 2, 3]));
        let turn = service.compose_turn(&req).unwrap();
        assert!(turn.contains("user_position= [1.0, 2.0, 3.0]."));
    }
}
