use axum::{
    extract::{Path, Query, State as AxumState},
    http::StatusCode,
    response::Json,
    routing::{delete, get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;

use crate::config::{self, WebhookConfig};
use crate::dispatch::{self, SendRequest};
use crate::store::{self, Note};
use crate::AppState;

pub const SERVER_NAME: &str = "clipnote";
pub const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

// ── Bridge message types ───────────────────────────────────────────────────

/// Message from the extension glue: an action tag, the selection payload,
/// and the active page URL.
#[derive(Debug, Deserialize)]
pub struct BridgeRequest {
    pub action: String,
    #[serde(default)]
    pub idea: Option<IdeaPayload>,
    #[serde(default)]
    pub url: Option<String>,
}

/// The payload is either the raw selected text or the richer record built
/// from a stored note (labels pre-joined for display).
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum IdeaPayload {
    Text(String),
    Note {
        #[serde(default)]
        idea: String,
        #[serde(default)]
        title: String,
        #[serde(default)]
        labels: String,
    },
}

impl From<IdeaPayload> for SendRequest {
    fn from(payload: IdeaPayload) -> Self {
        match payload {
            IdeaPayload::Text(text) => SendRequest::PlainText(text),
            IdeaPayload::Note {
                idea,
                title,
                labels,
            } => SendRequest::StructuredNote {
                content: idea,
                title,
                labels,
            },
        }
    }
}

/// Reply on the bridge: a success flag plus either a result payload or an
/// error message.
#[derive(Debug, Serialize)]
pub struct BridgeResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BridgeResponse {
    fn ok(result: String) -> Self {
        Self {
            success: true,
            result: Some(result),
            error: None,
        }
    }

    fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            result: None,
            error: Some(message.into()),
        }
    }
}

// ── Router ─────────────────────────────────────────────────────────────────

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/message", post(handle_message))
        .route("/notes", get(handle_list_notes).post(handle_add_note))
        .route("/notes/{id}", delete(handle_delete_note))
        .route("/notes/{id}/send", post(handle_send_note))
        .route("/config", get(handle_get_config).put(handle_put_config))
        .route("/health", get(handle_health))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ── Handlers ───────────────────────────────────────────────────────────────

/// The background-message port: one send action per user gesture.
async fn handle_message(
    AxumState(state): AxumState<AppState>,
    Json(request): Json<BridgeRequest>,
) -> (StatusCode, Json<BridgeResponse>) {
    match request.action.as_str() {
        "sendToWebhook" => {
            let url = match request.url {
                Some(u) => u,
                None => {
                    return (
                        StatusCode::BAD_REQUEST,
                        Json(BridgeResponse::err("Missing page url")),
                    );
                }
            };
            let send = match request.idea {
                Some(payload) => SendRequest::from(payload),
                None => {
                    return (
                        StatusCode::BAD_REQUEST,
                        Json(BridgeResponse::err("Missing idea payload")),
                    );
                }
            };

            match dispatch::send_to_webhook(&state.storage, send, &url).await {
                Ok(result) => (StatusCode::OK, Json(BridgeResponse::ok(result))),
                Err(e) => {
                    eprintln!("Webhook send failed: {}", e);
                    (StatusCode::BAD_GATEWAY, Json(BridgeResponse::err(e.to_string())))
                }
            }
        }
        other => (
            StatusCode::BAD_REQUEST,
            Json(BridgeResponse::err(format!("Unknown action: {}", other))),
        ),
    }
}

#[derive(Debug, Deserialize)]
struct PageQuery {
    url: String,
}

async fn handle_list_notes(
    AxumState(state): AxumState<AppState>,
    Query(query): Query<PageQuery>,
) -> Json<Vec<Note>> {
    Json(store::list(&state.storage, &query.url))
}

#[derive(Debug, Deserialize)]
struct AddNoteRequest {
    url: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    labels: String,
}

async fn handle_add_note(
    AxumState(state): AxumState<AppState>,
    Json(request): Json<AddNoteRequest>,
) -> (StatusCode, Json<Value>) {
    match store::add(
        &state.storage,
        &request.url,
        &request.content,
        &request.title,
        &request.labels,
    ) {
        Ok(note) => (StatusCode::OK, Json(json!({ "success": true, "note": note }))),
        Err(e) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "success": false, "error": e })),
        ),
    }
}

#[derive(Debug, Deserialize)]
struct DeleteQuery {
    url: String,
    #[serde(default)]
    confirm: bool,
}

async fn handle_delete_note(
    AxumState(state): AxumState<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<DeleteQuery>,
) -> (StatusCode, Json<Value>) {
    match store::delete(&state.storage, &query.url, id, query.confirm) {
        Ok(()) => (StatusCode::OK, Json(json!({ "success": true }))),
        Err(e) => (
            StatusCode::CONFLICT,
            Json(json!({ "success": false, "error": e })),
        ),
    }
}

#[derive(Debug, Deserialize)]
struct SendNoteRequest {
    url: String,
}

/// Forward a stored note through the dispatcher.
async fn handle_send_note(
    AxumState(state): AxumState<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<SendNoteRequest>,
) -> (StatusCode, Json<BridgeResponse>) {
    let note = match store::find(&state.storage, &request.url, id) {
        Some(n) => n,
        None => {
            return (
                StatusCode::NOT_FOUND,
                Json(BridgeResponse::err("Note not found")),
            );
        }
    };

    match dispatch::send_to_webhook(&state.storage, note.into(), &request.url).await {
        Ok(result) => (StatusCode::OK, Json(BridgeResponse::ok(result))),
        Err(e) => {
            eprintln!("Webhook send failed: {}", e);
            (StatusCode::BAD_GATEWAY, Json(BridgeResponse::err(e.to_string())))
        }
    }
}

async fn handle_get_config(AxumState(state): AxumState<AppState>) -> Json<WebhookConfig> {
    Json(config::load_config(&state.storage))
}

async fn handle_put_config(
    AxumState(state): AxumState<AppState>,
    Json(new_config): Json<WebhookConfig>,
) -> (StatusCode, Json<Value>) {
    match config::save_config(&state.storage, &new_config) {
        Ok(()) => (StatusCode::OK, Json(json!({ "success": true }))),
        Err(e) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "success": false, "error": e })),
        ),
    }
}

async fn handle_health(AxumState(state): AxumState<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "server": SERVER_NAME,
        "version": SERVER_VERSION,
        "note_count": store::total_count(&state.storage),
    }))
}
