use crate::config;
use crate::storage::Storage;
use crate::store::Note;
use crate::template::{self, TemplateData};

/// What the UI asked to forward: the raw selection, or the richer record
/// derived from a stored note (labels already joined for display).
#[derive(Debug, Clone, PartialEq)]
pub enum SendRequest {
    PlainText(String),
    StructuredNote {
        content: String,
        title: String,
        labels: String,
    },
}

impl From<Note> for SendRequest {
    fn from(note: Note) -> Self {
        SendRequest::StructuredNote {
            content: note.content,
            title: note.title,
            labels: note.labels.join(","),
        }
    }
}

/// Why a send failed. Transport covers everything below HTTP (DNS,
/// connection refused, timeout); Http carries the non-success status code.
#[derive(Debug, thiserror::Error)]
pub enum SendError {
    #[error("webhook request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("webhook responded with HTTP {status}")]
    Http { status: u16 },
}

fn template_data(request: SendRequest, page_url: &str) -> TemplateData {
    match request {
        SendRequest::PlainText(text) => TemplateData {
            text,
            url: page_url.to_string(),
            ..Default::default()
        },
        SendRequest::StructuredNote {
            content,
            title,
            labels,
        } => TemplateData {
            text: content,
            title,
            labels,
            url: page_url.to_string(),
        },
    }
}

/// Resolve the configured body template against the request and POST the
/// result to the configured endpoint. Exactly one attempt is made; a
/// success resolves with the response body text.
pub async fn send_to_webhook(
    storage: &Storage,
    request: SendRequest,
    page_url: &str,
) -> Result<String, SendError> {
    let config = config::load_config(storage);
    let data = template_data(request, page_url);
    let body = template::build_request_body(&config.body_template, &data);

    let response = reqwest::Client::new()
        .post(&config.url)
        .header(reqwest::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        return Err(SendError::Http {
            status: status.as_u16(),
        });
    }

    Ok(response.text().await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WebhookConfig;
    use axum::{extract::State as AxumState, http::StatusCode, routing::post, Router};
    use serde_json::{json, Value};
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};

    const PAGE: &str = "https://example.com";

    fn temp_storage(tag: &str) -> (Storage, PathBuf) {
        let dir = std::env::temp_dir().join(format!(
            "clipnote-dispatch-{}-{}",
            tag,
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        (Storage::open(&dir), dir)
    }

    #[derive(Clone)]
    struct Capture {
        bodies: Arc<Mutex<Vec<String>>>,
        status: StatusCode,
    }

    async fn capture_handler(AxumState(capture): AxumState<Capture>, body: String) -> (StatusCode, String) {
        capture.bodies.lock().unwrap().push(body);
        (capture.status, "received".to_string())
    }

    // Bind a one-route server on an ephemeral port and hand back its URL
    // plus the captured request bodies.
    async fn spawn_receiver(status: StatusCode) -> (String, Arc<Mutex<Vec<String>>>) {
        let bodies = Arc::new(Mutex::new(Vec::new()));
        let capture = Capture {
            bodies: Arc::clone(&bodies),
            status,
        };
        let app = Router::new()
            .route("/hook", post(capture_handler))
            .with_state(capture);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        (format!("http://{}/hook", addr), bodies)
    }

    #[test]
    fn test_plain_text_template_data() {
        let data = template_data(SendRequest::PlainText("hello".to_string()), PAGE);
        assert_eq!(data.text, "hello");
        assert!(data.title.is_empty());
        assert!(data.labels.is_empty());
        assert_eq!(data.url, PAGE);
    }

    #[test]
    fn test_note_joins_labels_with_comma() {
        let note = Note {
            id: 1,
            content: "buy milk".to_string(),
            title: "Groceries".to_string(),
            labels: vec!["todo".to_string(), "home".to_string()],
            created_at: 1,
        };
        let data = template_data(note.into(), PAGE);
        assert_eq!(data.text, "buy milk");
        assert_eq!(data.title, "Groceries");
        assert_eq!(data.labels, "todo,home");
    }

    #[tokio::test]
    async fn test_send_default_template_end_to_end() {
        let (storage, dir) = temp_storage("e2e");
        let (url, bodies) = spawn_receiver(StatusCode::OK).await;
        save_endpoint(&storage, &url, None);

        let result = send_to_webhook(&storage, SendRequest::PlainText("hello".to_string()), PAGE)
            .await
            .unwrap();
        assert_eq!(result, "received");

        let sent = bodies.lock().unwrap();
        let body: Value = serde_json::from_str(&sent[0]).unwrap();
        assert_eq!(body, json!({ "idea": "hello", "url": "https://example.com" }));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_send_custom_template_with_note() {
        let (storage, dir) = temp_storage("custom");
        let (url, bodies) = spawn_receiver(StatusCode::OK).await;
        save_endpoint(
            &storage,
            &url,
            Some(r#"{"msg":"{{text}} @ {{url}}","tags":"{{labels}}"}"#),
        );

        let request = SendRequest::StructuredNote {
            content: "buy milk".to_string(),
            title: String::new(),
            labels: "todo,home".to_string(),
        };
        send_to_webhook(&storage, request, PAGE).await.unwrap();

        let sent = bodies.lock().unwrap();
        let body: Value = serde_json::from_str(&sent[0]).unwrap();
        assert_eq!(
            body,
            json!({
                "msg": "buy milk @ https://example.com",
                "tags": "todo,home"
            })
        );
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_non_success_status_is_http_error() {
        let (storage, dir) = temp_storage("httperr");
        let (url, _bodies) = spawn_receiver(StatusCode::INTERNAL_SERVER_ERROR).await;
        save_endpoint(&storage, &url, None);

        let err = send_to_webhook(&storage, SendRequest::PlainText("x".to_string()), PAGE)
            .await
            .unwrap_err();
        match err {
            SendError::Http { status } => assert_eq!(status, 500),
            other => panic!("expected Http error, got {:?}", other),
        }
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_transport_error() {
        let (storage, dir) = temp_storage("transport");
        // Bind then drop a listener so the port is closed.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        save_endpoint(&storage, &format!("http://{}/hook", addr), None);

        let err = send_to_webhook(&storage, SendRequest::PlainText("x".to_string()), PAGE)
            .await
            .unwrap_err();
        assert!(matches!(err, SendError::Transport(_)));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_corrupt_template_uses_fallback_shape() {
        let (storage, dir) = temp_storage("fallback");
        let (url, bodies) = spawn_receiver(StatusCode::OK).await;
        save_endpoint(&storage, &url, None);
        // Corrupt the stored template behind the validated save path.
        storage.set("requestBody", json!("this is not json"));

        let request = SendRequest::StructuredNote {
            content: "buy milk".to_string(),
            title: "Groceries".to_string(),
            labels: "todo,home".to_string(),
        };
        send_to_webhook(&storage, request, PAGE).await.unwrap();

        let sent = bodies.lock().unwrap();
        let body: Value = serde_json::from_str(&sent[0]).unwrap();
        assert_eq!(
            body,
            json!({
                "idea": "buy milk",
                "title": "Groceries",
                "labels": "todo,home",
                "url": "https://example.com"
            })
        );
        let _ = std::fs::remove_dir_all(&dir);
    }

    fn save_endpoint(storage: &Storage, url: &str, template: Option<&str>) {
        let config = WebhookConfig {
            url: url.to_string(),
            body_template: template
                .unwrap_or(crate::config::DEFAULT_BODY_TEMPLATE)
                .to_string(),
        };
        crate::config::save_config(storage, &config).unwrap();
    }
}
