use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::storage::Storage;

/// Endpoint used until the user saves their own.
pub const DEFAULT_WEBHOOK_URL: &str =
    "https://www.feishu.cn/flow/api/trigger-webhook/f0b419896d69c20daf099813dfcf3126";

/// Body template used until the user saves their own.
pub const DEFAULT_BODY_TEMPLATE: &str = "{\n  \"idea\": \"{{text}}\",\n  \"url\": \"{{url}}\"\n}";

const WEBHOOK_URL_KEY: &str = "webhookUrl";
const REQUEST_BODY_KEY: &str = "requestBody";

/// Where and how outgoing payloads are sent: the destination endpoint plus
/// the JSON body template its placeholders are resolved into.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookConfig {
    pub url: String,
    pub body_template: String,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_WEBHOOK_URL.to_string(),
            body_template: DEFAULT_BODY_TEMPLATE.to_string(),
        }
    }
}

/// Read the saved configuration, filling in built-in defaults for any field
/// that was never saved.
pub fn load_config(storage: &Storage) -> WebhookConfig {
    let url = storage
        .get(WEBHOOK_URL_KEY)
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_else(|| DEFAULT_WEBHOOK_URL.to_string());

    let body_template = storage
        .get(REQUEST_BODY_KEY)
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_else(|| DEFAULT_BODY_TEMPLATE.to_string());

    WebhookConfig { url, body_template }
}

/// Validate and persist the configuration. The URL must be an absolute
/// http/https URL and the template must be JSON-parseable; a rejected save
/// persists nothing.
pub fn save_config(storage: &Storage, config: &WebhookConfig) -> Result<(), String> {
    let url = config.url.trim();
    if url.is_empty() {
        return Err("Webhook URL is required".to_string());
    }

    let parsed: url::Url = url
        .parse()
        .map_err(|_| format!("'{}' is not a valid URL", url))?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(format!(
            "Webhook URL must use http or https, got '{}'",
            parsed.scheme()
        ));
    }

    let template = config.body_template.trim();
    serde_json::from_str::<Value>(template)
        .map_err(|e| format!("Body template is not valid JSON: {}", e))?;

    storage.set(WEBHOOK_URL_KEY, Value::String(url.to_string()));
    storage.set(REQUEST_BODY_KEY, Value::String(template.to_string()));
    Ok(())
}
