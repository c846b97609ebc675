use serde_json::{json, Map, Value};

/// Flat data record the body template's placeholders resolve against.
/// Fields that don't apply to a given send are left as empty strings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemplateData {
    pub text: String,
    pub title: String,
    pub labels: String,
    pub url: String,
}

// Every occurrence of every recognized token is replaced; tokens are fully
// consumed in one pass, so substituting twice equals substituting once.
// {{labels}} must be replaced before its {{label}} alias.
fn substitute_string(s: &str, data: &TemplateData) -> String {
    s.replace("{{text}}", &data.text)
        .replace("{{title}}", &data.title)
        .replace("{{labels}}", &data.labels)
        .replace("{{label}}", &data.labels)
        .replace("{{url}}", &data.url)
}

/// Walk a template value tree and resolve placeholder tokens in every
/// string leaf. Arrays keep positional order, objects keep key order, and
/// non-string scalars (numbers, booleans, null) pass through unchanged.
pub fn substitute(value: &Value, data: &TemplateData) -> Value {
    match value {
        Value::String(s) => Value::String(substitute_string(s, data)),
        Value::Array(items) => Value::Array(items.iter().map(|v| substitute(v, data)).collect()),
        Value::Object(map) => {
            let mut out = Map::new();
            for (key, item) in map {
                out.insert(key.clone(), substitute(item, data));
            }
            Value::Object(out)
        }
        other => other.clone(),
    }
}

/// Parse the configured template text and resolve it against the record.
/// Template text that is not valid JSON falls back to a fixed payload shape
/// built directly from the record; this path is deterministic and never
/// fails.
pub fn build_request_body(template_text: &str, data: &TemplateData) -> Value {
    match serde_json::from_str::<Value>(template_text) {
        Ok(template) => substitute(&template, data),
        Err(e) => {
            eprintln!(
                "Warning: body template is not valid JSON ({}), using the default shape",
                e
            );
            json!({
                "idea": data.text,
                "title": data.title,
                "labels": data.labels,
                "url": data.url,
            })
        }
    }
}
