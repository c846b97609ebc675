use serde::{Deserialize, Serialize};

use crate::storage::Storage;

const KEY_PREFIX: &str = "notes_";

/// A user-authored, page-scoped note. A note belongs to exactly one page
/// collection, keyed by the page URL it was created on.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: i64,
    pub content: String,
    pub title: String,
    pub labels: Vec<String>,
    pub created_at: i64,
}

/// Storage key scoping a page's note collection.
pub fn page_key(page_url: &str) -> String {
    format!("{}{}", KEY_PREFIX, page_url)
}

/// Read the collection for a page. Missing or unreadable state is an empty
/// collection; callers never see a storage error.
pub fn load(storage: &Storage, page_url: &str) -> Vec<Note> {
    storage
        .get(&page_key(page_url))
        .and_then(|v| serde_json::from_value(v).ok())
        .unwrap_or_default()
}

fn persist(storage: &Storage, page_url: &str, notes: &[Note]) {
    if let Ok(value) = serde_json::to_value(notes) {
        storage.set(&page_key(page_url), value);
    }
}

/// Split a comma-separated label string. ASCII and fullwidth commas both
/// separate; entries are trimmed and blank ones dropped.
pub fn parse_labels(raw: &str) -> Vec<String> {
    raw.split([',', '，'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

// Ids are creation timestamps in milliseconds. Two notes created within the
// same millisecond would collide, so the id is bumped past the newest
// existing one instead.
fn next_id(notes: &[Note], now_ms: i64) -> i64 {
    match notes.iter().map(|n| n.id).max() {
        Some(max) if max >= now_ms => max + 1,
        _ => now_ms,
    }
}

/// Create a note in the page's collection and persist it. Content and title
/// are trimmed first; a note with neither is rejected before anything is
/// written.
pub fn add(
    storage: &Storage,
    page_url: &str,
    content: &str,
    title: &str,
    labels: &str,
) -> Result<Note, String> {
    let content = content.trim();
    let title = title.trim();
    if content.is_empty() && title.is_empty() {
        return Err("A note needs content or a title".to_string());
    }

    let mut notes = load(storage, page_url);
    let now_ms = chrono::Utc::now().timestamp_millis();

    let note = Note {
        id: next_id(&notes, now_ms),
        content: content.to_string(),
        title: title.to_string(),
        labels: parse_labels(labels),
        created_at: now_ms,
    };

    notes.push(note.clone());
    persist(storage, page_url, &notes);
    Ok(note)
}

/// Remove a note by id. Deletion is destructive and requires an explicit
/// confirmation from the caller; an unknown id leaves the collection as is.
pub fn delete(storage: &Storage, page_url: &str, id: i64, confirmed: bool) -> Result<(), String> {
    if !confirmed {
        return Err("Deleting a note requires confirmation".to_string());
    }

    let mut notes = load(storage, page_url);
    let before = notes.len();
    notes.retain(|n| n.id != id);
    if notes.len() != before {
        persist(storage, page_url, &notes);
    }
    Ok(())
}

/// Display view of a page's collection: newest first. The stored insertion
/// order is untouched; the sort is stable, so equal timestamps keep their
/// stored relative order.
pub fn list(storage: &Storage, page_url: &str) -> Vec<Note> {
    let mut notes = load(storage, page_url);
    notes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    notes
}

/// Look up a single note, for the send-stored-note flow.
pub fn find(storage: &Storage, page_url: &str, id: i64) -> Option<Note> {
    load(storage, page_url).into_iter().find(|n| n.id == id)
}

/// Total notes across every page collection.
pub fn total_count(storage: &Storage) -> usize {
    storage
        .keys()
        .iter()
        .filter(|k| k.starts_with(KEY_PREFIX))
        .map(|k| {
            storage
                .get(k)
                .and_then(|v| v.as_array().map(|a| a.len()))
                .unwrap_or(0)
        })
        .sum()
}
