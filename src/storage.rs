use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Local persistent key-value storage. Everything the service remembers
/// (webhook settings, per-page note collections) lives in one JSON object
/// persisted at `<data_dir>/storage.json`; every write rewrites the file.
///
/// Read failures are treated as absent state and never surfaced to callers.
pub struct Storage {
    path: PathBuf,
    entries: Mutex<serde_json::Map<String, Value>>,
}

impl Storage {
    /// Open (or start fresh) the store under `data_dir`. A missing file is
    /// an empty store; a malformed file is logged and replaced on the next
    /// write.
    pub fn open(data_dir: &Path) -> Storage {
        let path = data_dir.join("storage.json");
        let entries = match std::fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str::<Value>(&content) {
                Ok(Value::Object(map)) => map,
                _ => {
                    eprintln!(
                        "Warning: ignoring malformed storage file {}",
                        path.display()
                    );
                    serde_json::Map::new()
                }
            },
            Err(_) => serde_json::Map::new(),
        };

        Storage {
            path,
            entries: Mutex::new(entries),
        }
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.entries
            .lock()
            .expect("storage mutex")
            .get(key)
            .cloned()
    }

    pub fn set(&self, key: &str, value: Value) {
        let mut entries = self.entries.lock().expect("storage mutex");
        entries.insert(key.to_string(), value);
        self.persist(&entries);
    }

    pub fn remove(&self, key: &str) {
        let mut entries = self.entries.lock().expect("storage mutex");
        entries.remove(key);
        self.persist(&entries);
    }

    pub fn keys(&self) -> Vec<String> {
        self.entries
            .lock()
            .expect("storage mutex")
            .keys()
            .cloned()
            .collect()
    }

    // Whole-map overwrite; the caller treats the write as atomic, so a
    // failed write is logged and otherwise swallowed.
    fn persist(&self, entries: &serde_json::Map<String, Value>) {
        if let Some(parent) = self.path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }

        match serde_json::to_string_pretty(entries) {
            Ok(json) => {
                if let Err(e) = std::fs::write(&self.path, json) {
                    eprintln!(
                        "Warning: failed to write storage file {}: {}",
                        self.path.display(),
                        e
                    );
                }
            }
            Err(e) => eprintln!("Warning: failed to serialize storage: {}", e),
        }
    }
}
