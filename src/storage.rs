//! Local key-value persistence: one JSON document holding the access token
//! and the serialized history log. First runs and corrupted writes fall back
//! to defaults instead of failing.

use std::{fs, path::PathBuf, sync::RwLock};

use anyhow::{Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};

use crate::history::ScanLogEntry;

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Document {
    access_token: Option<String>,
    #[serde(default)]
    history: Vec<ScanLogEntry>,
}

pub struct Storage {
    path: PathBuf,
    data: RwLock<Document>,
}

impl Storage {
    pub fn open(path: PathBuf) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
        }

        let data = match fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|err| {
                warn!("persisted state at {} unreadable ({err}), starting empty", path.display());
                Document::default()
            }),
            Err(_) => Document::default(),
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn access_token(&self) -> Option<String> {
        self.data.read().unwrap().access_token.clone()
    }

    pub fn set_access_token(&self, token: Option<String>) -> Result<()> {
        let mut guard = self.data.write().unwrap();
        guard.access_token = token;
        self.persist(&guard)
    }

    pub fn history(&self) -> Vec<ScanLogEntry> {
        self.data.read().unwrap().history.clone()
    }

    pub fn set_history(&self, history: Vec<ScanLogEntry>) -> Result<()> {
        let mut guard = self.data.write().unwrap();
        guard.history = history;
        self.persist(&guard)
    }

    fn persist(&self, data: &Document) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write {}", self.path.display()))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;

    use super::*;

    static COUNTER: AtomicU64 = AtomicU64::new(0);

    pub(crate) fn temp_path() -> PathBuf {
        let n = COUNTER.fetch_add(1, Ordering::Relaxed);
        std::env::temp_dir().join(format!("netscan-test-{}-{n}.json", std::process::id()))
    }

    pub(crate) fn temp_storage() -> Arc<Storage> {
        Arc::new(Storage::open(temp_path()).unwrap())
    }

    #[test]
    fn first_run_is_empty() {
        let storage = temp_storage();
        assert_eq!(storage.access_token(), None);
        assert!(storage.history().is_empty());
    }

    #[test]
    fn survives_corrupted_document() {
        let path = temp_path();
        fs::write(&path, "{not json").unwrap();
        let storage = Storage::open(path).unwrap();
        assert_eq!(storage.access_token(), None);
        assert!(storage.history().is_empty());
    }

    #[test]
    fn token_roundtrips_across_reopen() {
        let path = temp_path();
        {
            let storage = Storage::open(path.clone()).unwrap();
            storage.set_access_token(Some("NETSCAN-2024".to_string())).unwrap();
        }
        let reopened = Storage::open(path).unwrap();
        assert_eq!(reopened.access_token().as_deref(), Some("NETSCAN-2024"));
    }
}
