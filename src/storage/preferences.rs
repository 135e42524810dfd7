//! YAML-backed single-slot query persistence.
//!
//! The last search query round-trips through a tiny YAML file. The file is
//! read once at open; `save` and `clear` rewrite it and publish the new
//! value over a watch channel.

use std::fs;
use std::sync::Mutex;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::storage::{QueryPersistence, StorageError};
use async_trait::async_trait;

#[derive(Debug, Default, Serialize, Deserialize)]
struct PreferencesFile {
    #[serde(default)]
    last_search_query: String,
}

/// File-backed implementation of [`QueryPersistence`].
pub struct YamlQueryPersistence {
    path: Utf8PathBuf,

    /// Serializes file rewrites so concurrent saves cannot interleave.
    write_lock: Mutex<()>,

    query_tx: watch::Sender<String>,
}

impl YamlQueryPersistence {
    /// Opens the slot file at `path`, creating the parent directory if
    /// needed. A missing file means "unset" and observes as `""`.
    pub fn open(path: impl AsRef<Utf8Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(StorageError::write)?;
            }
        }

        let initial = if path.exists() {
            let contents = fs::read_to_string(&path).map_err(StorageError::read)?;
            let prefs: PreferencesFile =
                serde_yaml_ng::from_str(&contents).map_err(StorageError::read)?;
            prefs.last_search_query
        } else {
            tracing::debug!("preferences file not found at {}, starting unset", path);
            String::new()
        };

        let (query_tx, _) = watch::channel(initial);
        Ok(Self {
            path,
            write_lock: Mutex::new(()),
            query_tx,
        })
    }

    fn persist(&self, query: &str) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().unwrap();
        let prefs = PreferencesFile {
            last_search_query: query.to_string(),
        };
        let yaml = serde_yaml_ng::to_string(&prefs).map_err(StorageError::write)?;
        fs::write(&self.path, yaml).map_err(StorageError::write)?;
        self.query_tx.send_replace(query.to_string());
        Ok(())
    }
}

#[async_trait]
impl QueryPersistence for YamlQueryPersistence {
    fn observe(&self) -> watch::Receiver<String> {
        self.query_tx.subscribe()
    }

    async fn save(&self, query: &str) -> Result<(), StorageError> {
        tracing::debug!("persisting last search query ({} chars)", query.len());
        self.persist(query)
    }

    async fn clear(&self) -> Result<(), StorageError> {
        tracing::debug!("clearing persisted search query");
        self.persist("")
    }
}
