// ./infrastructure/src/persistence/document_store.rs
use crate::config::{DataSourceConfig, WriteMode};
use application::ApplicationError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, error, info, instrument, warn};

/// Top-level keys of the collections a fresh datasource is created with.
pub const COLLECTION_KEYS: [&str; 3] = ["persons", "firestations", "medicalrecords"];

/// The whole datasource: the root object of the JSON file.
///
/// Collections stay untyped nodes here. Only the collection a repository works on is
/// converted to entities, so every other key is written back exactly as it was read.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(transparent)]
pub struct JsonDocument(Map<String, Value>);

impl JsonDocument {
    /// A document holding every known collection, each empty.
    pub fn initialized() -> Self {
        Self(
            COLLECTION_KEYS
                .iter()
                .map(|key| (key.to_string(), Value::Array(Vec::new())))
                .collect(),
        )
    }

    /// The node stored under `key`, if any.
    pub fn node(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Stores `node` under `key`, replacing whatever was there. Other keys are untouched.
    pub fn replace_node(&mut self, key: &str, node: Value) {
        self.0.insert(key.to_string(), node);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Owns the backing file of the datasource.
///
/// Every access goes through [`JsonDocumentStore::lock`]; a mutating caller keeps the
/// returned lock from its fresh read until its write-back, so writers within this
/// process never interleave. Other processes writing the same file are not coordinated.
#[derive(Debug)]
pub struct JsonDocumentStore {
    path: PathBuf,
    write_mode: WriteMode,
    guard: Mutex<()>,
}

impl JsonDocumentStore {
    pub fn open(config: DataSourceConfig) -> Self {
        info!(datasource = %config.datasource.display(), write_mode = %config.write_mode, "Opening JSON document store");
        Self {
            path: config.datasource,
            write_mode: config.write_mode,
            guard: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write_mode(&self) -> WriteMode {
        self.write_mode
    }

    /// Waits for exclusive access to the datasource.
    pub async fn lock(&self) -> DocumentLock<'_> {
        DocumentLock {
            store: self,
            _guard: self.guard.lock().await,
        }
    }

    /// Reads the whole document under the lock.
    pub async fn read_document(&self) -> Result<Option<JsonDocument>, ApplicationError> {
        self.lock().await.read_document().await
    }

    /// Overwrites the whole document under the lock.
    pub async fn write_document(&self, document: &JsonDocument) -> bool {
        self.lock().await.write_document(document).await
    }

    fn temp_path(&self) -> PathBuf {
        match self.path.file_name() {
            Some(name) => {
                let mut temp_name = OsString::from(name);
                temp_name.push(".tmp");
                self.path.with_file_name(temp_name)
            }
            None => self.path.with_extension("tmp"),
        }
    }

    async fn read_from_disk(&self) -> Result<Option<JsonDocument>, ApplicationError> {
        debug!(datasource = %self.path.display(), "Reading JSON document");
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                warn!(datasource = %self.path.display(), "Datasource does not exist yet");
                return Ok(None);
            }
            Err(e) => {
                error!(datasource = %self.path.display(), "Error while reading JSON file: {}", e);
                return Err(ApplicationError::Io(format!(
                    "failed to read {}: {}",
                    self.path.display(),
                    e
                )));
            }
        };

        if content.trim().is_empty() {
            warn!(datasource = %self.path.display(), "Datasource is empty");
            return Ok(None);
        }

        let document: JsonDocument = serde_json::from_str(&content).map_err(|e| {
            error!(datasource = %self.path.display(), "Error while parsing JSON file: {}", e);
            ApplicationError::Io(format!("failed to parse {}: {}", self.path.display(), e))
        })?;
        debug!(keys = document.len(), "JSON document read");
        Ok(Some(document))
    }

    async fn write_to_disk(&self, document: &JsonDocument) -> io::Result<()> {
        let payload = serde_json::to_vec_pretty(document)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        if let Some(dir) = self.path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(dir).await?;
        }

        match self.write_mode {
            WriteMode::InPlace => fs::write(&self.path, &payload).await,
            WriteMode::Atomic => {
                let temp_path = self.temp_path();
                let written = self.replace_atomically(&temp_path, &payload).await;
                if written.is_err() {
                    // Leftover temp files are never read; removal is best effort.
                    let _ = fs::remove_file(&temp_path).await;
                }
                written
            }
        }
    }

    // Atomic write: temp + fsync + rename
    async fn replace_atomically(&self, temp_path: &Path, payload: &[u8]) -> io::Result<()> {
        let mut file = fs::File::create(temp_path).await?;
        file.write_all(payload).await?;
        file.sync_all().await?;
        drop(file);
        fs::rename(temp_path, &self.path).await
    }
}

/// Exclusive access to the datasource, released on drop.
pub struct DocumentLock<'a> {
    store: &'a JsonDocumentStore,
    _guard: MutexGuard<'a, ()>,
}

impl DocumentLock<'_> {
    /// Parses the backing file.
    ///
    /// Returns `Ok(None)` when the file is absent or empty, and `Io` when it cannot be
    /// read or its root is not a JSON object.
    pub async fn read_document(&self) -> Result<Option<JsonDocument>, ApplicationError> {
        self.store.read_from_disk().await
    }

    /// Serializes the whole document and overwrites the backing file.
    ///
    /// Returns `true` only when the write completed without an I/O error.
    #[instrument(skip(self, document), fields(datasource = %self.store.path.display()))]
    pub async fn write_document(&self, document: &JsonDocument) -> bool {
        match self.store.write_to_disk(document).await {
            Ok(()) => {
                debug!("JSON document written");
                true
            }
            Err(e) => {
                error!("Failed to write JSON document: {}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::test_support::{init_tracing, store_with};
    use serde_json::json;
    use tempfile::tempdir;

    #[tokio::test]
    async fn absent_file_reads_as_none() {
        init_tracing();
        let dir = tempdir().unwrap();
        let store = JsonDocumentStore::open(DataSourceConfig::new(dir.path().join("missing.json")));
        assert_eq!(store.read_document().await.unwrap(), None);
    }

    #[tokio::test]
    async fn empty_file_reads_as_none() {
        let (_dir, store) = store_with("  \n").await;
        assert_eq!(store.read_document().await.unwrap(), None);
    }

    #[tokio::test]
    async fn malformed_file_is_an_io_failure() {
        let (_dir, store) = store_with("{ \"persons\": [").await;
        let err = store.read_document().await.unwrap_err();
        assert!(matches!(err, ApplicationError::Io(_)), "unexpected error: {err:?}");
    }

    #[tokio::test]
    async fn non_object_root_is_an_io_failure() {
        let (_dir, store) = store_with("[1, 2, 3]").await;
        assert!(matches!(
            store.read_document().await,
            Err(ApplicationError::Io(_))
        ));
    }

    #[tokio::test]
    async fn write_back_keeps_every_node_as_read() {
        let original = json!({
            "persons": [{ "firstName": "John", "lastName": "Boyd", "nickname": "JB" }],
            "firestations": [{ "address": "1 Main St", "station": "1" }],
            "medicalrecords": [{ "firstName": "John", "lastName": "Boyd", "medications": null }],
            "version": 2
        });
        let (_dir, store) = store_with(&original.to_string()).await;

        let document = store.read_document().await.unwrap().unwrap();
        assert_eq!(document.len(), 4);
        assert!(store.write_document(&document).await);

        let raw: Value =
            serde_json::from_str(&std::fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(raw, original);
    }

    #[test]
    fn replace_node_leaves_other_keys_untouched() {
        let mut document: JsonDocument = serde_json::from_value(json!({
            "persons": [{ "firstName": "John", "nickname": "JB" }],
            "firestations": []
        }))
        .unwrap();

        document.replace_node("firestations", json!([{ "address": "2 Side St", "station": 2 }]));

        assert_eq!(
            document.node("persons"),
            Some(&json!([{ "firstName": "John", "nickname": "JB" }]))
        );
        assert_eq!(document.node("firestations").unwrap().as_array().unwrap().len(), 1);
        assert_eq!(document.node("medicalrecords"), None);
    }

    #[test]
    fn initialized_document_holds_every_collection() {
        let document = JsonDocument::initialized();
        for key in COLLECTION_KEYS {
            assert_eq!(document.node(key), Some(&json!([])));
        }
        assert!(JsonDocument::default().is_empty());
    }

    #[tokio::test]
    async fn atomic_write_leaves_no_temp_file() {
        let (dir, store) = store_with("{}").await;
        assert_eq!(store.write_mode(), WriteMode::Atomic);
        assert!(store.write_document(&JsonDocument::initialized()).await);
        assert!(!dir.path().join("data.json.tmp").exists());
    }

    #[tokio::test]
    async fn write_creates_missing_parent_directories() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("data.json");
        let store = JsonDocumentStore::open(DataSourceConfig::new(&path));
        assert!(store.write_document(&JsonDocument::initialized()).await);
        assert!(store.read_document().await.unwrap().is_some());
    }

    #[tokio::test]
    async fn in_place_write_round_trips() {
        let dir = tempdir().unwrap();
        let store = JsonDocumentStore::open(
            DataSourceConfig::new(dir.path().join("data.json")).with_write_mode(WriteMode::InPlace),
        );
        assert_eq!(store.write_mode(), WriteMode::InPlace);
        let mut document = JsonDocument::initialized();
        document.replace_node("firestations", json!([{ "address": "1 Main St", "station": 4 }]));
        assert!(store.write_document(&document).await);
        assert_eq!(store.read_document().await.unwrap(), Some(document));
    }

    #[tokio::test]
    async fn failed_atomic_write_reports_false_and_keeps_file() {
        let original = r#"{ "firestations": [] }"#;
        let (dir, store) = store_with(original).await;
        // A directory squatting on the temp path makes the write fail for any user.
        std::fs::create_dir(dir.path().join("data.json.tmp")).unwrap();

        let mut document = JsonDocument::initialized();
        document.replace_node("firestations", json!([{ "address": "1 Main St", "station": 4 }]));
        assert!(!store.write_document(&document).await);
        assert_eq!(std::fs::read_to_string(store.path()).unwrap(), original);
    }

    #[tokio::test]
    async fn failed_in_place_write_reports_false() {
        let dir = tempdir().unwrap();
        // The datasource path is a directory, so it can be neither read nor overwritten.
        let store = JsonDocumentStore::open(
            DataSourceConfig::new(dir.path()).with_write_mode(WriteMode::InPlace),
        );
        assert!(!store.write_document(&JsonDocument::initialized()).await);
        assert!(matches!(
            store.read_document().await,
            Err(ApplicationError::Io(_))
        ));
    }
}
