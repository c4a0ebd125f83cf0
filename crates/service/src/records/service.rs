use std::{path::PathBuf, sync::Arc};

use common::metrics::{MUTATIONS_TOTAL, SAVE_FAILURES_TOTAL};
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::errors::ServiceError;
use crate::storage::json_file::RecordFile;

use super::model::{Patch, Record};
use super::repository::RecordRepository;
use super::store::RecordStore;

#[derive(Clone, Copy, Debug, Default)]
pub struct ServiceOptions {
    /// Surface save failures to the caller instead of only logging them.
    pub strict_persistence: bool,
}

/// The record store together with its backing file.
///
/// One mutex guards both: it is held from the first read of a request until
/// the file rewrite that follows a mutation has finished, so no caller sees
/// a half-applied change.
pub struct RecordService {
    store: Mutex<RecordStore>,
    file: RecordFile,
    options: ServiceOptions,
}

impl RecordService {
    /// Create the service and load whatever the backing file holds.
    /// A missing or unreadable file leaves the store empty.
    pub async fn open<P: Into<PathBuf>>(path: P, options: ServiceOptions) -> Arc<Self> {
        let service = Self {
            store: Mutex::new(RecordStore::new()),
            file: RecordFile::new(path),
            options,
        };
        service.load().await;
        Arc::new(service)
    }

    /// Replace the in-memory store with the file contents.
    /// Returns false, leaving the store as it was, when the file is missing or malformed.
    pub async fn load(&self) -> bool {
        let mut store = self.store.lock().await;
        let path = self.file.path().display().to_string();
        match self.file.load().await.and_then(RecordStore::from_records) {
            Ok(loaded) => {
                info!(%path, records = loaded.len(), "database file loaded");
                *store = loaded;
                true
            }
            Err(e) => {
                warn!(%path, error = %e, "database file not loaded; keeping current store");
                false
            }
        }
    }

    /// Rewrite the backing file from the in-memory store.
    pub async fn save(&self) -> bool {
        let store = self.store.lock().await;
        self.write_file(&store).await.is_ok()
    }

    async fn write_file(&self, store: &RecordStore) -> Result<(), ServiceError> {
        self.file.save(store.records()).await.inspect_err(|e| {
            SAVE_FAILURES_TOTAL.inc();
            error!(path = %self.file.path().display(), error = %e, "failed to write database file");
        })
    }

    /// Called with the lock still held after a successful mutation.
    async fn persist(&self, store: &RecordStore, operation: &'static str) -> Result<(), ServiceError> {
        MUTATIONS_TOTAL.with_label_values(&[operation]).inc();
        match self.write_file(store).await {
            Err(e) if self.options.strict_persistence => Err(e),
            _ => Ok(()),
        }
    }

    pub async fn list_names(&self) -> Vec<String> {
        self.store.lock().await.list_names()
    }

    pub async fn all_records(&self) -> Vec<Record> {
        self.store.lock().await.records().to_vec()
    }

    pub async fn add(&self, body: Value) -> Result<(), ServiceError> {
        let record = Record::from_json(body)?;
        let name = record.name().to_string();

        let mut store = self.store.lock().await;
        if !store.add_record(record) {
            debug!(%name, "add refused: name taken");
            return Err(ServiceError::AlreadyExists);
        }
        info!(%name, "record added");
        self.persist(&store, "add").await
    }

    pub async fn get(&self, name: &str) -> Result<Record, ServiceError> {
        let store = self.store.lock().await;
        store.get_record(name).cloned().ok_or(ServiceError::NotFound)
    }

    pub async fn update(&self, name: &str, body: Value) -> Result<(), ServiceError> {
        let patch = Patch::from_json(body)?;

        let mut store = self.store.lock().await;
        if !store.update_record(name, &patch)? {
            return Err(ServiceError::NotFound);
        }
        match patch.name() {
            Some(renamed) if renamed != name => info!(%name, %renamed, "record renamed"),
            _ => info!(%name, "record updated"),
        }
        self.persist(&store, "update").await
    }

    pub async fn delete(&self, name: &str) -> Result<(), ServiceError> {
        let mut store = self.store.lock().await;
        if !store.delete_record(name) {
            return Err(ServiceError::NotFound);
        }
        info!(%name, "record deleted");
        self.persist(&store, "delete").await
    }
}

#[async_trait::async_trait]
impl RecordRepository for RecordService {
    async fn list_names(&self) -> Vec<String> { self.list_names().await }
    async fn all_records(&self) -> Vec<Record> { self.all_records().await }
    async fn add(&self, body: Value) -> Result<(), ServiceError> { self.add(body).await }
    async fn get(&self, name: &str) -> Result<Record, ServiceError> { self.get(name).await }
    async fn update(&self, name: &str, body: Value) -> Result<(), ServiceError> { self.update(name, body).await }
    async fn delete(&self, name: &str) -> Result<(), ServiceError> { self.delete(name).await }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tmp_path() -> PathBuf {
        std::env::temp_dir().join(format!("records_svc_{}", uuid::Uuid::new_v4())).join("rest.json")
    }

    #[tokio::test]
    async fn mutations_persist_and_reload() -> Result<(), anyhow::Error> {
        let path = tmp_path();
        let svc = RecordService::open(&path, ServiceOptions::default()).await;
        assert!(svc.list_names().await.is_empty());

        svc.add(json!({"name": "alice", "age": "30"})).await?;
        svc.add(json!({"name": "bob"})).await?;
        svc.update("alice", json!({"age": "", "phone": "555"})).await?;
        svc.delete("bob").await?;

        let reopened = RecordService::open(&path, ServiceOptions::default()).await;
        assert_eq!(reopened.list_names().await, vec!["alice"]);
        let alice = reopened.get("alice").await?;
        assert_eq!(alice, Record::new("alice").with_field("phone", "555"));

        let _ = tokio::fs::remove_dir_all(path.parent().unwrap()).await;
        Ok(())
    }

    #[tokio::test]
    async fn client_errors_leave_store_untouched() -> Result<(), anyhow::Error> {
        let path = tmp_path();
        let svc = RecordService::open(&path, ServiceOptions::default()).await;
        svc.add(json!({"name": "alice"})).await?;

        assert_eq!(svc.add(json!({"name": "alice", "x": "1"})).await, Err(ServiceError::AlreadyExists));
        assert_eq!(svc.add(json!("not an object")).await, Err(ServiceError::Malformed));
        assert_eq!(svc.update("alice", json!({"name": ""})).await, Err(ServiceError::EmptyNamePatch));
        assert_eq!(svc.update("bob", json!({"a": "b"})).await, Err(ServiceError::NotFound));
        assert_eq!(svc.delete("bob").await, Err(ServiceError::NotFound));
        assert_eq!(svc.get("bob").await, Err(ServiceError::NotFound));

        assert_eq!(svc.all_records().await, vec![Record::new("alice")]);
        let _ = tokio::fs::remove_dir_all(path.parent().unwrap()).await;
        Ok(())
    }

    #[tokio::test]
    async fn malformed_file_starts_empty() -> Result<(), anyhow::Error> {
        let path = tmp_path();
        tokio::fs::create_dir_all(path.parent().unwrap()).await?;
        tokio::fs::write(&path, b"not json").await?;

        let svc = RecordService::open(&path, ServiceOptions::default()).await;
        assert!(svc.list_names().await.is_empty());
        assert!(!svc.load().await);

        svc.add(json!({"name": "alice"})).await?;
        assert!(svc.load().await);
        assert_eq!(svc.list_names().await, vec!["alice"]);

        let _ = tokio::fs::remove_dir_all(path.parent().unwrap()).await;
        Ok(())
    }

    #[tokio::test]
    async fn save_failure_is_lenient_unless_strict() -> Result<(), anyhow::Error> {
        // A directory at the file path makes every write fail.
        let path = tmp_path();
        tokio::fs::create_dir_all(&path).await?;

        let lenient = RecordService::open(&path, ServiceOptions::default()).await;
        lenient.add(json!({"name": "alice"})).await?;
        assert_eq!(lenient.list_names().await, vec!["alice"]);
        assert!(!lenient.save().await);

        let strict = RecordService::open(&path, ServiceOptions { strict_persistence: true }).await;
        let err = strict.add(json!({"name": "alice"})).await.unwrap_err();
        assert!(!err.is_client_error());
        // the in-memory store stays the source of truth
        assert_eq!(strict.list_names().await, vec!["alice"]);

        let _ = tokio::fs::remove_dir_all(path.parent().unwrap()).await;
        Ok(())
    }

    #[tokio::test]
    async fn concurrent_adds_of_same_name_insert_once() {
        let path = tmp_path();
        let svc = RecordService::open(&path, ServiceOptions::default()).await;
        let mut handles = Vec::new();
        for _ in 0..8 {
            let svc = Arc::clone(&svc);
            handles.push(tokio::spawn(async move { svc.add(json!({"name": "same"})).await }));
        }
        let mut ok = 0;
        for h in handles {
            if h.await.unwrap().is_ok() {
                ok += 1;
            }
        }
        assert_eq!(ok, 1);
        assert_eq!(svc.list_names().await, vec!["same"]);
        let _ = tokio::fs::remove_dir_all(path.parent().unwrap()).await;
    }
}
