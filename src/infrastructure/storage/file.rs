//! File-backed storage implementation
//!
//! Persists each entity as one JSON document named `<key>.json` under a
//! configured directory, with an in-memory index for reads. On open, every
//! persisted document is loaded eagerly; a document that fails to parse is
//! skipped and logged so a single corrupt record never blocks access to the
//! rest of the library.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::domain::storage::{Storage, StorageEntity, StorageKey};
use crate::domain::DomainError;

/// Durable storage backed by a directory of JSON documents
#[derive(Debug)]
pub struct FileStorage<E>
where
    E: StorageEntity,
{
    dir: PathBuf,
    entities: RwLock<HashMap<String, E>>,
}

impl<E> FileStorage<E>
where
    E: StorageEntity,
{
    /// Open storage rooted at the given directory, creating it if needed
    /// and eagerly loading every persisted entity
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, DomainError> {
        let dir = dir.into();

        fs::create_dir_all(&dir).map_err(|e| {
            DomainError::storage(format!(
                "Failed to create storage directory '{}': {}",
                dir.display(),
                e
            ))
        })?;

        let entities = load_all(&dir)?;
        debug!(
            dir = %dir.display(),
            count = entities.len(),
            "loaded persisted entities"
        );

        Ok(Self {
            dir,
            entities: RwLock::new(entities),
        })
    }

    /// The directory this storage persists into
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    fn write_document(&self, entity: &E) -> Result<(), DomainError> {
        let path = self.path_for(entity.key().as_str());
        let json = serde_json::to_string_pretty(entity)
            .map_err(|e| DomainError::storage(format!("Failed to serialize entity: {}", e)))?;

        fs::write(&path, json).map_err(|e| {
            DomainError::storage(format!("Failed to write '{}': {}", path.display(), e))
        })
    }

    fn remove_document(&self, key: &str) -> Result<(), DomainError> {
        let path = self.path_for(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(DomainError::storage(format!(
                "Failed to remove '{}': {}",
                path.display(),
                e
            ))),
        }
    }
}

/// Load every `*.json` document in a directory, skipping corrupt records
fn load_all<E>(dir: &Path) -> Result<HashMap<String, E>, DomainError>
where
    E: StorageEntity,
{
    let mut entities = HashMap::new();

    let entries = fs::read_dir(dir).map_err(|e| {
        DomainError::storage(format!("Failed to read directory '{}': {}", dir.display(), e))
    })?;

    for entry in entries {
        let entry = entry
            .map_err(|e| DomainError::storage(format!("Failed to read directory entry: {}", e)))?;
        let path = entry.path();

        if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
            continue;
        }

        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "skipping unreadable record");
                continue;
            }
        };

        match serde_json::from_str::<E>(&contents) {
            Ok(entity) => {
                entities.insert(entity.key().as_str().to_string(), entity);
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "skipping corrupt record");
            }
        }
    }

    Ok(entities)
}

#[async_trait]
impl<E> Storage<E> for FileStorage<E>
where
    E: StorageEntity + 'static,
{
    async fn get(&self, key: &E::Key) -> Result<Option<E>, DomainError> {
        let entities = self
            .entities
            .read()
            .map_err(|e| DomainError::storage(format!("Failed to acquire read lock: {}", e)))?;

        Ok(entities.get(key.as_str()).cloned())
    }

    async fn list(&self) -> Result<Vec<E>, DomainError> {
        let entities = self
            .entities
            .read()
            .map_err(|e| DomainError::storage(format!("Failed to acquire read lock: {}", e)))?;

        Ok(entities.values().cloned().collect())
    }

    async fn create(&self, entity: E) -> Result<E, DomainError> {
        let key = entity.key().as_str().to_string();
        let mut entities = self
            .entities
            .write()
            .map_err(|e| DomainError::storage(format!("Failed to acquire write lock: {}", e)))?;

        if entities.contains_key(&key) {
            return Err(DomainError::conflict(format!(
                "Entity with key '{}' already exists",
                key
            )));
        }

        self.write_document(&entity)?;
        entities.insert(key, entity.clone());
        Ok(entity)
    }

    async fn update(&self, entity: E) -> Result<E, DomainError> {
        let key = entity.key().as_str().to_string();
        let mut entities = self
            .entities
            .write()
            .map_err(|e| DomainError::storage(format!("Failed to acquire write lock: {}", e)))?;

        if !entities.contains_key(&key) {
            return Err(DomainError::not_found(format!(
                "Entity with key '{}' not found",
                key
            )));
        }

        self.write_document(&entity)?;
        entities.insert(key, entity.clone());
        Ok(entity)
    }

    async fn delete(&self, key: &E::Key) -> Result<bool, DomainError> {
        let mut entities = self
            .entities
            .write()
            .map_err(|e| DomainError::storage(format!("Failed to acquire write lock: {}", e)))?;

        if entities.remove(key.as_str()).is_none() {
            return Ok(false);
        }

        self.remove_document(key.as_str())?;
        Ok(true)
    }
}
