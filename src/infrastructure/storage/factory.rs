//! Storage factory for runtime backend selection

use std::path::PathBuf;
use std::sync::Arc;

use crate::domain::storage::{Storage, StorageEntity};
use crate::domain::DomainError;

use super::file::FileStorage;
use super::in_memory::InMemoryStorage;

/// Supported storage backends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageType {
    /// In-memory storage (for testing/embedding)
    InMemory,
    /// Directory of JSON documents
    File,
}

impl StorageType {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "memory" | "inmemory" | "in-memory" | "in_memory" => Some(Self::InMemory),
            "file" | "fs" | "disk" => Some(Self::File),
            _ => None,
        }
    }
}

/// Storage backend configuration
#[derive(Debug, Clone)]
pub enum StorageConfig {
    /// In-memory storage configuration
    InMemory,
    /// File storage rooted at a directory
    File { dir: PathBuf },
}

impl StorageConfig {
    /// Creates an in-memory storage configuration
    pub fn in_memory() -> Self {
        Self::InMemory
    }

    /// Creates a file storage configuration
    pub fn file(dir: impl Into<PathBuf>) -> Self {
        Self::File { dir: dir.into() }
    }

    /// Returns the storage type
    pub fn storage_type(&self) -> StorageType {
        match self {
            Self::InMemory => StorageType::InMemory,
            Self::File { .. } => StorageType::File,
        }
    }
}

/// Factory creating storage instances from configuration
pub struct StorageFactory;

impl StorageFactory {
    /// Create a storage backend for the given entity type
    pub fn create<E>(config: &StorageConfig) -> Result<Arc<dyn Storage<E>>, DomainError>
    where
        E: StorageEntity + 'static,
    {
        match config {
            StorageConfig::InMemory => Ok(Arc::new(InMemoryStorage::<E>::new())),
            StorageConfig::File { dir } => Ok(Arc::new(FileStorage::<E>::open(dir.clone())?)),
        }
    }
}
