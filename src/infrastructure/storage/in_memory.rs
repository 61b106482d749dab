//! In-memory storage implementation

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::domain::storage::{Storage, StorageEntity, StorageKey};
use crate::domain::DomainError;

/// Thread-safe in-memory storage implementation
///
/// Useful for testing and embedding. Data is lost when the process
/// terminates.
#[derive(Debug)]
pub struct InMemoryStorage<E>
where
    E: StorageEntity,
{
    entities: RwLock<HashMap<String, E>>,
}

impl<E> Default for InMemoryStorage<E>
where
    E: StorageEntity,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<E> InMemoryStorage<E>
where
    E: StorageEntity,
{
    /// Creates a new empty in-memory storage
    pub fn new() -> Self {
        Self {
            entities: RwLock::new(HashMap::new()),
        }
    }

    /// Creates storage pre-populated with entities
    pub fn with_entities(entities: Vec<E>) -> Self {
        let storage = Self::new();
        {
            let mut map = storage.entities.write().unwrap();

            for entity in entities {
                map.insert(entity.key().as_str().to_string(), entity);
            }
        }
        storage
    }
}

#[async_trait]
impl<E> Storage<E> for InMemoryStorage<E>
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

        entities.insert(key, entity.clone());
        Ok(entity)
    }

    async fn delete(&self, key: &E::Key) -> Result<bool, DomainError> {
        let mut entities = self
            .entities
            .write()
            .map_err(|e| DomainError::storage(format!("Failed to acquire write lock: {}", e)))?;

        Ok(entities.remove(key.as_str()).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::recipe::{Recipe, RecipeId, RecipeStep};
    use std::sync::Arc;

    fn create_recipe(id: &str) -> Recipe {
        Recipe::new(RecipeId::new(id).unwrap(), format!("Recipe {}", id))
            .with_step(RecipeStep::new("s1", "noop"))
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let storage = InMemoryStorage::<Recipe>::new();
        let recipe = create_recipe("test-1");

        let created = storage.create(recipe).await.unwrap();
        assert_eq!(created.id().as_str(), "test-1");

        let retrieved = storage.get(created.id()).await.unwrap();
        assert!(retrieved.is_some());
        assert_eq!(retrieved.unwrap().name(), "Recipe test-1");
    }

    #[tokio::test]
    async fn test_create_duplicate() {
        let recipe = create_recipe("test-1");
        let storage = InMemoryStorage::with_entities(vec![recipe.clone()]);

        let result = storage.create(recipe).await;
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("already exists"));
    }

    #[tokio::test]
    async fn test_update_not_found() {
        let storage = InMemoryStorage::<Recipe>::new();

        let result = storage.update(create_recipe("nonexistent")).await;
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("not found"));
    }

    #[tokio::test]
    async fn test_delete() {
        let recipe = create_recipe("test-1");
        let id = recipe.id().clone();
        let storage = InMemoryStorage::with_entities(vec![recipe]);

        assert!(storage.exists(&id).await.unwrap());

        let deleted = storage.delete(&id).await.unwrap();
        assert!(deleted);
        assert!(!storage.exists(&id).await.unwrap());

        // Second delete returns false
        let deleted = storage.delete(&id).await.unwrap();
        assert!(!deleted);
    }

    #[tokio::test]
    async fn test_list() {
        let storage = InMemoryStorage::with_entities(vec![
            create_recipe("test-1"),
            create_recipe("test-2"),
        ]);

        let recipes = storage.list().await.unwrap();
        assert_eq!(recipes.len(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_access() {
        let storage = Arc::new(InMemoryStorage::<Recipe>::new());

        let handles: Vec<_> = (0..10)
            .map(|i| {
                let storage = storage.clone();
                tokio::spawn(async move {
                    let recipe = create_recipe(&format!("test-{}", i));
                    storage.create(recipe).await
                })
            })
            .collect();

        for handle in handles {
            let result = handle.await.unwrap();
            assert!(result.is_ok());
        }

        let recipes = storage.list().await.unwrap();
        assert_eq!(recipes.len(), 10);
    }
}
