//! Recipe automation engine
//!
//! A declarative workflow ("recipe") engine for agent backends:
//! - Recipes: ordered, versioned lists of tool-invoking steps
//! - `${name}` variable substitution and result passing between steps
//! - Per-step failure policies (stop / continue / retry)
//! - Durable recipe storage with category/tag queries
//!
//! The host supplies tools through a [`domain::ToolRegistry`] and drives the
//! engine through a [`infrastructure::services::RecipeService`]; transports,
//! permissions, and the tools themselves live outside this crate.

pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;

use tracing::info;

use domain::{Recipe, ToolRegistry};
use infrastructure::recipe::RecipeExecutorImpl;
use infrastructure::services::RecipeService;
use infrastructure::storage::{StorageConfig, StorageFactory, StorageType};

/// Create a recipe service wired per the given configuration
///
/// Backends: `memory` keeps definitions in-process; `file` persists each
/// recipe as a JSON document under `storage.recipes_dir`, eagerly loading
/// existing definitions on startup.
pub fn create_recipe_service(
    config: &AppConfig,
    tools: Arc<dyn ToolRegistry>,
) -> anyhow::Result<Arc<RecipeService>> {
    let backend = StorageType::parse(&config.storage.backend)
        .unwrap_or(StorageType::InMemory);

    info!("Storage backend: {:?}", backend);

    let storage_config = match backend {
        StorageType::InMemory => StorageConfig::in_memory(),
        StorageType::File => StorageConfig::file(&config.storage.recipes_dir),
    };

    let storage = StorageFactory::create::<Recipe>(&storage_config)?;
    let executor = Arc::new(RecipeExecutorImpl::new(tools));

    Ok(Arc::new(RecipeService::new(storage, executor)))
}
