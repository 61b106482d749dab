//! Recipe service - management and execution trigger API
//!
//! This is the surface a host (HTTP layer, chat agent, CLI) wires its
//! endpoints to: CRUD over stored recipe definitions plus the execute
//! operation that runs one by identifier.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde_json::Value;
use tracing::info;

use crate::domain::storage::Storage;
use crate::domain::{
    ExecutionResult, Recipe, RecipeError, RecipeExecutor, RecipeId, RecipeStep, ToolContext,
};

/// Request to create a new recipe
///
/// The identifier is generated at creation; callers never choose it.
#[derive(Debug, Clone)]
pub struct CreateRecipeRequest {
    pub name: String,
    pub description: String,
    pub category: String,
    pub steps: Vec<RecipeStep>,
    pub tags: Vec<String>,
    pub metadata: HashMap<String, Value>,
    pub author: Option<String>,
}

impl CreateRecipeRequest {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            category: String::new(),
            steps: Vec::new(),
            tags: Vec::new(),
            metadata: HashMap::new(),
            author: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_steps(mut self, steps: Vec<RecipeStep>) -> Self {
        self.steps = steps;
        self
    }

    pub fn with_step(mut self, step: RecipeStep) -> Self {
        self.steps.push(step);
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_metadata(mut self, metadata: HashMap<String, Value>) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }
}

/// Filter for listing recipes
///
/// Filters are conjunctive: a recipe matches when it is in the category
/// (if given) AND carries at least one of the tags (if given).
#[derive(Debug, Clone, Default)]
pub struct RecipeQuery {
    category: Option<String>,
    tags: Vec<String>,
}

impl RecipeQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    fn matches(&self, recipe: &Recipe) -> bool {
        if let Some(ref category) = self.category {
            if recipe.category() != category {
                return false;
            }
        }

        if !self.tags.is_empty() && !self.tags.iter().any(|t| recipe.tags().contains(t)) {
            return false;
        }

        true
    }
}

/// Recipe service for definition management and execution
pub struct RecipeService {
    storage: Arc<dyn Storage<Recipe>>,
    executor: Arc<dyn RecipeExecutor>,
}

impl std::fmt::Debug for RecipeService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecipeService").finish()
    }
}

impl RecipeService {
    /// Create a new recipe service
    pub fn new(storage: Arc<dyn Storage<Recipe>>, executor: Arc<dyn RecipeExecutor>) -> Self {
        Self { storage, executor }
    }

    /// Create and persist a new recipe
    pub async fn create(&self, request: CreateRecipeRequest) -> Result<Recipe, RecipeError> {
        validate_steps(&request.steps)?;

        let mut recipe = Recipe::new(RecipeId::generate(), request.name)
            .with_description(request.description)
            .with_category(request.category)
            .with_steps(request.steps)
            .with_tags(request.tags)
            .with_metadata(request.metadata);

        if let Some(author) = request.author {
            recipe = recipe.with_author(author);
        }

        info!(recipe_id = %recipe.id(), "creating recipe");
        Ok(self.storage.create(recipe).await?)
    }

    /// Save a full recipe definition, replacing any prior version
    ///
    /// Refreshes the updated-at timestamp. Idempotent.
    pub async fn save(&self, mut recipe: Recipe) -> Result<Recipe, RecipeError> {
        validate_steps(recipe.steps())?;

        recipe.touch();
        Ok(self.storage.save(recipe).await?)
    }

    /// Get a recipe by ID; unknown or malformed identifiers yield `None`
    pub async fn get(&self, id: &str) -> Result<Option<Recipe>, RecipeError> {
        let Ok(recipe_id) = RecipeId::new(id) else {
            return Ok(None);
        };

        Ok(self.storage.get(&recipe_id).await?)
    }

    /// List recipes matching the query, most recently updated first
    pub async fn list(&self, query: &RecipeQuery) -> Result<Vec<Recipe>, RecipeError> {
        let mut recipes: Vec<Recipe> = self
            .storage
            .list()
            .await?
            .into_iter()
            .filter(|r| query.matches(r))
            .collect();

        recipes.sort_by(|a, b| b.updated_at().cmp(&a.updated_at()));
        Ok(recipes)
    }

    /// Delete a recipe; a no-op when the identifier is unknown
    pub async fn delete(&self, id: &str) -> Result<(), RecipeError> {
        let Ok(recipe_id) = RecipeId::new(id) else {
            return Ok(());
        };

        self.storage.delete(&recipe_id).await?;
        Ok(())
    }

    /// Execute a stored recipe with the given input variables
    pub async fn execute(
        &self,
        id: &str,
        variables: HashMap<String, Value>,
    ) -> Result<ExecutionResult, RecipeError> {
        self.execute_with_context(id, &ToolContext::new(), variables)
            .await
    }

    /// Execute a stored recipe, threading a host context through to tools
    pub async fn execute_with_context(
        &self,
        id: &str,
        context: &ToolContext,
        variables: HashMap<String, Value>,
    ) -> Result<ExecutionResult, RecipeError> {
        let recipe = self
            .get(id)
            .await?
            .ok_or_else(|| RecipeError::not_found(id))?;

        Ok(self.executor.execute(&recipe, context, variables).await)
    }
}

/// Validate recipe steps
///
/// Empty recipes are legal; step identifiers must be unique and steps must
/// name a tool. Tool names are deliberately not resolved here (late
/// binding).
fn validate_steps(steps: &[RecipeStep]) -> Result<(), RecipeError> {
    let mut seen_ids = HashSet::new();

    for step in steps {
        if step.id().is_empty() {
            return Err(RecipeError::validation("Step ID cannot be empty"));
        }

        if step.tool_name().is_empty() {
            return Err(RecipeError::validation(format!(
                "Step '{}' must name a tool",
                step.id()
            )));
        }

        if !seen_ids.insert(step.id()) {
            return Err(RecipeError::validation(format!(
                "Duplicate step ID: '{}'",
                step.id()
            )));
        }
    }

    Ok(())
}
