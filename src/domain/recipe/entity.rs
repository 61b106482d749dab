//! Recipe domain entities

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::error::RecipeError;
use crate::domain::storage::{StorageEntity, StorageKey};

/// Maximum length for recipe IDs
pub const MAX_ID_LENGTH: usize = 64;

/// Regex pattern for valid recipe IDs: alphanumeric and hyphens
static ID_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9][a-zA-Z0-9-]*[a-zA-Z0-9]$|^[a-zA-Z0-9]$").unwrap());

/// Validated recipe identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RecipeId(String);

impl RecipeId {
    /// Create a new validated recipe ID
    pub fn new(id: impl Into<String>) -> Result<Self, RecipeError> {
        let id = id.into();
        validate_recipe_id(&id)?;
        Ok(Self(id))
    }

    /// Generate a fresh unique recipe ID
    pub fn generate() -> Self {
        Self(format!("recipe-{}", Uuid::new_v4()))
    }

    /// Get the ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for RecipeId {
    type Error = RecipeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RecipeId> for String {
    fn from(id: RecipeId) -> Self {
        id.0
    }
}

impl fmt::Display for RecipeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for RecipeId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl StorageKey for RecipeId {
    fn as_str(&self) -> &str {
        &self.0
    }
}

/// Validate a recipe ID string
pub fn validate_recipe_id(id: &str) -> Result<(), RecipeError> {
    if id.is_empty() {
        return Err(RecipeError::validation("Recipe ID cannot be empty"));
    }

    if id.len() > MAX_ID_LENGTH {
        return Err(RecipeError::validation(format!(
            "Recipe ID exceeds maximum length of {} characters",
            MAX_ID_LENGTH
        )));
    }

    if !ID_PATTERN.is_match(id) {
        return Err(RecipeError::validation(format!(
            "Invalid recipe ID '{}': must be alphanumeric with hyphens, start and end with alphanumeric",
            id
        )));
    }

    Ok(())
}

/// Policy applied when a step fails
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum OnErrorPolicy {
    /// Halt the run and seal the log as failed
    #[default]
    Stop,

    /// Keep the error outcome and move on to the next step
    Continue,

    /// Re-invoke the step once more, then move on either way
    Retry,
}

/// A single step in a recipe
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecipeStep {
    /// Unique identifier for this step within the recipe
    id: String,

    /// Name of the tool this step invokes, resolved at execution time
    tool_name: String,

    /// Human description of what the step does
    #[serde(default)]
    description: String,

    /// Parameter values; a value that is exactly `${name}` is substituted
    /// from the variable context before dispatch
    #[serde(default)]
    parameters: HashMap<String, Value>,

    /// Optional condition expression deciding whether the step runs
    #[serde(skip_serializing_if = "Option::is_none")]
    condition: Option<String>,

    /// Failure policy for this step
    #[serde(default)]
    on_error: OnErrorPolicy,
}

impl RecipeStep {
    /// Create a new step invoking the named tool
    pub fn new(id: impl Into<String>, tool_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            tool_name: tool_name.into(),
            description: String::new(),
            parameters: HashMap::new(),
            condition: None,
            on_error: OnErrorPolicy::default(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_parameters(mut self, parameters: HashMap<String, Value>) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn with_parameter(mut self, name: impl Into<String>, value: Value) -> Self {
        self.parameters.insert(name.into(), value);
        self
    }

    pub fn with_condition(mut self, condition: impl Into<String>) -> Self {
        self.condition = Some(condition.into());
        self
    }

    pub fn with_on_error(mut self, policy: OnErrorPolicy) -> Self {
        self.on_error = policy;
        self
    }

    // Getters

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn tool_name(&self) -> &str {
        &self.tool_name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn parameters(&self) -> &HashMap<String, Value> {
        &self.parameters
    }

    pub fn condition(&self) -> Option<&str> {
        self.condition.as_deref()
    }

    pub fn on_error(&self) -> OnErrorPolicy {
        self.on_error
    }
}

/// A recipe definition: an ordered, versioned workflow of tool-invoking steps
///
/// Immutable once saved; edits replace the full definition through the
/// store's save operation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Recipe {
    /// Unique recipe identifier
    id: RecipeId,

    /// Human-readable name
    name: String,

    /// What the recipe automates
    #[serde(default)]
    description: String,

    /// Grouping category for listing
    #[serde(default)]
    category: String,

    /// Ordered list of steps; empty recipes are legal and execute trivially
    steps: Vec<RecipeStep>,

    /// Free-form host metadata
    #[serde(default)]
    metadata: HashMap<String, Value>,

    /// When the recipe was created
    created_at: DateTime<Utc>,

    /// When the recipe was last saved
    updated_at: DateTime<Utc>,

    /// Semantic version string
    version: String,

    /// Author attribution
    author: String,

    /// Free-form tag set for filtering
    #[serde(default)]
    tags: Vec<String>,
}

impl Recipe {
    /// Create a new recipe
    pub fn new(id: RecipeId, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            name: name.into(),
            description: String::new(),
            category: String::new(),
            steps: Vec::new(),
            metadata: HashMap::new(),
            created_at: now,
            updated_at: now,
            version: "1.0.0".to_string(),
            author: "user".to_string(),
            tags: Vec::new(),
        }
    }

    // Builder methods

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

    pub fn with_metadata(mut self, metadata: HashMap<String, Value>) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    // Getters

    pub fn id(&self) -> &RecipeId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn steps(&self) -> &[RecipeStep] {
        &self.steps
    }

    pub fn metadata(&self) -> &HashMap<String, Value> {
        &self.metadata
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    /// Get a step by its identifier
    pub fn get_step(&self, id: &str) -> Option<&RecipeStep> {
        self.steps.iter().find(|s| s.id() == id)
    }

    /// Refresh the updated-at timestamp; called on every save
    pub(crate) fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

impl StorageEntity for Recipe {
    type Key = RecipeId;

    fn key(&self) -> &Self::Key {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_recipe_id_valid() {
        assert!(RecipeId::new("my-recipe").is_ok());
        assert!(RecipeId::new("recipe123").is_ok());
        assert!(RecipeId::new("a").is_ok());
    }

    #[test]
    fn test_recipe_id_invalid() {
        assert!(RecipeId::new("").is_err());
        assert!(RecipeId::new("-invalid").is_err());
        assert!(RecipeId::new("invalid-").is_err());
        assert!(RecipeId::new("has spaces").is_err());

        let long_id = "a".repeat(65);
        assert!(RecipeId::new(long_id).is_err());
    }

    #[test]
    fn test_recipe_id_generate_is_unique_and_valid() {
        let first = RecipeId::generate();
        let second = RecipeId::generate();

        assert_ne!(first, second);
        assert!(RecipeId::new(first.as_str()).is_ok());
    }

    #[test]
    fn test_recipe_creation() {
        let recipe = Recipe::new(RecipeId::new("test").unwrap(), "Test Recipe")
            .with_description("A test recipe")
            .with_category("reporting")
            .with_tags(vec!["daily".to_string()]);

        assert_eq!(recipe.id().as_str(), "test");
        assert_eq!(recipe.name(), "Test Recipe");
        assert_eq!(recipe.description(), "A test recipe");
        assert_eq!(recipe.category(), "reporting");
        assert_eq!(recipe.version(), "1.0.0");
        assert_eq!(recipe.author(), "user");
        assert!(recipe.is_empty());
        assert_eq!(recipe.created_at(), recipe.updated_at());
    }

    #[test]
    fn test_recipe_with_steps() {
        let recipe = Recipe::new(RecipeId::new("multi-step").unwrap(), "Multi-Step")
            .with_step(RecipeStep::new("fetch", "http_get"))
            .with_step(RecipeStep::new("transform", "json_extract"));

        assert_eq!(recipe.step_count(), 2);
        assert!(!recipe.is_empty());
        assert!(recipe.get_step("fetch").is_some());
        assert!(recipe.get_step("transform").is_some());
        assert!(recipe.get_step("missing").is_none());
    }

    #[test]
    fn test_step_builder() {
        let step = RecipeStep::new("fetch", "http_get")
            .with_description("Fetch the page")
            .with_parameter("url", json!("${target}"))
            .with_condition("previous_success")
            .with_on_error(OnErrorPolicy::Retry);

        assert_eq!(step.id(), "fetch");
        assert_eq!(step.tool_name(), "http_get");
        assert_eq!(step.description(), "Fetch the page");
        assert_eq!(step.parameters()["url"], json!("${target}"));
        assert_eq!(step.condition(), Some("previous_success"));
        assert_eq!(step.on_error(), OnErrorPolicy::Retry);
    }

    #[test]
    fn test_on_error_policy_default_is_stop() {
        assert_eq!(OnErrorPolicy::default(), OnErrorPolicy::Stop);
        assert_eq!(RecipeStep::new("s", "t").on_error(), OnErrorPolicy::Stop);
    }

    #[test]
    fn test_on_error_policy_serialization() {
        assert_eq!(
            serde_json::to_string(&OnErrorPolicy::Continue).unwrap(),
            "\"continue\""
        );

        let policy: OnErrorPolicy = serde_json::from_str("\"retry\"").unwrap();
        assert_eq!(policy, OnErrorPolicy::Retry);
    }

    #[test]
    fn test_touch_updates_timestamp() {
        let mut recipe = Recipe::new(RecipeId::new("touched").unwrap(), "Touched");
        let original = recipe.updated_at();

        std::thread::sleep(std::time::Duration::from_millis(10));
        recipe.touch();

        assert!(recipe.updated_at() > original);
        assert_eq!(recipe.created_at(), original);
    }

    #[test]
    fn test_recipe_round_trip() {
        let recipe = Recipe::new(RecipeId::new("round-trip").unwrap(), "Round Trip")
            .with_description("Serialization fidelity check")
            .with_category("etl")
            .with_version("1.1.0")
            .with_author("qa")
            .with_metadata(HashMap::from([("source".to_string(), json!("import"))]))
            .with_tags(vec!["etl".to_string(), "nightly".to_string()])
            .with_step(
                RecipeStep::new("fetch", "http_get")
                    .with_parameter("url", json!("${target}"))
                    .with_on_error(OnErrorPolicy::Retry),
            )
            .with_step(
                RecipeStep::new("transform", "json_extract")
                    .with_parameter("input", json!("${step_fetch_result}"))
                    .with_condition("previous_success"),
            );

        let json = serde_json::to_string_pretty(&recipe).unwrap();
        let deserialized: Recipe = serde_json::from_str(&json).unwrap();

        assert_eq!(deserialized, recipe);
        assert_eq!(deserialized.metadata()["source"], json!("import"));
    }

    #[test]
    fn test_recipe_wire_fields() {
        let recipe = Recipe::new(RecipeId::new("wire").unwrap(), "Wire")
            .with_step(RecipeStep::new("s1", "noop"));

        let value = serde_json::to_value(&recipe).unwrap();
        for field in [
            "id",
            "name",
            "description",
            "category",
            "steps",
            "metadata",
            "created_at",
            "updated_at",
            "version",
            "author",
            "tags",
        ] {
            assert!(value.get(field).is_some(), "missing field {}", field);
        }

        let step = &value["steps"][0];
        for field in ["id", "tool_name", "description", "parameters", "on_error"] {
            assert!(step.get(field).is_some(), "missing step field {}", field);
        }
    }
}
