//! Recipe domain - workflow definitions, execution state, and results

pub mod condition;
pub mod context;
pub mod entity;
pub mod error;
pub mod execution;
pub mod executor;

pub use context::VariableContext;
pub use entity::{validate_recipe_id, OnErrorPolicy, Recipe, RecipeId, RecipeStep};
pub use error::RecipeError;
pub use execution::{
    ExecutionId, ExecutionLog, ExecutionResult, ExecutionStatus, StepErrorDetail, StepErrorKind,
    StepOutcome,
};
pub use executor::RecipeExecutor;
