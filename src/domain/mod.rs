//! Domain layer - Core business logic and entities

pub mod error;
pub mod recipe;
pub mod storage;
pub mod tool;

pub use error::DomainError;
pub use recipe::{
    ExecutionId, ExecutionLog, ExecutionResult, ExecutionStatus, OnErrorPolicy, Recipe,
    RecipeError, RecipeExecutor, RecipeId, RecipeStep, StepErrorDetail, StepErrorKind, StepOutcome,
    VariableContext,
};
pub use storage::{Storage, StorageEntity, StorageKey};
pub use tool::{Tool, ToolContext, ToolError, ToolRegistry};
