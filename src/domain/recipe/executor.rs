//! Recipe executor trait

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;

use super::entity::Recipe;
use super::execution::{ExecutionLog, ExecutionResult};
use crate::domain::tool::ToolContext;

/// Trait for recipe execution
///
/// Steps run strictly sequentially; the only suspension point is the tool
/// invocation itself. Step-level failures never surface as errors here -
/// they are reported as structured outcomes inside the returned
/// [`ExecutionResult`], including under the `stop` policy, which ends the
/// run early but still returns a `Failed` value rather than an `Err`.
#[async_trait]
pub trait RecipeExecutor: Send + Sync + std::fmt::Debug {
    /// Run a recipe with the given input variables
    ///
    /// `context` is an opaque execution-scoped handle passed through
    /// unchanged to every tool in the run. Each invocation gets a fresh
    /// execution identifier and an independent variable context.
    async fn execute(
        &self,
        recipe: &Recipe,
        context: &ToolContext,
        variables: HashMap<String, Value>,
    ) -> ExecutionResult;

    /// Sealed logs of every run this executor has performed, oldest first
    async fn history(&self) -> Vec<ExecutionLog>;
}
