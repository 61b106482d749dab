//! Recipe executor implementation
//!
//! A sequential, cooperative interpreter: step N+1 never begins before step
//! N's outcome is recorded, which is what makes `step_<id>_result` bindings
//! sound. The only suspension point is the tool invocation itself.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;

use crate::domain::recipe::condition;
use crate::domain::{
    ExecutionLog, ExecutionResult, ExecutionStatus, OnErrorPolicy, Recipe, RecipeExecutor,
    RecipeStep, StepErrorDetail, StepOutcome, ToolContext, ToolError, ToolRegistry,
    VariableContext,
};

/// Recipe executor implementation
#[derive(Debug)]
pub struct RecipeExecutorImpl {
    /// Registry the steps' tool names are resolved against
    tools: Arc<dyn ToolRegistry>,

    /// Sealed logs of every run, oldest first
    history: RwLock<Vec<ExecutionLog>>,
}

impl RecipeExecutorImpl {
    /// Create a new executor over the given tool registry
    pub fn new(tools: Arc<dyn ToolRegistry>) -> Self {
        Self {
            tools,
            history: RwLock::new(Vec::new()),
        }
    }

    /// Dispatch one step invocation through the registry
    async fn invoke_step(
        &self,
        step: &RecipeStep,
        context: &ToolContext,
        parameters: HashMap<String, Value>,
    ) -> Result<Value, ToolError> {
        self.tools
            .invoke(step.tool_name(), context, parameters)
            .await
    }

    async fn push_history(&self, log: ExecutionLog) {
        self.history.write().await.push(log);
    }
}

#[async_trait]
impl RecipeExecutor for RecipeExecutorImpl {
    async fn execute(
        &self,
        recipe: &Recipe,
        context: &ToolContext,
        variables: HashMap<String, Value>,
    ) -> ExecutionResult {
        let mut variables = VariableContext::new(variables);
        let mut log = ExecutionLog::open(recipe);

        debug!(
            recipe_id = %recipe.id(),
            execution_id = %log.id(),
            steps = recipe.step_count(),
            "executing recipe"
        );

        for step in recipe.steps() {
            // Conditions gate individual steps; a false condition never
            // halts the run, regardless of the step's error policy.
            if !condition::should_run(step.condition(), &variables, log.steps()) {
                let reason =
                    format!("Condition not met: {}", step.condition().unwrap_or_default());
                debug!(step_id = step.id(), %reason, "skipping step");
                log.record(StepOutcome::skipped(step.id(), step.tool_name(), reason));
                continue;
            }

            let parameters = variables.resolve_parameters(step.parameters());
            let started = Instant::now();

            match self
                .invoke_step(step, context, parameters.clone())
                .await
            {
                Ok(result) => {
                    variables.bind_step_result(step.id(), result.clone());
                    log.record(StepOutcome::success(
                        step.id(),
                        step.tool_name(),
                        result,
                        started.elapsed().as_millis() as u64,
                    ));
                }
                Err(error) => {
                    let detail = StepErrorDetail::from(&error);
                    log.record(StepOutcome::error(
                        step.id(),
                        step.tool_name(),
                        detail.clone(),
                        started.elapsed().as_millis() as u64,
                    ));

                    match step.on_error() {
                        OnErrorPolicy::Stop => {
                            debug!(step_id = step.id(), error = %detail, "halting run");
                            log.seal(ExecutionStatus::Failed);

                            let execution_id = log.id().clone();
                            let results = log.steps().to_vec();
                            self.push_history(log).await;

                            return ExecutionResult::Failed {
                                execution_id,
                                results,
                                error: detail,
                            };
                        }
                        OnErrorPolicy::Continue => {
                            debug!(step_id = step.id(), error = %detail, "continuing past failed step");
                        }
                        OnErrorPolicy::Retry => {
                            // Single-shot best effort with the same
                            // substituted parameters, not a backoff loop.
                            debug!(step_id = step.id(), "retrying failed step");
                            let retry_started = Instant::now();

                            match self.invoke_step(step, context, parameters).await {
                                Ok(result) => {
                                    variables.bind_step_result(step.id(), result.clone());
                                    log.record(StepOutcome::success(
                                        step.id(),
                                        step.tool_name(),
                                        result,
                                        retry_started.elapsed().as_millis() as u64,
                                    ));
                                }
                                Err(retry_error) => {
                                    debug!(
                                        step_id = step.id(),
                                        error = %retry_error,
                                        "retry failed, continuing"
                                    );
                                }
                            }
                        }
                    }
                }
            }
        }

        log.seal(ExecutionStatus::Completed);

        let execution_id = log.id().clone();
        let results = log.steps().to_vec();
        self.push_history(log).await;

        ExecutionResult::Completed {
            execution_id,
            results,
        }
    }

    async fn history(&self) -> Vec<ExecutionLog> {
        self.history.read().await.clone()
    }
}
