//! Execution log entities and run results

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::entity::{Recipe, RecipeId};
use crate::domain::tool::ToolError;

/// Unique identifier for a single recipe run
///
/// Fresh per invocation, even when the same recipe is run repeatedly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExecutionId(String);

impl ExecutionId {
    /// Generate a fresh execution ID
    pub fn generate() -> Self {
        Self(format!("exec-{}", Uuid::new_v4()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ExecutionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of step-level failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepErrorKind {
    /// The step's tool name did not resolve against the registry
    ToolNotFound,

    /// The tool ran and failed
    ExecutionFailed,
}

impl StepErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepErrorKind::ToolNotFound => "tool_not_found",
            StepErrorKind::ExecutionFailed => "execution_failed",
        }
    }
}

impl std::fmt::Display for StepErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Structured detail of a step failure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepErrorDetail {
    /// Failure classification
    pub kind: StepErrorKind,

    /// Human-readable failure message
    pub message: String,
}

impl StepErrorDetail {
    pub fn new(kind: StepErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl From<&ToolError> for StepErrorDetail {
    fn from(error: &ToolError) -> Self {
        let kind = match error {
            ToolError::NotFound(_) => StepErrorKind::ToolNotFound,
            ToolError::Execution { .. } => StepErrorKind::ExecutionFailed,
        };
        Self::new(kind, error.to_string())
    }
}

impl std::fmt::Display for StepErrorDetail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Recorded outcome of one step within a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepOutcome {
    /// The step ran and its tool returned a value
    Success {
        step_id: String,
        tool_name: String,
        result: Value,
        duration_ms: u64,
    },

    /// The step's condition evaluated to false; the run was not halted
    Skipped {
        step_id: String,
        tool_name: String,
        reason: String,
    },

    /// The step's tool was absent or failed
    Error {
        step_id: String,
        tool_name: String,
        error: StepErrorDetail,
        duration_ms: u64,
    },
}

impl StepOutcome {
    pub fn success(
        step_id: impl Into<String>,
        tool_name: impl Into<String>,
        result: Value,
        duration_ms: u64,
    ) -> Self {
        Self::Success {
            step_id: step_id.into(),
            tool_name: tool_name.into(),
            result,
            duration_ms,
        }
    }

    pub fn skipped(
        step_id: impl Into<String>,
        tool_name: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Skipped {
            step_id: step_id.into(),
            tool_name: tool_name.into(),
            reason: reason.into(),
        }
    }

    pub fn error(
        step_id: impl Into<String>,
        tool_name: impl Into<String>,
        error: StepErrorDetail,
        duration_ms: u64,
    ) -> Self {
        Self::Error {
            step_id: step_id.into(),
            tool_name: tool_name.into(),
            error,
            duration_ms,
        }
    }

    pub fn step_id(&self) -> &str {
        match self {
            Self::Success { step_id, .. }
            | Self::Skipped { step_id, .. }
            | Self::Error { step_id, .. } => step_id,
        }
    }

    pub fn tool_name(&self) -> &str {
        match self {
            Self::Success { tool_name, .. }
            | Self::Skipped { tool_name, .. }
            | Self::Error { tool_name, .. } => tool_name,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped { .. })
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }

    /// The recorded result value, for success outcomes
    pub fn result(&self) -> Option<&Value> {
        match self {
            Self::Success { result, .. } => Some(result),
            _ => None,
        }
    }

    /// The recorded failure detail, for error outcomes
    pub fn error_detail(&self) -> Option<&StepErrorDetail> {
        match self {
            Self::Error { error, .. } => Some(error),
            _ => None,
        }
    }
}

/// Overall status of a recipe run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    Running,
    Completed,
    Failed,
}

impl ExecutionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionStatus::Running => "running",
            ExecutionStatus::Completed => "completed",
            ExecutionStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ExecutionStatus::Completed | ExecutionStatus::Failed)
    }
}

impl std::fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Append-only record of one recipe run
///
/// Opened when the run starts, appended to as steps complete, sealed when
/// the run ends. Retained by the executor's in-memory history; a host may
/// persist it externally.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionLog {
    id: ExecutionId,
    recipe_id: RecipeId,
    recipe_name: String,
    status: ExecutionStatus,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    steps: Vec<StepOutcome>,
}

impl ExecutionLog {
    /// Open a log for a fresh run of the given recipe
    pub fn open(recipe: &Recipe) -> Self {
        Self {
            id: ExecutionId::generate(),
            recipe_id: recipe.id().clone(),
            recipe_name: recipe.name().to_string(),
            status: ExecutionStatus::Running,
            started_at: Utc::now(),
            completed_at: None,
            steps: Vec::new(),
        }
    }

    /// Append a step outcome
    pub fn record(&mut self, outcome: StepOutcome) {
        self.steps.push(outcome);
    }

    /// Seal the log with a terminal status
    pub fn seal(&mut self, status: ExecutionStatus) {
        self.status = status;
        self.completed_at = Some(Utc::now());
    }

    // Getters

    pub fn id(&self) -> &ExecutionId {
        &self.id
    }

    pub fn recipe_id(&self) -> &RecipeId {
        &self.recipe_id
    }

    pub fn recipe_name(&self) -> &str {
        &self.recipe_name
    }

    pub fn status(&self) -> ExecutionStatus {
        self.status
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    pub fn steps(&self) -> &[StepOutcome] {
        &self.steps
    }

    /// Total elapsed milliseconds, once sealed
    pub fn elapsed_ms(&self) -> Option<i64> {
        self.completed_at
            .map(|end| (end - self.started_at).num_milliseconds())
    }
}

/// Result of one recipe run, as returned to the caller
///
/// Step-level failures are contained inside `results`; this type is a data
/// value, never an error crossing the executor boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ExecutionResult {
    /// Every step was processed; individual steps may still have error
    /// outcomes under the `continue`/`retry` policies
    Completed {
        execution_id: ExecutionId,
        results: Vec<StepOutcome>,
    },

    /// A step with the `stop` policy failed; later steps never ran
    Failed {
        execution_id: ExecutionId,
        results: Vec<StepOutcome>,
        error: StepErrorDetail,
    },
}

impl ExecutionResult {
    pub fn execution_id(&self) -> &ExecutionId {
        match self {
            Self::Completed { execution_id, .. } | Self::Failed { execution_id, .. } => {
                execution_id
            }
        }
    }

    /// Ordered per-step outcomes, mirroring the execution log
    pub fn results(&self) -> &[StepOutcome] {
        match self {
            Self::Completed { results, .. } | Self::Failed { results, .. } => results,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }

    /// The triggering error, for failed runs
    pub fn error(&self) -> Option<&StepErrorDetail> {
        match self {
            Self::Failed { error, .. } => Some(error),
            Self::Completed { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::recipe::entity::RecipeStep;
    use serde_json::json;

    fn test_recipe() -> Recipe {
        Recipe::new(RecipeId::new("log-test").unwrap(), "Log Test")
            .with_step(RecipeStep::new("s1", "noop"))
    }

    #[test]
    fn test_execution_id_unique() {
        assert_ne!(ExecutionId::generate(), ExecutionId::generate());
        assert!(ExecutionId::generate().as_str().starts_with("exec-"));
    }

    #[test]
    fn test_status_string_forms() {
        assert_eq!(ExecutionStatus::Completed.as_str(), "completed");
        assert_eq!(ExecutionStatus::Failed.to_string(), "failed");
        assert!(!ExecutionStatus::Running.is_terminal());

        assert_eq!(StepErrorKind::ToolNotFound.to_string(), "tool_not_found");
        assert_eq!(StepErrorKind::ExecutionFailed.as_str(), "execution_failed");
    }

    #[test]
    fn test_log_open_record_seal() {
        let recipe = test_recipe();
        let mut log = ExecutionLog::open(&recipe);

        assert_eq!(log.status(), ExecutionStatus::Running);
        assert!(log.completed_at().is_none());
        assert_eq!(log.recipe_id(), recipe.id());
        assert_eq!(log.recipe_name(), "Log Test");

        log.record(StepOutcome::success("s1", "noop", json!(1), 5));
        log.seal(ExecutionStatus::Completed);

        assert_eq!(log.status(), ExecutionStatus::Completed);
        assert!(log.status().is_terminal());
        assert!(log.completed_at().unwrap() >= log.started_at());
        assert!(log.elapsed_ms().is_some());
        assert_eq!(log.steps().len(), 1);
    }

    #[test]
    fn test_step_outcome_accessors() {
        let success = StepOutcome::success("s1", "noop", json!({"ok": true}), 12);
        assert!(success.is_success());
        assert_eq!(success.step_id(), "s1");
        assert_eq!(success.tool_name(), "noop");
        assert_eq!(success.result(), Some(&json!({"ok": true})));

        let skipped = StepOutcome::skipped("s2", "noop", "Condition not met: previous_success");
        assert!(skipped.is_skipped());
        assert!(skipped.result().is_none());

        let error = StepOutcome::error(
            "s3",
            "noop",
            StepErrorDetail::new(StepErrorKind::ToolNotFound, "Tool not found: noop"),
            3,
        );
        assert!(error.is_error());
        assert_eq!(
            error.error_detail().unwrap().kind,
            StepErrorKind::ToolNotFound
        );
    }

    #[test]
    fn test_step_outcome_serialization_tag() {
        let outcome = StepOutcome::success("s1", "noop", json!(42), 1);
        let value = serde_json::to_value(&outcome).unwrap();

        assert_eq!(value["status"], json!("success"));
        assert_eq!(value["step_id"], json!("s1"));
        assert_eq!(value["result"], json!(42));

        let round_trip: StepOutcome = serde_json::from_value(value).unwrap();
        assert_eq!(round_trip, outcome);
    }

    #[test]
    fn test_error_detail_from_tool_error() {
        let detail = StepErrorDetail::from(&ToolError::not_found("fetch"));
        assert_eq!(detail.kind, StepErrorKind::ToolNotFound);
        assert_eq!(detail.message, "Tool not found: fetch");

        let detail = StepErrorDetail::from(&ToolError::execution("fetch", "timeout"));
        assert_eq!(detail.kind, StepErrorKind::ExecutionFailed);
    }

    #[test]
    fn test_execution_result_accessors() {
        let id = ExecutionId::generate();
        let completed = ExecutionResult::Completed {
            execution_id: id.clone(),
            results: vec![StepOutcome::success("s1", "noop", json!(1), 1)],
        };

        assert!(completed.is_completed());
        assert_eq!(completed.execution_id(), &id);
        assert_eq!(completed.results().len(), 1);
        assert!(completed.error().is_none());

        let failed = ExecutionResult::Failed {
            execution_id: ExecutionId::generate(),
            results: vec![],
            error: StepErrorDetail::new(StepErrorKind::ExecutionFailed, "boom"),
        };

        assert!(!failed.is_completed());
        assert_eq!(failed.error().unwrap().message, "boom");
    }

    #[test]
    fn test_execution_result_serialization() {
        let result = ExecutionResult::Failed {
            execution_id: ExecutionId::generate(),
            results: vec![],
            error: StepErrorDetail::new(StepErrorKind::ExecutionFailed, "boom"),
        };

        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["status"], json!("failed"));
        assert_eq!(value["error"]["kind"], json!("execution_failed"));
    }
}
