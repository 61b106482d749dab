//! Step condition evaluation
//!
//! The condition vocabulary is deliberately minimal. The only recognized
//! token is `previous_success`; any other text evaluates to true so that an
//! unknown condition never silently aborts a workflow. Evaluation never
//! fails - condition problems are not errors.

use tracing::warn;

use super::context::VariableContext;
use super::execution::StepOutcome;

/// The only condition token in the base vocabulary
pub const PREVIOUS_SUCCESS: &str = "previous_success";

/// Decide whether a step should run
///
/// A step with no condition always runs. `previous_success` is vacuously
/// true when no step has run yet, otherwise true iff the immediately
/// preceding outcome is a success. Unrecognized condition text falls back to
/// true, with a warning so typos stay visible.
pub fn should_run(
    condition: Option<&str>,
    _context: &VariableContext,
    outcomes: &[StepOutcome],
) -> bool {
    let Some(condition) = condition else {
        return true;
    };

    match condition {
        PREVIOUS_SUCCESS => match outcomes.last() {
            Some(previous) => previous.is_success(),
            None => true,
        },
        other => {
            warn!(condition = other, "unrecognized step condition, running step");
            true
        }
    }
}
