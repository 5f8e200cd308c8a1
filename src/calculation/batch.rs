//! Batch calculation over many employees.
//!
//! One employee's failure is isolated: the batch continues and the outcome
//! carries a per-employee error list for final reporting, so a single
//! broken formula never blocks a whole payroll run.

use tracing::{error, info};

use crate::error::{EngineError, EngineResult};
use crate::models::{Breakdown, Template};

use super::orchestrator::{calculate, CalculationInput};

/// One employee's failure within a batch.
#[derive(Debug)]
pub struct BatchFailure {
    /// The employee whose calculation failed.
    pub employee_id: String,
    /// The error that aborted that employee's run.
    pub error: EngineError,
}

/// The collected result of a batch run.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    /// Successful breakdowns, in input order.
    pub breakdowns: Vec<Breakdown>,
    /// Per-employee failures, in input order.
    pub failures: Vec<BatchFailure>,
}

impl BatchOutcome {
    /// Returns true when every employee in the batch succeeded.
    pub fn is_fully_successful(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Calculates a whole batch of employees against one template.
///
/// The template is validated once up front; a structurally invalid template
/// fails the batch as a whole rather than producing one identical failure
/// per employee.
///
/// # Errors
///
/// Returns [`EngineError::InvalidTemplate`] if the template itself is
/// invalid. Per-employee evaluation errors never propagate; they are
/// collected into the outcome's failure list.
pub fn calculate_batch(
    template: &Template,
    inputs: &[CalculationInput],
) -> EngineResult<BatchOutcome> {
    template.validate()?;

    let mut outcome = BatchOutcome::default();
    for input in inputs {
        match calculate(template, input) {
            Ok(breakdown) => outcome.breakdowns.push(breakdown),
            Err(err) => {
                error!(
                    employee_id = %input.employee_id,
                    error = %err,
                    "calculation failed, continuing batch"
                );
                outcome.failures.push(BatchFailure {
                    employee_id: input.employee_id.clone(),
                    error: err,
                });
            }
        }
    }

    info!(
        template = %template.name,
        succeeded = outcome.breakdowns.len(),
        failed = outcome.failures.len(),
        "batch complete"
    );
    Ok(outcome)
}
