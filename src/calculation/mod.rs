//! The calculation pipeline: attendance, the per-employee orchestrator,
//! and the batch runner.

pub mod attendance;
pub mod batch;
pub mod orchestrator;

pub use attendance::attendance_factor;
pub use batch::{calculate_batch, BatchFailure, BatchOutcome};
pub use orchestrator::{calculate, validate_template, CalculationInput};
