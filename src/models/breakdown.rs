//! Calculation output models.
//!
//! A [`Breakdown`] is the full audit record of one employee's calculation:
//! every component's evaluated amount with its source formula, the derived
//! aggregates, the applied attendance factor, and any warnings raised along
//! the way. Breakdowns are created fresh per run and never mutated by the
//! engine afterwards.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Warning code raised when the attendance factor falls below the
/// template's minimum.
pub const MINIMUM_ATTENDANCE_BREACH: &str = "minimum_attendance_breach";

/// One evaluated component.
///
/// Produced both by real calculation runs (where `validation_issues` is
/// always empty, a failing component aborts the run instead) and by the
/// advisory dry run, which records issues per component rather than
/// aborting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentResult {
    /// The component name, as declared in the template.
    pub name: String,
    /// The formula text the value was computed from, for auditability.
    /// `None` for identity components whose value came from the input seed.
    pub formula_text: Option<String>,
    /// The evaluated per-period amount, rounded to two decimal places.
    pub evaluated_value: f64,
    /// Diagnostics collected during an advisory dry run.
    pub validation_issues: Vec<String>,
}

/// Severity of a [`CalculationWarning`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningSeverity {
    /// The calculation succeeded; a human should review the flagged run.
    Advisory,
}

/// A non-fatal condition noticed during a calculation.
///
/// Warnings never change amounts; they travel with the breakdown so payroll
/// staff can review flagged runs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalculationWarning {
    /// Stable machine-readable code, e.g. [`MINIMUM_ATTENDANCE_BREACH`].
    pub code: String,
    /// Human-readable description of the condition.
    pub message: String,
    /// How serious the condition is.
    pub severity: WarningSeverity,
}

/// The complete result of one employee's payroll calculation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Breakdown {
    /// Unique identifier for this calculation run.
    pub calculation_id: Uuid,
    /// The employee the calculation was run for.
    pub employee_id: String,
    /// The template the calculation was run against.
    pub template_id: Uuid,
    /// The template's human-readable name at run time.
    pub template_name: String,
    /// The template version used.
    pub template_version: u32,
    /// Salary component results, in evaluation order.
    pub salary_components: Vec<ComponentResult>,
    /// Allowance component results, in evaluation order.
    pub allowance_components: Vec<ComponentResult>,
    /// Deduction component results, in evaluation order.
    pub deduction_components: Vec<ComponentResult>,
    /// Statutory component results, in evaluation order.
    pub statutory_components: Vec<ComponentResult>,
    /// Sum of salary and allowance amounts (prorated when proration applies).
    pub gross_salary: f64,
    /// Sum of deduction and statutory amounts.
    pub total_deductions: f64,
    /// Gross minus deductions, after proration and final rounding.
    pub net_salary: f64,
    /// The applied attendance factor, rounded to four decimal places.
    pub attendance_factor: f64,
    /// Warnings raised during the run.
    pub warnings: Vec<CalculationWarning>,
    /// When the calculation was performed.
    pub calculated_at: DateTime<Utc>,
}

impl Breakdown {
    /// Returns the result for a named component, searching every category.
    ///
    /// Lookup is case-insensitive, matching the formula language's
    /// treatment of identifiers.
    pub fn component(&self, name: &str) -> Option<&ComponentResult> {
        self.salary_components
            .iter()
            .chain(self.allowance_components.iter())
            .chain(self.deduction_components.iter())
            .chain(self.statutory_components.iter())
            .find(|result| result.name.eq_ignore_ascii_case(name))
    }

    /// Returns true if any warning with the given code was raised.
    pub fn has_warning(&self, code: &str) -> bool {
        self.warnings.iter().any(|warning| warning.code == code)
    }
}
