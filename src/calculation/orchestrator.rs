//! The calculation orchestrator.
//!
//! Drives one employee's payroll run as a fixed pipeline over a template:
//! seed the variable context, evaluate each category in the template's
//! declared order, derive `gross_salary` and `total_deductions`, apply
//! attendance proration, raise the minimum-attendance advisory, and round
//! every currency figure to two decimal places.

use std::collections::HashSet;

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::formula;
use crate::formula::round_half_away_from_zero;
use crate::models::{
    Breakdown, CalculationWarning, Component, ComponentCategory, ComponentResult,
    ComponentRule, Template, VariableContext, WarningSeverity,
    MINIMUM_ATTENDANCE_BREACH,
};

use super::attendance::attendance_factor;

/// Caller-supplied inputs for one employee's calculation run.
#[derive(Debug, Clone, PartialEq)]
pub struct CalculationInput {
    /// The employee identifier, carried through to the breakdown.
    pub employee_id: String,
    /// The employee's per-period basic salary.
    pub basic_salary: f64,
    /// Days the employee was present in the period.
    pub attendance_days: f64,
    /// Total days in the period, measured per the template's
    /// attendance method.
    pub total_working_days: f64,
    /// Additional variables the caller already knows (e.g. grade
    /// allowances fetched from storage). Reserved seed names are
    /// overridden by the engine.
    pub extra_variables: Vec<(String, f64)>,
}

impl CalculationInput {
    /// Builds an input with full attendance and no extra variables.
    pub fn new(
        employee_id: impl Into<String>,
        basic_salary: f64,
        attendance_days: f64,
        total_working_days: f64,
    ) -> Self {
        Self {
            employee_id: employee_id.into(),
            basic_salary,
            attendance_days,
            total_working_days,
            extra_variables: Vec::new(),
        }
    }

    /// Adds a caller-known variable to the seed context.
    pub fn with_variable(mut self, name: impl Into<String>, value: f64) -> Self {
        self.extra_variables.push((name.into(), value));
        self
    }
}

/// Runs one employee's full payroll calculation against a template.
///
/// Categories are evaluated in `rules.category_order`; each component's
/// value is stored back into the variable context under the component name,
/// so later components can reference earlier results. `gross_salary` is
/// injected as soon as both the Salary and Allowance categories have
/// completed, before any later category runs; a category with no
/// components counts as completed even when the order omits it.
///
/// # Errors
///
/// Returns [`EngineError::InvalidTemplate`] or
/// [`EngineError::InvalidAttendance`] for bad inputs, and
/// [`EngineError::ComponentFailed`] wrapping the offending component name
/// and formula when any component's evaluation fails. No partial breakdown
/// is ever returned.
///
/// # Example
///
/// ```
/// use payroll_engine::calculation::{calculate, CalculationInput};
/// use payroll_engine::models::{Component, ComponentCategory, Template};
///
/// let template = Template::new(
///     "Grade A",
///     1,
///     vec![
///         Component::from_formula_text(
///             "basic_salary",
///             ComponentCategory::Salary,
///             None,
///             "Basic Salary",
///         ).unwrap(),
///         Component::from_formula_text(
///             "housing",
///             ComponentCategory::Allowance,
///             Some("basic_salary * 20%"),
///             "Housing Allowance",
///         ).unwrap(),
///     ],
///     Default::default(),
/// ).unwrap();
///
/// let input = CalculationInput::new("EMP-001", 100_000.0, 22.0, 22.0);
/// let breakdown = calculate(&template, &input).unwrap();
/// assert_eq!(breakdown.gross_salary, 120_000.0);
/// ```
pub fn calculate(template: &Template, input: &CalculationInput) -> EngineResult<Breakdown> {
    template.validate()?;
    let factor = attendance_factor(input.attendance_days, input.total_working_days)?;

    debug!(
        employee_id = %input.employee_id,
        template = %template.name,
        attendance_factor = factor,
        "starting calculation"
    );

    let mut context = seed_context(template, input, factor)?;

    let mut results: Vec<(ComponentCategory, ComponentResult)> = Vec::new();
    // A category with no components may legally be left out of the order,
    // so it counts as completed from the start.
    let mut completed = initially_completed(template);
    let mut gross_injected = false;
    inject_gross_when_ready(&mut context, &results, &completed, &mut gross_injected)?;

    for &category in &template.rules.category_order {
        for component in template.components(category) {
            let value = evaluate_component(component, input, template, &context)?;
            let rounded = round_half_away_from_zero(value, 2);
            store_result(&mut context, component, rounded)?;
            results.push((
                category,
                ComponentResult {
                    name: component.name.clone(),
                    formula_text: component.formula_text().map(str::to_string),
                    evaluated_value: rounded,
                    validation_issues: Vec::new(),
                },
            ));
        }
        completed.insert(category);
        inject_gross_when_ready(&mut context, &results, &completed, &mut gross_injected)?;
    }

    let mut gross_salary = category_sum(&results, ComponentCategory::Salary)
        + category_sum(&results, ComponentCategory::Allowance);
    let total_deductions = category_sum(&results, ComponentCategory::Deduction)
        + category_sum(&results, ComponentCategory::Statutory);
    let mut net_salary = gross_salary - total_deductions;

    // Proration is an orchestrator-level transform, never a formula, so it
    // applies uniformly regardless of what individual formulas do.
    if template.rules.prorate_salary && factor < 1.0 {
        for (_, result) in &mut results {
            if result.name.eq_ignore_ascii_case("basic_salary") {
                result.evaluated_value =
                    round_half_away_from_zero(result.evaluated_value * factor, 2);
            }
        }
        gross_salary *= factor;
        net_salary *= factor;
    }

    let mut warnings = Vec::new();
    if factor < template.rules.minimum_attendance_factor {
        let message = format!(
            "attendance factor {factor:.4} below minimum {}",
            template.rules.minimum_attendance_factor
        );
        warn!(employee_id = %input.employee_id, %message, "attendance below minimum");
        warnings.push(CalculationWarning {
            code: MINIMUM_ATTENDANCE_BREACH.to_string(),
            message,
            severity: WarningSeverity::Advisory,
        });
    }

    let breakdown = assemble_breakdown(
        template,
        input,
        results,
        round_half_away_from_zero(gross_salary, 2),
        round_half_away_from_zero(total_deductions, 2),
        round_half_away_from_zero(net_salary, 2),
        round_half_away_from_zero(factor, 4),
        warnings,
    );

    info!(
        employee_id = %input.employee_id,
        template = %template.name,
        net_salary = breakdown.net_salary,
        "calculation complete"
    );
    Ok(breakdown)
}

/// Advisory dry run of a template against sample inputs.
///
/// Unlike [`calculate`], a failing component does not abort the run: its
/// diagnostics are recorded in `validation_issues`, its value is taken as
/// zero, and evaluation continues so every component gets checked in one
/// pass. Used by template-authoring workflows before publishing.
///
/// # Errors
///
/// Returns an error only for a structurally invalid template or
/// inconsistent attendance figures; per-component problems are reported
/// in the result list instead.
pub fn validate_template(
    template: &Template,
    input: &CalculationInput,
) -> EngineResult<Vec<ComponentResult>> {
    template.validate()?;
    let factor = attendance_factor(input.attendance_days, input.total_working_days)?;
    let mut context = seed_context(template, input, factor)?;

    let mut results: Vec<(ComponentCategory, ComponentResult)> = Vec::new();
    let mut completed = initially_completed(template);
    let mut gross_injected = false;
    inject_gross_when_ready(&mut context, &results, &completed, &mut gross_injected)?;

    for &category in &template.rules.category_order {
        for component in template.components(category) {
            let (value, issues) = match &component.rule {
                ComponentRule::Formula(formula_rule) => {
                    let issues = formula::validate_formula(formula_rule.as_str(), &context);
                    if issues.is_empty() {
                        match formula::evaluate(formula_rule.as_str(), &context) {
                            Ok(value) => (round_half_away_from_zero(value, 2), Vec::new()),
                            Err(error) => (0.0, vec![error.to_string()]),
                        }
                    } else {
                        (0.0, issues)
                    }
                }
                ComponentRule::Identity => (input.basic_salary, Vec::new()),
                ComponentRule::FixedAmount(annual) => (
                    round_half_away_from_zero(
                        annual / template.rules.annual_division_factor,
                        2,
                    ),
                    Vec::new(),
                ),
            };
            store_result(&mut context, component, value)?;
            results.push((
                category,
                ComponentResult {
                    name: component.name.clone(),
                    formula_text: component.formula_text().map(str::to_string),
                    evaluated_value: value,
                    validation_issues: issues,
                },
            ));
        }
        completed.insert(category);
        inject_gross_when_ready(&mut context, &results, &completed, &mut gross_injected)?;
    }

    Ok(results.into_iter().map(|(_, result)| result).collect())
}

/// Categories with no components never appear in the evaluation loop, so
/// they are complete before it starts.
fn initially_completed(template: &Template) -> HashSet<ComponentCategory> {
    ComponentCategory::DEFAULT_ORDER
        .iter()
        .copied()
        .filter(|&category| template.components(category).is_empty())
        .collect()
}

/// Injects `gross_salary` into the context once both contributing
/// categories (Salary and Allowance) have finished, whether by evaluation
/// or by being empty. Injects at most once per run.
fn inject_gross_when_ready(
    context: &mut VariableContext,
    results: &[(ComponentCategory, ComponentResult)],
    completed: &HashSet<ComponentCategory>,
    gross_injected: &mut bool,
) -> EngineResult<()> {
    if !*gross_injected
        && completed.contains(&ComponentCategory::Salary)
        && completed.contains(&ComponentCategory::Allowance)
    {
        let gross = category_sum(results, ComponentCategory::Salary)
            + category_sum(results, ComponentCategory::Allowance);
        context.insert("gross_salary", gross)?;
        *gross_injected = true;
    }
    Ok(())
}

fn seed_context(
    template: &Template,
    input: &CalculationInput,
    factor: f64,
) -> EngineResult<VariableContext> {
    let mut context = VariableContext::new();
    for (name, value) in &input.extra_variables {
        context.insert(name, *value)?;
    }
    // Engine-owned seeds win over caller extras of the same name.
    context.insert("basic_salary", input.basic_salary)?;
    context.insert("attendance_days", input.attendance_days)?;
    context.insert("total_working_days", input.total_working_days)?;
    context.insert(
        "annual_division_factor",
        template.rules.annual_division_factor,
    )?;
    context.insert("attendance_factor", factor)?;
    Ok(context)
}

fn evaluate_component(
    component: &Component,
    input: &CalculationInput,
    template: &Template,
    context: &VariableContext,
) -> EngineResult<f64> {
    match &component.rule {
        ComponentRule::Identity => Ok(input.basic_salary),
        ComponentRule::FixedAmount(annual) => {
            Ok(annual / template.rules.annual_division_factor)
        }
        ComponentRule::Formula(formula_rule) => {
            formula::evaluate(formula_rule.as_str(), context).map_err(|source| {
                EngineError::ComponentFailed {
                    component: component.name.clone(),
                    formula: formula_rule.as_str().to_string(),
                    source: Box::new(source),
                }
            })
        }
    }
}

fn store_result(
    context: &mut VariableContext,
    component: &Component,
    value: f64,
) -> EngineResult<()> {
    context.insert(&component.name, value).map_err(|source| {
        EngineError::ComponentFailed {
            component: component.name.clone(),
            formula: component.formula_text().unwrap_or("").to_string(),
            source: Box::new(source),
        }
    })
}

fn category_sum(
    results: &[(ComponentCategory, ComponentResult)],
    category: ComponentCategory,
) -> f64 {
    results
        .iter()
        .filter(|(c, _)| *c == category)
        .map(|(_, result)| result.evaluated_value)
        .sum()
}

#[allow(clippy::too_many_arguments)]
fn assemble_breakdown(
    template: &Template,
    input: &CalculationInput,
    results: Vec<(ComponentCategory, ComponentResult)>,
    gross_salary: f64,
    total_deductions: f64,
    net_salary: f64,
    attendance_factor: f64,
    warnings: Vec<CalculationWarning>,
) -> Breakdown {
    let mut breakdown = Breakdown {
        calculation_id: Uuid::new_v4(),
        employee_id: input.employee_id.clone(),
        template_id: template.id,
        template_name: template.name.clone(),
        template_version: template.version,
        salary_components: Vec::new(),
        allowance_components: Vec::new(),
        deduction_components: Vec::new(),
        statutory_components: Vec::new(),
        gross_salary,
        total_deductions,
        net_salary,
        attendance_factor,
        warnings,
        calculated_at: Utc::now(),
    };
    for (category, result) in results {
        match category {
            ComponentCategory::Salary => breakdown.salary_components.push(result),
            ComponentCategory::Allowance => breakdown.allowance_components.push(result),
            ComponentCategory::Deduction => breakdown.deduction_components.push(result),
            ComponentCategory::Statutory => breakdown.statutory_components.push(result),
        }
    }
    breakdown
}
