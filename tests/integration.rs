//! Comprehensive integration tests for the payroll calculation engine.
//!
//! This test suite covers the full pipeline including:
//! - Template loading from YAML and JSON
//! - Formula security screening
//! - Full-attendance calculation with gross/net derivation
//! - Attendance proration
//! - Minimum-attendance advisory warnings
//! - Batch isolation of per-employee failures
//! - Error cases with component attribution

use payroll_engine::calculation::{
    calculate, calculate_batch, validate_template, CalculationInput,
};
use payroll_engine::config::TemplateLoader;
use payroll_engine::error::EngineError;
use payroll_engine::formula;
use payroll_engine::models::{Template, VariableContext, MINIMUM_ATTENDANCE_BREACH};

// =============================================================================
// Test Helpers
// =============================================================================

const GRADE_A_YAML: &str = r#"
name: Grade A
version: 3
salary_components:
  basic_salary:
    formula: "NULL"
    description: Basic Salary
allowance_components:
  housing:
    formula: "basic_salary * 20%"
    description: Housing Allowance
deduction_components: {}
statutory_components:
  pension:
    formula: "gross_salary * 8%"
    description: Pension Contribution
calculation_rules:
  annual_division_factor: 12
  attendance_calculation_method: working_days
  prorate_salary: true
  minimum_attendance_factor: 0.5
"#;

fn grade_a_template() -> Template {
    TemplateLoader::from_yaml_str(GRADE_A_YAML).expect("template must load")
}

fn full_attendance(employee_id: &str, basic_salary: f64) -> CalculationInput {
    CalculationInput::new(employee_id, basic_salary, 22.0, 22.0)
}

// =============================================================================
// Template Loading
// =============================================================================

#[test]
fn test_yaml_template_loads_with_declared_order() {
    let template = grade_a_template();
    assert_eq!(template.name, "Grade A");
    assert_eq!(template.version, 3);
    assert_eq!(template.salary_components[0].name, "basic_salary");
    assert_eq!(template.allowance_components[0].name, "housing");
    assert_eq!(template.statutory_components[0].name, "pension");
}

#[test]
fn test_json_template_loads() {
    let json = r#"{
        "name": "Grade B",
        "salary_components": { "basic_salary": { "formula": "NULL" } },
        "deduction_components": { "paye_tax": { "formula": "gross_salary * 10%" } }
    }"#;
    let template = TemplateLoader::from_json_str(json).unwrap();
    assert_eq!(template.deduction_components[0].description, "Paye Tax");
}

#[test]
fn test_template_with_dangerous_formula_rejected_at_load() {
    let yaml = r#"
name: Hostile
salary_components:
  basic_salary:
    formula: "system(rm)"
"#;
    assert!(matches!(
        TemplateLoader::from_yaml_str(yaml),
        Err(EngineError::SecurityViolation { .. })
    ));
}

#[test]
fn test_template_with_circular_gross_reference_rejected() {
    let yaml = r#"
name: Circular
salary_components:
  basic_salary:
    formula: "NULL"
allowance_components:
  bonus:
    formula: "gross_salary * 5%"
"#;
    assert!(matches!(
        TemplateLoader::from_yaml_str(yaml),
        Err(EngineError::InvalidTemplate { .. })
    ));
}

// =============================================================================
// End-to-End Calculation
// =============================================================================

#[test]
fn test_full_attendance_calculation() {
    let template = grade_a_template();
    let breakdown = calculate(&template, &full_attendance("EMP-001", 100_000.0)).unwrap();

    assert_eq!(breakdown.employee_id, "EMP-001");
    assert_eq!(breakdown.template_name, "Grade A");
    assert_eq!(breakdown.component("basic_salary").unwrap().evaluated_value, 100_000.0);
    assert_eq!(breakdown.component("housing").unwrap().evaluated_value, 20_000.0);
    assert_eq!(breakdown.component("pension").unwrap().evaluated_value, 9_600.0);
    assert_eq!(breakdown.gross_salary, 120_000.0);
    assert_eq!(breakdown.total_deductions, 9_600.0);
    assert_eq!(breakdown.net_salary, 110_400.0);
    assert_eq!(breakdown.attendance_factor, 1.0);
    assert!(breakdown.warnings.is_empty());
}

#[test]
fn test_half_attendance_prorates_basic_gross_and_net() {
    let template = grade_a_template();
    let input = CalculationInput::new("EMP-002", 100_000.0, 11.0, 22.0);
    let breakdown = calculate(&template, &input).unwrap();

    assert_eq!(breakdown.attendance_factor, 0.5);
    assert_eq!(breakdown.component("basic_salary").unwrap().evaluated_value, 50_000.0);
    assert_eq!(breakdown.gross_salary, 60_000.0);
    assert_eq!(breakdown.net_salary, 55_200.0);
    // Exactly at the minimum factor is not a breach.
    assert!(!breakdown.has_warning(MINIMUM_ATTENDANCE_BREACH));
}

#[test]
fn test_sub_minimum_attendance_is_flagged_not_zeroed() {
    let template = grade_a_template();
    let input = CalculationInput::new("EMP-003", 100_000.0, 5.0, 22.0);
    let breakdown = calculate(&template, &input).unwrap();

    assert!(breakdown.has_warning(MINIMUM_ATTENDANCE_BREACH));
    assert!(breakdown.net_salary > 0.0);
}

#[test]
fn test_breakdown_serializes_for_downstream_consumers() {
    let template = grade_a_template();
    let breakdown = calculate(&template, &full_attendance("EMP-004", 100_000.0)).unwrap();
    let json = serde_json::to_value(&breakdown).unwrap();

    assert_eq!(json["employee_id"], "EMP-004");
    assert_eq!(json["gross_salary"], 120_000.0);
    assert_eq!(json["statutory_components"][0]["name"], "pension");
    assert_eq!(
        json["statutory_components"][0]["formula_text"],
        "gross_salary * 8%"
    );
}

// =============================================================================
// Error Cases
// =============================================================================

#[test]
fn test_missing_variable_attributed_to_component() {
    let yaml = r#"
name: Broken
salary_components:
  basic_salary:
    formula: "NULL"
allowance_components:
  transport:
    formula: "commute_rate * 22"
"#;
    let template = TemplateLoader::from_yaml_str(yaml).unwrap();
    let result = calculate(&template, &full_attendance("EMP-005", 100_000.0));

    match result {
        Err(EngineError::ComponentFailed {
            component,
            formula,
            source,
        }) => {
            assert_eq!(component, "transport");
            assert_eq!(formula, "commute_rate * 22");
            assert!(source.to_string().contains("commute_rate"));
        }
        other => panic!("expected ComponentFailed, got {other:?}"),
    }
}

#[test]
fn test_division_by_zero_is_a_hard_failure() {
    let yaml = r#"
name: DivZero
salary_components:
  basic_salary:
    formula: "NULL"
deduction_components:
  levy:
    formula: "basic_salary / (attendance_days - attendance_days)"
"#;
    let template = TemplateLoader::from_yaml_str(yaml).unwrap();
    let result = calculate(&template, &full_attendance("EMP-006", 100_000.0));
    match result {
        Err(EngineError::ComponentFailed { source, .. }) => {
            assert!(matches!(*source, EngineError::DivisionByZero));
        }
        other => panic!("expected ComponentFailed, got {other:?}"),
    }
}

#[test]
fn test_zero_total_working_days_rejected() {
    let template = grade_a_template();
    let input = CalculationInput::new("EMP-007", 100_000.0, 10.0, 0.0);
    assert!(matches!(
        calculate(&template, &input),
        Err(EngineError::InvalidAttendance { .. })
    ));
}

// =============================================================================
// Batch Processing
// =============================================================================

#[test]
fn test_batch_isolates_per_employee_failures() {
    let template = grade_a_template();
    let inputs = vec![
        full_attendance("EMP-010", 100_000.0),
        CalculationInput::new("EMP-011", 90_000.0, 10.0, 0.0),
        full_attendance("EMP-012", 80_000.0),
    ];
    let outcome = calculate_batch(&template, &inputs).unwrap();

    assert_eq!(outcome.breakdowns.len(), 2);
    assert_eq!(outcome.failures.len(), 1);
    assert_eq!(outcome.failures[0].employee_id, "EMP-011");
    assert!(matches!(
        outcome.failures[0].error,
        EngineError::InvalidAttendance { .. }
    ));
    assert_eq!(outcome.breakdowns[1].employee_id, "EMP-012");
    assert_eq!(outcome.breakdowns[1].gross_salary, 96_000.0);
}

// =============================================================================
// Template Validation Dry Run
// =============================================================================

#[test]
fn test_dry_run_reports_issues_per_component() {
    let yaml = r#"
name: Draft
salary_components:
  basic_salary:
    formula: "NULL"
allowance_components:
  transport:
    formula: "commute_rate * 22"
  housing:
    formula: "basic_salary * 20%"
"#;
    let template = TemplateLoader::from_yaml_str(yaml).unwrap();
    let results = validate_template(&template, &full_attendance("EMP-020", 100_000.0)).unwrap();

    assert_eq!(results.len(), 3);
    let transport = results.iter().find(|r| r.name == "transport").unwrap();
    assert!(!transport.validation_issues.is_empty());
    assert_eq!(transport.evaluated_value, 0.0);
    let housing = results.iter().find(|r| r.name == "housing").unwrap();
    assert!(housing.validation_issues.is_empty());
    assert_eq!(housing.evaluated_value, 20_000.0);
}

// =============================================================================
// Formula Surface Syntax Compatibility
// =============================================================================

#[test]
fn test_persisted_formula_surface_syntax() {
    // Shapes taken from real stored component formulas.
    let context = VariableContext::from_pairs([
        ("BASIC_SALARY", 120_000.0),
        ("HOUSING", 24_000.0),
    ])
    .unwrap();

    assert_eq!(
        formula::evaluate("(BASIC_SALARY + HOUSING) * 8% / 12", &context).unwrap(),
        960.0
    );
    assert_eq!(
        formula::evaluate("SUM([basic_salary, housing]) * 10%", &context).unwrap(),
        14_400.0
    );
    assert_eq!(
        formula::evaluate("ROUND(basic_salary / 7, 2)", &context).unwrap(),
        17_142.86
    );
}

#[test]
fn test_round_ties_away_from_zero() {
    let context = VariableContext::new();
    assert_eq!(formula::evaluate("ROUND(1.005, 2)", &context).unwrap(), 1.01);
    assert_eq!(formula::evaluate("ROUND(2.675, 2)", &context).unwrap(), 2.68);
}
