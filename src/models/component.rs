//! Payroll component models.
//!
//! A component is one named, independently computed payroll line item
//! (e.g. housing allowance). Its computation rule is classified once at
//! template-load time into a [`ComponentRule`] variant, never re-branched on
//! strings during evaluation.

use serde::{Deserialize, Serialize};

use crate::error::EngineResult;
use crate::formula::security;

/// A validated formula source text.
///
/// Wraps the persisted string form of one component's computation rule
/// (e.g. `"(BASIC_SALARY + HOUSING) * 8% / 12"`). Construction runs the
/// security validator, so a [`Formula`] in hand is always safe to tokenize.
/// It never executes side effects; it purely evaluates to a real number.
///
/// # Example
///
/// ```
/// use payroll_engine::models::Formula;
///
/// let formula = Formula::new("basic_salary * 20%").unwrap();
/// assert_eq!(formula.as_str(), "basic_salary * 20%");
///
/// assert!(Formula::new("exec(\"payload\")").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Formula(String);

impl Formula {
    /// Validates and wraps a formula string.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::EngineError::SecurityViolation`] or
    /// [`crate::error::EngineError::FormulaTooLong`] if the text fails the
    /// security allow-list.
    pub fn new(text: impl Into<String>) -> EngineResult<Self> {
        let text = text.into();
        security::validate(&text)?;
        Ok(Self(text))
    }

    /// Returns the formula source text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Formula {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The category a payroll component belongs to.
///
/// Categories are evaluated in a declared order so later components can
/// reference earlier results; salary and allowance results feed
/// `gross_salary`, deduction and statutory results feed `total_deductions`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentCategory {
    /// Base salary figures (basic salary and salary-like lines).
    Salary,
    /// Allowances (housing, transport, meal, and similar).
    Allowance,
    /// Voluntary or contractual deductions.
    Deduction,
    /// Statutory deductions (pension, tax, insurance).
    Statutory,
}

impl ComponentCategory {
    /// The default evaluation order: salary, allowances, deductions,
    /// statutory.
    pub const DEFAULT_ORDER: [ComponentCategory; 4] = [
        ComponentCategory::Salary,
        ComponentCategory::Allowance,
        ComponentCategory::Deduction,
        ComponentCategory::Statutory,
    ];
}

/// How a component's value is computed, decided once at template load.
#[derive(Debug, Clone, PartialEq)]
pub enum ComponentRule {
    /// The raw caller-supplied input value is passed through verbatim
    /// (the `basic_salary` component with no formula).
    Identity,
    /// A fixed annual amount, divided by the template's annual division
    /// factor during evaluation.
    FixedAmount(f64),
    /// A formula evaluated against the accumulating variable context.
    Formula(Formula),
}

/// One named payroll line item owned by a template.
#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    /// The component name; the key used in the variable context and in the
    /// output breakdown.
    pub name: String,
    /// The category this component belongs to.
    pub category: ComponentCategory,
    /// How the component's value is computed.
    pub rule: ComponentRule,
    /// A human-readable description.
    pub description: String,
}

impl Component {
    /// Builds a component from persisted formula text, classifying the rule.
    ///
    /// Classification mirrors the persisted template format:
    ///
    /// - an empty or `"NULL"` formula on a component named `basic_salary`
    ///   is the identity passthrough of the raw input value;
    /// - an empty or `"NULL"` formula on any other component is a fixed
    ///   zero;
    /// - text that parses as a plain number is a fixed annual amount;
    /// - anything else is a formula, validated here.
    ///
    /// # Errors
    ///
    /// Returns a security error if formula text fails the allow-list.
    pub fn from_formula_text(
        name: impl Into<String>,
        category: ComponentCategory,
        formula_text: Option<&str>,
        description: impl Into<String>,
    ) -> EngineResult<Self> {
        let name = name.into();
        let trimmed = formula_text.unwrap_or("").trim();

        let rule = if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("NULL") {
            if name.eq_ignore_ascii_case("basic_salary") {
                ComponentRule::Identity
            } else {
                ComponentRule::FixedAmount(0.0)
            }
        } else if let Some(amount) = parse_plain_number(trimmed) {
            ComponentRule::FixedAmount(amount)
        } else {
            ComponentRule::Formula(Formula::new(trimmed)?)
        };

        Ok(Self {
            name,
            category,
            rule,
            description: description.into(),
        })
    }

    /// Returns the formula source text, if this component has one.
    pub fn formula_text(&self) -> Option<&str> {
        match &self.rule {
            ComponentRule::Formula(formula) => Some(formula.as_str()),
            _ => None,
        }
    }
}

/// Parses a plain decimal literal (digits and at most one dot, no sign, no
/// exponent), the only numeric shape the formula grammar itself accepts.
fn parse_plain_number(text: &str) -> Option<f64> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit() || b == b'.') {
        return None;
    }
    if text.bytes().filter(|&b| b == b'.').count() > 1 {
        return None;
    }
    text.parse().ok()
}
