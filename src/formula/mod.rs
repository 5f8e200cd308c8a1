//! The sandboxed formula language.
//!
//! This module implements the expression language used to define payroll
//! components as human-written formula strings: a security validator that
//! gates every formula against an explicit allow-list, a tokenizer, a
//! recursive-descent evaluator with a postfix percent operator, a fixed
//! built-in function library, and static analysis helpers for
//! template-authoring tooling.
//!
//! The language evaluates pure numeric expressions over a bounded grammar:
//! no loops, no conditionals, no user-defined functions, no strings.

pub mod analysis;
pub mod functions;
pub mod parser;
pub mod security;
pub mod tokenizer;

pub use analysis::{extract_variables, validate_formula};
pub use functions::{ALLOWED_FUNCTIONS, round_half_away_from_zero};
pub use parser::MAX_NESTING_DEPTH;
pub use security::MAX_FORMULA_LENGTH;

use crate::error::EngineResult;
use crate::models::VariableContext;

/// Evaluates a formula string against a variable context.
///
/// Runs the full pipeline: security validation, tokenization, then parsing
/// and evaluation. Failing validation prevents tokenization entirely.
///
/// Evaluation is pure: identical inputs produce bit-identical results, no
/// side effects, no ambient state.
///
/// # Errors
///
/// Any of the per-formula errors: [`crate::error::EngineError::SecurityViolation`],
/// [`crate::error::EngineError::SyntaxError`],
/// [`crate::error::EngineError::MissingVariable`],
/// [`crate::error::EngineError::DivisionByZero`], and friends.
///
/// # Example
///
/// ```
/// use payroll_engine::formula::evaluate;
/// use payroll_engine::models::VariableContext;
///
/// let context = VariableContext::from_pairs([
///     ("BASIC_SALARY", 100_000.0),
///     ("HOUSING", 20_000.0),
/// ]).unwrap();
///
/// let value = evaluate("(BASIC_SALARY + HOUSING) * 8% / 12", &context).unwrap();
/// assert!((value - 800.0).abs() < 1e-9);
/// ```
pub fn evaluate(formula: &str, context: &VariableContext) -> EngineResult<f64> {
    security::validate(formula)?;
    let tokens = tokenizer::tokenize(formula)?;
    parser::evaluate_tokens(&tokens, context)
}
