//! Static analysis of formulas: variable extraction and non-fatal
//! diagnostics.
//!
//! Nothing in this module evaluates anything against real data; it exists so
//! template-authoring workflows can detect formulas that reference undefined
//! variables before they are ever run against an employee, and so operators
//! can enumerate a template's external input requirements.

use std::collections::{BTreeSet, HashSet};

use crate::error::EngineResult;
use crate::models::VariableContext;

use super::functions;
use super::security;
use super::tokenizer::{self, Token};

/// Returns every identifier a formula references that is not a built-in
/// function name.
///
/// Names are de-duplicated case-insensitively; the first spelling
/// encountered is kept.
///
/// # Errors
///
/// Propagates security and tokenizer errors; a formula that cannot be lexed
/// has no meaningful variable set.
///
/// # Example
///
/// ```
/// use payroll_engine::formula::analysis::extract_variables;
///
/// let variables = extract_variables("SUM(A, B) + C% * D").unwrap();
/// let names: Vec<&str> = variables.iter().map(String::as_str).collect();
/// assert_eq!(names, vec!["A", "B", "C", "D"]);
/// ```
pub fn extract_variables(formula: &str) -> EngineResult<BTreeSet<String>> {
    security::validate(formula)?;
    let tokens = tokenizer::tokenize(formula)?;

    let mut seen = HashSet::new();
    let mut variables = BTreeSet::new();
    for token in tokens {
        if let Token::Identifier(name) = token {
            // A bare word that happens to be a function name is filtered
            // out, the same as a real call head.
            if functions::is_function(&name) {
                continue;
            }
            if seen.insert(name.to_ascii_lowercase()) {
                variables.insert(name);
            }
        }
    }
    Ok(variables)
}

/// Reports likely mistakes in a formula without failing.
///
/// Runs extraction, then reports (but does not throw for) any referenced
/// variable absent from `known_context`. When every reference resolves, the
/// formula is additionally trial-evaluated so runtime-only problems
/// (syntax errors, division by zero, bad function arguments) surface as
/// advisories too.
///
/// Intended for the administrative template-authoring workflow: warn about
/// likely mistakes without blocking save.
///
/// # Example
///
/// ```
/// use payroll_engine::formula::analysis::validate_formula;
/// use payroll_engine::models::VariableContext;
///
/// let context = VariableContext::from_pairs([("basic_salary", 100_000.0)]).unwrap();
/// let issues = validate_formula("basic_salary + housing", &context);
/// assert_eq!(issues, vec!["formula references undefined variable 'housing'"]);
/// assert!(validate_formula("basic_salary * 20%", &context).is_empty());
/// ```
pub fn validate_formula(formula: &str, known_context: &VariableContext) -> Vec<String> {
    let variables = match extract_variables(formula) {
        Ok(variables) => variables,
        Err(error) => return vec![error.to_string()],
    };

    let mut issues: Vec<String> = variables
        .iter()
        .filter(|name| !known_context.contains(name))
        .map(|name| format!("formula references undefined variable '{name}'"))
        .collect();

    if issues.is_empty() {
        if let Err(error) = super::evaluate(formula, known_context) {
            issues.push(error.to_string());
        }
    }

    issues
}
