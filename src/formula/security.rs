//! Security validation for formula strings.
//!
//! The validator is a gate, not a filter: a formula that fails any check here
//! is never tokenized or evaluated. Formulas are operator-authored strings
//! entered through an admin UI, so they are treated as attacker-adjacent
//! input and rejected against an explicit allow-list.

use tracing::warn;

use crate::error::{EngineError, EngineResult};

/// Maximum formula length in characters, as a defense-in-depth bound.
pub const MAX_FORMULA_LENGTH: usize = 2_000;

/// Keywords rejected unconditionally regardless of case.
///
/// These are the dangerous identifiers from the legacy system's block list
/// plus their common equivalents in other host languages. A formula has no
/// business naming any of them.
const BLOCKED_KEYWORDS: &[&str] = &[
    "eval",
    "exec",
    "system",
    "shell_exec",
    "passthru",
    "file_get_contents",
    "file_put_contents",
    "fopen",
    "unlink",
    "mkdir",
    "rmdir",
    "include",
    "require",
    "import",
    "global",
];

/// Validates a formula against the security allow-list.
///
/// Checks, in order:
///
/// 1. Length bound ([`MAX_FORMULA_LENGTH`]).
/// 2. Character allow-list: ASCII digits, `.`, the operators `+ - * / %`,
///    parentheses, square brackets, comma, ASCII whitespace, and identifier
///    characters (`A-Za-z_`). Any other byte is rejected.
/// 3. A case-insensitive scan for blocked keywords appearing as whole
///    identifier words.
///
/// This is a pure predicate over the formula text; variable and function
/// names are resolved later by the evaluator.
///
/// # Errors
///
/// Returns [`EngineError::FormulaTooLong`] or
/// [`EngineError::SecurityViolation`]. Violations are logged as
/// security-relevant events.
///
/// # Example
///
/// ```
/// use payroll_engine::formula::security::validate;
///
/// assert!(validate("(BASIC_SALARY + HOUSING) * 8% / 12").is_ok());
/// assert!(validate("eval(\"rm -rf /\")").is_err());
/// ```
pub fn validate(formula: &str) -> EngineResult<()> {
    let length = formula.chars().count();
    if length > MAX_FORMULA_LENGTH {
        warn!(length, max = MAX_FORMULA_LENGTH, "rejected over-length formula");
        return Err(EngineError::FormulaTooLong {
            length,
            max: MAX_FORMULA_LENGTH,
        });
    }

    for c in formula.chars() {
        if !is_allowed_char(c) {
            warn!(character = %c, "rejected formula containing disallowed character");
            return Err(EngineError::SecurityViolation {
                message: format!("disallowed character '{c}' in formula"),
            });
        }
    }

    for word in identifier_words(formula) {
        let lowered = word.to_ascii_lowercase();
        if BLOCKED_KEYWORDS.contains(&lowered.as_str()) {
            warn!(keyword = %word, "rejected formula referencing blocked keyword");
            return Err(EngineError::SecurityViolation {
                message: format!("formula references blocked keyword '{word}'"),
            });
        }
    }

    Ok(())
}

/// Returns true if the character is on the formula allow-list.
fn is_allowed_char(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || c == '_'
        || c.is_ascii_whitespace()
        || matches!(c, '+' | '-' | '*' | '/' | '%' | '(' | ')' | '[' | ']' | ',' | '.')
}

/// Iterates over identifier-shaped words (`[A-Za-z_][A-Za-z0-9_]*`).
fn identifier_words(formula: &str) -> impl Iterator<Item = &str> {
    let bytes = formula.as_bytes();
    let mut position = 0;
    std::iter::from_fn(move || {
        while position < bytes.len() {
            let start = position;
            if bytes[start].is_ascii_alphabetic() || bytes[start] == b'_' {
                let mut end = start + 1;
                while end < bytes.len()
                    && (bytes[end].is_ascii_alphanumeric() || bytes[end] == b'_')
                {
                    end += 1;
                }
                position = end;
                return Some(&formula[start..end]);
            }
            position += 1;
        }
        None
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_plain_arithmetic() {
        assert!(validate("1 + 2 * 3 - 4 / 5").is_ok());
    }

    #[test]
    fn test_accepts_stored_formula_syntax() {
        assert!(validate("(BASIC_SALARY + HOUSING) * 8% / 12").is_ok());
        assert!(validate("SUM(basic_salary, housing, transport)").is_ok());
        assert!(validate("ROUND(gross_salary * 7.5%, 2)").is_ok());
        assert!(validate("SUM([a, b, c])").is_ok());
    }

    #[test]
    fn test_rejects_disallowed_characters() {
        for formula in [
            "1; drop table staff",
            "`id`",
            "$basic_salary",
            "<?php echo 1 ?>",
            "a = b",
            "x & y",
            "\"text\"",
        ] {
            let result = validate(formula);
            assert!(
                matches!(result, Err(EngineError::SecurityViolation { .. })),
                "{formula:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_rejects_blocked_keywords_any_case() {
        for formula in [
            "eval(1)",
            "EVAL(1)",
            "Exec(1)",
            "system + 1",
            "shell_exec(x)",
            "include(x)",
            "REQUIRE(x)",
            "import(x)",
        ] {
            let result = validate(formula);
            assert!(
                matches!(result, Err(EngineError::SecurityViolation { .. })),
                "{formula:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_keyword_check_is_whole_word() {
        // "eval" embedded inside a larger identifier is a legitimate name.
        assert!(validate("evaluation_rate * 2").is_ok());
        assert!(validate("medieval_bonus + systematic_pay").is_ok());
    }

    #[test]
    fn test_rejects_over_length_formula() {
        let formula = "1+".repeat(MAX_FORMULA_LENGTH / 2 + 1);
        let result = validate(&formula);
        assert!(matches!(result, Err(EngineError::FormulaTooLong { .. })));
    }

    #[test]
    fn test_accepts_formula_at_length_bound() {
        let formula = "1".repeat(MAX_FORMULA_LENGTH);
        assert!(validate(&formula).is_ok());
    }

    #[test]
    fn test_rejects_non_ascii_bytes() {
        assert!(validate("salaire_de_base × 2").is_err());
    }

    #[test]
    fn test_empty_formula_passes_security() {
        // Emptiness is a syntax concern for the parser, not a security one.
        assert!(validate("").is_ok());
    }
}
