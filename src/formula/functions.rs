//! The fixed built-in function library.
//!
//! Formulas may only call functions from this set; anything else is an
//! [`EngineError::UnknownFunction`]. Arguments are fully evaluated before a
//! function body runs (strict application).

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

use crate::error::{EngineError, EngineResult};

/// The names of every allowed built-in function, uppercase.
pub const ALLOWED_FUNCTIONS: &[&str] = &[
    "SUM", "AVERAGE", "MIN", "MAX", "ROUND", "FLOOR", "CEIL", "ABS", "SQRT", "POW", "LOG",
    "EXP",
];

/// The decimal precision `ROUND` uses when called with a single argument.
pub const DEFAULT_ROUND_PRECISION: u32 = 2;

/// The largest precision `ROUND` accepts.
pub const MAX_ROUND_PRECISION: u32 = 12;

/// Returns true if `name` is an allowed function, matched case-insensitively.
pub fn is_function(name: &str) -> bool {
    ALLOWED_FUNCTIONS
        .iter()
        .any(|allowed| allowed.eq_ignore_ascii_case(name))
}

/// Applies a built-in function to its evaluated arguments.
///
/// # Errors
///
/// Returns [`EngineError::UnknownFunction`] for a name outside
/// [`ALLOWED_FUNCTIONS`] and [`EngineError::InvalidFunctionArgument`] for a
/// bad argument list (wrong arity, empty aggregate, non-integer precision).
///
/// # Example
///
/// ```
/// use payroll_engine::formula::functions::call;
///
/// assert_eq!(call("SUM", &[10_000.0, 20_000.0, 30_000.0]).unwrap(), 60_000.0);
/// assert_eq!(call("ROUND", &[1.005, 2.0]).unwrap(), 1.01);
/// ```
pub fn call(name: &str, args: &[f64]) -> EngineResult<f64> {
    let canonical = name.to_ascii_uppercase();
    match canonical.as_str() {
        "SUM" => {
            require_at_least_one(&canonical, args)?;
            Ok(args.iter().sum())
        }
        "AVERAGE" => {
            require_at_least_one(&canonical, args)?;
            Ok(args.iter().sum::<f64>() / args.len() as f64)
        }
        "MIN" => {
            require_at_least_one(&canonical, args)?;
            Ok(args.iter().copied().fold(f64::INFINITY, f64::min))
        }
        "MAX" => {
            require_at_least_one(&canonical, args)?;
            Ok(args.iter().copied().fold(f64::NEG_INFINITY, f64::max))
        }
        "ROUND" => {
            let value = match args {
                [value] => round_half_away_from_zero(*value, DEFAULT_ROUND_PRECISION),
                [value, precision] => {
                    round_half_away_from_zero(*value, parse_precision(*precision)?)
                }
                _ => {
                    return Err(EngineError::InvalidFunctionArgument {
                        function: canonical,
                        message: format!("expected 1 or 2 arguments, got {}", args.len()),
                    });
                }
            };
            Ok(value)
        }
        "FLOOR" => Ok(require_exactly_one(&canonical, args)?.floor()),
        "CEIL" => Ok(require_exactly_one(&canonical, args)?.ceil()),
        "ABS" => Ok(require_exactly_one(&canonical, args)?.abs()),
        "SQRT" => {
            let value = require_exactly_one(&canonical, args)?;
            if value < 0.0 {
                return Err(EngineError::InvalidFunctionArgument {
                    function: canonical,
                    message: format!("expected a non-negative value, got {value}"),
                });
            }
            Ok(value.sqrt())
        }
        "POW" => match args {
            [base, exponent] => Ok(base.powf(*exponent)),
            _ => Err(EngineError::InvalidFunctionArgument {
                function: canonical,
                message: format!("expected exactly 2 arguments, got {}", args.len()),
            }),
        },
        "LOG" => {
            let value = require_exactly_one(&canonical, args)?;
            if value <= 0.0 {
                return Err(EngineError::InvalidFunctionArgument {
                    function: canonical,
                    message: format!("expected a positive value, got {value}"),
                });
            }
            Ok(value.ln())
        }
        "EXP" => Ok(require_exactly_one(&canonical, args)?.exp()),
        _ => Err(EngineError::UnknownFunction {
            name: name.to_string(),
        }),
    }
}

/// Rounds to `precision` decimal digits, ties away from zero.
///
/// Rounding operates on the shortest decimal rendering of the value rather
/// than its raw binary expansion, so `ROUND(1.005, 2)` yields `1.01` even
/// though the nearest f64 to 1.005 sits just below the midpoint. Values whose
/// rendering exceeds [`Decimal`]'s range fall back to scaled binary rounding.
pub fn round_half_away_from_zero(value: f64, precision: u32) -> f64 {
    if !value.is_finite() {
        return value;
    }
    match Decimal::from_str(&format!("{value}")) {
        Ok(decimal) => decimal
            .round_dp_with_strategy(precision, RoundingStrategy::MidpointAwayFromZero)
            .to_f64()
            .unwrap_or(value),
        Err(_) => {
            if value.abs() >= 1e17 {
                // Magnitudes this large carry no fractional part.
                value
            } else {
                let factor = 10f64.powi(precision as i32);
                (value * factor).round() / factor
            }
        }
    }
}

fn require_at_least_one(function: &str, args: &[f64]) -> EngineResult<()> {
    if args.is_empty() {
        return Err(EngineError::InvalidFunctionArgument {
            function: function.to_string(),
            message: "expected at least 1 argument".to_string(),
        });
    }
    Ok(())
}

fn require_exactly_one(function: &str, args: &[f64]) -> EngineResult<f64> {
    match args {
        [value] => Ok(*value),
        _ => Err(EngineError::InvalidFunctionArgument {
            function: function.to_string(),
            message: format!("expected exactly 1 argument, got {}", args.len()),
        }),
    }
}

fn parse_precision(raw: f64) -> EngineResult<u32> {
    if !raw.is_finite() || raw.fract() != 0.0 || raw < 0.0 || raw > MAX_ROUND_PRECISION as f64 {
        return Err(EngineError::InvalidFunctionArgument {
            function: "ROUND".to_string(),
            message: format!(
                "precision must be an integer between 0 and {MAX_ROUND_PRECISION}, got {raw}"
            ),
        });
    }
    Ok(raw as u32)
}
