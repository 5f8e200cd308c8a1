//! Error types for the payroll calculation engine.
//!
//! This module provides strongly-typed errors using the `thiserror` crate
//! for all error conditions that can occur during formula evaluation and
//! template-based calculation.

use thiserror::Error;

/// The main error type for the payroll calculation engine.
///
/// All operations in the engine return this error type, making it easy
/// to handle errors consistently throughout the application.
///
/// # Example
///
/// ```
/// use payroll_engine::error::EngineError;
///
/// let error = EngineError::MissingVariable {
///     name: "UNDEFINED_VAR".to_string(),
/// };
/// assert_eq!(error.to_string(), "missing variable 'UNDEFINED_VAR'");
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    /// A formula contained a disallowed character or a blocked keyword.
    ///
    /// Always fatal and never recovered; formulas failing this check are
    /// never tokenized.
    #[error("security violation: {message}")]
    SecurityViolation {
        /// A description of the violation.
        message: String,
    },

    /// A formula exceeded the maximum permitted length.
    #[error("formula is too long: {length} characters (max {max})")]
    FormulaTooLong {
        /// The length of the rejected formula in characters.
        length: usize,
        /// The maximum permitted length.
        max: usize,
    },

    /// A formula was malformed (unbalanced parentheses, trailing operator,
    /// malformed numeric literal, empty function argument).
    #[error("formula syntax error: {message}")]
    SyntaxError {
        /// A description of the syntax error.
        message: String,
    },

    /// A referenced identifier was absent from the variable context at
    /// evaluation time.
    #[error("missing variable '{name}'")]
    MissingVariable {
        /// The name of the missing variable as written in the formula.
        name: String,
    },

    /// A function call referenced a name outside the fixed built-in set.
    #[error("unknown function '{name}'")]
    UnknownFunction {
        /// The function name as written in the formula.
        name: String,
    },

    /// A built-in function was called with an invalid argument list.
    #[error("invalid argument for {function}: {message}")]
    InvalidFunctionArgument {
        /// The name of the built-in function.
        function: String,
        /// A description of what was wrong with the arguments.
        message: String,
    },

    /// A division by zero occurred during evaluation.
    #[error("division by zero")]
    DivisionByZero,

    /// A formula evaluated to `NaN` or an infinity.
    #[error("formula evaluated to a non-finite value")]
    NonFiniteResult,

    /// Parenthesis/function nesting exceeded the defensive depth bound.
    #[error("formula nesting exceeds maximum depth of {max}")]
    NestingTooDeep {
        /// The maximum permitted nesting depth.
        max: usize,
    },

    /// A variable name or value supplied to the context was invalid.
    #[error("invalid variable '{name}': {message}")]
    InvalidVariable {
        /// The offending variable name.
        name: String,
        /// A description of what made it invalid.
        message: String,
    },

    /// Attendance inputs were inconsistent (e.g. zero total working days).
    #[error("invalid attendance data: {message}")]
    InvalidAttendance {
        /// A description of the inconsistency.
        message: String,
    },

    /// A template failed structural validation.
    #[error("invalid template: {message}")]
    InvalidTemplate {
        /// A description of the structural problem.
        message: String,
    },

    /// A component's evaluation failed during a calculation run.
    ///
    /// Wraps the underlying error together with the component name and
    /// formula text so the caller can surface "component X failed: missing
    /// variable Y" rather than a generic failure.
    #[error("component '{component}' failed: {source} (formula: {formula})")]
    ComponentFailed {
        /// The name of the component whose evaluation failed.
        component: String,
        /// The formula text of the failing component.
        formula: String,
        /// The underlying evaluation error.
        #[source]
        source: Box<EngineError>,
    },

    /// A template file was not found at the specified path.
    #[error("template file not found: {path}")]
    TemplateNotFound {
        /// The path that was not found.
        path: String,
    },

    /// A template file could not be parsed.
    #[error("failed to parse template file '{path}': {message}")]
    TemplateParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },
}

/// A type alias for Results that return EngineError.
pub type EngineResult<T> = Result<T, EngineError>;
