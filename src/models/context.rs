//! The accumulating variable context used during one calculation pass.
//!
//! A [`VariableContext`] maps case-insensitive variable names to real numbers.
//! It starts with the caller-supplied base inputs and gains one entry per
//! component as the orchestrator evaluates it, so later components can
//! reference earlier results. Insertion order is preserved because it carries
//! the dependency order of the calculation.

use std::collections::HashMap;

use crate::error::{EngineError, EngineResult};

/// A case-insensitive mapping from variable name to real number.
///
/// Names are matched without regard to ASCII case (`BASIC_SALARY` and
/// `basic_salary` address the same slot) but the first spelling inserted is
/// kept for iteration. Inserting an existing name overwrites its value in
/// place without changing its position.
///
/// # Example
///
/// ```
/// use payroll_engine::models::VariableContext;
///
/// let mut context = VariableContext::new();
/// context.insert("BASIC_SALARY", 100_000.0).unwrap();
/// assert_eq!(context.get("basic_salary"), Some(100_000.0));
/// assert!(context.get("housing").is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VariableContext {
    /// Entries in insertion order, keeping the original spelling.
    entries: Vec<(String, f64)>,
    /// Lookup from lowercased name to position in `entries`.
    index: HashMap<String, usize>,
}

impl VariableContext {
    /// Creates an empty variable context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a context from name/value pairs, preserving their order.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidVariable`] if any name is not a valid
    /// identifier or any value is not finite.
    ///
    /// # Example
    ///
    /// ```
    /// use payroll_engine::models::VariableContext;
    ///
    /// let context = VariableContext::from_pairs([
    ///     ("basic_salary", 100_000.0),
    ///     ("attendance_days", 22.0),
    /// ]).unwrap();
    /// assert_eq!(context.len(), 2);
    /// ```
    pub fn from_pairs<I, S>(pairs: I) -> EngineResult<Self>
    where
        I: IntoIterator<Item = (S, f64)>,
        S: AsRef<str>,
    {
        let mut context = Self::new();
        for (name, value) in pairs {
            context.insert(name.as_ref(), value)?;
        }
        Ok(context)
    }

    /// Inserts or overwrites a variable.
    ///
    /// The name must be a valid identifier (`[A-Za-z_][A-Za-z0-9_]*`) and the
    /// value must be finite; payroll amounts are never `NaN` or infinite.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidVariable`] on an invalid name or a
    /// non-finite value.
    pub fn insert(&mut self, name: &str, value: f64) -> EngineResult<()> {
        if !is_valid_variable_name(name) {
            return Err(EngineError::InvalidVariable {
                name: name.to_string(),
                message: "variable names must match [A-Za-z_][A-Za-z0-9_]*".to_string(),
            });
        }
        if !value.is_finite() {
            return Err(EngineError::InvalidVariable {
                name: name.to_string(),
                message: format!("value must be finite, got {value}"),
            });
        }

        let key = name.to_ascii_lowercase();
        match self.index.get(&key) {
            Some(&position) => self.entries[position].1 = value,
            None => {
                self.index.insert(key, self.entries.len());
                self.entries.push((name.to_string(), value));
            }
        }
        Ok(())
    }

    /// Looks up a variable case-insensitively.
    pub fn get(&self, name: &str) -> Option<f64> {
        self.index
            .get(&name.to_ascii_lowercase())
            .map(|&position| self.entries[position].1)
    }

    /// Returns true if the context contains the given name (case-insensitive).
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(&name.to_ascii_lowercase())
    }

    /// Returns the number of variables in the context.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the context is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over `(name, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), *value))
    }
}

/// Returns true if `name` is a valid variable identifier.
fn is_valid_variable_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
