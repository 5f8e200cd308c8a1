//! Persisted template file structures.
//!
//! This module contains the strongly-typed structures deserialized from
//! template YAML/JSON files, and their conversion into validated
//! [`Template`](crate::models::Template) values. Component maps preserve
//! the declared key order, which is the evaluation order within a category.

use std::fmt;

use serde::de::{Deserializer, MapAccess, Visitor};
use serde::Deserialize;

use crate::error::{EngineError, EngineResult};
use crate::models::{
    AttendanceMethod, CalculationRules, Component, ComponentCategory, Template,
};

/// One component entry as persisted: the formula text plus an optional
/// description.
#[derive(Debug, Clone, Deserialize)]
pub struct ComponentConfig {
    /// The formula source text. Absent, empty, or `"NULL"` marks an
    /// identity or zero component.
    #[serde(default)]
    pub formula: Option<String>,
    /// A human-readable description; derived from the name when absent.
    #[serde(default)]
    pub description: Option<String>,
}

/// An order-preserving `component_name -> ComponentConfig` map.
///
/// A plain `HashMap` would lose the declared order, and within a category
/// components may only reference earlier results, so order is semantic.
#[derive(Debug, Clone, Default)]
pub struct ComponentMap(
    /// Entries in declared order.
    pub Vec<(String, ComponentConfig)>,
);

impl<'de> Deserialize<'de> for ComponentMap {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct ComponentMapVisitor;

        impl<'de> Visitor<'de> for ComponentMapVisitor {
            type Value = ComponentMap;

            fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str("a map of component name to component config")
            }

            fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((name, config)) =
                    access.next_entry::<String, ComponentConfig>()?
                {
                    entries.push((name, config));
                }
                Ok(ComponentMap(entries))
            }
        }

        deserializer.deserialize_map(ComponentMapVisitor)
    }
}

/// Calculation rules as persisted, with the original system's defaults
/// applied for absent fields.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    /// Divisor used to convert annual amounts to per-period amounts.
    pub annual_division_factor: f64,
    /// How attendance totals are measured.
    pub attendance_calculation_method: AttendanceMethod,
    /// Whether basic/gross/net are scaled by the attendance factor.
    pub prorate_salary: bool,
    /// The attendance factor below which a calculation is flagged.
    pub minimum_attendance_factor: f64,
    /// Category evaluation order; defaults to
    /// salary, allowance, deduction, statutory.
    pub category_order: Vec<ComponentCategory>,
    /// Identifier of the legacy template this one was migrated from.
    pub legacy_reference: Option<String>,
}

impl Default for RulesConfig {
    fn default() -> Self {
        let rules = CalculationRules::default();
        Self {
            annual_division_factor: rules.annual_division_factor,
            attendance_calculation_method: rules.attendance_calculation_method,
            prorate_salary: rules.prorate_salary,
            minimum_attendance_factor: rules.minimum_attendance_factor,
            category_order: rules.category_order,
            legacy_reference: None,
        }
    }
}

/// A whole template file.
#[derive(Debug, Clone, Deserialize)]
pub struct TemplateConfig {
    /// The template name.
    pub name: String,
    /// The template version; defaults to 1.
    #[serde(default = "default_version")]
    pub version: u32,
    /// Salary components, in declared order.
    #[serde(default)]
    pub salary_components: ComponentMap,
    /// Allowance components, in declared order.
    #[serde(default)]
    pub allowance_components: ComponentMap,
    /// Deduction components, in declared order.
    #[serde(default)]
    pub deduction_components: ComponentMap,
    /// Statutory components, in declared order.
    #[serde(default)]
    pub statutory_components: ComponentMap,
    /// Cross-cutting calculation rules.
    #[serde(default)]
    pub calculation_rules: RulesConfig,
}

fn default_version() -> u32 {
    1
}

impl TemplateConfig {
    /// Converts the persisted shape into a validated [`Template`].
    ///
    /// Each component's formula text is classified into its rule, and a
    /// missing description is derived from the component name
    /// (`housing_allowance` becomes `Housing Allowance`).
    ///
    /// # Errors
    ///
    /// Returns the first formula security error or
    /// [`EngineError::InvalidTemplate`] if structural validation fails.
    pub fn into_template(self) -> EngineResult<Template> {
        let mut components = Vec::new();
        for (category, map) in [
            (ComponentCategory::Salary, self.salary_components),
            (ComponentCategory::Allowance, self.allowance_components),
            (ComponentCategory::Deduction, self.deduction_components),
            (ComponentCategory::Statutory, self.statutory_components),
        ] {
            for (name, config) in map.0 {
                let description = config
                    .description
                    .unwrap_or_else(|| title_case(&name));
                components.push(Component::from_formula_text(
                    name,
                    category,
                    config.formula.as_deref(),
                    description,
                )?);
            }
        }

        let rules = CalculationRules {
            category_order: self.calculation_rules.category_order,
            annual_division_factor: self.calculation_rules.annual_division_factor,
            attendance_calculation_method: self
                .calculation_rules
                .attendance_calculation_method,
            prorate_salary: self.calculation_rules.prorate_salary,
            minimum_attendance_factor: self.calculation_rules.minimum_attendance_factor,
            legacy_reference: self.calculation_rules.legacy_reference,
        };

        Template::new(self.name, self.version, components, rules)
    }
}

/// Derives a display description from a snake_case component name.
fn title_case(name: &str) -> String {
    name.split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Maps a file-level parse failure into the engine error taxonomy.
pub(super) fn parse_error(path: &str, message: impl ToString) -> EngineError {
    EngineError::TemplateParseError {
        path: path.to_string(),
        message: message.to_string(),
    }
}
