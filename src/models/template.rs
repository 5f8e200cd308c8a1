//! Calculation template models.
//!
//! A template is a versioned, ordered set of payroll components partitioned
//! by category, plus the calculation rules that govern evaluation order,
//! annual-to-monthly conversion, and attendance policy. Templates are
//! created by administrative workflows and are read-only inputs to the
//! engine; a new version is a new template record.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::formula::analysis;

use super::component::{Component, ComponentCategory, ComponentRule};

/// How the total-days side of the attendance factor is determined by the
/// caller (working days in the period vs. calendar days).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceMethod {
    /// Attendance is measured against the period's working days.
    #[default]
    WorkingDays,
    /// Attendance is measured against the period's calendar days.
    CalendarDays,
}

/// Cross-cutting rules governing one template's calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationRules {
    /// The order categories are evaluated in.
    pub category_order: Vec<ComponentCategory>,
    /// Divisor used to convert annual amounts to per-period amounts.
    pub annual_division_factor: f64,
    /// How attendance totals are measured.
    pub attendance_calculation_method: AttendanceMethod,
    /// Whether basic/gross/net are scaled by the attendance factor.
    pub prorate_salary: bool,
    /// The attendance factor below which a calculation is flagged.
    pub minimum_attendance_factor: f64,
    /// Identifier of the legacy template this one was migrated from, if any.
    pub legacy_reference: Option<String>,
}

impl Default for CalculationRules {
    fn default() -> Self {
        Self {
            category_order: ComponentCategory::DEFAULT_ORDER.to_vec(),
            annual_division_factor: 12.0,
            attendance_calculation_method: AttendanceMethod::WorkingDays,
            prorate_salary: true,
            minimum_attendance_factor: 0.5,
            legacy_reference: None,
        }
    }
}

/// A versioned, immutable payroll calculation template.
///
/// # Example
///
/// ```
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
/// assert_eq!(template.components(ComponentCategory::Allowance).len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    /// Unique identifier for this template version.
    pub id: Uuid,
    /// The human-readable template name.
    pub name: String,
    /// The version number; a republished template is a new version.
    pub version: u32,
    /// Salary components in declared order.
    pub salary_components: Vec<Component>,
    /// Allowance components in declared order.
    pub allowance_components: Vec<Component>,
    /// Deduction components in declared order.
    pub deduction_components: Vec<Component>,
    /// Statutory components in declared order.
    pub statutory_components: Vec<Component>,
    /// The cross-cutting calculation rules.
    pub rules: CalculationRules,
}

impl Template {
    /// Builds and validates a template from a flat component list.
    ///
    /// Components keep their relative order within each category.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidTemplate`] if structural validation
    /// fails; see [`Template::validate`].
    pub fn new(
        name: impl Into<String>,
        version: u32,
        components: Vec<Component>,
        rules: CalculationRules,
    ) -> EngineResult<Self> {
        let mut template = Self {
            id: Uuid::new_v4(),
            name: name.into(),
            version,
            salary_components: Vec::new(),
            allowance_components: Vec::new(),
            deduction_components: Vec::new(),
            statutory_components: Vec::new(),
            rules,
        };
        for component in components {
            match component.category {
                ComponentCategory::Salary => template.salary_components.push(component),
                ComponentCategory::Allowance => template.allowance_components.push(component),
                ComponentCategory::Deduction => template.deduction_components.push(component),
                ComponentCategory::Statutory => template.statutory_components.push(component),
            }
        }
        template.validate()?;
        Ok(template)
    }

    /// Returns the components of one category, in declared order.
    pub fn components(&self, category: ComponentCategory) -> &[Component] {
        match category {
            ComponentCategory::Salary => &self.salary_components,
            ComponentCategory::Allowance => &self.allowance_components,
            ComponentCategory::Deduction => &self.deduction_components,
            ComponentCategory::Statutory => &self.statutory_components,
        }
    }

    /// Iterates over all components following the declared category order.
    pub fn all_components(&self) -> impl Iterator<Item = &Component> {
        self.rules
            .category_order
            .iter()
            .flat_map(|&category| self.components(category).iter())
    }

    /// Checks the template's structural invariants.
    ///
    /// Rejects:
    ///
    /// - duplicate component names (case-insensitive): every name is a
    ///   variable-context key and a breakdown key, so it must be unique;
    /// - a non-positive `annual_division_factor`;
    /// - a `minimum_attendance_factor` outside `0..=1`;
    /// - a `category_order` with repeated entries, or one that omits a
    ///   category the template has components in;
    /// - any Salary or Allowance formula referencing `gross_salary`:
    ///   gross is derived from those very categories, so the reference
    ///   would be circular.
    pub fn validate(&self) -> EngineResult<()> {
        let mut seen = std::collections::HashSet::new();
        for component in self.all_components() {
            if !seen.insert(component.name.to_ascii_lowercase()) {
                return Err(EngineError::InvalidTemplate {
                    message: format!("duplicate component name '{}'", component.name),
                });
            }
        }

        if self.rules.annual_division_factor <= 0.0
            || !self.rules.annual_division_factor.is_finite()
        {
            return Err(EngineError::InvalidTemplate {
                message: format!(
                    "annual_division_factor must be positive, got {}",
                    self.rules.annual_division_factor
                ),
            });
        }

        if !(0.0..=1.0).contains(&self.rules.minimum_attendance_factor) {
            return Err(EngineError::InvalidTemplate {
                message: format!(
                    "minimum_attendance_factor must be within 0..=1, got {}",
                    self.rules.minimum_attendance_factor
                ),
            });
        }

        let mut ordered = std::collections::HashSet::new();
        for &category in &self.rules.category_order {
            if !ordered.insert(category) {
                return Err(EngineError::InvalidTemplate {
                    message: format!("category_order repeats {category:?}"),
                });
            }
        }
        for &category in &ComponentCategory::DEFAULT_ORDER {
            if !self.components(category).is_empty() && !ordered.contains(&category) {
                return Err(EngineError::InvalidTemplate {
                    message: format!(
                        "category_order omits {category:?}, which has components"
                    ),
                });
            }
        }

        for component in self
            .salary_components
            .iter()
            .chain(self.allowance_components.iter())
        {
            if let ComponentRule::Formula(formula) = &component.rule {
                let references = analysis::extract_variables(formula.as_str())?;
                if references
                    .iter()
                    .any(|name| name.eq_ignore_ascii_case("gross_salary"))
                {
                    return Err(EngineError::InvalidTemplate {
                        message: format!(
                            "component '{}' references gross_salary, which is derived \
                             from the salary and allowance categories",
                            component.name
                        ),
                    });
                }
            }
        }

        Ok(())
    }
}
