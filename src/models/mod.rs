//! Domain models: formulas, components, templates, contexts, and results.

pub mod breakdown;
pub mod component;
pub mod context;
pub mod template;

pub use breakdown::{
    Breakdown, CalculationWarning, ComponentResult, WarningSeverity,
    MINIMUM_ATTENDANCE_BREACH,
};
pub use component::{Component, ComponentCategory, ComponentRule, Formula};
pub use context::VariableContext;
pub use template::{AttendanceMethod, CalculationRules, Template};
