//! Template file loading and persisted template structures.

pub mod loader;
pub mod types;

pub use loader::TemplateLoader;
pub use types::{ComponentConfig, ComponentMap, RulesConfig, TemplateConfig};
