//! Template file loading.
//!
//! This module provides the [`TemplateLoader`] type for loading calculation
//! templates from YAML or JSON files.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::{EngineError, EngineResult};
use crate::models::Template;

use super::types::{parse_error, TemplateConfig};

/// Loads calculation templates from files or raw strings.
///
/// One file holds one template. A directory may hold any number of
/// `.yaml`/`.yml`/`.json` template files; other files are ignored.
///
/// # Example
///
/// ```no_run
/// use payroll_engine::config::TemplateLoader;
///
/// let template = TemplateLoader::load("./templates/grade_a.yaml").unwrap();
/// println!("Loaded template: {} v{}", template.name, template.version);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct TemplateLoader;

impl TemplateLoader {
    /// Loads one template file, dispatching on its extension.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::TemplateNotFound`] when the file cannot be
    /// read, [`EngineError::TemplateParseError`] for malformed content or
    /// an unsupported extension, and validation errors from
    /// [`Template::new`](crate::models::Template::new) for a structurally
    /// invalid template.
    pub fn load<P: AsRef<Path>>(path: P) -> EngineResult<Template> {
        let path = path.as_ref();
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| EngineError::TemplateNotFound {
            path: path_str.clone(),
        })?;

        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        let config: TemplateConfig = match extension.as_deref() {
            Some("yaml") | Some("yml") => {
                serde_yaml::from_str(&content).map_err(|e| parse_error(&path_str, e))?
            }
            Some("json") => {
                serde_json::from_str(&content).map_err(|e| parse_error(&path_str, e))?
            }
            _ => {
                return Err(parse_error(
                    &path_str,
                    "unsupported extension (expected .yaml, .yml or .json)",
                ));
            }
        };

        let template = config.into_template()?;
        debug!(path = %path_str, template = %template.name, "loaded template");
        Ok(template)
    }

    /// Loads every template file in a directory.
    ///
    /// Files without a recognized extension are skipped; the directory
    /// must yield at least one template.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::TemplateNotFound`] for a missing or empty
    /// directory, plus any per-file error from [`TemplateLoader::load`].
    pub fn load_dir<P: AsRef<Path>>(path: P) -> EngineResult<Vec<Template>> {
        let dir = path.as_ref();
        let dir_str = dir.display().to_string();

        let entries = fs::read_dir(dir).map_err(|_| EngineError::TemplateNotFound {
            path: dir_str.clone(),
        })?;

        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|_| EngineError::TemplateNotFound {
                path: dir_str.clone(),
            })?;
            let entry_path = entry.path();
            let recognized = entry_path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| {
                    matches!(
                        ext.to_ascii_lowercase().as_str(),
                        "yaml" | "yml" | "json"
                    )
                });
            if recognized {
                paths.push(entry_path);
            }
        }
        // Deterministic load order regardless of directory iteration order.
        paths.sort();

        let mut templates = Vec::new();
        for entry_path in paths {
            templates.push(Self::load(&entry_path)?);
        }

        if templates.is_empty() {
            return Err(EngineError::TemplateNotFound {
                path: format!("{dir_str} (no template files found)"),
            });
        }
        Ok(templates)
    }

    /// Parses a template from a YAML string, for callers that fetch
    /// template rows from storage themselves.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::TemplateParseError`] for malformed YAML,
    /// plus any validation error.
    pub fn from_yaml_str(content: &str) -> EngineResult<Template> {
        let config: TemplateConfig =
            serde_yaml::from_str(content).map_err(|e| parse_error("<inline yaml>", e))?;
        config.into_template()
    }

    /// Parses a template from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::TemplateParseError`] for malformed JSON,
    /// plus any validation error.
    pub fn from_json_str(content: &str) -> EngineResult<Template> {
        let config: TemplateConfig =
            serde_json::from_str(content).map_err(|e| parse_error("<inline json>", e))?;
        config.into_template()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_YAML: &str = r#"
name: Grade A
salary_components:
  basic_salary:
    formula: "NULL"
allowance_components:
  housing:
    formula: "basic_salary * 20%"
"#;

    #[test]
    fn test_from_yaml_str_parses_template() {
        let template = TemplateLoader::from_yaml_str(SAMPLE_YAML).unwrap();
        assert_eq!(template.name, "Grade A");
        assert_eq!(template.allowance_components.len(), 1);
    }

    #[test]
    fn test_from_json_str_parses_template() {
        let json = r#"{
            "name": "Grade B",
            "salary_components": {
                "basic_salary": { "formula": "NULL" }
            },
            "statutory_components": {
                "pension": { "formula": "gross_salary * 8%" }
            }
        }"#;
        let template = TemplateLoader::from_json_str(json).unwrap();
        assert_eq!(template.name, "Grade B");
        assert_eq!(template.statutory_components.len(), 1);
    }

    #[test]
    fn test_malformed_yaml_reports_parse_error() {
        let result = TemplateLoader::from_yaml_str("name: [unclosed");
        assert!(matches!(
            result,
            Err(EngineError::TemplateParseError { .. })
        ));
    }

    #[test]
    fn test_load_missing_file_reports_not_found() {
        let result = TemplateLoader::load("/nonexistent/template.yaml");
        match result {
            Err(EngineError::TemplateNotFound { path }) => {
                assert!(path.contains("template.yaml"));
            }
            other => panic!("expected TemplateNotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_load_rejects_unsupported_extension() {
        let dir = std::env::temp_dir().join("payroll_engine_loader_test_ext");
        std::fs::create_dir_all(&dir).unwrap();
        let file = dir.join("template.toml");
        std::fs::write(&file, "name = \"x\"").unwrap();

        let result = TemplateLoader::load(&file);
        assert!(matches!(
            result,
            Err(EngineError::TemplateParseError { .. })
        ));
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_load_dir_skips_unrecognized_files() {
        let dir = std::env::temp_dir().join("payroll_engine_loader_test_dir");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("grade_a.yaml"), SAMPLE_YAML).unwrap();
        std::fs::write(dir.join("notes.txt"), "not a template").unwrap();

        let templates = TemplateLoader::load_dir(&dir).unwrap();
        assert_eq!(templates.len(), 1);
        assert_eq!(templates[0].name, "Grade A");
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_load_dir_with_no_templates_reports_not_found() {
        let dir = std::env::temp_dir().join("payroll_engine_loader_test_empty");
        std::fs::create_dir_all(&dir).unwrap();
        let result = TemplateLoader::load_dir(&dir);
        assert!(matches!(result, Err(EngineError::TemplateNotFound { .. })));
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
