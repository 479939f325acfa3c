//! Spec Loader
//!
//! Reads a rule document (YAML by default, JSON or TOML by extension),
//! checks its shape and converts it into a typed [`Spec`].
//!
//! Read and parse failures are `ReviveError::Config`; a document that parses
//! but breaks the contract (`version`, `rules`, rule `name`) is
//! `ReviveError::Validation` so callers can tell the two apart.

use std::fs;
use std::path::Path;

use serde_json::Value;
use tracing::debug;

use super::model::Spec;
use crate::types::{Result, ReviveError, ValidationError, ValidationErrorKind};

/// Serialization format of a rule document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecFormat {
    Yaml,
    Json,
    Toml,
}

impl SpecFormat {
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("json") => SpecFormat::Json,
            Some("toml") => SpecFormat::Toml,
            _ => SpecFormat::Yaml,
        }
    }
}

pub struct SpecLoader;

impl SpecLoader {
    /// Load and validate a rule document
    pub fn load(path: &Path) -> Result<Spec> {
        let content = fs::read_to_string(path).map_err(|e| {
            ReviveError::Config(format!("Failed to read spec {}: {}", path.display(), e))
        })?;
        debug!(path = %path.display(), bytes = content.len(), "Loaded rule document");
        Self::parse(&content, SpecFormat::from_path(path))
    }

    /// Load a rule document, falling back to the empty default when the
    /// file does not exist. Any other failure is returned.
    pub fn load_or_default(path: &Path) -> Result<Spec> {
        if !path.exists() {
            debug!(path = %path.display(), "No rule document, using defaults");
            return Ok(Spec::default());
        }
        Self::load(path)
    }

    pub fn parse(content: &str, format: SpecFormat) -> Result<Spec> {
        let raw: Value = match format {
            SpecFormat::Yaml => serde_yaml::from_str(content)
                .map_err(|e| ReviveError::Config(format!("Invalid spec YAML: {}", e)))?,
            SpecFormat::Json => serde_json::from_str(content)
                .map_err(|e| ReviveError::Config(format!("Invalid spec JSON: {}", e)))?,
            SpecFormat::Toml => toml::from_str(content)
                .map_err(|e| ReviveError::Config(format!("Invalid spec TOML: {}", e)))?,
        };
        Self::from_value(raw)
    }

    /// Validate an already-parsed document and convert it
    pub fn from_value(raw: Value) -> Result<Spec> {
        validate(&raw)?;
        serde_json::from_value(raw).map_err(|e| {
            ValidationError::new(ValidationErrorKind::Format, e.to_string())
                .with_field("rules")
                .into()
        })
    }

    /// Serialize a spec in the given format
    pub fn render(spec: &Spec, format: SpecFormat) -> Result<String> {
        match format {
            SpecFormat::Yaml => Ok(serde_yaml::to_string(spec)?),
            SpecFormat::Json => Ok(serde_json::to_string_pretty(spec)?),
            SpecFormat::Toml => {
                toml::to_string_pretty(spec).map_err(|e| ReviveError::Config(e.to_string()))
            }
        }
    }

    /// Validate then write a spec, creating parent directories
    pub fn save(spec: &Spec, path: &Path) -> Result<()> {
        validate(&serde_json::to_value(spec)?)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, Self::render(spec, SpecFormat::from_path(path))?)?;
        Ok(())
    }
}

fn validate(raw: &Value) -> std::result::Result<(), ValidationError> {
    let doc = raw.as_object().ok_or_else(|| {
        ValidationError::new(ValidationErrorKind::Schema, "spec must be a mapping")
    })?;

    match doc.get("version") {
        Some(Value::String(v)) if !v.trim().is_empty() => {}
        Some(Value::String(_)) | None | Some(Value::Null) => {
            return Err(ValidationError::new(
                ValidationErrorKind::MissingField,
                "spec version must be a non-empty string",
            )
            .with_field("version"));
        }
        Some(_) => {
            return Err(ValidationError::new(
                ValidationErrorKind::Format,
                "spec version must be a non-empty string",
            )
            .with_field("version"));
        }
    }

    let rules = match doc.get("rules") {
        Some(Value::Array(rules)) => rules,
        None | Some(Value::Null) => {
            return Err(ValidationError::new(
                ValidationErrorKind::MissingField,
                "spec rules must be an array",
            )
            .with_field("rules"));
        }
        Some(_) => {
            return Err(ValidationError::new(
                ValidationErrorKind::Format,
                "spec rules must be an array",
            )
            .with_field("rules"));
        }
    };

    for (index, rule) in rules.iter().enumerate() {
        let named = rule
            .get("name")
            .and_then(Value::as_str)
            .is_some_and(|n| !n.trim().is_empty());
        if !named {
            return Err(ValidationError::new(
                ValidationErrorKind::MissingField,
                format!("Rule at index {} is missing a name", index),
            )
            .with_field(format!("rules[{}].name", index)));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TaskType;
    use tempfile::TempDir;

    const YAML: &str = r#"
version: "1.2"
rules:
  - name: skip-python-docs
    enabled: false
    languages: [python]
    options:
      taskType: documentation
  - name: soften-deps
    options:
      taskType: dependency
      confidenceMultiplier: 0.5
"#;

    fn validation_kind(err: ReviveError) -> ValidationErrorKind {
        match err {
            ReviveError::Validation(v) => v.kind,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_yaml() {
        let spec = SpecLoader::parse(YAML, SpecFormat::Yaml).unwrap();
        assert_eq!(spec.version, "1.2");
        assert_eq!(spec.rule_names(), vec!["skip-python-docs", "soften-deps"]);
        assert_eq!(
            spec.rules[1].options.task_type,
            Some(TaskType::Dependency)
        );
        assert_eq!(spec.rules[1].options.confidence_multiplier, Some(0.5));
    }

    #[test]
    fn test_parse_json_and_toml() {
        let json = r#"{"version":"1","rules":[{"name":"a","enabled":false}]}"#;
        assert_eq!(SpecLoader::parse(json, SpecFormat::Json).unwrap().rules.len(), 1);

        let toml = "version = \"1\"\n\n[[rules]]\nname = \"a\"\n\n[rules.options]\ntaskType = \"refactor\"\n";
        let spec = SpecLoader::parse(toml, SpecFormat::Toml).unwrap();
        assert_eq!(spec.rules[0].options.task_type, Some(TaskType::Refactor));
    }

    #[test]
    fn test_missing_version() {
        let err = SpecLoader::parse("rules: []", SpecFormat::Yaml).unwrap_err();
        assert_eq!(validation_kind(err), ValidationErrorKind::MissingField);

        let err = SpecLoader::parse("version: \"\"\nrules: []", SpecFormat::Yaml).unwrap_err();
        assert_eq!(validation_kind(err), ValidationErrorKind::MissingField);
    }

    #[test]
    fn test_non_string_version() {
        let err = SpecLoader::parse("version: 2\nrules: []", SpecFormat::Yaml).unwrap_err();
        assert_eq!(validation_kind(err), ValidationErrorKind::Format);
    }

    #[test]
    fn test_rules_must_be_array() {
        let err = SpecLoader::parse("version: \"1\"\nrules: {}", SpecFormat::Yaml).unwrap_err();
        assert_eq!(validation_kind(err), ValidationErrorKind::Format);
    }

    #[test]
    fn test_rule_without_name() {
        let err = SpecLoader::parse(
            "version: \"1\"\nrules:\n  - name: ok\n  - enabled: false\n",
            SpecFormat::Yaml,
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "Validation failed for 'rules[1].name': Rule at index 1 is missing a name");
    }

    #[test]
    fn test_unknown_task_type_is_validation_error() {
        let err = SpecLoader::parse(
            "version: \"1\"\nrules:\n  - name: a\n    options:\n      taskType: cleanup\n",
            SpecFormat::Yaml,
        )
        .unwrap_err();
        assert_eq!(validation_kind(err), ValidationErrorKind::Format);
    }

    #[test]
    fn test_malformed_yaml_is_config_error() {
        let err = SpecLoader::parse("version: [unclosed", SpecFormat::Yaml).unwrap_err();
        assert!(matches!(err, ReviveError::Config(_)));
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let dir = TempDir::new().unwrap();
        let spec = SpecLoader::load_or_default(&dir.path().join("nope.yaml")).unwrap();
        assert!(spec.rules.is_empty());
    }

    #[test]
    fn test_save_roundtrip_preserves_rule_order() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/spec.yaml");
        let spec = SpecLoader::parse(YAML, SpecFormat::Yaml).unwrap();

        SpecLoader::save(&spec, &path).unwrap();
        let reloaded = SpecLoader::load(&path).unwrap();
        assert_eq!(reloaded, spec);
    }
}
