//! Rule document editing: list, add, remove, export, import.
//!
//! Every write goes through [`SpecLoader::save`], so an edit can never leave
//! an invalid document on disk.

use std::fs;
use std::path::Path;

use tracing::info;

use serde_json::{Value, json};

use super::loader::{SpecFormat, SpecLoader};
use super::model::{Rule, Spec};
use crate::types::{Result, ReviveError};

pub struct RuleEditor;

impl RuleEditor {
    pub fn list(spec_path: &Path) -> Result<Vec<String>> {
        Ok(SpecLoader::load_or_default(spec_path)?
            .rules
            .into_iter()
            .map(|r| r.name)
            .collect())
    }

    /// Replace the rule with the same name in place, else append.
    /// Returns `true` when an existing rule was replaced.
    pub fn upsert(spec_path: &Path, rule: Rule) -> Result<bool> {
        let mut spec = SpecLoader::load_or_default(spec_path)?;
        let replaced = match spec.rules.iter_mut().find(|r| r.name == rule.name) {
            Some(existing) => {
                *existing = rule;
                true
            }
            None => {
                spec.rules.push(rule);
                false
            }
        };
        SpecLoader::save(&spec, spec_path)?;
        info!(path = %spec_path.display(), replaced, "Rule saved");
        Ok(replaced)
    }

    /// Add a rule read from a standalone YAML/JSON/TOML file
    pub fn add_from_file(spec_path: &Path, rule_path: &Path) -> Result<bool> {
        let content = fs::read_to_string(rule_path)?;
        let raw: Value = match SpecFormat::from_path(rule_path) {
            SpecFormat::Yaml => serde_yaml::from_str(&content)?,
            SpecFormat::Json => serde_json::from_str(&content)?,
            SpecFormat::Toml => toml::from_str(&content)
                .map_err(|e| ReviveError::Config(format!("Invalid rule TOML: {}", e)))?,
        };
        let mut wrapped = SpecLoader::from_value(json!({ "version": "1", "rules": [raw] }))?;
        match wrapped.rules.pop() {
            Some(rule) => Self::upsert(spec_path, rule),
            None => Ok(false),
        }
    }

    /// Remove a rule by name. Returns `false` when no rule had that name.
    pub fn remove(spec_path: &Path, name: &str) -> Result<bool> {
        let mut spec: Spec = SpecLoader::load_or_default(spec_path)?;
        let before = spec.rules.len();
        spec.rules.retain(|r| r.name != name);
        if spec.rules.len() == before {
            return Ok(false);
        }
        SpecLoader::save(&spec, spec_path)?;
        info!(path = %spec_path.display(), rule = name, "Rule removed");
        Ok(true)
    }

    /// Copy the current spec to `output`, converting format by extension
    pub fn export(spec_path: &Path, output: &Path) -> Result<()> {
        let spec = SpecLoader::load(spec_path)?;
        SpecLoader::save(&spec, output)
    }

    /// Validate `input` and install it as the current spec
    pub fn import(spec_path: &Path, input: &Path) -> Result<()> {
        let spec = SpecLoader::load(input)?;
        SpecLoader::save(&spec, spec_path)
    }
}
