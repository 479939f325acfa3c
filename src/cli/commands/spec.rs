//! Spec Command
//!
//! Inspect and edit the repository's rule document.
//!
//! Usage:
//!   revive spec validate [FILE]
//!   revive spec rules
//!   revive spec add-rule --name NAME [--task-type T] [--language L]... [--multiplier X] [--disabled]
//!   revive spec add-rule --file RULE.yaml
//!   revive spec remove-rule NAME
//!   revive spec export OUTPUT
//!   revive spec import INPUT

use std::path::{Path, PathBuf};

use serde_json::json;

use crate::cli::ui::Output;
use crate::cli::util::{CommandContext, OutputFormat, print_json};
use crate::spec::{Rule, RuleEditor, SpecLoader};
use crate::types::{Result, ReviveError, TaskType};

/// Inline rule definition for `add-rule`
#[derive(Debug, Clone, Default)]
pub struct RuleArgs {
    pub name: Option<String>,
    pub file: Option<PathBuf>,
    pub description: Option<String>,
    pub task_type: Option<TaskType>,
    pub languages: Vec<String>,
    pub multiplier: Option<f64>,
    pub disabled: bool,
}

impl RuleArgs {
    fn into_rule(self) -> Result<Rule> {
        let name = self
            .name
            .filter(|n| !n.trim().is_empty())
            .ok_or_else(|| ReviveError::Config("add-rule needs --name or --file".to_string()))?;

        let mut rule = Rule::new(name);
        rule.description = self.description;
        rule.enabled = self.disabled.then_some(false);
        rule.languages = (!self.languages.is_empty()).then_some(self.languages);
        rule.options.task_type = self.task_type;
        rule.options.confidence_multiplier = self.multiplier;
        Ok(rule)
    }
}

/// Validate the repository's rule document, or `file` when given
pub fn validate(repo: &Path, file: Option<PathBuf>, format: OutputFormat) -> Result<()> {
    let ctx = CommandContext::load(repo)?;
    let path = file.unwrap_or_else(|| ctx.spec_path());
    let exists = path.exists();
    let spec = SpecLoader::load_or_default(&path)?;

    if format.is_json() {
        return print_json(&json!({
            "path": path,
            "exists": exists,
            "valid": true,
            "version": spec.version,
            "rules": spec.rule_names(),
        }));
    }

    let out = Output::new();
    if exists {
        out.success(&format!("{} is valid", path.display()));
    } else {
        out.info(&format!(
            "No rule document at {}; built-in defaults apply",
            path.display()
        ));
    }
    out.field("Version", &spec.version);
    out.field("Rules", spec.rules.len());
    Ok(())
}

pub fn rules(repo: &Path, format: OutputFormat) -> Result<()> {
    let ctx = CommandContext::load(repo)?;
    let spec = SpecLoader::load_or_default(&ctx.spec_path())?;

    if format.is_json() {
        return print_json(&spec.rules);
    }

    let out = Output::new();
    if spec.rules.is_empty() {
        out.info("No rules defined");
        return Ok(());
    }
    out.section(&format!("Rules ({})", spec.rules.len()));
    for rule in &spec.rules {
        let mut details = Vec::new();
        if rule.is_disabled() {
            details.push("disabled".to_string());
        }
        if let Some(task_type) = rule.options.task_type {
            details.push(format!("type={}", task_type));
        }
        if let Some(langs) = rule.languages.as_ref().filter(|l| !l.is_empty()) {
            details.push(format!("languages={}", langs.join(",")));
        }
        if let Some(m) = rule.options.confidence_multiplier {
            details.push(format!("×{}", m));
        }
        if details.is_empty() {
            out.item(&rule.name);
        } else {
            out.item(&format!("{} ({})", rule.name, details.join(", ")));
        }
    }
    Ok(())
}

pub fn add_rule(repo: &Path, args: RuleArgs) -> Result<()> {
    let ctx = CommandContext::load(repo)?;
    let spec_path = ctx.spec_path();

    let replaced = match args.file.clone() {
        Some(file) => RuleEditor::add_from_file(&spec_path, &file)?,
        None => RuleEditor::upsert(&spec_path, args.into_rule()?)?,
    };

    let out = Output::new();
    if replaced {
        out.success("Rule replaced");
    } else {
        out.success("Rule added");
    }
    out.field("Spec", spec_path.display());
    Ok(())
}

pub fn remove_rule(repo: &Path, name: &str) -> Result<()> {
    let ctx = CommandContext::load(repo)?;
    let out = Output::new();
    if RuleEditor::remove(&ctx.spec_path(), name)? {
        out.success(&format!("Removed rule '{}'", name));
    } else {
        out.warning(&format!("No rule named '{}'", name));
    }
    Ok(())
}

pub fn export(repo: &Path, output: &Path) -> Result<()> {
    let ctx = CommandContext::load(repo)?;
    RuleEditor::export(&ctx.spec_path(), output)?;
    Output::new().success(&format!("Exported rules to {}", output.display()));
    Ok(())
}

pub fn import(repo: &Path, input: &Path) -> Result<()> {
    let ctx = CommandContext::load(repo)?;
    RuleEditor::import(&ctx.spec_path(), input)?;
    Output::new().success(&format!("Imported rules from {}", input.display()));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_args_into_rule() {
        let rule = RuleArgs {
            name: Some("legacy-python".into()),
            task_type: Some(TaskType::Refactor),
            languages: vec!["python".into()],
            multiplier: Some(0.5),
            disabled: true,
            ..RuleArgs::default()
        }
        .into_rule()
        .unwrap();

        assert_eq!(rule.name, "legacy-python");
        assert!(rule.is_disabled());
        assert_eq!(rule.languages, Some(vec!["python".to_string()]));
        assert_eq!(rule.options.confidence_multiplier, Some(0.5));
        assert_eq!(rule.options.task_type, Some(TaskType::Refactor));
    }

    #[test]
    fn test_rule_args_require_name() {
        let err = RuleArgs {
            name: Some("  ".into()),
            ..RuleArgs::default()
        }
        .into_rule()
        .unwrap_err();
        assert!(matches!(err, ReviveError::Config(_)));
    }

    #[test]
    fn test_enabled_rule_leaves_flag_unset() {
        let rule = RuleArgs {
            name: Some("keep".into()),
            ..RuleArgs::default()
        }
        .into_rule()
        .unwrap();
        assert_eq!(rule.enabled, None);
        assert_eq!(rule.languages, None);
    }
}
