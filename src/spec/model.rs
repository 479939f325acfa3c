//! Rule document types and rule evaluation.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::types::{Language, TaskType};

/// Validated rule document. Rule order is significant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spec {
    pub version: String,
    pub rules: Vec<Rule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependencies: Option<Value>,
}

impl Default for Spec {
    fn default() -> Self {
        Self {
            version: "1".to_string(),
            rules: Vec::new(),
            dependencies: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    /// Language identifiers; absent or empty matches every language
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub languages: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "RuleOptions::is_empty")]
    pub options: RuleOptions,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleOptions {
    #[serde(
        default,
        deserialize_with = "deserialize_task_type",
        skip_serializing_if = "Option::is_none"
    )]
    pub task_type: Option<TaskType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence_multiplier: Option<f64>,
    /// Unrecognised options are carried through untouched
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RuleOptions {
    fn is_empty(&self) -> bool {
        self.task_type.is_none() && self.confidence_multiplier.is_none() && self.extra.is_empty()
    }
}

fn deserialize_task_type<'de, D>(deserializer: D) -> Result<Option<TaskType>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer)?
        .map(|raw| raw.parse().map_err(serde::de::Error::custom))
        .transpose()
}

impl Rule {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            enabled: None,
            languages: None,
            options: RuleOptions::default(),
        }
    }

    pub fn is_disabled(&self) -> bool {
        self.enabled == Some(false)
    }

    /// A rule applies when its task type (if any) and language list (if
    /// non-empty) both admit the task.
    pub fn matches(&self, task_type: TaskType, language: Language) -> bool {
        let type_ok = self.options.task_type.is_none_or(|t| t == task_type);
        let language_ok = match &self.languages {
            Some(langs) if !langs.is_empty() => langs
                .iter()
                .any(|l| l.trim().eq_ignore_ascii_case(language.as_str())),
            _ => true,
        };
        type_ok && language_ok
    }
}

/// Outcome of evaluating every rule against one task
#[derive(Debug, Clone, PartialEq)]
pub enum RuleVerdict {
    /// Keep the task; `multiplier` is the product of every matching rule's
    /// finite `confidenceMultiplier`, 1.0 when none apply.
    Keep { multiplier: f64 },
    /// The first matching rule with `enabled: false`
    Drop { rule: String },
}

impl Spec {
    /// Walk the rules in declaration order. A disabling rule ends the walk.
    pub fn evaluate(&self, task_type: TaskType, language: Language) -> RuleVerdict {
        let mut multiplier = 1.0;
        for rule in self.rules.iter().filter(|r| r.matches(task_type, language)) {
            if rule.is_disabled() {
                return RuleVerdict::Drop {
                    rule: rule.name.clone(),
                };
            }
            if let Some(m) = rule.options.confidence_multiplier
                && m.is_finite()
            {
                multiplier *= m;
            }
        }
        RuleVerdict::Keep { multiplier }
    }

    pub fn disables(&self, task_type: TaskType, language: Language) -> bool {
        matches!(
            self.evaluate(task_type, language),
            RuleVerdict::Drop { .. }
        )
    }

    pub fn rule(&self, name: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.name == name)
    }

    pub fn rule_names(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.name.as_str()).collect()
    }
}
