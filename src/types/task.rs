//! Planned work: [`ModernizationTask`], [`Plan`] and the transform outcome.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::issue::Severity;
use super::language::Language;

/// Kind of modernization work a task represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskType {
    Dependency,
    ApiReplacement,
    Refactor,
    Documentation,
}

impl TaskType {
    /// Roadmap section order
    pub const ALL: [TaskType; 4] = [
        TaskType::Dependency,
        TaskType::ApiReplacement,
        TaskType::Refactor,
        TaskType::Documentation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskType::Dependency => "dependency",
            TaskType::ApiReplacement => "api-replacement",
            TaskType::Refactor => "refactor",
            TaskType::Documentation => "documentation",
        }
    }

    /// Section heading used in the roadmap
    pub fn label(&self) -> &'static str {
        match self {
            TaskType::Dependency => "Dependencies",
            TaskType::ApiReplacement => "APIs",
            TaskType::Refactor => "Structure",
            TaskType::Documentation => "Documentation",
        }
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskType {
    type Err = String;

    /// Accepts kebab-case (`api-replacement`), PascalCase (`ApiReplacement`)
    /// and snake_case spellings.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match normalized.as_str() {
            "dependency" => Ok(TaskType::Dependency),
            "apireplacement" => Ok(TaskType::ApiReplacement),
            "refactor" => Ok(TaskType::Refactor),
            "documentation" => Ok(TaskType::Documentation),
            _ => Err(format!(
                "Unknown task type: {}. Valid values: dependency, api-replacement, refactor, documentation",
                s
            )),
        }
    }
}

/// A unit of modernization work derived from exactly one issue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModernizationTask {
    /// `task:<issue id>`
    pub id: String,
    #[serde(rename = "type")]
    pub task_type: TaskType,
    pub title: String,
    pub severity: Severity,
    /// Always within `0..=100`
    pub confidence: u8,
    #[serde(default)]
    pub language: Language,
    /// Every file the transformer may touch for this task
    #[serde(default)]
    pub files: Vec<String>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
}

impl ModernizationTask {
    pub fn meta_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(Value::as_str)
    }

    pub fn meta_strings(&self, key: &str) -> Vec<String> {
        self.metadata
            .get(key)
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Catalogue pattern the task was planned for: `details.pattern`, else
    /// the middle segment of an `api:<pattern>:<file>` or
    /// `refactor:<pattern>:<file>` issue id.
    pub fn pattern(&self) -> Option<&str> {
        if let Some(pattern) = self
            .metadata
            .get("details")
            .and_then(|d| d.get("pattern"))
            .and_then(Value::as_str)
        {
            return Some(pattern);
        }

        let issue_id = self
            .meta_str("issueId")
            .unwrap_or_else(|| self.id.strip_prefix("task:").unwrap_or(&self.id));
        let mut parts = issue_id.splitn(3, ':');
        match (parts.next(), parts.next(), parts.next()) {
            (Some("api" | "refactor"), Some(pattern), Some(_)) if !pattern.is_empty() => {
                Some(pattern)
            }
            _ => None,
        }
    }
}

/// Ordered task list derived from one report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    pub repository: String,
    pub generated_at: DateTime<Utc>,
    pub tasks: Vec<ModernizationTask>,
}

impl Plan {
    pub fn tasks_of(&self, task_type: TaskType) -> impl Iterator<Item = &ModernizationTask> {
        self.tasks.iter().filter(move |t| t.task_type == task_type)
    }
}

/// Outcome of the transform stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformResult {
    pub repository: String,
    pub applied_at: DateTime<Utc>,
    /// Each changed file once, in first-change order
    pub modified_files: Vec<String>,
    pub warnings: Vec<String>,
}

impl TransformResult {
    pub fn new(repository: impl Into<String>) -> Self {
        Self {
            repository: repository.into(),
            applied_at: Utc::now(),
            modified_files: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Record a changed file, keeping first-change order
    pub fn record_modified(&mut self, file: &str) {
        if !self.modified_files.iter().any(|f| f == file) {
            self.modified_files.push(file.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_type_parsing() {
        assert_eq!("api-replacement".parse(), Ok(TaskType::ApiReplacement));
        assert_eq!("ApiReplacement".parse(), Ok(TaskType::ApiReplacement));
        assert_eq!("api_replacement".parse(), Ok(TaskType::ApiReplacement));
        assert_eq!("Documentation".parse(), Ok(TaskType::Documentation));
        assert!("cleanup".parse::<TaskType>().is_err());
    }

    #[test]
    fn test_task_type_labels() {
        let labels: Vec<_> = TaskType::ALL.iter().map(TaskType::label).collect();
        assert_eq!(labels, vec!["Dependencies", "APIs", "Structure", "Documentation"]);
    }

    fn task(id: &str, metadata: Value) -> ModernizationTask {
        ModernizationTask {
            id: id.into(),
            task_type: TaskType::Refactor,
            title: id.into(),
            severity: Severity::Medium,
            confidence: 60,
            language: Language::JavaScript,
            files: Vec::new(),
            metadata: metadata.as_object().cloned().unwrap_or_default(),
        }
    }

    #[test]
    fn test_pattern_from_details_then_id() {
        let planned = task(
            "task:api:component-will-mount:App.jsx",
            serde_json::json!({"details": {"pattern": "component-will-mount"}}),
        );
        assert_eq!(planned.pattern(), Some("component-will-mount"));

        let bare = task("task:refactor:class-component:src/App.js", Value::Null);
        assert_eq!(bare.pattern(), Some("class-component"));

        assert_eq!(task("task:dep:react", Value::Null).pattern(), None);
        assert_eq!(task("task:refactor:a", Value::Null).pattern(), None);
    }

    #[test]
    fn test_record_modified_dedups() {
        let mut result = TransformResult::new("repo");
        result.record_modified("a.js");
        result.record_modified("b.py");
        result.record_modified("a.js");
        assert_eq!(result.modified_files, vec!["a.js", "b.py"]);
    }

    #[test]
    fn test_task_serde_shape() {
        let task = ModernizationTask {
            id: "task:dep:react".into(),
            task_type: TaskType::Dependency,
            title: "Upgrade react".into(),
            severity: Severity::Low,
            confidence: 40,
            language: Language::JavaScript,
            files: vec!["package.json".into()],
            metadata: Map::new(),
        };
        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(json["type"], "dependency");
        assert_eq!(json["confidence"], 40);

        let back: ModernizationTask = serde_json::from_value(json).unwrap();
        assert_eq!(back, task);
    }
}
