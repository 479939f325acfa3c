//! Scan findings: [`Issue`] and the [`Report`] that carries them.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::language::Language;

/// Issue severity, ordered from least to most severe
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    #[default]
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub const ALL: [Severity; 5] = [
        Severity::Info,
        Severity::Low,
        Severity::Medium,
        Severity::High,
        Severity::Critical,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Severity::ALL
            .iter()
            .find(|sev| sev.as_str().eq_ignore_ascii_case(s.trim()))
            .copied()
            .ok_or_else(|| format!("Unknown severity: {}", s))
    }
}

/// Category of a finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IssueKind {
    Dependency,
    Api,
    Documentation,
    Structure,
    ScanError,
}

/// A single finding produced by a detector.
///
/// The `id` is derived from the finding's source (`dep:<name>`,
/// `api:<pattern>:<file>`, `structure:<check>`, ...) and is unique within
/// one [`Report`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: IssueKind,
    pub severity: Severity,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<Language>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<u8>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
}

impl Issue {
    pub fn new(
        id: impl Into<String>,
        kind: IssueKind,
        severity: Severity,
        title: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            severity,
            title: title.into(),
            language: None,
            file_path: None,
            line: None,
            confidence: None,
            metadata: Map::new(),
        }
    }

    pub fn with_language(mut self, language: Language) -> Self {
        self.language = Some(language);
        self
    }

    pub fn with_file(mut self, file_path: impl Into<String>) -> Self {
        self.file_path = Some(file_path.into());
        self
    }

    pub fn with_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    pub fn with_meta(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self
    }
}

/// Issue counts for a report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub total: usize,
    /// Always carries every severity, zero counts included
    pub by_severity: BTreeMap<Severity, usize>,
}

impl ReportSummary {
    pub fn from_issues(issues: &[Issue]) -> Self {
        let mut by_severity: BTreeMap<Severity, usize> =
            Severity::ALL.iter().map(|s| (*s, 0)).collect();
        for issue in issues {
            *by_severity.entry(issue.severity).or_default() += 1;
        }
        Self {
            total: issues.len(),
            by_severity,
        }
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.by_severity.get(&severity).copied().unwrap_or(0)
    }
}

/// Output of the scan stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub repository: String,
    pub scanned_at: DateTime<Utc>,
    pub issues: Vec<Issue>,
    pub summary: ReportSummary,
    #[serde(default)]
    pub files_scanned: usize,
    #[serde(default)]
    pub languages: Vec<Language>,
}

impl Report {
    pub fn new(repository: impl Into<String>, scanned_at: DateTime<Utc>, issues: Vec<Issue>) -> Self {
        let summary = ReportSummary::from_issues(&issues);
        Self {
            repository: repository.into(),
            scanned_at,
            issues,
            summary,
            files_scanned: 0,
            languages: Vec::new(),
        }
    }

    /// Recompute the summary after the issue list changed (e.g. via a hook)
    pub fn refresh_summary(&mut self) {
        self.summary = ReportSummary::from_issues(&self.issues);
    }

    /// Names of every declared dependency, sorted and deduplicated
    pub fn dependency_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .issues
            .iter()
            .filter(|i| i.kind == IssueKind::Dependency)
            .filter_map(|i| i.id.strip_prefix("dep:"))
            .filter(|name| *name != "package-parse")
            .map(str::to_string)
            .collect();
        names.sort();
        names.dedup();
        names
    }
}
