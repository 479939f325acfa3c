//! Modernization Planner
//!
//! Pure mapping from a [`Report`] and a rule [`Spec`] to a [`Plan`]: one
//! candidate task per issue, scored by severity, then kept, dropped or
//! re-weighted by the rule document's rules in declaration order.

use serde_json::{Map, Value, json};
use tracing::debug;

use crate::constants::{paths, planner as scoring};
use crate::spec::{RuleVerdict, Spec};
use crate::types::{Issue, Language, ModernizationTask, Plan, Report, Severity, TaskType};

/// Task type implied by an issue id prefix
pub fn classify(issue_id: &str) -> TaskType {
    if issue_id.starts_with("dep:") {
        TaskType::Dependency
    } else if issue_id.starts_with("api:") {
        TaskType::ApiReplacement
    } else if let Some(check) = issue_id.strip_prefix("structure:") {
        if check.contains("readme") {
            TaskType::Documentation
        } else {
            TaskType::Refactor
        }
    } else {
        TaskType::Refactor
    }
}

/// `clamp(round(base(severity) × multiplier), 0, 100)`
pub fn score(severity: Severity, multiplier: f64) -> u8 {
    let raw = (scoring::base_confidence(severity) * multiplier).round();
    if raw.is_nan() {
        return scoring::MIN_CONFIDENCE;
    }
    raw.clamp(
        f64::from(scoring::MIN_CONFIDENCE),
        f64::from(scoring::MAX_CONFIDENCE),
    ) as u8
}

/// Build a plan. Deterministic for a given (report, spec) pair.
pub fn plan(report: &Report, spec: &Spec) -> Plan {
    let dependencies = report.dependency_names();

    let tasks: Vec<ModernizationTask> = report
        .issues
        .iter()
        .filter_map(|issue| {
            let task_type = classify(&issue.id);
            let language = issue.language.unwrap_or_default();

            match spec.evaluate(task_type, language) {
                RuleVerdict::Drop { rule } => {
                    debug!(issue = %issue.id, rule = %rule, "Task disabled by rule");
                    None
                }
                RuleVerdict::Keep { multiplier } => Some(build_task(
                    issue,
                    task_type,
                    language,
                    score(issue.severity, multiplier),
                    report,
                    &dependencies,
                )),
            }
        })
        .collect();

    debug!(
        issues = report.issues.len(),
        tasks = tasks.len(),
        "Plan generated"
    );

    Plan {
        repository: report.repository.clone(),
        generated_at: report.scanned_at,
        tasks,
    }
}

fn build_task(
    issue: &Issue,
    task_type: TaskType,
    language: Language,
    confidence: u8,
    report: &Report,
    dependencies: &[String],
) -> ModernizationTask {
    let mut metadata = Map::new();
    metadata.insert("issueId".into(), json!(issue.id));
    if let Some(line) = issue.line {
        metadata.insert("line".into(), json!(line));
    }
    if !issue.metadata.is_empty() {
        metadata.insert("details".into(), Value::Object(issue.metadata.clone()));
    }

    let files = if task_type == TaskType::Documentation {
        metadata.insert("projectName".into(), json!(report.repository));
        metadata.insert("dependencies".into(), json!(dependencies));
        vec![paths::README.to_string()]
    } else {
        issue.file_path.iter().cloned().collect()
    };

    ModernizationTask {
        id: format!("task:{}", issue.id),
        task_type,
        title: issue.title.clone(),
        severity: issue.severity,
        confidence,
        language,
        files,
        metadata,
    }
}
