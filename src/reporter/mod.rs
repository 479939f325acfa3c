//! Reporter
//!
//! Pure rendering of a run into a [`Bundle`]: a markdown roadmap, a pull
//! request description and per-file line diffs.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use crate::types::{
    Bundle, BundleSummary, DiffInput, DiffStat, Plan, Result, TaskType, TransformResult,
};

/// Index-aligned line diff. Equal positions are context, differing
/// positions emit one deletion and one addition.
pub fn diff_lines(input: &DiffInput) -> DiffStat {
    let before: Vec<&str> = input.before.split('\n').collect();
    let after: Vec<&str> = input.after.split('\n').collect();

    let mut diff = format!("--- a/{0}\n+++ b/{0}\n", input.file_path);
    let mut additions = 0;
    let mut deletions = 0;

    for i in 0..before.len().max(after.len()) {
        match (before.get(i), after.get(i)) {
            (Some(old), Some(new)) if old == new => {
                let _ = writeln!(diff, " {}", old);
            }
            (old, new) => {
                if let Some(old) = old {
                    let _ = writeln!(diff, "-{}", old);
                    deletions += 1;
                }
                if let Some(new) = new {
                    let _ = writeln!(diff, "+{}", new);
                    additions += 1;
                }
            }
        }
    }

    DiffStat {
        file_path: input.file_path.clone(),
        diff,
        additions,
        deletions,
    }
}

pub fn roadmap(plan: &Plan, transform: &TransformResult) -> String {
    let mut out = String::from("# Roadmap\n\n");
    let _ = writeln!(out, "Repository: {}", plan.repository);
    let _ = writeln!(out, "Generated: {}", plan.generated_at.to_rfc3339());

    for task_type in TaskType::ALL {
        let tasks: Vec<_> = plan.tasks_of(task_type).collect();
        if tasks.is_empty() {
            continue;
        }
        let _ = writeln!(out, "\n## {}\n", task_type.label());
        for task in tasks {
            let files = if task.files.is_empty() {
                "none".to_string()
            } else {
                task.files.join(", ")
            };
            let _ = writeln!(
                out,
                "- {} (files: {}) [confidence {}]",
                task.title, files, task.confidence
            );
        }
    }

    out.push_str("\n## Modified Files\n\n");
    push_file_list(&mut out, &transform.modified_files);
    out
}

pub fn pr_description(plan: &Plan, transform: &TransformResult, summary: &BundleSummary) -> String {
    let mut out = String::from("## Automated modernization\n\n");
    let _ = writeln!(out, "Repository: {}", plan.repository);
    let _ = writeln!(out, "Tasks: {}", plan.tasks.len());
    let _ = writeln!(out, "Files changed: {}", transform.modified_files.len());
    let _ = writeln!(
        out,
        "Changes: +{} / -{}",
        summary.total_additions, summary.total_deletions
    );

    out.push_str("\n### Files\n\n");
    push_file_list(&mut out, &transform.modified_files);

    if !transform.warnings.is_empty() {
        out.push_str("\n### Warnings\n\n");
        for warning in &transform.warnings {
            let _ = writeln!(out, "- {}", warning);
        }
    }

    out.push_str("\nPlease review the generated changes before merging.\n");
    out
}

pub fn build_bundle(plan: &Plan, transform: &TransformResult, diffs: &[DiffInput]) -> Bundle {
    let diffs: Vec<DiffStat> = diffs.iter().map(diff_lines).collect();
    let summary = BundleSummary {
        total_additions: diffs.iter().map(|d| d.additions).sum(),
        total_deletions: diffs.iter().map(|d| d.deletions).sum(),
    };

    Bundle {
        roadmap: roadmap(plan, transform),
        pr_description: pr_description(plan, transform, &summary),
        diffs,
        summary,
    }
}

/// Write `roadmap.md`, `pull-request.md` and `bundle.json` into `dir`
pub fn write_bundle(bundle: &Bundle, dir: &Path) -> Result<()> {
    fs::create_dir_all(dir)?;
    fs::write(dir.join("roadmap.md"), &bundle.roadmap)?;
    fs::write(dir.join("pull-request.md"), &bundle.pr_description)?;
    fs::write(dir.join("bundle.json"), serde_json::to_string_pretty(bundle)?)?;
    Ok(())
}

fn push_file_list(out: &mut String, files: &[String]) {
    if files.is_empty() {
        out.push_str("- None\n");
    }
    for file in files {
        let _ = writeln!(out, "- {}", file);
    }
}
