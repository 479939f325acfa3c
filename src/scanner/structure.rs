//! Repository-level structural checks.

use std::fs;

use super::detector::{Detector, ScanContext};
use crate::constants::{paths, scanner};
use crate::types::{Issue, IssueKind, Language, Result, Severity};

pub struct StructureDetector;

impl Detector for StructureDetector {
    fn name(&self) -> &'static str {
        "structure"
    }

    fn detect(&self, ctx: &ScanContext) -> Result<Vec<Issue>> {
        let mut issues = Vec::new();

        if !has_readme(ctx) {
            issues.push(
                Issue::new(
                    "structure:missing-readme",
                    IssueKind::Documentation,
                    Severity::Low,
                    "Missing README.md",
                )
                .with_language(Language::Unknown)
                .with_file(paths::README),
            );
        }

        let failing = fs::read_to_string(ctx.root.join(paths::TEST_RESULTS))
            .map(|log| log.contains(scanner::FAILING_TESTS_MARKER))
            .unwrap_or(false);
        if failing {
            issues.push(
                Issue::new(
                    "structure:failing-tests",
                    IssueKind::Structure,
                    Severity::High,
                    "Detected failing tests",
                )
                .with_language(Language::Unknown)
                .with_file(paths::TEST_RESULTS),
            );
        }

        if ctx.root.join(paths::OBSOLETE_CONFIG).is_file() {
            issues.push(
                Issue::new(
                    "structure:obsolete-config",
                    IssueKind::Structure,
                    Severity::Medium,
                    "Obsolete configuration detected",
                )
                .with_language(Language::Unknown)
                .with_file(paths::OBSOLETE_CONFIG),
            );
        }

        Ok(issues)
    }
}

/// An empty README counts as missing
fn has_readme(ctx: &ScanContext) -> bool {
    fs::metadata(ctx.root.join(paths::README))
        .map(|m| m.is_file() && m.len() > 0)
        .unwrap_or(false)
}
