//! Deprecated API and legacy-pattern catalogue.

use std::fs;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::json;
use tracing::debug;

use super::detector::{Detector, ScanContext};
use super::syntax;
use crate::types::{Issue, IssueKind, Language, Result, Severity};

/// Whether a pattern asks for an API swap or a structural rewrite
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternKind {
    Api,
    Refactor,
}

impl PatternKind {
    fn id_prefix(&self) -> &'static str {
        match self {
            PatternKind::Api => "api",
            PatternKind::Refactor => "refactor",
        }
    }

    fn issue_kind(&self) -> IssueKind {
        match self {
            PatternKind::Api => IssueKind::Api,
            PatternKind::Refactor => IssueKind::Structure,
        }
    }
}

pub struct ApiPattern {
    pub id: &'static str,
    pub title: &'static str,
    pub kind: PatternKind,
    ecmascript: bool,
    regex: LazyLock<Regex>,
}

impl ApiPattern {
    pub fn applies_to(&self, language: Language) -> bool {
        if self.ecmascript {
            language.is_ecmascript()
        } else {
            language == Language::Python
        }
    }

    /// Byte offsets of every text match
    pub fn find(&self, source: &str) -> Vec<usize> {
        self.regex.find_iter(source).map(|m| m.start()).collect()
    }
}

macro_rules! api_pattern {
    ($id:literal, $title:literal, $kind:ident, $ecma:literal, $re:literal) => {
        ApiPattern {
            id: $id,
            title: $title,
            kind: PatternKind::$kind,
            ecmascript: $ecma,
            regex: LazyLock::new(|| Regex::new($re).expect("catalogue regex is valid")),
        }
    };
}

pub static CATALOGUE: [ApiPattern; 6] = [
    // JavaScript / TypeScript
    api_pattern!("react-create-class", "Uses React.createClass", Api, true, r"\bReact\.createClass\b"),
    api_pattern!("component-will-mount", "Uses componentWillMount", Api, true, r"\bcomponentWillMount\b"),
    api_pattern!(
        "class-component",
        "Class component can become a function component",
        Refactor,
        true,
        r"\bclass\s+[A-Za-z_$][\w$]*\s+extends\s+(?:React\.)?Component\b"
    ),
    // Python
    api_pattern!("asyncio-get-loop", "Uses asyncio.get_event_loop", Api, false, r"\basyncio\.get_event_loop\b"),
    api_pattern!("yield-from", "Uses legacy yield from", Api, false, r"\byield\s+from\b"),
    api_pattern!("asyncio-coroutine", "Uses @asyncio.coroutine", Api, false, r"@asyncio\.coroutine\b"),
];

pub struct DeprecatedApiDetector;

impl Detector for DeprecatedApiDetector {
    fn name(&self) -> &'static str {
        "deprecated-apis"
    }

    fn detect(&self, ctx: &ScanContext) -> Result<Vec<Issue>> {
        let mut issues = Vec::new();

        for file in &ctx.files {
            let patterns: Vec<&ApiPattern> = CATALOGUE
                .iter()
                .filter(|p| p.applies_to(file.language))
                .collect();
            if patterns.is_empty() {
                continue;
            }

            let Ok(source) = fs::read_to_string(&file.path) else {
                debug!(file = %file.relative, "Unreadable, skipping");
                continue;
            };

            let hits: Vec<(&ApiPattern, Vec<usize>)> = patterns
                .into_iter()
                .map(|p| (p, p.find(&source)))
                .filter(|(_, offsets)| !offsets.is_empty())
                .collect();
            if hits.is_empty() {
                continue;
            }

            let masked = if ctx.syntax_confirmation {
                syntax::masked_ranges(&file.path, file.language, &source)
            } else {
                None
            };

            for (pattern, offsets) in hits {
                let confirmed = syntax::confirm(offsets, masked.as_deref());
                let mut lines: Vec<usize> = confirmed
                    .iter()
                    .map(|offset| syntax::line_of(&source, *offset))
                    .collect();
                lines.dedup();
                let Some(&first) = lines.first() else {
                    continue;
                };

                issues.push(
                    Issue::new(
                        format!("{}:{}:{}", pattern.kind.id_prefix(), pattern.id, file.relative),
                        pattern.kind.issue_kind(),
                        Severity::Medium,
                        pattern.title,
                    )
                    .with_language(file.language)
                    .with_file(file.relative.clone())
                    .with_line(first)
                    .with_meta("pattern", pattern.id)
                    .with_meta("lines", json!(lines)),
                );
            }
        }

        Ok(issues)
    }
}
