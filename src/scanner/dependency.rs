//! Dependency manifests: `package.json` and `requirements.txt`.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;

use serde_json::{Value, json};
use tracing::{debug, warn};

use super::detector::{Detector, ScanContext};
use crate::constants::paths;
use crate::types::{Issue, IssueKind, Language, Result, Severity};

/// Ids minted for a manifest that cannot be read or parsed
const PACKAGE_PARSE_ID: &str = "dep:package-parse";
const REQUIREMENTS_PARSE_ID: &str = "dep:requirements-parse";

/// Version comparison operators, longest first so `===` wins over `==`
const VERSION_OPERATORS: &[&str] = &["===", "==", ">=", "<=", "~=", "!=", ">", "<"];

pub struct DependencyDetector;

impl Detector for DependencyDetector {
    fn name(&self) -> &'static str {
        "dependencies"
    }

    fn detect(&self, ctx: &ScanContext) -> Result<Vec<Issue>> {
        let mut declared = Declared::default();

        match read_optional(&ctx.root.join(paths::PACKAGE_JSON)) {
            Ok(None) => {}
            Ok(Some(raw)) => match parse_package_json(&raw) {
                Ok(deps) => {
                    for (name, version) in deps {
                        declared.add(name, version, paths::PACKAGE_JSON, Language::JavaScript);
                    }
                }
                Err(e) => {
                    debug!(error = %e, "package.json did not parse");
                    declared.issues.push(manifest_error(
                        PACKAGE_PARSE_ID,
                        paths::PACKAGE_JSON,
                        Language::JavaScript,
                        &e.to_string(),
                    ));
                }
            },
            Err(e) => {
                warn!(error = %e, "package.json is unreadable");
                declared.issues.push(manifest_error(
                    PACKAGE_PARSE_ID,
                    paths::PACKAGE_JSON,
                    Language::JavaScript,
                    &e.to_string(),
                ));
            }
        }

        match read_optional(&ctx.root.join(paths::REQUIREMENTS_TXT)) {
            Ok(None) => {}
            Ok(Some(raw)) => {
                for (name, version) in parse_requirements(&raw) {
                    declared.add(name, version, paths::REQUIREMENTS_TXT, Language::Python);
                }
            }
            Err(e) => {
                warn!(error = %e, "requirements.txt is unreadable");
                declared.issues.push(manifest_error(
                    REQUIREMENTS_PARSE_ID,
                    paths::REQUIREMENTS_TXT,
                    Language::Python,
                    &e.to_string(),
                ));
            }
        }

        Ok(declared.issues)
    }
}

/// Issues keyed by dependency name; the first declaration wins
#[derive(Default)]
struct Declared {
    issues: Vec<Issue>,
    index: HashMap<String, usize>,
}

impl Declared {
    fn add(&mut self, name: String, version: String, source: &str, language: Language) {
        if let Some(&i) = self.index.get(&name) {
            let also = self.issues[i]
                .metadata
                .entry("alsoDeclaredIn")
                .or_insert_with(|| json!([]));
            if let Value::Array(sources) = also {
                sources.push(json!(source));
            }
            return;
        }

        self.index.insert(name.clone(), self.issues.len());
        self.issues.push(
            Issue::new(
                format!("dep:{}", name),
                IssueKind::Dependency,
                Severity::Low,
                format!("Dependency detected: {}", name),
            )
            .with_language(language)
            .with_file(source)
            .with_meta("version", version)
            .with_meta("source", source),
        );
    }
}

/// Medium issue standing in for a manifest that could not be read or parsed
fn manifest_error(id: &str, manifest: &str, language: Language, error: &str) -> Issue {
    Issue::new(
        id,
        IssueKind::Dependency,
        Severity::Medium,
        format!("Unable to parse {}", manifest),
    )
    .with_language(language)
    .with_file(manifest)
    .with_meta("error", error)
}

fn read_optional(path: &std::path::Path) -> Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(raw) => Ok(Some(raw)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// `dependencies` then `devDependencies`, in declaration order
fn parse_package_json(raw: &str) -> serde_json::Result<Vec<(String, String)>> {
    let manifest: Value = serde_json::from_str(raw)?;
    let mut deps = Vec::new();
    for section in ["dependencies", "devDependencies"] {
        if let Some(table) = manifest.get(section).and_then(Value::as_object) {
            for (name, version) in table {
                let version = version
                    .as_str()
                    .map(str::to_string)
                    .unwrap_or_else(|| version.to_string());
                deps.push((name.clone(), version));
            }
        }
    }
    Ok(deps)
}

/// Line-oriented requirements parsing: comments, blank lines and pip
/// options (`-r`, `-e`, `--index-url`) are skipped.
fn parse_requirements(raw: &str) -> Vec<(String, String)> {
    raw.lines()
        .map(|line| line.split(" #").next().unwrap_or(line).trim())
        .filter(|line| !line.is_empty() && !line.starts_with('#') && !line.starts_with('-'))
        .filter_map(|line| {
            let line = line.split(';').next().unwrap_or(line).trim();
            let split = VERSION_OPERATORS
                .iter()
                .filter_map(|op| line.find(op).map(|at| (at, op.len())))
                .min_by_key(|(at, _)| *at);

            let (name, version) = match split {
                Some((at, len)) => (&line[..at], line[at + len..].trim()),
                None => (line, ""),
            };
            let name = name.split('[').next().unwrap_or(name).trim();
            if name.is_empty() {
                return None;
            }
            let version = if version.is_empty() {
                "unspecified".to_string()
            } else {
                version.to_string()
            };
            Some((name.to_string(), version))
        })
        .collect()
}
