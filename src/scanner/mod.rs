//! Repository Scanner
//!
//! Fans independent detectors out over a repository and merges their
//! findings into a [`Report`].
//!
//! ## Detectors
//!
//! - [`DependencyDetector`]: `package.json` and `requirements.txt`
//! - [`DeprecatedApiDetector`]: deprecated API catalogue, syntax-confirmed
//! - [`StructureDetector`]: README, failing tests, obsolete config
//!
//! Detectors run concurrently; results are concatenated in registration
//! order. A detector that errors or panics contributes one high-severity
//! `scan-error:<name>` issue instead of aborting the scan.

pub mod dependency;
pub mod deprecated_api;
pub mod detector;
pub mod structure;
pub mod syntax;
pub mod walker;

pub use dependency::DependencyDetector;
pub use deprecated_api::{ApiPattern, CATALOGUE, DeprecatedApiDetector, PatternKind};
pub use detector::{Detector, ScanContext, SharedDetector};
pub use structure::StructureDetector;
pub use walker::{FileScanner, SourceFile};

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use tracing::{debug, info, instrument, warn};

use crate::config::ScannerConfig;
use crate::types::{Issue, IssueKind, Report, Result, ReviveError, Severity, repository_name};

pub struct Scanner {
    detectors: Vec<SharedDetector>,
    config: ScannerConfig,
}

impl Scanner {
    /// Scanner with the built-in detectors
    pub fn new(config: ScannerConfig) -> Self {
        Self::empty(config)
            .with_detector(Arc::new(DependencyDetector))
            .with_detector(Arc::new(DeprecatedApiDetector))
            .with_detector(Arc::new(StructureDetector))
    }

    /// Scanner with no detectors registered
    pub fn empty(config: ScannerConfig) -> Self {
        Self {
            detectors: Vec::new(),
            config,
        }
    }

    pub fn with_detector(mut self, detector: SharedDetector) -> Self {
        self.detectors.push(detector);
        self
    }

    pub fn detector_names(&self) -> Vec<&'static str> {
        self.detectors.iter().map(|d| d.name()).collect()
    }

    #[instrument(skip(self), fields(detectors = self.detectors.len()))]
    pub async fn scan(&self, root: &Path) -> Result<Report> {
        if !root.is_dir() {
            return Err(ReviveError::Config(format!(
                "Repository not found: {}",
                root.display()
            )));
        }

        let walker = FileScanner::source_files(root)
            .with_exclude(&self.config.exclude)
            .with_max_file_size(self.config.max_file_size);
        let files = tokio::task::spawn_blocking(move || walker.scan())
            .await
            .map_err(|e| ReviveError::Config(format!("File walk aborted: {}", e)))?;
        debug!(files = files.len(), "Collected source files");

        let ctx = Arc::new(ScanContext {
            root: root.to_path_buf(),
            files,
            syntax_confirmation: self.config.syntax_confirmation,
        });

        let runs = self.detectors.iter().map(|detector| {
            let detector = Arc::clone(detector);
            let ctx = Arc::clone(&ctx);
            async move {
                let name = detector.name();
                let outcome = tokio::task::spawn_blocking(move || detector.detect(&ctx)).await;
                (name, outcome)
            }
        });

        let mut issues = Vec::new();
        for (name, outcome) in join_all(runs).await {
            match outcome {
                Ok(Ok(found)) => {
                    debug!(detector = name, issues = found.len(), "Detector finished");
                    issues.extend(found);
                }
                Ok(Err(e)) => {
                    warn!(detector = name, error = %e, "Detector failed");
                    issues.push(scan_error(name, &e.to_string()));
                }
                Err(join) => {
                    warn!(detector = name, error = %join, "Detector panicked");
                    issues.push(scan_error(name, &format!("detector panicked: {}", join)));
                }
            }
        }

        let issues = dedup_by_id(issues);

        let mut languages: Vec<_> = ctx.files.iter().map(|f| f.language).collect();
        languages.sort();
        languages.dedup();

        let mut report = Report::new(repository_name(root), Utc::now(), issues);
        report.files_scanned = ctx.files.len();
        report.languages = languages;

        info!(
            issues = report.summary.total,
            files = report.files_scanned,
            "Scan complete"
        );
        Ok(report)
    }
}

fn scan_error(detector: &str, message: &str) -> Issue {
    Issue::new(
        format!("scan-error:{}", detector),
        IssueKind::ScanError,
        Severity::High,
        format!("Detector '{}' failed", detector),
    )
    .with_meta("error", message)
}

/// First occurrence of each id wins
fn dedup_by_id(issues: Vec<Issue>) -> Vec<Issue> {
    let mut seen = HashSet::new();
    issues
        .into_iter()
        .filter(|issue| {
            let fresh = seen.insert(issue.id.clone());
            if !fresh {
                warn!(id = %issue.id, "Dropping duplicate issue id");
            }
            fresh
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    struct Failing;
    impl Detector for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }
        fn detect(&self, _ctx: &ScanContext) -> Result<Vec<Issue>> {
            Err(ReviveError::parse("x", "boom"))
        }
    }

    struct Panicking;
    impl Detector for Panicking {
        fn name(&self) -> &'static str {
            "panicking"
        }
        fn detect(&self, _ctx: &ScanContext) -> Result<Vec<Issue>> {
            panic!("detector bug")
        }
    }

    struct Fixed(&'static str, &'static str);
    impl Detector for Fixed {
        fn name(&self) -> &'static str {
            self.0
        }
        fn detect(&self, _ctx: &ScanContext) -> Result<Vec<Issue>> {
            Ok(vec![Issue::new(
                self.1,
                IssueKind::Structure,
                Severity::Low,
                "fixed",
            )])
        }
    }

    fn sample_repo() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("package.json"),
            r#"{"dependencies":{"react":"^15.6.0"}}"#,
        )
        .unwrap();
        fs::write(
            dir.path().join("App.jsx"),
            "class App extends React.Component {\n  render() { return <div/>; }\n}\n",
        )
        .unwrap();
        fs::write(dir.path().join("worker.py"), "def f():\n    yield from g()\n").unwrap();
        dir
    }

    #[tokio::test]
    async fn test_scan_sample_repository() {
        let dir = sample_repo();
        let report = Scanner::new(ScannerConfig::default())
            .scan(dir.path())
            .await
            .unwrap();

        let ids: Vec<_> = report.issues.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                "dep:react",
                "refactor:class-component:App.jsx",
                "api:yield-from:worker.py",
                "structure:missing-readme",
            ]
        );
        assert_eq!(report.summary.total, 4);
        assert_eq!(report.summary.count(Severity::Medium), 2);
        assert_eq!(report.files_scanned, 2);
        assert_eq!(
            report.languages,
            vec![crate::types::Language::JavaScript, crate::types::Language::Python]
        );
    }

    #[tokio::test]
    async fn test_failing_and_panicking_detectors_become_issues() {
        let dir = TempDir::new().unwrap();
        let scanner = Scanner::empty(ScannerConfig::default())
            .with_detector(Arc::new(Fixed("first", "structure:a")))
            .with_detector(Arc::new(Failing))
            .with_detector(Arc::new(Panicking));

        let report = scanner.scan(dir.path()).await.unwrap();
        let ids: Vec<_> = report.issues.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(
            ids,
            vec!["structure:a", "scan-error:failing", "scan-error:panicking"]
        );
        assert!(
            report.issues[1..]
                .iter()
                .all(|i| i.severity == Severity::High)
        );
    }

    #[tokio::test]
    async fn test_duplicate_ids_dropped() {
        let dir = TempDir::new().unwrap();
        let scanner = Scanner::empty(ScannerConfig::default())
            .with_detector(Arc::new(Fixed("one", "structure:same")))
            .with_detector(Arc::new(Fixed("two", "structure:same")));

        let report = scanner.scan(dir.path()).await.unwrap();
        assert_eq!(report.issues.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_repository() {
        let dir = TempDir::new().unwrap();
        let err = Scanner::new(ScannerConfig::default())
            .scan(&dir.path().join("absent"))
            .await
            .unwrap_err();
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn test_scanner_does_not_write() {
        let dir = sample_repo();
        let before = fs::read_dir(dir.path()).unwrap().count();
        Scanner::new(ScannerConfig::default())
            .scan(dir.path())
            .await
            .unwrap();
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), before);
    }
}
