pub mod bundle;
pub mod error;
pub mod issue;
pub mod language;
pub mod task;

pub use bundle::{Bundle, BundleSummary, DiffInput, DiffStat};
pub use error::{
    ErrorCategory, IntegrationError, Result, ReviveError, ValidationError, ValidationErrorKind,
};
pub use issue::{Issue, IssueKind, Report, ReportSummary, Severity};
pub use language::Language;
pub use task::{ModernizationTask, Plan, TaskType, TransformResult};

/// Normalise a path relative to the repository root into `/`-separated form
pub fn relative_path(root: &std::path::Path, path: &std::path::Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Whether a task file stays inside the repository: relative, with no
/// `..` components
pub fn is_repo_relative(path: &str) -> bool {
    use std::path::Component;

    !path.is_empty()
        && !path.starts_with('/')
        && !path.starts_with('\\')
        && std::path::Path::new(path)
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

/// Repository display name (final path component)
pub fn repository_name(root: &std::path::Path) -> String {
    root.canonicalize()
        .ok()
        .as_deref()
        .unwrap_or(root)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| root.display().to_string())
}
