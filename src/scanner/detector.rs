use std::path::PathBuf;
use std::sync::Arc;

use super::walker::SourceFile;
use crate::types::{Issue, Result};

/// Read-only view of the repository shared by every detector in one scan
#[derive(Debug, Clone)]
pub struct ScanContext {
    pub root: PathBuf,
    /// Source files found by the walker, sorted by relative path
    pub files: Vec<SourceFile>,
    /// Confirm pattern matches against a syntax tree
    pub syntax_confirmation: bool,
}

/// An independent finding producer.
///
/// Detectors run concurrently on blocking worker threads and must not share
/// mutable state. Each returns its issues in a deterministic order.
pub trait Detector: Send + Sync {
    fn name(&self) -> &'static str;

    fn detect(&self, ctx: &ScanContext) -> Result<Vec<Issue>>;
}

/// Shared detector for concurrent execution
pub type SharedDetector = Arc<dyn Detector>;
