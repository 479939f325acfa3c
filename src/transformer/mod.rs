//! Transformer
//!
//! Applies a [`Plan`] to the repository on disk, task by task and file by
//! file. Each task type has one handler:
//!
//! | Task type | Handler |
//! |-----------|---------|
//! | refactor, api-replacement | [`RewriteStrategy`] chain per (file language, pattern) |
//! | documentation | README synthesis ([`readme::generate`]) |
//! | dependency | additive manifest metadata ([`manifest::populate_manifest`]) |
//!
//! Rules are checked per task and again per file, using the language of the
//! file's extension. Paths that leave the repository are refused with a
//! warning. Missing files are skipped. Any other failure becomes a
//! task-level warning and the run continues; files already written stay
//! written.

pub mod manifest;
pub mod readme;
pub mod strategies;

pub use readme::ReadmeMetadata;
pub use strategies::{Rewrite, RewriteStrategy};

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::spec::Spec;
use crate::types::{
    DiffInput, Language, ModernizationTask, Plan, Result, ReviveError, TaskType, TransformResult,
    is_repo_relative,
};

/// Transform outcome plus before/after text for every modified file
#[derive(Debug, Clone)]
pub struct Transformation {
    pub result: TransformResult,
    pub diffs: Vec<DiffInput>,
}

pub struct Transformer {
    root: PathBuf,
    dry_run: bool,
    /// Current text of every file read or written so far
    overlay: HashMap<String, String>,
    /// First-seen text of every modified file, in modification order
    originals: Vec<(String, String)>,
}

impl Transformer {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            dry_run: false,
            overlay: HashMap::new(),
            originals: Vec::new(),
        }
    }

    /// Compute every change without writing to disk
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn apply(mut self, plan: &Plan, spec: &Spec) -> Transformation {
        let mut result = TransformResult::new(plan.repository.clone());

        for task in &plan.tasks {
            if spec.disables(task.task_type, task.language) {
                debug!(task = %task.id, "Skipping task disabled by rule");
                continue;
            }

            let files = eligible_files(task, spec, &mut result.warnings);
            let outcome = match task.task_type {
                TaskType::Refactor | TaskType::ApiReplacement => {
                    self.rewrite_sources(task, &files)
                }
                TaskType::Documentation => self.write_readme(task, plan, &files),
                TaskType::Dependency => self.populate_manifests(&files),
            };

            match outcome {
                Ok(modified) => {
                    for file in modified {
                        result.record_modified(&file);
                    }
                }
                Err(e) => {
                    warn!(task = %task.id, error = %e, "Task failed");
                    result
                        .warnings
                        .push(format!("Failed to apply task {}: {}", task.id, e));
                }
            }
        }

        let diffs = self
            .originals
            .iter()
            .map(|(file, before)| DiffInput {
                file_path: file.clone(),
                before: before.clone(),
                after: self.overlay.get(file).cloned().unwrap_or_default(),
            })
            .collect();

        info!(
            modified = result.modified_files.len(),
            warnings = result.warnings.len(),
            dry_run = self.dry_run,
            "Transform complete"
        );

        Transformation { result, diffs }
    }

    fn rewrite_sources(&mut self, task: &ModernizationTask, files: &[&str]) -> Result<Vec<String>> {
        let Some(pattern) = task.pattern() else {
            debug!(task = %task.id, "No source pattern, nothing to rewrite");
            return Ok(Vec::new());
        };

        let mut modified = Vec::new();
        for &file in files {
            let language = Language::from_path(Path::new(file));
            let strategies = RewriteStrategy::for_pattern(language, pattern);
            if strategies.is_empty() {
                continue;
            }

            let Some(source) = self.read(file)? else {
                debug!(file = %file, "File missing, skipping");
                continue;
            };

            let rewrite = RewriteStrategy::chain(strategies, &source);
            if rewrite.changed && rewrite.output != source {
                self.write(file, &source, rewrite.output)?;
                modified.push(file.to_string());
            }
        }

        Ok(modified)
    }

    fn write_readme(
        &mut self,
        task: &ModernizationTask,
        plan: &Plan,
        files: &[&str],
    ) -> Result<Vec<String>> {
        let meta = ReadmeMetadata {
            name: task
                .meta_str("projectName")
                .unwrap_or(&plan.repository)
                .to_string(),
            description: task.meta_str("description").map(str::to_string),
            dependencies: task.meta_strings("dependencies"),
            commands: task.meta_strings("commands"),
        };
        let content = readme::generate(&meta);

        let mut modified = Vec::new();
        for &file in files {
            let current = self.read(file)?.unwrap_or_default();
            if current != content {
                self.write(file, &current, content.clone())?;
                modified.push(file.to_string());
            }
        }
        Ok(modified)
    }

    fn populate_manifests(&mut self, files: &[&str]) -> Result<Vec<String>> {
        let mut modified = Vec::new();

        for &file in files.iter().filter(|f| f.ends_with(".json")) {
            let Some(raw) = self.read(file)? else {
                continue;
            };
            let updated = manifest::populate_manifest(&raw)
                .map_err(|e| ReviveError::parse(file, e.to_string()))?;
            if let Some(updated) = updated {
                self.write(file, &raw, updated)?;
                modified.push(file.to_string());
            }
        }

        Ok(modified)
    }

    /// Current text of a repository file; `None` if it does not exist
    fn read(&mut self, file: &str) -> Result<Option<String>> {
        if let Some(text) = self.overlay.get(file) {
            return Ok(Some(text.clone()));
        }
        match fs::read_to_string(self.root.join(file)) {
            Ok(text) => {
                self.overlay.insert(file.to_string(), text.clone());
                Ok(Some(text))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&mut self, file: &str, before: &str, after: String) -> Result<()> {
        if !self.dry_run {
            let path = self.root.join(file);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&path, &after)?;
        }
        if !self.originals.iter().any(|(f, _)| f == file) {
            self.originals.push((file.to_string(), before.to_string()));
        }
        self.overlay.insert(file.to_string(), after);
        Ok(())
    }
}

/// Task files that stay inside the repository and whose own language is not
/// disabled for the task's type. Refused paths are reported as warnings.
fn eligible_files<'a>(
    task: &'a ModernizationTask,
    spec: &Spec,
    warnings: &mut Vec<String>,
) -> Vec<&'a str> {
    task.files
        .iter()
        .map(String::as_str)
        .filter(|file| {
            if !is_repo_relative(file) {
                warn!(task = %task.id, file = %file, "Refusing path outside the repository");
                warnings.push(format!(
                    "Skipped {} in task {}: path is outside the repository",
                    file, task.id
                ));
                return false;
            }
            let language = Language::from_path(Path::new(file));
            if language.is_known() && spec.disables(task.task_type, language) {
                debug!(task = %task.id, file = %file, "Skipping file disabled by rule");
                return false;
            }
            true
        })
        .collect()
}
