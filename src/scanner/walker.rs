use ignore::WalkBuilder;
use std::path::{Path, PathBuf};

use crate::constants;
use crate::types::{Language, relative_path};

/// Directories never descended into, regardless of .gitignore
const DEFAULT_SKIP_DIRS: &[&str] = &[
    "node_modules",
    ".git",
    "build",
    "dist",
    "coverage",
    "__pycache__",
    "vendor",
    ".venv",
    "venv",
    ".revive",
];

/// Gitignore-aware walk over the source files of a repository
pub struct FileScanner {
    root: PathBuf,
    exclude: Vec<glob::Pattern>,
    max_file_size: u64,
}

impl FileScanner {
    /// Create a scanner with the default skip directories
    pub fn source_files<P: AsRef<Path>>(root: P) -> Self {
        let exclude = DEFAULT_SKIP_DIRS
            .iter()
            .filter_map(|d| glob::Pattern::new(&format!("**/{}/**", d)).ok())
            .collect();
        Self {
            root: root.as_ref().to_path_buf(),
            exclude,
            max_file_size: constants::scanner::MAX_FILE_SIZE,
        }
    }

    /// Add glob exclusions, matched against `/`-separated relative paths.
    /// Invalid patterns are ignored; config validation reports them earlier.
    pub fn with_exclude(mut self, patterns: &[String]) -> Self {
        self.exclude
            .extend(patterns.iter().filter_map(|p| glob::Pattern::new(p).ok()));
        self
    }

    pub fn with_max_file_size(mut self, size: u64) -> Self {
        self.max_file_size = size;
        self
    }

    /// Every recognised source file, sorted by relative path
    pub fn scan(&self) -> Vec<SourceFile> {
        let walker = WalkBuilder::new(&self.root)
            .hidden(false)
            .git_ignore(true)
            .git_global(false)
            .git_exclude(true)
            .require_git(false)
            .follow_links(false) // Security: prevent symlink traversal attacks
            .build();

        let mut files: Vec<SourceFile> = walker
            .filter_map(|e| e.ok())
            .filter(|entry| entry.file_type().is_some_and(|t| t.is_file()))
            .filter_map(|entry| {
                let path = entry.path();
                let relative = relative_path(&self.root, path);
                if self.should_exclude(&relative) {
                    return None;
                }

                let language = Language::from_path(path);
                if !language.is_known() {
                    return None;
                }

                let size = entry.metadata().ok()?.len();
                if size > self.max_file_size {
                    return None;
                }

                Some(SourceFile {
                    path: path.to_path_buf(),
                    relative,
                    language,
                    size,
                })
            })
            .collect();

        files.sort_by(|a, b| a.relative.cmp(&b.relative));
        files
    }

    fn should_exclude(&self, relative: &str) -> bool {
        // Anchor at the root so "**/node_modules/**" also matches top-level dirs
        let anchored = format!("/{}", relative);
        self.exclude
            .iter()
            .any(|p| p.matches(relative) || p.matches(&anchored))
    }
}

#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: PathBuf,
    /// Repository-relative, `/`-separated
    pub relative: String,
    pub language: Language,
    pub size: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_collects_source_files_only() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "src/App.jsx", "x");
        touch(dir.path(), "lib/util.py", "x");
        touch(dir.path(), "README.md", "x");
        touch(dir.path(), "node_modules/react/index.js", "x");

        let files = FileScanner::source_files(dir.path()).scan();
        let rel: Vec<_> = files.iter().map(|f| f.relative.as_str()).collect();
        assert_eq!(rel, vec!["lib/util.py", "src/App.jsx"]);
        assert_eq!(files[1].language, Language::JavaScript);
    }

    #[test]
    fn test_respects_gitignore_and_excludes() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), ".gitignore", "generated/\n");
        touch(dir.path(), "generated/out.js", "x");
        touch(dir.path(), "app.min.js", "x");
        touch(dir.path(), "app.js", "x");

        let files = FileScanner::source_files(dir.path())
            .with_exclude(&["**/*.min.js".to_string()])
            .scan();
        let rel: Vec<_> = files.iter().map(|f| f.relative.as_str()).collect();
        assert_eq!(rel, vec!["app.js"]);
    }

    #[test]
    fn test_max_file_size() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "big.py", &"x".repeat(64));
        touch(dir.path(), "small.py", "x");

        let files = FileScanner::source_files(dir.path())
            .with_max_file_size(16)
            .scan();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].relative, "small.py");
    }
}
