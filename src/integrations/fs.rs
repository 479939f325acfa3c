//! Retrying filesystem access.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::retry::{RetryPolicy, with_retry};
use crate::types::Result;

#[async_trait]
pub trait RepoFs: Send + Sync {
    async fn read(&self, path: &Path) -> Result<String>;

    async fn write(&self, path: &Path, contents: &str) -> Result<()>;

    /// Entry names in a directory, sorted
    async fn list(&self, path: &Path) -> Result<Vec<String>>;
}

/// [`RepoFs`] over the local filesystem, rooted at a repository. Relative
/// paths resolve against the root; transient I/O failures are retried.
pub struct RetryingFs {
    root: PathBuf,
    policy: RetryPolicy,
}

impl RetryingFs {
    pub fn new(root: impl Into<PathBuf>, policy: RetryPolicy) -> Self {
        Self {
            root: root.into(),
            policy,
        }
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}

#[async_trait]
impl RepoFs for RetryingFs {
    async fn read(&self, path: &Path) -> Result<String> {
        let path = &self.resolve(path);
        with_retry(&self.policy, "read", || async move {
            Ok(tokio::fs::read_to_string(path).await?)
        })
        .await
    }

    async fn write(&self, path: &Path, contents: &str) -> Result<()> {
        let path = &self.resolve(path);
        with_retry(&self.policy, "write", || async move {
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            Ok(tokio::fs::write(path, contents).await?)
        })
        .await
    }

    async fn list(&self, path: &Path) -> Result<Vec<String>> {
        let path = &self.resolve(path);
        with_retry(&self.policy, "list", || async move {
            let mut entries = tokio::fs::read_dir(path).await?;
            let mut names = Vec::new();
            while let Some(entry) = entries.next_entry().await? {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
            names.sort();
            Ok(names)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    fn fs(dir: &TempDir) -> RetryingFs {
        RetryingFs::new(
            dir.path(),
            RetryPolicy {
                max_retries: 2,
                base_delay: Duration::from_millis(1),
                max_delay: Duration::from_millis(2),
            },
        )
    }

    #[tokio::test]
    async fn test_write_read_list() {
        let dir = TempDir::new().unwrap();
        let fs = fs(&dir);

        fs.write(Path::new("src/b.js"), "b").await.unwrap();
        fs.write(Path::new("src/a.js"), "a").await.unwrap();

        assert_eq!(fs.read(Path::new("src/a.js")).await.unwrap(), "a");
        assert_eq!(fs.list(Path::new("src")).await.unwrap(), vec!["a.js", "b.js"]);
    }

    #[tokio::test]
    async fn test_missing_file_fails_fast() {
        let dir = TempDir::new().unwrap();
        let err = fs(&dir).read(Path::new("absent.txt")).await.unwrap_err();
        assert!(err.is_not_found());
    }
}
