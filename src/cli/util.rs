//! CLI Common Utilities
//!
//! Shared repository resolution and output format handling for command
//! handlers.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Serialize;

use crate::config::{Config, ConfigLoader};
use crate::types::{Result, ReviveError};

/// How a command prints its result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl OutputFormat {
    pub fn is_json(&self) -> bool {
        matches!(self, Self::Json)
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Invalid format '{}'. Valid values: text, json", s)),
        }
    }
}

/// Command execution context
///
/// A resolved repository root plus its effective configuration.
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub repo: PathBuf,
    pub config: Config,
}

impl CommandContext {
    /// Resolve `repo` and load its configuration chain
    pub fn load(repo: &Path) -> Result<Self> {
        let repo = resolve_repo(repo)?;
        let config = ConfigLoader::load_for(&repo)?;
        Ok(Self { repo, config })
    }

    /// Rule document path for this repository
    pub fn spec_path(&self) -> PathBuf {
        self.config.spec.resolve(&self.repo)
    }
}

/// Canonical repository root; the path must be an existing directory
pub fn resolve_repo(repo: &Path) -> Result<PathBuf> {
    let resolved = repo.canonicalize()?;
    if !resolved.is_dir() {
        return Err(ReviveError::Config(format!(
            "Not a directory: {}",
            repo.display()
        )));
    }
    Ok(resolved)
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_output_format_parse() {
        assert_eq!("json".parse::<OutputFormat>(), Ok(OutputFormat::Json));
        assert_eq!("TEXT".parse::<OutputFormat>(), Ok(OutputFormat::Text));
        assert!("yaml".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_resolve_repo_rejects_files() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("README.md");
        std::fs::write(&file, "# hi").unwrap();

        assert!(resolve_repo(dir.path()).is_ok());
        assert!(matches!(resolve_repo(&file), Err(ReviveError::Config(_))));
        assert!(resolve_repo(&dir.path().join("missing")).unwrap_err().is_not_found());
    }

    #[test]
    fn test_context_spec_path() {
        let dir = TempDir::new().unwrap();
        let ctx = CommandContext::load(dir.path()).unwrap();
        assert!(ctx.spec_path().ends_with(".revive/modernization-spec.yaml"));
    }
}
