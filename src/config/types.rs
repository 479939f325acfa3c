//! Configuration Types
//!
//! All configuration structures with sensible defaults.
//! Supports global (~/.config/revive/) and project (.revive/) level configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::constants;
use crate::types::{Result, ReviveError};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Configuration version
    pub version: String,

    /// Rule document location and reload behavior
    pub spec: SpecConfig,

    /// Repository scanning settings
    pub scanner: ScannerConfig,

    /// Stage hook settings
    pub hooks: HooksConfig,

    /// Bundle output settings
    pub output: OutputConfig,

    /// Retry policy for external collaborators
    pub retry: RetryConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            spec: SpecConfig::default(),
            scanner: ScannerConfig::default(),
            hooks: HooksConfig::default(),
            output: OutputConfig::default(),
            retry: RetryConfig::default(),
        }
    }
}

impl Config {
    /// Validate configuration values are within acceptable ranges.
    /// Returns `ReviveError::Config` on validation failure.
    pub fn validate(&self) -> Result<()> {
        if self.hooks.timeout_secs == 0 {
            return Err(ReviveError::Config(
                "hooks.timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.scanner.max_file_size == 0 {
            return Err(ReviveError::Config(
                "scanner.max_file_size must be greater than 0".to_string(),
            ));
        }

        if self.retry.base_delay_ms > self.retry.max_delay_ms {
            return Err(ReviveError::Config(format!(
                "retry.base_delay_ms ({}) must not exceed retry.max_delay_ms ({})",
                self.retry.base_delay_ms, self.retry.max_delay_ms
            )));
        }

        for pattern in &self.scanner.exclude {
            glob::Pattern::new(pattern).map_err(|e| {
                ReviveError::Config(format!("Invalid exclude pattern '{}': {}", pattern, e))
            })?;
        }

        Ok(())
    }
}

// =============================================================================
// Spec Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpecConfig {
    /// Rule document path (relative paths resolve against the repository)
    pub path: PathBuf,

    /// Reload the rule document when it changes
    pub watch: bool,

    /// Quiet period before reloading (milliseconds)
    pub debounce_ms: u64,
}

impl Default for SpecConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(constants::paths::DEFAULT_SPEC),
            watch: false,
            debounce_ms: constants::watch::DEBOUNCE_MS,
        }
    }
}

impl SpecConfig {
    pub fn resolve(&self, repo: &Path) -> PathBuf {
        resolve_against(repo, &self.path)
    }
}

// =============================================================================
// Scanner Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    /// Glob patterns to exclude from source walking
    pub exclude: Vec<String>,

    /// Maximum file size in bytes
    pub max_file_size: u64,

    /// Confirm text matches with a syntax tree where a grammar is available
    pub syntax_confirmation: bool,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            exclude: vec![
                "**/*.min.js".to_string(),
                "**/*.bundle.js".to_string(),
            ],
            max_file_size: constants::scanner::MAX_FILE_SIZE,
            syntax_confirmation: true,
        }
    }
}

// =============================================================================
// Hooks Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HooksConfig {
    /// Discover hook executables in the repository
    pub enabled: bool,

    /// Hook directory (relative paths resolve against the repository)
    pub dir: PathBuf,

    /// Per-invocation limit for external hook processes
    pub timeout_secs: u64,
}

impl Default for HooksConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: PathBuf::from(constants::paths::HOOKS_DIR),
            timeout_secs: constants::hooks::DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl HooksConfig {
    pub fn resolve(&self, repo: &Path) -> PathBuf {
        resolve_against(repo, &self.dir)
    }
}

// =============================================================================
// Output Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Where `run` writes roadmap, PR description and bundle JSON
    pub dir: PathBuf,

    /// Persist the bundle after a run
    pub write_bundle: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(constants::paths::REPORTS_DIR),
            write_bundle: true,
        }
    }
}

impl OutputConfig {
    pub fn resolve(&self, repo: &Path) -> PathBuf {
        resolve_against(repo, &self.dir)
    }
}

// =============================================================================
// Retry Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Retries after the first attempt
    pub max_retries: usize,

    /// First backoff delay (milliseconds), doubled per attempt
    pub base_delay_ms: u64,

    /// Backoff ceiling (milliseconds)
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: constants::retry::DEFAULT_MAX_RETRIES,
            base_delay_ms: constants::retry::BASE_DELAY_MS,
            max_delay_ms: constants::retry::MAX_DELAY_MS,
        }
    }
}

fn resolve_against(repo: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        repo.join(path)
    }
}

// =============================================================================
// Tests
// =============================================================================
