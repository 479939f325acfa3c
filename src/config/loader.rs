//! Configuration Loader (Figment-based)
//!
//! Loads and merges configuration from multiple sources using Figment:
//! 1. Built-in defaults (Serialized)
//! 2. Global config (~/.config/revive/config.toml)
//! 3. Project config (<repo>/.revive/config.toml)
//! 4. Environment variables (REVIVE_* prefix, `__` separates sections)

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::types::Config;
use crate::constants;
use crate::types::{Result, ReviveError};

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for a repository with the full resolution chain:
    /// defaults → global → project → env vars
    pub fn load_for(repo: &Path) -> Result<Config> {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            debug!("Loading global config from: {}", global_path.display());
            figment = figment.merge(Toml::file(&global_path));
        }

        let project_path = Self::project_config_path(repo);
        if project_path.exists() {
            debug!("Loading project config from: {}", project_path.display());
            figment = figment.merge(Toml::file(&project_path));
        }

        // REVIVE_SCANNER__MAX_FILE_SIZE -> scanner.max_file_size
        figment = figment.merge(Env::prefixed("REVIVE_").split("__").lowercase(true));

        let config: Config = figment
            .extract()
            .map_err(|e| ReviveError::Config(format!("Configuration error: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a specific file only
    pub fn load_from_file(path: &Path) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(path))
            .extract()
            .map_err(|e| ReviveError::Config(format!("Configuration error: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    // =========================================================================
    // Path Management
    // =========================================================================

    /// Get path to global config directory (~/.config/revive/)
    pub fn global_dir() -> Option<PathBuf> {
        env::var("XDG_CONFIG_HOME")
            .ok()
            .map(PathBuf::from)
            .or_else(|| {
                env::var("HOME")
                    .ok()
                    .map(|home| PathBuf::from(home).join(".config"))
            })
            .map(|p| p.join("revive"))
    }

    /// Get path to global config file
    pub fn global_config_path() -> Option<PathBuf> {
        Self::global_dir().map(|dir| dir.join("config.toml"))
    }

    /// Get path to project config file
    pub fn project_config_path(repo: &Path) -> PathBuf {
        repo.join(constants::paths::PROJECT_DIR).join("config.toml")
    }

    // =========================================================================
    // Config Commands
    // =========================================================================

    /// Render the effective configuration for a repository
    pub fn render(repo: &Path, as_json: bool) -> Result<String> {
        let config = Self::load_for(repo)?;
        if as_json {
            Ok(serde_json::to_string_pretty(&config)?)
        } else {
            toml::to_string_pretty(&config).map_err(|e| ReviveError::Config(e.to_string()))
        }
    }

    /// Write a starter project config plus an empty rule document.
    /// Existing files are left alone unless `force` is set.
    pub fn init_project(repo: &Path, force: bool) -> Result<PathBuf> {
        let project_dir = repo.join(constants::paths::PROJECT_DIR);
        fs::create_dir_all(project_dir.join("hooks"))?;

        let config_path = project_dir.join("config.toml");
        if !config_path.exists() || force {
            fs::write(&config_path, Self::default_project_config())?;
            info!("Created project config: {}", config_path.display());
        } else {
            info!("Project config exists: {}", config_path.display());
        }

        let spec_path = repo.join(constants::paths::DEFAULT_SPEC);
        if !spec_path.exists() || force {
            fs::write(&spec_path, Self::default_spec())?;
            info!("Created rule document: {}", spec_path.display());
        }

        Ok(project_dir)
    }

    // =========================================================================
    // Internal
    // =========================================================================

    fn default_project_config() -> String {
        format!(
            r#"# revive project configuration
# Values here override ~/.config/revive/config.toml; REVIVE_* env vars override both.

version = "1.0"

[spec]
path = "{spec}"
watch = false

[scanner]
exclude = ["**/*.min.js", "**/*.bundle.js"]
syntax_confirmation = true

[hooks]
enabled = true
dir = "{hooks}"
timeout_secs = {timeout}

[output]
dir = "{reports}"
"#,
            spec = constants::paths::DEFAULT_SPEC,
            hooks = constants::paths::HOOKS_DIR,
            timeout = constants::hooks::DEFAULT_TIMEOUT_SECS,
            reports = constants::paths::REPORTS_DIR,
        )
    }

    fn default_spec() -> &'static str {
        r#"version: "1"
rules:
  - name: keep-dependencies
    description: Dependency upkeep tasks
    options:
      taskType: dependency
      confidenceMultiplier: 1.0
"#
    }
}
