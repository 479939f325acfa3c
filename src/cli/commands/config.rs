//! Config Command
//!
//! Manage revive configuration.
//!
//! Usage:
//!   revive config show [-g] [-f json]
//!   revive config path
//!   revive config init [--force]

use std::path::Path;

use crate::cli::ui::Output;
use crate::cli::util::{OutputFormat, resolve_repo};
use crate::config::ConfigLoader;
use crate::types::Result;

/// Show configuration
pub fn show(repo: &Path, global: bool, format: OutputFormat) -> Result<()> {
    if global {
        match ConfigLoader::global_config_path() {
            Some(global_path) if global_path.exists() => {
                let content = std::fs::read_to_string(&global_path)?;
                println!("# Global Config: {}\n", global_path.display());
                println!("{}", content);
            }
            Some(_) => {
                println!("No global config found.");
            }
            None => {
                println!("Cannot determine global config directory.");
            }
        }
        return Ok(());
    }

    // Merged effective config
    let repo = resolve_repo(repo)?;
    println!("{}", ConfigLoader::render(&repo, format.is_json())?);
    Ok(())
}

/// Show configuration paths
pub fn path(repo: &Path) -> Result<()> {
    let repo = resolve_repo(repo)?;
    let out = Output::new();

    match ConfigLoader::global_config_path() {
        Some(global) => out.field(
            "Global",
            format!("{}{}", global.display(), exists_marker(&global)),
        ),
        None => out.field("Global", "(unavailable)"),
    }
    let project = ConfigLoader::project_config_path(&repo);
    out.field(
        "Project",
        format!("{}{}", project.display(), exists_marker(&project)),
    );

    let config = ConfigLoader::load_for(&repo)?;
    let spec = config.spec.resolve(&repo);
    out.field("Spec", format!("{}{}", spec.display(), exists_marker(&spec)));
    out.field("Hooks", config.hooks.resolve(&repo).display());
    out.field("Reports", config.output.resolve(&repo).display());
    Ok(())
}

/// Initialize project configuration
pub fn init_project(repo: &Path, force: bool) -> Result<()> {
    let repo = resolve_repo(repo)?;
    let dir = ConfigLoader::init_project(&repo, force)?;
    let out = Output::new();
    out.success("Initialized project configuration");
    out.field("Directory", dir.display());
    out.field(
        "Config",
        ConfigLoader::project_config_path(&repo).display(),
    );
    Ok(())
}

fn exists_marker(path: &Path) -> &'static str {
    if path.exists() { "" } else { " (missing)" }
}
