//! README synthesis for documentation tasks.

use crate::constants::readme;

/// Inputs for a synthesized README
#[derive(Debug, Clone, Default)]
pub struct ReadmeMetadata {
    pub name: String,
    pub description: Option<String>,
    pub dependencies: Vec<String>,
    pub commands: Vec<String>,
}

/// Render a complete README with Installation, Usage, Dependencies and
/// Contributing sections.
pub fn generate(meta: &ReadmeMetadata) -> String {
    let usage = if meta.commands.is_empty() {
        readme::DEFAULT_USAGE.to_string()
    } else {
        bullet_list(&meta.commands)
    };
    let dependencies = if meta.dependencies.is_empty() {
        "- None".to_string()
    } else {
        bullet_list(&meta.dependencies)
    };
    let description = meta
        .description
        .as_deref()
        .filter(|d| !d.trim().is_empty())
        .unwrap_or(readme::DEFAULT_DESCRIPTION);

    [
        format!("# {}", meta.name),
        String::new(),
        description.to_string(),
        String::new(),
        "## Installation".to_string(),
        "```".to_string(),
        "npm install".to_string(),
        "```".to_string(),
        String::new(),
        "## Usage".to_string(),
        "```".to_string(),
        usage,
        "```".to_string(),
        String::new(),
        "## Dependencies".to_string(),
        dependencies,
        String::new(),
        "## Contributing".to_string(),
        readme::CONTRIBUTING.to_string(),
        String::new(),
    ]
    .join("\n")
}

fn bullet_list(items: &[String]) -> String {
    items
        .iter()
        .map(|item| format!("- {}", item))
        .collect::<Vec<_>>()
        .join("\n")
}
