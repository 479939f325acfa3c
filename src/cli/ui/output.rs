use console::style;

use crate::types::Severity;

pub struct Output;

impl Output {
    pub fn new() -> Self {
        Self
    }

    pub fn success(&self, message: &str) {
        println!("{} {}", style("✓").green(), message);
    }

    pub fn error(&self, message: &str) {
        eprintln!("{} {}", style("✗").red(), message);
    }

    pub fn warning(&self, message: &str) {
        println!("{} {}", style("⚠").yellow(), message);
    }

    pub fn info(&self, message: &str) {
        println!("{} {}", style("ℹ").blue(), message);
    }

    pub fn header(&self, message: &str) {
        println!("\n{}", style(message).bold().underlined());
    }

    pub fn section(&self, message: &str) {
        println!("\n{}", style(message).bold());
        println!("{}", "─".repeat(40));
    }

    /// Aligned `label: value` line
    pub fn field(&self, label: &str, value: impl std::fmt::Display) {
        println!("  {:<14} {}", style(format!("{}:", label)).dim(), value);
    }

    pub fn item(&self, message: &str) {
        println!("  • {}", message);
    }

    /// Severity tag colored by urgency
    pub fn severity(&self, severity: Severity) -> String {
        let tag = format!("{:<8}", severity.as_str());
        match severity {
            Severity::Critical => style(tag).red().bold().to_string(),
            Severity::High => style(tag).red().to_string(),
            Severity::Medium => style(tag).yellow().to_string(),
            Severity::Low => style(tag).cyan().to_string(),
            Severity::Info => style(tag).dim().to_string(),
        }
    }
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}
