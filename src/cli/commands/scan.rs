//! Scan Command
//!
//! Detect modernization issues without planning or changing anything.
//!
//! Usage:
//!   revive scan [PATH] [-f json]

use std::path::Path;

use crate::cli::ui::Output;
use crate::cli::util::{CommandContext, OutputFormat, print_json};
use crate::pipeline::Pipeline;
use crate::types::{Report, Result, Severity};

pub async fn run(path: &Path, format: OutputFormat) -> Result<()> {
    let ctx = CommandContext::load(path)?;
    let pipeline = Pipeline::for_repository(&ctx.repo, ctx.config)?;
    let report = pipeline.scan(&ctx.repo).await?;

    if format.is_json() {
        return print_json(&report);
    }
    print_report(&Output::new(), &report);
    Ok(())
}

pub(crate) fn print_report(out: &Output, report: &Report) {
    out.header(&format!("Scan: {}", report.repository));
    out.field("Files", report.files_scanned);
    let languages: Vec<&str> = report.languages.iter().map(|l| l.display_name()).collect();
    out.field(
        "Languages",
        if languages.is_empty() {
            "-".to_string()
        } else {
            languages.join(", ")
        },
    );

    if report.issues.is_empty() {
        out.success("No issues found");
        return;
    }

    out.section(&format!("Issues ({})", report.summary.total));
    for issue in &report.issues {
        let location = match (&issue.file_path, issue.line) {
            (Some(file), Some(line)) => format!(" ({}:{})", file, line),
            (Some(file), None) => format!(" ({})", file),
            _ => String::new(),
        };
        println!("  {} {}{}", out.severity(issue.severity), issue.title, location);
    }

    let counts: Vec<String> = Severity::ALL
        .iter()
        .rev()
        .map(|s| format!("{} {}", report.summary.count(*s), s))
        .collect();
    println!();
    out.info(&counts.join(", "));
}
