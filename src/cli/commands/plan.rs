//! Plan Command
//!
//! Scan, then print the prioritized task list under the current rules.
//!
//! Usage:
//!   revive plan [PATH] [-f json]

use std::path::Path;

use serde_json::json;

use crate::cli::ui::Output;
use crate::cli::util::{CommandContext, OutputFormat, print_json};
use crate::pipeline::Pipeline;
use crate::types::{Plan, Result};

pub async fn run(path: &Path, format: OutputFormat) -> Result<()> {
    let ctx = CommandContext::load(path)?;
    let pipeline = Pipeline::for_repository(&ctx.repo, ctx.config)?;
    let (report, plan) = pipeline.plan(&ctx.repo).await?;

    if format.is_json() {
        return print_json(&json!({ "report": report, "plan": plan }));
    }

    let out = Output::new();
    out.header(&format!("Plan: {}", plan.repository));
    out.field("Issues", report.summary.total);
    print_plan(&out, &plan);
    Ok(())
}

pub(crate) fn print_plan(out: &Output, plan: &Plan) {
    if plan.tasks.is_empty() {
        out.success("Nothing to modernize");
        return;
    }

    out.section(&format!("Tasks ({})", plan.tasks.len()));
    for task in &plan.tasks {
        println!(
            "  {:>3}  {:<16} {}",
            task.confidence,
            task.task_type.label(),
            task.title
        );
        if !task.files.is_empty() {
            println!("       {}", task.files.join(", "));
        }
    }
}
