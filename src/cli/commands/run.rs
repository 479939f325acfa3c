//! Run Command
//!
//! Full Scan → Plan → Transform → Report pass over one repository.
//!
//! Usage:
//!   revive run [PATH] [--dry-run] [-o DIR] [-f json]

use std::path::{Path, PathBuf};

use tracing::info;

use crate::cli::commands::plan::print_plan;
use crate::cli::ui::Output;
use crate::cli::util::{CommandContext, OutputFormat, print_json};
use crate::pipeline::{Pipeline, PipelineOutcome, PipelineRun, RunOptions};
use crate::reporter;
use crate::types::Result;

#[derive(Debug, Clone, Default)]
pub struct RunArgs {
    pub dry_run: bool,
    /// Overrides `output.dir`
    pub output: Option<PathBuf>,
    pub format: OutputFormat,
}

pub async fn run(path: &Path, args: RunArgs) -> Result<()> {
    let ctx = CommandContext::load(path)?;
    let write_bundle = ctx.config.output.write_bundle && !args.dry_run;
    let pipeline = Pipeline::for_repository(&ctx.repo, ctx.config)?;

    let outcome = pipeline
        .run(
            &ctx.repo,
            RunOptions {
                dry_run: args.dry_run,
            },
        )
        .await?;

    let bundle_dir = match &outcome {
        PipelineOutcome::Completed(run) if write_bundle => {
            let dir = args
                .output
                .clone()
                .unwrap_or_else(|| pipeline.output_dir(&ctx.repo));
            reporter::write_bundle(&run.bundle, &dir)?;
            info!(dir = %dir.display(), "Bundle written");
            Some(dir)
        }
        _ => None,
    };

    if args.format.is_json() {
        return print_json(&outcome);
    }

    let out = Output::new();
    match &outcome {
        PipelineOutcome::Cancelled {
            reason,
            hook_errors,
        } => {
            out.warning(&format!(
                "Run cancelled by pre-scan hook{}",
                reason
                    .as_deref()
                    .map(|r| format!(": {}", r))
                    .unwrap_or_default()
            ));
            print_hook_errors(&out, hook_errors);
        }
        PipelineOutcome::Completed(run) => {
            print_run(&out, run, args.dry_run);
            if let Some(dir) = bundle_dir {
                println!();
                out.success(&format!("Bundle written to {}", dir.display()));
            }
        }
    }
    Ok(())
}

fn print_run(out: &Output, run: &PipelineRun, dry_run: bool) {
    out.header(&format!("Run: {}", run.plan.repository));
    out.field("Issues", run.report.summary.total);
    out.field("Tasks", run.plan.tasks.len());
    out.field(
        "Changes",
        format!(
            "+{} / -{}",
            run.bundle.summary.total_additions, run.bundle.summary.total_deletions
        ),
    );

    print_plan(out, &run.plan);

    let verb = if dry_run { "Would modify" } else { "Modified" };
    out.section(&format!("{} ({})", verb, run.transform.modified_files.len()));
    for file in &run.transform.modified_files {
        out.item(file);
    }

    if !run.transform.warnings.is_empty() {
        out.section("Warnings");
        for warning in &run.transform.warnings {
            out.warning(warning);
        }
    }
    print_hook_errors(out, &run.hook_errors);
}

fn print_hook_errors(out: &Output, errors: &[String]) {
    if errors.is_empty() {
        return;
    }
    out.section("Hook errors");
    for error in errors {
        out.error(error);
    }
}
