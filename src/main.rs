use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::runtime::Runtime;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use revive::TaskType;
use revive::cli::OutputFormat;
use revive::cli::commands::run::RunArgs;
use revive::cli::commands::spec::RuleArgs;

#[derive(Parser)]
#[command(name = "revive")]
#[command(
    version,
    about = "Scan a repository for legacy patterns, plan and apply modernizations"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, global = true)]
    verbose: bool,

    #[arg(long, short, global = true)]
    quiet: bool,

    #[arg(
        short = 'f',
        long,
        global = true,
        default_value = "text",
        help = "Output format: text, json"
    )]
    format: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect modernization issues
    Scan {
        #[arg(default_value = ".", help = "Repository to scan")]
        path: PathBuf,
    },

    /// Scan and print the prioritized task list
    Plan {
        #[arg(default_value = ".", help = "Repository to plan")]
        path: PathBuf,
    },

    /// Scan, plan, apply changes and write the report bundle
    Run {
        #[arg(default_value = ".", help = "Repository to modernize")]
        path: PathBuf,
        #[arg(long = "dry-run", help = "Compute changes without writing files")]
        dry_run: bool,
        #[arg(long, short, help = "Bundle output directory")]
        output: Option<PathBuf>,
    },

    /// Inspect and edit the rule document
    Spec {
        #[arg(long, short = 'C', global = true, default_value = ".")]
        repo: PathBuf,
        #[command(subcommand)]
        action: SpecAction,
    },

    /// Manage configuration
    Config {
        #[arg(long, short = 'C', global = true, default_value = ".")]
        repo: PathBuf,
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum SpecAction {
    /// Check the rule document (or FILE) against the schema
    Validate { file: Option<PathBuf> },
    /// List rules in order
    Rules,
    /// Add a rule, replacing any rule with the same name
    AddRule {
        #[arg(long, required_unless_present = "file")]
        name: Option<String>,
        #[arg(long, conflicts_with = "name", help = "Read the rule from a YAML/JSON/TOML file")]
        file: Option<PathBuf>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long, help = "dependency, api-replacement, refactor, documentation")]
        task_type: Option<TaskType>,
        #[arg(long = "language", help = "Restrict to a language (repeatable)")]
        languages: Vec<String>,
        #[arg(long, help = "Confidence multiplier")]
        multiplier: Option<f64>,
        #[arg(long, help = "Drop matching tasks")]
        disabled: bool,
    },
    /// Remove a rule by name
    RemoveRule { name: String },
    /// Write the rule document to OUTPUT (format by extension)
    Export { output: PathBuf },
    /// Replace the rule document with INPUT
    Import { input: PathBuf },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration (merged from all sources)
    Show {
        #[arg(short = 'g', long, help = "Show global config file only")]
        global: bool,
    },
    /// Show configuration file paths
    Path,
    /// Initialize project configuration
    Init {
        #[arg(long, help = "Overwrite existing config")]
        force: bool,
    },
}

/// Set up panic handler for graceful error reporting
fn setup_panic_handler() {
    let default_hook = std::panic::take_hook();

    std::panic::set_hook(Box::new(move |panic_info| {
        let message = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };

        eprintln!("\n\x1b[1;31m━━━ PANIC ━━━\x1b[0m");
        eprintln!("\x1b[31mrevive encountered an unexpected error:\x1b[0m");
        eprintln!("  {}", message);

        if let Some(location) = panic_info.location() {
            eprintln!(
                "\x1b[90mLocation: {}:{}:{}\x1b[0m",
                location.file(),
                location.line(),
                location.column()
            );
        }
        eprintln!();

        // Backtrace when RUST_BACKTRACE=1
        default_hook(panic_info);
    }));
}

fn main() -> ExitCode {
    setup_panic_handler();

    match run_cli() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("\x1b[31mError:\x1b[0m {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let format = cli.format;

    match cli.command {
        Commands::Scan { path } => {
            let rt = Runtime::new()?;
            rt.block_on(revive::cli::commands::scan::run(&path, format))?;
        }
        Commands::Plan { path } => {
            let rt = Runtime::new()?;
            rt.block_on(revive::cli::commands::plan::run(&path, format))?;
        }
        Commands::Run {
            path,
            dry_run,
            output,
        } => {
            let rt = Runtime::new()?;
            rt.block_on(revive::cli::commands::run::run(
                &path,
                RunArgs {
                    dry_run,
                    output,
                    format,
                },
            ))?;
        }
        Commands::Spec { repo, action } => match action {
            SpecAction::Validate { file } => {
                revive::cli::commands::spec::validate(&repo, file, format)?;
            }
            SpecAction::Rules => {
                revive::cli::commands::spec::rules(&repo, format)?;
            }
            SpecAction::AddRule {
                name,
                file,
                description,
                task_type,
                languages,
                multiplier,
                disabled,
            } => {
                revive::cli::commands::spec::add_rule(
                    &repo,
                    RuleArgs {
                        name,
                        file,
                        description,
                        task_type,
                        languages,
                        multiplier,
                        disabled,
                    },
                )?;
            }
            SpecAction::RemoveRule { name } => {
                revive::cli::commands::spec::remove_rule(&repo, &name)?;
            }
            SpecAction::Export { output } => {
                revive::cli::commands::spec::export(&repo, &output)?;
            }
            SpecAction::Import { input } => {
                revive::cli::commands::spec::import(&repo, &input)?;
            }
        },
        Commands::Config { repo, action } => match action {
            ConfigAction::Show { global } => {
                revive::cli::commands::config::show(&repo, global, format)?;
            }
            ConfigAction::Path => {
                revive::cli::commands::config::path(&repo)?;
            }
            ConfigAction::Init { force } => {
                revive::cli::commands::config::init_project(&repo, force)?;
            }
        },
    }

    Ok(())
}
