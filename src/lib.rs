//! revive - Repository Modernization Pipeline
//!
//! Scans a repository for legacy patterns, turns the findings into a
//! prioritized plan under a user-editable rule document, applies the
//! mechanical rewrites in place and summarizes everything as a review
//! bundle (roadmap, pull-request description, per-file diffs).
//!
//! ## Quick Start
//!
//! ```ignore
//! use revive::{ConfigLoader, Pipeline, PipelineOutcome, RunOptions};
//!
//! let config = ConfigLoader::load_for(&repo)?;
//! let pipeline = Pipeline::for_repository(&repo, config)?;
//! if let PipelineOutcome::Completed(run) = pipeline.run(&repo, RunOptions::default()).await? {
//!     println!("{}", run.bundle.roadmap);
//! }
//! ```
//!
//! ## Modules
//!
//! - [`scanner`]: file walk plus dependency, deprecated-API and structure detectors
//! - [`spec`]: rule document loading, validation, editing and hot reload
//! - [`planner`]: issue → task classification and confidence scoring
//! - [`transformer`]: in-place source rewrites, README and manifest generation
//! - [`reporter`]: diffs, roadmap and pull-request text
//! - [`hooks`]: per-stage extension points
//! - [`integrations`]: VCS/pull-request collaborators, retrying filesystem, publishing
//! - [`pipeline`]: the orchestrated run

pub mod cli;
pub mod config;
pub mod constants;
pub mod hooks;
pub mod integrations;
pub mod pipeline;
pub mod planner;
pub mod reporter;
pub mod scanner;
pub mod spec;
pub mod transformer;
pub mod types;

// =============================================================================
// Core Re-exports
// =============================================================================

// Configuration
pub use config::{Config, ConfigLoader};

// Error Types
pub use types::error::{ErrorCategory, IntegrationError, Result, ReviveError, ValidationError};

// Data model
pub use types::{
    Bundle, BundleSummary, DiffInput, DiffStat, Issue, IssueKind, Language, ModernizationTask,
    Plan, Report, Severity, TaskType, TransformResult,
};

// =============================================================================
// Pipeline Re-exports
// =============================================================================

pub use hooks::{HookContext, HookData, HookRegistry, HookRunner, HookStage, StageHook};
pub use pipeline::{Pipeline, PipelineOutcome, PipelineRun, RunOptions};
pub use scanner::Scanner;
pub use spec::{Rule, Spec, SpecLoader, SpecStore, SpecWatcher};
pub use transformer::{Transformation, Transformer};

// =============================================================================
// Integration Re-exports
// =============================================================================

pub use integrations::{
    Author, PublishOptions, Publisher, PullRequestClient, RepoFs, RetryPolicy, RetryingFs,
    VcsClient, with_retry,
};
