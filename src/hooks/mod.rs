//! Stage Hooks
//!
//! One optional handler per pipeline stage. A handler receives the stage's
//! [`HookContext`] and may return a JSON object that is shallow-merged into
//! the context data. Handler failures are logged and recorded; they never
//! abort the run.
//!
//! Handlers come from two places:
//! - programmatic registration ([`HookRegistry::register`]), including
//!   plain async closures
//! - executables discovered at `.revive/hooks/<stage>[.sh|.py|.js]`
//!   ([`CommandHook`])

mod command;

pub use command::CommandHook;

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::config::HooksConfig;
use crate::constants;
use crate::types::Result;

pub type HookData = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HookStage {
    PreScan,
    PostScan,
    PrePlan,
    PostPlan,
    PreTransform,
    PostTransform,
    PreReport,
    PostReport,
}

impl HookStage {
    /// Execution order
    pub const ALL: [HookStage; 8] = [
        HookStage::PreScan,
        HookStage::PostScan,
        HookStage::PrePlan,
        HookStage::PostPlan,
        HookStage::PreTransform,
        HookStage::PostTransform,
        HookStage::PreReport,
        HookStage::PostReport,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HookStage::PreScan => "pre-scan",
            HookStage::PostScan => "post-scan",
            HookStage::PrePlan => "pre-plan",
            HookStage::PostPlan => "post-plan",
            HookStage::PreTransform => "pre-transform",
            HookStage::PostTransform => "post-transform",
            HookStage::PreReport => "pre-report",
            HookStage::PostReport => "post-report",
        }
    }
}

impl fmt::Display for HookStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HookStage {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        HookStage::ALL
            .into_iter()
            .find(|stage| stage.as_str() == s)
            .ok_or_else(|| format!("Unknown hook stage: {}", s))
    }
}

/// What a handler sees
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HookContext {
    pub repo_path: PathBuf,
    pub stage: HookStage,
    pub data: HookData,
}

#[async_trait]
pub trait StageHook: Send + Sync {
    /// `Ok(None)` leaves the context data untouched
    async fn call(&self, ctx: &HookContext) -> Result<Option<HookData>>;

    /// Label used in logs and recorded errors
    fn describe(&self) -> String {
        "handler".to_string()
    }
}

#[async_trait]
impl<F, Fut> StageHook for F
where
    F: Fn(HookContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Option<HookData>>> + Send + 'static,
{
    async fn call(&self, ctx: &HookContext) -> Result<Option<HookData>> {
        (self)(ctx.clone()).await
    }
}

pub type SharedHook = Arc<dyn StageHook>;

/// At most one handler per stage
#[derive(Clone, Default)]
pub struct HookRegistry {
    hooks: HashMap<HookStage, SharedHook>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a handler, replacing any previous one for the stage
    pub fn register(&mut self, stage: HookStage, hook: impl StageHook + 'static) -> &mut Self {
        self.hooks.insert(stage, Arc::new(hook));
        self
    }

    pub fn get(&self, stage: HookStage) -> Option<&SharedHook> {
        self.hooks.get(&stage)
    }

    pub fn contains(&self, stage: HookStage) -> bool {
        self.hooks.contains_key(&stage)
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Stages with a handler, in execution order
    pub fn stages(&self) -> Vec<HookStage> {
        HookStage::ALL
            .into_iter()
            .filter(|s| self.contains(*s))
            .collect()
    }

    /// Registry populated from the repository's hooks directory
    pub fn discover(repo: &Path, config: &HooksConfig) -> Self {
        let mut registry = Self::new();
        registry.discover_missing(repo, config);
        registry
    }

    /// Fill stages that have no handler yet from the hooks directory.
    /// Programmatic registrations take precedence.
    pub fn discover_missing(&mut self, repo: &Path, config: &HooksConfig) {
        let dir = config.resolve(repo);
        if !dir.is_dir() {
            return;
        }

        let timeout = Duration::from_secs(config.timeout_secs);
        for stage in HookStage::ALL {
            if self.contains(stage) {
                continue;
            }
            if let Some(path) = resolve_executable(&dir, stage) {
                debug!(stage = %stage, path = %path.display(), "Discovered hook");
                self.register(stage, CommandHook::new(path, timeout));
            }
        }
    }
}

fn resolve_executable(dir: &Path, stage: HookStage) -> Option<PathBuf> {
    constants::hooks::SCRIPT_EXTENSIONS
        .iter()
        .map(|ext| {
            if ext.is_empty() {
                dir.join(stage.as_str())
            } else {
                dir.join(format!("{}.{}", stage, ext))
            }
        })
        .find(|candidate| candidate.is_file())
}

/// Runs stage handlers for one pipeline invocation and collects their
/// failures.
pub struct HookRunner {
    registry: HookRegistry,
    repo_path: PathBuf,
    errors: Vec<String>,
}

impl HookRunner {
    pub fn new(registry: HookRegistry, repo_path: impl Into<PathBuf>) -> Self {
        Self {
            registry,
            repo_path: repo_path.into(),
            errors: Vec::new(),
        }
    }

    pub fn has(&self, stage: HookStage) -> bool {
        self.registry.contains(stage)
    }

    /// Invoke the stage handler, if any, and return the merged data. On
    /// failure or panic the input data is returned unchanged.
    pub async fn run(&mut self, stage: HookStage, data: HookData) -> HookData {
        let Some(hook) = self.registry.get(stage).cloned() else {
            return data;
        };

        let ctx = HookContext {
            repo_path: self.repo_path.clone(),
            stage,
            data,
        };

        let outcome = AssertUnwindSafe(hook.call(&ctx)).catch_unwind().await;
        match outcome {
            Ok(Ok(Some(update))) => {
                debug!(stage = %stage, keys = update.len(), "Hook returned data");
                let mut data = ctx.data;
                data.extend(update);
                data
            }
            Ok(Ok(None)) => ctx.data,
            Ok(Err(e)) => {
                self.record(stage, format!("[{}] {}: {}", stage, hook.describe(), e));
                ctx.data
            }
            Err(panic) => {
                self.record(
                    stage,
                    format!(
                        "[{}] {} panicked: {}",
                        stage,
                        hook.describe(),
                        panic_message(panic.as_ref())
                    ),
                );
                ctx.data
            }
        }
    }

    pub fn record(&mut self, stage: HookStage, message: String) {
        warn!(stage = %stage, "{}", message);
        self.errors.push(message);
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<String> {
        self.errors
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
