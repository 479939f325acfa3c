//! Pipeline
//!
//! Scan → Plan → Transform → Report for one repository, with a stage hook
//! before and after each step.
//!
//! ## Stage data
//!
//! | Stage | Keys |
//! |-------|------|
//! | pre-scan | (none) |
//! | post-scan, pre-plan | `report` |
//! | post-plan, pre-transform | `plan` |
//! | post-transform | `transform` |
//! | pre-report | `plan`, `transform` |
//! | post-report | `bundle` |
//!
//! A hook may rewrite any of these values. Rewrites that no longer
//! deserialize are rejected and recorded; a plan rewrite may drop, reorder
//! or edit tasks but cannot introduce tasks the planner did not produce.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::config::Config;
use crate::constants::planner::MAX_CONFIDENCE;
use crate::hooks::{HookData, HookRegistry, HookRunner, HookStage};
use crate::planner;
use crate::reporter;
use crate::scanner::Scanner;
use crate::spec::{SharedSpecStore, Spec, SpecLoader, SpecStore, SpecWatcher};
use crate::transformer::{Transformation, Transformer};
use crate::types::{Bundle, Plan, Report, Result, ReviveError, TransformResult, is_repo_relative};

/// Everything a completed run produced
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineRun {
    pub report: Report,
    pub plan: Plan,
    pub transform: TransformResult,
    pub bundle: Bundle,
    pub hook_errors: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum PipelineOutcome {
    /// A pre-scan hook asked to stop; nothing was scanned
    Cancelled {
        reason: Option<String>,
        #[serde(rename = "hookErrors")]
        hook_errors: Vec<String>,
    },
    Completed(Box<PipelineRun>),
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Compute changes and the bundle without writing repository files
    pub dry_run: bool,
}

pub struct Pipeline {
    config: Config,
    store: SharedSpecStore,
    hooks: HookRegistry,
    watcher: Option<SpecWatcher>,
}

impl Pipeline {
    pub fn new(config: Config, store: SharedSpecStore) -> Self {
        Self {
            config,
            store,
            hooks: HookRegistry::new(),
            watcher: None,
        }
    }

    /// Load the repository's rule document (built-in default when absent)
    /// and, when `spec.watch` is set, keep it reloaded in the background.
    /// Watching requires a tokio runtime.
    pub fn for_repository(repo: &Path, config: Config) -> Result<Self> {
        let spec_path = config.spec.resolve(repo);
        let spec = SpecLoader::load_or_default(&spec_path)?;
        let store = SpecStore::shared(spec);

        let watcher = config.spec.watch.then(|| {
            SpecWatcher::spawn(
                spec_path,
                Arc::clone(&store),
                Duration::from_millis(config.spec.debounce_ms),
                |spec| info!(rules = spec.rules.len(), "Spec reloaded"),
            )
        });

        Ok(Self {
            watcher,
            ..Self::new(config, store)
        })
    }

    /// Programmatic hooks; executables in the hooks directory fill the
    /// remaining stages at run time.
    pub fn with_hooks(mut self, hooks: HookRegistry) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn spec(&self) -> Arc<Spec> {
        self.store.snapshot()
    }

    pub fn is_watching(&self) -> bool {
        self.watcher.as_ref().is_some_and(SpecWatcher::is_running)
    }

    pub async fn scan(&self, repo: &Path) -> Result<Report> {
        Scanner::new(self.config.scanner.clone()).scan(repo).await
    }

    pub async fn plan(&self, repo: &Path) -> Result<(Report, Plan)> {
        let report = self.scan(repo).await?;
        let plan = planner::plan(&report, &self.store.snapshot());
        Ok((report, plan))
    }

    #[instrument(skip(self, repo), fields(repo = %repo.display()))]
    pub async fn run(&self, repo: &Path, options: RunOptions) -> Result<PipelineOutcome> {
        let spec = self.store.snapshot();

        let mut registry = self.hooks.clone();
        if self.config.hooks.enabled {
            registry.discover_missing(repo, &self.config.hooks);
        }
        debug!(stages = ?registry.stages(), "Hooks ready");
        let mut hooks = HookRunner::new(registry, repo);

        // pre-scan
        let data = hooks.run(HookStage::PreScan, HookData::new()).await;
        if data.get("continue") == Some(&Value::Bool(false)) {
            let reason = data
                .get("reason")
                .and_then(Value::as_str)
                .map(str::to_string);
            info!(reason = ?reason, "Run cancelled by pre-scan hook");
            return Ok(PipelineOutcome::Cancelled {
                reason,
                hook_errors: hooks.into_errors(),
            });
        }

        // scan
        let report = self.scan(repo).await?;
        let report = pass_through(&mut hooks, HookStage::PostScan, "report", report).await;
        let report = pass_through(&mut hooks, HookStage::PrePlan, "report", report).await;

        // plan
        let planned = planner::plan(&report, &spec);
        let plan = pass_through(&mut hooks, HookStage::PostPlan, "plan", planned.clone()).await;
        let plan = constrain_plan(&mut hooks, HookStage::PostPlan, &planned, plan);
        let plan = pass_through(&mut hooks, HookStage::PreTransform, "plan", plan).await;
        let plan = constrain_plan(&mut hooks, HookStage::PreTransform, &planned, plan);

        // transform
        let Transformation { result, diffs } = {
            let root = repo.to_path_buf();
            let plan = plan.clone();
            let spec = Arc::clone(&spec);
            let dry_run = options.dry_run;
            tokio::task::spawn_blocking(move || {
                Transformer::new(root).dry_run(dry_run).apply(&plan, &spec)
            })
            .await
            .map_err(|e| ReviveError::Config(format!("Transform aborted: {}", e)))?
        };
        let transform =
            pass_through(&mut hooks, HookStage::PostTransform, "transform", result).await;

        // report
        let (plan, transform) = pre_report(&mut hooks, plan, transform).await;
        let bundle = reporter::build_bundle(&plan, &transform, &diffs);
        let bundle = pass_through(&mut hooks, HookStage::PostReport, "bundle", bundle).await;

        let hook_errors = hooks.into_errors();
        info!(
            tasks = plan.tasks.len(),
            modified = transform.modified_files.len(),
            hook_errors = hook_errors.len(),
            "Run complete"
        );

        Ok(PipelineOutcome::Completed(Box::new(PipelineRun {
            report,
            plan,
            transform,
            bundle,
            hook_errors,
        })))
    }

    /// Output directory for bundles of `repo`
    pub fn output_dir(&self, repo: &Path) -> PathBuf {
        self.config.output.resolve(repo)
    }
}

/// Offer `value` to the stage hook under `key` and take back its rewrite
async fn pass_through<T>(hooks: &mut HookRunner, stage: HookStage, key: &str, value: T) -> T
where
    T: Serialize + DeserializeOwned,
{
    if !hooks.has(stage) {
        return value;
    }

    let mut data = HookData::new();
    match serde_json::to_value(&value) {
        Ok(raw) => {
            data.insert(key.to_string(), raw);
        }
        Err(e) => {
            hooks.record(stage, format!("[{}] could not serialize {}: {}", stage, key, e));
            return value;
        }
    }

    let data = hooks.run(stage, data).await;
    take(hooks, stage, &data, key).unwrap_or(value)
}

async fn pre_report(
    hooks: &mut HookRunner,
    plan: Plan,
    transform: TransformResult,
) -> (Plan, TransformResult) {
    let stage = HookStage::PreReport;
    if !hooks.has(stage) {
        return (plan, transform);
    }

    let mut data = HookData::new();
    if let (Ok(p), Ok(t)) = (serde_json::to_value(&plan), serde_json::to_value(&transform)) {
        data.insert("plan".to_string(), p);
        data.insert("transform".to_string(), t);
    }

    let data = hooks.run(stage, data).await;
    let edited = take(hooks, stage, &data, "plan")
        .map(|edited| constrain_plan(hooks, stage, &plan, edited))
        .unwrap_or(plan);
    let transform = take(hooks, stage, &data, "transform").unwrap_or(transform);
    (edited, transform)
}

fn take<T: DeserializeOwned>(
    hooks: &mut HookRunner,
    stage: HookStage,
    data: &HookData,
    key: &str,
) -> Option<T> {
    let raw = data.get(key)?;
    match serde_json::from_value(raw.clone()) {
        Ok(value) => Some(value),
        Err(e) => {
            hooks.record(
                stage,
                format!("[{}] rejected invalid {} from hook: {}", stage, key, e),
            );
            None
        }
    }
}

/// Drop tasks the planner did not produce (or duplicates) and task files
/// outside the repository, then re-clamp confidences.
fn constrain_plan(hooks: &mut HookRunner, stage: HookStage, planned: &Plan, mut plan: Plan) -> Plan {
    let known: HashSet<&str> = planned.tasks.iter().map(|t| t.id.as_str()).collect();
    let mut seen = HashSet::new();

    let mut rejected = Vec::new();
    plan.tasks.retain(|task| {
        let keep = known.contains(task.id.as_str()) && seen.insert(task.id.clone());
        if !keep {
            rejected.push(task.id.clone());
        }
        keep
    });
    let mut escaping = Vec::new();
    for task in &mut plan.tasks {
        task.confidence = task.confidence.min(MAX_CONFIDENCE);
        task.files.retain(|file| {
            let inside = is_repo_relative(file);
            if !inside {
                escaping.push(file.clone());
            }
            inside
        });
    }

    if !rejected.is_empty() {
        warn!(stage = %stage, tasks = ?rejected, "Dropping tasks added by hook");
        hooks.record(
            stage,
            format!("[{}] hook added unknown tasks: {}", stage, rejected.join(", ")),
        );
    }

    if !escaping.is_empty() {
        warn!(stage = %stage, files = ?escaping, "Dropping task files outside the repository");
        hooks.record(
            stage,
            format!(
                "[{}] hook pointed tasks outside the repository: {}",
                stage,
                escaping.join(", ")
            ),
        );
    }

    plan.repository = planned.repository.clone();
    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::HookContext;
    use crate::spec::{Rule, RuleOptions};
    use crate::types::{Severity, TaskType};
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn object(value: Value) -> HookData {
        value.as_object().cloned().unwrap()
    }

    fn legacy_repo() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("package.json"),
            "{\n  \"name\": \"legacy\",\n  \"dependencies\": {\n    \"react\": \"^15.6.0\"\n  }\n}\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("App.jsx"),
            "import React from 'react';\nclass App extends React.Component {\n  render() {\n    return <div>Hello</div>;\n  }\n}\n",
        )
        .unwrap();
        dir
    }

    fn pipeline(spec: Spec) -> Pipeline {
        Pipeline::new(Config::default(), SpecStore::shared(spec))
    }

    fn completed(outcome: PipelineOutcome) -> PipelineRun {
        match outcome {
            PipelineOutcome::Completed(run) => *run,
            PipelineOutcome::Cancelled { reason, .. } => panic!("cancelled: {:?}", reason),
        }
    }

    #[tokio::test]
    async fn test_end_to_end_class_component() {
        let dir = legacy_repo();
        let run = completed(
            pipeline(Spec::default())
                .run(dir.path(), RunOptions::default())
                .await
                .unwrap(),
        );

        assert!(run.report.issues.iter().any(|i| i.id == "dep:react"));
        let refactor = run
            .plan
            .tasks_of(TaskType::Refactor)
            .find(|t| t.files == vec!["App.jsx"])
            .unwrap();
        assert_eq!(refactor.severity, Severity::Medium);

        let app = fs::read_to_string(dir.path().join("App.jsx")).unwrap();
        assert!(app.contains("function App(props)"));
        assert!(run.transform.modified_files.contains(&"App.jsx".to_string()));
        assert!(run.bundle.roadmap.contains("## Structure"));
        assert!(run.bundle.summary.total_additions > 0);
        assert!(run.hook_errors.is_empty());
    }

    #[tokio::test]
    async fn test_disabled_documentation_writes_no_readme() {
        let dir = legacy_repo();
        let spec = Spec {
            rules: vec![Rule {
                enabled: Some(false),
                options: RuleOptions {
                    task_type: Some(TaskType::Documentation),
                    ..RuleOptions::default()
                },
                ..Rule::new("no-docs")
            }],
            ..Spec::default()
        };

        let run = completed(
            pipeline(spec)
                .run(dir.path(), RunOptions::default())
                .await
                .unwrap(),
        );
        assert_eq!(run.plan.tasks_of(TaskType::Documentation).count(), 0);
        assert!(!dir.path().join("README.md").exists());
    }

    #[tokio::test]
    async fn test_pre_scan_cancellation() {
        let dir = legacy_repo();
        let mut hooks = HookRegistry::new();
        hooks.register(HookStage::PreScan, |_ctx: HookContext| async move {
            Ok::<_, ReviveError>(Some(object(json!({"continue": false, "reason": "frozen"}))))
        });
        hooks.register(HookStage::PostScan, |_ctx: HookContext| async move {
            Err::<Option<HookData>, _>(ReviveError::hook("post-scan", "ran after cancellation"))
        });

        let outcome = pipeline(Spec::default())
            .with_hooks(hooks)
            .run(dir.path(), RunOptions::default())
            .await
            .unwrap();

        match outcome {
            PipelineOutcome::Cancelled {
                reason,
                hook_errors,
            } => {
                assert_eq!(reason.as_deref(), Some("frozen"));
                assert!(hook_errors.is_empty());
            }
            PipelineOutcome::Completed(_) => panic!("expected cancellation"),
        }
        let app = fs::read_to_string(dir.path().join("App.jsx")).unwrap();
        assert!(app.contains("class App"));
    }

    #[tokio::test]
    async fn test_hook_cannot_add_tasks_and_confidence_is_clamped() {
        let dir = legacy_repo();
        let mut hooks = HookRegistry::new();
        hooks.register(HookStage::PostPlan, |ctx: HookContext| async move {
            let mut plan = ctx.data["plan"].clone();
            let tasks = plan["tasks"].as_array_mut().unwrap();
            let mut injected = tasks[0].clone();
            injected["id"] = json!("task:injected");
            tasks.push(injected);
            for task in tasks.iter_mut() {
                task["confidence"] = json!(250);
            }
            Ok::<_, ReviveError>(Some(object(json!({ "plan": plan }))))
        });

        let run = completed(
            pipeline(Spec::default())
                .with_hooks(hooks)
                .run(dir.path(), RunOptions { dry_run: true })
                .await
                .unwrap(),
        );

        assert!(run.plan.tasks.iter().all(|t| t.id != "task:injected"));
        assert!(run.plan.tasks.iter().all(|t| t.confidence == 100));
        assert_eq!(run.hook_errors.len(), 1);
    }

    #[tokio::test]
    async fn test_disabled_refactor_leaves_class_component_with_deprecated_api() {
        let dir = TempDir::new().unwrap();
        let source = "import React from 'react';\nclass App extends React.Component {\n  componentWillMount() {\n    this.load();\n  }\n  render() {\n    return <div>Hello</div>;\n  }\n}\n";
        fs::write(dir.path().join("App.jsx"), source).unwrap();
        let spec = Spec {
            rules: vec![Rule {
                enabled: Some(false),
                options: RuleOptions {
                    task_type: Some(TaskType::Refactor),
                    ..RuleOptions::default()
                },
                ..Rule::new("no-refactors")
            }],
            ..Spec::default()
        };

        let run = completed(
            pipeline(spec)
                .run(dir.path(), RunOptions::default())
                .await
                .unwrap(),
        );

        assert_eq!(run.plan.tasks_of(TaskType::Refactor).count(), 0);
        assert!(
            run.plan
                .tasks
                .iter()
                .any(|t| t.id == "task:api:component-will-mount:App.jsx")
        );
        assert_eq!(fs::read_to_string(dir.path().join("App.jsx")).unwrap(), source);
        assert!(!run.transform.modified_files.contains(&"App.jsx".to_string()));
    }

    #[tokio::test]
    async fn test_panicking_hook_does_not_abort_run() {
        let dir = legacy_repo();
        let mut hooks = HookRegistry::new();
        hooks.register(HookStage::PostScan, |_ctx: HookContext| async move {
            if true {
                panic!("hook bug");
            }
            Ok::<_, ReviveError>(None)
        });

        let pipeline = pipeline(Spec::default()).with_hooks(hooks);
        let repo = dir.path().to_path_buf();
        let joined = tokio::spawn(async move {
            pipeline.run(&repo, RunOptions { dry_run: true }).await
        })
        .await;

        let run = completed(joined.unwrap().unwrap());
        assert!(run.report.issues.iter().any(|i| i.id == "dep:react"));
        assert_eq!(run.hook_errors.len(), 1);
        assert!(run.hook_errors[0].contains("hook bug"));
    }

    #[tokio::test]
    async fn test_hook_cannot_point_tasks_outside_repository() {
        let dir = legacy_repo();
        let mut hooks = HookRegistry::new();
        hooks.register(HookStage::PreTransform, |ctx: HookContext| async move {
            let mut plan = ctx.data["plan"].clone();
            for task in plan["tasks"].as_array_mut().unwrap() {
                task["files"] = json!(["../escape.jsx"]);
            }
            Ok::<_, ReviveError>(Some(object(json!({ "plan": plan }))))
        });

        let run = completed(
            pipeline(Spec::default())
                .with_hooks(hooks)
                .run(dir.path(), RunOptions::default())
                .await
                .unwrap(),
        );

        assert!(run.plan.tasks.iter().all(|t| t.files.is_empty()));
        assert!(run.transform.modified_files.is_empty());
        assert_eq!(run.hook_errors.len(), 1);
        assert!(run.hook_errors[0].contains("../escape.jsx"));
    }

    #[tokio::test]
    async fn test_hook_can_drop_tasks() {
        let dir = legacy_repo();
        let mut hooks = HookRegistry::new();
        hooks.register(HookStage::PreTransform, |ctx: HookContext| async move {
            let mut plan = ctx.data["plan"].clone();
            plan["tasks"]
                .as_array_mut()
                .unwrap()
                .retain(|t| t["type"] != "refactor");
            Ok::<_, ReviveError>(Some(object(json!({ "plan": plan }))))
        });

        let run = completed(
            pipeline(Spec::default())
                .with_hooks(hooks)
                .run(dir.path(), RunOptions::default())
                .await
                .unwrap(),
        );

        assert_eq!(run.plan.tasks_of(TaskType::Refactor).count(), 0);
        let app = fs::read_to_string(dir.path().join("App.jsx")).unwrap();
        assert!(app.contains("class App"));
        assert!(run.hook_errors.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_hook_value_is_rejected() {
        let dir = legacy_repo();
        let mut hooks = HookRegistry::new();
        hooks.register(HookStage::PostScan, |_ctx: HookContext| async move {
            Ok::<_, ReviveError>(Some(object(json!({"report": "garbage"}))))
        });
        hooks.register(HookStage::PostReport, |_ctx: HookContext| async move {
            Err::<Option<HookData>, _>(ReviveError::hook("post-report", "webhook down"))
        });

        let run = completed(
            pipeline(Spec::default())
                .with_hooks(hooks)
                .run(dir.path(), RunOptions { dry_run: true })
                .await
                .unwrap(),
        );

        assert!(run.report.issues.iter().any(|i| i.id == "dep:react"));
        assert_eq!(run.hook_errors.len(), 2);
        assert!(run.bundle.roadmap.starts_with("# Roadmap"));
    }

    #[tokio::test]
    async fn test_stage_data_keys() {
        let dir = legacy_repo();
        let mut hooks = HookRegistry::new();
        for stage in HookStage::ALL {
            hooks.register(stage, move |ctx: HookContext| async move {
                let mut keys: Vec<String> = ctx.data.keys().cloned().collect();
                keys.sort();
                let expected: Vec<&str> = match ctx.stage {
                    HookStage::PreScan => vec![],
                    HookStage::PostScan | HookStage::PrePlan => vec!["report"],
                    HookStage::PostPlan | HookStage::PreTransform => vec!["plan"],
                    HookStage::PostTransform => vec!["transform"],
                    HookStage::PreReport => vec!["plan", "transform"],
                    HookStage::PostReport => vec!["bundle"],
                };
                if keys != expected {
                    return Err(ReviveError::hook(stage.as_str(), format!("{:?}", keys)));
                }
                Ok::<Option<HookData>, ReviveError>(None)
            });
        }

        let run = completed(
            pipeline(Spec::default())
                .with_hooks(hooks)
                .run(dir.path(), RunOptions { dry_run: true })
                .await
                .unwrap(),
        );
        assert!(run.hook_errors.is_empty(), "{:?}", run.hook_errors);
    }

    #[tokio::test]
    async fn test_for_repository_loads_spec() {
        let dir = legacy_repo();
        fs::create_dir_all(dir.path().join(".revive")).unwrap();
        fs::write(
            dir.path().join(".revive/modernization-spec.yaml"),
            "version: \"1\"\nrules:\n  - name: slow-deps\n    options:\n      taskType: dependency\n      confidenceMultiplier: 0.5\n",
        )
        .unwrap();

        let pipeline = Pipeline::for_repository(dir.path(), Config::default()).unwrap();
        assert!(!pipeline.is_watching());
        let (_, plan) = pipeline.plan(dir.path()).await.unwrap();
        let dep = plan.tasks_of(TaskType::Dependency).next().unwrap();
        assert_eq!(dep.confidence, 20);
    }

    #[tokio::test]
    async fn test_invalid_spec_is_fatal() {
        let dir = legacy_repo();
        fs::create_dir_all(dir.path().join(".revive")).unwrap();
        fs::write(
            dir.path().join(".revive/modernization-spec.yaml"),
            "rules: []\n",
        )
        .unwrap();

        let err = Pipeline::for_repository(dir.path(), Config::default())
            .err()
            .unwrap();
        assert!(err.is_fatal());
    }
}
