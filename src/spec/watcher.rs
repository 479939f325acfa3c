//! Debounced rule document reloading.
//!
//! A background task polls the file's fingerprint (mtime and length). A
//! change arms a deadline `debounce` in the future and every further change
//! pushes it back, so a burst of writes produces one reload. A reload that
//! fails to read, parse or validate is logged and the previous snapshot stays
//! authoritative.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::loader::{SpecFormat, SpecLoader};
use super::model::Spec;
use super::store::SharedSpecStore;
use crate::constants;
use crate::types::{Result, ReviveError};

type Fingerprint = Option<(SystemTime, u64)>;

/// Handle to a running watcher. Dropping it stops the watcher.
pub struct SpecWatcher {
    handle: JoinHandle<()>,
}

impl SpecWatcher {
    /// Start watching `path`, publishing successful reloads into `store` and
    /// then calling `on_change` once per settled burst of edits.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn<F>(
        path: impl Into<PathBuf>,
        store: SharedSpecStore,
        debounce: Duration,
        on_change: F,
    ) -> Self
    where
        F: Fn(Arc<Spec>) + Send + Sync + 'static,
    {
        let path = path.into();
        let handle = tokio::spawn(async move {
            watch_loop(path, store, debounce, on_change).await;
        });
        Self { handle }
    }

    /// Stop watching
    pub fn dispose(self) {
        self.handle.abort();
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for SpecWatcher {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn watch_loop<F>(path: PathBuf, store: SharedSpecStore, debounce: Duration, on_change: F)
where
    F: Fn(Arc<Spec>) + Send + Sync + 'static,
{
    let mut ticker = tokio::time::interval(Duration::from_millis(constants::watch::POLL_INTERVAL_MS));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut last = fingerprint(&path).await;
    let mut deadline: Option<Instant> = None;
    debug!(path = %path.display(), "Watching rule document");

    loop {
        ticker.tick().await;

        let current = fingerprint(&path).await;
        if current != last {
            last = current;
            deadline = Some(Instant::now() + debounce);
            continue;
        }

        if let Some(due) = deadline
            && Instant::now() >= due
        {
            deadline = None;
            match reload(&path).await {
                Ok(spec) => {
                    let snapshot = store.replace(spec);
                    info!(
                        path = %path.display(),
                        rules = snapshot.rules.len(),
                        "Rule document reloaded"
                    );
                    on_change(snapshot);
                }
                Err(e) => {
                    warn!(
                        path = %path.display(),
                        error = %e,
                        "Rule document reload failed, keeping previous rules"
                    );
                }
            }
        }
    }
}

async fn fingerprint(path: &Path) -> Fingerprint {
    let meta = tokio::fs::metadata(path).await.ok()?;
    Some((meta.modified().ok()?, meta.len()))
}

async fn reload(path: &Path) -> Result<Spec> {
    let content = tokio::fs::read_to_string(path).await.map_err(|e| {
        ReviveError::Config(format!("Failed to read spec {}: {}", path.display(), e))
    })?;
    SpecLoader::parse(&content, SpecFormat::from_path(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::SpecStore;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    fn spec_doc(version: &str, rules: &[&str]) -> String {
        let mut doc = format!("version: \"{}\"\nrules:\n", version);
        for name in rules {
            doc.push_str(&format!("  - name: {}\n", name));
        }
        if rules.is_empty() {
            doc.push_str("  []\n");
        }
        doc
    }

    fn setup() -> (TempDir, PathBuf, SharedSpecStore, Arc<AtomicUsize>) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("spec.yaml");
        std::fs::write(&path, spec_doc("1", &["a"])).unwrap();
        let store = SpecStore::shared(SpecLoader::load(&path).unwrap());
        (dir, path, store, Arc::new(AtomicUsize::new(0)))
    }

    #[tokio::test]
    async fn test_burst_of_writes_reloads_once() {
        let (_dir, path, store, calls) = setup();
        let counter = Arc::clone(&calls);
        let _watcher = SpecWatcher::spawn(
            &path,
            Arc::clone(&store),
            Duration::from_millis(150),
            move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            },
        );
        tokio::time::sleep(Duration::from_millis(30)).await;

        std::fs::write(&path, spec_doc("2", &["a", "b"])).unwrap();
        std::fs::write(&path, spec_doc("3", &["a", "b", "c"])).unwrap();
        std::fs::write(&path, spec_doc("4", &["a", "b", "c", "dd"])).unwrap();

        tokio::time::sleep(Duration::from_millis(600)).await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let snapshot = store.snapshot();
        assert_eq!(snapshot.version, "4");
        assert_eq!(snapshot.rules.len(), 4);
    }

    #[tokio::test]
    async fn test_invalid_reload_keeps_previous_spec() {
        let (_dir, path, store, calls) = setup();
        let counter = Arc::clone(&calls);
        let _watcher = SpecWatcher::spawn(
            &path,
            Arc::clone(&store),
            Duration::from_millis(25),
            move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            },
        );
        tokio::time::sleep(Duration::from_millis(30)).await;

        std::fs::write(&path, "version: \"9\"\nrules:\n  - enabled: false\n").unwrap();
        tokio::time::sleep(Duration::from_millis(300)).await;

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(store.snapshot().version, "1");
        assert_eq!(store.snapshot().rule_names(), vec!["a"]);
    }

    #[tokio::test]
    async fn test_disposed_watcher_ignores_changes() {
        let (_dir, path, store, calls) = setup();
        let counter = Arc::clone(&calls);
        let watcher = SpecWatcher::spawn(
            &path,
            Arc::clone(&store),
            Duration::from_millis(25),
            move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            },
        );
        watcher.dispose();

        std::fs::write(&path, spec_doc("2", &["a", "b"])).unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(store.snapshot().version, "1");
    }
}
