use std::sync::{Arc, RwLock};

use super::model::Spec;

/// Shared spec store for thread-safe access
pub type SharedSpecStore = Arc<SpecStore>;

/// Holds the authoritative rule snapshot.
///
/// Readers get an `Arc<Spec>` that stays valid however many reloads happen
/// afterwards; a reload swaps the pointer, never mutates a published spec.
#[derive(Debug)]
pub struct SpecStore {
    current: RwLock<Arc<Spec>>,
}

impl SpecStore {
    pub fn new(spec: Spec) -> Self {
        Self {
            current: RwLock::new(Arc::new(spec)),
        }
    }

    pub fn shared(spec: Spec) -> SharedSpecStore {
        Arc::new(Self::new(spec))
    }

    pub fn snapshot(&self) -> Arc<Spec> {
        let guard = self.current.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&guard)
    }

    pub fn replace(&self, spec: Spec) -> Arc<Spec> {
        let next = Arc::new(spec);
        let mut guard = self.current.write().unwrap_or_else(|e| e.into_inner());
        *guard = Arc::clone(&next);
        next
    }
}

impl Default for SpecStore {
    fn default() -> Self {
        Self::new(Spec::default())
    }
}
