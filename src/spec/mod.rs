//! Modernization rule document
//!
//! A spec is a versioned, ordered list of rules that enable, disable or tune
//! planned work per task type and language:
//!
//! ```yaml
//! version: "1"
//! rules:
//!   - name: no-python-docs
//!     enabled: false
//!     languages: [python]
//!     options:
//!       taskType: documentation
//!   - name: soften-deps
//!     options:
//!       taskType: dependency
//!       confidenceMultiplier: 0.5
//! ```
//!
//! - [`SpecLoader`]: parse and validate
//! - [`SpecStore`]: current snapshot, swapped atomically on reload
//! - [`SpecWatcher`]: debounced reload on file change
//! - [`RuleEditor`]: add/remove/export/import rules

mod loader;
mod model;
mod rules;
mod store;
mod watcher;

pub use loader::{SpecFormat, SpecLoader};
pub use model::{Rule, RuleOptions, RuleVerdict, Spec};
pub use rules::RuleEditor;
pub use store::{SharedSpecStore, SpecStore};
pub use watcher::SpecWatcher;
