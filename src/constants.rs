//! Global Constants
//!
//! Centralized constants for configuration and tuning.
//! All magic numbers should be defined here with documentation.

/// Project layout inside a scanned repository
pub mod paths {
    /// Per-repository state directory
    pub const PROJECT_DIR: &str = ".revive";

    /// Default rule document, relative to the repository root
    pub const DEFAULT_SPEC: &str = ".revive/modernization-spec.yaml";

    /// Directory searched for stage hook executables
    pub const HOOKS_DIR: &str = ".revive/hooks";

    /// Default bundle output directory
    pub const REPORTS_DIR: &str = ".revive/reports";

    pub const README: &str = "README.md";
    pub const PACKAGE_JSON: &str = "package.json";
    pub const REQUIREMENTS_TXT: &str = "requirements.txt";
    pub const TEST_RESULTS: &str = "test-results.txt";
    pub const OBSOLETE_CONFIG: &str = "obsolete.config";
}

/// Planner scoring
pub mod planner {
    use crate::types::Severity;

    /// Base confidence for a task, before rule multipliers
    pub const fn base_confidence(severity: Severity) -> f64 {
        match severity {
            Severity::Info => 25.0,
            Severity::Low => 40.0,
            Severity::Medium => 60.0,
            Severity::High => 80.0,
            Severity::Critical => 90.0,
        }
    }

    pub const MIN_CONFIDENCE: u8 = 0;
    pub const MAX_CONFIDENCE: u8 = 100;
}

/// Spec file watching
pub mod watch {
    /// Quiet period before a changed spec file is reloaded (milliseconds)
    pub const DEBOUNCE_MS: u64 = 25;

    /// Fingerprint polling interval (milliseconds)
    pub const POLL_INTERVAL_MS: u64 = 10;
}

/// Retry policy for network-facing collaborators
pub mod retry {
    /// Default number of retries after the first attempt
    pub const DEFAULT_MAX_RETRIES: usize = 3;

    /// Base delay for exponential backoff (milliseconds)
    pub const BASE_DELAY_MS: u64 = 100;

    /// Maximum delay between retries (milliseconds)
    pub const MAX_DELAY_MS: u64 = 10_000;

    /// Backoff multiplier
    pub const BACKOFF_FACTOR: f32 = 2.0;
}

/// Stage hook execution
pub mod hooks {
    /// Default wall-clock limit for an external hook process (seconds)
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

    /// Extensions tried, in order, when resolving `<stage>` in the hooks dir
    pub const SCRIPT_EXTENSIONS: &[&str] = &["", "sh", "py", "js"];
}

/// Scanner limits
pub mod scanner {
    /// Files larger than this are skipped (bytes)
    pub const MAX_FILE_SIZE: u64 = 1_048_576;

    /// Marker searched for in test result logs
    pub const FAILING_TESTS_MARKER: &str = "FAIL";
}

/// README synthesis defaults
pub mod readme {
    pub const DEFAULT_DESCRIPTION: &str =
        "This project has been modernized with automated tooling.";

    pub const DEFAULT_USAGE: &str = "npm run start";

    pub const CONTRIBUTING: &str =
        "Pull requests are welcome. Please open an issue for major changes.";
}

/// Manifest metadata population defaults
pub mod manifest {
    pub const LICENSE: &str = "MIT";
    pub const BADGE_BUILD: &str = "status:passing";
    pub const BADGE_VERSION: &str = "v1";
    pub const START_SCRIPT: &str = "node index.js";
}
