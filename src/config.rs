//! Coordinator configuration stored at `<store>/config.yaml`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::handback::HandbackConfig;
use crate::plan::PlanConfig;
use crate::ports::filesystem::FileSystem;

/// Environment variable naming the store directory.
pub const STORE_ENV: &str = "CONDUCTOR_STORE";

const DEFAULT_STORE: &str = ".conductor";
const CONFIG_FILE: &str = "config.yaml";

/// Everything tunable about plan submission and the handback gate.
///
/// Missing sections and fields fall back to their defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConductorConfig {
    /// Task synthesis and auto-start options.
    pub plan: PlanConfig,
    /// Acceptance policy.
    pub handback: HandbackConfig,
}

impl ConductorConfig {
    /// Checks every section.
    ///
    /// # Errors
    ///
    /// Returns a message naming the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        self.handback.validate().map_err(|e| format!("handback.{e}"))
    }
}

/// The store directory: `$CONDUCTOR_STORE`, or `.conductor` when unset.
#[must_use]
pub fn store_root() -> PathBuf {
    std::env::var(STORE_ENV).map_or_else(|_| PathBuf::from(DEFAULT_STORE), PathBuf::from)
}

/// Loads `<root>/config.yaml`.
///
/// A missing file yields the defaults.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read, parsed, or
/// validated.
pub fn load_config(fs: &dyn FileSystem, root: &Path) -> Result<ConductorConfig, String> {
    let path = root.join(CONFIG_FILE);
    if !fs.exists(&path) {
        return Ok(ConductorConfig::default());
    }
    let contents = fs
        .read_to_string(&path)
        .map_err(|e| format!("Failed to read config {}: {e}", path.display()))?;
    let config: ConductorConfig = if contents.trim().is_empty() {
        ConductorConfig::default()
    } else {
        serde_yaml::from_str(&contents)
            .map_err(|e| format!("Failed to parse config {}: {e}", path.display()))?
    };
    config.validate().map_err(|e| format!("Invalid config {}: {e}", path.display()))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::MemoryFileSystem;
    use crate::handback::Confidence;

    #[test]
    fn missing_file_gives_defaults() {
        let fs = MemoryFileSystem::new();
        let config = load_config(&fs, Path::new("/store")).unwrap();
        assert_eq!(config, ConductorConfig::default());
    }

    #[test]
    fn partial_file_overrides_only_named_fields() {
        let fs = MemoryFileSystem::new();
        fs.write(
            Path::new("/store/config.yaml"),
            "plan:\n  auto_start: true\nhandback:\n  min_confidence_for_auto_accept: high\n",
        )
        .unwrap();

        let config = load_config(&fs, Path::new("/store")).unwrap();

        assert!(config.plan.auto_start);
        assert!(config.plan.include_criteria);
        assert_eq!(config.handback.min_confidence_for_auto_accept, Confidence::High);
        assert!(config.handback.require_all_tests_pass);
    }

    #[test]
    fn invalid_threshold_is_rejected() {
        let fs = MemoryFileSystem::new();
        fs.write(Path::new("/store/config.yaml"), "handback:\n  min_coverage_percent: -5\n")
            .unwrap();

        let err = load_config(&fs, Path::new("/store")).unwrap_err();
        assert!(err.contains("handback.min_coverage_percent"), "{err}");
    }

    #[test]
    fn garbage_is_a_parse_error() {
        let fs = MemoryFileSystem::new();
        fs.write(Path::new("/store/config.yaml"), "plan: [1, 2").unwrap();
        let err = load_config(&fs, Path::new("/store")).unwrap_err();
        assert!(err.starts_with("Failed to parse config"), "{err}");
    }
}
