//! Preview configuration.
//!
//! Every knob has a default matching the playground's built-in behaviour, so an
//! empty JSON object is a valid configuration.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::ConfigError;

/// Marker carried by the editor's in-memory model URIs. Errors mentioning it are
/// resolver noise rather than user errors.
pub const IN_MEMORY_MARKER: &str = "inmemory://model";

/// Entry module name used when none is configured.
pub const DEFAULT_ENTRY_FILE: &str = "main.ts";

/// Rate limit parameters for a burst guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuardConfig {
    pub window_ms: u64,
    pub threshold: u32,
    pub cooldown_ms: u64,
}

impl GuardConfig {
    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PreviewConfig {
    /// Name of the entry module inside the file set.
    pub entry_file: String,
    /// Module providing `h`, `createApp` and friends.
    pub framework_module: String,
    /// Bare-name imports resolved by the sandbox document.
    pub import_map: BTreeMap<String, String>,
    /// Id of the mount element in the sandbox document.
    pub mount_id: String,
    pub debounce_ms: u64,
    pub compile_guard: GuardConfig,
    pub reset_guard: GuardConfig,
    /// Extensions tried, in order, for extensionless relative imports.
    pub resolve_extensions: Vec<String>,
    pub in_memory_marker: String,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        let mut import_map = BTreeMap::new();
        import_map.insert(
            "vue".to_string(),
            "https://unpkg.com/vue@3.5.1/dist/vue.esm-browser.prod.js".to_string(),
        );
        Self {
            entry_file: DEFAULT_ENTRY_FILE.to_string(),
            framework_module: "vue".to_string(),
            import_map,
            mount_id: "app".to_string(),
            debounce_ms: 200,
            compile_guard: GuardConfig {
                window_ms: 1000,
                threshold: 10,
                cooldown_ms: 2000,
            },
            reset_guard: GuardConfig {
                window_ms: 3000,
                threshold: 2,
                cooldown_ms: 5000,
            },
            resolve_extensions: ["ts", "tsx", "js", "jsx", "vue"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            in_memory_marker: IN_MEMORY_MARKER.to_string(),
        }
    }
}

impl PreviewConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: PreviewConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let data = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&data)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.entry_file.trim().is_empty() {
            return Err(ConfigError::Invalid("entryFile must not be empty".into()));
        }
        if self.mount_id.trim().is_empty() {
            return Err(ConfigError::Invalid("mountId must not be empty".into()));
        }
        for (name, guard) in [
            ("compileGuard", &self.compile_guard),
            ("resetGuard", &self.reset_guard),
        ] {
            if guard.threshold == 0 {
                return Err(ConfigError::Invalid(format!(
                    "{name}.threshold must be at least 1"
                )));
            }
        }
        Ok(())
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_object_is_default() {
        let config = PreviewConfig::from_json_str("{}").unwrap();
        assert_eq!(config, PreviewConfig::default());
        assert_eq!(config.debounce(), Duration::from_millis(200));
        assert_eq!(config.compile_guard.threshold, 10);
        assert_eq!(config.reset_guard.cooldown(), Duration::from_secs(5));
    }

    #[test]
    fn test_partial_override() {
        let config =
            PreviewConfig::from_json_str(r#"{ "entryFile": "main.js", "debounceMs": 50 }"#)
                .unwrap();
        assert_eq!(config.entry_file, "main.js");
        assert_eq!(config.debounce_ms, 50);
        assert_eq!(config.framework_module, "vue");
    }

    #[test]
    fn test_rejects_zero_threshold() {
        let err = PreviewConfig::from_json_str(
            r#"{ "resetGuard": { "windowMs": 1, "threshold": 0, "cooldownMs": 1 } }"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("resetGuard.threshold"));
    }

    #[test]
    fn test_rejects_blank_entry() {
        assert!(PreviewConfig::from_json_str(r#"{ "entryFile": "  " }"#).is_err());
    }

    #[test]
    fn test_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preview.json");
        fs::write(&path, r#"{ "mountId": "root" }"#).unwrap();
        let config = PreviewConfig::from_path(&path).unwrap();
        assert_eq!(config.mount_id, "root");

        let missing = PreviewConfig::from_path(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(missing, ConfigError::Read { .. }));
    }
}
