//! User overrides for catalog titles.
//!
//! Loaded from a JSON object keyed by protocol scheme:
//!
//! ```json
//! {
//!   "bf2": {
//!     "installPath": "D:\\Games\\Battlefield 2",
//!     "args": ["+fullscreen", "0"],
//!     "hooks": [
//!       {
//!         "handler": "remove-files",
//!         "phase": "pre-launch",
//!         "args": { "pattern": "mods/*/cache" }
//!       }
//!     ]
//!   }
//! }
//! ```

use crate::error::{JoinlinkError, Result};
use crate::title::{HookConfig, Probe, Title};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Changes a user wants applied to one title.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TitleOverride {
    /// Replaces the executable file name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub executable_name: Option<String>,
    /// Replaces the executable directory, relative to the install directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub executable_dir: Option<PathBuf>,
    /// Checked before every catalog probe.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub install_path: Option<PathBuf>,
    /// Appended to the default args.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
    /// Appended to the configured hooks.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hooks: Vec<HookConfig>,
}

impl TitleOverride {
    /// Merge this override into a title.
    pub fn apply(&self, title: &mut Title) {
        let config = &mut title.launch_config;

        if let Some(name) = &self.executable_name {
            config.executable_name = name.clone();
        }
        if let Some(dir) = &self.executable_dir {
            config.relative_executable_dir = dir.clone();
        }
        if let Some(install_path) = &self.install_path {
            title.probes.insert(0, Probe::dir(install_path));
        }
        config.default_args.extend(self.args.iter().cloned());
        config.hook_configs.extend(self.hooks.iter().cloned());

        debug!("Applied override to {}", title.protocol_scheme);
    }

    fn validate(&self, scheme: &str) -> Result<()> {
        if let Some(hook) = self.hooks.iter().find(|h| h.handler.trim().is_empty()) {
            return Err(JoinlinkError::Config {
                message: format!(
                    "override for {} has a {} hook without a handler",
                    scheme, hook.phase
                ),
            });
        }
        Ok(())
    }
}

/// All overrides, keyed by lowercase scheme.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverrideSet {
    overrides: BTreeMap<String, TitleOverride>,
}

impl OverrideSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load overrides from a file. A missing file yields an empty set.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No override file at {}", path.display());
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(JoinlinkError::Io {
                    message: format!("Failed to read override file: {}", e),
                    path: Some(path.to_path_buf()),
                    source: Some(e),
                })
            }
        };

        let set = Self::from_json(&content).map_err(|e| match e {
            JoinlinkError::Json { message, source } => JoinlinkError::Json {
                message: format!("Failed to parse overrides from {}: {}", path.display(), message),
                source,
            },
            other => other,
        })?;

        info!("Loaded {} override(s) from {}", set.len(), path.display());
        Ok(set)
    }

    /// Parse overrides from JSON text.
    pub fn from_json(content: &str) -> Result<Self> {
        let raw: BTreeMap<String, TitleOverride> = serde_json::from_str(content)?;

        let mut overrides = BTreeMap::new();
        for (scheme, entry) in raw {
            let scheme = scheme.to_ascii_lowercase();
            entry.validate(&scheme)?;
            overrides.insert(scheme, entry);
        }

        Ok(Self { overrides })
    }

    pub fn insert(&mut self, scheme: &str, entry: TitleOverride) {
        self.overrides.insert(scheme.to_ascii_lowercase(), entry);
    }

    pub fn get(&self, scheme: &str) -> Option<&TitleOverride> {
        self.overrides.get(&scheme.to_ascii_lowercase())
    }

    pub fn schemes(&self) -> impl Iterator<Item = &str> {
        self.overrides.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.overrides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.overrides.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::launch::UnrealBuilder;
    use crate::title::{HookPhase, LaunchConfig};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn title() -> Title {
        Title::new(
            "swat4",
            "SWAT 4",
            LaunchConfig::new("Swat4.exe")
                .with_executable_dir("System")
                .with_default_args(["-nointro"])
                .with_hook(HookConfig::new("kill-process", HookPhase::PreLaunch)),
            Arc::new(UnrealBuilder),
        )
        .with_probe(Probe::dir("catalog-dir"))
    }

    #[test]
    fn test_apply_merges_every_field() {
        let set = OverrideSet::from_json(
            r#"{
                "SWAT4": {
                    "executableName": "Swat4X.exe",
                    "executableDir": "ContentExpansion/System",
                    "installPath": "override-dir",
                    "args": ["-windowed"],
                    "hooks": [
                        {"handler": "remove-files", "phase": "post-launch",
                         "args": {"pattern": "*.log"}}
                    ]
                }
            }"#,
        )
        .unwrap();

        let mut title = title();
        set.get("swat4").unwrap().apply(&mut title);

        let config = &title.launch_config;
        assert_eq!(config.executable_name, "Swat4X.exe");
        assert_eq!(
            config.relative_executable_dir,
            PathBuf::from("ContentExpansion/System")
        );
        assert_eq!(config.default_args, vec!["-nointro", "-windowed"]);
        assert_eq!(config.hook_configs.len(), 2);
        assert_eq!(config.hook_configs[1].handler, "remove-files");
        assert_eq!(
            title.probes,
            vec![Probe::dir("override-dir"), Probe::dir("catalog-dir")]
        );
    }

    #[test]
    fn test_empty_override_changes_nothing() {
        let mut title = title();
        let before = title.launch_config.clone();
        TitleOverride::default().apply(&mut title);

        assert_eq!(title.launch_config, before);
        assert_eq!(title.probes.len(), 1);
    }

    #[test]
    fn test_missing_file_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let set = OverrideSet::load(temp_dir.path().join("overrides.json")).unwrap();
        assert!(set.is_empty());
    }

    #[test]
    fn test_invalid_json_is_a_json_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("overrides.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = OverrideSet::load(&path).unwrap_err();
        assert!(matches!(err, JoinlinkError::Json { .. }));
    }

    #[test]
    fn test_hook_without_handler_is_a_config_error() {
        let err = OverrideSet::from_json(
            r#"{"bf2": {"hooks": [{"handler": "", "phase": "always"}]}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, JoinlinkError::Config { .. }));
    }
}
