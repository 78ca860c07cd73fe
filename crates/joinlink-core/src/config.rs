//! Centralized configuration for joinlink.
//!
//! Constants for the registry layout, override file location and launch
//! defaults.

use std::path::PathBuf;

/// Application-level configuration.
pub struct AppConfig;

impl AppConfig {
    pub const APP_NAME: &'static str = "joinlink";
    pub const CONFIG_DIR_NAME: &'static str = "joinlink";
    pub const OVERRIDES_FILE_NAME: &'static str = "overrides.json";
}

/// Per-user URL-scheme registration layout.
pub struct RegistryConfig;

impl RegistryConfig {
    /// Root of per-user class registrations (no elevation required).
    pub const CLASSES_PATH: &'static str = r"Software\Classes";
    /// Subtree under a scheme key holding the open command.
    pub const COMMAND_SUBPATH: &'static str = r"shell\open\command";
    /// Marker value that flags a class key as a URL protocol.
    pub const URL_PROTOCOL_VALUE: &'static str = "URL Protocol";
    /// Placeholder the shell replaces with the invoked URL.
    pub const URL_PLACEHOLDER: &'static str = "%1";
}

/// Launch-time defaults.
pub struct LaunchDefaults;

impl LaunchDefaults {
    /// Separator used when a profile file repeats a key.
    pub const PROFILE_VALUE_SEPARATOR: &'static str = ";";
    /// Name of the built-in hook that closes running instances.
    pub const KILL_PROCESS_HOOK: &'static str = "kill-process";
}

/// Default location of the user override file.
///
/// `<config dir>/joinlink/overrides.json`, or `None` when the platform has no
/// config directory.
pub fn default_overrides_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| {
        dir.join(AppConfig::CONFIG_DIR_NAME)
            .join(AppConfig::OVERRIDES_FILE_NAME)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_overrides_path_layout() {
        if let Some(path) = default_overrides_path() {
            assert!(path.ends_with("joinlink/overrides.json"));
        }
    }
}
