//! Hook handlers: named side effects run around process start.

use super::command::default_bf2_profiles_dir;
use crate::config::LaunchDefaults;
use crate::error::{JoinlinkError, Result};
use crate::platform::{self, FileStore};
use crate::profile::ConFile;
use crate::title::{LaunchConfig, LaunchType};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use url::Url;

/// Arguments configured on a hook.
pub type HookArgs = BTreeMap<String, String>;

/// A side effect referenced by name from a hook config.
pub trait HookHandler: Send + Sync {
    fn name(&self) -> &str;

    fn run(
        &self,
        files: &dyn FileStore,
        url: &Url,
        config: &LaunchConfig,
        launch_type: LaunchType,
        args: &HookArgs,
    ) -> Result<()>;
}

fn hook_error(handler: &str, message: impl Into<String>) -> JoinlinkError {
    JoinlinkError::Hook {
        handler: handler.to_string(),
        message: message.into(),
    }
}

fn required_arg<'a>(handler: &str, args: &'a HookArgs, key: &str) -> Result<&'a str> {
    args.get(key)
        .map(String::as_str)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| hook_error(handler, format!("missing argument {:?}", key)))
}

/// Terminates running instances of the game executable.
///
/// The `executable` arg overrides the launch config's executable name.
#[derive(Debug, Default, Clone, Copy)]
pub struct KillProcessHook;

impl HookHandler for KillProcessHook {
    fn name(&self) -> &str {
        LaunchDefaults::KILL_PROCESS_HOOK
    }

    fn run(
        &self,
        _files: &dyn FileStore,
        _url: &Url,
        config: &LaunchConfig,
        _launch_type: LaunchType,
        args: &HookArgs,
    ) -> Result<()> {
        let executable = args
            .get("executable")
            .map(String::as_str)
            .unwrap_or(config.executable_name.as_str());

        platform::terminate_processes_by_name(executable)
            .map(|_| ())
            .map_err(|e| hook_error(self.name(), e.to_string()))
    }
}

/// Deletes files matching the `pattern` arg.
///
/// Relative patterns are resolved against the install directory.
#[derive(Debug, Default, Clone, Copy)]
pub struct RemoveFilesHook;

impl RemoveFilesHook {
    pub const NAME: &'static str = "remove-files";
}

impl HookHandler for RemoveFilesHook {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn run(
        &self,
        files: &dyn FileStore,
        _url: &Url,
        config: &LaunchConfig,
        _launch_type: LaunchType,
        args: &HookArgs,
    ) -> Result<()> {
        let pattern = required_arg(self.name(), args, "pattern")?;
        let root = if Path::new(pattern).is_absolute() {
            Path::new("")
        } else {
            config
                .install_dir()
                .map_err(|e| hook_error(self.name(), e.to_string()))?
        };

        let matches = files
            .glob(root, pattern)
            .map_err(|e| hook_error(self.name(), e.to_string()))?;
        for path in &matches {
            files
                .remove_all(path)
                .map_err(|e| hook_error(self.name(), e.to_string()))?;
        }

        info!(
            "Removed {} path(s) matching {} under {}",
            matches.len(),
            pattern,
            root.display()
        );
        Ok(())
    }
}

/// Makes the `profile` arg the default Battlefield 2 profile.
///
/// `profiles-dir` overrides `<Documents>/Battlefield 2/Profiles`.
#[derive(Debug, Default, Clone)]
pub struct SetDefaultProfileHook {
    profiles_dir: Option<PathBuf>,
}

impl SetDefaultProfileHook {
    pub const NAME: &'static str = "set-default-profile";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_profiles_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.profiles_dir = Some(dir.into());
        self
    }
}

impl HookHandler for SetDefaultProfileHook {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn run(
        &self,
        files: &dyn FileStore,
        _url: &Url,
        _config: &LaunchConfig,
        _launch_type: LaunchType,
        args: &HookArgs,
    ) -> Result<()> {
        let profile = required_arg(self.name(), args, "profile")?;
        let profiles_dir = match args.get("profiles-dir") {
            Some(dir) => PathBuf::from(dir),
            None => match &self.profiles_dir {
                Some(dir) => dir.clone(),
                None => default_bf2_profiles_dir()?,
            },
        };

        if !files.dir_exists(&profiles_dir.join(profile))? {
            return Err(hook_error(
                self.name(),
                format!("profile {} does not exist in {}", profile, profiles_dir.display()),
            ));
        }

        let global_path = profiles_dir.join("Global.con");
        let mut global = if files.file_exists(&global_path)? {
            ConFile::parse(&String::from_utf8_lossy(&files.read_file(&global_path)?))
        } else {
            debug!("{} does not exist, creating it", global_path.display());
            ConFile::default()
        };

        global.set("GlobalSettings.setDefaultUser", profile);
        files.write_file(&global_path, global.to_con_string().as_bytes())?;

        info!("Default profile set to {}", profile);
        Ok(())
    }
}
