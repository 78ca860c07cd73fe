//! Titles, platform clients and their launch configuration.

use crate::config::LaunchDefaults;
use crate::error::{JoinlinkError, Result};
use crate::launch::{CommandBuilder, HookHandler, Ipv4PortValidator, UrlValidator};
use crate::platform::RegistryRoot;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// What a path probe expects to find.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PathKind {
    File,
    Dir,
}

/// One way to detect and locate an installation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Probe {
    /// A string value in the configuration store holding an install path
    /// (or the path of a file inside the install directory).
    Registry {
        root: RegistryRoot,
        path: String,
        value_name: String,
    },
    /// A file or directory on disk.
    Path { path: PathBuf, kind: PathKind },
}

impl Probe {
    pub fn registry(
        root: RegistryRoot,
        path: impl Into<String>,
        value_name: impl Into<String>,
    ) -> Self {
        Probe::Registry {
            root,
            path: path.into(),
            value_name: value_name.into(),
        }
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        Probe::Path {
            path: path.into(),
            kind: PathKind::File,
        }
    }

    pub fn dir(path: impl Into<PathBuf>) -> Self {
        Probe::Path {
            path: path.into(),
            kind: PathKind::Dir,
        }
    }
}

impl fmt::Display for Probe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Probe::Registry {
                root,
                path,
                value_name,
            } => write!(f, r"registry {}\{} [{}]", root, path, value_name),
            Probe::Path { path, kind } => {
                let kind = match kind {
                    PathKind::File => "file",
                    PathKind::Dir => "dir",
                };
                write!(f, "{} {}", kind, path.display())
            }
        }
    }
}

/// Which directory the game process starts in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StartDirectoryMode {
    /// The resolved install directory.
    #[default]
    InstallDir,
    /// The directory containing the executable.
    BinaryDir,
}

/// When a hook runs relative to process start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HookPhase {
    Always,
    PreLaunch,
    PostLaunch,
}

impl HookPhase {
    pub fn runs_before_launch(self) -> bool {
        matches!(self, HookPhase::Always | HookPhase::PreLaunch)
    }

    pub fn runs_after_launch(self) -> bool {
        matches!(self, HookPhase::Always | HookPhase::PostLaunch)
    }
}

impl fmt::Display for HookPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HookPhase::Always => write!(f, "always"),
            HookPhase::PreLaunch => write!(f, "pre-launch"),
            HookPhase::PostLaunch => write!(f, "post-launch"),
        }
    }
}

/// A named side effect scheduled around process start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HookConfig {
    /// Name of the [`HookHandler`] to run.
    #[serde(default)]
    pub handler: String,
    pub phase: HookPhase,
    /// Abort the launch when this hook fails.
    #[serde(default)]
    pub exit_on_error: bool,
    #[serde(default)]
    pub args: BTreeMap<String, String>,
}

impl HookConfig {
    pub fn new(handler: impl Into<String>, phase: HookPhase) -> Self {
        Self {
            handler: handler.into(),
            phase,
            exit_on_error: false,
            args: BTreeMap::new(),
        }
    }

    pub fn exit_on_error(mut self, exit_on_error: bool) -> Self {
        self.exit_on_error = exit_on_error;
        self
    }

    pub fn with_arg(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.args.insert(key.into(), value.into());
        self
    }
}

/// Whether an invocation joins a server or only starts the program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchType {
    Join,
    LaunchOnly,
}

/// How to start a title (or platform client) once it has been located.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchConfig {
    pub default_args: Vec<String>,
    /// Place default args after the built args instead of before them.
    pub append_default_args: bool,
    pub executable_name: String,
    /// Executable directory relative to the install directory.
    pub relative_executable_dir: PathBuf,
    pub start_directory_mode: StartDirectoryMode,
    /// Install directory, filled in at launch time. Always an existing directory.
    pub resolved_install_path: Option<PathBuf>,
    pub hook_configs: Vec<HookConfig>,
    pub close_before_launch: bool,
}

impl LaunchConfig {
    pub fn new(executable_name: impl Into<String>) -> Self {
        Self {
            default_args: Vec::new(),
            append_default_args: false,
            executable_name: executable_name.into(),
            relative_executable_dir: PathBuf::new(),
            start_directory_mode: StartDirectoryMode::InstallDir,
            resolved_install_path: None,
            hook_configs: Vec::new(),
            close_before_launch: false,
        }
    }

    pub fn with_executable_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.relative_executable_dir = dir.into();
        self
    }

    pub fn with_default_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.default_args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn appending_default_args(mut self) -> Self {
        self.append_default_args = true;
        self
    }

    pub fn with_start_directory_mode(mut self, mode: StartDirectoryMode) -> Self {
        self.start_directory_mode = mode;
        self
    }

    pub fn with_hook(mut self, hook: HookConfig) -> Self {
        self.hook_configs.push(hook);
        self
    }

    /// Close running instances before launch.
    ///
    /// Inserts a fatal pre-launch `kill-process` hook ahead of all other hooks.
    pub fn closing_before_launch(mut self) -> Self {
        if !self.close_before_launch {
            self.close_before_launch = true;
            self.hook_configs.insert(
                0,
                HookConfig::new(LaunchDefaults::KILL_PROCESS_HOOK, HookPhase::PreLaunch)
                    .exit_on_error(true),
            );
        }
        self
    }

    /// The resolved install directory.
    pub fn install_dir(&self) -> Result<&Path> {
        self.resolved_install_path
            .as_deref()
            .ok_or_else(|| JoinlinkError::PathResolution {
                message: format!("install path for {} was not resolved", self.executable_name),
            })
    }

    /// Directory containing the executable.
    pub fn binary_dir(&self) -> Result<PathBuf> {
        Ok(self.install_dir()?.join(&self.relative_executable_dir))
    }

    /// Full path of the executable.
    pub fn executable_path(&self) -> Result<PathBuf> {
        Ok(self.binary_dir()?.join(&self.executable_name))
    }

    /// Directory the process starts in.
    pub fn working_dir(&self) -> Result<PathBuf> {
        match self.start_directory_mode {
            StartDirectoryMode::InstallDir => Ok(self.install_dir()?.to_path_buf()),
            StartDirectoryMode::BinaryDir => self.binary_dir(),
        }
    }

    /// Combine builder output with the configured default args.
    pub fn assemble_args(&self, built: Vec<String>) -> Vec<String> {
        if self.append_default_args {
            built
                .into_iter()
                .chain(self.default_args.iter().cloned())
                .collect()
        } else {
            self.default_args.iter().cloned().chain(built).collect()
        }
    }
}

/// A storefront/launcher application some titles need to start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformClient {
    pub name: String,
    pub probe: Probe,
    pub launch_config: LaunchConfig,
}

impl PlatformClient {
    pub fn new(name: impl Into<String>, probe: Probe, launch_config: LaunchConfig) -> Self {
        Self {
            name: name.into(),
            probe,
            launch_config,
        }
    }
}

/// A playable game bound to a unique URL scheme.
#[derive(Clone)]
pub struct Title {
    /// URL scheme, lowercase. The catalog's lookup key.
    pub protocol_scheme: String,
    pub label: String,
    pub platform_client: Option<PlatformClient>,
    /// Discovery strategies, tried in order.
    pub probes: Vec<Probe>,
    pub launch_config: LaunchConfig,
    pub url_validator: Arc<dyn UrlValidator>,
    pub command_builder: Arc<dyn CommandBuilder>,
    pub hook_handlers: Vec<Arc<dyn HookHandler>>,
}

impl Title {
    /// Create a title validated by [`Ipv4PortValidator`] with no probes.
    pub fn new(
        protocol_scheme: impl Into<String>,
        label: impl Into<String>,
        launch_config: LaunchConfig,
        command_builder: Arc<dyn CommandBuilder>,
    ) -> Self {
        Self {
            protocol_scheme: protocol_scheme.into().to_ascii_lowercase(),
            label: label.into(),
            platform_client: None,
            probes: Vec::new(),
            launch_config,
            url_validator: Arc::new(Ipv4PortValidator),
            command_builder,
            hook_handlers: Vec::new(),
        }
    }

    pub fn with_probe(mut self, probe: Probe) -> Self {
        self.probes.push(probe);
        self
    }

    pub fn with_platform_client(mut self, client: PlatformClient) -> Self {
        self.platform_client = Some(client);
        self
    }

    pub fn with_validator(mut self, validator: Arc<dyn UrlValidator>) -> Self {
        self.url_validator = validator;
        self
    }

    pub fn with_hook_handler(mut self, handler: Arc<dyn HookHandler>) -> Self {
        self.hook_handlers.push(handler);
        self
    }

    pub fn requires_platform_client(&self) -> bool {
        self.platform_client.is_some()
    }
}

impl fmt::Debug for Title {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Title")
            .field("protocol_scheme", &self.protocol_scheme)
            .field("label", &self.label)
            .field("platform_client", &self.platform_client)
            .field("probes", &self.probes)
            .field("launch_config", &self.launch_config)
            .field(
                "hook_handlers",
                &self.hook_handlers.iter().map(|h| h.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}
