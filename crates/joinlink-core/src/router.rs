//! Catalog facade: registration scan and deep-link dispatch.

use crate::config::LaunchDefaults;
use crate::error::{JoinlinkError, LaunchStage, Result};
use crate::launch::{
    launch_only_link, parse_deep_link, LaunchPipeline, LaunchReport, LaunchRequest,
};
use crate::locator::SoftwareLocator;
use crate::overrides::{OverrideSet, TitleOverride};
use crate::platform::{ConfigStore, FileStore, ProcessStarter};
use crate::registrar::HandlerRegistrar;
use crate::title::{HookConfig, LaunchConfig, LaunchType, Title};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::slice;
use std::sync::Arc;
use tracing::{error, info, warn};
use url::Url;

/// Result of scanning one title.
#[derive(Debug)]
pub struct RegistrationOutcome {
    /// Protocol scheme of the title.
    pub title: String,
    pub label: String,
    pub game_installed: bool,
    /// Name of the required platform client, if any.
    pub platform_client: Option<String>,
    /// True when no client is required.
    pub platform_client_installed: bool,
    pub previously_registered: bool,
    pub registered: bool,
    pub error: Option<JoinlinkError>,
}

impl RegistrationOutcome {
    fn new(title: &Title) -> Self {
        Self {
            title: title.protocol_scheme.clone(),
            label: title.label.clone(),
            game_installed: false,
            platform_client: title.platform_client.as_ref().map(|c| c.name.clone()),
            platform_client_installed: false,
            previously_registered: false,
            registered: false,
            error: None,
        }
    }

    pub fn is_failure(&self) -> bool {
        self.error.is_some()
    }
}

impl fmt::Display for RegistrationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): ", self.label, self.title)?;
        if let Some(err) = &self.error {
            return write!(f, "failed: {}", err);
        }
        if !self.game_installed {
            return write!(f, "not installed");
        }
        if !self.platform_client_installed {
            return write!(
                f,
                "platform client {} missing",
                self.platform_client.as_deref().unwrap_or("unknown")
            );
        }
        if self.previously_registered {
            write!(f, "already registered")
        } else if self.registered {
            write!(f, "registered")
        } else {
            write!(f, "not registered")
        }
    }
}

/// Owns the title catalog and the services that act on it.
pub struct Router {
    titles: BTreeMap<String, Title>,
    locator: SoftwareLocator,
    registrar: HandlerRegistrar,
    files: Arc<dyn FileStore>,
    starter: Arc<dyn ProcessStarter>,
}

impl Router {
    /// `executable` is the binary registered as the scheme handler.
    pub fn new(
        config: Arc<dyn ConfigStore>,
        files: Arc<dyn FileStore>,
        starter: Arc<dyn ProcessStarter>,
        executable: impl Into<PathBuf>,
    ) -> Self {
        Self {
            titles: BTreeMap::new(),
            locator: SoftwareLocator::new(config.clone(), files.clone()),
            registrar: HandlerRegistrar::new(config, executable),
            files,
            starter,
        }
    }

    /// Add a title, merging an optional override. Replaces any title with the
    /// same scheme.
    pub fn add_title(&mut self, mut title: Title, title_override: Option<&TitleOverride>) {
        if let Some(title_override) = title_override {
            title_override.apply(&mut title);
        }
        let scheme = title.protocol_scheme.clone();
        if self.titles.insert(scheme.clone(), title).is_some() {
            warn!("Replaced existing title for scheme {}", scheme);
        }
    }

    /// Add a batch of titles, each with its override from `overrides`.
    ///
    /// Overrides naming an unknown scheme are logged and dropped.
    pub fn add_titles(&mut self, titles: impl IntoIterator<Item = Title>, overrides: &OverrideSet) {
        for title in titles {
            let title_override = overrides.get(&title.protocol_scheme);
            self.add_title(title, title_override);
        }

        for scheme in overrides.schemes() {
            if !self.titles.contains_key(scheme) {
                warn!("Ignoring override for unknown scheme {}", scheme);
            }
        }
    }

    pub fn titles(&self) -> impl Iterator<Item = &Title> {
        self.titles.values()
    }

    pub fn title(&self, scheme: &str) -> Option<&Title> {
        self.titles.get(&scheme.to_ascii_lowercase())
    }

    pub fn registrar(&self) -> &HandlerRegistrar {
        &self.registrar
    }

    /// Detect every title and register the handlers that are missing.
    ///
    /// Failures are recorded per title; the scan never stops early.
    pub fn scan(&self) -> Vec<RegistrationOutcome> {
        self.titles
            .values()
            .map(|title| {
                let mut outcome = RegistrationOutcome::new(title);
                if let Err(e) = self.scan_title(title, &mut outcome) {
                    error!("Scan of {} failed: {}", title.protocol_scheme, e);
                    outcome.error = Some(e);
                }
                outcome
            })
            .collect()
    }

    fn scan_title(&self, title: &Title, outcome: &mut RegistrationOutcome) -> Result<()> {
        outcome.game_installed = self.locator.probe_any(&title.probes)?;
        if !outcome.game_installed {
            return Ok(());
        }

        outcome.platform_client_installed = match &title.platform_client {
            Some(client) => self.locator.probe_any(slice::from_ref(&client.probe))?,
            None => true,
        };
        if !outcome.platform_client_installed {
            return Ok(());
        }

        outcome.previously_registered = self.registrar.is_registered(title)?;
        if !outcome.previously_registered {
            self.registrar.register(title)?;
            outcome.registered = true;
        }
        Ok(())
    }

    /// Handle one deep link: join the server it names.
    pub fn launch(&self, raw_url: &str) -> Result<LaunchReport> {
        let url = parse_deep_link(raw_url).map_err(|e| e.at_stage(LaunchStage::Parse))?;
        let title = self
            .title(url.scheme())
            .ok_or_else(|| JoinlinkError::UnsupportedScheme(url.scheme().to_string()))?;

        title
            .url_validator
            .validate(&url)
            .map_err(|e| e.at_stage(LaunchStage::Validate))?;

        info!("Joining {} via {}", url, title.label);
        self.run(title, &url, LaunchType::Join)
    }

    /// Start a title without joining a server.
    pub fn start(&self, scheme: &str) -> Result<LaunchReport> {
        let title = self
            .title(scheme)
            .ok_or_else(|| JoinlinkError::UnsupportedScheme(scheme.to_string()))?;
        let url = launch_only_link(&title.protocol_scheme)
            .map_err(|e| e.at_stage(LaunchStage::Parse))?;

        info!("Starting {}", title.label);
        self.run(title, &url, LaunchType::LaunchOnly)
    }

    fn run(&self, title: &Title, url: &Url, launch_type: LaunchType) -> Result<LaunchReport> {
        let config = self
            .resolve_launch_config(title)
            .map_err(|e| e.at_stage(LaunchStage::Resolve))?;

        LaunchPipeline::new(self.files.as_ref(), self.starter.as_ref()).run(&LaunchRequest {
            url,
            config: &config,
            command_builder: title.command_builder.as_ref(),
            hook_handlers: &title.hook_handlers,
            launch_type,
        })
    }

    /// Launch config with the install directory filled in.
    ///
    /// Titles that need a platform client start the client, located through
    /// the client's probe, but keep their own hooks.
    fn resolve_launch_config(&self, title: &Title) -> Result<LaunchConfig> {
        let (mut config, install_dir) = match &title.platform_client {
            Some(client) => {
                let probes = slice::from_ref(&client.probe);
                if !self.locator.probe_any(probes)? {
                    return Err(JoinlinkError::PlatformClientMissing {
                        client: client.name.clone(),
                    });
                }
                let mut config = client.launch_config.clone();
                config.hook_configs = client_hook_configs(title);
                (config, self.locator.probe_any_path(probes)?)
            }
            None => {
                if !self.locator.probe_any(&title.probes)? {
                    return Err(JoinlinkError::NotInstalled {
                        title: title.label.clone(),
                    });
                }
                (
                    title.launch_config.clone(),
                    self.locator.probe_any_path(&title.probes)?,
                )
            }
        };

        config.resolved_install_path = Some(install_dir);
        Ok(config)
    }
}

/// The title's hooks, run against a platform client's launch config.
///
/// Kill hooks without an explicit target are pinned to the game executable
/// so they never stop the client itself.
fn client_hook_configs(title: &Title) -> Vec<HookConfig> {
    let mut hooks = title.launch_config.hook_configs.clone();
    for hook in hooks
        .iter_mut()
        .filter(|h| h.handler == LaunchDefaults::KILL_PROCESS_HOOK)
    {
        hook.args
            .entry("executable".to_string())
            .or_insert_with(|| title.launch_config.executable_name.clone());
    }
    hooks
}
