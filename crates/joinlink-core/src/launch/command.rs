//! Command builders turn a deep link into the game's argument vector.
//!
//! Each builder owns the title-specific rules (supported mods, argument
//! syntax, profile lookups). For [`LaunchType::LaunchOnly`] no server-join
//! arguments are emitted.

use super::link::{query_param, server_address};
use crate::error::{JoinlinkError, Result};
use crate::platform::FileStore;
use crate::profile::ConFile;
use crate::title::{LaunchConfig, LaunchType};
use std::path::{Path, PathBuf};
use url::Url;

/// Builds the argument vector for one launch, default args included.
pub trait CommandBuilder: Send + Sync {
    fn build(
        &self,
        files: &dyn FileStore,
        url: &Url,
        config: &LaunchConfig,
        launch_type: LaunchType,
    ) -> Result<Vec<String>>;
}

/// Pick the `mod` query parameter, checked against a list of supported mods.
///
/// Comparison is case-insensitive; the supported spelling is returned.
fn select_mod(url: &Url, supported: &[String], default: Option<&str>) -> Result<Option<String>> {
    let requested = match query_param(url, "mod") {
        Some(requested) => requested,
        None => return Ok(default.map(str::to_string)),
    };

    supported
        .iter()
        .find(|m| m.eq_ignore_ascii_case(&requested))
        .cloned()
        .map(Some)
        .ok_or_else(|| JoinlinkError::CommandBuild {
            message: format!("unsupported mod: {}", requested),
        })
}

/// Battlefield 1942 / Vietnam style arguments:
/// `+restart 1 [+game <mod>] +joinServer <host>:<port>`.
#[derive(Debug, Clone)]
pub struct RefractorV1Builder {
    mods: Vec<String>,
}

impl RefractorV1Builder {
    pub fn new<I, S>(mods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            mods: mods.into_iter().map(Into::into).collect(),
        }
    }
}

impl CommandBuilder for RefractorV1Builder {
    fn build(
        &self,
        _files: &dyn FileStore,
        url: &Url,
        config: &LaunchConfig,
        launch_type: LaunchType,
    ) -> Result<Vec<String>> {
        let mut args = vec!["+restart".to_string(), "1".to_string()];

        if let Some(selected) = select_mod(url, &self.mods, None)? {
            args.push("+game".to_string());
            args.push(selected);
        }

        if launch_type == LaunchType::Join {
            let (host, port) = server_address(url)?;
            args.push("+joinServer".to_string());
            args.push(format!("{}:{}", host, port));
        }

        Ok(config.assemble_args(args))
    }
}

/// Battlefield 2 style arguments:
/// `+modPath mods/<mod> [+joinServer <host> +port <port> +playerName <nick>]`.
///
/// The player name comes from the default profile under the profiles
/// directory (`Global.con` names the profile, `<profile>/Profile.con` holds
/// the nick).
#[derive(Debug, Clone)]
pub struct RefractorV2Builder {
    mods: Vec<String>,
    default_mod: String,
    profiles_dir: Option<PathBuf>,
}

impl RefractorV2Builder {
    pub fn new<I, S>(mods: I, default_mod: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            mods: mods.into_iter().map(Into::into).collect(),
            default_mod: default_mod.into(),
            profiles_dir: None,
        }
    }

    /// Read profiles from `dir` instead of the user's documents folder.
    pub fn with_profiles_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.profiles_dir = Some(dir.into());
        self
    }

    fn profiles_dir(&self) -> Result<PathBuf> {
        match &self.profiles_dir {
            Some(dir) => Ok(dir.clone()),
            None => default_bf2_profiles_dir(),
        }
    }
}

/// `<Documents>/Battlefield 2/Profiles`.
pub fn default_bf2_profiles_dir() -> Result<PathBuf> {
    dirs::document_dir()
        .map(|dir| dir.join("Battlefield 2").join("Profiles"))
        .ok_or_else(|| JoinlinkError::Config {
            message: "Could not determine documents directory".to_string(),
        })
}

fn read_con(files: &dyn FileStore, path: &Path) -> Result<ConFile> {
    let bytes = files.read_file(path).map_err(|e| JoinlinkError::CommandBuild {
        message: format!("failed to read profile file {}: {}", path.display(), e),
    })?;
    Ok(ConFile::parse(&String::from_utf8_lossy(&bytes)))
}

/// Nick of the default profile.
pub fn default_profile_nick(files: &dyn FileStore, profiles_dir: &Path) -> Result<String> {
    let global = read_con(files, &profiles_dir.join("Global.con"))?;
    let profile = global
        .get("GlobalSettings.setDefaultUser")
        .filter(|p| !p.is_empty())
        .ok_or_else(|| JoinlinkError::CommandBuild {
            message: "no default profile is set".to_string(),
        })?;

    let profile_con = read_con(files, &profiles_dir.join(&profile).join("Profile.con"))?;
    profile_con
        .get("LocalProfile.setGamespyNick")
        .filter(|nick| !nick.is_empty())
        .or_else(|| profile_con.get("LocalProfile.setName"))
        .filter(|nick| !nick.is_empty())
        .ok_or_else(|| JoinlinkError::CommandBuild {
            message: format!("profile {} has no player name", profile),
        })
}

impl CommandBuilder for RefractorV2Builder {
    fn build(
        &self,
        files: &dyn FileStore,
        url: &Url,
        config: &LaunchConfig,
        launch_type: LaunchType,
    ) -> Result<Vec<String>> {
        let selected = select_mod(url, &self.mods, Some(&self.default_mod))?
            .unwrap_or_else(|| self.default_mod.clone());
        let mut args = vec!["+modPath".to_string(), format!("mods/{}", selected)];

        if launch_type == LaunchType::Join {
            let (host, port) = server_address(url)?;
            let nick = default_profile_nick(files, &self.profiles_dir()?)?;
            args.extend([
                "+joinServer".to_string(),
                host,
                "+port".to_string(),
                port.to_string(),
                "+playerName".to_string(),
                nick,
            ]);
        }

        Ok(config.assemble_args(args))
    }
}

/// Unreal Engine 2 style: the server address is the only argument.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnrealBuilder;

impl CommandBuilder for UnrealBuilder {
    fn build(
        &self,
        _files: &dyn FileStore,
        url: &Url,
        config: &LaunchConfig,
        launch_type: LaunchType,
    ) -> Result<Vec<String>> {
        let mut args = Vec::new();
        if launch_type == LaunchType::Join {
            let (host, port) = server_address(url)?;
            args.push(format!("{}:{}", host, port));
        }
        Ok(config.assemble_args(args))
    }
}
