//! Software discovery.
//!
//! Titles list several probes, tried in order. A probe that fails outright
//! (as opposed to answering "not found") is treated as "not found" unless it
//! is the last one in the list, whose failure is returned to the caller.

use crate::error::{JoinlinkError, Result};
use crate::platform::{ConfigStore, FileStore};
use crate::title::{PathKind, Probe};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Answers "is X installed" and "where is X installed".
#[derive(Clone)]
pub struct SoftwareLocator {
    config: Arc<dyn ConfigStore>,
    files: Arc<dyn FileStore>,
}

impl SoftwareLocator {
    pub fn new(config: Arc<dyn ConfigStore>, files: Arc<dyn FileStore>) -> Self {
        Self { config, files }
    }

    /// Whether any probe finds an installation. Stops at the first hit.
    pub fn probe_any(&self, probes: &[Probe]) -> Result<bool> {
        let last = probes.len().saturating_sub(1);

        for (index, probe) in probes.iter().enumerate() {
            match self.probe(probe) {
                Ok(true) => {
                    debug!("Found installation via {}", probe);
                    return Ok(true);
                }
                Ok(false) => continue,
                Err(e) if index == last => return Err(e),
                Err(e) => debug!("Probe {} failed, trying next: {}", probe, e),
            }
        }

        Ok(false)
    }

    /// Install directory from the first probe that finds an installation.
    pub fn probe_any_path(&self, probes: &[Probe]) -> Result<PathBuf> {
        let last = probes.len().saturating_sub(1);

        for (index, probe) in probes.iter().enumerate() {
            let resolved = match self.probe(probe) {
                Ok(true) => self.resolve_dir(probe),
                Ok(false) => continue,
                Err(e) => Err(e),
            };

            match resolved {
                Ok(dir) => {
                    debug!("Resolved install directory {} via {}", dir.display(), probe);
                    return Ok(dir);
                }
                Err(e) if index == last => return Err(e),
                Err(e) => debug!("Probe {} failed, trying next: {}", probe, e),
            }
        }

        Err(JoinlinkError::PathResolution {
            message: "no probe located an installation".to_string(),
        })
    }

    /// Evaluate a single probe.
    pub fn probe(&self, probe: &Probe) -> Result<bool> {
        match probe {
            Probe::Registry {
                root,
                path,
                value_name,
            } => match self.config.get_string(*root, path, value_name) {
                Ok(value) => Ok(!value.trim().is_empty()),
                Err(e) if e.is_not_found() => Ok(false),
                Err(e) => Err(e),
            },
            Probe::Path { path, kind } => {
                let exists = match kind {
                    PathKind::File => self.files.file_exists(path),
                    PathKind::Dir => self.files.dir_exists(path),
                };
                match exists {
                    Err(e) if e.is_not_found() => Ok(false),
                    other => other,
                }
            }
        }
    }

    /// Install directory a probe points at.
    ///
    /// Registry values may hold either the directory itself or a file inside
    /// it, so both the value and its parent are tried.
    pub fn resolve_dir(&self, probe: &Probe) -> Result<PathBuf> {
        match probe {
            Probe::Registry {
                root,
                path,
                value_name,
            } => {
                let raw = self.config.get_string(*root, path, value_name)?;
                let raw = PathBuf::from(raw.trim().trim_matches('"'));

                let candidates = [Some(raw.as_path()), raw.parent()];
                for candidate in candidates.into_iter().flatten() {
                    if candidate.as_os_str().is_empty() {
                        continue;
                    }
                    if self.files.dir_exists(candidate)? {
                        return Ok(candidate.to_path_buf());
                    }
                }

                Err(JoinlinkError::PathResolution {
                    message: format!("could not determine install path from {}", raw.display()),
                })
            }
            Probe::Path {
                path,
                kind: PathKind::File,
            } => path
                .parent()
                .filter(|parent| !parent.as_os_str().is_empty())
                .map(Path::to_path_buf)
                .ok_or_else(|| JoinlinkError::PathResolution {
                    message: format!("{} has no parent directory", path.display()),
                }),
            Probe::Path {
                path,
                kind: PathKind::Dir,
            } => Ok(path.clone()),
        }
    }
}
