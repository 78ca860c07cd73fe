//! Process start and termination.
//!
//! Games are started detached and never waited on: a successful launch means
//! the OS created the process, nothing more.

use crate::error::{JoinlinkError, Result};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::RwLock;
use sysinfo::{ProcessRefreshKind, ProcessesToUpdate, System};
use tracing::{debug, info, warn};

#[cfg(windows)]
use std::os::windows::process::CommandExt;

/// Starts a program without waiting for it.
pub trait ProcessStarter: Send + Sync {
    fn start(&self, path: &Path, work_dir: &Path, args: &[String]) -> Result<()>;
}

/// [`ProcessStarter`] that spawns a detached child with null stdio.
#[derive(Debug, Default, Clone, Copy)]
pub struct DetachedStarter;

impl ProcessStarter for DetachedStarter {
    fn start(&self, path: &Path, work_dir: &Path, args: &[String]) -> Result<()> {
        let mut cmd = Command::new(path);
        cmd.args(args)
            .current_dir(work_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        #[cfg(windows)]
        {
            // Detach from our console and process group so closing the
            // handler does not take the game down with it.
            const DETACHED_PROCESS: u32 = 0x00000008;
            const CREATE_NEW_PROCESS_GROUP: u32 = 0x00000200;
            cmd.creation_flags(DETACHED_PROCESS | CREATE_NEW_PROCESS_GROUP);
        }

        info!("Starting {} in {}", path.display(), work_dir.display());
        debug!("Arguments: {:?}", args);

        let child = cmd.spawn().map_err(|e| JoinlinkError::ProcessStart {
            path: path.to_path_buf(),
            source: e,
        })?;

        info!("Started process with PID {}", child.id());
        Ok(())
    }
}

/// A start request captured by [`RecordingStarter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartRequest {
    pub path: PathBuf,
    pub work_dir: PathBuf,
    pub args: Vec<String>,
}

/// [`ProcessStarter`] that records requests instead of spawning.
///
/// Used in tests.
#[derive(Debug, Default)]
pub struct RecordingStarter {
    requests: RwLock<Vec<StartRequest>>,
    failure: Option<String>,
}

impl RecordingStarter {
    pub fn new() -> Self {
        Self::default()
    }

    /// A starter whose every start fails with the given message.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            requests: RwLock::new(Vec::new()),
            failure: Some(message.into()),
        }
    }

    pub fn requests(&self) -> Vec<StartRequest> {
        self.requests
            .read()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }
}

impl ProcessStarter for RecordingStarter {
    fn start(&self, path: &Path, work_dir: &Path, args: &[String]) -> Result<()> {
        if let Some(message) = &self.failure {
            return Err(JoinlinkError::ProcessStart {
                path: path.to_path_buf(),
                source: std::io::Error::other(message.clone()),
            });
        }

        let mut requests = self
            .requests
            .write()
            .map_err(|_| JoinlinkError::Other("starter lock poisoned".to_string()))?;
        requests.push(StartRequest {
            path: path.to_path_buf(),
            work_dir: work_dir.to_path_buf(),
            args: args.to_vec(),
        });
        Ok(())
    }
}

/// Kill every running process whose executable name matches `name`.
///
/// Returns the number of processes signalled. No match is not an error.
pub fn terminate_processes_by_name(name: &str) -> Result<u32> {
    let mut system = System::new();
    system.refresh_processes_specifics(ProcessesToUpdate::All, true, ProcessRefreshKind::new());

    let mut stopped = 0;
    let mut failed = Vec::new();

    for process in system.processes_by_exact_name(OsStr::new(name)) {
        debug!("Found running {} with PID {}", name, process.pid());
        if process.kill() {
            stopped += 1;
        } else {
            warn!("Failed to kill {} (PID {})", name, process.pid());
            failed.push(process.pid().as_u32());
        }
    }

    if !failed.is_empty() {
        return Err(JoinlinkError::Other(format!(
            "Failed to terminate {} process(es) named {}: {:?}",
            failed.len(),
            name,
            failed
        )));
    }

    if stopped > 0 {
        info!("Terminated {} running instance(s) of {}", stopped, name);
    }
    Ok(stopped)
}
