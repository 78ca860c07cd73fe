//! The launch pipeline: hooks, command construction and process start.
//!
//! Order of operations for one invocation:
//! 1. pre-launch and always hooks, in configured order
//! 2. command builder
//! 3. detached process start
//! 4. post-launch and always hooks
//!
//! A failing hook is always reported. It aborts the launch only when its
//! config sets `exit_on_error`; after the process has started, such a failure
//! stops the remaining hooks but the launch still counts as a success.

use super::command::CommandBuilder;
use super::hooks::HookHandler;
use crate::error::{JoinlinkError, LaunchStage, Result};
use crate::platform::{FileStore, ProcessStarter};
use crate::title::{HookConfig, HookPhase, LaunchConfig, LaunchType};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use url::Url;

/// A hook that failed without aborting the launch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookFailure {
    pub handler: String,
    pub phase: HookPhase,
    pub message: String,
}

/// What a successful launch did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchReport {
    pub executable: PathBuf,
    pub work_dir: PathBuf,
    pub args: Vec<String>,
    pub hook_failures: Vec<HookFailure>,
    /// A post-launch hook with `exit_on_error` failed and later hooks were skipped.
    pub post_launch_aborted: bool,
}

/// Everything the pipeline needs to know about one launch.
pub struct LaunchRequest<'a> {
    pub url: &'a Url,
    /// Launch config with `resolved_install_path` set.
    pub config: &'a LaunchConfig,
    pub command_builder: &'a dyn CommandBuilder,
    pub hook_handlers: &'a [Arc<dyn HookHandler>],
    pub launch_type: LaunchType,
}

enum HookRun {
    Completed(Vec<HookFailure>),
    Aborted(Vec<HookFailure>, JoinlinkError),
}

/// Runs one launch against the given filesystem and process starter.
pub struct LaunchPipeline<'a> {
    files: &'a dyn FileStore,
    starter: &'a dyn ProcessStarter,
}

impl<'a> LaunchPipeline<'a> {
    pub fn new(files: &'a dyn FileStore, starter: &'a dyn ProcessStarter) -> Self {
        Self { files, starter }
    }

    pub fn run(&self, request: &LaunchRequest<'_>) -> Result<LaunchReport> {
        let handlers: HashMap<&str, &dyn HookHandler> = request
            .hook_handlers
            .iter()
            .map(|handler| (handler.name(), handler.as_ref()))
            .collect();

        let mut hook_failures =
            match self.run_hooks(request, &handlers, HookPhase::runs_before_launch) {
                HookRun::Completed(failures) => failures,
                HookRun::Aborted(_, err) => return Err(err.at_stage(LaunchStage::Hook)),
            };

        let args = request
            .command_builder
            .build(self.files, request.url, request.config, request.launch_type)
            .map_err(|e| e.at_stage(LaunchStage::Command))?;

        let executable = request
            .config
            .executable_path()
            .map_err(|e| e.at_stage(LaunchStage::Resolve))?;
        let work_dir = request
            .config
            .working_dir()
            .map_err(|e| e.at_stage(LaunchStage::Resolve))?;

        self.starter
            .start(&executable, &work_dir, &args)
            .map_err(|e| e.at_stage(LaunchStage::Start))?;

        let post_launch_aborted =
            match self.run_hooks(request, &handlers, HookPhase::runs_after_launch) {
                HookRun::Completed(failures) => {
                    hook_failures.extend(failures);
                    false
                }
                HookRun::Aborted(failures, err) => {
                    error!("Post-launch hooks aborted: {}", err);
                    hook_failures.extend(failures);
                    true
                }
            };

        info!("Launched {}", executable.display());
        Ok(LaunchReport {
            executable,
            work_dir,
            args,
            hook_failures,
            post_launch_aborted,
        })
    }

    fn run_hooks(
        &self,
        request: &LaunchRequest<'_>,
        handlers: &HashMap<&str, &dyn HookHandler>,
        selects: fn(HookPhase) -> bool,
    ) -> HookRun {
        let mut failures = Vec::new();

        for hook in request.config.hook_configs.iter().filter(|h| selects(h.phase)) {
            let Some(handler) = handlers.get(hook.handler.as_str()) else {
                warn!("No hook handler named {}, skipping", hook.handler);
                continue;
            };

            debug!("Running {} hook {}", hook.phase, hook.handler);
            if let Err(err) = handler.run(
                self.files,
                request.url,
                request.config,
                request.launch_type,
                &hook.args,
            ) {
                error!("Hook {} failed: {}", hook.handler, err);
                failures.push(failure(hook, &err));
                if hook.exit_on_error {
                    return HookRun::Aborted(failures, err);
                }
            }
        }

        HookRun::Completed(failures)
    }
}

fn failure(hook: &HookConfig, err: &JoinlinkError) -> HookFailure {
    HookFailure {
        handler: hook.handler.clone(),
        phase: hook.phase,
        message: err.to_string(),
    }
}
