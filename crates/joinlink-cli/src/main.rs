//! joinlink - registers game URL schemes and launches games from deep links.
//!
//! Run without arguments to register every installed title. The shell invokes
//! the binary with the deep link as its only argument.

use anyhow::{Context, Result};
use clap::Parser;
use joinlink_core::platform::{self, DetachedStarter, OsFileStore};
use joinlink_core::{catalog, default_overrides_path, LaunchReport, OverrideSet, Router};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{debug, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "joinlink")]
#[command(about = "Join multiplayer game servers from URL links")]
#[command(version)]
struct Args {
    /// Deep link to open, e.g. bf2://1.2.3.4:16567?mod=xpack
    url: Option<String>,

    /// Start a title by scheme without joining a server
    #[arg(long, value_name = "SCHEME", conflicts_with = "url")]
    start: Option<String>,

    /// Override file (defaults to <config dir>/joinlink/overrides.json)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// List known titles and exit
    #[arg(long, conflicts_with_all = ["url", "start"])]
    list: bool,
}

fn build_router(config_path: Option<PathBuf>) -> Result<Router> {
    let overrides = match config_path.or_else(default_overrides_path) {
        Some(path) => OverrideSet::load(&path)
            .with_context(|| format!("Failed to load overrides from {}", path.display()))?,
        None => {
            warn!("No config directory available, running without overrides");
            OverrideSet::new()
        }
    };

    let executable = std::env::current_exe().context("Failed to locate the joinlink binary")?;
    debug!("Handler executable: {}", executable.display());

    let mut router = Router::new(
        Arc::from(platform::system_config_store()?),
        Arc::new(OsFileStore),
        Arc::new(DetachedStarter),
        executable,
    );
    router.add_titles(catalog::titles(), &overrides);
    Ok(router)
}

fn print_launch(report: &LaunchReport) {
    println!("Launched {}", report.executable.display());
    for failure in &report.hook_failures {
        println!(
            "  {} hook {} failed: {}",
            failure.phase, failure.handler, failure.message
        );
    }
}

fn run(args: Args) -> Result<bool> {
    if args.list {
        for title in catalog::titles() {
            println!("{:<12} {}", title.protocol_scheme, title.label);
        }
        return Ok(true);
    }

    let router = build_router(args.config)?;

    if let Some(scheme) = args.start {
        let report = router.start(&scheme)?;
        print_launch(&report);
        return Ok(true);
    }

    if let Some(url) = args.url {
        let report = router.launch(&url)?;
        print_launch(&report);
        return Ok(true);
    }

    let outcomes = router.scan();
    for outcome in &outcomes {
        println!("{}", outcome);
    }
    Ok(outcomes.iter().all(|outcome| !outcome.is_failure()))
}

fn main() -> ExitCode {
    let args = Args::parse();

    // Set up logging
    let log_level = if args.debug { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .init();

    match run(args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            println!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
