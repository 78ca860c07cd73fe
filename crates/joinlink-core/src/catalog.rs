//! Built-in titles.

use crate::launch::{
    HookHandler, KillProcessHook, RefractorV1Builder, RefractorV2Builder, RemoveFilesHook,
    SetDefaultProfileHook, UnrealBuilder,
};
use crate::platform::RegistryRoot;
use crate::title::{LaunchConfig, PlatformClient, Probe, StartDirectoryMode, Title};
use std::path::Path;
use std::sync::Arc;

const BF1942_KEY: &str = r"SOFTWARE\WOW6432Node\EA GAMES\Battlefield 1942";
const BFVIETNAM_KEY: &str = r"SOFTWARE\WOW6432Node\EA GAMES\Battlefield Vietnam";
const BF2_KEY: &str = r"SOFTWARE\WOW6432Node\Electronic Arts\EA Games\Battlefield 2";
const SWAT4_KEY: &str = r"SOFTWARE\WOW6432Node\Sierra\SWAT 4";
const SWAT4X_KEY: &str = r"SOFTWARE\WOW6432Node\Sierra\SWAT 4 - The Stetchkov Syndicate";

fn common_hook_handlers() -> Vec<Arc<dyn HookHandler>> {
    let kill: Arc<dyn HookHandler> = Arc::new(KillProcessHook);
    let remove: Arc<dyn HookHandler> = Arc::new(RemoveFilesHook);
    vec![kill, remove]
}

fn with_handlers(mut title: Title, handlers: Vec<Arc<dyn HookHandler>>) -> Title {
    title.hook_handlers.extend(handlers);
    title
}

/// Every built-in title.
pub fn titles() -> Vec<Title> {
    vec![bf1942(), bfvietnam(), bf2(), swat4(), swat4x()]
}

/// Storefront clients titles can depend on. None of the built-in titles
/// currently require one.
pub fn platform_clients() -> Vec<PlatformClient> {
    Vec::new()
}

/// Look up a known platform client by name.
pub fn platform_client(name: &str) -> Option<PlatformClient> {
    platform_clients()
        .into_iter()
        .find(|client| client.name.eq_ignore_ascii_case(name))
}

fn bf1942() -> Title {
    let title = Title::new(
        "bf1942",
        "Battlefield 1942",
        LaunchConfig::new("BF1942.exe").closing_before_launch(),
        Arc::new(RefractorV1Builder::new(["bf1942", "xpack1", "xpack2"])),
    )
    .with_probe(Probe::registry(RegistryRoot::LocalMachine, BF1942_KEY, "GAMEDIR"));
    with_handlers(title, common_hook_handlers())
}

fn bfvietnam() -> Title {
    let title = Title::new(
        "bfvietnam",
        "Battlefield Vietnam",
        LaunchConfig::new("BfVietnam.exe").closing_before_launch(),
        Arc::new(RefractorV1Builder::new(["bfvietnam"])),
    )
    .with_probe(Probe::registry(RegistryRoot::LocalMachine, BFVIETNAM_KEY, "GAMEDIR"));
    with_handlers(title, common_hook_handlers())
}

fn bf2() -> Title {
    let title = Title::new(
        "bf2",
        "Battlefield 2",
        LaunchConfig::new("BF2.exe")
            .with_default_args(["+menu", "1", "+fullscreen", "1"])
            .closing_before_launch(),
        Arc::new(RefractorV2Builder::new(["bf2", "xpack"], "bf2")),
    )
    .with_probe(Probe::registry(RegistryRoot::LocalMachine, BF2_KEY, "InstallDir"));

    let mut handlers = common_hook_handlers();
    handlers.push(Arc::new(SetDefaultProfileHook::new()));
    with_handlers(title, handlers)
}

fn swat4() -> Title {
    let title = Title::new(
        "swat4",
        "SWAT 4",
        LaunchConfig::new("Swat4.exe")
            .with_executable_dir(Path::new("Content").join("System"))
            .with_start_directory_mode(StartDirectoryMode::BinaryDir)
            .closing_before_launch(),
        Arc::new(UnrealBuilder),
    )
    .with_probe(Probe::registry(RegistryRoot::LocalMachine, SWAT4_KEY, "InstallPath"));
    with_handlers(title, common_hook_handlers())
}

fn swat4x() -> Title {
    let title = Title::new(
        "swat4x",
        "SWAT 4: The Stetchkov Syndicate",
        LaunchConfig::new("Swat4X.exe")
            .with_executable_dir(Path::new("ContentExpansion").join("System"))
            .with_start_directory_mode(StartDirectoryMode::BinaryDir)
            .closing_before_launch(),
        Arc::new(UnrealBuilder),
    )
    .with_probe(Probe::registry(RegistryRoot::LocalMachine, SWAT4X_KEY, "InstallPath"))
    .with_probe(Probe::registry(RegistryRoot::LocalMachine, SWAT4_KEY, "InstallPath"));
    with_handlers(title, common_hook_handlers())
}
