//! Integration tests for the Router facade.
//!
//! The registry is an in-memory store and processes are recorded rather than
//! started, so these run on any platform.

use joinlink_core::launch::{RemoveFilesHook, UnrealBuilder};
use joinlink_core::platform::{
    MemoryConfigStore, OsFileStore, RecordingStarter, RegistryRoot, StoreOperation,
};
use joinlink_core::{
    HookConfig, HookPhase, JoinlinkError, LaunchConfig, LaunchStage, OverrideSet,
    PlatformClient, Probe, Router, StartDirectoryMode, Title, TitleOverride,
};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

const SWAT4_KEY: &str = r"SOFTWARE\WOW6432Node\Sierra\SWAT 4";
const EXE: &str = "/opt/joinlink/joinlink";

fn swat4() -> Title {
    Title::new(
        "swat4",
        "SWAT 4",
        LaunchConfig::new("Swat4.exe")
            .with_executable_dir(Path::new("Content").join("System"))
            .with_start_directory_mode(StartDirectoryMode::BinaryDir),
        Arc::new(UnrealBuilder),
    )
    .with_probe(Probe::registry(
        RegistryRoot::LocalMachine,
        SWAT4_KEY,
        "InstallPath",
    ))
}

/// Create a fake install directory with the executable in place.
fn create_install(temp_dir: &TempDir) -> std::path::PathBuf {
    let install = temp_dir.path().join("SWAT 4");
    let system = install.join("Content").join("System");
    std::fs::create_dir_all(&system).unwrap();
    std::fs::write(system.join("Swat4.exe"), b"").unwrap();
    install
}

fn router(store: Arc<MemoryConfigStore>, starter: Arc<RecordingStarter>) -> Router {
    Router::new(store, Arc::new(OsFileStore), starter, EXE)
}

fn failing_store() -> MemoryConfigStore {
    MemoryConfigStore::new().with_failure(RegistryRoot::LocalMachine, SWAT4_KEY, "access denied")
}

fn installed_store(install: &Path) -> MemoryConfigStore {
    MemoryConfigStore::new().with_value(
        RegistryRoot::LocalMachine,
        SWAT4_KEY,
        "InstallPath",
        &install.to_string_lossy(),
    )
}

#[test]
fn test_scan_registers_installed_titles_only() {
    let temp_dir = TempDir::new().unwrap();
    let install = create_install(&temp_dir);
    let store = Arc::new(installed_store(&install));
    let mut router = router(store.clone(), Arc::new(RecordingStarter::new()));

    router.add_title(swat4(), None);
    router.add_title(
        Title::new(
            "bf2",
            "Battlefield 2",
            LaunchConfig::new("BF2.exe"),
            Arc::new(UnrealBuilder),
        )
        .with_probe(Probe::dir(temp_dir.path().join("Battlefield 2"))),
        None,
    );

    let outcomes = router.scan();
    assert_eq!(outcomes.len(), 2);

    let bf2 = outcomes.iter().find(|o| o.title == "bf2").unwrap();
    assert!(!bf2.game_installed);
    assert!(!bf2.registered);
    assert!(bf2.error.is_none());

    let swat4 = outcomes.iter().find(|o| o.title == "swat4").unwrap();
    assert!(swat4.game_installed);
    assert!(swat4.platform_client_installed);
    assert!(!swat4.previously_registered);
    assert!(swat4.registered);
    assert_eq!(swat4.to_string(), "SWAT 4 (swat4): registered");

    let operations = store.operations();
    let creates = operations
        .iter()
        .filter(|op| matches!(op, StoreOperation::CreateKey { .. }))
        .count();
    let sets = operations
        .iter()
        .filter(|op| matches!(op, StoreOperation::SetString { .. }))
        .count();
    assert_eq!((creates, sets), (1, 3));

    // A second scan finds the registration and writes nothing.
    store.clear_operations();
    let again = router.scan();
    let swat4 = again.iter().find(|o| o.title == "swat4").unwrap();
    assert!(swat4.previously_registered);
    assert!(!swat4.registered);
    assert!(store.operations().is_empty());
}

#[test]
fn test_scan_rebinds_scheme_pointing_elsewhere() {
    let temp_dir = TempDir::new().unwrap();
    let install = create_install(&temp_dir);
    let store = Arc::new(installed_store(&install).with_value(
        RegistryRoot::CurrentUser,
        r"Software\Classes\swat4\shell\open\command",
        "",
        r#""C:\old\joinlink.exe" "%1""#,
    ));
    let mut router = router(store.clone(), Arc::new(RecordingStarter::new()));
    router.add_title(swat4(), None);

    let outcome = router.scan().remove(0);
    assert!(!outcome.previously_registered);
    assert!(outcome.registered);
    assert!(outcome.error.is_none());

    let operations = store.operations();
    let creates = operations
        .iter()
        .filter(|op| matches!(op, StoreOperation::CreateKey { .. }))
        .count();
    assert_eq!((creates, operations.len()), (1, 4));

    let title = router.title("swat4").unwrap();
    assert!(router.registrar().is_registered(title).unwrap());
}

#[test]
fn test_scan_isolates_failures_per_title() {
    let temp_dir = TempDir::new().unwrap();
    let store = Arc::new(failing_store());
    let mut router = router(store, Arc::new(RecordingStarter::new()));

    router.add_title(swat4(), None);
    router.add_title(
        Title::new(
            "bf2",
            "Battlefield 2",
            LaunchConfig::new("BF2.exe"),
            Arc::new(UnrealBuilder),
        )
        .with_probe(Probe::dir(temp_dir.path())),
        None,
    );

    let outcomes = router.scan();
    let swat4 = outcomes.iter().find(|o| o.title == "swat4").unwrap();
    assert!(swat4.is_failure());
    assert!(swat4.to_string().contains("failed"));

    let bf2 = outcomes.iter().find(|o| o.title == "bf2").unwrap();
    assert!(bf2.registered);
}

#[test]
fn test_launch_starts_binary_dir_process() {
    let temp_dir = TempDir::new().unwrap();
    let install = create_install(&temp_dir);
    let starter = Arc::new(RecordingStarter::new());
    let mut router = router(Arc::new(installed_store(&install)), starter.clone());
    router.add_title(swat4(), None);

    let report = router.launch("swat4://1.2.3.4:10480").unwrap();

    let system = install.join("Content").join("System");
    assert_eq!(report.executable, system.join("Swat4.exe"));
    assert_eq!(report.work_dir, system);
    assert_eq!(report.args, vec!["1.2.3.4:10480"]);

    let requests = starter.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].path, system.join("Swat4.exe"));
    assert_eq!(requests[0].work_dir, system);
}

#[test]
fn test_invalid_address_fails_before_lookup() {
    // Any lookup would hit the failing key and report a resolve error.
    let store = Arc::new(failing_store());
    let starter = Arc::new(RecordingStarter::new());
    let mut router = router(store, starter.clone());
    router.add_title(swat4(), None);

    for url in ["swat4://not-an-ip:10480", "swat4://1.2.3.4"] {
        let err = router.launch(url).unwrap_err();
        assert_eq!(err.stage(), Some(LaunchStage::Validate), "{}", url);
    }
    assert!(starter.requests().is_empty());
}

#[test]
fn test_unsupported_scheme() {
    let router = router(
        Arc::new(MemoryConfigStore::new()),
        Arc::new(RecordingStarter::new()),
    );

    let err = router.launch("quake3://1.2.3.4:27960").unwrap_err();
    assert!(matches!(err, JoinlinkError::UnsupportedScheme(ref s) if s == "quake3"));
    assert!(matches!(
        router.start("quake3").unwrap_err(),
        JoinlinkError::UnsupportedScheme(_)
    ));
}

#[test]
fn test_launch_of_missing_title_is_not_installed() {
    let starter = Arc::new(RecordingStarter::new());
    let mut router = router(Arc::new(MemoryConfigStore::new()), starter.clone());
    router.add_title(swat4(), None);

    let err = router.launch("swat4://1.2.3.4:10480").unwrap_err();
    assert_eq!(err.stage(), Some(LaunchStage::Resolve));
    match err {
        JoinlinkError::Launch { source, .. } => {
            assert!(matches!(*source, JoinlinkError::NotInstalled { .. }))
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(starter.requests().is_empty());
}

#[test]
fn test_platform_client_title_launches_client_with_title_hooks() {
    let temp_dir = TempDir::new().unwrap();
    let client_dir = temp_dir.path().join("Client");
    std::fs::create_dir_all(&client_dir).unwrap();
    std::fs::write(client_dir.join("Client.exe"), b"").unwrap();
    std::fs::write(client_dir.join("stale.tmp"), b"").unwrap();

    // The title's own probe fails; it must never be consulted.
    let store = Arc::new(failing_store());
    let starter = Arc::new(RecordingStarter::new());
    let mut router = router(store, starter.clone());

    let mut title = swat4()
        .with_platform_client(PlatformClient::new(
            "Client",
            Probe::file(client_dir.join("Client.exe")),
            LaunchConfig::new("Client.exe"),
        ))
        .with_hook_handler(Arc::new(RemoveFilesHook));
    title.launch_config = title.launch_config.with_hook(
        HookConfig::new(RemoveFilesHook::NAME, HookPhase::PostLaunch).with_arg("pattern", "*.tmp"),
    );
    router.add_title(title, None);

    let report = router.launch("swat4://1.2.3.4:10480").unwrap();

    assert_eq!(report.executable, client_dir.join("Client.exe"));
    assert_eq!(report.work_dir, client_dir);
    assert_eq!(report.args, vec!["1.2.3.4:10480"]);
    assert!(report.hook_failures.is_empty());
    assert!(!client_dir.join("stale.tmp").exists());
    assert_eq!(starter.requests().len(), 1);
}

#[test]
fn test_missing_platform_client() {
    let temp_dir = TempDir::new().unwrap();
    let install = create_install(&temp_dir);
    let starter = Arc::new(RecordingStarter::new());
    let mut router = router(Arc::new(installed_store(&install)), starter.clone());
    router.add_title(
        swat4().with_platform_client(PlatformClient::new(
            "Client",
            Probe::dir(temp_dir.path().join("Client")),
            LaunchConfig::new("Client.exe"),
        )),
        None,
    );

    let outcome = router.scan().remove(0);
    assert!(outcome.game_installed);
    assert!(!outcome.platform_client_installed);
    assert!(!outcome.registered);
    assert_eq!(outcome.to_string(), "SWAT 4 (swat4): platform client Client missing");

    let err = router.launch("swat4://1.2.3.4:10480").unwrap_err();
    match err {
        JoinlinkError::Launch { stage, source } => {
            assert_eq!(stage, LaunchStage::Resolve);
            assert!(matches!(*source, JoinlinkError::PlatformClientMissing { .. }));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(starter.requests().is_empty());
}

#[test]
fn test_start_skips_validation_and_join_args() {
    let temp_dir = TempDir::new().unwrap();
    let install = create_install(&temp_dir);
    let starter = Arc::new(RecordingStarter::new());
    let mut router = router(Arc::new(installed_store(&install)), starter.clone());
    router.add_title(swat4(), None);

    let report = router.start("SWAT4").unwrap();

    assert!(report.args.is_empty());
    assert_eq!(starter.requests().len(), 1);
}

#[test]
fn test_override_install_path_wins() {
    let temp_dir = TempDir::new().unwrap();
    let catalog_install = create_install(&temp_dir);
    let custom = temp_dir.path().join("Custom");
    std::fs::create_dir_all(&custom).unwrap();

    let mut overrides = OverrideSet::new();
    overrides.insert(
        "swat4",
        TitleOverride {
            install_path: Some(custom.clone()),
            executable_dir: Some(Path::new("").to_path_buf()),
            args: vec!["-windowed".to_string()],
            ..TitleOverride::default()
        },
    );
    overrides.insert("unknown", TitleOverride::default());

    let starter = Arc::new(RecordingStarter::new());
    let mut router = router(Arc::new(installed_store(&catalog_install)), starter.clone());
    router.add_titles([swat4()], &overrides);

    assert_eq!(router.titles().count(), 1);
    let report = router.launch("swat4://1.2.3.4:10480").unwrap();
    assert_eq!(report.executable, custom.join("Swat4.exe"));
    assert_eq!(report.args, vec!["-windowed", "1.2.3.4:10480"]);
}
