//! Platform abstraction layer.
//!
//! Every touch of the host goes through one of three capabilities defined
//! here, so the locator, registrar and launch pipeline stay testable:
//! - `registry` - the hierarchical configuration store ([`ConfigStore`])
//! - `fs` - filesystem primitives ([`FileStore`])
//! - `process` - detached process start and termination ([`ProcessStarter`])
//!
//! All `#[cfg]` blocks for OS-specific behavior live in this module.

pub mod fs;
pub mod process;
pub mod registry;

pub use fs::{FileStore, OsFileStore};
pub use process::{
    terminate_processes_by_name, DetachedStarter, ProcessStarter, RecordingStarter, StartRequest,
};
pub use registry::{
    system_config_store, ConfigStore, MemoryConfigStore, RegistryRoot, StoreOperation,
};

#[cfg(windows)]
pub use registry::WindowsRegistry;
