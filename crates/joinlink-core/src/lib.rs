//! joinlink core - URL-scheme handler registration and game launching.
//!
//! The library discovers installed multiplayer titles, binds their URL
//! schemes (`bf2://`, `swat4://`, ...) to the joinlink executable and, when a
//! deep link such as `bf2://1.2.3.4:16567?mod=xpack` is opened, starts the
//! game pointed at that server.
//!
//! # Example
//!
//! ```rust,ignore
//! use joinlink_core::{catalog, platform, OverrideSet, Router};
//! use std::sync::Arc;
//!
//! fn main() -> joinlink_core::Result<()> {
//!     let mut router = Router::new(
//!         Arc::from(platform::system_config_store()?),
//!         Arc::new(platform::OsFileStore),
//!         Arc::new(platform::DetachedStarter),
//!         std::env::current_exe()?,
//!     );
//!     router.add_titles(catalog::titles(), &OverrideSet::new());
//!
//!     for outcome in router.scan() {
//!         println!("{}", outcome);
//!     }
//!     router.launch("bf2://1.2.3.4:16567")?;
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod config;
pub mod error;
pub mod launch;
pub mod locator;
pub mod overrides;
pub mod platform;
pub mod profile;
pub mod registrar;
pub mod router;
pub mod title;

pub use config::{default_overrides_path, AppConfig};
pub use error::{JoinlinkError, LaunchStage, Result};
pub use launch::{HookFailure, LaunchReport};
pub use locator::SoftwareLocator;
pub use overrides::{OverrideSet, TitleOverride};
pub use registrar::HandlerRegistrar;
pub use router::{RegistrationOutcome, Router};
pub use title::{
    HookConfig, HookPhase, LaunchConfig, LaunchType, PathKind, PlatformClient, Probe,
    StartDirectoryMode, Title,
};
