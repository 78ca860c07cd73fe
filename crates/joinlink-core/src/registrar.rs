//! Per-user URL-scheme handler registration.
//!
//! A scheme is registered when
//! `HKCU\Software\Classes\<scheme>\shell\open\command` holds
//! `"<joinlink exe>" "%1"`. Registration writes that key plus the two values
//! that mark `<scheme>` as a URL protocol.

use crate::config::RegistryConfig;
use crate::error::Result;
use crate::platform::{ConfigStore, RegistryRoot};
use crate::title::Title;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Reads and writes scheme handler registrations.
#[derive(Clone)]
pub struct HandlerRegistrar {
    store: Arc<dyn ConfigStore>,
    executable: PathBuf,
}

impl HandlerRegistrar {
    /// `executable` is the binary the shell should invoke, normally
    /// `std::env::current_exe()`.
    pub fn new(store: Arc<dyn ConfigStore>, executable: impl Into<PathBuf>) -> Self {
        Self {
            store,
            executable: executable.into(),
        }
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// The command line the shell runs for a deep link.
    pub fn command(&self) -> String {
        format!(
            "\"{}\" \"{}\"",
            self.executable.display(),
            RegistryConfig::URL_PLACEHOLDER
        )
    }

    fn scheme_key(title: &Title) -> String {
        format!(r"{}\{}", RegistryConfig::CLASSES_PATH, title.protocol_scheme)
    }

    fn command_key(title: &Title) -> String {
        format!(r"{}\{}", Self::scheme_key(title), RegistryConfig::COMMAND_SUBPATH)
    }

    /// Whether the scheme already points at this executable.
    pub fn is_registered(&self, title: &Title) -> Result<bool> {
        match self
            .store
            .get_string(RegistryRoot::CurrentUser, &Self::command_key(title), "")
        {
            Ok(current) => {
                let registered = current == self.command();
                if !registered {
                    debug!(
                        "{} is bound to {:?}, expected {:?}",
                        title.protocol_scheme,
                        current,
                        self.command()
                    );
                }
                Ok(registered)
            }
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Bind the title's scheme to this executable.
    ///
    /// Not transactional: a failure part-way leaves earlier writes in place,
    /// and the next registration overwrites them.
    pub fn register(&self, title: &Title) -> Result<()> {
        let root = RegistryRoot::CurrentUser;
        let scheme_key = Self::scheme_key(title);
        let command_key = Self::command_key(title);

        self.store.create_key(root, &command_key)?;
        self.store
            .set_string(root, &scheme_key, "", &format!("URL:{} protocol", title.label))?;
        self.store
            .set_string(root, &scheme_key, RegistryConfig::URL_PROTOCOL_VALUE, "")?;
        self.store.set_string(root, &command_key, "", &self.command())?;

        info!("Registered {}:// for {}", title.protocol_scheme, title.label);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::JoinlinkError;
    use crate::launch::UnrealBuilder;
    use crate::platform::{MemoryConfigStore, StoreOperation};
    use crate::title::LaunchConfig;

    fn title() -> Title {
        Title::new(
            "swat4",
            "SWAT 4",
            LaunchConfig::new("Swat4.exe"),
            Arc::new(UnrealBuilder),
        )
    }

    #[test]
    fn test_register_writes_one_key_and_three_values() {
        let store = Arc::new(MemoryConfigStore::new());
        let registrar = HandlerRegistrar::new(store.clone(), "/opt/joinlink/joinlink");

        registrar.register(&title()).unwrap();

        let root = RegistryRoot::CurrentUser;
        assert_eq!(
            store.operations(),
            vec![
                StoreOperation::CreateKey {
                    root,
                    path: r"Software\Classes\swat4\shell\open\command".to_string(),
                },
                StoreOperation::SetString {
                    root,
                    path: r"Software\Classes\swat4".to_string(),
                    name: String::new(),
                    value: "URL:SWAT 4 protocol".to_string(),
                },
                StoreOperation::SetString {
                    root,
                    path: r"Software\Classes\swat4".to_string(),
                    name: "URL Protocol".to_string(),
                    value: String::new(),
                },
                StoreOperation::SetString {
                    root,
                    path: r"Software\Classes\swat4\shell\open\command".to_string(),
                    name: String::new(),
                    value: "\"/opt/joinlink/joinlink\" \"%1\"".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_registration_is_idempotent() {
        let store = Arc::new(MemoryConfigStore::new());
        let registrar = HandlerRegistrar::new(store.clone(), "/opt/joinlink/joinlink");
        let title = title();

        assert!(!registrar.is_registered(&title).unwrap());
        registrar.register(&title).unwrap();
        assert!(registrar.is_registered(&title).unwrap());

        store.clear_operations();
        registrar.register(&title).unwrap();
        assert!(registrar.is_registered(&title).unwrap());
        assert_eq!(store.operations().len(), 4);
    }

    #[test]
    fn test_moved_executable_is_not_registered() {
        let store = Arc::new(MemoryConfigStore::new());
        let title = title();
        HandlerRegistrar::new(store.clone(), "/opt/joinlink/joinlink")
            .register(&title)
            .unwrap();

        let moved = HandlerRegistrar::new(store.clone(), "/usr/local/bin/joinlink");
        assert!(!moved.is_registered(&title).unwrap());
    }

    #[test]
    fn test_store_errors_propagate() {
        let store = Arc::new(MemoryConfigStore::new().with_failure(
            RegistryRoot::CurrentUser,
            r"Software\Classes\swat4\shell\open\command",
            "access denied",
        ));
        let registrar = HandlerRegistrar::new(store, "/opt/joinlink/joinlink");

        assert!(matches!(
            registrar.is_registered(&title()).unwrap_err(),
            JoinlinkError::Registry { .. }
        ));
        assert!(matches!(
            registrar.register(&title()).unwrap_err(),
            JoinlinkError::Registry { .. }
        ));
    }
}
