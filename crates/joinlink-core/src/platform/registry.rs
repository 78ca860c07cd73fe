//! Hierarchical key/value configuration store (the Windows registry).
//!
//! All registry access goes through [`ConfigStore`] so discovery and
//! registration can run against [`MemoryConfigStore`] in tests.

use crate::error::{JoinlinkError, Result};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::RwLock;

/// Predefined root key a path is resolved against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RegistryRoot {
    /// `HKEY_CURRENT_USER`
    CurrentUser,
    /// `HKEY_LOCAL_MACHINE`
    LocalMachine,
}

impl fmt::Display for RegistryRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryRoot::CurrentUser => write!(f, "HKEY_CURRENT_USER"),
            RegistryRoot::LocalMachine => write!(f, "HKEY_LOCAL_MACHINE"),
        }
    }
}

/// Read/write access to string values in the configuration store.
///
/// A missing key or value must be reported as [`JoinlinkError::NotFound`] so
/// callers can tell "absent" apart from a failed read.
pub trait ConfigStore: Send + Sync {
    /// Read a string value. `name` is empty for the key's default value.
    fn get_string(&self, root: RegistryRoot, path: &str, name: &str) -> Result<String>;

    /// Write a string value, creating the key if needed.
    fn set_string(&self, root: RegistryRoot, path: &str, name: &str, value: &str) -> Result<()>;

    /// Create a key and any missing parents. Existing keys are left untouched.
    fn create_key(&self, root: RegistryRoot, path: &str) -> Result<()>;
}

fn display_path(root: RegistryRoot, path: &str, name: &str) -> String {
    if name.is_empty() {
        format!(r"{}\{}", root, path)
    } else {
        format!(r"{}\{}\{}", root, path, name)
    }
}

/// Return the platform's configuration store.
///
/// Only Windows has one; elsewhere this is a configuration error.
pub fn system_config_store() -> Result<Box<dyn ConfigStore>> {
    #[cfg(windows)]
    {
        Ok(Box::new(WindowsRegistry))
    }

    #[cfg(not(windows))]
    {
        Err(JoinlinkError::Config {
            message: "URL-scheme registration requires the Windows registry".to_string(),
        })
    }
}

#[cfg(windows)]
pub use self::windows::WindowsRegistry;

#[cfg(windows)]
mod windows {
    use super::{display_path, ConfigStore, RegistryRoot};
    use crate::error::{JoinlinkError, Result};
    use tracing::debug;
    use winreg::enums::{HKEY_CURRENT_USER, HKEY_LOCAL_MACHINE};
    use winreg::RegKey;

    /// [`ConfigStore`] backed by the live registry.
    #[derive(Debug, Default, Clone, Copy)]
    pub struct WindowsRegistry;

    fn predef(root: RegistryRoot) -> RegKey {
        match root {
            RegistryRoot::CurrentUser => RegKey::predef(HKEY_CURRENT_USER),
            RegistryRoot::LocalMachine => RegKey::predef(HKEY_LOCAL_MACHINE),
        }
    }

    fn map_err(err: std::io::Error, path: String) -> JoinlinkError {
        if err.kind() == std::io::ErrorKind::NotFound {
            JoinlinkError::NotFound { path }
        } else {
            JoinlinkError::Registry {
                message: err.to_string(),
                path,
                source: Some(err),
            }
        }
    }

    impl ConfigStore for WindowsRegistry {
        fn get_string(&self, root: RegistryRoot, path: &str, name: &str) -> Result<String> {
            let key = predef(root)
                .open_subkey(path)
                .map_err(|e| map_err(e, display_path(root, path, "")))?;
            key.get_value::<String, _>(name)
                .map_err(|e| map_err(e, display_path(root, path, name)))
        }

        fn set_string(
            &self,
            root: RegistryRoot,
            path: &str,
            name: &str,
            value: &str,
        ) -> Result<()> {
            let (key, _) = predef(root)
                .create_subkey(path)
                .map_err(|e| map_err(e, display_path(root, path, "")))?;
            key.set_value(name, &value.to_string())
                .map_err(|e| map_err(e, display_path(root, path, name)))?;
            debug!("Set {} = {:?}", display_path(root, path, name), value);
            Ok(())
        }

        fn create_key(&self, root: RegistryRoot, path: &str) -> Result<()> {
            predef(root)
                .create_subkey(path)
                .map_err(|e| map_err(e, display_path(root, path, "")))?;
            Ok(())
        }
    }
}

/// A write recorded by [`MemoryConfigStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOperation {
    CreateKey {
        root: RegistryRoot,
        path: String,
    },
    SetString {
        root: RegistryRoot,
        path: String,
        name: String,
        value: String,
    },
}

type KeyId = (RegistryRoot, String);

#[derive(Debug, Default)]
struct MemoryState {
    keys: BTreeMap<KeyId, BTreeMap<String, String>>,
    failures: BTreeMap<KeyId, String>,
    operations: Vec<StoreOperation>,
}

/// In-memory [`ConfigStore`] that records every write.
///
/// Paths and value names compare case-insensitively, like the registry.
#[derive(Debug, Default)]
pub struct MemoryConfigStore {
    state: RwLock<MemoryState>,
}

fn normalize(path: &str) -> String {
    path.trim_matches('\\').to_ascii_lowercase()
}

impl MemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a value without recording an operation.
    pub fn with_value(self, root: RegistryRoot, path: &str, name: &str, value: &str) -> Self {
        if let Ok(mut state) = self.state.write() {
            Self::insert_key(&mut state, root, path);
            state
                .keys
                .entry((root, normalize(path)))
                .or_default()
                .insert(name.to_ascii_lowercase(), value.to_string());
        }
        self
    }

    /// Make every access to `path` fail with a registry error.
    pub fn with_failure(self, root: RegistryRoot, path: &str, message: &str) -> Self {
        if let Ok(mut state) = self.state.write() {
            state
                .failures
                .insert((root, normalize(path)), message.to_string());
        }
        self
    }

    /// Writes performed so far, in order.
    pub fn operations(&self) -> Vec<StoreOperation> {
        self.state
            .read()
            .map(|state| state.operations.clone())
            .unwrap_or_default()
    }

    /// Forget recorded writes (stored values are kept).
    pub fn clear_operations(&self) {
        if let Ok(mut state) = self.state.write() {
            state.operations.clear();
        }
    }

    /// Whether a key exists.
    pub fn key_exists(&self, root: RegistryRoot, path: &str) -> bool {
        self.state
            .read()
            .map(|state| state.keys.contains_key(&(root, normalize(path))))
            .unwrap_or(false)
    }

    fn insert_key(state: &mut MemoryState, root: RegistryRoot, path: &str) {
        let normalized = normalize(path);
        let mut prefix = String::new();
        for segment in normalized.split('\\').filter(|s| !s.is_empty()) {
            if !prefix.is_empty() {
                prefix.push('\\');
            }
            prefix.push_str(segment);
            state.keys.entry((root, prefix.clone())).or_default();
        }
    }

    fn check_failure(state: &MemoryState, root: RegistryRoot, path: &str) -> Result<()> {
        match state.failures.get(&(root, normalize(path))) {
            Some(message) => Err(JoinlinkError::Registry {
                path: display_path(root, path, ""),
                message: message.clone(),
                source: None,
            }),
            None => Ok(()),
        }
    }

    fn poisoned() -> JoinlinkError {
        JoinlinkError::Other("memory store lock poisoned".to_string())
    }
}

impl ConfigStore for MemoryConfigStore {
    fn get_string(&self, root: RegistryRoot, path: &str, name: &str) -> Result<String> {
        let state = self.state.read().map_err(|_| Self::poisoned())?;
        Self::check_failure(&state, root, path)?;

        let values = state
            .keys
            .get(&(root, normalize(path)))
            .ok_or_else(|| JoinlinkError::NotFound {
                path: display_path(root, path, ""),
            })?;

        values
            .get(&name.to_ascii_lowercase())
            .cloned()
            .ok_or_else(|| JoinlinkError::NotFound {
                path: display_path(root, path, name),
            })
    }

    fn set_string(&self, root: RegistryRoot, path: &str, name: &str, value: &str) -> Result<()> {
        let mut state = self.state.write().map_err(|_| Self::poisoned())?;
        Self::check_failure(&state, root, path)?;

        Self::insert_key(&mut state, root, path);
        state
            .keys
            .entry((root, normalize(path)))
            .or_default()
            .insert(name.to_ascii_lowercase(), value.to_string());
        state.operations.push(StoreOperation::SetString {
            root,
            path: path.to_string(),
            name: name.to_string(),
            value: value.to_string(),
        });
        Ok(())
    }

    fn create_key(&self, root: RegistryRoot, path: &str) -> Result<()> {
        let mut state = self.state.write().map_err(|_| Self::poisoned())?;
        Self::check_failure(&state, root, path)?;

        Self::insert_key(&mut state, root, path);
        state.operations.push(StoreOperation::CreateKey {
            root,
            path: path.to_string(),
        });
        Ok(())
    }
}
