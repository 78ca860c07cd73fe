//! Filesystem access used by probes, hooks and command builders.

use crate::error::{JoinlinkError, Result};
use globset::GlobBuilder;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Filesystem primitives consumed by the locator, hooks and command builders.
pub trait FileStore: Send + Sync {
    fn file_exists(&self, path: &Path) -> Result<bool>;
    fn dir_exists(&self, path: &Path) -> Result<bool>;
    fn read_file(&self, path: &Path) -> Result<Vec<u8>>;
    fn write_file(&self, path: &Path, contents: &[u8]) -> Result<()>;

    /// Entries of a directory, sorted by path.
    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>>;

    /// Paths under `root` matching `pattern`, sorted.
    ///
    /// `root` is taken literally, so it may contain glob metacharacters.
    /// `pattern` is relative to `root`, or absolute when `root` is empty. A
    /// pattern whose literal prefix does not exist matches nothing.
    fn glob(&self, root: &Path, pattern: &str) -> Result<Vec<PathBuf>>;

    /// Remove a file or directory tree. Missing paths are not an error.
    fn remove_all(&self, path: &Path) -> Result<()>;
}

/// [`FileStore`] backed by `std::fs`.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsFileStore;

fn exists_with_kind(path: &Path, want_dir: bool) -> Result<bool> {
    match fs::metadata(path) {
        Ok(metadata) => Ok(metadata.is_dir() == want_dir),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(JoinlinkError::io_with_path(e, path)),
    }
}

fn has_glob_meta(component: &str) -> bool {
    component.contains(['*', '?', '[', '{'])
}

/// Split a glob pattern into the directory to walk and the normalized pattern.
fn split_pattern(pattern: &str) -> (PathBuf, String) {
    let normalized = if cfg!(windows) {
        pattern.replace('\\', "/")
    } else {
        pattern.to_string()
    };

    let components: Vec<&str> = normalized.split('/').collect();
    let literal: Vec<&str> = components
        .iter()
        .copied()
        .take_while(|component| !has_glob_meta(component))
        .collect();
    let base = PathBuf::from(literal.join("/"));

    // A pattern without wildcards names a single path.
    if literal.len() == components.len() {
        let parent = base.parent().map(Path::to_path_buf).unwrap_or_default();
        return (parent, normalized);
    }

    (base, normalized)
}

impl FileStore for OsFileStore {
    fn file_exists(&self, path: &Path) -> Result<bool> {
        exists_with_kind(path, false)
    }

    fn dir_exists(&self, path: &Path) -> Result<bool> {
        exists_with_kind(path, true)
    }

    fn read_file(&self, path: &Path) -> Result<Vec<u8>> {
        fs::read(path).map_err(|e| JoinlinkError::io_with_path(e, path))
    }

    fn write_file(&self, path: &Path, contents: &[u8]) -> Result<()> {
        fs::write(path, contents).map_err(|e| JoinlinkError::io_with_path(e, path))
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let entries = fs::read_dir(path).map_err(|e| JoinlinkError::io_with_path(e, path))?;
        let mut paths = entries
            .map(|entry| entry.map(|e| e.path()))
            .collect::<std::io::Result<Vec<_>>>()
            .map_err(|e| JoinlinkError::io_with_path(e, path))?;
        paths.sort();
        Ok(paths)
    }

    fn glob(&self, root: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
        let (base, normalized) = split_pattern(pattern);
        let matcher = GlobBuilder::new(&normalized)
            .literal_separator(true)
            .build()
            .map_err(|e| JoinlinkError::Config {
                message: format!("Invalid glob pattern {:?}: {}", pattern, e),
            })?
            .compile_matcher();

        let walk_root = root.join(&base);
        let walk_root = if walk_root.as_os_str().is_empty() {
            PathBuf::from(".")
        } else {
            walk_root
        };
        if !walk_root.exists() {
            debug!("Glob base {} does not exist", walk_root.display());
            return Ok(Vec::new());
        }

        // Match on the part below `root` so the root never goes through the
        // glob parser.
        let mut matches: Vec<PathBuf> = WalkDir::new(&walk_root)
            .min_depth(1)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                let candidate = base.join(entry.path().strip_prefix(&walk_root).ok()?);
                matcher
                    .is_match(&candidate)
                    .then(|| root.join(candidate))
            })
            .collect();
        matches.sort();
        Ok(matches)
    }

    fn remove_all(&self, path: &Path) -> Result<()> {
        let metadata = match fs::symlink_metadata(path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(JoinlinkError::io_with_path(e, path)),
        };

        let removed = if metadata.is_dir() {
            fs::remove_dir_all(path)
        } else {
            fs::remove_file(path)
        };
        removed.map_err(|e| JoinlinkError::io_with_path(e, path))?;
        debug!("Removed {}", path.display());
        Ok(())
    }
}
