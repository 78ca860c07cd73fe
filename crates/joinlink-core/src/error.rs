//! Error types for joinlink.
//!
//! One enum covers every stage of discovery, registration and launching so the
//! CLI can print a single line for any failure.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Pipeline stage a launch failure originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchStage {
    Parse,
    Validate,
    Resolve,
    Hook,
    Command,
    Start,
}

impl fmt::Display for LaunchStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LaunchStage::Parse => write!(f, "URL parsing"),
            LaunchStage::Validate => write!(f, "URL validation"),
            LaunchStage::Resolve => write!(f, "install path resolution"),
            LaunchStage::Hook => write!(f, "hook execution"),
            LaunchStage::Command => write!(f, "command construction"),
            LaunchStage::Start => write!(f, "process start"),
        }
    }
}

/// Main error type for joinlink.
#[derive(Debug, Error)]
pub enum JoinlinkError {
    // Discovery errors
    #[error("{title} is not installed")]
    NotInstalled { title: String },

    #[error("Required platform client {client} is not installed")]
    PlatformClientMissing { client: String },

    /// A configuration-store key or value does not exist.
    #[error("Registry entry not found: {path}")]
    NotFound { path: String },

    #[error("Registry error at {path}: {message}")]
    Registry {
        path: String,
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("Could not determine install path: {message}")]
    PathResolution { message: String },

    // URL errors
    #[error("Invalid URL {url:?}: {message}")]
    InvalidUrl { url: String, message: String },

    #[error("Unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("URL validation failed for {url}: {message}")]
    UrlValidation { url: String, message: String },

    // Launch errors
    #[error("Failed to build launch command: {message}")]
    CommandBuild { message: String },

    #[error("Failed to start {path:?}: {source}")]
    ProcessStart {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Hook {handler} failed: {message}")]
    Hook { handler: String, message: String },

    #[error("{stage} failed: {source}")]
    Launch {
        stage: LaunchStage,
        #[source]
        source: Box<JoinlinkError>,
    },

    // File system errors
    #[error("IO error at {path:?}: {message}")]
    Io {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<std::io::Error>,
    },

    // Serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    // Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("{0}")]
    Other(String),
}

/// Result type alias for joinlink operations.
pub type Result<T> = std::result::Result<T, JoinlinkError>;

impl From<std::io::Error> for JoinlinkError {
    fn from(err: std::io::Error) -> Self {
        JoinlinkError::Io {
            message: err.to_string(),
            path: None,
            source: Some(err),
        }
    }
}

impl From<serde_json::Error> for JoinlinkError {
    fn from(err: serde_json::Error) -> Self {
        JoinlinkError::Json {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl JoinlinkError {
    /// Create an IO error with path context.
    pub fn io_with_path(err: std::io::Error, path: impl Into<PathBuf>) -> Self {
        JoinlinkError::Io {
            message: err.to_string(),
            path: Some(path.into()),
            source: Some(err),
        }
    }

    /// Wrap an error with the launch stage it came from.
    ///
    /// Errors that already carry a stage are returned unchanged.
    pub fn at_stage(self, stage: LaunchStage) -> Self {
        match self {
            JoinlinkError::Launch { .. } => self,
            other => JoinlinkError::Launch {
                stage,
                source: Box::new(other),
            },
        }
    }

    /// Whether this is a "does not exist" answer from a store.
    pub fn is_not_found(&self) -> bool {
        match self {
            JoinlinkError::NotFound { .. } => true,
            JoinlinkError::Io {
                source: Some(source),
                ..
            } => source.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }

    /// The launch stage, if this error was produced by the launch pipeline.
    pub fn stage(&self) -> Option<LaunchStage> {
        match self {
            JoinlinkError::Launch { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}
