//! Configuration errors and bootstrap outcomes

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use crate::value::Shape;

/// Why a JSON document could not be read
#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("top level must be an object, found {0}")]
    NotAnObject(Shape),
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to load default config file [{}]: {source}", .path.display())]
    DefaultLoad {
        path: PathBuf,
        #[source]
        source: ReadError,
    },

    #[error("failed to generate config file [{}]: {source}", .path.display())]
    Create {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("no default values to generate config file [{}] from", .path.display())]
    MissingDefaults { path: PathBuf },

    #[error("failed to load config file [{}]: {source}", .path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: ReadError,
    },

    #[error("failed to save config file [{}]: {source}", .path.display())]
    Save {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to delete config file [{}]: {source}", .path.display())]
    Delete {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("config file [{}] was already deleted", .path.display())]
    AlreadyDeleted { path: PathBuf },
}

/// How the backing file was established at construction
#[derive(Debug, Clone)]
pub enum LoadOutcome {
    /// The existing file was read
    Loaded,
    /// The file was generated from the defaults, then read
    Created,
    /// The file could not be created or read; defaults were substituted
    Recovered(Arc<ConfigError>),
}

impl LoadOutcome {
    pub fn is_broken(&self) -> bool {
        matches!(self, LoadOutcome::Recovered(_))
    }

    /// The failure that forced recovery, if any
    pub fn cause(&self) -> Option<&ConfigError> {
        match self {
            LoadOutcome::Recovered(cause) => Some(cause.as_ref()),
            _ => None,
        }
    }
}
