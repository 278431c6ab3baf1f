//! Module error types

use std::path::PathBuf;

use thiserror::Error;
use void_asset::ConfigError;

/// Errors raised while wiring or running the asset module
#[derive(Debug, Error)]
pub enum ModuleError {
    /// Invalid configuration
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A content type names a decoder that is not registered
    #[error("content type '{content_type}' names unknown decoder '{decoder}'")]
    UnknownDecoder {
        content_type: String,
        decoder: String,
    },

    /// A singleton name is already taken
    #[error("singleton '{0}' is already registered")]
    SingletonExists(String),

    /// The content watcher could not be set up
    #[error("cannot watch {path:?}: {message}")]
    Watch { path: PathBuf, message: String },
}

/// Result type for module operations
pub type ModuleResult<T> = Result<T, ModuleError>;
