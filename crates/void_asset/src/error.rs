//! Error types for the asset pipeline
//!
//! Every failure is returned as a value. Nothing in the resolution or
//! loading path panics on bad input.

use std::path::PathBuf;
use thiserror::Error;

/// Content-type registration errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Prefix is the empty string
    #[error("Content type prefix must not be empty")]
    EmptyPrefix,

    /// Prefix contains the scheme separator
    #[error("Content type prefix '{0}' must not contain \"://\"")]
    SeparatorInPrefix(String),

    /// Prefix registered twice
    #[error("Content type '{0}' is already registered")]
    DuplicatePrefix(String),
}

/// Why a virtual path could not be resolved
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// Path does not start with any registered `<prefix>://`
    #[error("Unrecognized virtual path prefix: '{0}'")]
    UnrecognizedPrefix(String),

    /// Prefix is registered but nothing was indexed under this name
    #[error("No file indexed for virtual path '{0}'")]
    NotIndexed(String),

    /// Prefix is registered but the identifier after it is unusable
    #[error("Malformed virtual path '{path}': {reason}")]
    Malformed {
        /// Offending path
        path: String,
        /// What is wrong with it
        reason: &'static str,
    },
}

/// Decoder failures
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The file could not be read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The file is zero-length
    #[error("File is empty")]
    Empty,

    /// The content is not valid for this decoder
    #[error("Malformed content: {0}")]
    Malformed(String),
}

/// Result type for decoders
pub type DecodeResult<T> = Result<T, DecodeError>;

/// Coarse failure classes, one per row of the error taxonomy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoadErrorKind {
    /// No registered content type matches the path
    UnrecognizedPrefix,
    /// Content type matched but nothing was indexed (or the path is malformed)
    ResolutionFailure,
    /// The file was found but could not be decoded
    DecodeFailure,
    /// No decoder is bound to the content type or the file extension
    NoDecoderForType,
    /// The host loader claimed the path but failed to produce a resource
    HostFailure,
    /// No loader in the chain recognizes the path
    NoLoader,
}

/// Load failures reported to the host loader chain
#[derive(Debug, Error)]
pub enum LoadError {
    /// Virtual path could not be resolved
    #[error("Unresolved virtual path: {0}")]
    Unresolved(#[from] ResolveError),

    /// Host loader reported the path as existing but returned nothing
    #[error("Host loader failed to load '{}'", real_path.display())]
    Host {
        /// Resolved real path handed to the host
        real_path: PathBuf,
    },

    /// Decoder rejected the file
    #[error("Failed to decode '{virtual_path}': {source}")]
    Decode {
        /// Virtual path being loaded
        virtual_path: String,
        /// Underlying decoder error
        #[source]
        source: DecodeError,
    },

    /// No decoder bound to the content type or the file extension
    #[error("No decoder for content type '{content_type}' ({})", real_path.display())]
    NoDecoderForType {
        /// Content type of the resolved record
        content_type: String,
        /// Resolved real path
        real_path: PathBuf,
    },

    /// No registered format loader recognizes the path
    #[error("No loader recognizes '{0}'")]
    NoLoader(String),
}

impl LoadError {
    /// Failure class of this error
    pub fn kind(&self) -> LoadErrorKind {
        match self {
            Self::Unresolved(ResolveError::UnrecognizedPrefix(_)) => LoadErrorKind::UnrecognizedPrefix,
            Self::Unresolved(_) => LoadErrorKind::ResolutionFailure,
            Self::Host { .. } => LoadErrorKind::HostFailure,
            Self::Decode { .. } => LoadErrorKind::DecodeFailure,
            Self::NoDecoderForType { .. } => LoadErrorKind::NoDecoderForType,
            Self::NoLoader(_) => LoadErrorKind::NoLoader,
        }
    }
}

/// Result type for loads
pub type LoadResult<T> = Result<T, LoadError>;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("Failed to read config '{}': {source}", path.display())]
    Io {
        /// Config file path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Config text is not valid TOML for this schema
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Content types in the config are invalid
    #[error("Invalid content types: {0}")]
    Registry(#[from] RegistryError),
}
