//! Error types for storehours-core.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading or querying the job configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file did not exist at the expected path.
    #[error("config file not found at {path}")]
    NotFound { path: PathBuf },

    /// Underlying I/O failure while reading the file.
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed INI content, with 1-based line number.
    #[error("failed to parse config at line {line}: {message}")]
    Parse { line: usize, message: String },

    /// A requested section is absent.
    #[error("section [{section}] not found in config")]
    MissingSection { section: String },

    /// A requested key is absent from an existing section.
    #[error("key \"{key}\" not found in section [{section}]")]
    MissingKey { section: String, key: String },

    /// A value exists but cannot be interpreted as the requested type.
    #[error("invalid value for \"{key}\" in section [{section}]: {value:?} is not a valid {expected}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        expected: &'static str,
    },
}

/// Errors raised by the stream cipher and hex decoding.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Ciphertext stored in config is not valid hex.
    #[error("malformed hex ciphertext in [{section}].{key}: {source}")]
    Hex {
        section: String,
        key: String,
        #[source]
        source: hex::FromHexError,
    },

    /// RC4 requires at least one key byte.
    #[error("cipher key for [{section}].{key} is empty")]
    EmptyKey { section: String, key: String },
}

/// Reasons [`crate::vault::seal`] can refuse its input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SealError {
    #[error("{0} must not be empty")]
    EmptyKey(&'static str),

    #[error("{0} contains characters outside Latin-1")]
    NotLatin1(&'static str),
}

/// Any failure that can abort credential unwrapping.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),
}
