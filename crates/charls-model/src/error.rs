use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading or validating the run configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse TOML config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("variable '{name}' is listed as both {first} and {second}")]
    ConflictingCategories {
        name: String,
        first: &'static str,
        second: &'static str,
    },

    #[error("invalid MCMC setting {field}: {message}")]
    InvalidMcmc {
        field: &'static str,
        message: String,
    },
}

pub type Result<T> = std::result::Result<T, ConfigError>;
