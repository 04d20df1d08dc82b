//! Configuration management for jira-export.
//!
//! Settings are layered: command-line flags and environment variables take
//! precedence over a TOML config file. The merged [`Settings`] are turned into
//! a validated [`ExportJob`] before any network call is made.

mod job;
mod settings;

use thiserror::Error;

pub use job::ExportJob;
pub use settings::Settings;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required setting was not provided by any source.
    #[error("missing required setting {0}")]
    Missing(&'static str),

    /// A setting was provided but is invalid.
    #[error("invalid configuration: {0}")]
    ValidationError(String),

    /// The config file could not be read.
    #[error("could not read config file: {0}")]
    ReadError(String),

    /// The config file is not valid TOML or has unexpected keys.
    #[error("could not parse config file: {0}")]
    ParseError(String),
}

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;
