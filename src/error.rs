//! Centralized error types for jira-export.
//!
//! Each layer has its own `thiserror` enum; [`AppError`] aggregates them for
//! the export run and maps each failure to a user-facing message, a
//! suggested action and a process exit code.

use thiserror::Error;

use crate::api::error::ApiError;
use crate::archive::ArchiveError;
use crate::config::ConfigError;

/// Exit code for configuration errors.
pub const EXIT_CONFIG: i32 = 2;
/// Exit code for rejected credentials.
pub const EXIT_AUTH: i32 = 3;
/// Exit code for every other fatal error.
pub const EXIT_FAILURE: i32 = 1;

/// The main application error type.
///
/// Only errors that end the run surface as an `AppError`; per-issue and
/// per-attachment failures are recorded in the export report instead.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration-related errors.
    #[error("{0}")]
    Config(#[from] ConfigError),

    /// API-related errors.
    #[error("{0}")]
    Api(#[from] ApiError),

    /// Archive errors.
    #[error("could not write archive: {0}")]
    Archive(#[from] ArchiveError),

    /// IO errors (file system, etc.).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The export folder could not be prepared.
    #[error("output folder unusable: {0}")]
    OutputDir(String),
}

impl AppError {
    /// Create an output folder error.
    pub fn output_dir(msg: impl Into<String>) -> Self {
        AppError::OutputDir(msg.into())
    }

    /// Get a user-friendly message for display.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Config(e) => match e {
                ConfigError::Missing(var) => format!(
                    "{} is not set. Provide it as a flag, an environment variable or in the config file.",
                    var
                ),
                ConfigError::ValidationError(msg) => format!("Configuration error: {}", msg),
                ConfigError::ReadError(_) => {
                    "Could not read configuration file. Please check the file exists and is readable.".to_string()
                }
                ConfigError::ParseError(msg) => format!("Configuration file is invalid: {}", msg),
            },
            AppError::Api(e) => match e {
                ApiError::Unauthorized => {
                    "Authentication failed. Please check your username and API token.".to_string()
                }
                ApiError::Forbidden => {
                    "Access denied. Your account cannot browse this project.".to_string()
                }
                ApiError::NotFound(resource) => format!("'{}' was not found.", resource),
                ApiError::BadRequest(msg) => format!("Jira rejected the request: {}", msg),
                ApiError::RateLimited => {
                    "Too many requests. Please wait a moment and try again.".to_string()
                }
                ApiError::ServerError(_) => {
                    "Jira server error. Please try again later.".to_string()
                }
                ApiError::Network(_) => {
                    "Connection failed. Please check your internet connection.".to_string()
                }
                ApiError::InvalidResponse(_) => {
                    "Unexpected response from Jira. Please try again.".to_string()
                }
                ApiError::ConnectionFailed(_) => {
                    "Could not connect to Jira. Please check your URL and network.".to_string()
                }
            },
            AppError::Archive(e) => format!("Could not write the zip archive: {}", e),
            AppError::Io(_) => "A file operation failed. Please check file permissions.".to_string(),
            AppError::OutputDir(msg) => format!("Output folder unusable: {}", msg),
        }
    }

    /// Whether Jira rejected the credentials or refused access.
    pub fn is_auth(&self) -> bool {
        matches!(self, AppError::Api(e) if e.is_auth())
    }

    /// Get a suggested action for the user.
    pub fn suggested_action(&self) -> Option<&'static str> {
        match self {
            AppError::Config(ConfigError::Missing(_)) => {
                Some("Run 'jira-export --help' to see every setting and its environment variable.")
            }
            AppError::Config(ConfigError::ParseError(_)) => {
                Some("Fix or remove the config file; keys are jira_url, project_key, username, api_token.")
            }
            AppError::Api(ApiError::Unauthorized) => {
                Some("Check your API token at https://id.atlassian.com/manage-profile/security/api-tokens")
            }
            AppError::Api(ApiError::Forbidden) => {
                Some("Ask a Jira administrator for the Browse Projects permission.")
            }
            AppError::Api(ApiError::RateLimited) => {
                Some("Wait a few minutes, or set REQUEST_DELAY_MS to slow the export down.")
            }
            AppError::Api(ApiError::Network(_)) | AppError::Api(ApiError::ConnectionFailed(_)) => {
                Some("Check your internet connection and JIRA_URL.")
            }
            AppError::OutputDir(_) => {
                Some("Use a new or empty output folder, or one written by an earlier export, and check it is writable.")
            }
            AppError::Archive(_) => Some("Check that the output folder and its parent are writable."),
            _ => None,
        }
    }

    /// The process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::Config(_) => EXIT_CONFIG,
            e if e.is_auth() => EXIT_AUTH,
            _ => EXIT_FAILURE,
        }
    }
}

/// Result type for application operations.
pub type Result<T> = std::result::Result<T, AppError>;
