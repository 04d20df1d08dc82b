//! The parameters of one export run.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use super::{ConfigError, Result, Settings};
use crate::api::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

/// Export folder used when none is configured.
pub const DEFAULT_OUTPUT_DIR: &str = "jira_export";

/// A validated export job.
///
/// Built once per invocation from the merged [`Settings`] and passed
/// explicitly to the client and the exporter.
#[derive(Clone, PartialEq, Eq)]
pub struct ExportJob {
    /// The Jira instance URL (e.g., "https://company.atlassian.net").
    pub jira_url: String,
    /// The project to export (e.g., "ABC").
    pub project_key: String,
    /// Login used for Basic auth.
    pub username: String,
    /// API token used for Basic auth.
    pub api_token: String,
    /// Export folder; the archive is written next to it.
    pub output_dir: PathBuf,
    /// Issues requested per search page.
    pub page_size: u32,
    /// Pause before every request.
    pub request_delay: Duration,
}

impl ExportJob {
    /// Build a job from merged settings.
    ///
    /// # Errors
    ///
    /// `ConfigError::Missing` names the environment variable of the first
    /// required setting that no source provided; `ConfigError::ValidationError`
    /// is returned when a value is present but unusable.
    pub fn from_settings(settings: Settings) -> Result<Self> {
        let job = Self {
            jira_url: required(settings.jira_url, "JIRA_URL")?,
            project_key: required(settings.project_key, "PROJECT_KEY")?,
            username: required(settings.username, "JIRA_USERNAME")?,
            api_token: required(settings.api_token, "API_TOKEN")?,
            output_dir: settings
                .output_dir
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
            page_size: settings.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
            request_delay: Duration::from_millis(settings.request_delay_ms.unwrap_or(0)),
        };

        job.validate()?;
        Ok(job)
    }

    /// Validate this job.
    ///
    /// Checks that:
    /// - The URL is non-empty and uses http:// or https://
    /// - The project key is non-empty and can be embedded in a JQL string
    /// - The username and token are non-empty
    /// - The page size is within what Jira serves
    /// - The output folder names an actual directory entry
    pub fn validate(&self) -> Result<()> {
        if self.jira_url.is_empty() {
            return Err(ConfigError::ValidationError("JIRA_URL cannot be empty".to_string()));
        }

        if !self.jira_url.starts_with("https://") && !self.jira_url.starts_with("http://") {
            return Err(ConfigError::ValidationError(format!(
                "JIRA_URL '{}' must start with http:// or https://",
                self.jira_url
            )));
        }

        if self.project_key.is_empty() {
            return Err(ConfigError::ValidationError(
                "PROJECT_KEY cannot be empty".to_string(),
            ));
        }

        if self
            .project_key
            .chars()
            .any(|c| c.is_whitespace() || c == '"' || c == '\\')
        {
            return Err(ConfigError::ValidationError(format!(
                "PROJECT_KEY '{}' cannot contain whitespace, quotes or backslashes",
                self.project_key
            )));
        }

        if self.username.is_empty() {
            return Err(ConfigError::ValidationError("JIRA_USERNAME cannot be empty".to_string()));
        }

        if self.api_token.is_empty() {
            return Err(ConfigError::ValidationError("API_TOKEN cannot be empty".to_string()));
        }

        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            return Err(ConfigError::ValidationError(format!(
                "page size must be between 1 and {}, got {}",
                MAX_PAGE_SIZE, self.page_size
            )));
        }

        if self.output_dir.file_name().is_none() {
            return Err(ConfigError::ValidationError(format!(
                "output folder '{}' must name a directory, not a root or relative marker",
                self.output_dir.display()
            )));
        }

        Ok(())
    }

    /// Where the archive of this job's export folder is written.
    pub fn archive_path(&self) -> PathBuf {
        crate::archive::archive_path_for(&self.output_dir)
    }
}

impl fmt::Debug for ExportJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExportJob")
            .field("jira_url", &self.jira_url)
            .field("project_key", &self.project_key)
            .field("username", &self.username)
            .field("api_token", &"<redacted>")
            .field("output_dir", &self.output_dir)
            .field("page_size", &self.page_size)
            .field("request_delay", &self.request_delay)
            .finish()
    }
}

/// Take a required value, treating blank strings as missing.
fn required(value: Option<String>, name: &'static str) -> Result<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::Missing(name))
}
