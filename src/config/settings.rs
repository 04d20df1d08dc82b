//! Raw settings as read from the config file or the command line.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{ConfigError, Result};

/// Unvalidated export settings.
///
/// Every field is optional so that partial sources can be layered with
/// [`Settings::merge`]. The TOML file uses the same snake_case keys:
///
/// ```toml
/// jira_url = "https://example.atlassian.net"
/// project_key = "ABC"
/// username = "me@example.com"
/// api_token = "..."
/// output_dir = "jira_export"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Base URL of the Jira Cloud site.
    pub jira_url: Option<String>,
    /// Key of the project to export.
    pub project_key: Option<String>,
    /// Account login used for Basic auth.
    pub username: Option<String>,
    /// API token used for Basic auth.
    pub api_token: Option<String>,
    /// Export folder; the zip is written next to it.
    pub output_dir: Option<PathBuf>,
    /// Issues requested per search page.
    pub page_size: Option<u32>,
    /// Pause before every request, in milliseconds.
    pub request_delay_ms: Option<u64>,
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(format!("{}: {}", path.display(), e)))?;
        let settings: Settings = toml::from_str(&contents)
            .map_err(|e| ConfigError::ParseError(format!("{}: {}", path.display(), e)))?;

        debug!(path = %path.display(), "Loaded config file");
        Ok(settings)
    }

    /// Load the per-user config file if it exists.
    ///
    /// A missing file is not an error; a broken one is.
    pub fn load_default() -> Result<Self> {
        match Self::default_path() {
            Some(path) if path.is_file() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    /// The per-user config file location, e.g. `~/.config/jira-export/config.toml`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("jira-export").join("config.toml"))
    }

    /// Layer `overrides` on top of `self`; values set in `overrides` win.
    pub fn merge(self, overrides: Settings) -> Settings {
        Settings {
            jira_url: overrides.jira_url.or(self.jira_url),
            project_key: overrides.project_key.or(self.project_key),
            username: overrides.username.or(self.username),
            api_token: overrides.api_token.or(self.api_token),
            output_dir: overrides.output_dir.or(self.output_dir),
            page_size: overrides.page_size.or(self.page_size),
            request_delay_ms: overrides.request_delay_ms.or(self.request_delay_ms),
        }
    }
}
