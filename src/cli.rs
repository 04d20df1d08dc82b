//! Command-line interface.
//!
//! Every setting can be passed as a flag or through its environment variable;
//! a `.env` file in the working directory is loaded before parsing, so its
//! values behave like environment variables.
//!
//! The account name is read from `JIRA_USERNAME`. A bare `USERNAME` is also
//! accepted, but ranks below the config file: operating systems set it to the
//! local login, which must not shadow a configured Atlassian account.

use std::path::PathBuf;

use clap::{ArgAction, Parser};

use crate::config::{ConfigError, ExportJob, Settings};

/// Lowest-ranked source for the account name.
const FALLBACK_USERNAME_VAR: &str = "USERNAME";

/// Export every issue of a Jira Cloud project to PDF, with its attachments,
/// and bundle the result into a zip archive.
#[derive(Debug, Parser)]
#[command(name = "jira-export", version, about)]
pub struct Cli {
    /// Jira Cloud site, e.g. https://company.atlassian.net
    #[arg(long, env = "JIRA_URL", value_name = "URL")]
    pub jira_url: Option<String>,

    /// Key of the project to export, e.g. ABC
    #[arg(long, env = "PROJECT_KEY", value_name = "KEY")]
    pub project_key: Option<String>,

    /// Atlassian account email [fallback: USERNAME, below the config file]
    #[arg(long, env = "JIRA_USERNAME", value_name = "EMAIL")]
    pub username: Option<String>,

    /// Atlassian API token
    #[arg(long, env = "API_TOKEN", hide_env_values = true, value_name = "TOKEN")]
    pub api_token: Option<String>,

    /// Export folder [default: jira_export]
    #[arg(short, long, env = "OUTPUT_DIR", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Issues requested per page (1-100) [default: 50]
    #[arg(long, env = "PAGE_SIZE", value_name = "N")]
    pub page_size: Option<u32>,

    /// Pause before every request, in milliseconds [default: 0]
    #[arg(long, env = "REQUEST_DELAY_MS", value_name = "MS")]
    pub request_delay_ms: Option<u64>,

    /// TOML config file [default: <config dir>/jira-export/config.toml]
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase log output (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Do not write a log file
    #[arg(long)]
    pub no_log_file: bool,
}

impl Cli {
    /// Settings given on the command line or in the environment.
    pub fn overrides(&self) -> Settings {
        Settings {
            jira_url: self.jira_url.clone(),
            project_key: self.project_key.clone(),
            username: self.username.clone(),
            api_token: self.api_token.clone(),
            output_dir: self.output_dir.clone(),
            page_size: self.page_size,
            request_delay_ms: self.request_delay_ms,
        }
    }

    /// Merge the config file with the command line and validate the result.
    ///
    /// An explicit `--config` file must exist; the default one is optional.
    pub fn resolve_job(&self) -> Result<ExportJob, ConfigError> {
        let file = match &self.config {
            Some(path) => Settings::load(path)?,
            None => Settings::load_default()?,
        };

        ExportJob::from_settings(fallbacks().merge(file).merge(self.overrides()))
    }
}

/// Settings that only apply when neither the config file nor the command
/// line provide a value.
fn fallbacks() -> Settings {
    Settings {
        username: std::env::var(FALLBACK_USERNAME_VAR)
            .ok()
            .filter(|v| !v.trim().is_empty()),
        ..Settings::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;
    use std::time::Duration;
    use tempfile::NamedTempFile;

    const VARS: [&str; 8] = [
        "JIRA_URL",
        "PROJECT_KEY",
        "JIRA_USERNAME",
        "USERNAME",
        "API_TOKEN",
        "OUTPUT_DIR",
        "PAGE_SIZE",
        "REQUEST_DELAY_MS",
    ];

    fn clear_env() {
        for var in VARS {
            std::env::remove_var(var);
        }
    }

    fn config_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", contents).unwrap();
        file
    }

    #[test]
    #[serial]
    fn test_flags_are_parsed() {
        clear_env();
        let cli = Cli::try_parse_from([
            "jira-export",
            "--jira-url",
            "https://company.atlassian.net",
            "--project-key",
            "ABC",
            "-o",
            "out",
            "--page-size",
            "25",
            "-vv",
        ])
        .unwrap();

        let overrides = cli.overrides();
        assert_eq!(overrides.jira_url.as_deref(), Some("https://company.atlassian.net"));
        assert_eq!(overrides.project_key.as_deref(), Some("ABC"));
        assert_eq!(overrides.output_dir, Some(PathBuf::from("out")));
        assert_eq!(overrides.page_size, Some(25));
        assert_eq!(overrides.username, None);
        assert_eq!(cli.verbose, 2);
        assert!(!cli.no_log_file);
    }

    #[test]
    #[serial]
    fn test_environment_variables_are_read() {
        clear_env();
        std::env::set_var("JIRA_URL", "https://env.atlassian.net");
        std::env::set_var("API_TOKEN", "env-token");
        std::env::set_var("REQUEST_DELAY_MS", "250");

        let cli = Cli::try_parse_from(["jira-export"]).unwrap();
        clear_env();

        assert_eq!(cli.jira_url.as_deref(), Some("https://env.atlassian.net"));
        assert_eq!(cli.api_token.as_deref(), Some("env-token"));
        assert_eq!(cli.request_delay_ms, Some(250));
    }

    #[test]
    #[serial]
    fn test_flag_wins_over_environment() {
        clear_env();
        std::env::set_var("PROJECT_KEY", "ENV");

        let cli = Cli::try_parse_from(["jira-export", "--project-key", "FLAG"]).unwrap();
        clear_env();

        assert_eq!(cli.project_key.as_deref(), Some("FLAG"));
    }

    #[test]
    #[serial]
    fn test_invalid_number_is_rejected() {
        clear_env();
        let result = Cli::try_parse_from(["jira-export", "--page-size", "many"]);
        assert!(result.is_err());
    }

    #[test]
    #[serial]
    fn test_resolve_job_layers_file_under_flags() {
        clear_env();
        let file = config_file(
            r#"
jira_url = "https://file.atlassian.net"
project_key = "FILE"
username = "file@example.com"
api_token = "file-token"
request_delay_ms = 100
"#,
        );
        let path = file.path().to_str().unwrap().to_string();

        let cli = Cli::try_parse_from(["jira-export", "--config", &path, "--project-key", "ABC"]).unwrap();
        let job = cli.resolve_job().unwrap();

        assert_eq!(job.jira_url, "https://file.atlassian.net");
        assert_eq!(job.project_key, "ABC");
        assert_eq!(job.api_token, "file-token");
        assert_eq!(job.request_delay, Duration::from_millis(100));
        assert_eq!(job.output_dir, PathBuf::from("jira_export"));
    }

    #[test]
    #[serial]
    fn test_os_username_does_not_shadow_config_file() {
        clear_env();
        std::env::set_var("USERNAME", "os-login");
        let file = config_file(
            r#"
jira_url = "https://file.atlassian.net"
project_key = "ABC"
username = "me@example.com"
api_token = "file-token"
"#,
        );
        let path = file.path().to_str().unwrap().to_string();

        let cli = Cli::try_parse_from(["jira-export", "--config", &path]).unwrap();
        let job = cli.resolve_job();
        clear_env();

        assert_eq!(job.unwrap().username, "me@example.com");
    }

    #[test]
    #[serial]
    fn test_username_sources_rank_in_order() {
        clear_env();
        let file = config_file(
            r#"
jira_url = "https://file.atlassian.net"
project_key = "ABC"
api_token = "file-token"
"#,
        );
        let path = file.path().to_str().unwrap().to_string();

        std::env::set_var("USERNAME", "fallback@example.com");
        let fallback = Cli::try_parse_from(["jira-export", "--config", &path])
            .unwrap()
            .resolve_job();

        std::env::set_var("JIRA_USERNAME", "env@example.com");
        let env = Cli::try_parse_from(["jira-export", "--config", &path])
            .unwrap()
            .resolve_job();
        let flag = Cli::try_parse_from(["jira-export", "--config", &path, "--username", "flag@example.com"])
            .unwrap()
            .resolve_job();
        clear_env();

        assert_eq!(fallback.unwrap().username, "fallback@example.com");
        assert_eq!(env.unwrap().username, "env@example.com");
        assert_eq!(flag.unwrap().username, "flag@example.com");
    }

    #[test]
    #[serial]
    fn test_resolve_job_reports_missing_setting() {
        clear_env();
        let file = config_file("jira_url = \"https://file.atlassian.net\"\n");
        let path = file.path().to_str().unwrap().to_string();

        let cli = Cli::try_parse_from(["jira-export", "--config", &path]).unwrap();
        let err = cli.resolve_job().unwrap_err();

        assert!(matches!(err, ConfigError::Missing("PROJECT_KEY")));
    }

    #[test]
    #[serial]
    fn test_resolve_job_missing_explicit_config_file() {
        clear_env();
        let cli = Cli::try_parse_from(["jira-export", "--config", "/nonexistent/jira-export.toml"]).unwrap();

        let err = cli.resolve_job().unwrap_err();
        assert!(matches!(err, ConfigError::ReadError(_)));
    }
}
