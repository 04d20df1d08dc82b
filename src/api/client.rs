//! Jira API client implementation.
//!
//! This module provides the client for the parts of the Jira REST API v3 the
//! exporter needs: connection validation, paginated JQL search, comment
//! threads and attachment downloads. Requests are blocking and issued one at
//! a time; failures are reported to the caller without retrying.

use std::collections::VecDeque;
use std::thread;
use std::time::Duration;

use reqwest::blocking::{Client, Response};
use reqwest::{header, StatusCode};
use tracing::{debug, error, info, instrument, warn};

use super::auth::Auth;
use super::error::{ApiError, Result};
use super::source::IssueSource;
use super::types::{Attachment, Comment, CommentsResponse, CurrentUser, Issue, SearchResult};
use crate::config::ExportJob;

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default number of issues requested per search page.
pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// Largest page Jira will serve.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Issue fields requested from the search endpoint.
const SEARCH_FIELDS: &str =
    "summary,description,status,issuetype,priority,assignee,reporter,project,created,updated,comment,attachment";

/// The Jira API client.
#[derive(Debug)]
pub struct JiraClient {
    /// The HTTP client.
    client: Client,
    /// The base URL for the Jira instance.
    base_url: String,
    /// Authentication credentials.
    auth: Auth,
    /// Issues and comments requested per page.
    page_size: u32,
    /// Pause before each request.
    request_delay: Duration,
}

impl JiraClient {
    /// Create a client for an export job.
    ///
    /// Does NOT validate the connection; see [`JiraClient::validate_connection`].
    pub fn from_job(job: &ExportJob) -> Result<Self> {
        Ok(
            Self::with_credentials(&job.jira_url, &job.username, &job.api_token)?
                .with_page_size(job.page_size)
                .with_request_delay(job.request_delay),
        )
    }

    /// Create a new Jira client with explicit credentials.
    ///
    /// # Arguments
    ///
    /// * `base_url` - The Jira instance URL
    /// * `username` - The account login, usually an email address
    /// * `token` - The API token
    pub fn with_credentials(base_url: &str, username: &str, token: &str) -> Result<Self> {
        let auth = Auth::new(username, token);
        let client = Self::build_http_client()?;
        let base_url = normalize_base_url(base_url);

        Ok(Self {
            client,
            base_url,
            auth,
            page_size: DEFAULT_PAGE_SIZE,
            request_delay: Duration::ZERO,
        })
    }

    /// Set the page size used for search and comment requests (1..=100).
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.clamp(1, MAX_PAGE_SIZE);
        self
    }

    /// Sleep this long before every request.
    pub fn with_request_delay(mut self, delay: Duration) -> Self {
        self.request_delay = delay;
        self
    }

    /// Build the HTTP client with appropriate settings.
    fn build_http_client() -> Result<Client> {
        Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .user_agent(concat!("jira-export/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ApiError::Network)
    }

    /// Validate the connection by calling the /myself endpoint.
    ///
    /// Authentication failures are passed through unchanged so callers can
    /// treat them as fatal; anything else becomes `ConnectionFailed`.
    #[instrument(skip(self))]
    pub fn validate_connection(&self) -> Result<CurrentUser> {
        debug!(username = %self.auth.username(), "Validating Jira connection");

        let user = self.get_current_user().map_err(|e| {
            error!("Connection validation failed: {}", e);
            match e {
                ApiError::Unauthorized | ApiError::Forbidden => e,
                ApiError::Network(ref _err) => {
                    ApiError::ConnectionFailed(format!("Cannot connect to {}: {}", self.base_url, e))
                }
                _ => ApiError::ConnectionFailed(e.to_string()),
            }
        })?;

        info!(account_id = %user.account_id, "Connected as user: {}", user.display_name);
        Ok(user)
    }

    /// Get the current authenticated user.
    ///
    /// Calls `GET /rest/api/3/myself`.
    pub fn get_current_user(&self) -> Result<CurrentUser> {
        let url = format!("{}/rest/api/3/myself", self.base_url);
        self.get(&url)
    }

    /// Fetch one page of a JQL search.
    ///
    /// # Arguments
    ///
    /// * `jql` - The JQL query string
    /// * `start_at` - The index of the first issue to return (0-based)
    /// * `max_results` - Maximum number of issues to return (max 100)
    #[instrument(skip(self), fields(jql = %jql))]
    pub fn search_issues(&self, jql: &str, start_at: u32, max_results: u32) -> Result<SearchResult> {
        debug!("Searching issues: startAt={}, maxResults={}", start_at, max_results);

        let url = format!(
            "{}/rest/api/3/search?jql={}&startAt={}&maxResults={}&fields={}",
            self.base_url,
            urlencoding::encode(jql),
            start_at,
            max_results.min(MAX_PAGE_SIZE),
            SEARCH_FIELDS
        );

        let result: SearchResult = self.get(&url)?;
        info!(
            "Fetched {} issues at offset {} (total: {})",
            result.issues.len(),
            result.start_at,
            result.total
        );
        Ok(result)
    }

    /// Lazily iterate over every issue of a project.
    ///
    /// Pages are requested as the iterator is consumed. The first failed
    /// request is yielded as an error and ends the iteration. Each call
    /// starts over from the first page.
    pub fn issues(&self, project_key: &str) -> IssuePages<'_> {
        IssuePages::new(self, project_jql(project_key))
    }

    /// Fetch one page of comments for an issue, oldest first.
    #[instrument(skip(self), fields(issue_key = %key))]
    pub fn get_comments(&self, key: &str, start_at: u32, max_results: u32) -> Result<CommentsResponse> {
        let url = format!(
            "{}/rest/api/3/issue/{}/comment?startAt={}&maxResults={}&orderBy=created",
            self.base_url,
            urlencoding::encode(key),
            start_at,
            max_results.min(MAX_PAGE_SIZE)
        );

        self.get(&url).map_err(|e| match e {
            ApiError::NotFound(_) => ApiError::NotFound(format!("Issue '{}' not found", key)),
            e => e,
        })
    }

    /// Fetch the complete comment thread of an issue.
    pub fn all_comments(&self, key: &str) -> Result<Vec<Comment>> {
        let mut comments = Vec::new();
        let mut start_at = 0;

        loop {
            let page = self.get_comments(key, start_at, self.page_size)?;
            let has_more = page.has_more();
            start_at = page.next_start();
            comments.extend(page.comments);
            if !has_more {
                break;
            }
        }

        debug!("Fetched {} comments for {}", comments.len(), key);
        Ok(comments)
    }

    /// Download the content of an attachment.
    #[instrument(skip(self, attachment), fields(filename = %attachment.filename))]
    pub fn download_attachment(&self, attachment: &Attachment) -> Result<Vec<u8>> {
        let response = self.send(&attachment.content, "*/*")?;
        let status = response.status();

        if !status.is_success() {
            let url = response.url().to_string();
            let body = response.text().unwrap_or_default();
            return Err(match Self::error_from_response(status, &url, &body) {
                ApiError::NotFound(_) => {
                    ApiError::NotFound(format!("attachment '{}'", attachment.filename))
                }
                e => e,
            });
        }

        let bytes = response.bytes()?.to_vec();
        if attachment.size != 0 && bytes.len() as u64 != attachment.size {
            warn!(
                "Attachment size mismatch: expected {} bytes, got {}",
                attachment.size,
                bytes.len()
            );
        }
        debug!("Downloaded {} bytes", bytes.len());
        Ok(bytes)
    }

    /// Perform a GET request and parse the JSON response.
    fn get<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self.send(url, "application/json")?;
        self.handle_response(response)
    }

    /// Send an authenticated GET request.
    fn send(&self, url: &str, accept: &str) -> Result<Response> {
        if !self.request_delay.is_zero() {
            thread::sleep(self.request_delay);
        }

        debug!(url = %url, "GET");
        let response = self
            .client
            .get(url)
            .header(header::AUTHORIZATION, self.auth.header_value())
            .header(header::ACCEPT, accept)
            .send()?;

        Ok(response)
    }

    /// Handle the HTTP response, checking for errors and parsing JSON.
    fn handle_response<T: serde::de::DeserializeOwned>(&self, response: Response) -> Result<T> {
        let status = response.status();
        let url = response.url().to_string();

        if status.is_success() {
            response
                .json::<T>()
                .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse response: {}", e)))
        } else {
            let error_body = response.text().unwrap_or_default();
            debug!("Error response body: {}", error_body);

            Err(Self::error_from_response(status, &url, &error_body))
        }
    }

    /// Create an appropriate error from an HTTP response.
    ///
    /// Jira reports problems as `{"errorMessages": [...], "errors": {...}}`;
    /// whatever it says is preferred over the bare URL as error context.
    fn error_from_response(status: StatusCode, url: &str, body: &str) -> ApiError {
        let context = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|json| jira_error_message(&json))
            .unwrap_or_else(|| url.to_string());

        ApiError::from_status(status, &context)
    }
}

impl IssueSource for JiraClient {
    fn validate_connection(&self) -> Result<()> {
        JiraClient::validate_connection(self).map(|_| ())
    }

    fn list_issues<'a>(&'a self, project_key: &str) -> Box<dyn Iterator<Item = Result<Issue>> + 'a> {
        Box::new(self.issues(project_key))
    }

    fn fetch_comments(&self, issue_key: &str) -> Result<Vec<Comment>> {
        self.all_comments(issue_key)
    }

    fn fetch_attachment(&self, attachment: &Attachment) -> Result<Vec<u8>> {
        self.download_attachment(attachment)
    }
}

/// Lazy, page-by-page sequence of the issues matching a JQL query.
#[derive(Debug)]
pub struct IssuePages<'a> {
    client: &'a JiraClient,
    jql: String,
    next_start: u32,
    buffer: VecDeque<Issue>,
    finished: bool,
}

impl<'a> IssuePages<'a> {
    fn new(client: &'a JiraClient, jql: String) -> Self {
        Self {
            client,
            jql,
            next_start: 0,
            buffer: VecDeque::new(),
            finished: false,
        }
    }
}

impl Iterator for IssuePages<'_> {
    type Item = Result<Issue>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(issue) = self.buffer.pop_front() {
                return Some(Ok(issue));
            }
            if self.finished {
                return None;
            }

            match self
                .client
                .search_issues(&self.jql, self.next_start, self.client.page_size)
            {
                Ok(page) => {
                    self.finished = !page.has_more();
                    self.next_start = page.next_start();
                    self.buffer.extend(page.issues);
                }
                Err(e) => {
                    self.finished = true;
                    return Some(Err(e));
                }
            }
        }
    }
}

/// JQL selecting every issue of a project in a stable order.
fn project_jql(project_key: &str) -> String {
    format!("project = \"{}\" ORDER BY key ASC", project_key)
}

/// Pull a readable message out of a Jira error body.
fn jira_error_message(json: &serde_json::Value) -> Option<String> {
    let messages: Vec<&str> = json
        .get("errorMessages")
        .and_then(|m| m.as_array())
        .map(|arr| arr.iter().filter_map(|v| v.as_str()).collect())
        .unwrap_or_default();
    if !messages.is_empty() {
        return Some(messages.join(", "));
    }

    let errors: Vec<String> = json
        .get("errors")
        .and_then(|e| e.as_object())
        .map(|obj| obj.iter().map(|(k, v)| format!("{}: {}", k, v)).collect())
        .unwrap_or_default();
    if !errors.is_empty() {
        return Some(errors.join(", "));
    }

    None
}

/// Normalize the base URL by removing trailing slashes.
fn normalize_base_url(url: &str) -> String {
    let url = url.trim_end_matches('/');

    // Warn if not HTTPS (but don't enforce for localhost/testing)
    if !url.starts_with("https://") && !url.contains("localhost") && !url.contains("127.0.0.1") {
        warn!("URL does not use HTTPS: {}. This is insecure for production use.", url);
    }

    url.to_string()
}
