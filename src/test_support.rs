//! Fixtures shared by the unit tests.

use std::collections::HashMap;

use serde_json::{json, Value};

use crate::api::error::Result;
use crate::api::{ApiError, Attachment, Comment, Issue, IssueSource};

/// Run blocking client code off the async test runtime that hosts the mock server.
pub(crate) async fn run_blocking<T>(f: impl FnOnce() -> T + Send + 'static) -> T
where
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.unwrap()
}

/// Minimal issue as the search endpoint returns it.
pub(crate) fn issue_json(key: &str) -> Value {
    json!({
        "id": key.trim_start_matches(|c: char| !c.is_ascii_digit()),
        "key": key,
        "fields": {"summary": format!("Summary of {}", key)}
    })
}

/// One page of `/rest/api/3/search` results.
pub(crate) fn search_page(start_at: u32, total: u32, issues: Vec<Value>) -> Value {
    json!({
        "startAt": start_at,
        "maxResults": issues.len(),
        "total": total,
        "issues": issues
    })
}

/// Attachment reference pointing at a fake content URL.
pub(crate) fn attachment_json(id: &str, filename: &str) -> Value {
    json!({
        "id": id,
        "filename": filename,
        "content": attachment_url(id),
        "size": 0,
        "mimeType": "application/octet-stream"
    })
}

pub(crate) fn attachment_url(id: &str) -> String {
    format!("https://fake.atlassian.net/rest/api/3/attachment/content/{}", id)
}

pub(crate) fn issue_from_json(value: Value) -> Issue {
    serde_json::from_value(value).unwrap()
}

/// A failure the fake source can be told to return.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Failure {
    Unauthorized,
    Forbidden,
    NotFound,
    Server,
}

impl Failure {
    fn to_error(self, what: &str) -> ApiError {
        match self {
            Failure::Unauthorized => ApiError::Unauthorized,
            Failure::Forbidden => ApiError::Forbidden,
            Failure::NotFound => ApiError::NotFound(what.to_string()),
            Failure::Server => ApiError::ServerError(format!("HTTP 503 Service Unavailable: {}", what)),
        }
    }
}

/// In-memory [`IssueSource`].
///
/// Attachments are served by content URL; an unknown URL is a 404.
#[derive(Debug, Default)]
pub(crate) struct FakeSource {
    connection: Option<Failure>,
    issues: Vec<Issue>,
    listing_failure: Option<(usize, Failure)>,
    comments: HashMap<String, std::result::Result<Vec<Value>, Failure>>,
    attachments: HashMap<String, std::result::Result<Vec<u8>, Failure>>,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_issue(mut self, issue: Value) -> Self {
        self.issues.push(issue_from_json(issue));
        self
    }

    pub fn rejecting_credentials(mut self) -> Self {
        self.connection = Some(Failure::Unauthorized);
        self
    }

    /// Fail the listing after `after` issues have been yielded.
    pub fn failing_listing_after(mut self, after: usize, failure: Failure) -> Self {
        self.listing_failure = Some((after, failure));
        self
    }

    pub fn with_comments(mut self, key: &str, comments: Vec<Value>) -> Self {
        self.comments.insert(key.to_string(), Ok(comments));
        self
    }

    pub fn failing_comments(mut self, key: &str, failure: Failure) -> Self {
        self.comments.insert(key.to_string(), Err(failure));
        self
    }

    pub fn with_attachment(mut self, id: &str, bytes: &[u8]) -> Self {
        self.attachments.insert(attachment_url(id), Ok(bytes.to_vec()));
        self
    }

    pub fn failing_attachment(mut self, id: &str, failure: Failure) -> Self {
        self.attachments.insert(attachment_url(id), Err(failure));
        self
    }
}

impl IssueSource for FakeSource {
    fn validate_connection(&self) -> Result<()> {
        match self.connection {
            Some(failure) => Err(failure.to_error("myself")),
            None => Ok(()),
        }
    }

    fn list_issues<'a>(&'a self, project_key: &str) -> Box<dyn Iterator<Item = Result<Issue>> + 'a> {
        let issues = self.issues.iter().cloned().map(Ok::<Issue, ApiError>);
        match self.listing_failure {
            Some((after, failure)) => {
                let what = format!("project {}", project_key);
                Box::new(issues.take(after).chain(std::iter::once(Err(failure.to_error(&what)))))
            }
            None => Box::new(issues),
        }
    }

    fn fetch_comments(&self, issue_key: &str) -> Result<Vec<Comment>> {
        match self.comments.get(issue_key) {
            Some(Ok(comments)) => Ok(comments
                .iter()
                .map(|c| serde_json::from_value(c.clone()).unwrap())
                .collect()),
            Some(Err(failure)) => Err(failure.to_error(issue_key)),
            None => Ok(Vec::new()),
        }
    }

    fn fetch_attachment(&self, attachment: &Attachment) -> Result<Vec<u8>> {
        match self.attachments.get(&attachment.content) {
            Some(Ok(bytes)) => Ok(bytes.clone()),
            Some(Err(failure)) => Err(failure.to_error(&attachment.filename)),
            None => Err(ApiError::NotFound(format!("attachment '{}'", attachment.filename))),
        }
    }
}
