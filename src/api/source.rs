//! The issue source the exporter pulls from.

use super::error::Result;
use super::types::{Attachment, Comment, Issue};

/// Everything the exporter needs from Jira.
///
/// [`JiraClient`](super::JiraClient) is the real implementation; tests drive
/// the exporter with in-memory sources.
pub trait IssueSource {
    /// Check that the instance is reachable and the credentials are accepted.
    fn validate_connection(&self) -> Result<()>;

    /// Lazily list every issue of a project.
    ///
    /// A failed page is yielded as an `Err`, after which the sequence ends.
    fn list_issues<'a>(&'a self, project_key: &str) -> Box<dyn Iterator<Item = Result<Issue>> + 'a>;

    /// Fetch the complete comment thread of an issue, oldest first.
    fn fetch_comments(&self, issue_key: &str) -> Result<Vec<Comment>>;

    /// Download the raw content of an attachment.
    fn fetch_attachment(&self, attachment: &Attachment) -> Result<Vec<u8>>;
}
