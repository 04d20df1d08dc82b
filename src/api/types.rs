//! Jira API response types.
//!
//! These types model the Jira REST API v3 responses the exporter consumes:
//! search pages, issues with their inlined comments and attachments, and the
//! Atlassian Document Format used for rich text.
//!
//! Rich-text fields (`description`, comment `body`) are kept as raw JSON so a
//! strange payload on one issue cannot fail the deserialization of a whole
//! search page; they are interpreted when the issue is rendered.

use std::fmt;

use serde::Deserialize;
use serde_json::Value;

/// The current authenticated user.
///
/// Returned by `GET /rest/api/3/myself`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUser {
    /// The user's account ID.
    pub account_id: String,
    /// The user's display name.
    pub display_name: String,
}

/// Search result from a JQL query.
///
/// Returned by `GET /rest/api/3/search`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    /// The index of the first result.
    pub start_at: u32,
    /// Maximum results requested.
    #[serde(default)]
    pub max_results: u32,
    /// Total number of matching issues.
    pub total: u32,
    /// The list of issues.
    #[serde(default)]
    pub issues: Vec<Issue>,
}

impl SearchResult {
    /// Check if there are more pages of results.
    ///
    /// An empty page never has a successor, whatever `total` claims.
    pub fn has_more(&self) -> bool {
        !self.issues.is_empty() && self.next_start() < self.total
    }

    /// Get the starting index for the next page.
    pub fn next_start(&self) -> u32 {
        self.start_at + self.issues.len() as u32
    }
}

/// A Jira issue, as returned inside search results.
#[derive(Debug, Clone, Deserialize)]
pub struct Issue {
    /// The issue ID.
    #[serde(default)]
    pub id: String,
    /// The issue key (e.g., "ABC-123").
    pub key: String,
    /// The issue fields.
    pub fields: IssueFields,
}

impl Issue {
    /// Get the issue summary.
    pub fn summary(&self) -> &str {
        &self.fields.summary
    }

    /// Get the issue status name, if present.
    pub fn status(&self) -> Option<&str> {
        self.fields.status.as_ref().map(|s| s.name.as_str())
    }

    /// Get the issue type name, if present.
    pub fn issue_type(&self) -> Option<&str> {
        self.fields.issuetype.as_ref().map(|t| t.name.as_str())
    }

    /// Get the issue priority name, if set.
    pub fn priority(&self) -> Option<&str> {
        self.fields.priority.as_ref().map(|p| p.name.as_str())
    }

    /// Get the assignee display name, if assigned.
    pub fn assignee(&self) -> Option<&str> {
        self.fields.assignee.as_ref().map(|a| a.display_name.as_str())
    }

    /// Get the reporter display name, if set.
    pub fn reporter(&self) -> Option<&str> {
        self.fields.reporter.as_ref().map(|r| r.display_name.as_str())
    }

    /// Get the project name, if available.
    pub fn project_name(&self) -> Option<&str> {
        self.fields.project.as_ref().map(|p| p.name.as_str())
    }

    /// Comments inlined in the search response, in API order.
    pub fn comments(&self) -> &[Comment] {
        self.fields
            .comment
            .as_ref()
            .map(|page| page.comments.as_slice())
            .unwrap_or_default()
    }

    /// Whether the inlined comment page holds every comment of the issue.
    ///
    /// The search endpoint truncates long comment threads; when this returns
    /// `false` the full list has to be fetched separately.
    pub fn has_all_comments(&self) -> bool {
        self.fields
            .comment
            .as_ref()
            .map_or(true, CommentsResponse::is_complete)
    }

    /// Replace the inlined comments with a complete list.
    pub fn set_comments(&mut self, comments: Vec<Comment>) {
        let total = comments.len() as u32;
        self.fields.comment = Some(CommentsResponse {
            start_at: 0,
            max_results: total,
            total,
            comments,
        });
    }

    /// Attachment references, in API order.
    pub fn attachments(&self) -> &[Attachment] {
        self.fields.attachment.as_deref().unwrap_or_default()
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.key, self.fields.summary)
    }
}

/// Issue fields requested by the exporter.
///
/// Everything except the summary may legitimately be absent or `null`
/// (hidden fields, deleted users, unscheduled issues).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IssueFields {
    /// The issue summary/title.
    #[serde(default)]
    pub summary: String,
    /// The issue description: Atlassian Document Format, plain text or null.
    #[serde(default)]
    pub description: Option<Value>,
    /// The issue status.
    #[serde(default)]
    pub status: Option<Status>,
    /// The issue type (Bug, Story, Task, etc.).
    #[serde(default)]
    pub issuetype: Option<IssueType>,
    /// The issue priority.
    #[serde(default)]
    pub priority: Option<Priority>,
    /// The issue assignee.
    #[serde(default)]
    pub assignee: Option<User>,
    /// The issue reporter.
    #[serde(default)]
    pub reporter: Option<User>,
    /// The project this issue belongs to.
    #[serde(default)]
    pub project: Option<Project>,
    /// When the issue was created.
    #[serde(default)]
    pub created: Option<String>,
    /// When the issue was last updated.
    #[serde(default)]
    pub updated: Option<String>,
    /// The first page of comments.
    #[serde(default)]
    pub comment: Option<CommentsResponse>,
    /// Attachment metadata.
    #[serde(default)]
    pub attachment: Option<Vec<Attachment>>,
}

/// Issue status.
#[derive(Debug, Clone, Deserialize)]
pub struct Status {
    /// The status name (e.g., "To Do", "In Progress", "Done").
    pub name: String,
}

/// Issue type (Bug, Story, Task, Epic, etc.).
#[derive(Debug, Clone, Deserialize)]
pub struct IssueType {
    /// The issue type name.
    pub name: String,
}

/// Issue priority.
#[derive(Debug, Clone, Deserialize)]
pub struct Priority {
    /// The priority name (e.g., "High").
    pub name: String,
}

/// A Jira user.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// The user's account ID.
    #[serde(default)]
    pub account_id: String,
    /// The user's display name.
    #[serde(default)]
    pub display_name: String,
}

impl fmt::Display for User {
    /// Display name, or the account ID for users whose name is hidden.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.display_name.is_empty() {
            write!(f, "{}", self.account_id)
        } else {
            write!(f, "{}", self.display_name)
        }
    }
}

/// A Jira project.
#[derive(Debug, Clone, Deserialize)]
pub struct Project {
    /// The project key (e.g., "ABC").
    pub key: String,
    /// The project name.
    pub name: String,
}

/// A comment on a Jira issue.
#[derive(Debug, Clone, Deserialize)]
pub struct Comment {
    /// The comment ID.
    #[serde(default)]
    pub id: String,
    /// The user who authored the comment; absent for deleted accounts.
    #[serde(default)]
    pub author: Option<User>,
    /// The comment body, usually Atlassian Document Format.
    #[serde(default)]
    pub body: Option<Value>,
    /// When the comment was created.
    #[serde(default)]
    pub created: Option<String>,
}

/// A page of comments.
///
/// Returned by `GET /rest/api/3/issue/{issueKey}/comment`, and inlined as the
/// `comment` field of an issue.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentsResponse {
    /// The index of the first result.
    #[serde(default)]
    pub start_at: u32,
    /// Maximum results requested.
    #[serde(default)]
    pub max_results: u32,
    /// Total number of comments.
    #[serde(default)]
    pub total: u32,
    /// The list of comments.
    #[serde(default)]
    pub comments: Vec<Comment>,
}

impl CommentsResponse {
    /// Check if there are more pages of results.
    pub fn has_more(&self) -> bool {
        !self.comments.is_empty() && self.next_start() < self.total
    }

    /// Get the starting index for the next page.
    pub fn next_start(&self) -> u32 {
        self.start_at + self.comments.len() as u32
    }

    /// Whether this page is the whole comment thread.
    pub fn is_complete(&self) -> bool {
        self.start_at == 0 && self.comments.len() as u32 >= self.total
    }
}

/// Attachment metadata.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    /// The attachment ID.
    #[serde(default)]
    pub id: String,
    /// The original filename.
    pub filename: String,
    /// The download URL.
    pub content: String,
    /// The size in bytes.
    #[serde(default)]
    pub size: u64,
    /// The MIME type reported by Jira.
    #[serde(default)]
    pub mime_type: Option<String>,
}

/// Atlassian Document Format (ADF) content.
///
/// Jira uses ADF for rich text fields like descriptions and comments.
#[derive(Debug, Clone, Deserialize)]
pub struct AtlassianDoc {
    /// The document type ("doc" for root documents).
    #[serde(rename = "type")]
    pub doc_type: String,
    /// The document version (typically 1).
    #[serde(default)]
    pub version: Option<u32>,
    /// The content nodes within the document.
    #[serde(default)]
    pub content: Vec<Value>,
}

impl AtlassianDoc {
    /// Whether this is a root document node.
    pub fn is_document(&self) -> bool {
        self.doc_type == "doc"
    }

    /// Convert ADF content to plain text.
    ///
    /// Block nodes end with a newline, list items get a bullet, mentions keep
    /// their `@`, media nodes are dropped.
    pub fn to_plain_text(&self) -> String {
        let mut result = String::new();
        for node in &self.content {
            extract_text(node, &mut result);
        }
        result.trim().to_string()
    }
}

impl Default for AtlassianDoc {
    fn default() -> Self {
        Self {
            doc_type: "doc".to_string(),
            version: Some(1),
            content: vec![],
        }
    }
}

fn extract_children(node: &serde_json::Map<String, Value>, result: &mut String) {
    if let Some(Value::Array(items)) = node.get("content") {
        for item in items {
            extract_text(item, result);
        }
    }
}

fn end_line(result: &mut String) {
    if !result.is_empty() && !result.ends_with('\n') {
        result.push('\n');
    }
}

fn attr<'a>(node: &'a serde_json::Map<String, Value>, name: &str) -> Option<&'a str> {
    node.get("attrs")
        .and_then(|attrs| attrs.get(name))
        .and_then(Value::as_str)
}

fn extract_text(node: &Value, result: &mut String) {
    let obj = match node {
        Value::Object(obj) => obj,
        Value::Array(items) => {
            for item in items {
                extract_text(item, result);
            }
            return;
        }
        _ => return,
    };

    match obj.get("type").and_then(Value::as_str) {
        Some("text") => {
            if let Some(text) = obj.get("text").and_then(Value::as_str) {
                result.push_str(text);
            }
        }
        Some("hardBreak") => result.push('\n'),
        Some("paragraph") | Some("heading") | Some("codeBlock") => {
            extract_children(obj, result);
            end_line(result);
        }
        Some("listItem") => {
            end_line(result);
            result.push_str("• ");
            extract_children(obj, result);
            end_line(result);
        }
        Some("blockquote") => {
            end_line(result);
            result.push_str("> ");
            extract_children(obj, result);
            end_line(result);
        }
        Some("rule") => {
            end_line(result);
            result.push_str("----\n");
        }
        Some("mention") => {
            if let Some(text) = attr(obj, "text") {
                if !text.starts_with('@') {
                    result.push('@');
                }
                result.push_str(text);
            }
        }
        Some("emoji") => {
            if let Some(text) = attr(obj, "shortName").or_else(|| attr(obj, "text")) {
                result.push_str(text);
            }
        }
        Some("inlineCard") => {
            if let Some(url) = attr(obj, "url") {
                result.push_str(url);
            }
        }
        Some("mediaGroup") | Some("mediaSingle") | Some("media") => {}
        _ => extract_children(obj, result),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn create_test_issue() -> Issue {
        Issue {
            id: "1".to_string(),
            key: "TEST-1".to_string(),
            fields: IssueFields {
                summary: "Test".to_string(),
                ..IssueFields::default()
            },
        }
    }

    #[test]
    fn test_search_result_has_more() {
        let result = SearchResult {
            start_at: 0,
            max_results: 50,
            total: 100,
            issues: (0..50).map(|_| create_test_issue()).collect(),
        };
        assert!(result.has_more());
        assert_eq!(result.next_start(), 50);

        let result = SearchResult {
            start_at: 50,
            max_results: 50,
            total: 100,
            issues: (0..50).map(|_| create_test_issue()).collect(),
        };
        assert!(!result.has_more());

        let result = SearchResult {
            start_at: 90,
            max_results: 50,
            total: 100,
            issues: (0..10).map(|_| create_test_issue()).collect(),
        };
        assert!(!result.has_more());
    }

    #[test]
    fn test_search_result_empty_page_stops() {
        // total is stale (issues deleted mid-export): an empty page still ends it
        let result = SearchResult {
            start_at: 50,
            max_results: 50,
            total: 120,
            issues: vec![],
        };
        assert!(!result.has_more());
    }

    #[test]
    fn test_parse_minimal_issue() {
        let json = r#"{
            "id": "10001",
            "key": "ABC-123",
            "fields": {
                "summary": "Test issue"
            }
        }"#;

        let issue: Issue = serde_json::from_str(json).unwrap();
        assert_eq!(issue.key, "ABC-123");
        assert_eq!(issue.summary(), "Test issue");
        assert!(issue.status().is_none());
        assert!(issue.assignee().is_none());
        assert!(issue.comments().is_empty());
        assert!(issue.attachments().is_empty());
        assert!(issue.has_all_comments());
    }

    #[test]
    fn test_parse_full_issue() {
        let json = r#"{
            "id": "10001",
            "key": "ABC-2",
            "fields": {
                "summary": "Login page broken",
                "status": {"id": "3", "name": "In Progress"},
                "issuetype": {"id": "1", "name": "Bug"},
                "priority": {"id": "2", "name": "High"},
                "assignee": {"accountId": "abc", "displayName": "Jane Smith"},
                "reporter": {"accountId": "def", "displayName": "John Doe"},
                "project": {"id": "10000", "key": "ABC", "name": "Alphabet"},
                "created": "2024-01-15T10:00:00.000+0000",
                "updated": "2024-01-16T14:30:00.000+0000",
                "comment": {
                    "startAt": 0,
                    "maxResults": 50,
                    "total": 1,
                    "comments": [{
                        "id": "1",
                        "author": {"accountId": "abc", "displayName": "Jane Smith"},
                        "body": "Looking into it",
                        "created": "2024-01-15T11:00:00.000+0000"
                    }]
                },
                "attachment": [{
                    "id": "20000",
                    "filename": "spec.png",
                    "content": "https://example.atlassian.net/rest/api/3/attachment/content/20000",
                    "size": 1024,
                    "mimeType": "image/png"
                }]
            }
        }"#;

        let issue: Issue = serde_json::from_str(json).unwrap();
        assert_eq!(issue.status(), Some("In Progress"));
        assert_eq!(issue.issue_type(), Some("Bug"));
        assert_eq!(issue.priority(), Some("High"));
        assert_eq!(issue.assignee(), Some("Jane Smith"));
        assert_eq!(issue.reporter(), Some("John Doe"));
        assert_eq!(issue.project_name(), Some("Alphabet"));
        assert_eq!(issue.comments().len(), 1);
        assert!(issue.has_all_comments());
        assert_eq!(issue.attachments()[0].filename, "spec.png");
        assert_eq!(issue.attachments()[0].size, 1024);
        assert_eq!(issue.attachments()[0].mime_type.as_deref(), Some("image/png"));
    }

    #[test]
    fn test_parse_issue_with_null_fields() {
        let json = r#"{
            "key": "ABC-9",
            "fields": {
                "summary": "Nulls everywhere",
                "description": null,
                "status": null,
                "priority": null,
                "assignee": null,
                "reporter": null,
                "project": null,
                "comment": null,
                "attachment": null
            }
        }"#;

        let issue: Issue = serde_json::from_str(json).unwrap();
        assert!(issue.fields.description.is_none());
        assert!(issue.reporter().is_none());
        assert!(issue.comments().is_empty());
        assert!(issue.attachments().is_empty());
    }

    #[test]
    fn test_truncated_inline_comments() {
        let json = r#"{
            "key": "ABC-5",
            "fields": {
                "summary": "Chatty",
                "comment": {
                    "startAt": 0,
                    "maxResults": 1,
                    "total": 3,
                    "comments": [{"id": "1", "body": "first"}]
                }
            }
        }"#;

        let mut issue: Issue = serde_json::from_str(json).unwrap();
        assert!(!issue.has_all_comments());

        let all: Vec<Comment> = ["first", "second", "third"]
            .iter()
            .enumerate()
            .map(|(i, body)| Comment {
                id: i.to_string(),
                author: None,
                body: Some(Value::String(body.to_string())),
                created: None,
            })
            .collect();
        issue.set_comments(all);
        assert!(issue.has_all_comments());
        assert_eq!(issue.comments().len(), 3);
    }

    #[test]
    fn test_comments_response_paging() {
        let page = CommentsResponse {
            start_at: 0,
            max_results: 2,
            total: 3,
            comments: vec![
                Comment {
                    id: "1".to_string(),
                    author: None,
                    body: None,
                    created: None,
                },
                Comment {
                    id: "2".to_string(),
                    author: None,
                    body: None,
                    created: None,
                },
            ],
        };
        assert!(page.has_more());
        assert_eq!(page.next_start(), 2);
        assert!(!page.is_complete());
    }

    #[test]
    fn test_issue_display() {
        let issue = create_test_issue();
        assert_eq!(format!("{}", issue), "TEST-1: Test");
    }

    #[test]
    fn test_user_display_falls_back_to_account_id() {
        let named: User = serde_json::from_value(json!({"accountId": "a1", "displayName": "Jane"})).unwrap();
        let hidden: User = serde_json::from_value(json!({"accountId": "a2"})).unwrap();
        assert_eq!(named.to_string(), "Jane");
        assert_eq!(hidden.to_string(), "a2");
    }

    #[test]
    fn test_atlassian_doc_paragraphs() {
        let json = r#"{
            "type": "doc",
            "version": 1,
            "content": [
                {"type": "paragraph", "content": [{"type": "text", "text": "First paragraph."}]},
                {"type": "paragraph", "content": [{"type": "text", "text": "Second paragraph."}]}
            ]
        }"#;

        let doc: AtlassianDoc = serde_json::from_str(json).unwrap();
        assert!(doc.is_document());
        assert_eq!(doc.to_plain_text(), "First paragraph.\nSecond paragraph.");
    }

    #[test]
    fn test_atlassian_doc_bullet_list() {
        let json = r#"{
            "type": "doc",
            "content": [{
                "type": "bulletList",
                "content": [
                    {"type": "listItem", "content": [
                        {"type": "paragraph", "content": [{"type": "text", "text": "Item one"}]}
                    ]},
                    {"type": "listItem", "content": [
                        {"type": "paragraph", "content": [{"type": "text", "text": "Item two"}]}
                    ]}
                ]
            }]
        }"#;

        let doc: AtlassianDoc = serde_json::from_str(json).unwrap();
        assert_eq!(doc.to_plain_text(), "• Item one\n• Item two");
    }

    #[test]
    fn test_atlassian_doc_heading_and_code() {
        let json = r#"{
            "type": "doc",
            "content": [
                {"type": "heading", "attrs": {"level": 1}, "content": [{"type": "text", "text": "Title"}]},
                {"type": "codeBlock", "attrs": {"language": "rust"}, "content": [{"type": "text", "text": "fn main() {}"}]}
            ]
        }"#;

        let doc: AtlassianDoc = serde_json::from_str(json).unwrap();
        assert_eq!(doc.to_plain_text(), "Title\nfn main() {}");
    }

    #[test]
    fn test_atlassian_doc_mention_and_hard_break() {
        let json = r#"{
            "type": "doc",
            "content": [{
                "type": "paragraph",
                "content": [
                    {"type": "text", "text": "Hello "},
                    {"type": "mention", "attrs": {"id": "abc123", "text": "John Doe"}},
                    {"type": "hardBreak"},
                    {"type": "mention", "attrs": {"id": "def456", "text": "@Jane"}}
                ]
            }]
        }"#;

        let doc: AtlassianDoc = serde_json::from_str(json).unwrap();
        assert_eq!(doc.to_plain_text(), "Hello @John Doe\n@Jane");
    }

    #[test]
    fn test_atlassian_doc_skips_media() {
        let json = r#"{
            "type": "doc",
            "content": [
                {"type": "mediaSingle", "content": [{"type": "media", "attrs": {"id": "x"}}]},
                {"type": "paragraph", "content": [{"type": "text", "text": "See screenshot"}]}
            ]
        }"#;

        let doc: AtlassianDoc = serde_json::from_str(json).unwrap();
        assert_eq!(doc.to_plain_text(), "See screenshot");
    }

    #[test]
    fn test_atlassian_doc_empty() {
        let doc = AtlassianDoc::default();
        assert_eq!(doc.to_plain_text(), "");
    }
}
