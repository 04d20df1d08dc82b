//! Jira API client and types.
//!
//! This module provides the interface for reading a project's issues,
//! comments and attachments from the Jira Cloud REST API.

mod auth;
mod client;
pub mod error;
mod source;
pub mod types;

pub use client::{JiraClient, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
pub use error::ApiError;
pub use source::IssueSource;
pub use types::{Attachment, AtlassianDoc, Comment, Issue};
