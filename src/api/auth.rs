//! Authentication handling for the Jira API.
//!
//! Jira Cloud accepts HTTP Basic auth with the account's login (usually an
//! email address) and an API token.

use std::fmt;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};

/// Authentication credentials for Jira.
#[derive(Clone)]
pub struct Auth {
    /// The user's login.
    username: String,
    /// The Base64-encoded authorization header value.
    auth_header: String,
}

impl Auth {
    /// Create new authentication credentials from a username and token.
    ///
    /// The token is immediately encoded and the raw token is not stored.
    pub fn new(username: &str, token: &str) -> Self {
        let auth_header = build_auth_header(username, token);
        Self {
            username: username.to_string(),
            auth_header,
        }
    }

    /// Get the authorization header value for HTTP requests.
    ///
    /// Returns the complete "Basic ..." header value.
    pub fn header_value(&self) -> &str {
        &self.auth_header
    }

    /// Get the username.
    pub fn username(&self) -> &str {
        &self.username
    }
}

impl fmt::Debug for Auth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Auth")
            .field("username", &self.username)
            .field("auth_header", &"Basic <redacted>")
            .finish()
    }
}

/// Build the Basic Auth header value.
///
/// Encodes "username:token" in Base64 and prepends "Basic ".
fn build_auth_header(username: &str, token: &str) -> String {
    let credentials = format!("{}:{}", username, token);
    let encoded = BASE64.encode(credentials.as_bytes());
    format!("Basic {}", encoded)
}
