//! Access token handling and credential-bearing remote URLs
//!
//! The token is loaded once at startup and passed explicitly to whatever needs
//! it. Neither the token nor a URL embedding it ever reaches `Debug` output.

use std::env;
use std::fmt;

use crate::error::MirrorError;

/// Environment variable holding the GitHub API token
pub const ACCESS_TOKEN_VAR: &str = "ACCESS_TOKEN";

/// GitHub API token
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Read the token from the given environment variable
    pub fn from_env(var: &str) -> Result<Self, MirrorError> {
        match env::var(var) {
            Ok(token) if !token.trim().is_empty() => Ok(Self(token.trim().to_string())),
            _ => Err(MirrorError::MissingCredential(var.to_string())),
        }
    }

    /// The raw token, for handing to the API client or embedding in a remote URL
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

/// Remote URL for clone/fetch/push
///
/// Authenticated URLs carry the token inline (basic auth form), so every
/// command run against one is marked sensitive.
#[derive(Clone, PartialEq, Eq)]
pub struct RemoteUrl {
    url: String,
    authenticated: bool,
}

impl RemoteUrl {
    /// A URL with no embedded credential
    pub fn public(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            authenticated: false,
        }
    }

    /// `https://<user>:<token>@github.com/<org>/<repo>.git`
    pub fn github(user: &str, token: &AccessToken, org: &str, repo: &str) -> Self {
        Self {
            url: format!(
                "https://{}:{}@github.com/{}/{}.git",
                user,
                token.expose(),
                org,
                repo
            ),
            authenticated: true,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    pub fn as_str(&self) -> &str {
        &self.url
    }
}

impl fmt::Debug for RemoteUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.authenticated {
            f.write_str("RemoteUrl(<redacted>)")
        } else {
            f.debug_tuple("RemoteUrl").field(&self.url).finish()
        }
    }
}
