use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{ConfigError, Result};

/// A package index taking part in a sync, either as source or destination.
#[derive(Clone, Default, Deserialize, Serialize)]
pub struct RepositoryConfig {
    /// Root URL of the index. `<url>/simple/` must serve the package listing.
    pub url: String,

    /// Username for HTTP Basic authentication.
    pub username: Option<String>,

    /// Password for HTTP Basic authentication.
    /// Prompted for when a username is set without one.
    pub password: Option<String>,
}

impl RepositoryConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Checks that `url` is an absolute http(s) URL and strips trailing slashes.
    pub fn resolve(&mut self) -> Result<()> {
        let trimmed = self.url.trim().trim_end_matches('/').to_string();
        let parsed =
            Url::parse(&trimmed).map_err(|_| ConfigError::InvalidRepositoryUrl(self.url.clone()))?;

        if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
            return Err(ConfigError::InvalidRepositoryUrl(self.url.clone()));
        }

        self.url = trimmed;
        Ok(())
    }

    pub fn needs_password(&self) -> bool {
        self.username.is_some() && self.password.is_none()
    }
}

impl fmt::Debug for RepositoryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RepositoryConfig")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "********"))
            .finish()
    }
}
