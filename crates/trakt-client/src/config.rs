//! Client configuration with environment overrides.

use std::time::Duration;

use url::Url;

use crate::{API_URL, API_VERSION, OAUTH2_URL, TraktError};

/// Runtime configuration for a [`crate::TraktClient`].
#[derive(Debug, Clone)]
pub struct TraktConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    /// Base URL of the catalog API. Its host decides which requests get
    /// the trakt headers.
    pub api_url: String,
    /// Base URL of the identity endpoint (`/token`, `/revoke`, `/authorize`).
    pub oauth_url: String,
    pub api_version: String,
    pub request_timeout: Duration,
    /// Upper bound for a single refresh-token exchange.
    pub refresh_timeout: Duration,
}

impl Default for TraktConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            redirect_uri: "urn:ietf:wg:oauth:2.0:oob".into(),
            api_url: API_URL.into(),
            oauth_url: OAUTH2_URL.into(),
            api_version: API_VERSION.into(),
            request_timeout: Duration::from_secs(30),
            refresh_timeout: Duration::from_secs(15),
        }
    }
}

impl TraktConfig {
    pub fn new(client_id: String, client_secret: String, redirect_uri: String) -> Self {
        Self {
            client_id,
            client_secret,
            redirect_uri,
            ..Self::default()
        }
    }

    /// Load configuration from `TRAKT_*` environment variables on top of the defaults.
    pub fn from_env() -> Result<Self, TraktError> {
        let mut config = Self::default();

        if let Ok(v) = std::env::var("TRAKT_CLIENT_ID") {
            config.client_id = v;
        }
        if let Ok(v) = std::env::var("TRAKT_CLIENT_SECRET") {
            config.client_secret = v;
        }
        if let Ok(v) = std::env::var("TRAKT_REDIRECT_URI") {
            config.redirect_uri = v;
        }
        if let Ok(v) = std::env::var("TRAKT_API_URL") {
            config.api_url = v;
        }
        if let Ok(v) = std::env::var("TRAKT_OAUTH_URL") {
            config.oauth_url = v;
        }
        if let Ok(v) = std::env::var("TRAKT_REFRESH_TIMEOUT_SECS") {
            let secs = v.parse::<u64>().map_err(|_| {
                TraktError::InvalidConfig(format!("TRAKT_REFRESH_TIMEOUT_SECS is not a number: {v}"))
            })?;
            config.refresh_timeout = Duration::from_secs(secs);
        }

        config.validate()?;
        Ok(config)
    }

    /// Check required fields and URL syntax.
    pub fn validate(&self) -> Result<(), TraktError> {
        if self.client_id.trim().is_empty() {
            return Err(TraktError::InvalidConfig("client_id is empty".into()));
        }
        self.api_host()?;
        Url::parse(&self.oauth_url)?;
        Ok(())
    }

    /// Host of the catalog API, e.g. `api-v2launch.trakt.tv`.
    pub fn api_host(&self) -> Result<String, TraktError> {
        let url = Url::parse(&self.api_url)?;
        url.host_str()
            .map(str::to_owned)
            .ok_or_else(|| TraktError::InvalidConfig(format!("api_url has no host: {}", self.api_url)))
    }

    pub(crate) fn oauth_endpoint(&self, path: &str) -> Result<Url, TraktError> {
        Ok(Url::parse(&format!(
            "{}/{path}",
            self.oauth_url.trim_end_matches('/')
        ))?)
    }

    pub(crate) fn api_endpoint(&self, path: &str) -> Result<Url, TraktError> {
        Ok(Url::parse(&format!(
            "{}/{}",
            self.api_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        ))?)
    }
}
