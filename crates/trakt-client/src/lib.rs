//! trakt v2 API client library.
//!
//! Provides OAuth token exchange, a shared credential store, and an
//! authenticated request pipeline that injects the trakt headers and
//! refreshes an expired access token once before retrying.

pub mod api;
pub mod auth;
pub mod authenticator;
pub mod config;
pub mod credential;
pub mod interceptor;
pub mod request;
pub mod transport;

#[cfg(test)]
mod testing;

use serde::{Deserialize, Serialize};

pub use api::TraktClient;
pub use api::models::CheckinConflict;
pub use config::TraktConfig;
pub use credential::{Credential, CredentialState};
pub use request::{ApiRequest, ApiResponse, HttpMethod};
pub use transport::{ReqwestTransport, Transport};

pub const API_VERSION: &str = "2";
pub const API_URL: &str = "https://api-v2launch.trakt.tv";
pub const OAUTH2_URL: &str = "https://trakt.tv/oauth";

pub const HEADER_TRAKT_API_VERSION: &str = "trakt-api-version";
pub const HEADER_TRAKT_API_KEY: &str = "trakt-api-key";
pub const CONTENT_TYPE_JSON: &str = "application/json";

/// Token pair returned by the trakt token endpoint.
///
/// Consumed right away to overwrite the [`CredentialState`]; callers that
/// persist credentials should store the whole value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub expires_in: i64,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub created_at: Option<i64>,
}

fn default_token_type() -> String {
    "bearer".into()
}

/// OAuth grant types accepted by the token endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrantType {
    AuthorizationCode,
    RefreshToken,
}

impl GrantType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AuthorizationCode => "authorization_code",
            Self::RefreshToken => "refresh_token",
        }
    }
}

/// OAuth response types for the authorization endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseType {
    Code,
}

impl ResponseType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Code => "code",
        }
    }
}

/// Unified error type for the trakt-client crate.
#[derive(Debug, thiserror::Error)]
pub enum TraktError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Authentication required: no credential set")]
    AuthRequired,

    #[error("Token exchange rejected (status {status}): {message}")]
    AuthExchange { status: u16, message: String },

    #[error("Already checked in, expires at {}", .0.expires_at)]
    CheckinConflict(CheckinConflict),

    #[error("trakt API error (status {status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("Token refresh timed out")]
    Timeout,

    #[error("Token refresh failed")]
    RefreshFailed,

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl TraktError {
    /// Whether the catalog rejected the request as unauthorized, even after
    /// the single refresh attempt. The caller should restart authorization.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::ApiError { status: 401, .. })
    }
}
