//! OAuth token exchange against the trakt identity endpoint.
//!
//! Handles authorization URL generation, authorization code exchange,
//! token refresh and revocation. Nothing here is retried.

use std::sync::Arc;

use serde::Deserialize;
use url::Url;
use uuid::Uuid;

use crate::config::TraktConfig;
use crate::credential::CredentialState;
use crate::request::{ApiRequest, ApiResponse};
use crate::transport::Transport;
use crate::{AccessToken, GrantType, ResponseType, TraktError};

/// OAuth error response body.
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: Option<String>,
    error_description: Option<String>,
}

/// Authorization URL plus the `state` value the redirect must echo back.
#[derive(Debug, Clone)]
pub struct AuthorizationRequest {
    pub url: String,
    pub state: String,
}

/// Performs the token grants for one client identity.
pub struct TokenExchange {
    transport: Arc<dyn Transport>,
    credentials: Arc<CredentialState>,
    authorize_url: Url,
    token_url: Url,
    revoke_url: Url,
}

impl TokenExchange {
    pub fn new(
        config: &TraktConfig,
        transport: Arc<dyn Transport>,
        credentials: Arc<CredentialState>,
    ) -> Result<Self, TraktError> {
        Ok(Self {
            transport,
            credentials,
            authorize_url: config.oauth_endpoint("authorize")?,
            token_url: config.oauth_endpoint("token")?,
            revoke_url: config.oauth_endpoint("revoke")?,
        })
    }

    /// Build the authorization URL with a fresh random `state`.
    pub async fn authorization_url(&self) -> AuthorizationRequest {
        let state = Uuid::new_v4().to_string();
        let client_id = self.credentials.client_id().await;
        let mut url = self.authorize_url.clone();
        url.query_pairs_mut()
            .append_pair("response_type", ResponseType::Code.as_str())
            .append_pair("client_id", &client_id)
            .append_pair("redirect_uri", self.credentials.redirect_uri())
            .append_pair("state", &state);
        AuthorizationRequest {
            url: url.to_string(),
            state,
        }
    }

    /// Exchange an authorization code for access and refresh tokens.
    pub async fn exchange_code(&self, code: &str) -> Result<AccessToken, TraktError> {
        let client_id = self.credentials.client_id().await;
        let params = [
            ("grant_type", GrantType::AuthorizationCode.as_str()),
            ("code", code),
            ("client_id", client_id.as_str()),
            ("client_secret", self.credentials.client_secret()),
            ("redirect_uri", self.credentials.redirect_uri()),
        ];

        let req = ApiRequest::post(self.token_url.clone()).form(&params);
        let resp = self.transport.send(req).await?;
        parse_token_response(resp)
    }

    /// Exchange a refresh token for a new token pair.
    pub async fn refresh(&self, refresh_token: &str) -> Result<AccessToken, TraktError> {
        tracing::info!("Refreshing trakt OAuth token");

        let client_id = self.credentials.client_id().await;
        let params = [
            ("grant_type", GrantType::RefreshToken.as_str()),
            ("refresh_token", refresh_token),
            ("client_id", client_id.as_str()),
            ("client_secret", self.credentials.client_secret()),
            ("redirect_uri", self.credentials.redirect_uri()),
        ];

        let req = ApiRequest::post(self.token_url.clone()).form(&params);
        let resp = self.transport.send(req).await?;
        parse_token_response(resp)
    }

    /// Revoke an access token. Best-effort: failures are returned, not retried.
    pub async fn revoke(&self, access_token: &str) -> Result<(), TraktError> {
        let client_id = self.credentials.client_id().await;
        let params = [
            ("token", access_token),
            ("client_id", client_id.as_str()),
            ("client_secret", self.credentials.client_secret()),
        ];

        let req = ApiRequest::post(self.revoke_url.clone()).form(&params);
        let resp = self.transport.send(req).await?;
        if !resp.is_success() {
            tracing::warn!(status = resp.status, "Token revocation rejected");
            return Err(exchange_error(&resp));
        }
        Ok(())
    }
}

/// Falls back to the status and raw body when the error fields are missing.
fn exchange_error(resp: &ApiResponse) -> TraktError {
    let body = resp.text();
    let parsed = serde_json::from_str::<ErrorResponse>(&body).ok();
    let message = match parsed.map(|e| (e.error, e.error_description)) {
        Some((Some(error), Some(description))) => format!("{error}: {description}"),
        Some((Some(error), None)) => error,
        Some((None, Some(description))) => description,
        _ if body.trim().is_empty() => resp.status.to_string(),
        _ => format!("{}: {}", resp.status, body),
    };
    TraktError::AuthExchange {
        status: resp.status,
        message,
    }
}

/// Parse the token endpoint response into an [`AccessToken`].
fn parse_token_response(resp: ApiResponse) -> Result<AccessToken, TraktError> {
    if !resp.is_success() {
        return Err(exchange_error(&resp));
    }

    serde_json::from_slice(&resp.body).map_err(|e| TraktError::AuthExchange {
        status: resp.status,
        message: format!("failed to parse response: {e}"),
    })
}
