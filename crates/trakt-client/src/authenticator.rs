//! Refresh-and-retry decision for unauthorized responses.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{AUTHORIZATION, HeaderValue};

use crate::auth::TokenExchange;
use crate::credential::CredentialState;
use crate::request::{ApiRequest, ApiResponse};
use crate::TraktError;

/// Requests that already reached this attempt are not refreshed again.
pub const MAX_ATTEMPTS: u32 = 2;

/// Refreshes the access token after a 401 and builds the single retry.
pub struct Reauthenticator {
    api_host: String,
    credentials: Arc<CredentialState>,
    exchange: Arc<TokenExchange>,
    refresh_timeout: Duration,
}

impl Reauthenticator {
    pub fn new(
        api_host: String,
        credentials: Arc<CredentialState>,
        exchange: Arc<TokenExchange>,
        refresh_timeout: Duration,
    ) -> Self {
        Self {
            api_host,
            credentials,
            exchange,
            refresh_timeout,
        }
    }

    /// Returns the request to retry, or `None` to hand the original
    /// failure back to the caller.
    pub async fn on_auth_failure(&self, response: &ApiResponse) -> Option<ApiRequest> {
        let request = &response.request;

        if request.host() != Some(self.api_host.as_str()) {
            return None;
        }
        if request.attempt >= MAX_ATTEMPTS {
            tracing::warn!(
                url = %request.url,
                attempt = request.attempt,
                "Still unauthorized after token refresh, giving up"
            );
            return None;
        }
        if self.credentials.refresh_token().await.is_empty() {
            tracing::debug!(url = %request.url, "Got 401 without a refresh token, giving up");
            return None;
        }

        let access_token = match self
            .refreshed_access_token(request.injected_token.as_deref())
            .await
        {
            Ok(token) => token,
            Err(e) => {
                tracing::warn!(error = %e, "Token refresh after 401 failed");
                return None;
            }
        };

        let value = match HeaderValue::from_str(&format!("Bearer {access_token}")) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(error = %e, "Refreshed access token is not a valid header value");
                return None;
            }
        };

        let mut retry = request.clone();
        retry.headers.insert(AUTHORIZATION, value);
        retry.injected_token = Some(access_token);
        retry.attempt += 1;
        Some(retry)
    }

    /// Refresh under the per-credential lock.
    ///
    /// A refresh that finished while this request waited for the lock is
    /// shared, whether it succeeded or not. A request whose injected token
    /// was already replaced reuses the stored one.
    async fn refreshed_access_token(&self, injected: Option<&str>) -> Result<String, TraktError> {
        let seen = self.credentials.refresh_generation();
        let mut record = self.credentials.refresh_guard().await;

        if self.credentials.refresh_generation() != seen {
            return match record.last_access_token() {
                Some(token) => {
                    tracing::info!("Token already refreshed by another request; reusing latest token");
                    Ok(token.to_string())
                }
                None => Err(TraktError::RefreshFailed),
            };
        }

        let current = self
            .credentials
            .credential()
            .await
            .ok_or(TraktError::AuthRequired)?;
        if is_rotated_access_token(injected, &current.access_token) {
            tracing::info!("Token already refreshed by another request; reusing latest token");
            return Ok(current.access_token);
        }
        if current.refresh_token.is_empty() {
            return Err(TraktError::AuthRequired);
        }

        let outcome = tokio::time::timeout(
            self.refresh_timeout,
            self.exchange.refresh(&current.refresh_token),
        )
        .await
        .map_err(|_| TraktError::Timeout)
        .and_then(|result| result);

        match outcome {
            Ok(token) => {
                self.credentials.apply(&token).await;
                self.credentials
                    .finish_refresh(&mut record, Some(token.access_token.clone()));
                tracing::info!(expires_in = token.expires_in, "Token refreshed after 401");
                Ok(token.access_token)
            }
            Err(e) => {
                self.credentials.finish_refresh(&mut record, None);
                Err(e)
            }
        }
    }
}

fn is_rotated_access_token(injected: Option<&str>, current: &str) -> bool {
    match injected {
        Some(injected) => !current.is_empty() && injected != current,
        None => false,
    }
}
