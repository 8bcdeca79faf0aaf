//! trakt v2 REST API client.
//!
//! Owns the shared credential state and routes every request through
//! header injection and the single refresh-and-retry cycle on 401.

mod checkin;
mod request;

pub mod models;

pub use checkin::Checkin;
pub use models::{
    CheckinConflict, EpisodeCheckin, EpisodeCheckinResponse, EpisodeRef, Ids, MovieCheckin,
    MovieCheckinResponse, MovieRef, ShareSettings, ShowRef,
};

use std::sync::Arc;

use crate::auth::{AuthorizationRequest, TokenExchange};
use crate::authenticator::Reauthenticator;
use crate::config::TraktConfig;
use crate::credential::{Credential, CredentialState};
use crate::interceptor::HeaderInjector;
use crate::request::ApiResponse;
use crate::transport::{ReqwestTransport, Transport};
use crate::{AccessToken, TraktError};

/// Status trakt answers with when a checkin is already in progress.
pub const CHECKIN_CONFLICT_STATUS: u16 = 409;

/// trakt API client. Cheap to clone; clones share one credential state.
#[derive(Clone)]
pub struct TraktClient {
    pub(super) config: Arc<TraktConfig>,
    pub(super) transport: Arc<dyn Transport>,
    pub(super) credentials: Arc<CredentialState>,
    pub(super) injector: HeaderInjector,
    pub(super) reauthenticator: Arc<Reauthenticator>,
    pub(super) exchange: Arc<TokenExchange>,
}

impl TraktClient {
    /// Create a client over the default reqwest transport.
    pub fn new(config: TraktConfig) -> Result<Self, TraktError> {
        let transport = ReqwestTransport::new(config.request_timeout)?;
        Self::with_transport(config, Arc::new(transport))
    }

    /// Create a client over a caller-supplied transport, e.g. one shared
    /// with other APIs.
    pub fn with_transport(
        config: TraktConfig,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, TraktError> {
        config.validate()?;
        let api_host = config.api_host()?;

        let credentials = Arc::new(CredentialState::new(
            config.client_id.clone(),
            config.client_secret.clone(),
            config.redirect_uri.clone(),
        ));
        let exchange = Arc::new(TokenExchange::new(
            &config,
            transport.clone(),
            credentials.clone(),
        )?);
        let injector = HeaderInjector::new(
            api_host.clone(),
            config.api_version.clone(),
            credentials.clone(),
        );
        let reauthenticator = Arc::new(Reauthenticator::new(
            api_host,
            credentials.clone(),
            exchange.clone(),
            config.refresh_timeout,
        ));

        Ok(Self {
            config: Arc::new(config),
            transport,
            credentials,
            injector,
            reauthenticator,
            exchange,
        })
    }

    pub fn config(&self) -> &TraktConfig {
        &self.config
    }

    pub async fn client_id(&self) -> String {
        self.credentials.client_id().await
    }

    pub async fn set_client_id(&self, client_id: String) {
        self.credentials.set_client_id(client_id).await;
    }

    /// Current token pair, if authorized.
    pub async fn credential(&self) -> Option<Credential> {
        self.credentials.credential().await
    }

    /// Set or clear the token pair used for requests, e.g. one restored
    /// from storage.
    pub async fn set_credential(&self, credential: Option<Credential>) {
        self.credentials.set_credential(credential).await;
    }

    /// Authorization URL to send the user to. Verify the returned `state`
    /// against the redirect before calling [`Self::exchange_code_for_token`].
    pub async fn build_authorization_url(&self) -> AuthorizationRequest {
        self.exchange.authorization_url().await
    }

    /// Exchange an authorization code and store the resulting tokens.
    ///
    /// Runs under the refresh guard so that it cannot interleave with a
    /// refresh. On failure the app must be re-authorized.
    pub async fn exchange_code_for_token(&self, code: &str) -> Result<AccessToken, TraktError> {
        let mut record = self.credentials.refresh_guard().await;

        let token = self.exchange.exchange_code(code).await?;
        self.credentials.apply(&token).await;
        self.credentials
            .finish_refresh(&mut record, Some(token.access_token.clone()));
        tracing::info!(expires_in = token.expires_in, "Authorization code exchanged");
        Ok(token)
    }

    /// Refresh the stored tokens ahead of a 401, e.g. from a background task.
    pub async fn refresh_access_token(&self) -> Result<AccessToken, TraktError> {
        let mut record = self.credentials.refresh_guard().await;

        let refresh_token = self.credentials.refresh_token().await;
        if refresh_token.is_empty() {
            return Err(TraktError::AuthRequired);
        }

        let outcome = tokio::time::timeout(
            self.config.refresh_timeout,
            self.exchange.refresh(&refresh_token),
        )
        .await
        .map_err(|_| TraktError::Timeout)
        .and_then(|result| result);

        match outcome {
            Ok(token) => {
                self.credentials.apply(&token).await;
                self.credentials
                    .finish_refresh(&mut record, Some(token.access_token.clone()));
                Ok(token)
            }
            Err(e) => {
                self.credentials.finish_refresh(&mut record, None);
                Err(e)
            }
        }
    }

    /// Revoke the current access token and forget the stored credential.
    pub async fn revoke_access_token(&self) -> Result<(), TraktError> {
        let access_token = self.credentials.access_token().await;
        if access_token.is_empty() {
            return Err(TraktError::AuthRequired);
        }
        self.exchange.revoke(&access_token).await?;
        self.credentials.set_credential(None).await;
        Ok(())
    }

    /// If the response is a checkin conflict, decode its details.
    ///
    /// Any other status yields `Ok(None)`.
    pub fn check_for_checkin_error(
        &self,
        response: &ApiResponse,
    ) -> Result<Option<CheckinConflict>, TraktError> {
        detect_checkin_conflict(response)
    }

    /// Checkin resource group.
    pub fn checkin(&self) -> Checkin<'_> {
        Checkin::new(self)
    }
}

/// Only 409 can be a checkin conflict.
pub fn detect_checkin_conflict(
    response: &ApiResponse,
) -> Result<Option<CheckinConflict>, TraktError> {
    if response.status != CHECKIN_CONFLICT_STATUS {
        return Ok(None);
    }
    Ok(Some(response.json()?))
}

#[cfg(test)]
mod tests;
