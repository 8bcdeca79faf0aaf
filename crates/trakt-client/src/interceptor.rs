//! Header injection for requests bound to the trakt API host.

use std::sync::Arc;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderName, HeaderValue};

use crate::credential::CredentialState;
use crate::request::ApiRequest;
use crate::{CONTENT_TYPE_JSON, HEADER_TRAKT_API_KEY, HEADER_TRAKT_API_VERSION};

/// Stamps content type, API key, API version and bearer authorization.
#[derive(Debug, Clone)]
pub struct HeaderInjector {
    api_host: String,
    api_version: String,
    credentials: Arc<CredentialState>,
}

impl HeaderInjector {
    pub fn new(api_host: String, api_version: String, credentials: Arc<CredentialState>) -> Self {
        Self {
            api_host,
            api_version,
            credentials,
        }
    }

    /// Decorate `request` using the current client id and access token.
    pub async fn inject(&self, request: ApiRequest) -> ApiRequest {
        let client_id = self.credentials.client_id().await;
        let access_token = self.credentials.access_token().await;
        inject_headers(
            request,
            &self.api_host,
            &self.api_version,
            &client_id,
            &access_token,
        )
    }
}

/// Requests for other hosts pass through untouched, so one transport can be
/// shared with unrelated APIs. An authorization header already on the
/// request wins over the stored access token. When the stored token is used
/// it is recorded in [`ApiRequest::injected_token`].
pub fn inject_headers(
    mut request: ApiRequest,
    api_host: &str,
    api_version: &str,
    client_id: &str,
    access_token: &str,
) -> ApiRequest {
    if request.host() != Some(api_host) {
        return request;
    }

    request
        .headers
        .insert(CONTENT_TYPE, HeaderValue::from_static(CONTENT_TYPE_JSON));
    set_header(&mut request, HEADER_TRAKT_API_KEY, client_id);
    set_header(&mut request, HEADER_TRAKT_API_VERSION, api_version);

    if !request.headers.contains_key(AUTHORIZATION) && !access_token.is_empty() {
        match HeaderValue::from_str(&format!("Bearer {access_token}")) {
            Ok(value) => {
                request.headers.insert(AUTHORIZATION, value);
                request.injected_token = Some(access_token.to_string());
            }
            Err(e) => {
                tracing::warn!(error = %e, "Access token is not a valid header value, skipping authorization");
            }
        }
    }

    request
}

fn set_header(request: &mut ApiRequest, name: &'static str, value: &str) {
    match HeaderValue::from_str(value) {
        Ok(value) => {
            request.headers.insert(HeaderName::from_static(name), value);
        }
        Err(e) => {
            tracing::warn!(header = name, error = %e, "Invalid header value, skipping");
        }
    }
}
