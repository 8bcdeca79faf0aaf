//! Request and response values passed through the transport pipeline.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

use crate::TraktError;

/// HTTP method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Delete => "DELETE",
        }
    }
}

/// An outgoing request.
///
/// `attempt` starts at 1 and is incremented on every retry derived from
/// this request, so the pipeline can bound the refresh-and-retry cycle.
/// `injected_token` is the stored access token the pipeline put into the
/// authorization header; it stays `None` when the caller supplied its own.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: HttpMethod,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Vec<u8>>,
    pub attempt: u32,
    pub injected_token: Option<String>,
}

impl ApiRequest {
    pub fn new(method: HttpMethod, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            body: None,
            attempt: 1,
            injected_token: None,
        }
    }

    pub fn get(url: Url) -> Self {
        Self::new(HttpMethod::Get, url)
    }

    pub fn post(url: Url) -> Self {
        Self::new(HttpMethod::Post, url)
    }

    pub fn delete(url: Url) -> Self {
        Self::new(HttpMethod::Delete, url)
    }

    /// Attach a JSON body.
    pub fn json(mut self, body: &impl Serialize) -> Result<Self, TraktError> {
        self.body = Some(serde_json::to_vec(body)?);
        Ok(self)
    }

    /// Attach a form-encoded body and its content type.
    pub fn form(mut self, params: &[(&str, &str)]) -> Self {
        let encoded = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(params)
            .finish();
        self.headers.insert(
            reqwest::header::CONTENT_TYPE,
            HeaderValue::from_static("application/x-www-form-urlencoded"),
        );
        self.body = Some(encoded.into_bytes());
        self
    }

    /// Set a header, replacing any previous value.
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn host(&self) -> Option<&str> {
        self.url.host_str()
    }
}

/// A response together with the request that produced it.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
    pub request: ApiRequest,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Whether the server asked for different credentials.
    pub fn is_auth_failure(&self) -> bool {
        self.status == 401
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, TraktError> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Turn a non-2xx status into [`TraktError::ApiError`].
    pub fn error_for_status(self) -> Result<Self, TraktError> {
        if self.is_success() {
            return Ok(self);
        }
        Err(TraktError::ApiError {
            status: self.status,
            message: self.text(),
        })
    }
}
