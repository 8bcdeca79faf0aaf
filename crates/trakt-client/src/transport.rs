//! HTTP transport seam.
//!
//! The pipeline only needs "send a request, get status/headers/body back";
//! [`ReqwestTransport`] is the default, tests plug in scripted fakes.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Method;

use crate::request::{ApiRequest, ApiResponse, HttpMethod};
use crate::TraktError;

#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TraktError>;
}

/// Default transport over a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    http: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self, TraktError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http })
    }

    /// Reuse an existing client, e.g. one shared with other APIs.
    pub fn with_client(http: reqwest::Client) -> Self {
        Self { http }
    }
}

fn to_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Delete => Method::DELETE,
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TraktError> {
        let mut builder = self
            .http
            .request(to_method(request.method), request.url.clone())
            .headers(request.headers.clone());
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let resp = builder.send().await?;
        let status = resp.status().as_u16();
        let headers = resp.headers().clone();
        let body = resp.bytes().await?.to_vec();

        tracing::debug!(
            method = request.method.as_str(),
            url = %request.url,
            status,
            attempt = request.attempt,
            "trakt request finished"
        );

        Ok(ApiResponse {
            status,
            headers,
            body,
            request,
        })
    }
}
