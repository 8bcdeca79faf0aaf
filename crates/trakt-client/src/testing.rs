//! Scripted transport for pipeline tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::HeaderMap;

use crate::request::{ApiRequest, ApiResponse};
use crate::transport::Transport;
use crate::TraktError;

type OneShot = Box<dyn FnOnce(&ApiRequest) -> ApiResponse + Send>;
type Route = Box<dyn Fn(&ApiRequest) -> ApiResponse + Send + Sync>;

/// Answers queued responses in order, then falls back to a routing closure.
/// Every request is recorded.
#[derive(Default)]
pub struct ScriptedTransport {
    queue: Mutex<VecDeque<OneShot>>,
    route: Option<Route>,
    token_delay: Option<Duration>,
    sent: Mutex<Vec<ApiRequest>>,
}

impl ScriptedTransport {
    pub fn routed(route: impl Fn(&ApiRequest) -> ApiResponse + Send + Sync + 'static) -> Self {
        Self {
            route: Some(Box::new(route)),
            ..Self::default()
        }
    }

    /// Delay answers to `/token` requests, keeping a refresh in flight.
    pub fn with_token_delay(mut self, delay: Duration) -> Self {
        self.token_delay = Some(delay);
        self
    }

    pub fn push(&self, handler: impl FnOnce(&ApiRequest) -> ApiResponse + Send + 'static) {
        self.queue.lock().unwrap().push_back(Box::new(handler));
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.sent.lock().unwrap().clone()
    }

    pub fn count_path(&self, suffix: &str) -> usize {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.url.path().ends_with(suffix))
            .count()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TraktError> {
        self.sent.lock().unwrap().push(request.clone());

        if let Some(delay) = self.token_delay {
            if request.url.path().ends_with("/token") {
                tokio::time::sleep(delay).await;
            }
        }

        let queued = self.queue.lock().unwrap().pop_front();
        if let Some(handler) = queued {
            return Ok(handler(&request));
        }
        match &self.route {
            Some(route) => Ok(route(&request)),
            None => Err(TraktError::Transport(format!(
                "no scripted response for {}",
                request.url
            ))),
        }
    }
}

pub fn json_response(request: &ApiRequest, status: u16, body: &str) -> ApiResponse {
    ApiResponse {
        status,
        headers: HeaderMap::new(),
        body: body.as_bytes().to_vec(),
        request: request.clone(),
    }
}
