use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::request::{ApiRequest, ApiResponse};

use super::*;

impl TraktClient {
    /// Send a request through the authenticated pipeline.
    ///
    /// Returns the final response whatever its status; a 401 that could not
    /// be recovered by one refresh comes back as-is.
    pub async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, TraktError> {
        let mut request = request;
        loop {
            let outgoing = self.injector.inject(request).await;
            let resp = self.transport.send(outgoing).await?;

            if !resp.is_auth_failure() {
                return Ok(resp);
            }

            match self.reauthenticator.on_auth_failure(&resp).await {
                Some(retry) => {
                    tracing::debug!(url = %retry.url, attempt = retry.attempt, "Retrying with refreshed token");
                    request = retry;
                }
                None => return Ok(resp),
            }
        }
    }

    /// GET `path` and decode the JSON body.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, TraktError> {
        let url = self.config.api_endpoint(path)?;
        let resp = self.execute(ApiRequest::get(url)).await?.error_for_status()?;
        resp.json()
    }

    /// POST a JSON body to `path` and decode the JSON response.
    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, TraktError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let resp = self.post_raw(path, body).await?.error_for_status()?;
        resp.json()
    }

    /// POST a JSON body to `path` without interpreting the status.
    pub(super) async fn post_raw<B>(&self, path: &str, body: &B) -> Result<ApiResponse, TraktError>
    where
        B: Serialize + ?Sized,
    {
        let url = self.config.api_endpoint(path)?;
        let req = ApiRequest::post(url).json(&body)?;
        self.execute(req).await
    }

    /// DELETE `path`.
    pub async fn delete(&self, path: &str) -> Result<(), TraktError> {
        let url = self.config.api_endpoint(path)?;
        self.execute(ApiRequest::delete(url))
            .await?
            .error_for_status()?;
        Ok(())
    }
}
