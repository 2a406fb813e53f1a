//! HTTP client for the render service.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use thiserror::Error;

use texpng_types::{ErrorBody, RENDER_PATH, RenderRequest, RenderSuccess, STATUS_PATH};

/// Budget for a single status check.
pub(crate) const HEALTH_TIMEOUT: Duration = Duration::from_millis(200);

#[derive(Debug, Error)]
pub(crate) enum TransportError {
    #[error("failed to build HTTP client: {0}")]
    Build(#[source] reqwest::Error),
    #[error("failed to reach render service at {url}: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("render failed: {message}")]
    Service { status: StatusCode, message: String },
    #[error("unexpected response from render service (status {status}): {body}")]
    Unexpected { status: StatusCode, body: String },
}

/// Thin client over the service's `/status` and `/render` routes.
#[derive(Debug, Clone)]
pub(crate) struct RenderClient {
    client: Client,
    base_url: String,
}

impl RenderClient {
    pub(crate) fn new(base_url: impl Into<String>) -> Result<Self, TransportError> {
        let client = Client::builder()
            .user_agent(concat!("texpng/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(TransportError::Build)?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url.trim_end_matches('/'))
    }

    /// Returns whether `GET /status` answers 200 within [`HEALTH_TIMEOUT`].
    pub(crate) async fn is_healthy(&self) -> bool {
        self.client
            .get(self.url(STATUS_PATH))
            .timeout(HEALTH_TIMEOUT)
            .send()
            .await
            .is_ok_and(|response| response.status() == StatusCode::OK)
    }

    /// Posts `request` and decodes the service's reply.
    pub(crate) async fn render(
        &self,
        request: &RenderRequest,
    ) -> Result<RenderSuccess, TransportError> {
        let url = self.url(RENDER_PATH);
        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|source| TransportError::Request {
                url: url.clone(),
                source,
            })?;
        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|source| TransportError::Request { url, source })?;
        decode_reply(status, &bytes)
    }
}

fn decode_reply(status: StatusCode, bytes: &[u8]) -> Result<RenderSuccess, TransportError> {
    if status.is_success() {
        if let Ok(success) = serde_json::from_slice::<RenderSuccess>(bytes) {
            return Ok(success);
        }
    } else if let Ok(body) = serde_json::from_slice::<ErrorBody>(bytes) {
        return Err(TransportError::Service {
            status,
            message: body.error,
        });
    }
    Err(TransportError::Unexpected {
        status,
        body: String::from_utf8_lossy(bytes).into_owned(),
    })
}
