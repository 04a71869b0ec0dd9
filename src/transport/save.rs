//! HTTP persistence transport for auto-save.

use std::time::Duration;

use async_trait::async_trait;

use super::http::{json_headers, shared_client, status_to_error};
use super::{SaveRequest, SaveTransport};
use crate::config::{WidgetConfig, DEFAULT_REQUEST_TIMEOUT};
use crate::error::TransportError;
use crate::util::timeout::with_timeout;

/// Posts conversation snapshots to the persistence endpoint.
#[derive(Debug, Clone)]
pub struct HttpSaveTransport {
    url: String,
    api_key: Option<String>,
    timeout: Duration,
}

impl HttpSaveTransport {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            api_key: None,
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// `None` when the config has no persistence endpoint.
    pub fn from_config(config: &WidgetConfig) -> Option<Self> {
        config.save_url.as_ref().map(|url| Self {
            url: url.clone(),
            api_key: config.api_key.clone(),
            timeout: config.request_timeout,
        })
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl SaveTransport for HttpSaveTransport {
    async fn save(&self, request: &SaveRequest) -> Result<(), TransportError> {
        with_timeout(self.timeout, async {
            let response = shared_client()
                .post(&self.url)
                .headers(json_headers(self.api_key.as_deref()))
                .json(request)
                .send()
                .await?;
            let status = response.status().as_u16();
            if (200..300).contains(&status) {
                return Ok(());
            }
            let body = response.text().await.unwrap_or_default();
            Err(status_to_error(status, &body))
        })
        .await
    }
}
