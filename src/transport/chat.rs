//! HTTP chat transport.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use super::http::{error_field, json_headers, shared_client, status_to_error};
use super::{ChatReply, ChatRequest, ChatTransport};
use crate::config::{WidgetConfig, DEFAULT_REQUEST_TIMEOUT};
use crate::error::TransportError;
use crate::util::timeout::with_timeout;

const REPLY_FIELDS: [&str; 4] = ["response", "reply", "text", "message"];
const AUDIO_FIELDS: [&str; 3] = ["audio", "audio_url", "audioUrl"];

/// Chat client posting JSON to the configured endpoint.
#[derive(Debug, Clone)]
pub struct HttpChatTransport {
    url: String,
    api_key: Option<String>,
    timeout: Duration,
}

impl HttpChatTransport {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            api_key: None,
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn from_config(config: &WidgetConfig) -> Self {
        Self {
            url: config.chat_url.clone(),
            api_key: config.api_key.clone(),
            timeout: config.request_timeout,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn send_once(&self, request: &ChatRequest) -> Result<ChatReply, TransportError> {
        let response = shared_client()
            .post(&self.url)
            .headers(json_headers(self.api_key.as_deref()))
            .json(request)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;
        if !(200..300).contains(&status) {
            return Err(status_to_error(status, &body));
        }
        parse_reply(&body)
    }
}

#[async_trait]
impl ChatTransport for HttpChatTransport {
    async fn send(&self, request: &ChatRequest) -> Result<ChatReply, TransportError> {
        tracing::debug!(
            conversation_id = %request.conversation_id,
            history = request.conversation_history.len(),
            "Sending chat message"
        );
        with_timeout(self.timeout, self.send_once(request)).await
    }
}

/// Parse a 2xx chat body into a reply.
pub fn parse_reply(body: &str) -> Result<ChatReply, TransportError> {
    let value: Value = serde_json::from_str(body)?;
    if let Some(error) = error_field(&value) {
        return Err(TransportError::Backend(error));
    }
    // A blank reply would render as an empty bubble; treat it like no reply.
    let text = REPLY_FIELDS
        .iter()
        .filter_map(|field| value.get(*field).and_then(Value::as_str))
        .find(|text| !text.trim().is_empty())
        .map(str::to_string)
        .ok_or_else(|| TransportError::Malformed("response has no reply text".into()))?;
    let audio = first_string(&value, &AUDIO_FIELDS).filter(|a| !a.is_empty());
    Ok(ChatReply { text, audio })
}

fn first_string(value: &Value, fields: &[&str]) -> Option<String> {
    fields
        .iter()
        .find_map(|field| value.get(*field).and_then(Value::as_str))
        .map(str::to_string)
}
