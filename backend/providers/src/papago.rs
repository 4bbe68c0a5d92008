//! Papago NMT translation provider.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use labelscan_config::defaults::DEFAULT_PAPAGO_ENDPOINT;
use labelscan_config::TranslationConfig;
use labelscan_core::{TranslateError, Translator};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

const HEADER_CLIENT_ID: &str = "X-NCP-APIGW-API-KEY-ID";
const HEADER_CLIENT_SECRET: &str = "X-NCP-APIGW-API-KEY";

pub struct PapagoTranslator {
    client: Client,
    endpoint: String,
    client_id: String,
    client_secret: String,
    timeout: Duration,
}

impl PapagoTranslator {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        let timeout = TranslationConfig::default().timeout();
        Self {
            client: build_client(timeout),
            endpoint: DEFAULT_PAPAGO_ENDPOINT.to_string(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            timeout,
        }
    }

    /// `None` when translation is disabled or credentials are missing.
    pub fn from_config(config: &TranslationConfig) -> Option<Self> {
        if !config.is_active() {
            return None;
        }
        let id = config.client_id.clone()?;
        let secret = config.client_secret.clone()?;
        Some(
            Self::new(id, secret)
                .with_endpoint(config.endpoint())
                .with_timeout(config.timeout()),
        )
    }

    pub fn with_endpoint(mut self, url: impl Into<String>) -> Self {
        self.endpoint = url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self.client = build_client(timeout);
        self
    }
}

fn build_client(timeout: Duration) -> Client {
    Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_default()
}

#[derive(Serialize)]
struct PapagoRequest<'a> {
    source: &'a str,
    target: &'a str,
    text: &'a str,
}

#[derive(Deserialize)]
struct PapagoResponse {
    message: PapagoMessage,
}

#[derive(Deserialize)]
struct PapagoMessage {
    result: PapagoResult,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PapagoResult {
    translated_text: String,
}

#[async_trait]
impl Translator for PapagoTranslator {
    fn name(&self) -> &str {
        "papago"
    }

    async fn translate(
        &self,
        text: &str,
        source: &str,
        target: &str,
    ) -> Result<String, TranslateError> {
        let start = Instant::now();
        debug!(%source, %target, chars = text.chars().count(), "Sending request to Papago");

        let response = self
            .client
            .post(&self.endpoint)
            .header(HEADER_CLIENT_ID, &self.client_id)
            .header(HEADER_CLIENT_SECRET, &self.client_secret)
            .json(&PapagoRequest { source, target, text })
            .send()
            .await
            .map_err(|e| self.request_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(TranslateError::Http {
                status: status.as_u16(),
                message,
            });
        }

        let body: PapagoResponse = response
            .json()
            .await
            .map_err(|e| self.request_error(e))?;

        debug!(latency_ms = start.elapsed().as_millis() as u64, "Papago replied");
        Ok(body.message.result.translated_text)
    }
}

impl PapagoTranslator {
    fn request_error(&self, e: reqwest::Error) -> TranslateError {
        if e.is_timeout() {
            TranslateError::Timeout(self.timeout)
        } else if e.is_decode() {
            TranslateError::Unavailable(format!("malformed Papago response: {e}"))
        } else {
            TranslateError::Unavailable(e.to_string())
        }
    }
}
