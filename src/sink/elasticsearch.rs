//! Elasticsearch index API sink.
//!
//! Each document is `POST`ed to `/<index>/_doc`, letting the cluster assign the
//! id and auto-create the monthly index on first write.

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use std::time::Duration;
use tracing::{debug, info};

use super::{DeliveryAck, DeliverySink};
use crate::config::{ConfigResult, ConfigurationError, ShipperConfig};
use crate::error::{PipelineError, PipelineResult};
use crate::models::NormalizedDocument;

/// Longest slice of an error body kept in a rejection reason
const MAX_REASON_LEN: usize = 512;

/// Connection parameters, fixed for the lifetime of the sink
#[derive(Clone)]
pub struct ElasticsearchSinkConfig {
    /// e.g. `https://localhost:9200/`
    pub base_url: String,
    pub username: String,
    pub password: String,
    pub verify_certs: bool,
    pub request_timeout: Duration,
}

impl std::fmt::Debug for ElasticsearchSinkConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElasticsearchSinkConfig")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("password", &"[MASKED]")
            .field("verify_certs", &self.verify_certs)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl From<&ShipperConfig> for ElasticsearchSinkConfig {
    fn from(config: &ShipperConfig) -> Self {
        Self {
            base_url: config.base_url(),
            username: config.username.clone(),
            password: config.password.clone(),
            verify_certs: config.verify_certs,
            request_timeout: config.request_timeout(),
        }
    }
}

#[derive(Clone)]
pub struct ElasticsearchSink {
    client: Client,
    base_url: Url,
    username: String,
    password: String,
}

impl std::fmt::Debug for ElasticsearchSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElasticsearchSink")
            .field("base_url", &self.base_url.as_str())
            .field("username", &self.username)
            .finish()
    }
}

impl ElasticsearchSink {
    /// Build the HTTP client. Fails only on an unusable URL or TLS setup.
    pub fn new(config: ElasticsearchSinkConfig) -> ConfigResult<Self> {
        let base_url = Url::parse(&config.base_url).map_err(|e| {
            ConfigurationError::invalid_value("base_url", &config.base_url, e.to_string())
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ConfigurationError::invalid_value(
                "base_url",
                &config.base_url,
                "URL cannot carry an index path",
            ));
        }

        let client = Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.request_timeout)
            .danger_accept_invalid_certs(!config.verify_certs)
            .user_agent(format!("pihole-shipper/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                ConfigurationError::invalid_value("http_client", &config.base_url, e.to_string())
            })?;

        info!(
            base_url = %base_url,
            verify_certs = config.verify_certs,
            timeout_secs = config.request_timeout.as_secs(),
            "Created Elasticsearch sink"
        );

        Ok(Self {
            client,
            base_url,
            username: config.username,
            password: config.password,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn document_url(&self, index: &str) -> PipelineResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| PipelineError::delivery_unavailable("base URL cannot carry a path"))?
            .pop_if_empty()
            .push(index)
            .push("_doc");
        Ok(url)
    }
}

#[async_trait]
impl DeliverySink for ElasticsearchSink {
    async fn deliver(
        &self,
        partition_key: &str,
        doc: &NormalizedDocument,
    ) -> PipelineResult<DeliveryAck> {
        let url = self.document_url(partition_key)?;

        let response = self
            .client
            .post(url)
            .basic_auth(&self.username, Some(&self.password))
            .json(doc)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            let ack = response.json::<DeliveryAck>().await.map_err(|e| {
                PipelineError::delivery_rejected(
                    partition_key,
                    status.as_u16(),
                    format!("unexpected acknowledgement: {e}"),
                )
            })?;
            debug!(
                index = %ack.index,
                doc_id = %ack.doc_id,
                result = %ack.result,
                "Elasticsearch acknowledged document"
            );
            return Ok(ack);
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        Err(classify_failure(partition_key, status, &body))
    }
}

/// Map a non-success response onto the error taxonomy.
///
/// Auth failures, throttling and server errors are worth retrying next pass;
/// any other client error means the document itself was refused.
fn classify_failure(index: &str, status: StatusCode, body: &str) -> PipelineError {
    let reason = error_reason(body);
    match status {
        StatusCode::UNAUTHORIZED
        | StatusCode::FORBIDDEN
        | StatusCode::REQUEST_TIMEOUT
        | StatusCode::TOO_MANY_REQUESTS => {
            PipelineError::delivery_unavailable(format!("HTTP {status}: {reason}"))
        }
        s if s.is_server_error() => {
            PipelineError::delivery_unavailable(format!("HTTP {status}: {reason}"))
        }
        s => PipelineError::delivery_rejected(index, s.as_u16(), reason),
    }
}

/// Pull `error.reason` out of an Elasticsearch error body, falling back to the raw text
fn error_reason(body: &str) -> String {
    let structured = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            let error = value.get("error")?;
            error
                .get("reason")
                .and_then(|r| r.as_str())
                .or_else(|| error.as_str())
                .map(str::to_string)
        });

    let reason = structured.unwrap_or_else(|| body.trim().to_string());
    if reason.len() > MAX_REASON_LEN {
        let mut end = MAX_REASON_LEN;
        while !reason.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &reason[..end])
    } else {
        reason
    }
}
