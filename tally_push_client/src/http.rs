//! HTTP client for the ingestor API.

use reqwest::StatusCode;
use serde_json::Value;
use snafu::{ResultExt, Snafu};
use tally_ingestor_http::types::{ErrorResponse, FlushResponse, IngestResponse, StatusResponse};

/// A client for pushing events to tally over HTTP.
#[derive(Debug, Clone)]
pub struct HttpPushClient {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Snafu)]
pub enum HttpPushClientError {
    #[snafu(display("Request error"))]
    Request { source: reqwest::Error },
    #[snafu(display("Response error: status={status}, message={message}"))]
    Response { status: StatusCode, message: String },
}

pub type Result<T, E = HttpPushClientError> = std::result::Result<T, E>;

impl HttpPushClient {
    /// Create a new HTTP push client.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send one event.
    pub async fn push(&self, event: &Value) -> Result<IngestResponse> {
        let response = self
            .client
            .post(self.url("/v1/events"))
            .json(event)
            .send()
            .await
            .context(RequestSnafu {})?;

        parse_response(response).await
    }

    /// Ask the server to flush its buffer.
    pub async fn flush(&self) -> Result<FlushResponse> {
        let response = self
            .client
            .post(self.url("/v1/flush"))
            .send()
            .await
            .context(RequestSnafu {})?;

        parse_response(response).await
    }

    pub async fn status(&self) -> Result<StatusResponse> {
        let response = self
            .client
            .get(self.url("/v1/status"))
            .send()
            .await
            .context(RequestSnafu {})?;

        parse_response(response).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

async fn parse_response<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    if response.status().is_success() {
        return response.json::<T>().await.context(RequestSnafu {});
    }

    let status = response.status();
    let body = response
        .json::<ErrorResponse>()
        .await
        .context(RequestSnafu {})?;

    Err(HttpPushClientError::Response {
        status,
        message: body.error,
    })
}
