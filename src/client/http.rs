//! `reqwest`-backed transport.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;
use url::Url;

use super::ChatTransport;
use crate::error::{Error, Result};
use crate::types::{ChatReply, ChatRequest};

/// Posts chat requests as JSON to a fixed endpoint.
///
/// # Example
///
/// ```rust,no_run
/// use unibot::client::{ChatTransport, HttpTransport};
/// use unibot::types::ChatRequest;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let transport = HttpTransport::new("http://localhost:3000/api/chat")?;
/// let reply = transport.send(&ChatRequest::new("When is the fee deadline?")).await?;
/// println!("{}", reply.reply);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpTransport {
    endpoint: Url,
    http: reqwest::Client,
}

impl HttpTransport {
    /// Create a transport for the given endpoint URL.
    pub fn new(endpoint: impl AsRef<str>) -> Result<Self> {
        Self::with_client(endpoint, reqwest::Client::new())
    }

    /// Create a transport whose requests give up after `timeout`.
    pub fn with_timeout(endpoint: impl AsRef<str>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Self::with_client(endpoint, http)
    }

    /// Create a transport with a custom reqwest client.
    pub fn with_client(endpoint: impl AsRef<str>, http: reqwest::Client) -> Result<Self> {
        let endpoint = Url::parse(endpoint.as_ref())?;
        Ok(Self { endpoint, http })
    }

    /// Get the endpoint URL.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    async fn handle_response(response: reqwest::Response) -> Result<ChatReply> {
        let status = response.status();
        if status.is_success() {
            Ok(response.json().await?)
        } else {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".into());
            Err(Error::Api {
                status: status.as_u16(),
                message,
            })
        }
    }
}

#[async_trait]
impl ChatTransport for HttpTransport {
    async fn send(&self, request: &ChatRequest) -> Result<ChatReply> {
        debug!(endpoint = %self.endpoint, "Posting chat message");
        let response = self
            .http
            .post(self.endpoint.clone())
            .json(request)
            .send()
            .await?;
        Self::handle_response(response).await
    }
}
