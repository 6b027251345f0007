//! Transports the widget uses to reach the chat endpoint.
//!
//! The [`ChatTransport`] trait is the seam between the widget and the
//! network. [`HttpTransport`] is the production implementation; tests
//! substitute their own.

mod http;

pub use http::HttpTransport;

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::Result;
use crate::types::{ChatReply, ChatRequest};

/// Sends one chat request and yields the decoded reply.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Send `request` and wait for the server's reply.
    async fn send(&self, request: &ChatRequest) -> Result<ChatReply>;
}

#[async_trait]
impl<T: ChatTransport + ?Sized> ChatTransport for Arc<T> {
    async fn send(&self, request: &ChatRequest) -> Result<ChatReply> {
        (**self).send(request).await
    }
}
