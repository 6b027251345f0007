//! UniBot: a university FAQ chat widget and its chat endpoint.
//!
//! The widget renders a message list, sends each user message to
//! `POST /api/chat`, and shows the reply after a typing indicator that
//! stays up for at least a second. The server answers from a FAQ file
//! and escalates low-confidence questions to an administrator.
//!
//! # Architecture
//!
//! - **Widget**: renderer-agnostic chat component with injectable view, transport and clock
//! - **Client**: `reqwest` transport for the chat endpoint
//! - **Server**: Axum endpoint backed by a TF-IDF FAQ matcher and an escalation log
//!
//! # Modules
//!
//! - [`widget`]: chat widget, views and the terminal front end
//! - [`client`]: transports to the chat endpoint
//! - [`types`]: wire types shared by client and server
//! - [`faq`]: FAQ index and responder
//! - [`escalation`]: escalated query log
//! - [`server`]: HTTP routes and startup

// Allow pedantic clippy warnings that don't add value for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cargo_common_metadata)]
#![allow(clippy::multiple_crate_versions)]

pub mod client;
pub mod config;
pub mod error;
pub mod escalation;
pub mod faq;
pub mod server;
pub mod types;
pub mod widget;

pub use error::{Error, Result};

use crate::config::AppConfig;
use crate::escalation::EscalationLog;
use crate::faq::FaqResponder;
use std::sync::Arc;

/// Application state shared across all handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// FAQ matcher answering chat messages.
    pub responder: Arc<FaqResponder>,
    /// Log of queries forwarded to an administrator.
    pub escalations: Arc<EscalationLog>,
    /// Global Configuration
    pub config: Arc<AppConfig>,
}
