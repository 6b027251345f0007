use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Request, State},
    http::StatusCode,
    middleware::Next,
    response::IntoResponse,
    routing::{get, get_service, post},
};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use tracing::{error, info};

use crate::AppState;
use crate::config::AppConfig;
use crate::escalation::{EscalationLog, EscalationRecord};
use crate::faq::{FaqResponder, Verdict};
use crate::types::{ChatReply, ChatRequest};

/// Reply to a blank message.
pub const EMPTY_MESSAGE_REPLY: &str = "Please type a question so I can help you.";

/// Reply to a message that was forwarded to an administrator.
pub const ESCALATED_REPLY: &str = "I'm not completely sure about this. \
I have forwarded your query to the administration team. \
They will get back to you soon.";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const BODY_LIMIT: usize = 64 * 1024;

/// Load the FAQ file and build the shared application state.
pub async fn build_state(config: Arc<AppConfig>) -> anyhow::Result<AppState> {
    let responder = FaqResponder::load(&config.faq.path, config.faq.similarity_threshold)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to load FAQ file {}: {e}", config.faq.path))?;

    info!(
        name: "faq.loaded",
        path = %config.faq.path,
        entries = responder.entries().len(),
        threshold = responder.threshold(),
        "FAQ index built"
    );

    Ok(AppState {
        responder: Arc::new(responder),
        escalations: Arc::new(EscalationLog::new(&config.escalation.path)),
        config,
    })
}

/// Build the router with all routes and middleware.
pub fn router(state: AppState) -> Router {
    // A year-long timeout stands in for "disabled" so the layer type stays fixed.
    let timeout_duration = if state.config.resilience.timeout_disabled {
        Duration::from_secs(365 * 24 * 60 * 60)
    } else {
        REQUEST_TIMEOUT
    };

    let static_dir = Path::new(&state.config.server.static_dir);

    Router::new()
        .route("/", get_service(ServeFile::new(static_dir.join("index.html"))))
        .nest_service("/static", ServeDir::new(static_dir))
        .route("/api/chat", post(api_chat))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .layer(axum::middleware::from_fn(
            move |req: Request, next: Next| async move {
                match tokio::time::timeout(timeout_duration, next.run(req)).await {
                    Ok(res) => res,
                    Err(_) => (StatusCode::REQUEST_TIMEOUT, "Request timed out").into_response(),
                }
            },
        ))
        .with_state(state)
}

/// Start the Axum server with the provided configuration.
pub async fn start_server(config: Arc<AppConfig>) -> anyhow::Result<()> {
    let state = build_state(Arc::clone(&config)).await?;
    let app = router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(
        name: "server.started",
        address = %addr,
        "Server started"
    );

    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// API Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// POST /api/chat - Answer from the FAQ or escalate.
async fn api_chat(State(state): State<AppState>, Json(req): Json<ChatRequest>) -> Json<ChatReply> {
    let message = req.message.trim();

    let reply = match state.responder.respond(message) {
        Verdict::Empty => ChatReply::answered(EMPTY_MESSAGE_REPLY, 0.0),
        Verdict::Answered(found) => {
            info!(
                name: "chat.answered",
                faq_id = %found.entry.id,
                similarity = found.score,
                "Answered from FAQ"
            );
            ChatReply::answered(found.entry.answer.clone(), found.score)
        }
        Verdict::Escalate { score, best } => {
            let record = EscalationRecord::now(message, score, best.map(|e| e.id.clone()));
            if let Err(e) = state.escalations.record(record).await {
                error!(
                    name: "escalation.write_failed",
                    path = %state.escalations.path().display(),
                    error = %e,
                    "Failed to record escalation"
                );
            }
            ChatReply::escalated(ESCALATED_REPLY, score)
        }
    };

    Json(reply)
}

/// GET /health - Liveness check.
async fn health() -> &'static str {
    "ok"
}
