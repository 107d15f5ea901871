//! Mock OpenAI-style chat-completion endpoint.
//!
//! Serves `POST /v1/chat/completions` with either an SSE word-by-word stream
//! or a single JSON completion. All content is fixed; only the request's
//! `stream` flag is consulted.

pub mod models;
pub mod stream;

use std::{net::SocketAddr, sync::Arc, time::Duration};

use axum::{
    Json, Router,
    body::Bytes,
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, HeaderValue, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::post,
};
use tracing::{debug, info};

use crate::{
    config::ChatServerConfig, constants::CHAT_COMPLETIONS_PATH, error::ApiError,
    server::FixtureServer,
};
use models::{ChatCompletion, ChatCompletionsRequest};

#[derive(Debug, Clone)]
pub struct ChatState {
    pub chunk_delay: Duration,
}

impl From<&ChatServerConfig> for ChatState {
    fn from(config: &ChatServerConfig) -> Self {
        ChatState {
            chunk_delay: config.chunk_delay,
        }
    }
}

pub fn router(config: &ChatServerConfig) -> Router {
    let state = Arc::new(ChatState::from(config));

    Router::new()
        .route(CHAT_COMPLETIONS_PATH, post(chat_completions))
        .fallback(not_found)
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}

/// Binds the configured address and serves the mock endpoint.
pub async fn start(config: &ChatServerConfig) -> anyhow::Result<FixtureServer> {
    let app = router(config);
    let server = FixtureServer::start(&config.bind_address(), |_| app).await?;
    info!(addr = %server.local_addr(), path = CHAT_COMPLETIONS_PATH, "mock chat-completion server listening");
    Ok(server)
}

async fn chat_completions(
    State(state): State<Arc<ChatState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    if !headers.contains_key(header::CONTENT_LENGTH) {
        return Err(ApiError::LengthRequired);
    }

    let request: ChatCompletionsRequest = serde_json::from_slice(&body)?;
    debug!(
        stream = request.stream,
        messages = request.message_count(),
        model = request.model_name().unwrap_or_default(),
        "chat completion request"
    );

    if request.stream {
        let sse = stream::stream_chat_completion(state.chunk_delay);
        Ok((
            [(header::CONNECTION, HeaderValue::from_static("keep-alive"))],
            sse,
        )
            .into_response())
    } else {
        Ok(Json(ChatCompletion::mock()).into_response())
    }
}

async fn not_found() -> ApiError {
    ApiError::NotFound
}

/// Logs every handled request once its response status is known.
async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_else(|| "-".to_string());

    let response = next.run(request).await;

    info!(
        %peer,
        %method,
        %uri,
        status = response.status().as_u16(),
        "handled request"
    );
    response
}
