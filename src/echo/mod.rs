//! WebSocket echo server.
//!
//! Every text or binary frame is written back unchanged on the same
//! connection. Liveness is handled according to [`EchoMode`]: either the
//! server pings the client, or each receive is time-bounded and retried.
//!
//! [`EchoMode`]: crate::config::EchoMode

mod session;

use std::{net::SocketAddr, sync::Arc};

use axum::{
    Router,
    extract::{ConnectInfo, State, WebSocketUpgrade},
    http::Uri,
    response::Response,
};
use tracing::{Instrument, info, info_span, warn};
use uuid::Uuid;

use crate::{
    config::EchoServerConfig,
    server::{FixtureServer, Lifecycle},
};
use session::EchoSession;

#[derive(Clone)]
struct EchoState {
    config: Arc<EchoServerConfig>,
    lifecycle: Lifecycle,
}

/// Accepts WebSocket upgrades on any path.
pub fn router(config: &EchoServerConfig, lifecycle: &Lifecycle) -> Router {
    let state = EchoState {
        config: Arc::new(config.clone()),
        lifecycle: lifecycle.clone(),
    };

    Router::new().fallback(upgrade).with_state(state)
}

pub async fn start(config: &EchoServerConfig) -> anyhow::Result<FixtureServer> {
    let server =
        FixtureServer::start(&config.bind_address(), |lifecycle| router(config, lifecycle)).await?;
    info!(
        addr = %server.local_addr(),
        mode = ?config.mode,
        "WebSocket echo server started"
    );
    Ok(server)
}

async fn upgrade(
    State(state): State<EchoState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    uri: Uri,
    ws: WebSocketUpgrade,
) -> Response {
    let path = uri.path().to_string();
    let EchoState { config, lifecycle } = state;

    ws.max_message_size(config.max_message_size)
        .on_failed_upgrade(move |e| warn!(%peer, "WebSocket upgrade failed: {}", e))
        .on_upgrade(move |socket| {
            let span = info_span!("ws_session", session_id = %Uuid::new_v4(), %peer);
            let session = EchoSession::new(config, lifecycle.shutdown.clone());
            lifecycle
                .tracker
                .track_future(session.run(socket, path).instrument(span))
        })
}
