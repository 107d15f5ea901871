//! Listener lifecycle shared by both fixture servers.

use std::net::SocketAddr;

use anyhow::Context;
use axum::Router;
use tokio::{net::TcpListener, task::JoinHandle};
use tokio_util::{sync::CancellationToken, task::TaskTracker};
use tracing::info;

/// Handles a router can hold on to so long-lived work (upgraded WebSocket
/// sessions) observes shutdown and is awaited by [`FixtureServer::stop`].
#[derive(Debug, Clone, Default)]
pub struct Lifecycle {
    pub shutdown: CancellationToken,
    pub tracker: TaskTracker,
}

/// A bound, running server. Dropping it leaves the listener running;
/// call [`FixtureServer::stop`] for an orderly shutdown.
pub struct FixtureServer {
    local_addr: SocketAddr,
    lifecycle: Lifecycle,
    serve_task: JoinHandle<std::io::Result<()>>,
}

impl FixtureServer {
    pub async fn start<F>(bind_addr: &str, build_router: F) -> anyhow::Result<Self>
    where
        F: FnOnce(&Lifecycle) -> Router,
    {
        let listener = TcpListener::bind(bind_addr)
            .await
            .with_context(|| format!("failed to bind {bind_addr}"))?;
        let local_addr = listener.local_addr()?;

        let lifecycle = Lifecycle::default();
        let app = build_router(&lifecycle);
        let shutdown = lifecycle.shutdown.clone().cancelled_owned();

        let serve_task = tokio::spawn(async move {
            axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .with_graceful_shutdown(shutdown)
            .await
        });

        Ok(Self {
            local_addr,
            lifecycle,
            serve_task,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stops accepting connections, then waits for in-flight requests and
    /// tracked sessions to finish.
    pub async fn stop(self) -> anyhow::Result<()> {
        info!(addr = %self.local_addr, "shutting down server");
        self.lifecycle.shutdown.cancel();

        self.serve_task
            .await
            .context("server task panicked")?
            .context("server loop failed")?;

        self.lifecycle.tracker.close();
        self.lifecycle.tracker.wait().await;

        info!(addr = %self.local_addr, "server stopped");
        Ok(())
    }

    /// Runs until Ctrl-C (or SIGTERM on Unix), then stops.
    pub async fn run_until_signal(self) -> anyhow::Result<()> {
        shutdown_signal().await;
        self.stop().await
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
