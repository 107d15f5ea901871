use std::{future, sync::Arc, time::Duration};

use axum::{
    body::Bytes,
    extract::ws::{CloseFrame, Message, Utf8Bytes, WebSocket, close_code},
};
use futures::{
    SinkExt, StreamExt,
    stream::{SplitSink, SplitStream},
};
use tokio::{
    sync::mpsc,
    task::JoinHandle,
    time::{self, Instant, Interval, MissedTickBehavior, error::Elapsed},
};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, error, info, warn};

use crate::{config::EchoServerConfig, error::EchoError};

type Sink = SplitSink<WebSocket, Message>;

/// What the frame reader hands to the echo loop.
#[derive(Debug)]
enum Inbound {
    Data(Message),
    Pong,
    Closed(Closure),
}

#[derive(Debug, PartialEq, Eq)]
enum Closure {
    Normal { code: Option<u16> },
    Abnormal(String),
}

/// Why the echo loop stopped.
#[derive(Debug, PartialEq, Eq)]
enum Ending {
    PeerClosed,
    Shutdown,
    KeepaliveTimeout,
}

pub(super) struct EchoSession {
    config: Arc<EchoServerConfig>,
    shutdown: CancellationToken,
    echoed: usize,
}

impl EchoSession {
    pub(super) fn new(config: Arc<EchoServerConfig>, shutdown: CancellationToken) -> Self {
        EchoSession {
            config,
            shutdown,
            echoed: 0,
        }
    }

    /// Never returns an error: every failure is logged here so one connection
    /// cannot affect the listener.
    pub(super) async fn run(mut self, socket: WebSocket, path: String) {
        info!(path, "New WebSocket connection");

        match self.serve(socket).await {
            Ok(()) => {}
            Err(EchoError::Send(e)) => warn!("Connection closed with error: {}", e),
            Err(e) => error!("Unexpected error in echo handler: {:?}", e),
        }

        info!(messages = self.echoed, "Connection ended");
    }

    async fn serve(&mut self, socket: WebSocket) -> Result<(), EchoError> {
        let (mut sink, stream) = socket.split();
        let (tx, mut rx) = mpsc::channel(self.config.max_queue);
        let reader = tokio::spawn(read_frames(stream, tx).in_current_span());

        let outcome = self.echo_loop(&mut sink, &mut rx).await;

        let farewell = match &outcome {
            Ok(Ending::Shutdown) => Some(CloseFrame {
                code: close_code::AWAY,
                reason: Utf8Bytes::from_static("server shutting down"),
            }),
            Ok(Ending::KeepaliveTimeout) => Some(CloseFrame {
                code: close_code::ERROR,
                reason: Utf8Bytes::from_static("keepalive ping timeout"),
            }),
            Ok(Ending::PeerClosed) | Err(_) => None,
        };
        let closed = self.close(&mut sink, &mut rx, reader, farewell).await;

        outcome?;
        closed
    }

    async fn echo_loop(
        &mut self,
        sink: &mut Sink,
        rx: &mut mpsc::Receiver<Inbound>,
    ) -> Result<Ending, EchoError> {
        let mut pings = self.config.keepalive.map(|keepalive| {
            let mut interval =
                time::interval_at(Instant::now() + keepalive.interval, keepalive.interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval
        });
        let mut pong_deadline: Option<Instant> = None;
        let receive_timeout = self.config.receive_timeout;

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => return Ok(Ending::Shutdown),
                _ = next_tick(&mut pings) => {
                    if pong_deadline.is_none() {
                        sink.send(Message::Ping(Bytes::new()))
                            .await
                            .map_err(EchoError::Send)?;
                        pong_deadline = self
                            .config
                            .keepalive
                            .map(|keepalive| Instant::now() + keepalive.timeout);
                    }
                }
                _ = wait_until(pong_deadline) => {
                    warn!("No pong received within keepalive timeout");
                    return Ok(Ending::KeepaliveTimeout);
                }
                received = next_inbound(rx, receive_timeout) => match received {
                    Err(_) => {
                        warn!(timeout = ?receive_timeout, "No message received within timeout, still waiting");
                    }
                    Ok(Some(Inbound::Data(message))) => self.echo(sink, message).await?,
                    Ok(Some(Inbound::Pong)) => pong_deadline = None,
                    Ok(Some(Inbound::Closed(Closure::Normal { code }))) => {
                        info!(?code, messages = self.echoed, "Connection closed normally");
                        return Ok(Ending::PeerClosed);
                    }
                    Ok(Some(Inbound::Closed(Closure::Abnormal(reason)))) => {
                        warn!(messages = self.echoed, "Connection closed with error: {}", reason);
                        return Ok(Ending::PeerClosed);
                    }
                    Ok(None) => return Ok(Ending::PeerClosed),
                },
            }
        }
    }

    async fn echo(&mut self, sink: &mut Sink, message: Message) -> Result<(), EchoError> {
        let (kind, bytes) = match &message {
            Message::Text(text) => ("text", text.as_str().len()),
            Message::Binary(data) => ("binary", data.len()),
            _ => return Ok(()),
        };

        sink.send(message).await.map_err(EchoError::Send)?;
        self.echoed += 1;
        info!(kind, bytes, "Echoed message");
        Ok(())
    }

    /// Runs the close handshake, bounded by the configured close timeout.
    /// `farewell` is sent when the server is the side ending the session.
    async fn close(
        &self,
        sink: &mut Sink,
        rx: &mut mpsc::Receiver<Inbound>,
        reader: JoinHandle<()>,
        farewell: Option<CloseFrame>,
    ) -> Result<(), EchoError> {
        let close_timeout = self.config.close_timeout;
        let handshake = async {
            if let Some(frame) = farewell {
                if let Err(e) = sink.send(Message::Close(Some(frame))).await {
                    debug!("Failed to send close frame: {}", e);
                    return;
                }
                // Frames still in flight are dropped while waiting for the reply.
                while let Some(inbound) = rx.recv().await {
                    if let Inbound::Closed(closure) = inbound {
                        debug!(?closure, "Peer answered close");
                        break;
                    }
                }
            }
            if let Err(e) = sink.close().await {
                debug!("Failed to flush close handshake: {}", e);
            }
        };

        if time::timeout(close_timeout, handshake).await.is_err() {
            warn!(timeout = ?close_timeout, "Close handshake timed out");
        }

        if !reader.is_finished() {
            reader.abort();
        }
        match reader.await {
            Err(e) if !e.is_cancelled() => Err(EchoError::Reader(e)),
            _ => Ok(()),
        }
    }
}

/// Pulls frames off the socket into the bounded queue. A full queue blocks
/// here, which stops socket reads until the echo loop catches up.
async fn read_frames(mut stream: SplitStream<WebSocket>, tx: mpsc::Sender<Inbound>) {
    loop {
        let inbound = match stream.next().await {
            Some(Ok(message @ (Message::Text(_) | Message::Binary(_)))) => Inbound::Data(message),
            Some(Ok(Message::Pong(_))) => Inbound::Pong,
            // answered by the protocol layer
            Some(Ok(Message::Ping(_))) => continue,
            Some(Ok(Message::Close(frame))) => Inbound::Closed(classify_close(frame.as_ref())),
            Some(Err(e)) => Inbound::Closed(Closure::Abnormal(e.to_string())),
            None => Inbound::Closed(Closure::Abnormal(
                "connection dropped without a close frame".to_string(),
            )),
        };

        let last = matches!(inbound, Inbound::Closed(_));
        if tx.send(inbound).await.is_err() || last {
            break;
        }
    }
}

fn classify_close(frame: Option<&CloseFrame>) -> Closure {
    match frame.map(|frame| frame.code) {
        None => Closure::Normal { code: None },
        Some(code @ (close_code::NORMAL | close_code::AWAY)) => Closure::Normal { code: Some(code) },
        Some(code) => Closure::Abnormal(format!("close code {code}")),
    }
}

async fn next_tick(pings: &mut Option<Interval>) {
    match pings {
        Some(interval) => {
            interval.tick().await;
        }
        None => future::pending().await,
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => time::sleep_until(deadline).await,
        None => future::pending().await,
    }
}

async fn next_inbound(
    rx: &mut mpsc::Receiver<Inbound>,
    timeout: Option<Duration>,
) -> Result<Option<Inbound>, Elapsed> {
    match timeout {
        Some(limit) => time::timeout(limit, rx.recv()).await,
        None => Ok(rx.recv().await),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(code: u16) -> CloseFrame {
        CloseFrame {
            code,
            reason: Utf8Bytes::from_static(""),
        }
    }

    #[test]
    fn close_without_status_is_normal() {
        assert_eq!(classify_close(None), Closure::Normal { code: None });
    }

    #[test]
    fn normal_and_going_away_codes_are_normal() {
        assert_eq!(
            classify_close(Some(&frame(close_code::NORMAL))),
            Closure::Normal { code: Some(1000) }
        );
        assert_eq!(
            classify_close(Some(&frame(close_code::AWAY))),
            Closure::Normal { code: Some(1001) }
        );
    }

    #[test]
    fn other_codes_are_abnormal() {
        assert_eq!(
            classify_close(Some(&frame(close_code::PROTOCOL))),
            Closure::Abnormal("close code 1002".to_string())
        );
        assert!(matches!(
            classify_close(Some(&frame(close_code::SIZE))),
            Closure::Abnormal(_)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn receive_timeout_elapses_without_closing_queue() {
        let (tx, mut rx) = mpsc::channel(1);

        let waited = next_inbound(&mut rx, Some(Duration::from_secs(60))).await;
        assert!(waited.is_err());

        tx.send(Inbound::Pong).await.unwrap();
        let received = next_inbound(&mut rx, Some(Duration::from_secs(60))).await;
        assert!(matches!(received, Ok(Some(Inbound::Pong))));
    }

    #[tokio::test]
    async fn unbounded_receive_reports_closed_queue() {
        let (tx, mut rx) = mpsc::channel::<Inbound>(1);
        drop(tx);
        assert!(matches!(next_inbound(&mut rx, None).await, Ok(None)));
    }
}
