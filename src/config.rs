use std::time::Duration;

use clap::ValueEnum;

use crate::constants::{
    CLOSE_TIMEOUT_SECS, DEFAULT_CHAT_HOST, DEFAULT_CHAT_PORT, DEFAULT_CHUNK_DELAY_MS,
    DEFAULT_ECHO_HOST, DEFAULT_ECHO_PORT, MAX_INBOUND_QUEUE, MAX_MESSAGE_SIZE, PING_INTERVAL_SECS,
    PING_TIMEOUT_SECS, RECEIVE_TIMEOUT_SECS,
};

/// Settings for the mock chat-completion server.
#[derive(Debug, Clone)]
pub struct ChatServerConfig {
    pub host: String,
    pub port: u16,
    /// Pause after each streamed word chunk.
    pub chunk_delay: Duration,
}

impl Default for ChatServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_CHAT_HOST.to_string(),
            port: DEFAULT_CHAT_PORT,
            chunk_delay: Duration::from_millis(DEFAULT_CHUNK_DELAY_MS),
        }
    }
}

impl ChatServerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_chunk_delay(mut self, delay: Duration) -> Self {
        self.chunk_delay = delay;
        self
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// How an echo session keeps itself alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum EchoMode {
    /// Server sends periodic pings and receives wait indefinitely.
    #[default]
    Keepalive,
    /// No server pings; each receive is time-bounded and retried on expiry.
    ReceiveTimeout,
}

/// Server-initiated ping settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeepAlive {
    pub interval: Duration,
    pub timeout: Duration,
}

/// Settings for the WebSocket echo server.
#[derive(Debug, Clone)]
pub struct EchoServerConfig {
    pub host: String,
    pub port: u16,
    pub mode: EchoMode,
    /// `None` disables server pings and leaves liveness to the client.
    pub keepalive: Option<KeepAlive>,
    /// `None` waits for the next frame without a bound.
    pub receive_timeout: Option<Duration>,
    pub close_timeout: Duration,
    pub max_message_size: usize,
    /// Depth of the inbound queue between the socket reader and the echo loop.
    pub max_queue: usize,
}

impl Default for EchoServerConfig {
    fn default() -> Self {
        Self::for_mode(EchoMode::default())
    }
}

impl EchoServerConfig {
    pub fn for_mode(mode: EchoMode) -> Self {
        let (keepalive, receive_timeout) = match mode {
            EchoMode::Keepalive => (
                Some(KeepAlive {
                    interval: Duration::from_secs(PING_INTERVAL_SECS),
                    timeout: Duration::from_secs(PING_TIMEOUT_SECS),
                }),
                None,
            ),
            EchoMode::ReceiveTimeout => (None, Some(Duration::from_secs(RECEIVE_TIMEOUT_SECS))),
        };

        Self {
            host: DEFAULT_ECHO_HOST.to_string(),
            port: DEFAULT_ECHO_PORT,
            mode,
            keepalive,
            receive_timeout,
            close_timeout: Duration::from_secs(CLOSE_TIMEOUT_SECS),
            max_message_size: MAX_MESSAGE_SIZE,
            max_queue: MAX_INBOUND_QUEUE,
        }
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_keepalive(mut self, keepalive: Option<KeepAlive>) -> Self {
        self.keepalive = keepalive;
        self
    }

    pub fn with_receive_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.receive_timeout = timeout;
        self
    }

    pub fn with_close_timeout(mut self, timeout: Duration) -> Self {
        self.close_timeout = timeout;
        self
    }

    pub fn with_max_message_size(mut self, size: usize) -> Self {
        self.max_message_size = size;
        self
    }

    pub fn with_max_queue(mut self, depth: usize) -> Self {
        // mpsc::channel panics on zero capacity
        self.max_queue = depth.max(1);
        self
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
