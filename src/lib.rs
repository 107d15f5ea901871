//! Test fixtures for exercising an HTTP/WebSocket proxy: a mock streaming
//! chat-completion endpoint and a WebSocket echo server.

pub mod chat;
pub mod config;
pub mod constants;
pub mod echo;
pub mod error;
pub mod logging;
pub mod server;

pub use config::{ChatServerConfig, EchoMode, EchoServerConfig, KeepAlive};
pub use error::{ApiError, EchoError};
pub use server::{FixtureServer, Lifecycle};
