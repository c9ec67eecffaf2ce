//! Error types for the gateway crate

use okws_core::RequestError;
use thiserror::Error;
use tokio_tungstenite::tungstenite;

/// Failures that end a connection epoch
///
/// Except on the very first dial these never reach a caller; the session
/// supervisor absorbs them by redialing.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Connection failed: {0}")]
    Connection(#[from] tungstenite::Error),

    #[error("Write deadline of {0:?} exceeded")]
    WriteTimeout(std::time::Duration),

    #[error("No frame within the read deadline of {0:?}")]
    ReadTimeout(std::time::Duration),

    #[error("Malformed frame: {0}")]
    Protocol(#[from] serde_json::Error),

    #[error("Connection closed by peer (code {code}): {reason}")]
    Closed { code: u16, reason: String },

    #[error("Stream ended")]
    StreamEnded,

    #[error("Outbound queue closed")]
    ChannelClosed,
}

/// Caller-facing errors
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("Invalid topic request: {0}")]
    Request(#[from] RequestError),

    #[error("No credentials configured for login")]
    MissingCredentials,

    #[error("Not authorized after {0:?}")]
    AuthTimeout(std::time::Duration),

    #[error("Client has been shut down")]
    Cancelled,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Signing error: {0}")]
    Signing(String),
}
