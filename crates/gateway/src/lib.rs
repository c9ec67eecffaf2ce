//! okws gateway
//!
//! Session engine for the exchange's push-stream socket. Provides:
//! - Connection manager with lazy dial, redial on failure and single replay
//! - Login signing with a throttled retry and a bounded authorization wait
//! - Keepalive ping, write and read deadlines
//! - Frame classification and non-blocking delivery to caller-owned sinks
//! - Typed subscribe/unsubscribe APIs for the restricted and open namespaces
//!
//! ## Architecture
//!
//! ```text
//!   WsClient ──► Private / Public ──(OperationSender)──► Connector
//!                                                           │
//!                                          ┌────────────────┴───────────────┐
//!                                     Session (login)                 Session (anon)
//!                                     sender │ receiver               sender │ receiver
//!                                            ▼                               ▼
//!                                          Router ──► control / private / public sinks
//! ```
//!
//! ## Sinks
//!
//! Sinks are bounded `tokio::sync::mpsc::Sender`s owned by the caller, one
//! per topic type. Delivery never blocks the read loop: when a sink is full
//! the frame is dropped and counted, when it is closed it is unregistered.

pub mod auth;
pub mod client;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod private;
pub mod public;
pub mod session;
pub mod sink;
pub mod topic;

// Re-export commonly used types
pub use auth::{AuthState, AuthStatus, Authenticator, LoginOutcome, Signer};
pub use client::{Connector, WsClient};
pub use config::{
    ClientConfig, ConfigError, Credentials, Destination, load_config, load_config_from_str,
};
pub use dispatch::{FrameKind, Router, classify};
pub use error::{GatewayError, TransportError};
pub use private::{Private, PrivateSinks};
pub use public::{Public, PublicSinks};
pub use session::Session;
pub use sink::{ControlSinks, Delivery, DeliveryStats, SinkSlot};
pub use topic::OperationSender;

pub use okws_core;
