//! Wire envelopes exchanged over the socket

mod arg;
mod envelope;
mod event;
mod operation;
mod push;

pub use arg::{Arg, CHANNEL_KEY};
pub use envelope::Envelope;
pub use event::{ErrorEvent, LoginEvent, SubscribeEvent, SuccessEvent, UnsubscribeEvent};
pub use operation::{Operation, WsRequest};
pub use push::Push;

/// Outbound keepalive text
pub const PING: &str = "ping";
/// Inbound keepalive reply, never decoded
pub const PONG: &str = "pong";
