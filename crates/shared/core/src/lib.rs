//! okws core
//!
//! Wire model for the exchange's push-stream socket: outbound operations,
//! the inbound envelope and control events, channel names, topic selectors
//! and the typed records each channel pushes.
//! This crate contains no async and no I/O.

pub mod channels;
pub mod error;
pub mod parse;
pub mod payloads;
pub mod request;
pub mod wire;

pub use channels::{Bar, BookDepth, Channel, Namespace, TopicKind};
pub use error::{PayloadError, RequestError};
pub use request::{
    CurrencyFilter, InstrumentFamily, InstrumentId, InstrumentType, InstrumentTypeFilter,
    TopicSelector, Unfiltered, build_args,
};
pub use wire::{
    Arg, Envelope, ErrorEvent, LoginEvent, Operation, Push, SubscribeEvent, SuccessEvent,
    UnsubscribeEvent, WsRequest,
};
