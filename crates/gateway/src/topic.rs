//! Plumbing shared by the two namespaces: the capability used to send
//! operations and the generic subscribe/unsubscribe/offer steps

use crate::error::GatewayError;
use crate::sink::{Delivery, SinkSlot};
use async_trait::async_trait;
use okws_core::{Channel, Envelope, Push, TopicSelector, WsRequest, build_args};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Narrow capability handed to the namespaces: put one operation on the
/// session selected by `needs_auth`
#[async_trait]
pub trait OperationSender: Send + Sync {
    async fn send_operation(&self, needs_auth: bool, req: WsRequest) -> Result<(), GatewayError>;
}

/// Decode a push frame for `slot`; frames for unregistered topics are not
/// decoded at all
pub(crate) fn offer<T: DeserializeOwned>(slot: &SinkSlot<Push<T>>, env: Envelope) -> Delivery {
    if !slot.is_set() {
        return Delivery::NoSink;
    }
    match Push::<T>::decode(env) {
        Ok(push) => slot.deliver(push),
        Err(e) => Delivery::Undecodable(e.to_string()),
    }
}

#[derive(Clone)]
pub(crate) struct Topics {
    sender: Arc<dyn OperationSender>,
    needs_auth: bool,
}

impl Topics {
    pub(crate) fn new(sender: Arc<dyn OperationSender>, needs_auth: bool) -> Self {
        Self { sender, needs_auth }
    }

    /// One subscribe operation with one argument per selector. The sink is
    /// registered before the request goes out so the first push is not lost.
    pub(crate) async fn subscribe<S, T>(
        &self,
        channel: Channel,
        selectors: &[S],
        slot: &SinkSlot<Push<T>>,
        sink: Option<mpsc::Sender<Push<T>>>,
    ) -> Result<(), GatewayError>
    where
        S: TopicSelector + Sync,
        T: Send,
    {
        let args = build_args(channel, selectors)?;
        if let Some(sink) = sink {
            slot.set(sink);
        }
        self.sender
            .send_operation(self.needs_auth, WsRequest::subscribe(args))
            .await
    }

    pub(crate) async fn unsubscribe<S, T>(
        &self,
        channel: Channel,
        selectors: &[S],
        slot: &SinkSlot<Push<T>>,
        clear_sink: bool,
    ) -> Result<(), GatewayError>
    where
        S: TopicSelector + Sync,
        T: Send,
    {
        let args = build_args(channel, selectors)?;
        if clear_sink {
            slot.clear();
        }
        self.sender
            .send_operation(self.needs_auth, WsRequest::unsubscribe(args))
            .await
    }
}
