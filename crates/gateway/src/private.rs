//! Login-only channels: account, positions, balance and position, orders
//!
//! Every subscribe here goes to the authenticated session, which logs in and
//! waits for authorization before the request is written.

use crate::error::GatewayError;
use crate::sink::{Delivery, SinkSlot};
use crate::topic::{OperationSender, Topics, offer};
use okws_core::payloads::{Account, BalanceAndPosition, Order, Position};
use okws_core::{Channel, CurrencyFilter, Envelope, InstrumentTypeFilter, Push, TopicKind, Unfiltered};
use std::sync::Arc;
use tokio::sync::mpsc;

#[derive(Debug, Default)]
pub struct PrivateSinks {
    pub account: SinkSlot<Push<Account>>,
    pub positions: SinkSlot<Push<Position>>,
    pub balance_and_position: SinkSlot<Push<BalanceAndPosition>>,
    pub orders: SinkSlot<Push<Order>>,
}

impl PrivateSinks {
    pub(crate) fn route(&self, channel: Channel, env: Envelope) -> Delivery {
        match channel.kind() {
            TopicKind::Account => offer(&self.account, env),
            TopicKind::Positions => offer(&self.positions, env),
            TopicKind::BalanceAndPosition => offer(&self.balance_and_position, env),
            TopicKind::Orders => offer(&self.orders, env),
            _ => Delivery::NoSink,
        }
    }
}

/// Subscription API for the restricted namespace
#[derive(Clone)]
pub struct Private {
    topics: Topics,
    sinks: Arc<PrivateSinks>,
}

impl Private {
    pub(crate) fn new(sender: Arc<dyn OperationSender>, sinks: Arc<PrivateSinks>) -> Self {
        Self {
            topics: Topics::new(sender, true),
            sinks,
        }
    }

    pub fn sinks(&self) -> &PrivateSinks {
        &self.sinks
    }

    /// Account equity, all currencies or one
    pub async fn account(
        &self,
        filter: CurrencyFilter,
        sink: Option<mpsc::Sender<Push<Account>>>,
    ) -> Result<(), GatewayError> {
        self.topics
            .subscribe(Channel::Account, &[filter], &self.sinks.account, sink)
            .await
    }

    pub async fn unsubscribe_account(
        &self,
        filter: CurrencyFilter,
        clear_sink: bool,
    ) -> Result<(), GatewayError> {
        self.topics
            .unsubscribe(Channel::Account, &[filter], &self.sinks.account, clear_sink)
            .await
    }

    pub async fn positions(
        &self,
        filters: &[InstrumentTypeFilter],
        sink: Option<mpsc::Sender<Push<Position>>>,
    ) -> Result<(), GatewayError> {
        self.topics
            .subscribe(Channel::Positions, filters, &self.sinks.positions, sink)
            .await
    }

    pub async fn unsubscribe_positions(
        &self,
        filters: &[InstrumentTypeFilter],
        clear_sink: bool,
    ) -> Result<(), GatewayError> {
        self.topics
            .unsubscribe(Channel::Positions, filters, &self.sinks.positions, clear_sink)
            .await
    }

    pub async fn balance_and_position(
        &self,
        sink: Option<mpsc::Sender<Push<BalanceAndPosition>>>,
    ) -> Result<(), GatewayError> {
        self.topics
            .subscribe(
                Channel::BalanceAndPosition,
                &[Unfiltered],
                &self.sinks.balance_and_position,
                sink,
            )
            .await
    }

    pub async fn unsubscribe_balance_and_position(
        &self,
        clear_sink: bool,
    ) -> Result<(), GatewayError> {
        self.topics
            .unsubscribe(
                Channel::BalanceAndPosition,
                &[Unfiltered],
                &self.sinks.balance_and_position,
                clear_sink,
            )
            .await
    }

    pub async fn orders(
        &self,
        filters: &[InstrumentTypeFilter],
        sink: Option<mpsc::Sender<Push<Order>>>,
    ) -> Result<(), GatewayError> {
        self.topics
            .subscribe(Channel::Orders, filters, &self.sinks.orders, sink)
            .await
    }

    pub async fn unsubscribe_orders(
        &self,
        filters: &[InstrumentTypeFilter],
        clear_sink: bool,
    ) -> Result<(), GatewayError> {
        self.topics
            .unsubscribe(Channel::Orders, filters, &self.sinks.orders, clear_sink)
            .await
    }
}
