//! Anonymous channels

use crate::error::GatewayError;
use crate::sink::{Delivery, SinkSlot};
use crate::topic::{OperationSender, Topics, offer};
use okws_core::payloads::{
    Candle, EstimatedPrice, FundingRate, IndexTicker, Instrument, LiquidationOrder, MarkPrice,
    OpenInterest, OptionSummary, OrderBook, PriceLimit, Ticker, Trade,
};
use okws_core::{
    Bar, BookDepth, Channel, Envelope, InstrumentFamily, InstrumentId, InstrumentTypeFilter, Push,
    TopicKind,
};
use std::sync::Arc;
use tokio::sync::mpsc;

/// One sink per topic type; every bar size of a candlestick family and every
/// depth variant of the order book share their family's sink
#[derive(Debug, Default)]
pub struct PublicSinks {
    pub instruments: SinkSlot<Push<Instrument>>,
    pub tickers: SinkSlot<Push<Ticker>>,
    pub open_interest: SinkSlot<Push<OpenInterest>>,
    pub candlesticks: SinkSlot<Push<Candle>>,
    pub trades: SinkSlot<Push<Trade>>,
    pub estimated_price: SinkSlot<Push<EstimatedPrice>>,
    pub mark_price: SinkSlot<Push<MarkPrice>>,
    pub mark_price_candlesticks: SinkSlot<Push<Candle>>,
    pub price_limit: SinkSlot<Push<PriceLimit>>,
    pub order_book: SinkSlot<Push<OrderBook>>,
    pub option_summary: SinkSlot<Push<OptionSummary>>,
    pub funding_rate: SinkSlot<Push<FundingRate>>,
    pub index_candlesticks: SinkSlot<Push<Candle>>,
    pub index_tickers: SinkSlot<Push<IndexTicker>>,
    pub liquidation_orders: SinkSlot<Push<LiquidationOrder>>,
}

impl PublicSinks {
    pub(crate) fn route(&self, channel: Channel, env: Envelope) -> Delivery {
        match channel.kind() {
            TopicKind::Instruments => offer(&self.instruments, env),
            TopicKind::Tickers => offer(&self.tickers, env),
            TopicKind::OpenInterest => offer(&self.open_interest, env),
            TopicKind::Candlesticks => offer(&self.candlesticks, env),
            TopicKind::Trades => offer(&self.trades, env),
            TopicKind::EstimatedPrice => offer(&self.estimated_price, env),
            TopicKind::MarkPrice => offer(&self.mark_price, env),
            TopicKind::MarkPriceCandlesticks => offer(&self.mark_price_candlesticks, env),
            TopicKind::PriceLimit => offer(&self.price_limit, env),
            TopicKind::OrderBook => offer(&self.order_book, env),
            TopicKind::OptionSummary => offer(&self.option_summary, env),
            TopicKind::FundingRate => offer(&self.funding_rate, env),
            TopicKind::IndexCandlesticks => offer(&self.index_candlesticks, env),
            TopicKind::IndexTickers => offer(&self.index_tickers, env),
            TopicKind::LiquidationOrders => offer(&self.liquidation_orders, env),
            TopicKind::Account
            | TopicKind::Positions
            | TopicKind::BalanceAndPosition
            | TopicKind::Orders => Delivery::NoSink,
        }
    }
}

/// Subscription API for the open namespace
#[derive(Clone)]
pub struct Public {
    topics: Topics,
    sinks: Arc<PublicSinks>,
}

impl Public {
    pub(crate) fn new(sender: Arc<dyn OperationSender>, sinks: Arc<PublicSinks>) -> Self {
        Self {
            topics: Topics::new(sender, false),
            sinks,
        }
    }

    pub fn sinks(&self) -> &PublicSinks {
        &self.sinks
    }

    pub async fn instruments(
        &self,
        filters: &[InstrumentTypeFilter],
        sink: Option<mpsc::Sender<Push<Instrument>>>,
    ) -> Result<(), GatewayError> {
        self.topics
            .subscribe(Channel::Instruments, filters, &self.sinks.instruments, sink)
            .await
    }

    pub async fn unsubscribe_instruments(
        &self,
        filters: &[InstrumentTypeFilter],
        clear_sink: bool,
    ) -> Result<(), GatewayError> {
        self.topics
            .unsubscribe(Channel::Instruments, filters, &self.sinks.instruments, clear_sink)
            .await
    }

    pub async fn tickers(
        &self,
        instruments: &[InstrumentId],
        sink: Option<mpsc::Sender<Push<Ticker>>>,
    ) -> Result<(), GatewayError> {
        self.topics
            .subscribe(Channel::Tickers, instruments, &self.sinks.tickers, sink)
            .await
    }

    pub async fn unsubscribe_tickers(
        &self,
        instruments: &[InstrumentId],
        clear_sink: bool,
    ) -> Result<(), GatewayError> {
        self.topics
            .unsubscribe(Channel::Tickers, instruments, &self.sinks.tickers, clear_sink)
            .await
    }

    pub async fn open_interest(
        &self,
        instruments: &[InstrumentId],
        sink: Option<mpsc::Sender<Push<OpenInterest>>>,
    ) -> Result<(), GatewayError> {
        self.topics
            .subscribe(Channel::OpenInterest, instruments, &self.sinks.open_interest, sink)
            .await
    }

    pub async fn unsubscribe_open_interest(
        &self,
        instruments: &[InstrumentId],
        clear_sink: bool,
    ) -> Result<(), GatewayError> {
        self.topics
            .unsubscribe(
                Channel::OpenInterest,
                instruments,
                &self.sinks.open_interest,
                clear_sink,
            )
            .await
    }

    pub async fn candlesticks(
        &self,
        bar: Bar,
        instruments: &[InstrumentId],
        sink: Option<mpsc::Sender<Push<Candle>>>,
    ) -> Result<(), GatewayError> {
        self.topics
            .subscribe(Channel::Candle(bar), instruments, &self.sinks.candlesticks, sink)
            .await
    }

    pub async fn unsubscribe_candlesticks(
        &self,
        bar: Bar,
        instruments: &[InstrumentId],
        clear_sink: bool,
    ) -> Result<(), GatewayError> {
        self.topics
            .unsubscribe(
                Channel::Candle(bar),
                instruments,
                &self.sinks.candlesticks,
                clear_sink,
            )
            .await
    }

    pub async fn trades(
        &self,
        instruments: &[InstrumentId],
        sink: Option<mpsc::Sender<Push<Trade>>>,
    ) -> Result<(), GatewayError> {
        self.topics
            .subscribe(Channel::Trades, instruments, &self.sinks.trades, sink)
            .await
    }

    pub async fn unsubscribe_trades(
        &self,
        instruments: &[InstrumentId],
        clear_sink: bool,
    ) -> Result<(), GatewayError> {
        self.topics
            .unsubscribe(Channel::Trades, instruments, &self.sinks.trades, clear_sink)
            .await
    }

    /// Delivery/exercise price estimates; futures and options only
    pub async fn estimated_price(
        &self,
        filters: &[InstrumentTypeFilter],
        sink: Option<mpsc::Sender<Push<EstimatedPrice>>>,
    ) -> Result<(), GatewayError> {
        self.topics
            .subscribe(Channel::EstimatedPrice, filters, &self.sinks.estimated_price, sink)
            .await
    }

    pub async fn unsubscribe_estimated_price(
        &self,
        filters: &[InstrumentTypeFilter],
        clear_sink: bool,
    ) -> Result<(), GatewayError> {
        self.topics
            .unsubscribe(
                Channel::EstimatedPrice,
                filters,
                &self.sinks.estimated_price,
                clear_sink,
            )
            .await
    }

    pub async fn mark_price(
        &self,
        instruments: &[InstrumentId],
        sink: Option<mpsc::Sender<Push<MarkPrice>>>,
    ) -> Result<(), GatewayError> {
        self.topics
            .subscribe(Channel::MarkPrice, instruments, &self.sinks.mark_price, sink)
            .await
    }

    pub async fn unsubscribe_mark_price(
        &self,
        instruments: &[InstrumentId],
        clear_sink: bool,
    ) -> Result<(), GatewayError> {
        self.topics
            .unsubscribe(Channel::MarkPrice, instruments, &self.sinks.mark_price, clear_sink)
            .await
    }

    pub async fn mark_price_candlesticks(
        &self,
        bar: Bar,
        instruments: &[InstrumentId],
        sink: Option<mpsc::Sender<Push<Candle>>>,
    ) -> Result<(), GatewayError> {
        self.topics
            .subscribe(
                Channel::MarkPriceCandle(bar),
                instruments,
                &self.sinks.mark_price_candlesticks,
                sink,
            )
            .await
    }

    pub async fn unsubscribe_mark_price_candlesticks(
        &self,
        bar: Bar,
        instruments: &[InstrumentId],
        clear_sink: bool,
    ) -> Result<(), GatewayError> {
        self.topics
            .unsubscribe(
                Channel::MarkPriceCandle(bar),
                instruments,
                &self.sinks.mark_price_candlesticks,
                clear_sink,
            )
            .await
    }

    pub async fn price_limit(
        &self,
        instruments: &[InstrumentId],
        sink: Option<mpsc::Sender<Push<PriceLimit>>>,
    ) -> Result<(), GatewayError> {
        self.topics
            .subscribe(Channel::PriceLimit, instruments, &self.sinks.price_limit, sink)
            .await
    }

    pub async fn unsubscribe_price_limit(
        &self,
        instruments: &[InstrumentId],
        clear_sink: bool,
    ) -> Result<(), GatewayError> {
        self.topics
            .unsubscribe(Channel::PriceLimit, instruments, &self.sinks.price_limit, clear_sink)
            .await
    }

    pub async fn order_book(
        &self,
        depth: BookDepth,
        instruments: &[InstrumentId],
        sink: Option<mpsc::Sender<Push<OrderBook>>>,
    ) -> Result<(), GatewayError> {
        self.topics
            .subscribe(Channel::Books(depth), instruments, &self.sinks.order_book, sink)
            .await
    }

    pub async fn unsubscribe_order_book(
        &self,
        depth: BookDepth,
        instruments: &[InstrumentId],
        clear_sink: bool,
    ) -> Result<(), GatewayError> {
        self.topics
            .unsubscribe(
                Channel::Books(depth),
                instruments,
                &self.sinks.order_book,
                clear_sink,
            )
            .await
    }

    pub async fn option_summary(
        &self,
        families: &[InstrumentFamily],
        sink: Option<mpsc::Sender<Push<OptionSummary>>>,
    ) -> Result<(), GatewayError> {
        self.topics
            .subscribe(Channel::OptionSummary, families, &self.sinks.option_summary, sink)
            .await
    }

    pub async fn unsubscribe_option_summary(
        &self,
        families: &[InstrumentFamily],
        clear_sink: bool,
    ) -> Result<(), GatewayError> {
        self.topics
            .unsubscribe(
                Channel::OptionSummary,
                families,
                &self.sinks.option_summary,
                clear_sink,
            )
            .await
    }

    pub async fn funding_rate(
        &self,
        instruments: &[InstrumentId],
        sink: Option<mpsc::Sender<Push<FundingRate>>>,
    ) -> Result<(), GatewayError> {
        self.topics
            .subscribe(Channel::FundingRate, instruments, &self.sinks.funding_rate, sink)
            .await
    }

    pub async fn unsubscribe_funding_rate(
        &self,
        instruments: &[InstrumentId],
        clear_sink: bool,
    ) -> Result<(), GatewayError> {
        self.topics
            .unsubscribe(
                Channel::FundingRate,
                instruments,
                &self.sinks.funding_rate,
                clear_sink,
            )
            .await
    }

    /// Index candlesticks; `instruments` are index ids such as `BTC-USD`
    pub async fn index_candlesticks(
        &self,
        bar: Bar,
        instruments: &[InstrumentId],
        sink: Option<mpsc::Sender<Push<Candle>>>,
    ) -> Result<(), GatewayError> {
        self.topics
            .subscribe(
                Channel::IndexCandle(bar),
                instruments,
                &self.sinks.index_candlesticks,
                sink,
            )
            .await
    }

    pub async fn unsubscribe_index_candlesticks(
        &self,
        bar: Bar,
        instruments: &[InstrumentId],
        clear_sink: bool,
    ) -> Result<(), GatewayError> {
        self.topics
            .unsubscribe(
                Channel::IndexCandle(bar),
                instruments,
                &self.sinks.index_candlesticks,
                clear_sink,
            )
            .await
    }

    pub async fn index_tickers(
        &self,
        instruments: &[InstrumentId],
        sink: Option<mpsc::Sender<Push<IndexTicker>>>,
    ) -> Result<(), GatewayError> {
        self.topics
            .subscribe(Channel::IndexTickers, instruments, &self.sinks.index_tickers, sink)
            .await
    }

    pub async fn unsubscribe_index_tickers(
        &self,
        instruments: &[InstrumentId],
        clear_sink: bool,
    ) -> Result<(), GatewayError> {
        self.topics
            .unsubscribe(
                Channel::IndexTickers,
                instruments,
                &self.sinks.index_tickers,
                clear_sink,
            )
            .await
    }

    pub async fn liquidation_orders(
        &self,
        filters: &[InstrumentTypeFilter],
        sink: Option<mpsc::Sender<Push<LiquidationOrder>>>,
    ) -> Result<(), GatewayError> {
        self.topics
            .subscribe(
                Channel::LiquidationOrders,
                filters,
                &self.sinks.liquidation_orders,
                sink,
            )
            .await
    }

    pub async fn unsubscribe_liquidation_orders(
        &self,
        filters: &[InstrumentTypeFilter],
        clear_sink: bool,
    ) -> Result<(), GatewayError> {
        self.topics
            .unsubscribe(
                Channel::LiquidationOrders,
                filters,
                &self.sinks.liquidation_orders,
                clear_sink,
            )
            .await
    }
}
