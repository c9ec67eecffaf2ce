//! Typed records carried in the `data` array of push frames

pub mod private;
pub mod public;

pub use private::{
    Account, AccountDetail, BalanceAndPosition, BalanceData, Order, Position, PositionData,
};
pub use public::{
    BookLevel, Candle, EstimatedPrice, FundingRate, IndexTicker, Instrument, LiquidationDetail,
    LiquidationOrder, MarkPrice, OpenInterest, OptionSummary, OrderBook, PriceLimit, Ticker,
    Trade,
};
