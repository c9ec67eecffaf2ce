use super::{Bar, BookDepth};
use std::fmt;

/// The two disjoint channel sets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    /// Channels served by the login endpoint
    Restricted,
    /// Channels served by the anonymous endpoint
    Open,
}

impl Namespace {
    /// Whether the namespace lives on the endpoint that requires login
    pub fn needs_auth(&self) -> bool {
        matches!(self, Namespace::Restricted)
    }
}

/// Topic type: one sink exists per kind, whatever its parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TopicKind {
    // Restricted
    Account,
    Positions,
    BalanceAndPosition,
    Orders,

    // Open
    Instruments,
    Tickers,
    OpenInterest,
    Candlesticks,
    Trades,
    EstimatedPrice,
    MarkPrice,
    MarkPriceCandlesticks,
    PriceLimit,
    OrderBook,
    OptionSummary,
    FundingRate,
    IndexCandlesticks,
    IndexTickers,
    LiquidationOrders,
}

impl TopicKind {
    pub fn namespace(&self) -> Namespace {
        match self {
            TopicKind::Account
            | TopicKind::Positions
            | TopicKind::BalanceAndPosition
            | TopicKind::Orders => Namespace::Restricted,
            _ => Namespace::Open,
        }
    }
}

/// A channel name parsed into its family and parameters
///
/// Parametrized families (`candle5m`, `mark-price-candle1H`, `books-l2-tbt`)
/// are parsed by prefix plus a validated parameter, so two families can never
/// claim the same name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Account,
    Positions,
    BalanceAndPosition,
    Orders,
    Instruments,
    Tickers,
    OpenInterest,
    Trades,
    EstimatedPrice,
    MarkPrice,
    PriceLimit,
    OptionSummary,
    FundingRate,
    IndexTickers,
    LiquidationOrders,
    Candle(Bar),
    MarkPriceCandle(Bar),
    IndexCandle(Bar),
    Books(BookDepth),
}

/// Channels whose name carries no parameter
const FIXED: &[(&str, Channel)] = &[
    ("account", Channel::Account),
    ("positions", Channel::Positions),
    ("balance_and_position", Channel::BalanceAndPosition),
    ("orders", Channel::Orders),
    ("instruments", Channel::Instruments),
    ("tickers", Channel::Tickers),
    ("open-interest", Channel::OpenInterest),
    ("trades", Channel::Trades),
    ("estimated-price", Channel::EstimatedPrice),
    ("mark-price", Channel::MarkPrice),
    ("price-limit", Channel::PriceLimit),
    ("opt-summary", Channel::OptionSummary),
    ("funding-rate", Channel::FundingRate),
    ("index-tickers", Channel::IndexTickers),
    ("liquidation-orders", Channel::LiquidationOrders),
];

const MARK_PRICE_CANDLE: &str = "mark-price-candle";
const INDEX_CANDLE: &str = "index-candle";
const CANDLE: &str = "candle";

impl Channel {
    /// Parse a wire channel name; `None` for names this client does not route
    pub fn parse(name: &str) -> Option<Self> {
        if let Some((_, channel)) = FIXED.iter().find(|(n, _)| *n == name) {
            return Some(*channel);
        }
        if let Some(bar) = name.strip_prefix(MARK_PRICE_CANDLE) {
            return Bar::parse(bar).map(Channel::MarkPriceCandle);
        }
        if let Some(bar) = name.strip_prefix(INDEX_CANDLE) {
            return Bar::parse(bar).map(Channel::IndexCandle);
        }
        if let Some(bar) = name.strip_prefix(CANDLE) {
            return Bar::parse(bar).map(Channel::Candle);
        }
        BookDepth::parse(name).map(Channel::Books)
    }

    /// Wire channel name
    pub fn name(&self) -> String {
        match self {
            Channel::Candle(bar) => format!("{CANDLE}{bar}"),
            Channel::MarkPriceCandle(bar) => format!("{MARK_PRICE_CANDLE}{bar}"),
            Channel::IndexCandle(bar) => format!("{INDEX_CANDLE}{bar}"),
            Channel::Books(depth) => depth.as_str().to_string(),
            fixed => FIXED
                .iter()
                .find(|(_, c)| c == fixed)
                .map(|(n, _)| n.to_string())
                .unwrap_or_default(),
        }
    }

    pub fn kind(&self) -> TopicKind {
        match self {
            Channel::Account => TopicKind::Account,
            Channel::Positions => TopicKind::Positions,
            Channel::BalanceAndPosition => TopicKind::BalanceAndPosition,
            Channel::Orders => TopicKind::Orders,
            Channel::Instruments => TopicKind::Instruments,
            Channel::Tickers => TopicKind::Tickers,
            Channel::OpenInterest => TopicKind::OpenInterest,
            Channel::Trades => TopicKind::Trades,
            Channel::EstimatedPrice => TopicKind::EstimatedPrice,
            Channel::MarkPrice => TopicKind::MarkPrice,
            Channel::PriceLimit => TopicKind::PriceLimit,
            Channel::OptionSummary => TopicKind::OptionSummary,
            Channel::FundingRate => TopicKind::FundingRate,
            Channel::IndexTickers => TopicKind::IndexTickers,
            Channel::LiquidationOrders => TopicKind::LiquidationOrders,
            Channel::Candle(_) => TopicKind::Candlesticks,
            Channel::MarkPriceCandle(_) => TopicKind::MarkPriceCandlesticks,
            Channel::IndexCandle(_) => TopicKind::IndexCandlesticks,
            Channel::Books(_) => TopicKind::OrderBook,
        }
    }

    pub fn namespace(&self) -> Namespace {
        self.kind().namespace()
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_names_round_trip() {
        for (name, channel) in FIXED {
            assert_eq!(Channel::parse(name), Some(*channel));
            assert_eq!(channel.name(), *name);
        }
    }

    #[test]
    fn test_candle_families() {
        assert_eq!(Channel::parse("candle5m"), Some(Channel::Candle(Bar::M5)));
        assert_eq!(
            Channel::parse("mark-price-candle1H"),
            Some(Channel::MarkPriceCandle(Bar::H1))
        );
        assert_eq!(
            Channel::parse("index-candle1D"),
            Some(Channel::IndexCandle(Bar::D1))
        );
        assert_eq!(Channel::Candle(Bar::M15).name(), "candle15m");
    }

    #[test]
    fn test_families_do_not_overlap() {
        // all three contain "candle"; each must land in its own family
        let kinds: Vec<_> = ["candle1m", "mark-price-candle1m", "index-candle1m"]
            .iter()
            .map(|n| Channel::parse(n).unwrap().kind())
            .collect();
        assert_eq!(
            kinds,
            vec![
                TopicKind::Candlesticks,
                TopicKind::MarkPriceCandlesticks,
                TopicKind::IndexCandlesticks
            ]
        );
        // "mark-price" is exact, not a family prefix
        assert_eq!(Channel::parse("mark-price"), Some(Channel::MarkPrice));
    }

    #[test]
    fn test_book_variants() {
        assert_eq!(
            Channel::parse("books-l2-tbt"),
            Some(Channel::Books(BookDepth::BooksL2Tbt))
        );
        assert_eq!(Channel::parse("books5").unwrap().kind(), TopicKind::OrderBook);
    }

    #[test]
    fn test_unknown_names() {
        assert_eq!(Channel::parse("candle7m"), None);
        assert_eq!(Channel::parse("candles"), None);
        assert_eq!(Channel::parse("status"), None);
        assert_eq!(Channel::parse(""), None);
    }

    #[test]
    fn test_namespaces() {
        assert_eq!(Channel::Orders.namespace(), Namespace::Restricted);
        assert!(Channel::BalanceAndPosition.namespace().needs_auth());
        assert_eq!(Channel::Books(BookDepth::Books).namespace(), Namespace::Open);
    }
}
