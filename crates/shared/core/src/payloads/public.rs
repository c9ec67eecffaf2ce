//! Records pushed on the anonymous channels

use crate::error::PayloadError;
use crate::parse::{
    deserialize_optional_decimal as opt_decimal,
    deserialize_optional_timestamp_ms as opt_timestamp, parse_decimal, parse_optional_decimal,
    timestamp_from_millis,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// `instruments` channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instrument {
    pub inst_type: String,
    pub inst_id: String,
    /// Underlying, derivatives only
    #[serde(default)]
    pub uly: String,
    #[serde(default)]
    pub inst_family: String,
    #[serde(default)]
    pub base_ccy: String,
    #[serde(default)]
    pub quote_ccy: String,
    #[serde(default)]
    pub settle_ccy: String,
    #[serde(default, deserialize_with = "opt_decimal")]
    pub ct_val: Option<Decimal>,
    #[serde(default, deserialize_with = "opt_decimal")]
    pub ct_mult: Option<Decimal>,
    #[serde(default)]
    pub ct_val_ccy: String,
    /// `C` call, `P` put
    #[serde(default)]
    pub opt_type: String,
    /// Strike price, options only
    #[serde(default, deserialize_with = "opt_decimal")]
    pub stk: Option<Decimal>,
    #[serde(default, deserialize_with = "opt_timestamp")]
    pub list_time: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "opt_timestamp")]
    pub exp_time: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "opt_decimal")]
    pub lever: Option<Decimal>,
    #[serde(default, deserialize_with = "opt_decimal")]
    pub tick_sz: Option<Decimal>,
    #[serde(default, deserialize_with = "opt_decimal")]
    pub lot_sz: Option<Decimal>,
    #[serde(default, deserialize_with = "opt_decimal")]
    pub min_sz: Option<Decimal>,
    /// `linear` or `inverse`
    #[serde(default)]
    pub ct_type: String,
    /// `this_week`, `next_week`, `quarter`, `next_quarter`
    #[serde(default)]
    pub alias: String,
    /// `live`, `suspend`, `preopen` or `test`
    #[serde(default)]
    pub state: String,
}

/// `tickers` channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticker {
    pub inst_type: String,
    pub inst_id: String,
    #[serde(default, deserialize_with = "opt_decimal")]
    pub last: Option<Decimal>,
    #[serde(default, deserialize_with = "opt_decimal")]
    pub last_sz: Option<Decimal>,
    #[serde(default, deserialize_with = "opt_decimal")]
    pub ask_px: Option<Decimal>,
    #[serde(default, deserialize_with = "opt_decimal")]
    pub ask_sz: Option<Decimal>,
    #[serde(default, deserialize_with = "opt_decimal")]
    pub bid_px: Option<Decimal>,
    #[serde(default, deserialize_with = "opt_decimal")]
    pub bid_sz: Option<Decimal>,
    #[serde(default, deserialize_with = "opt_decimal")]
    pub open24h: Option<Decimal>,
    #[serde(default, deserialize_with = "opt_decimal")]
    pub high24h: Option<Decimal>,
    #[serde(default, deserialize_with = "opt_decimal")]
    pub low24h: Option<Decimal>,
    /// 24h volume in quote currency (contracts' currency for derivatives)
    #[serde(default, deserialize_with = "opt_decimal")]
    pub vol_ccy24h: Option<Decimal>,
    #[serde(default, deserialize_with = "opt_decimal")]
    pub vol24h: Option<Decimal>,
    #[serde(default, deserialize_with = "opt_decimal")]
    pub sod_utc0: Option<Decimal>,
    #[serde(default, deserialize_with = "opt_decimal")]
    pub sod_utc8: Option<Decimal>,
    #[serde(default, deserialize_with = "opt_timestamp")]
    pub ts: Option<DateTime<Utc>>,
}

/// `open-interest` channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenInterest {
    pub inst_type: String,
    pub inst_id: String,
    /// Open interest in contracts
    #[serde(default, deserialize_with = "opt_decimal")]
    pub oi: Option<Decimal>,
    /// Open interest in coin
    #[serde(default, deserialize_with = "opt_decimal")]
    pub oi_ccy: Option<Decimal>,
    #[serde(default, deserialize_with = "opt_timestamp")]
    pub ts: Option<DateTime<Utc>>,
}

/// `trades` channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trade {
    pub inst_id: String,
    pub trade_id: String,
    #[serde(default, deserialize_with = "opt_decimal")]
    pub px: Option<Decimal>,
    #[serde(default, deserialize_with = "opt_decimal")]
    pub sz: Option<Decimal>,
    /// Taker side
    #[serde(default)]
    pub side: String,
    /// Number of trades aggregated into this record
    #[serde(default, deserialize_with = "opt_decimal")]
    pub count: Option<Decimal>,
    #[serde(default, deserialize_with = "opt_timestamp")]
    pub ts: Option<DateTime<Utc>>,
}

/// Candlestick, pushed as `[ts, o, h, l, c, vol, volCcy, volCcyQuote, confirm]`
///
/// Index and mark price candles stop after the close price (plus `confirm`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>")]
pub struct Candle {
    pub ts: DateTime<Utc>,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub vol: Option<Decimal>,
    pub vol_ccy: Option<Decimal>,
    pub vol_ccy_quote: Option<Decimal>,
    /// Whether the bar is closed
    pub confirmed: bool,
}

impl TryFrom<Vec<String>> for Candle {
    type Error = PayloadError;

    fn try_from(fields: Vec<String>) -> Result<Self, Self::Error> {
        if fields.len() < 5 {
            return Err(PayloadError::TooShort {
                expected: 5,
                got: fields.len(),
            });
        }
        let ts = fields[0]
            .parse::<i64>()
            .ok()
            .and_then(timestamp_from_millis)
            .ok_or_else(|| PayloadError::InvalidTimestamp(fields[0].clone()))?;
        let price = |i: usize, field: &'static str| {
            parse_decimal(&fields[i]).map_err(|_| PayloadError::InvalidDecimal {
                field,
                value: fields[i].clone(),
            })
        };
        let open = price(1, "open")?;
        let high = price(2, "high")?;
        let low = price(3, "low")?;
        let close = price(4, "close")?;

        // the confirm flag is always last; volumes sit in between when present
        let (volumes, confirmed) = match fields.len() {
            5 => (&fields[5..5], false),
            n => (&fields[5..n - 1], fields[n - 1] == "1"),
        };
        let volume = |i: usize, field: &'static str| {
            parse_optional_decimal(volumes.get(i)).map_err(|_| PayloadError::InvalidDecimal {
                field,
                value: volumes.get(i).cloned().unwrap_or_default(),
            })
        };

        Ok(Self {
            ts,
            open,
            high,
            low,
            close,
            vol: volume(0, "vol")?,
            vol_ccy: volume(1, "volCcy")?,
            vol_ccy_quote: volume(2, "volCcyQuote")?,
            confirmed,
        })
    }
}

/// `estimated-price` channel: delivery or exercise price estimate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimatedPrice {
    pub inst_type: String,
    pub inst_id: String,
    #[serde(default, deserialize_with = "opt_decimal")]
    pub settle_px: Option<Decimal>,
    #[serde(default, deserialize_with = "opt_timestamp")]
    pub ts: Option<DateTime<Utc>>,
}

/// `mark-price` channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkPrice {
    pub inst_type: String,
    pub inst_id: String,
    #[serde(default, deserialize_with = "opt_decimal")]
    pub mark_px: Option<Decimal>,
    #[serde(default, deserialize_with = "opt_timestamp")]
    pub ts: Option<DateTime<Utc>>,
}

/// `price-limit` channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceLimit {
    pub inst_id: String,
    #[serde(default, deserialize_with = "opt_decimal")]
    pub buy_lmt: Option<Decimal>,
    #[serde(default, deserialize_with = "opt_decimal")]
    pub sell_lmt: Option<Decimal>,
    #[serde(default, deserialize_with = "opt_timestamp")]
    pub ts: Option<DateTime<Utc>>,
}

/// Order book channels (`books`, `books5`, `bbo-tbt`, ...)
///
/// Incremental channels mark the first push as a snapshot through the
/// frame's `action`; see [`crate::wire::Push::is_snapshot`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderBook {
    #[serde(default)]
    pub inst_id: Option<String>,
    #[serde(default)]
    pub asks: Vec<BookLevel>,
    #[serde(default)]
    pub bids: Vec<BookLevel>,
    #[serde(default, deserialize_with = "opt_timestamp")]
    pub ts: Option<DateTime<Utc>>,
    /// CRC32 over the top 25 levels
    #[serde(default)]
    pub checksum: Option<i64>,
    #[serde(default)]
    pub prev_seq_id: Option<i64>,
    #[serde(default)]
    pub seq_id: Option<i64>,
}

/// One book level, pushed as `[px, sz, liquidated orders, order count]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>")]
pub struct BookLevel {
    pub px: Decimal,
    /// Zero size removes the level
    pub sz: Decimal,
    pub num_orders: Option<Decimal>,
}

impl TryFrom<Vec<String>> for BookLevel {
    type Error = PayloadError;

    fn try_from(fields: Vec<String>) -> Result<Self, Self::Error> {
        if fields.len() < 2 {
            return Err(PayloadError::TooShort {
                expected: 2,
                got: fields.len(),
            });
        }
        let px = parse_decimal(&fields[0]).map_err(|_| PayloadError::InvalidDecimal {
            field: "px",
            value: fields[0].clone(),
        })?;
        let sz = parse_decimal(&fields[1]).map_err(|_| PayloadError::InvalidDecimal {
            field: "sz",
            value: fields[1].clone(),
        })?;
        let num_orders = parse_optional_decimal(fields.get(3)).map_err(|_| {
            PayloadError::InvalidDecimal {
                field: "numOrders",
                value: fields[3].clone(),
            }
        })?;
        Ok(Self { px, sz, num_orders })
    }
}

/// `opt-summary` channel: option greeks and volatilities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionSummary {
    pub inst_type: String,
    pub inst_id: String,
    #[serde(default)]
    pub uly: String,
    #[serde(default, deserialize_with = "opt_decimal")]
    pub delta: Option<Decimal>,
    #[serde(default, deserialize_with = "opt_decimal")]
    pub gamma: Option<Decimal>,
    #[serde(default, deserialize_with = "opt_decimal")]
    pub vega: Option<Decimal>,
    #[serde(default, deserialize_with = "opt_decimal")]
    pub theta: Option<Decimal>,
    #[serde(default, rename = "deltaBS", deserialize_with = "opt_decimal")]
    pub delta_bs: Option<Decimal>,
    #[serde(default, rename = "gammaBS", deserialize_with = "opt_decimal")]
    pub gamma_bs: Option<Decimal>,
    #[serde(default, rename = "vegaBS", deserialize_with = "opt_decimal")]
    pub vega_bs: Option<Decimal>,
    #[serde(default, rename = "thetaBS", deserialize_with = "opt_decimal")]
    pub theta_bs: Option<Decimal>,
    #[serde(default, deserialize_with = "opt_decimal")]
    pub lever: Option<Decimal>,
    #[serde(default, deserialize_with = "opt_decimal")]
    pub mark_vol: Option<Decimal>,
    #[serde(default, deserialize_with = "opt_decimal")]
    pub bid_vol: Option<Decimal>,
    #[serde(default, deserialize_with = "opt_decimal")]
    pub ask_vol: Option<Decimal>,
    #[serde(default, deserialize_with = "opt_decimal")]
    pub real_vol: Option<Decimal>,
    #[serde(default, deserialize_with = "opt_decimal")]
    pub fwd_px: Option<Decimal>,
    #[serde(default, deserialize_with = "opt_timestamp")]
    pub ts: Option<DateTime<Utc>>,
}

/// `funding-rate` channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundingRate {
    pub inst_type: String,
    pub inst_id: String,
    #[serde(default, deserialize_with = "opt_decimal")]
    pub funding_rate: Option<Decimal>,
    #[serde(default, deserialize_with = "opt_decimal")]
    pub next_funding_rate: Option<Decimal>,
    #[serde(default, deserialize_with = "opt_timestamp")]
    pub funding_time: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "opt_timestamp")]
    pub next_funding_time: Option<DateTime<Utc>>,
}

/// `index-tickers` channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexTicker {
    pub inst_id: String,
    #[serde(default, deserialize_with = "opt_decimal")]
    pub idx_px: Option<Decimal>,
    #[serde(default, deserialize_with = "opt_decimal")]
    pub open24h: Option<Decimal>,
    #[serde(default, deserialize_with = "opt_decimal")]
    pub high24h: Option<Decimal>,
    #[serde(default, deserialize_with = "opt_decimal")]
    pub low24h: Option<Decimal>,
    #[serde(default, deserialize_with = "opt_decimal")]
    pub sod_utc0: Option<Decimal>,
    #[serde(default, deserialize_with = "opt_decimal")]
    pub sod_utc8: Option<Decimal>,
    #[serde(default, deserialize_with = "opt_timestamp")]
    pub ts: Option<DateTime<Utc>>,
}

/// `liquidation-orders` channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiquidationOrder {
    pub inst_type: String,
    pub inst_id: String,
    #[serde(default)]
    pub uly: String,
    #[serde(default)]
    pub inst_family: String,
    #[serde(default)]
    pub details: Vec<LiquidationDetail>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiquidationDetail {
    #[serde(default)]
    pub side: String,
    #[serde(default)]
    pub pos_side: String,
    /// Bankruptcy price
    #[serde(default, deserialize_with = "opt_decimal")]
    pub bk_px: Option<Decimal>,
    #[serde(default, deserialize_with = "opt_decimal")]
    pub sz: Option<Decimal>,
    #[serde(default, deserialize_with = "opt_decimal")]
    pub bk_loss: Option<Decimal>,
    #[serde(default)]
    pub ccy: String,
    #[serde(default, deserialize_with = "opt_timestamp")]
    pub ts: Option<DateTime<Utc>>,
}

impl LiquidationDetail {
    /// Liquidated notional at the bankruptcy price
    pub fn notional(&self) -> Option<Decimal> {
        Some(self.bk_px? * self.sz?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_candle_full_row() {
        let candle: Candle = serde_json::from_str(
            r#"["1597026383085","8533.02","8553.74","8527.17","8548.26","45247","529.5858061","5331.2","0"]"#,
        )
        .unwrap();
        assert_eq!(candle.ts.timestamp_millis(), 1597026383085);
        assert_eq!(candle.open, dec!(8533.02));
        assert_eq!(candle.close, dec!(8548.26));
        assert_eq!(candle.vol, Some(dec!(45247)));
        assert_eq!(candle.vol_ccy_quote, Some(dec!(5331.2)));
        assert!(!candle.confirmed);
    }

    #[test]
    fn test_index_candle_row() {
        let candle: Candle =
            serde_json::from_str(r#"["1597026383085","3.721","3.743","3.677","3.708","1"]"#)
                .unwrap();
        assert_eq!(candle.vol, None);
        assert!(candle.confirmed);
    }

    #[test]
    fn test_candle_too_short() {
        let res: Result<Candle, _> = serde_json::from_str(r#"["1597026383085","1","2"]"#);
        assert!(res.is_err());
    }

    #[test]
    fn test_order_book_levels() {
        let book: OrderBook = serde_json::from_str(
            r#"{"asks":[["8476.98","415","0","13"]],"bids":[["8476.97","256","0","12"]],
                "ts":"1597026383085","checksum":-855196043,"prevSeqId":-1,"seqId":123456}"#,
        )
        .unwrap();
        assert_eq!(book.asks[0].px, dec!(8476.98));
        assert_eq!(book.bids[0].num_orders, Some(dec!(12)));
        assert_eq!(book.checksum, Some(-855196043));
        assert_eq!(book.seq_id, Some(123456));
    }

    #[test]
    fn test_liquidation_notional() {
        let order: LiquidationOrder = serde_json::from_str(
            r#"{"instType":"SWAP","instId":"BTC-USDT-SWAP","uly":"BTC-USDT",
                "details":[{"side":"buy","posSide":"short","bkPx":"40000","sz":"0.5",
                            "bkLoss":"0","ccy":"","ts":"1597026383085"}]}"#,
        )
        .unwrap();
        assert_eq!(order.details[0].notional(), Some(dec!(20000)));
    }

    #[test]
    fn test_option_summary_bs_fields() {
        let s: OptionSummary = serde_json::from_str(
            r#"{"instType":"OPTION","instId":"BTC-USD-241227-60000-C","deltaBS":"0.5","markVol":"0.6"}"#,
        )
        .unwrap();
        assert_eq!(s.delta_bs, Some(dec!(0.5)));
        assert_eq!(s.mark_vol, Some(dec!(0.6)));
    }
}
