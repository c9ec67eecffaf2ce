//! Records pushed on the login-only channels

use crate::parse::{
    deserialize_optional_decimal as opt_decimal,
    deserialize_optional_timestamp_ms as opt_timestamp,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// `account` channel: account-level equity and margin with per-currency details
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    #[serde(default, deserialize_with = "opt_timestamp")]
    pub u_time: Option<DateTime<Utc>>,
    /// Total equity in USD
    #[serde(default, deserialize_with = "opt_decimal")]
    pub total_eq: Option<Decimal>,
    #[serde(default, deserialize_with = "opt_decimal")]
    pub iso_eq: Option<Decimal>,
    /// Adjusted (effective) equity in USD
    #[serde(default, deserialize_with = "opt_decimal")]
    pub adj_eq: Option<Decimal>,
    #[serde(default, deserialize_with = "opt_decimal")]
    pub ord_froz: Option<Decimal>,
    #[serde(default, deserialize_with = "opt_decimal")]
    pub imr: Option<Decimal>,
    #[serde(default, deserialize_with = "opt_decimal")]
    pub mmr: Option<Decimal>,
    #[serde(default, deserialize_with = "opt_decimal")]
    pub mgn_ratio: Option<Decimal>,
    #[serde(default, deserialize_with = "opt_decimal")]
    pub notional_usd: Option<Decimal>,
    #[serde(default)]
    pub details: Vec<AccountDetail>,
}

/// Per-currency line of an [`Account`] push
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountDetail {
    pub ccy: String,
    #[serde(default, deserialize_with = "opt_decimal")]
    pub eq: Option<Decimal>,
    #[serde(default, deserialize_with = "opt_decimal")]
    pub cash_bal: Option<Decimal>,
    #[serde(default, deserialize_with = "opt_timestamp")]
    pub u_time: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "opt_decimal")]
    pub iso_eq: Option<Decimal>,
    #[serde(default, deserialize_with = "opt_decimal")]
    pub avail_eq: Option<Decimal>,
    #[serde(default, deserialize_with = "opt_decimal")]
    pub dis_eq: Option<Decimal>,
    #[serde(default, deserialize_with = "opt_decimal")]
    pub avail_bal: Option<Decimal>,
    #[serde(default, deserialize_with = "opt_decimal")]
    pub frozen_bal: Option<Decimal>,
    #[serde(default, deserialize_with = "opt_decimal")]
    pub ord_frozen: Option<Decimal>,
    #[serde(default, deserialize_with = "opt_decimal")]
    pub liab: Option<Decimal>,
    /// Unrealized profit and loss
    #[serde(default, deserialize_with = "opt_decimal")]
    pub upl: Option<Decimal>,
    #[serde(default, deserialize_with = "opt_decimal")]
    pub mgn_ratio: Option<Decimal>,
    #[serde(default, deserialize_with = "opt_decimal")]
    pub interest: Option<Decimal>,
    #[serde(default, deserialize_with = "opt_decimal")]
    pub max_loan: Option<Decimal>,
    #[serde(default, deserialize_with = "opt_decimal")]
    pub eq_usd: Option<Decimal>,
    #[serde(default, deserialize_with = "opt_decimal")]
    pub notional_lever: Option<Decimal>,
}

/// `positions` channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub inst_type: String,
    pub inst_id: String,
    /// `cross` or `isolated`
    #[serde(default)]
    pub mgn_mode: String,
    #[serde(default)]
    pub pos_id: String,
    /// `long`, `short` or `net`
    #[serde(default)]
    pub pos_side: String,
    #[serde(default, deserialize_with = "opt_decimal")]
    pub pos: Option<Decimal>,
    #[serde(default)]
    pub pos_ccy: String,
    #[serde(default, deserialize_with = "opt_decimal")]
    pub avail_pos: Option<Decimal>,
    #[serde(default, deserialize_with = "opt_decimal")]
    pub avg_px: Option<Decimal>,
    #[serde(default, deserialize_with = "opt_decimal")]
    pub upl: Option<Decimal>,
    #[serde(default, deserialize_with = "opt_decimal")]
    pub upl_ratio: Option<Decimal>,
    #[serde(default, deserialize_with = "opt_decimal")]
    pub lever: Option<Decimal>,
    /// Estimated liquidation price
    #[serde(default, deserialize_with = "opt_decimal")]
    pub liq_px: Option<Decimal>,
    #[serde(default, deserialize_with = "opt_decimal")]
    pub mark_px: Option<Decimal>,
    #[serde(default, deserialize_with = "opt_decimal")]
    pub imr: Option<Decimal>,
    #[serde(default, deserialize_with = "opt_decimal")]
    pub margin: Option<Decimal>,
    #[serde(default, deserialize_with = "opt_decimal")]
    pub mgn_ratio: Option<Decimal>,
    #[serde(default, deserialize_with = "opt_decimal")]
    pub mmr: Option<Decimal>,
    #[serde(default, deserialize_with = "opt_decimal")]
    pub liab: Option<Decimal>,
    #[serde(default)]
    pub liab_ccy: String,
    #[serde(default, deserialize_with = "opt_decimal")]
    pub interest: Option<Decimal>,
    #[serde(default)]
    pub trade_id: String,
    #[serde(default, deserialize_with = "opt_decimal")]
    pub notional_usd: Option<Decimal>,
    /// Auto-deleveraging rank, 1 to 5
    #[serde(default, deserialize_with = "opt_decimal")]
    pub adl: Option<Decimal>,
    #[serde(default)]
    pub ccy: String,
    #[serde(default, deserialize_with = "opt_decimal")]
    pub last: Option<Decimal>,
    #[serde(default, deserialize_with = "opt_timestamp")]
    pub c_time: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "opt_timestamp")]
    pub u_time: Option<DateTime<Utc>>,
    /// Push time
    #[serde(default, deserialize_with = "opt_timestamp")]
    pub p_time: Option<DateTime<Utc>>,
}

/// `balance_and_position` channel: cash balances and positions changed by
/// one event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceAndPosition {
    #[serde(default, deserialize_with = "opt_timestamp")]
    pub p_time: Option<DateTime<Utc>>,
    /// `snapshot`, `delivered`, `exercised`, `transferred`, `filled`,
    /// `liquidation`, `claw_back`, `adl`, `funding_fee`, `adjust_margin`,
    /// `set_leverage` or `interest_deduction`
    #[serde(default)]
    pub event_type: String,
    #[serde(default)]
    pub bal_data: Vec<BalanceData>,
    #[serde(default)]
    pub pos_data: Vec<PositionData>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceData {
    pub ccy: String,
    #[serde(default, deserialize_with = "opt_decimal")]
    pub cash_bal: Option<Decimal>,
    #[serde(default, deserialize_with = "opt_timestamp")]
    pub u_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionData {
    #[serde(default)]
    pub pos_id: String,
    #[serde(default)]
    pub trade_id: String,
    pub inst_id: String,
    pub inst_type: String,
    #[serde(default)]
    pub mgn_mode: String,
    #[serde(default)]
    pub pos_side: String,
    #[serde(default, deserialize_with = "opt_decimal")]
    pub pos: Option<Decimal>,
    #[serde(default)]
    pub ccy: String,
    #[serde(default)]
    pub pos_ccy: String,
    #[serde(default, deserialize_with = "opt_decimal")]
    pub avg_px: Option<Decimal>,
    #[serde(default, deserialize_with = "opt_timestamp")]
    pub u_time: Option<DateTime<Utc>>,
}

/// `orders` channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub inst_type: String,
    pub inst_id: String,
    #[serde(default)]
    pub ccy: String,
    pub ord_id: String,
    #[serde(default)]
    pub cl_ord_id: String,
    #[serde(default)]
    pub tag: String,
    #[serde(default, deserialize_with = "opt_decimal")]
    pub px: Option<Decimal>,
    #[serde(default, deserialize_with = "opt_decimal")]
    pub sz: Option<Decimal>,
    #[serde(default, deserialize_with = "opt_decimal")]
    pub notional_usd: Option<Decimal>,
    /// `market`, `limit`, `post_only`, `fok`, `ioc`, `optimal_limit_ioc`
    #[serde(default)]
    pub ord_type: String,
    /// `buy` or `sell`
    #[serde(default)]
    pub side: String,
    #[serde(default)]
    pub pos_side: String,
    /// Trade mode: `cross`, `isolated` or `cash`
    #[serde(default)]
    pub td_mode: String,
    #[serde(default, deserialize_with = "opt_decimal")]
    pub fill_px: Option<Decimal>,
    #[serde(default)]
    pub trade_id: String,
    #[serde(default, deserialize_with = "opt_decimal")]
    pub fill_sz: Option<Decimal>,
    #[serde(default, deserialize_with = "opt_timestamp")]
    pub fill_time: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "opt_decimal")]
    pub fill_fee: Option<Decimal>,
    #[serde(default)]
    pub fill_fee_ccy: String,
    /// `T` taker, `M` maker
    #[serde(default)]
    pub exec_type: String,
    #[serde(default, deserialize_with = "opt_decimal")]
    pub acc_fill_sz: Option<Decimal>,
    #[serde(default, deserialize_with = "opt_decimal")]
    pub avg_px: Option<Decimal>,
    /// `live`, `partially_filled`, `filled` or `canceled`
    #[serde(default)]
    pub state: String,
    #[serde(default, deserialize_with = "opt_decimal")]
    pub lever: Option<Decimal>,
    #[serde(default, deserialize_with = "opt_decimal")]
    pub tp_trigger_px: Option<Decimal>,
    #[serde(default, deserialize_with = "opt_decimal")]
    pub tp_ord_px: Option<Decimal>,
    #[serde(default, deserialize_with = "opt_decimal")]
    pub sl_trigger_px: Option<Decimal>,
    #[serde(default, deserialize_with = "opt_decimal")]
    pub sl_ord_px: Option<Decimal>,
    #[serde(default)]
    pub fee_ccy: String,
    #[serde(default, deserialize_with = "opt_decimal")]
    pub fee: Option<Decimal>,
    #[serde(default)]
    pub rebate_ccy: String,
    #[serde(default, deserialize_with = "opt_decimal")]
    pub rebate: Option<Decimal>,
    #[serde(default, deserialize_with = "opt_decimal")]
    pub pnl: Option<Decimal>,
    /// `normal`, `twap`, `adl`, `full_liquidation`, `partial_liquidation`,
    /// `delivery` or `ddh`
    #[serde(default)]
    pub category: String,
    #[serde(default, deserialize_with = "opt_timestamp")]
    pub u_time: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "opt_timestamp")]
    pub c_time: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_order_decodes_empty_strings_as_none() {
        let order: Order = serde_json::from_str(
            r#"{
                "instType":"SWAP","instId":"BTC-USDT-SWAP","ordId":"312269865356374016",
                "px":"","sz":"2","ordType":"market","side":"buy","posSide":"long",
                "tdMode":"cross","fillPx":"38421.5","fillSz":"2","accFillSz":"2",
                "avgPx":"38421.5","state":"filled","fee":"-0.0192","feeCcy":"USDT",
                "uTime":"1597026383085","cTime":"1597026383085"
            }"#,
        )
        .unwrap();
        assert_eq!(order.px, None);
        assert_eq!(order.sz, Some(dec!(2)));
        assert_eq!(order.fee, Some(dec!(-0.0192)));
        assert_eq!(order.state, "filled");
        assert_eq!(order.c_time.unwrap().timestamp_millis(), 1597026383085);
    }

    #[test]
    fn test_balance_and_position() {
        let bp: BalanceAndPosition = serde_json::from_str(
            r#"{
                "pTime":"1597026383085","eventType":"snapshot",
                "balData":[{"ccy":"BTC","cashBal":"1","uTime":"1597026383085"}],
                "posData":[{"posId":"1111111111","tradeId":"2","instId":"BTC-USD-191018",
                            "instType":"FUTURES","mgnMode":"cross","posSide":"long",
                            "pos":"10","ccy":"BTC","posCcy":"","avgPx":"3320",
                            "uTime":"1597026383085"}]
            }"#,
        )
        .unwrap();
        assert_eq!(bp.event_type, "snapshot");
        assert_eq!(bp.bal_data[0].cash_bal, Some(dec!(1)));
        assert_eq!(bp.pos_data[0].avg_px, Some(dec!(3320)));
    }

    #[test]
    fn test_account_details() {
        let acct: Account = serde_json::from_str(
            r#"{"uTime":"1597026383085","totalEq":"41624.32","details":[{"ccy":"USDT","eq":"1","availBal":""}]}"#,
        )
        .unwrap();
        assert_eq!(acct.total_eq, Some(dec!(41624.32)));
        assert_eq!(acct.details[0].avail_bal, None);
    }
}
