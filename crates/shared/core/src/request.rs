//! Topic selectors: the typed halves of subscribe/unsubscribe arguments
//!
//! Each selector is validated against its channel and turned into an [`Arg`]
//! tagged with the channel name before anything reaches the socket.

use crate::channels::Channel;
use crate::error::RequestError;
use crate::wire::Arg;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Instrument type selector (`instType`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum InstrumentType {
    Spot,
    Margin,
    Swap,
    Futures,
    Option,
    Any,
}

impl InstrumentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InstrumentType::Spot => "SPOT",
            InstrumentType::Margin => "MARGIN",
            InstrumentType::Swap => "SWAP",
            InstrumentType::Futures => "FUTURES",
            InstrumentType::Option => "OPTION",
            InstrumentType::Any => "ANY",
        }
    }
}

impl fmt::Display for InstrumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InstrumentType {
    type Err = RequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SPOT" => Ok(InstrumentType::Spot),
            "MARGIN" => Ok(InstrumentType::Margin),
            "SWAP" => Ok(InstrumentType::Swap),
            "FUTURES" => Ok(InstrumentType::Futures),
            "OPTION" => Ok(InstrumentType::Option),
            "ANY" => Ok(InstrumentType::Any),
            other => Err(RequestError::UnknownInstrumentType(other.to_string())),
        }
    }
}

/// Builds the argument mapping for one topic instance
pub trait TopicSelector {
    fn to_arg(&self, channel: &Channel) -> Result<Arg, RequestError>;
}

/// Build one argument per selector, all tagged with `channel`
pub fn build_args<S: TopicSelector>(
    channel: Channel,
    selectors: &[S],
) -> Result<Vec<Arg>, RequestError> {
    if selectors.is_empty() {
        return Err(RequestError::NoSelectors(channel.name()));
    }
    selectors.iter().map(|s| s.to_arg(&channel)).collect()
}

/// Channels keyed by a single instrument id (`tickers`, `candle1m`, `books`,
/// `index-tickers`, ...)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InstrumentId(pub String);

impl InstrumentId {
    pub fn new(inst_id: impl Into<String>) -> Self {
        Self(inst_id.into())
    }
}

impl From<&str> for InstrumentId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for InstrumentId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl TopicSelector for InstrumentId {
    fn to_arg(&self, channel: &Channel) -> Result<Arg, RequestError> {
        if self.0.trim().is_empty() {
            return Err(RequestError::EmptyInstrumentId(channel.name()));
        }
        Ok(Arg::for_channel(channel).with("instId", self.0.as_str()))
    }
}

/// Channels keyed by an instrument family (`opt-summary`)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InstrumentFamily(pub String);

impl InstrumentFamily {
    pub fn new(family: impl Into<String>) -> Self {
        Self(family.into())
    }
}

impl From<&str> for InstrumentFamily {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl TopicSelector for InstrumentFamily {
    fn to_arg(&self, channel: &Channel) -> Result<Arg, RequestError> {
        if self.0.trim().is_empty() {
            return Err(RequestError::EmptyInstrumentFamily(channel.name()));
        }
        Ok(Arg::for_channel(channel).with("instFamily", self.0.as_str()))
    }
}

/// Channels keyed by instrument type, optionally narrowed to a family or a
/// single instrument (`positions`, `orders`, `instruments`,
/// `estimated-price`, `liquidation-orders`)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InstrumentTypeFilter {
    pub inst_type: InstrumentType,
    pub inst_family: Option<String>,
    pub inst_id: Option<String>,
}

impl InstrumentTypeFilter {
    pub fn new(inst_type: InstrumentType) -> Self {
        Self {
            inst_type,
            inst_family: None,
            inst_id: None,
        }
    }

    pub fn family(mut self, family: impl Into<String>) -> Self {
        self.inst_family = Some(family.into());
        self
    }

    pub fn instrument(mut self, inst_id: impl Into<String>) -> Self {
        self.inst_id = Some(inst_id.into());
        self
    }

    fn accepts(channel: &Channel, inst_type: InstrumentType) -> bool {
        use InstrumentType as T;
        match channel {
            Channel::Positions => inst_type != T::Spot,
            Channel::Instruments => inst_type != T::Any,
            Channel::EstimatedPrice => matches!(inst_type, T::Futures | T::Option),
            Channel::LiquidationOrders => {
                matches!(inst_type, T::Margin | T::Swap | T::Futures | T::Option)
            }
            _ => true,
        }
    }
}

impl TopicSelector for InstrumentTypeFilter {
    fn to_arg(&self, channel: &Channel) -> Result<Arg, RequestError> {
        if !Self::accepts(channel, self.inst_type) {
            return Err(RequestError::InstrumentTypeNotAllowed {
                channel: channel.name(),
                inst_type: self.inst_type.to_string(),
            });
        }
        let family = self.inst_family.as_deref().filter(|f| !f.trim().is_empty());
        let inst_id = self.inst_id.as_deref().filter(|i| !i.trim().is_empty());
        if *channel == Channel::EstimatedPrice && family.is_none() && inst_id.is_none() {
            return Err(RequestError::MissingUnderlying(channel.name()));
        }

        let mut arg = Arg::for_channel(channel).with("instType", self.inst_type.as_str());
        if let Some(family) = family {
            arg.insert("instFamily", family);
        }
        if let Some(inst_id) = inst_id {
            arg.insert("instId", inst_id);
        }
        Ok(arg)
    }
}

/// `account` channel: all currencies, or one
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct CurrencyFilter(pub Option<String>);

impl CurrencyFilter {
    pub fn all() -> Self {
        Self(None)
    }

    pub fn currency(ccy: impl Into<String>) -> Self {
        Self(Some(ccy.into()))
    }
}

impl TopicSelector for CurrencyFilter {
    fn to_arg(&self, channel: &Channel) -> Result<Arg, RequestError> {
        let arg = Arg::for_channel(channel);
        match &self.0 {
            None => Ok(arg),
            Some(ccy) if ccy.trim().is_empty() => Err(RequestError::EmptyCurrency(channel.name())),
            Some(ccy) => Ok(arg.with("ccy", ccy.as_str())),
        }
    }
}

/// Channels without selectors (`balance_and_position`)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Unfiltered;

impl TopicSelector for Unfiltered {
    fn to_arg(&self, channel: &Channel) -> Result<Arg, RequestError> {
        Ok(Arg::for_channel(channel))
    }
}
