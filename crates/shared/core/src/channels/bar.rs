use crate::error::RequestError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Candlestick bar sizes accepted by the candlestick channel families
const KNOWN_BARS: &[&str] = &[
    "1s", "1m", "3m", "5m", "15m", "30m", "1H", "2H", "4H", "6H", "12H", "1D", "2D", "3D", "1W",
    "1M", "3M", "6M", "1Y", "6Hutc", "12Hutc", "1Dutc", "2Dutc", "3Dutc", "1Wutc", "1Mutc",
    "3Mutc", "6Mutc", "1Yutc",
];

/// Candlestick bar size (`1m`, `5m`, `1H`, `1Dutc`, ...)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Bar(&'static str);

impl Bar {
    pub const M1: Bar = Bar("1m");
    pub const M5: Bar = Bar("5m");
    pub const M15: Bar = Bar("15m");
    pub const H1: Bar = Bar("1H");
    pub const D1: Bar = Bar("1D");

    /// Look up a bar size; `None` if the exchange does not know it
    pub fn parse(s: &str) -> Option<Self> {
        KNOWN_BARS.iter().copied().find(|b| *b == s).map(Bar)
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for Bar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

impl FromStr for Bar {
    type Err = RequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Bar::parse(s).ok_or_else(|| RequestError::UnknownBar(s.to_string()))
    }
}

impl Serialize for Bar {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.0)
    }
}

impl<'de> Deserialize<'de> for Bar {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Bar::parse(&s).ok_or_else(|| serde::de::Error::custom(format!("unknown bar size: {s}")))
    }
}
