use crate::error::RequestError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Order book channel variant; the variant name is the channel name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BookDepth {
    /// 400 levels, snapshot then incremental updates every 100 ms
    #[serde(rename = "books")]
    Books,
    /// 5 levels, full snapshot every 100 ms
    #[serde(rename = "books5")]
    Books5,
    /// Best bid/offer, tick by tick
    #[serde(rename = "bbo-tbt")]
    BboTbt,
    /// 400 levels, tick by tick (login required on the exchange side)
    #[serde(rename = "books-l2-tbt")]
    BooksL2Tbt,
    /// 50 levels, tick by tick (login required on the exchange side)
    #[serde(rename = "books50-l2-tbt")]
    Books50L2Tbt,
    /// Enhanced liquidity program book
    #[serde(rename = "books-elp")]
    BooksElp,
}

impl BookDepth {
    pub const ALL: [BookDepth; 6] = [
        BookDepth::Books,
        BookDepth::Books5,
        BookDepth::BboTbt,
        BookDepth::BooksL2Tbt,
        BookDepth::Books50L2Tbt,
        BookDepth::BooksElp,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BookDepth::Books => "books",
            BookDepth::Books5 => "books5",
            BookDepth::BboTbt => "bbo-tbt",
            BookDepth::BooksL2Tbt => "books-l2-tbt",
            BookDepth::Books50L2Tbt => "books50-l2-tbt",
            BookDepth::BooksElp => "books-elp",
        }
    }

    /// Exact channel-name lookup
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.as_str() == s)
    }
}

impl fmt::Display for BookDepth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookDepth {
    type Err = RequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BookDepth::parse(s).ok_or_else(|| RequestError::UnknownBookDepth(s.to_string()))
    }
}
