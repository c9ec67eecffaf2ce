use crate::channels::Channel;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Key carrying the channel name in every argument mapping
pub const CHANNEL_KEY: &str = "channel";

/// One topic-argument mapping: selector key/value pairs such as
/// `channel`, `instId`, `instType`
///
/// Key order inside a mapping carries no meaning; a sorted map keeps the
/// serialized form stable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Arg(BTreeMap<String, String>);

impl Arg {
    /// Empty mapping
    pub fn new() -> Self {
        Self::default()
    }

    /// Mapping tagged with a channel name
    pub fn for_channel(channel: &Channel) -> Self {
        Self::new().with(CHANNEL_KEY, channel.name())
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Raw channel name, if present
    pub fn channel_name(&self) -> Option<&str> {
        self.get(CHANNEL_KEY)
    }

    /// Parsed channel, if present and routable
    pub fn channel(&self) -> Option<Channel> {
        self.channel_name().and_then(Channel::parse)
    }

    /// Overwrite the channel tag
    pub fn set_channel(&mut self, channel: &Channel) {
        self.insert(CHANNEL_KEY, channel.name());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl fmt::Display for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (k, v) in self.iter() {
            if !first {
                f.write_str(",")?;
            }
            write!(f, "{k}={v}")?;
            first = false;
        }
        Ok(())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Arg {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl<'de> Deserialize<'de> for Arg {
    /// Inbound selectors are strings, but scalar values (e.g. a numeric
    /// `uid`) are accepted and kept in their JSON text form.
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = BTreeMap::<String, Value>::deserialize(deserializer)?;
        Ok(Self(
            raw.into_iter()
                .map(|(k, v)| {
                    let v = match v {
                        Value::String(s) => s,
                        other => other.to_string(),
                    };
                    (k, v)
                })
                .collect(),
        ))
    }
}
