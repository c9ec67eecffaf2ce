use super::{Arg, Envelope};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// One push frame decoded into typed records
///
/// A single frame may carry several records, e.g. tickers for every
/// subscribed instrument, so sinks receive the whole batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Push<T> {
    pub arg: Arg,
    /// `snapshot` or `update` for incremental order books
    pub action: Option<String>,
    pub data: Vec<T>,
}

impl<T: DeserializeOwned> Push<T> {
    /// Decode the `data` array of a push envelope
    pub fn decode(env: Envelope) -> Result<Self, serde_json::Error> {
        let data = env
            .data
            .unwrap_or_default()
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<T>, _>>()?;
        Ok(Self {
            arg: env.arg.unwrap_or_default(),
            action: env.action,
            data,
        })
    }
}

impl<T> Push<T> {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn is_snapshot(&self) -> bool {
        self.action.as_deref() == Some("snapshot")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    #[serde(rename_all = "camelCase")]
    struct Rec {
        inst_id: String,
    }

    #[test]
    fn test_decode_batch() {
        let env = Envelope::from_text(
            r#"{"arg":{"channel":"tickers"},"data":[{"instId":"A"},{"instId":"B"}]}"#,
        )
        .unwrap();
        let push: Push<Rec> = Push::decode(env).unwrap();
        assert_eq!(push.len(), 2);
        assert_eq!(push.data[1].inst_id, "B");
        assert!(!push.is_snapshot());
    }

    #[test]
    fn test_decode_mismatch_fails() {
        let env = Envelope::from_text(r#"{"arg":{"channel":"tickers"},"data":[42]}"#).unwrap();
        assert!(Push::<Rec>::decode(env).is_err());
    }
}
