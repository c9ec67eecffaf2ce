use super::Arg;
use crate::parse::deserialize_code;
use serde::Deserialize;
use serde_json::Value;

/// Generic decode target for every inbound frame
///
/// Every field is optional on the wire; which ones are present decides how
/// the frame is routed.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    #[serde(default)]
    pub event: Option<String>,
    /// Non-zero means a business error
    #[serde(default, deserialize_with = "deserialize_code")]
    pub code: i64,
    #[serde(default)]
    pub msg: Option<String>,
    /// Correlates a one-shot acknowledgement
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub op: Option<String>,
    #[serde(default)]
    pub conn_id: Option<String>,
    /// Topic descriptor
    #[serde(default)]
    pub arg: Option<Arg>,
    /// `snapshot` or `update` on incremental channels
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub data: Option<Vec<Value>>,
}

impl Envelope {
    /// Decode a text frame
    pub fn from_text(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Whether the frame carries topic data: no event, a channel-bearing
    /// `arg`, and a non-empty `data` array
    pub fn is_push(&self) -> bool {
        self.event.is_none()
            && self.arg.as_ref().is_some_and(|a| a.channel_name().is_some())
            && self.data.as_ref().is_some_and(|d| !d.is_empty())
    }

    pub fn channel_name(&self) -> Option<&str> {
        self.arg.as_ref().and_then(|a| a.channel_name())
    }

    pub fn message(&self) -> &str {
        self.msg.as_deref().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_frame() {
        let env = Envelope::from_text(
            r#"{"arg":{"channel":"tickers","instId":"BTC-USDT"},"data":[{"instId":"BTC-USDT"}]}"#,
        )
        .unwrap();
        assert!(env.is_push());
        assert_eq!(env.channel_name(), Some("tickers"));
        assert_eq!(env.code, 0);
    }

    #[test]
    fn test_event_frame_is_not_push() {
        let env = Envelope::from_text(
            r#"{"event":"subscribe","arg":{"channel":"tickers","instId":"BTC-USDT"},"connId":"a4d3ae55"}"#,
        )
        .unwrap();
        assert!(!env.is_push());
        assert_eq!(env.event.as_deref(), Some("subscribe"));
        assert_eq!(env.conn_id.as_deref(), Some("a4d3ae55"));
    }

    #[test]
    fn test_empty_data_is_not_push() {
        let env = Envelope::from_text(r#"{"arg":{"channel":"tickers"},"data":[]}"#).unwrap();
        assert!(!env.is_push());
    }

    #[test]
    fn test_string_code() {
        let env = Envelope::from_text(r#"{"id":"1512","op":"order","code":"50004","msg":"timeout","data":[]}"#)
            .unwrap();
        assert_eq!(env.code, 50004);
        assert_eq!(env.id.as_deref(), Some("1512"));
        assert_eq!(env.message(), "timeout");
    }

    #[test]
    fn test_malformed() {
        assert!(Envelope::from_text("not json").is_err());
        assert!(Envelope::from_text("[1,2,3]").is_err());
    }
}
