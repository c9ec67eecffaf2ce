use super::Arg;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Outbound request kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Login,
    Subscribe,
    Unsubscribe,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Operation::Login => "login",
            Operation::Subscribe => "subscribe",
            Operation::Unsubscribe => "unsubscribe",
        };
        f.write_str(s)
    }
}

/// Outbound envelope: `{"op": ..., "args": [...]}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WsRequest {
    pub op: Operation,
    pub args: Vec<Arg>,
}

impl WsRequest {
    pub fn new(op: Operation, args: Vec<Arg>) -> Self {
        Self { op, args }
    }

    pub fn subscribe(args: Vec<Arg>) -> Self {
        Self::new(Operation::Subscribe, args)
    }

    pub fn unsubscribe(args: Vec<Arg>) -> Self {
        Self::new(Operation::Unsubscribe, args)
    }

    /// Login request carrying a single signed credential mapping
    pub fn login(api_key: &str, passphrase: &str, timestamp: &str, sign: &str) -> Self {
        let arg = Arg::new()
            .with("apiKey", api_key)
            .with("passphrase", passphrase)
            .with("timestamp", timestamp)
            .with("sign", sign);
        Self::new(Operation::Login, vec![arg])
    }

    /// Serialize to the UTF-8 text frame payload
    pub fn to_text(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Short description for logs; never includes login arguments
    pub fn summary(&self) -> String {
        match self.op {
            Operation::Login => "login".to_string(),
            op => {
                let channels: Vec<&str> = self
                    .args
                    .iter()
                    .map(|a| a.channel_name().unwrap_or("?"))
                    .collect();
                format!("{op} [{}]", channels.join(", "))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    #[test]
    fn test_subscribe_envelope() {
        let req = WsRequest::subscribe(vec![
            Arg::new().with("channel", "tickers").with("instId", "BTC-USDT"),
            Arg::new().with("channel", "tickers").with("instId", "ETH-USDT"),
        ]);
        let value: Value = serde_json::from_str(&req.to_text().unwrap()).unwrap();
        assert_eq!(
            value,
            json!({
                "op": "subscribe",
                "args": [
                    {"channel": "tickers", "instId": "BTC-USDT"},
                    {"channel": "tickers", "instId": "ETH-USDT"}
                ]
            })
        );
    }

    #[test]
    fn test_login_envelope() {
        let req = WsRequest::login("key", "phrase", "1538054050", "c2lnbg==");
        let value: Value = serde_json::from_str(&req.to_text().unwrap()).unwrap();
        assert_eq!(value["op"], "login");
        assert_eq!(value["args"][0]["apiKey"], "key");
        assert_eq!(value["args"][0]["passphrase"], "phrase");
        assert_eq!(value["args"][0]["timestamp"], "1538054050");
        assert_eq!(value["args"][0]["sign"], "c2lnbg==");
    }

    #[test]
    fn test_summary_hides_credentials() {
        let req = WsRequest::login("key", "phrase", "1", "sig");
        assert_eq!(req.summary(), "login");

        let req = WsRequest::unsubscribe(vec![Arg::new().with("channel", "trades")]);
        assert_eq!(req.summary(), "unsubscribe [trades]");
    }
}
