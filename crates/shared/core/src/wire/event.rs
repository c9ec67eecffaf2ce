use super::{Arg, Envelope};
use serde::Serialize;
use serde_json::Value;

/// Business error reported by the exchange, either as an `error` event or as
/// a correlated response with a non-zero code
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorEvent {
    pub code: i64,
    pub msg: String,
    pub id: Option<String>,
    pub op: Option<String>,
    pub conn_id: Option<String>,
    pub data: Vec<Value>,
}

impl From<Envelope> for ErrorEvent {
    fn from(env: Envelope) -> Self {
        Self {
            code: env.code,
            msg: env.msg.unwrap_or_default(),
            id: env.id,
            op: env.op,
            conn_id: env.conn_id,
            data: env.data.unwrap_or_default(),
        }
    }
}

/// Subscribe acknowledgement
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubscribeEvent {
    pub arg: Arg,
    pub conn_id: Option<String>,
}

impl From<Envelope> for SubscribeEvent {
    fn from(env: Envelope) -> Self {
        Self {
            arg: env.arg.unwrap_or_default(),
            conn_id: env.conn_id,
        }
    }
}

/// Unsubscribe acknowledgement
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnsubscribeEvent {
    pub arg: Arg,
    pub conn_id: Option<String>,
}

impl From<Envelope> for UnsubscribeEvent {
    fn from(env: Envelope) -> Self {
        Self {
            arg: env.arg.unwrap_or_default(),
            conn_id: env.conn_id,
        }
    }
}

/// Login confirmation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginEvent {
    pub code: i64,
    pub msg: String,
    pub conn_id: Option<String>,
}

impl From<Envelope> for LoginEvent {
    fn from(env: Envelope) -> Self {
        Self {
            code: env.code,
            msg: env.msg.unwrap_or_default(),
            conn_id: env.conn_id,
        }
    }
}

/// Generic acknowledgement of a correlated command
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuccessEvent {
    pub id: Option<String>,
    pub op: Option<String>,
    pub code: i64,
    pub msg: String,
    pub data: Vec<Value>,
}

impl From<Envelope> for SuccessEvent {
    fn from(env: Envelope) -> Self {
        Self {
            id: env.id,
            op: env.op,
            code: env.code,
            msg: env.msg.unwrap_or_default(),
            data: env.data.unwrap_or_default(),
        }
    }
}
