//! JSON-RPC 2.0 framing and error mapping.

use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use trustlend::{ErrorKind, MarketError};

pub const PARSE_ERROR: i64 = -32700;
pub const INVALID_REQUEST: i64 = -32600;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;

/// Failure of a single request.
#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    #[error("invalid params: {0}")]
    InvalidParams(String),

    #[error("method not found: {0}")]
    MethodNotFound(String),

    #[error(transparent)]
    Market(#[from] MarketError),

    #[error("failed to encode result: {0}")]
    Encode(#[from] serde_json::Error),
}

impl RpcError {
    pub fn code(&self) -> i64 {
        match self {
            RpcError::InvalidParams(_) => INVALID_PARAMS,
            RpcError::MethodNotFound(_) => METHOD_NOT_FOUND,
            RpcError::Market(e) => market_code(e.kind()),
            RpcError::Encode(_) => -32603,
        }
    }

    /// Stable snake_case error kind, if this is a domain error.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            RpcError::Market(e) => Some(e.kind()),
            _ => None,
        }
    }
}

/// Server-defined error codes, one per domain error kind.
pub fn market_code(kind: ErrorKind) -> i64 {
    match kind {
        ErrorKind::InvalidInput => -32001,
        ErrorKind::InvalidEdge => -32002,
        ErrorKind::IntervalConflict => -32003,
        ErrorKind::Unauthorized => -32004,
        ErrorKind::InvalidTransition => -32005,
        ErrorKind::NotFound => -32006,
        ErrorKind::Storage => -32010,
    }
}

/// Decode a method's params object.
pub fn parse_params<T: DeserializeOwned>(params: Value) -> Result<T, RpcError> {
    serde_json::from_value(params).map_err(|e| RpcError::InvalidParams(e.to_string()))
}

pub fn ok_result(id: Value, result: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "result": result,
    })
}

pub fn rpc_error(id: Value, code: i64, message: impl Into<String>) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": {
            "code": code,
            "message": message.into()
        }
    })
}

/// Error response carrying `data.kind` for domain errors.
pub fn error_response(id: Value, err: &RpcError) -> Value {
    let mut resp = rpc_error(id, err.code(), err.to_string());
    if let Some(kind) = err.kind() {
        resp["error"]["data"] = json!({ "kind": kind.as_str() });
    }
    resp
}
