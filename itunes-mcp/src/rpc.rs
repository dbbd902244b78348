//! JSON-RPC 2.0 message shapes for the stdio transport.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Deserialize)]
pub struct Request {
    #[serde(default)]
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

#[derive(Debug, Serialize)]
pub struct Response {
    pub jsonrpc: &'static str,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

impl Response {
    pub fn success(id: Value, result: Value) -> Self {
        Response {
            jsonrpc: "2.0",
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(id: Value, error: RpcError) -> Self {
        Response {
            jsonrpc: "2.0",
            id,
            result: None,
            error: Some(error),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

pub const CODE_PARSE_ERROR: i64 = -32700;
pub const CODE_METHOD_NOT_FOUND: i64 = -32601;
pub const CODE_INVALID_PARAMS: i64 = -32602;
pub const CODE_INTERNAL_ERROR: i64 = -32603;
pub const CODE_NOT_FOUND: i64 = -32001;
pub const CODE_BUSY: i64 = -32002;
pub const CODE_TIMEOUT: i64 = -32003;
pub const CODE_SCRIPT_FAILED: i64 = -32004;
pub const CODE_CORRUPT: i64 = -32005;

/// Maps the core error taxonomy onto a JSON-RPC error code,
/// reusing the standard codes where they already mean the same thing
/// (`InvalidArgument` -> "Invalid params") and the -320xx server-error
/// range for the kinds JSON-RPC has no standard code for.
pub fn error_to_rpc(error: &itunes_core::Error) -> RpcError {
    use itunes_core::Error;

    let (code, message) = match error {
        Error::InvalidArgument(msg) => (CODE_INVALID_PARAMS, msg.clone()),
        Error::NotFound(msg) => (CODE_NOT_FOUND, msg.clone()),
        Error::Busy => (CODE_BUSY, error.to_string()),
        Error::Timeout(_) => (CODE_TIMEOUT, error.to_string()),
        Error::ScriptFailed(msg) => (CODE_SCRIPT_FAILED, msg.clone()),
        Error::Corrupt(msg) => (CODE_CORRUPT, msg.clone()),
        Error::Database(_) | Error::Io(_) | Error::Config(_) | Error::Internal(_) => {
            (CODE_INTERNAL_ERROR, error.to_string())
        }
    };

    RpcError { code, message, data: None }
}
