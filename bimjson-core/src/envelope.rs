// BIMserver JSON envelope codec.
//
// Every call is a single POST whose body wraps one request:
//
//   {"request": {"interface": ..., "method": ..., "parameters": {...}},
//    "token": "..."}            <- token only after login, omitted otherwise
//
// and whose response wraps either a result or an exception:
//
//   {"response": {"result": ...}}
//   {"response": {"exception": {"message": "..."}}}

use crate::error::RpcError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Outgoing request body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestEnvelope {
    pub request: RequestBody,
    /// Auth token; serialized only when present, never as `null`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

/// The single call carried by a request envelope. The interface name is
/// the short discovered name; parameters are passed by name, not position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestBody {
    pub interface: String,
    pub method: String,
    pub parameters: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct ResponseEnvelope {
    response: ResponseBody,
}

#[derive(Debug, Deserialize)]
struct ResponseBody {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    exception: Option<Value>,
}

/// Encode one call as a UTF-8 JSON body.
pub fn encode_request(
    interface: &str,
    method: &str,
    parameters: Map<String, Value>,
    token: Option<&str>,
) -> Result<String, RpcError> {
    let envelope = RequestEnvelope {
        request: RequestBody {
            interface: interface.to_string(),
            method: method.to_string(),
            parameters,
        },
        token: token.map(str::to_string),
    };
    let body = serde_json::to_string(&envelope)?;
    Ok(body)
}

/// Decode a response body into its result value.
///
/// A non-null `response.exception` becomes `RpcError::Remote` carrying the
/// server's message verbatim. A missing `result` decodes as `Value::Null`
/// (void methods legitimately return nothing).
pub fn decode_response(body: &str) -> Result<Value, RpcError> {
    let envelope: ResponseEnvelope = serde_json::from_str(body)
        .map_err(|e| RpcError::protocol(format!("malformed response envelope: {}", e)))?;

    // A literal `"exception": null` counts as no exception.
    if let Some(exception) = envelope.response.exception {
        if !exception.is_null() {
            let message = exception
                .get("message")
                .and_then(Value::as_str)
                .ok_or_else(|| {
                    RpcError::protocol(format!("exception without a message: {}", exception))
                })?;
            return Err(RpcError::remote(message));
        }
    }

    Ok(envelope.response.result.unwrap_or(Value::Null))
}
