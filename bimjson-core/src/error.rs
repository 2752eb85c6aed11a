use thiserror::Error;

/// All failures surfaced by this client.
///
/// Server-side business failures arrive as `Remote` with the server's
/// message verbatim; the client never distinguishes sub-kinds. None of
/// these are retried internally.
#[derive(Debug, Error)]
pub enum RpcError {
    /// Transport-level failure reaching the server.
    #[error("connection error: {0}")]
    Connection(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Response body does not match the expected envelope shape.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The server answered with `response.exception`.
    #[error("{0}")]
    Remote(String),

    /// Login completed without yielding a usable token, or the auth
    /// interface could not be resolved.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// Interface name unresolvable even after prefix translation.
    #[error("'{0}' does not name a valid interface on this server")]
    UnknownInterface(String),

    /// Method name not present in the interface's discovered method set.
    #[error("'{interface}' has no method named '{method}'")]
    UnknownMethod { interface: String, method: String },
}

impl RpcError {
    pub fn connection(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        RpcError::Connection(Box::new(source))
    }

    pub fn protocol(message: impl Into<String>) -> Self {
        RpcError::Protocol(message.into())
    }

    pub fn remote(message: impl Into<String>) -> Self {
        RpcError::Remote(message.into())
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        RpcError::Authentication(message.into())
    }

    pub fn unknown_method(interface: impl Into<String>, method: impl Into<String>) -> Self {
        RpcError::UnknownMethod {
            interface: interface.into(),
            method: method.into(),
        }
    }

    /// True for the `Remote` variant, i.e. the request reached the server
    /// and the server rejected it.
    pub fn is_remote(&self) -> bool {
        matches!(self, RpcError::Remote(_))
    }
}

impl From<serde_json::Error> for RpcError {
    fn from(err: serde_json::Error) -> Self {
        RpcError::Protocol(format!("JSON error: {}", err))
    }
}
