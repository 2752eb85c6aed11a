// Blocking HTTP transport. One operation: POST a JSON body to the fixed
// endpoint and hand back the response text. Retries, pooling and timeouts
// beyond the client-level deadline are not this layer's business.

use bimjson_core::RpcError;
use reqwest::blocking::Client as HttpClient;
use std::time::Duration;
use tracing::{debug, trace};

/// The fixed API sub-path every BIMserver deployment serves JSON on.
const API_PATH: &str = "/json";

#[derive(Debug)]
pub struct HttpTransport {
    url: String,
    http_client: HttpClient,
}

impl HttpTransport {
    /// Build a transport for `address`, normalizing it into a full endpoint
    /// URL (see [`normalize_url`]).
    pub fn new(address: &str, timeout_ms: u64) -> Result<Self, RpcError> {
        let http_client = HttpClient::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .map_err(RpcError::connection)?;

        Ok(Self {
            url: normalize_url(address),
            http_client,
        })
    }

    /// The normalized endpoint URL this transport posts to.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Perform one blocking round trip. A non-2xx status is a connection
    /// error; the envelope codec never sees it.
    pub fn post(&self, body: String) -> Result<String, RpcError> {
        debug!("POST {} ({} bytes)", self.url, body.len());
        trace!("request body: {}", body);

        let response = self
            .http_client
            .post(&self.url)
            .header("Content-Type", "application/json; charset=utf-8")
            .body(body)
            .send()
            .map_err(RpcError::connection)?;

        let status = response.status();
        let text = response.text().map_err(RpcError::connection)?;

        if !status.is_success() {
            // Non-2xx is a transport failure, not an envelope to decode.
            return Err(RpcError::Connection(
                format!("HTTP {} from {}: {}", status, self.url, text).into(),
            ));
        }

        trace!("response body: {}", text);
        Ok(text)
    }
}

/// Normalize a user-supplied server address into the endpoint URL:
/// trailing slashes stripped, `http://` prepended when no scheme is given,
/// the fixed `/json` sub-path appended.
pub fn normalize_url(address: &str) -> String {
    let trimmed = address.trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        format!("{}{}", trimmed, API_PATH)
    } else {
        format!("http://{}{}", trimmed, API_PATH)
    }
}
