//! Proxy error types and their JSON envelope mapping
//!
//! Every upstream failure is translated into the envelope the web UI expects:
//! `{"success": false, "message": ..., "status_code": ...}`. Connect-phase
//! failures mean the backend is down and map to 503; everything after a
//! successful connect maps to 500. An upstream HTTP error status is not an
//! error at all - it is relayed like any other response.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};
use serde::Serialize;
use thiserror::Error;

use crate::http::build_json_response;

/// Failure while forwarding a request to the upstream
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("Cannot connect to upstream: {0}")]
    Connect(#[source] std::io::Error),

    #[error("Cannot connect to upstream: connection timed out")]
    ConnectTimeout,

    #[error("Proxy error: invalid upstream authority '{0}'")]
    Authority(String),

    #[error("Proxy error: upstream handshake failed: {0}")]
    Handshake(#[source] hyper::Error),

    #[error("Proxy error: failed to read request body: {0}")]
    RequestBody(#[source] hyper::Error),

    #[error("Proxy error: failed to send request upstream: {0}")]
    Send(#[source] hyper::Error),

    #[error("Proxy error: upstream did not respond in time")]
    ResponseTimeout,

    #[error("Proxy error: failed to read upstream response body: {0}")]
    ResponseBody(#[source] hyper::Error),
}

impl ProxyError {
    /// HTTP status reported to the client for this failure
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Connect(_) | Self::ConnectTimeout => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// JSON error envelope returned for proxy failures
#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    pub success: bool,
    pub message: String,
    pub status_code: u16,
}

/// Translate a proxy failure into its JSON error response
pub fn build_error_response(err: &ProxyError) -> Response<Full<Bytes>> {
    let status = err.status();
    let envelope = ErrorEnvelope {
        success: false,
        message: err.to_string(),
        status_code: status.as_u16(),
    };
    build_json_response(status, &envelope)
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt as _;

    async fn body_json(response: Response<Full<Bytes>>) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_connect_errors_are_503() {
        let err = ProxyError::Connect(std::io::Error::from(std::io::ErrorKind::ConnectionRefused));
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(ProxyError::ConnectTimeout.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_other_errors_are_500() {
        assert_eq!(
            ProxyError::ResponseTimeout.status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ProxyError::Authority("bad\nhost".to_string()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_envelope_shape() {
        let err = ProxyError::Connect(std::io::Error::from(std::io::ErrorKind::ConnectionRefused));
        let response = build_error_response(&err);
        assert_eq!(response.status(), 503);
        assert_eq!(
            response.headers().get("Content-Type").unwrap(),
            "application/json"
        );

        let json = body_json(response).await;
        assert_eq!(json["success"], false);
        assert_eq!(json["status_code"], 503);
        let message = json["message"].as_str().unwrap();
        assert!(message.starts_with("Cannot connect to upstream"));
    }

    #[tokio::test]
    async fn test_envelope_status_code_mirrors_http_status() {
        let response = build_error_response(&ProxyError::ResponseTimeout);
        assert_eq!(response.status(), 500);
        let json = body_json(response).await;
        assert_eq!(json["status_code"], 500);
        assert!(json["message"].as_str().unwrap().starts_with("Proxy error"));
    }
}
