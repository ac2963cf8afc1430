//! CORS header policy module
//!
//! The front end always answers with a wide-open policy: it exists so a
//! browser-served UI can talk to the backend through one origin during
//! development. The three headers below are added to every response.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::HeaderValue;
use hyper::Response;

use crate::logger;

pub const ALLOW_ORIGIN: &str = "*";
pub const ALLOW_METHODS: &str = "GET, POST, PUT, DELETE, OPTIONS";
pub const ALLOW_HEADERS: &str = "Content-Type, Authorization";

/// Preflight results may be cached by the browser for a day
const MAX_AGE: &str = "86400";

/// Add the fixed CORS headers to a response, unconditionally
pub fn apply(response: &mut Response<Full<Bytes>>) {
    let headers = response.headers_mut();
    headers.insert(
        "Access-Control-Allow-Origin",
        HeaderValue::from_static(ALLOW_ORIGIN),
    );
    headers.insert(
        "Access-Control-Allow-Methods",
        HeaderValue::from_static(ALLOW_METHODS),
    );
    headers.insert(
        "Access-Control-Allow-Headers",
        HeaderValue::from_static(ALLOW_HEADERS),
    );
}

/// Build 204 preflight response
///
/// The allow-* headers themselves come from `apply`, which runs on every
/// response leaving the server.
pub fn build_preflight_response() -> Response<Full<Bytes>> {
    Response::builder()
        .status(204)
        .header("Access-Control-Max-Age", MAX_AGE)
        .body(Full::new(Bytes::new()))
        .unwrap_or_else(|e| {
            logger::log_error(&format!("Failed to build preflight response: {e}"));
            Response::new(Full::new(Bytes::new()))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_sets_all_three_headers() {
        let mut response = Response::new(Full::new(Bytes::from("body")));
        apply(&mut response);

        let headers = response.headers();
        assert_eq!(headers.get("Access-Control-Allow-Origin").unwrap(), "*");
        assert_eq!(
            headers.get("Access-Control-Allow-Methods").unwrap(),
            "GET, POST, PUT, DELETE, OPTIONS"
        );
        assert_eq!(
            headers.get("Access-Control-Allow-Headers").unwrap(),
            "Content-Type, Authorization"
        );
    }

    #[test]
    fn test_apply_overwrites_existing_headers() {
        let mut response = Response::builder()
            .header("Access-Control-Allow-Origin", "https://example.com")
            .body(Full::new(Bytes::new()))
            .unwrap();
        apply(&mut response);
        assert_eq!(
            response.headers().get("Access-Control-Allow-Origin").unwrap(),
            "*"
        );
    }

    #[test]
    fn test_preflight_response() {
        let mut response = build_preflight_response();
        apply(&mut response);

        assert_eq!(response.status(), 204);
        assert_eq!(
            response.headers().get("Access-Control-Max-Age").unwrap(),
            "86400"
        );
        assert!(response.headers().contains_key("Access-Control-Allow-Methods"));
    }
}
