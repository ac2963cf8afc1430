//! Upstream proxy module
//!
//! Forwards `/api/` and `/health` requests to the single backend origin.
//! Every request opens its own HTTP/1.1 connection - there is no pooling,
//! no retries and no streaming; bodies are collected whole on both legs.

pub mod error;

pub use error::{build_error_response, ProxyError};

use std::time::Duration;

use http_body_util::{BodyExt as _, Full};
use hyper::body::{Bytes, Incoming};
use hyper::header::{HeaderName, HeaderValue, HOST, USER_AGENT};
use hyper::{Request, Response};
use hyper_util::rt::TokioIo;
use tokio::net::TcpStream;

use crate::config::ProxyConfig;
use crate::logger;

/// Bound on each phase of the exchange: connect, awaiting the response
/// head, and collecting the response body
const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(10);

/// User-Agent set when the client did not send one
const PROXY_USER_AGENT: &str = "webfront-proxy/0.1";

/// Forward a request to the upstream and relay its response
///
/// Failures never propagate: they are mapped to the JSON error envelope
/// (503 when the backend cannot be reached, 500 otherwise).
pub async fn forward_request(
    req: Request<Incoming>,
    config: &ProxyConfig,
) -> Response<Full<Bytes>> {
    let (parts, body) = req.into_parts();

    let body = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            let err = ProxyError::RequestBody(e);
            logger::log_error(&err.to_string());
            return build_error_response(&err);
        }
    };

    match send_upstream(&parts, body, config).await {
        Ok(response) => response,
        Err(err) => {
            logger::log_error(&format!(
                "{} {} -> {}",
                parts.method, parts.uri, err
            ));
            build_error_response(&err)
        }
    }
}

/// Open a connection to the upstream, send the request, collect the response
async fn send_upstream(
    parts: &hyper::http::request::Parts,
    body: Bytes,
    config: &ProxyConfig,
) -> Result<Response<Full<Bytes>>, ProxyError> {
    send_upstream_with_timeout(parts, body, config, UPSTREAM_TIMEOUT).await
}

/// The timeout bounds every phase: connect, sending the request, and
/// reading the response body. A stalled upstream must surface as an error
/// envelope, not a hung client connection.
async fn send_upstream_with_timeout(
    parts: &hyper::http::request::Parts,
    body: Bytes,
    config: &ProxyConfig,
    timeout: Duration,
) -> Result<Response<Full<Bytes>>, ProxyError> {
    let authority = format!("{}:{}", config.upstream_host, config.upstream_port);

    let stream = match tokio::time::timeout(timeout, TcpStream::connect(&authority)).await {
        Ok(Ok(stream)) => stream,
        Ok(Err(e)) => return Err(ProxyError::Connect(e)),
        Err(_) => return Err(ProxyError::ConnectTimeout),
    };

    let io = TokioIo::new(stream);
    let (mut sender, conn) = hyper::client::conn::http1::handshake(io)
        .await
        .map_err(ProxyError::Handshake)?;

    // The connection task drives the exchange; it ends when sender is dropped
    tokio::spawn(async move {
        if let Err(err) = conn.await {
            logger::log_error(&format!("Upstream connection error: {err}"));
        }
    });

    let request = build_upstream_request(parts, body, &authority)?;

    let response = match tokio::time::timeout(timeout, sender.send_request(request)).await {
        Ok(Ok(response)) => response,
        Ok(Err(e)) => return Err(ProxyError::Send(e)),
        Err(_) => return Err(ProxyError::ResponseTimeout),
    };

    // The body read gets its own bound: an upstream that sends headers and
    // then stalls mid-body must not hang the exchange
    let (head, body) = response.into_parts();
    let bytes = match tokio::time::timeout(timeout, body.collect()).await {
        Ok(Ok(collected)) => collected.to_bytes(),
        Ok(Err(e)) => return Err(ProxyError::ResponseBody(e)),
        Err(_) => return Err(ProxyError::ResponseTimeout),
    };

    // Relay status and headers verbatim, minus hop-by-hop headers
    let mut relayed = Response::new(Full::new(bytes));
    *relayed.status_mut() = head.status;
    for (name, value) in &head.headers {
        if !is_hop_by_hop(name) {
            relayed.headers_mut().append(name.clone(), value.clone());
        }
    }

    Ok(relayed)
}

/// Build the request sent upstream: original method, path and body, client
/// headers copied minus hop-by-hop, Host rewritten to the upstream authority
fn build_upstream_request(
    parts: &hyper::http::request::Parts,
    body: Bytes,
    authority: &str,
) -> Result<Request<Full<Bytes>>, ProxyError> {
    let mut request = Request::new(Full::new(body));
    *request.method_mut() = parts.method.clone();
    *request.uri_mut() = parts.uri.clone();

    for (name, value) in &parts.headers {
        if is_hop_by_hop(name) || name == HOST {
            continue;
        }
        request.headers_mut().append(name.clone(), value.clone());
    }

    let host = HeaderValue::try_from(authority)
        .map_err(|_| ProxyError::Authority(authority.to_string()))?;
    request.headers_mut().insert(HOST, host);

    if !request.headers().contains_key(USER_AGENT) {
        request
            .headers_mut()
            .insert(USER_AGENT, HeaderValue::from_static(PROXY_USER_AGENT));
    }

    Ok(request)
}

/// Hop-by-hop headers are connection-scoped and must not be forwarded
/// (RFC 7230 section 6.1)
fn is_hop_by_hop(name: &HeaderName) -> bool {
    matches!(
        name.as_str(),
        "connection"
            | "keep-alive"
            | "proxy-authenticate"
            | "proxy-authorization"
            | "proxy-connection"
            | "te"
            | "trailer"
            | "transfer-encoding"
            | "upgrade"
    )
}
