//! Request routing dispatch module
//!
//! Entry point for HTTP request processing. The dispatch table mirrors the
//! front end's two jobs: proxy `/api/` and `/health` to the backend, serve
//! everything else from the static directory.

use crate::config::{AppState, RoutesConfig};
use crate::handler::static_files;
use crate::http::{self, cors};
use crate::logger::{self, AccessLogEntry};
use crate::proxy;
use http_body_util::Full;
use hyper::body::{Body as _, Bytes, Incoming};
use hyper::{Method, Request, Response};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

/// Where a request is dispatched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    /// Answer the CORS preflight directly
    Preflight,
    /// Forward to the upstream backend
    Proxy,
    /// Serve from the static directory
    Static,
    /// 405
    MethodNotAllowed,
}

/// Main entry point for HTTP request handling
pub async fn handle_request(
    req: Request<Incoming>,
    state: Arc<AppState>,
    remote_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let query = req.uri().query().map(ToString::to_string);
    let is_head = method == Method::HEAD;

    let access_log = state
        .cached_access_log
        .load(std::sync::atomic::Ordering::Relaxed);

    let mut response = if let Some(resp) = check_body_size(&req, state.config.http.max_body_size) {
        resp
    } else {
        match route_decision(&method, &path, &state.config.routes) {
            RouteDecision::Preflight => cors::build_preflight_response(),
            RouteDecision::Proxy => proxy::forward_request(req, &state.config.proxy).await,
            RouteDecision::Static => {
                static_files::serve(
                    &path,
                    is_head,
                    &state.config.routes.static_dir,
                    &state.config.routes.index_files,
                )
                .await
            }
            RouteDecision::MethodNotAllowed => {
                logger::log_warning(&format!("Method not allowed: {method} {path}"));
                http::build_405_response()
            }
        }
    };

    cors::apply(&mut response);

    if access_log {
        let mut entry = AccessLogEntry::new(remote_addr.to_string(), method.to_string(), path);
        entry.query = query;
        entry.status = response.status().as_u16();
        entry.body_bytes = usize::try_from(
            response.body().size_hint().exact().unwrap_or(0),
        )
        .unwrap_or(usize::MAX);
        logger::log_access(&entry, &state.config.logging.access_log_format);
    }

    Ok(response)
}

/// Decide how a request is dispatched
///
/// GET/HEAD for the api prefix or the health path go upstream, everything
/// else GET/HEAD is a static asset. Mutating methods are accepted for the
/// api prefix only; the health endpoint is read-only.
pub fn route_decision(method: &Method, path: &str, routes: &RoutesConfig) -> RouteDecision {
    match *method {
        Method::OPTIONS => RouteDecision::Preflight,
        Method::GET | Method::HEAD => {
            if path.starts_with(&routes.api_prefix) || path.starts_with(&routes.health_path) {
                RouteDecision::Proxy
            } else {
                RouteDecision::Static
            }
        }
        Method::POST | Method::PUT | Method::DELETE => {
            if path.starts_with(&routes.api_prefix) {
                RouteDecision::Proxy
            } else {
                RouteDecision::MethodNotAllowed
            }
        }
        _ => RouteDecision::MethodNotAllowed,
    }
}

/// Validate Content-Length header and return 413 if exceeded
fn check_body_size<B>(req: &Request<B>, max_body_size: u64) -> Option<Response<Full<Bytes>>> {
    let content_length = req.headers().get("content-length")?;
    content_length.to_str().map_or_else(
        |_| {
            logger::log_warning("Content-Length header contains non-ASCII characters");
            None
        },
        |size_str| match size_str.parse::<u64>() {
            Ok(size) if size > max_body_size => {
                logger::log_error(&format!(
                    "Request body too large: {size} bytes (max: {max_body_size})"
                ));
                Some(http::build_413_response())
            }
            Err(_) => {
                logger::log_warning(&format!(
                    "Invalid Content-Length value: '{size_str}', skipping size check"
                ));
                None
            }
            _ => None,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn routes() -> RoutesConfig {
        RoutesConfig::default()
    }

    #[test]
    fn test_get_dispatch() {
        let r = routes();
        assert_eq!(
            route_decision(&Method::GET, "/api/borrowers", &r),
            RouteDecision::Proxy
        );
        assert_eq!(
            route_decision(&Method::GET, "/health", &r),
            RouteDecision::Proxy
        );
        assert_eq!(
            route_decision(&Method::GET, "/index.html", &r),
            RouteDecision::Static
        );
        assert_eq!(route_decision(&Method::GET, "/", &r), RouteDecision::Static);
    }

    #[test]
    fn test_head_follows_get() {
        let r = routes();
        assert_eq!(
            route_decision(&Method::HEAD, "/health", &r),
            RouteDecision::Proxy
        );
        assert_eq!(
            route_decision(&Method::HEAD, "/app.js", &r),
            RouteDecision::Static
        );
    }

    #[test]
    fn test_mutating_methods_only_proxy_api() {
        let r = routes();
        for method in [Method::POST, Method::PUT, Method::DELETE] {
            assert_eq!(
                route_decision(&method, "/api/borrowers", &r),
                RouteDecision::Proxy
            );
            // The health endpoint is read-only
            assert_eq!(
                route_decision(&method, "/health", &r),
                RouteDecision::MethodNotAllowed
            );
            assert_eq!(
                route_decision(&method, "/index.html", &r),
                RouteDecision::MethodNotAllowed
            );
        }
    }

    #[test]
    fn test_options_is_always_preflight() {
        let r = routes();
        assert_eq!(
            route_decision(&Method::OPTIONS, "/api/borrowers", &r),
            RouteDecision::Preflight
        );
        assert_eq!(
            route_decision(&Method::OPTIONS, "/index.html", &r),
            RouteDecision::Preflight
        );
    }

    #[test]
    fn test_unknown_methods_are_rejected() {
        let r = routes();
        assert_eq!(
            route_decision(&Method::PATCH, "/api/borrowers", &r),
            RouteDecision::MethodNotAllowed
        );
        assert_eq!(
            route_decision(&Method::TRACE, "/", &r),
            RouteDecision::MethodNotAllowed
        );
    }

    fn request_with_content_length(value: &str) -> Request<()> {
        Request::builder()
            .method(Method::POST)
            .uri("/api/borrowers")
            .header("content-length", value)
            .body(())
            .unwrap()
    }

    #[test]
    fn test_oversized_body_is_rejected() {
        let req = request_with_content_length("11");
        let response = check_body_size(&req, 10).unwrap();
        assert_eq!(response.status(), hyper::StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[test]
    fn test_body_at_limit_passes() {
        let req = request_with_content_length("10");
        assert!(check_body_size(&req, 10).is_none());
    }

    #[test]
    fn test_unparseable_content_length_skips_check() {
        let req = request_with_content_length("not-a-number");
        assert!(check_body_size(&req, 10).is_none());
    }

    #[test]
    fn test_missing_content_length_skips_check() {
        let req = Request::builder()
            .method(Method::GET)
            .uri("/index.html")
            .body(())
            .unwrap();
        assert!(check_body_size(&req, 10).is_none());
    }

    #[test]
    fn test_bare_api_path_is_static() {
        // "/api" without the trailing slash does not match the prefix,
        // same as the original dispatch table
        let r = routes();
        assert_eq!(
            route_decision(&Method::GET, "/api", &r),
            RouteDecision::Static
        );
    }
}
