//! webfront - development web front end
//!
//! Serves static web assets from a directory and reverse-proxies a fixed set
//! of path prefixes (`/api/`, `/health`) to a single upstream backend,
//! adding CORS headers to every response.

pub mod config;
pub mod handler;
pub mod http;
pub mod logger;
pub mod proxy;
pub mod server;
