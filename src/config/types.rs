// Configuration types module
// Defines all configuration-related data structures

use serde::Deserialize;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub proxy: ProxyConfig,
    #[serde(default)]
    pub routes: RoutesConfig,
    pub logging: LoggingConfig,
    pub performance: PerformanceConfig,
    pub http: HttpConfig,
}

/// Server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

/// Upstream backend configuration
///
/// A single origin; every proxied request opens its own connection.
#[derive(Debug, Deserialize, Clone)]
pub struct ProxyConfig {
    pub upstream_host: String,
    pub upstream_port: u16,
}

/// Routes configuration
#[derive(Debug, Deserialize, Clone)]
pub struct RoutesConfig {
    /// Directory static assets are served from
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
    /// Index files tried for directory requests, in order
    #[serde(default = "default_index_files")]
    pub index_files: Vec<String>,
    /// Path prefix forwarded to the upstream for all methods
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,
    /// Path prefix forwarded to the upstream for GET/HEAD only
    #[serde(default = "default_health_path")]
    pub health_path: String,
}

#[allow(clippy::missing_const_for_fn)]
fn default_static_dir() -> String {
    "web".to_string()
}

#[allow(clippy::missing_const_for_fn)]
fn default_index_files() -> Vec<String> {
    vec!["index.html".to_string(), "index.htm".to_string()]
}

#[allow(clippy::missing_const_for_fn)]
fn default_api_prefix() -> String {
    "/api/".to_string()
}

#[allow(clippy::missing_const_for_fn)]
fn default_health_path() -> String {
    "/health".to_string()
}

impl Default for RoutesConfig {
    fn default() -> Self {
        Self {
            static_dir: default_static_dir(),
            index_files: default_index_files(),
            api_prefix: default_api_prefix(),
            health_path: default_health_path(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub access_log: bool,
    /// Access log format (common or json)
    #[serde(default = "default_access_log_format")]
    pub access_log_format: String,
    /// Access log file path (optional, stdout if not set)
    #[serde(default)]
    pub access_log_file: Option<String>,
    /// Error log file path (optional, stderr if not set)
    #[serde(default)]
    pub error_log_file: Option<String>,
}

#[allow(clippy::missing_const_for_fn)]
fn default_access_log_format() -> String {
    "common".to_string()
}

/// Performance configuration
#[derive(Debug, Deserialize, Clone)]
pub struct PerformanceConfig {
    pub keep_alive_timeout: u64,
    pub read_timeout: u64,
    pub write_timeout: u64,
    pub max_connections: Option<u64>,
}

/// HTTP configuration
#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    pub server_name: String,
    pub max_body_size: u64,
}
