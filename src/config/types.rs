// Configuration types module
// Defines all configuration-related data structures

use crate::logger::LogFormat;
use serde::Deserialize;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub performance: PerformanceConfig,
    /// Routes served by the demo server, matched by exact path
    #[serde(default)]
    pub routes: Vec<Route>,
}

/// Server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// Filter directive for the subscriber (e.g. `info`, `respond=debug`)
    pub level: String,
    pub access_log: bool,
    /// `combined` (default), `common` or `json`
    #[serde(default)]
    pub access_log_format: LogFormat,
    /// Log file path (optional, stdout if not set)
    #[serde(default)]
    pub log_file: Option<String>,
}

/// Performance configuration
#[derive(Debug, Deserialize, Clone)]
pub struct PerformanceConfig {
    /// Keep-alive is enabled when non-zero
    pub keep_alive_timeout: u64,
    /// Seconds allowed for a client to send request headers
    pub read_timeout: u64,
    pub max_connections: Option<u64>,
}

/// A path bound to a sender
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Route {
    pub path: String,
    #[serde(flatten)]
    pub action: RouteAction,
}

/// What to send when a route matches
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RouteAction {
    /// JSON body
    Json { value: serde_json::Value },
    /// HTTP redirect
    Redirect {
        target: String,
        #[serde(default = "default_redirect_code")]
        code: u16,
    },
    /// Bare status with its reason phrase
    Status { code: u16 },
    /// Stream a file
    File {
        file: String,
        #[serde(default)]
        start: Option<u64>,
        #[serde(default)]
        end: Option<u64>,
    },
    /// Stream a file as an attachment
    Download { file: String },
}

#[allow(clippy::missing_const_for_fn)]
fn default_redirect_code() -> u16 {
    302
}

/// Routes used when the configuration defines none
pub fn default_routes() -> Vec<Route> {
    vec![
        Route {
            path: "/json".to_string(),
            action: RouteAction::Json {
                value: serde_json::json!({ "beep": "boop" }),
            },
        },
        Route {
            path: "/redirect".to_string(),
            action: RouteAction::Redirect {
                target: "https://example.com/".to_string(),
                code: default_redirect_code(),
            },
        },
        Route {
            path: "/teapot".to_string(),
            action: RouteAction::Status { code: 418 },
        },
    ]
}
