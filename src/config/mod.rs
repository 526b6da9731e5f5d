// Configuration module entry point
// Loads the demo server configuration and holds the shared runtime state

mod types;

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::AtomicUsize;

pub use types::{Config, LoggingConfig, RouteAction};

impl Config {
    /// Load configuration from `config.toml` (optional) and `RESPOND_*` variables
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from specified file path (without extension)
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix("RESPOND")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("performance.keep_alive_timeout", 75)?
            .set_default("performance.read_timeout", 30)?
            .build()?;

        settings.try_deserialize()
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }
}

/// Application state shared by every connection
pub struct AppState {
    pub config: Config,
    /// Exact-path route table
    pub routes: HashMap<String, RouteAction>,
    pub active_connections: AtomicUsize,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let routes = if config.routes.is_empty() {
            types::default_routes()
        } else {
            config.routes.clone()
        };

        Self {
            routes: routes.into_iter().map(|r| (r.path, r.action)).collect(),
            config,
            active_connections: AtomicUsize::new(0),
        }
    }
}
