// Configuration module entry point
// Loads environment-backed settings once at startup

mod state;
mod types;

use std::net::SocketAddr;

// Re-export public types
pub use state::AppState;
pub use types::{
    AffinityConfig, Config, ContentConfig, HealthConfig, HttpConfig, LoggingConfig,
    PerformanceConfig, ServerConfig,
};

/// Compiled-in health endpoint key. Deployments are expected to override it;
/// the health endpoint refuses to report while this value is still active.
pub const DEFAULT_API_KEY: &str = "change-me-super-secret-key";

impl Config {
    /// Load configuration from `config.toml` (optional) plus `SERVER_*`
    /// environment variables layered over compiled-in defaults.
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from the specified file path (without extension).
    ///
    /// Environment variables use a double-underscore section separator, e.g.
    /// `SERVER_SERVER__PORT=9000` or `SERVER_HEALTH__API_KEY=...`.
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix("SERVER")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("server.name", "preload-webserver/0.1")?
            .set_default("http.max_body_size", 1_048_576)? // 1MB
            .set_default("http.trust_proxy", false)?
            .set_default("performance.keep_alive_timeout", 65)?
            .set_default("performance.request_timeout", 30)?
            .set_default("performance.connection_timeout", 300)?
            .set_default("logging.access_log", true)?
            .set_default("content.public_dir", "public")?
            .set_default("health.api_key", DEFAULT_API_KEY)?
            .set_default("affinity.single_core", false)?
            .set_default("affinity.cpu_core", 0)?
            .build()?;

        settings.try_deserialize()
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        // A file name that cannot exist keeps the test independent of the
        // working directory.
        let cfg = Config::load_from("no-such-config-file").expect("defaults should load");
        assert_eq!(cfg.server.host, "127.0.0.1");
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.server.workers, None);
        assert_eq!(cfg.http.max_body_size, 1_048_576);
        assert!(!cfg.http.trust_proxy);
        assert!(cfg.logging.access_log);
        assert_eq!(cfg.content.public_dir, "public");
        assert_eq!(cfg.health.api_key, DEFAULT_API_KEY);
        assert!(!cfg.affinity.single_core);
        assert_eq!(cfg.affinity.cpu_core, 0);
    }

    #[test]
    fn test_socket_addr() {
        let cfg = Config::load_from("no-such-config-file").expect("defaults should load");
        let addr = cfg.get_socket_addr().expect("default address should parse");
        assert_eq!(addr.port(), 8080);
        assert!(addr.ip().is_loopback());
    }
}
