// Configuration types module
// Defines all configuration-related data structures

use serde::Deserialize;

/// Main configuration structure
///
/// Read once from the environment at startup and never mutated afterwards.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub http: HttpConfig,
    pub performance: PerformanceConfig,
    pub logging: LoggingConfig,
    pub content: ContentConfig,
    pub health: HealthConfig,
    pub affinity: AffinityConfig,
}

/// Server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Value of the `Server` response header
    pub name: String,
    /// Tokio worker threads; `None` means one per CPU core
    pub workers: Option<usize>,
}

/// HTTP configuration
#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    pub max_body_size: u64,
    /// Honor `X-Forwarded-For` when logging the client address
    pub trust_proxy: bool,
}

/// Performance configuration (all values in seconds)
#[derive(Debug, Deserialize, Clone)]
pub struct PerformanceConfig {
    pub keep_alive_timeout: u64,
    /// Budget for reading a request's header section
    pub request_timeout: u64,
    /// Upper bound on the lifetime of a single connection
    pub connection_timeout: u64,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub access_log: bool,
}

/// Content configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ContentConfig {
    /// Directory scanned for HTML files at startup; also holds `assets/`
    pub public_dir: String,
}

/// Health endpoint configuration
#[derive(Debug, Deserialize, Clone)]
pub struct HealthConfig {
    pub api_key: String,
}

/// CPU affinity configuration
#[derive(Debug, Deserialize, Clone)]
pub struct AffinityConfig {
    /// Re-spawn the server as a child pinned to `cpu_core`
    pub single_core: bool,
    pub cpu_core: usize,
}
