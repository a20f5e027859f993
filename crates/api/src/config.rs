use std::time::Duration;

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Interval between offline-detection sweeps (default: `30` seconds).
    pub offline_check_interval: Duration,
    /// Interval between WebSocket keepalive pings (default: `30` seconds).
    pub ws_heartbeat_interval: Duration,
    /// Wall-clock budget for a parsing script (default: `500` ms).
    pub script_timeout: Duration,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                      | Default                 |
    /// |------------------------------|-------------------------|
    /// | `HOST`                       | `0.0.0.0`               |
    /// | `PORT`                       | `3000`                  |
    /// | `CORS_ORIGINS`               | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`       | `30`                    |
    /// | `OFFLINE_CHECK_INTERVAL_SECS`| `30`                    |
    /// | `WS_HEARTBEAT_SECS`          | `30`                    |
    /// | `SCRIPT_TIMEOUT_MS`          | `500`                   |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let offline_check_secs: u64 = std::env::var("OFFLINE_CHECK_INTERVAL_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("OFFLINE_CHECK_INTERVAL_SECS must be a valid u64");

        let ws_heartbeat_secs: u64 = std::env::var("WS_HEARTBEAT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("WS_HEARTBEAT_SECS must be a valid u64");

        let script_timeout_ms: u64 = std::env::var("SCRIPT_TIMEOUT_MS")
            .unwrap_or_else(|_| "500".into())
            .parse()
            .expect("SCRIPT_TIMEOUT_MS must be a valid u64");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            offline_check_interval: Duration::from_secs(offline_check_secs),
            ws_heartbeat_interval: Duration::from_secs(ws_heartbeat_secs),
            script_timeout: Duration::from_millis(script_timeout_ms),
        }
    }
}
