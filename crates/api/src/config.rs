use std::path::PathBuf;
use std::time::Duration;

use zoneops_canvas::client::DEFAULT_REQUEST_TIMEOUT;
use zoneops_canvas::{CanvasConfig, RetryPolicy};
use zoneops_ledger::DEFAULT_RETENTION;
use zoneops_pipeline::MacroSettings;

/// Server configuration loaded from environment variables.
///
/// Server fields have defaults suitable for local development; the canvas
/// connection must be provided.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `300`). Macros over large
    /// zones issue hundreds of remote calls.
    pub request_timeout_secs: u64,
    /// Remote canvas connection.
    pub canvas: CanvasConfig,
    /// Deletion ledger file (default: `deleted_records.json`).
    pub ledger_path: PathBuf,
    /// Records kept in the ledger (default: `50`).
    pub ledger_retention: usize,
    /// Inward margin for zone membership tests (default: `0`).
    pub zone_margin: f64,
    /// Attempts per remote call, including the first (default: `3`).
    pub retry_attempts: u32,
    /// Pause between attempts in milliseconds (default: `500`).
    pub retry_delay_ms: u64,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `300`                      |
    /// | `CANVAS_SERVER_URL`    | required                   |
    /// | `CANVAS_ID`            | required                   |
    /// | `CANVAS_API_TOKEN`     | required                   |
    /// | `LEDGER_PATH`          | `deleted_records.json`     |
    /// | `LEDGER_RETENTION`     | `50`                       |
    /// | `ZONE_MARGIN`          | `0`                        |
    /// | `RETRY_ATTEMPTS`       | `3`                        |
    /// | `RETRY_DELAY_MS`       | `500`                      |
    ///
    /// Panics on missing or malformed values so misconfiguration fails at
    /// startup.
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
            .unwrap_or_else(|_| "300".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let canvas = CanvasConfig {
            server_url: std::env::var("CANVAS_SERVER_URL").expect("CANVAS_SERVER_URL must be set"),
            canvas_id: std::env::var("CANVAS_ID").expect("CANVAS_ID must be set"),
            api_token: std::env::var("CANVAS_API_TOKEN").expect("CANVAS_API_TOKEN must be set"),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        };

        let ledger_path = PathBuf::from(
            std::env::var("LEDGER_PATH").unwrap_or_else(|_| "deleted_records.json".into()),
        );

        let ledger_retention: usize = std::env::var("LEDGER_RETENTION")
            .unwrap_or_else(|_| DEFAULT_RETENTION.to_string())
            .parse()
            .expect("LEDGER_RETENTION must be a valid usize");

        let zone_margin: f64 = std::env::var("ZONE_MARGIN")
            .unwrap_or_else(|_| "0".into())
            .parse()
            .expect("ZONE_MARGIN must be a number");

        let retry_attempts: u32 = std::env::var("RETRY_ATTEMPTS")
            .unwrap_or_else(|_| "3".into())
            .parse()
            .expect("RETRY_ATTEMPTS must be a valid u32");

        let retry_delay_ms: u64 = std::env::var("RETRY_DELAY_MS")
            .unwrap_or_else(|_| "500".into())
            .parse()
            .expect("RETRY_DELAY_MS must be a valid u64");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            canvas,
            ledger_path,
            ledger_retention,
            zone_margin,
            retry_attempts,
            retry_delay_ms,
        }
    }

    pub fn macro_settings(&self) -> MacroSettings {
        MacroSettings {
            zone_margin: self.zone_margin,
            retry: RetryPolicy {
                attempts: self.retry_attempts,
                delay: Duration::from_millis(self.retry_delay_ms),
            },
            ..Default::default()
        }
    }
}
