//! Environment-driven configuration, loaded once at startup.
//!
//! Everything the service talks to is configured here: the messaging
//! gateway credentials, the shared webhook secret, the public app URL
//! used in message bodies, and the local data paths.

use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

/// Application-level constants
pub const APP_NAME: &str = "ElderCare Connect";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default tracing filter when RUST_LOG is unset.
pub fn default_log_filter() -> String {
    "info,eldercare=debug".to_string()
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },
}

/// Process-lifetime configuration. Built from the environment in `main`,
/// then passed into the request context; never reloaded.
#[derive(Debug, Clone)]
pub struct Config {
    /// Address the HTTP server binds to.
    pub bind_addr: SocketAddr,
    /// SQLite database file.
    pub database_path: PathBuf,
    /// Directory photos are stored under.
    pub photo_dir: PathBuf,
    /// Public base URL of the app, used for dashboard links in messages
    /// and for constructing photo URLs.
    pub public_app_url: String,
    /// Shared secret required in `x-webhook-secret` on the webhook path.
    pub webhook_secret: String,
    /// Where the changefeed posts visit-update events. `None` disables
    /// emission (an external change-capture source may be used instead).
    pub changefeed_url: Option<String>,
    /// Messaging gateway account SID.
    pub twilio_account_sid: String,
    /// Messaging gateway auth token.
    pub twilio_auth_token: String,
    /// Sender number for WhatsApp messages, e.g. "+14155238886".
    pub twilio_whatsapp_number: String,
    /// Gateway API base URL. Overridable for tests.
    pub twilio_api_base: String,
}

impl Config {
    /// Load configuration from the environment.
    ///
    /// Required: `WEBHOOK_SECRET`, `TWILIO_ACCOUNT_SID`,
    /// `TWILIO_AUTH_TOKEN`, `TWILIO_WHATSAPP_NUMBER`.
    /// Everything else has a sensible default.
    pub fn from_env() -> Result<Self, ConfigError> {
        let bind_addr = match std::env::var("BIND_ADDR") {
            Ok(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue {
                name: "BIND_ADDR",
                value: raw,
            })?,
            Err(_) => SocketAddr::from(([127, 0, 0, 1], 8080)),
        };

        let data_dir = std::env::var("ELDERCARE_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| app_data_dir());

        Ok(Self {
            bind_addr,
            database_path: data_dir.join("eldercare.db"),
            photo_dir: data_dir.join("photos"),
            public_app_url: std::env::var("APP_PUBLIC_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            webhook_secret: require("WEBHOOK_SECRET")?,
            changefeed_url: std::env::var("CHANGEFEED_URL").ok(),
            twilio_account_sid: require("TWILIO_ACCOUNT_SID")?,
            twilio_auth_token: require("TWILIO_AUTH_TOKEN")?,
            twilio_whatsapp_number: require("TWILIO_WHATSAPP_NUMBER")?,
            twilio_api_base: std::env::var("TWILIO_API_BASE")
                .unwrap_or_else(|_| "https://api.twilio.com".to_string()),
        })
    }
}

fn require(name: &'static str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingVar(name))
}

/// Get the application data directory (~/ElderCareConnect by default)
pub fn app_data_dir() -> PathBuf {
    let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    home.join("ElderCareConnect")
}
