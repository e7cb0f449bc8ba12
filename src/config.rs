use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://localhost:5000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration for the agency-console CLI.
///
/// Resolution order: built-in defaults, then `AGENCY_CONSOLE_*` environment
/// variables, then command line flags (applied by the CLI through the setters).
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the platform API, without a trailing slash
    pub api_base_url: String,

    /// Where the signed-in session (token + user) is persisted
    pub session_path: PathBuf,

    /// Output format: "human" (default) or "json"
    pub output_format: String,

    /// Log level: "info", "debug", "warn", "error" (default: "warn")
    pub log_level: String,

    /// Global timeout applied to every HTTP request
    pub timeout_secs: u64,
}

impl Config {
    /// Create a new config with defaults
    pub fn new() -> Self {
        let session_path = dirs::config_dir()
            .unwrap_or_else(|| env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
            .join("agency-console")
            .join("session.json");

        Config {
            api_base_url: DEFAULT_API_URL.to_string(),
            session_path,
            output_format: "human".to_string(),
            log_level: "warn".to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    pub fn set_api_base_url(&mut self, url: &str) {
        self.api_base_url = url.trim_end_matches('/').to_string();
    }

    pub fn set_session_path(&mut self, path: PathBuf) {
        self.session_path = path;
    }

    pub fn get_output_format(&self) -> &str {
        &self.output_format
    }

    /// Set output format ("human" or "json")
    pub fn set_output_format(&mut self, format: String) {
        self.output_format = format;
    }

    pub fn get_log_level(&self) -> &str {
        &self.log_level
    }

    pub fn set_log_level(&mut self, level: String) {
        self.log_level = level;
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Load config from environment variables
    ///
    /// Environment variables:
    /// - `AGENCY_CONSOLE_API_URL`: API base URL
    /// - `AGENCY_CONSOLE_SESSION_FILE`: session file path
    /// - `AGENCY_CONSOLE_OUTPUT_FORMAT`: "human" or "json"
    /// - `AGENCY_CONSOLE_LOG_LEVEL`: log level
    /// - `AGENCY_CONSOLE_TIMEOUT_SECS`: request timeout in seconds
    pub fn from_env() -> Self {
        let mut config = Config::new();

        if let Ok(url) = env::var("AGENCY_CONSOLE_API_URL") {
            config.set_api_base_url(&url);
        }

        if let Ok(path) = env::var("AGENCY_CONSOLE_SESSION_FILE") {
            config.session_path = PathBuf::from(path);
        }

        if let Ok(format) = env::var("AGENCY_CONSOLE_OUTPUT_FORMAT") {
            config.output_format = format;
        }

        if let Ok(level) = env::var("AGENCY_CONSOLE_LOG_LEVEL") {
            config.log_level = level;
        }

        if let Some(secs) = env::var("AGENCY_CONSOLE_TIMEOUT_SECS")
            .ok()
            .and_then(|s| parse_timeout_secs(&s))
        {
            config.timeout_secs = secs;
        }

        config
    }
}

/// Whole seconds, zero rejected.
fn parse_timeout_secs(raw: &str) -> Option<u64> {
    raw.trim().parse::<u64>().ok().filter(|s| *s > 0)
}

impl Default for Config {
    fn default() -> Self {
        Config::new()
    }
}
