//! Configuration module

use std::env;

/// Application configuration (the app "args")
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,

    /// Platform REST API base URL
    pub api_path: String,

    /// Platform API access id
    pub api_access_id: Option<String>,

    /// Platform API secret key
    pub api_secret_key: Option<String>,

    /// Default owner used when validating entities
    pub owner: Option<String>,

    /// Key/value store context for playbook variables
    pub playbook_db_context: String,

    /// Environment (development, production)
    pub environment: String,

    /// Emit JSON log lines instead of plain text
    pub log_json: bool,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),

            api_path: env::var("TC_API_PATH")
                .map(|p| p.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| "https://api.threatconnect.com".to_string()),

            api_access_id: non_empty("TC_API_ACCESS_ID"),

            api_secret_key: non_empty("TC_API_SECRET_KEY"),

            owner: non_empty("TC_OWNER"),

            playbook_db_context: env::var("TC_PLAYBOOK_DB_CONTEXT")
                .unwrap_or_else(|_| "local-context".to_string()),

            environment: env::var("ENVIRONMENT")
                .unwrap_or_else(|_| "development".to_string()),

            log_json: env::var("LOG_FORMAT")
                .map(|f| is_json_format(&f))
                .unwrap_or(false),
        }
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Both halves of the API credentials are present
    pub fn has_credentials(&self) -> bool {
        self.api_access_id.is_some() && self.api_secret_key.is_some()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            api_path: "https://api.threatconnect.com".to_string(),
            api_access_id: None,
            api_secret_key: None,
            owner: None,
            playbook_db_context: "local-context".to_string(),
            environment: "development".to_string(),
            log_json: false,
        }
    }
}

fn is_json_format(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case("json")
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}
