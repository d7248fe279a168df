//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Session cookie configuration.
    pub session: SessionConfig,
    /// GitHub OAuth and API configuration.
    pub github: GitHubConfig,
    /// CAPTCHA verification configuration.
    #[serde(default)]
    pub captcha: CaptchaConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// Session cookie configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Secret key for signing session tokens.
    pub secret: String,
    /// Session lifetime in hours.
    #[serde(default = "default_session_ttl_hours")]
    pub ttl_hours: i64,
    /// Whether the cookie is marked `Secure` (HTTPS only).
    #[serde(default)]
    pub secure_cookie: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            secret: "change-me-in-production".to_string(),
            ttl_hours: default_session_ttl_hours(),
            secure_cookie: false,
        }
    }
}

fn default_session_ttl_hours() -> i64 {
    336 // 14 days
}

/// GitHub OAuth application and API configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubConfig {
    /// OAuth application client ID.
    pub client_id: String,
    /// OAuth application client secret.
    pub client_secret: String,
    /// Base URL for the OAuth endpoints.
    #[serde(default = "default_oauth_url")]
    pub oauth_url: String,
    /// Base URL for the REST API.
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// User agent sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Timeout for outbound requests in seconds.
    #[serde(default = "default_http_timeout")]
    pub http_timeout_secs: u64,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            oauth_url: default_oauth_url(),
            api_url: default_api_url(),
            user_agent: default_user_agent(),
            http_timeout_secs: default_http_timeout(),
        }
    }
}

fn default_oauth_url() -> String {
    "https://github.com".to_string()
}

fn default_api_url() -> String {
    "https://api.github.com".to_string()
}

fn default_user_agent() -> String {
    format!("gitreport/{}", env!("CARGO_PKG_VERSION"))
}

fn default_http_timeout() -> u64 {
    10
}

/// CAPTCHA verification configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CaptchaConfig {
    /// Verification endpoint (reCAPTCHA/hCaptcha style `siteverify`).
    #[serde(default = "default_captcha_verify_url")]
    pub verify_url: String,
    /// Site key rendered into the public form.
    #[serde(default)]
    pub site_key: String,
    /// Server-side secret sent to the verification endpoint.
    #[serde(default)]
    pub secret: String,
    /// Pins the verification outcome, skipping the remote call.
    #[serde(default, rename = "override")]
    pub override_result: Option<bool>,
    /// Timeout for the verification call in seconds.
    #[serde(default = "default_http_timeout")]
    pub http_timeout_secs: u64,
}

impl Default for CaptchaConfig {
    fn default() -> Self {
        Self {
            verify_url: default_captcha_verify_url(),
            site_key: String::new(),
            secret: String::new(),
            override_result: None,
            http_timeout_secs: default_http_timeout(),
        }
    }
}

fn default_captcha_verify_url() -> String {
    "https://www.google.com/recaptcha/api/siteverify".to_string()
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("GITREPORT").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
