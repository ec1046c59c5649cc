//! Configuration module
//!
//! All settings come from environment variables. Credentials are required
//! and have no embedded fallback: startup fails fast when one is missing.

use std::env;

// Defaults for optional settings
const DEFAULT_PORT: u16 = 8000;
const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_LARK_BASE_URL: &str = "https://open.feishu.cn";
const DEFAULT_GEMINI_MODEL: &str = "gemini-3-pro-image-preview";
const DEFAULT_PARENT_TYPE: &str = "bitable_image";
const DEFAULT_SOURCE_FETCH_TIMEOUT_SECS: u64 = 30;

/// Application configuration, fixed at startup and read-only afterwards.
#[derive(Clone, Debug)]
pub struct Config {
    server_port: u16,
    cors_origins: Vec<String>,
    environment: String,
    // Generation backend
    gemini_api_key: String,
    gemini_base_url: String,
    gemini_model: String,
    // Lark application identity and upload destination
    lark_app_id: String,
    lark_app_secret: String,
    lark_base_url: String,
    parent_node: String,
    parent_type: String,
    // Source-image fetch
    source_fetch_timeout_secs: u64,
}

impl Config {
    /// Load configuration from the environment.
    ///
    /// Required: GEMINI_API_KEY, LARK_APP_ID, LARK_APP_SECRET,
    /// LARK_PARENT_NODE. Everything else has a default.
    pub fn from_env() -> Result<Self, anyhow::Error> {
        let cors_origins = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Self {
            server_port: env::var("PORT")
                .unwrap_or_else(|_| DEFAULT_PORT.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            cors_origins,
            environment: env::var("ENVIRONMENT")
                .or_else(|_| env::var("APP_ENV"))
                .unwrap_or_else(|_| "development".to_string()),
            gemini_api_key: env::var("GEMINI_API_KEY")
                .map_err(|_| anyhow::anyhow!("GEMINI_API_KEY must be set"))?,
            gemini_base_url: trim_base_url(
                env::var("GEMINI_BASE_URL")
                    .unwrap_or_else(|_| DEFAULT_GEMINI_BASE_URL.to_string()),
            ),
            gemini_model: env::var("GEMINI_MODEL")
                .unwrap_or_else(|_| DEFAULT_GEMINI_MODEL.to_string()),
            lark_app_id: env::var("LARK_APP_ID")
                .map_err(|_| anyhow::anyhow!("LARK_APP_ID must be set"))?,
            lark_app_secret: env::var("LARK_APP_SECRET")
                .map_err(|_| anyhow::anyhow!("LARK_APP_SECRET must be set"))?,
            lark_base_url: trim_base_url(
                env::var("LARK_BASE_URL").unwrap_or_else(|_| DEFAULT_LARK_BASE_URL.to_string()),
            ),
            parent_node: env::var("LARK_PARENT_NODE")
                .map_err(|_| anyhow::anyhow!("LARK_PARENT_NODE must be set"))?,
            parent_type: env::var("LARK_PARENT_TYPE")
                .unwrap_or_else(|_| DEFAULT_PARENT_TYPE.to_string()),
            source_fetch_timeout_secs: env::var("SOURCE_FETCH_TIMEOUT_SECS")
                .unwrap_or_else(|_| DEFAULT_SOURCE_FETCH_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(DEFAULT_SOURCE_FETCH_TIMEOUT_SECS),
        })
    }

    /// Build a configuration directly, bypassing the environment. Intended
    /// for tests and for pointing clients at mock servers.
    pub fn for_testing(
        gemini_base_url: impl Into<String>,
        lark_base_url: impl Into<String>,
        gemini_api_key: impl Into<String>,
        lark_app_id: impl Into<String>,
        lark_app_secret: impl Into<String>,
        parent_node: impl Into<String>,
    ) -> Self {
        Self {
            server_port: 0,
            cors_origins: vec!["*".to_string()],
            environment: "test".to_string(),
            gemini_api_key: gemini_api_key.into(),
            gemini_base_url: trim_base_url(gemini_base_url.into()),
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            lark_app_id: lark_app_id.into(),
            lark_app_secret: lark_app_secret.into(),
            lark_base_url: trim_base_url(lark_base_url.into()),
            parent_node: parent_node.into(),
            parent_type: DEFAULT_PARENT_TYPE.to_string(),
            source_fetch_timeout_secs: 5,
        }
    }

    pub fn server_port(&self) -> u16 {
        self.server_port
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.cors_origins
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn gemini_api_key(&self) -> &str {
        &self.gemini_api_key
    }

    pub fn gemini_base_url(&self) -> &str {
        &self.gemini_base_url
    }

    pub fn gemini_model(&self) -> &str {
        &self.gemini_model
    }

    pub fn lark_app_id(&self) -> &str {
        &self.lark_app_id
    }

    pub fn lark_app_secret(&self) -> &str {
        &self.lark_app_secret
    }

    pub fn lark_base_url(&self) -> &str {
        &self.lark_base_url
    }

    pub fn parent_node(&self) -> &str {
        &self.parent_node
    }

    pub fn parent_type(&self) -> &str {
        &self.parent_type
    }

    pub fn source_fetch_timeout_secs(&self) -> u64 {
        self.source_fetch_timeout_secs
    }
}

fn trim_base_url(url: String) -> String {
    url.trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_testing_trims_trailing_slash() {
        let config = Config::for_testing(
            "http://127.0.0.1:5000/",
            "http://127.0.0.1:5001///",
            "key",
            "app",
            "secret",
            "node",
        );
        assert_eq!(config.gemini_base_url(), "http://127.0.0.1:5000");
        assert_eq!(config.lark_base_url(), "http://127.0.0.1:5001");
    }

    #[test]
    fn test_defaults() {
        let config = Config::for_testing("http://g", "http://l", "k", "a", "s", "n");
        assert_eq!(config.gemini_model(), "gemini-3-pro-image-preview");
        assert_eq!(config.parent_type(), "bitable_image");
        assert!(!config.is_production());
    }
}
