//! Client configuration.
//!
//! A [`ClientConfig`] can be built in code, loaded from TOML (feature
//! `config`), and overridden from the environment:
//!
//! ```toml
//! base_url = "https://api.example.com/v1"
//! timeout_secs = 10
//! user_agent = "my-app/1.0"
//!
//! [default_headers]
//! x-api-key = "secret"
//! ```

use std::collections::BTreeMap;

use http::header::{HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use serde::{Deserialize, Serialize};
use url::Url;

/// Environment variable overriding [`ClientConfig::base_url`].
pub const ENV_BASE_URL: &str = "COURIER_BASE_URL";
/// Environment variable overriding [`ClientConfig::timeout_secs`].
pub const ENV_TIMEOUT_SECS: &str = "COURIER_TIMEOUT_SECS";
/// Environment variable overriding [`ClientConfig::user_agent`].
pub const ENV_USER_AGENT: &str = "COURIER_USER_AGENT";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Errors loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "config")]
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid base url `{url}`: {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("invalid value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("invalid default header `{name}`: {reason}")]
    InvalidHeader { name: String, reason: String },
}

/// Settings shared by every call a client makes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Prefix for every descriptor's relative URL
    pub base_url: String,
    /// Per-request timeout, honored by transports that support one
    pub timeout_secs: u64,
    pub user_agent: Option<String>,
    /// Headers sent with every request; header parameters override them
    pub default_headers: BTreeMap<String, String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost".to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: None,
            default_headers: BTreeMap::new(),
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.insert(name.into(), value.into());
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Parse configuration from a TOML string.
    #[cfg(feature = "config")]
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigLoadError> {
        Ok(toml::from_str(source)?)
    }

    /// Load configuration from a TOML file.
    #[cfg(feature = "config")]
    pub fn load(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigLoadError> {
        let source = std::fs::read_to_string(path.as_ref())?;
        tracing::debug!(path = %path.as_ref().display(), "loaded client config");
        Self::from_toml_str(&source)
    }

    /// Apply `COURIER_*` environment overrides.
    pub fn with_env_overrides(self) -> Result<Self, ConfigLoadError> {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary lookup (environment-like).
    pub fn with_overrides_from(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigLoadError> {
        if let Some(base_url) = lookup(ENV_BASE_URL) {
            self.base_url = base_url;
        }
        if let Some(timeout) = lookup(ENV_TIMEOUT_SECS) {
            self.timeout_secs =
                timeout
                    .trim()
                    .parse()
                    .map_err(|e: std::num::ParseIntError| ConfigLoadError::InvalidValue {
                        key: ENV_TIMEOUT_SECS.to_string(),
                        reason: e.to_string(),
                    })?;
        }
        if let Some(user_agent) = lookup(ENV_USER_AGENT) {
            self.user_agent = Some(user_agent);
        }
        Ok(self)
    }

    /// The parsed base URL.
    pub fn parsed_base_url(&self) -> Result<Url, ConfigLoadError> {
        let url = Url::parse(&self.base_url).map_err(|e| ConfigLoadError::InvalidBaseUrl {
            url: self.base_url.clone(),
            reason: e.to_string(),
        })?;
        if url.cannot_be_a_base() {
            return Err(ConfigLoadError::InvalidBaseUrl {
                url: self.base_url.clone(),
                reason: "not a hierarchical url".to_string(),
            });
        }
        Ok(url)
    }

    /// Default headers, including the user agent.
    pub fn header_map(&self) -> Result<HeaderMap, ConfigLoadError> {
        let mut headers = HeaderMap::new();
        let invalid = |name: &str, reason: String| ConfigLoadError::InvalidHeader {
            name: name.to_string(),
            reason,
        };

        for (name, value) in &self.default_headers {
            let header_name =
                HeaderName::try_from(name.as_str()).map_err(|e| invalid(name, e.to_string()))?;
            let header_value =
                HeaderValue::try_from(value.as_str()).map_err(|e| invalid(name, e.to_string()))?;
            headers.insert(header_name, header_value);
        }

        if let Some(user_agent) = &self.user_agent {
            let value = HeaderValue::try_from(user_agent.as_str())
                .map_err(|e| invalid("user-agent", e.to_string()))?;
            headers.insert(USER_AGENT, value);
        }

        Ok(headers)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, "http://localhost");
        assert_eq!(config.timeout_secs, 30);
        assert!(config.default_headers.is_empty());
    }

    #[cfg(feature = "config")]
    #[test]
    fn test_from_toml() {
        let config = ClientConfig::from_toml_str(
            r#"
            base_url = "https://api.example.com/v1"
            user_agent = "tests/1.0"

            [default_headers]
            x-api-key = "secret"
            "#,
        )
        .unwrap();

        assert_eq!(config.base_url, "https://api.example.com/v1");
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.user_agent.as_deref(), Some("tests/1.0"));
        assert_eq!(config.default_headers["x-api-key"], "secret");
    }

    #[cfg(feature = "config")]
    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("client.toml");
        std::fs::write(&path, "base_url = \"https://files.test\"\ntimeout_secs = 5\n").unwrap();

        let config = ClientConfig::load(&path).unwrap();
        assert_eq!(config.base_url, "https://files.test");
        assert_eq!(config.timeout_secs, 5);
    }

    #[cfg(feature = "config")]
    #[test]
    fn test_invalid_toml() {
        let err = ClientConfig::from_toml_str("timeout_secs = \"soon\"").unwrap_err();
        assert!(matches!(err, ConfigLoadError::Parse(_)));
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            (ENV_BASE_URL, "https://override.test"),
            (ENV_TIMEOUT_SECS, " 12 "),
        ]);

        let config = ClientConfig::default()
            .with_overrides_from(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.base_url, "https://override.test");
        assert_eq!(config.timeout_secs, 12);
        assert_eq!(config.user_agent, None);
    }

    #[test]
    fn test_invalid_timeout_override() {
        let err = ClientConfig::default()
            .with_overrides_from(|key| (key == ENV_TIMEOUT_SECS).then(|| "never".to_string()))
            .unwrap_err();
        assert!(err.to_string().starts_with("invalid value for COURIER_TIMEOUT_SECS"));
    }

    #[test]
    fn test_base_url_validation() {
        assert!(ClientConfig::new("https://api.test/v1").parsed_base_url().is_ok());
        assert!(ClientConfig::new("not a url").parsed_base_url().is_err());
        assert!(ClientConfig::new("mailto:someone@test").parsed_base_url().is_err());
    }

    #[test]
    fn test_header_map() {
        let headers = ClientConfig::default()
            .with_header("X-Api-Key", "secret")
            .with_user_agent("tests/1.0")
            .header_map()
            .unwrap();
        assert_eq!(headers["x-api-key"], "secret");
        assert_eq!(headers[USER_AGENT], "tests/1.0");

        let err = ClientConfig::default()
            .with_header("bad header", "x")
            .header_map()
            .unwrap_err();
        assert!(matches!(err, ConfigLoadError::InvalidHeader { .. }));
    }
}
