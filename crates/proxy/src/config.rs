use std::env;
use std::fmt::{self, Debug};
use std::net::SocketAddr;

use dna_ai_openai_model::{OpenAIConfig, OpenAIConfigBuilder};

/// The variable holding the upstream credential.
pub const API_KEY_VAR: &str = "OPENAI_API_KEY";
const MODEL_VAR: &str = "OPENAI_MODEL";
const BASE_URL_VAR: &str = "OPENAI_BASE_URL";
const TEMPERATURE_VAR: &str = "OPENAI_TEMPERATURE";
const BIND_VAR: &str = "DNA_AI_BIND";

const DEFAULT_BIND_ADDR: ([u8; 4], u16) = ([127, 0, 0, 1], 3000);

/// Errors raised while reading the configuration at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A variable holds a value that cannot be parsed.
    #[error("{name} has an invalid value {value:?}: {reason}")]
    InvalidValue {
        /// The variable name.
        name: &'static str,
        /// The raw value.
        value: String,
        /// Why parsing failed.
        reason: String,
    },
}

/// Process-wide proxy configuration.
///
/// It is read once at startup and never changes afterwards. A missing
/// credential is not a startup error: the proxy still serves, and each
/// chat request fails with a configuration error until it is set.
#[derive(Clone, PartialEq)]
pub struct ProxyConfig {
    bind_addr: SocketAddr,
    api_key: Option<String>,
    model: Option<String>,
    base_url: Option<String>,
    temperature: Option<f64>,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(DEFAULT_BIND_ADDR),
            api_key: None,
            model: None,
            base_url: None,
            temperature: None,
        }
    }
}

impl ProxyConfig {
    /// Reads the configuration from the process environment.
    ///
    /// `.env.local` and `.env` in the working directory are loaded first,
    /// without overriding variables that are already set.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::from_filename(".env.local").ok();
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Reads the configuration through `lookup`, which maps a variable
    /// name to its value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(api_key) = lookup(API_KEY_VAR) {
            config = config.with_api_key(api_key);
        }
        if let Some(model) = lookup(MODEL_VAR).filter(|v| !v.is_empty()) {
            config = config.with_model(model);
        }
        if let Some(url) = lookup(BASE_URL_VAR).filter(|v| !v.is_empty()) {
            config = config.with_base_url(url);
        }
        if let Some(value) = lookup(TEMPERATURE_VAR) {
            let temperature = value.trim().parse::<f64>().map_err(|err| {
                ConfigError::InvalidValue {
                    name: TEMPERATURE_VAR,
                    value: value.clone(),
                    reason: err.to_string(),
                }
            })?;
            config = config.with_temperature(temperature);
        }
        if let Some(value) = lookup(BIND_VAR) {
            let bind_addr = value.trim().parse::<SocketAddr>().map_err(|err| {
                ConfigError::InvalidValue {
                    name: BIND_VAR,
                    value: value.clone(),
                    reason: err.to_string(),
                }
            })?;
            config = config.with_bind_addr(bind_addr);
        }

        Ok(config)
    }

    /// Sets the upstream credential. An empty key counts as missing.
    #[inline]
    pub fn with_api_key<S: Into<String>>(mut self, api_key: S) -> Self {
        let api_key = api_key.into();
        self.api_key = (!api_key.trim().is_empty()).then_some(api_key);
        self
    }

    /// Sets the upstream model.
    #[inline]
    pub fn with_model<S: Into<String>>(mut self, model: S) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Sets the upstream base URL.
    #[inline]
    pub fn with_base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Sets the sampling temperature.
    #[inline]
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Sets the address the server listens on.
    #[inline]
    pub fn with_bind_addr(mut self, bind_addr: SocketAddr) -> Self {
        self.bind_addr = bind_addr;
        self
    }

    /// Returns the address the server listens on.
    #[inline]
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }

    /// Returns whether the upstream credential is configured.
    #[inline]
    pub fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }

    /// Builds the upstream configuration, or `None` if the credential is
    /// missing.
    pub fn openai_config(&self) -> Option<OpenAIConfig> {
        let mut builder = OpenAIConfigBuilder::with_api_key(self.api_key.clone()?);
        if let Some(model) = &self.model {
            builder = builder.with_model(model);
        }
        if let Some(base_url) = &self.base_url {
            builder = builder.with_base_url(base_url);
        }
        if let Some(temperature) = self.temperature {
            builder = builder.with_temperature(temperature);
        }
        Some(builder.build())
    }
}

impl Debug for ProxyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyConfig")
            .field("bind_addr", &self.bind_addr)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("temperature", &self.temperature)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_in(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ProxyConfig::from_lookup(lookup_in(&[])).unwrap();
        assert_eq!(config.bind_addr(), "127.0.0.1:3000".parse::<SocketAddr>().unwrap());
        assert!(!config.has_credential());
        assert!(config.openai_config().is_none());
    }

    #[test]
    fn test_full_environment() {
        let config = ProxyConfig::from_lookup(lookup_in(&[
            ("OPENAI_API_KEY", "sk-live"),
            ("OPENAI_MODEL", "gpt-4.1-mini"),
            ("OPENAI_BASE_URL", "http://localhost:9000/v1"),
            ("OPENAI_TEMPERATURE", "0.2"),
            ("DNA_AI_BIND", "0.0.0.0:8080"),
        ]))
        .unwrap();
        assert_eq!(config.bind_addr(), "0.0.0.0:8080".parse::<SocketAddr>().unwrap());

        let openai = config.openai_config().unwrap();
        assert_eq!(openai.model(), "gpt-4.1-mini");
        assert_eq!(openai.base_url(), "http://localhost:9000/v1");
        assert_eq!(openai.temperature(), 0.2);
    }

    #[test]
    fn test_blank_api_key_is_missing() {
        let config =
            ProxyConfig::from_lookup(lookup_in(&[("OPENAI_API_KEY", "  ")]))
                .unwrap();
        assert!(!config.has_credential());
    }

    #[test]
    fn test_invalid_values() {
        let err =
            ProxyConfig::from_lookup(lookup_in(&[("DNA_AI_BIND", "nowhere")]))
                .unwrap_err();
        assert!(err.to_string().starts_with("DNA_AI_BIND"));

        let err = ProxyConfig::from_lookup(lookup_in(&[(
            "OPENAI_TEMPERATURE",
            "warm",
        )]))
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                name: "OPENAI_TEMPERATURE",
                ..
            }
        ));
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let config = ProxyConfig::default().with_api_key("sk-live");
        let printed = format!("{config:?}");
        assert!(!printed.contains("sk-live"));
    }
}
