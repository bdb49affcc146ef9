pub mod card;
pub mod client;
pub mod errors;
pub mod models;
pub mod query;

pub use card::{DisplayCard, GradeKind, NutritionFact, TagGroup};
pub use client::{OffClient, QueryOutcome};
pub use errors::{OffError, Result};
pub use models::{
    CategorySearch, DataSubmission, Grade, NutrientUpdate, ProductLookup, ProductRecord,
    QueryRequest, SearchResult,
};
pub use query::{PAGE_SIZE, Page, paginate};

use std::env;
use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "https://world.openfoodfacts.org";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid environment variable '{name}': {reason}")]
    InvalidVariable { name: String, reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub base_url: String,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: default_user_agent(),
        }
    }
}

impl ClientConfig {
    /// Builds a config for `base_url`, dropping any trailing `/`.
    pub fn with_base_url(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: check_base_url("OFF_BASE_URL", base_url)?,
            ..Self::default()
        })
    }
}

fn default_user_agent() -> String {
    format!("food-facts-service/{}", env!("CARGO_PKG_VERSION"))
}

fn check_base_url(name: &str, value: &str) -> Result<String, ConfigError> {
    let value = value.trim();
    if !(value.starts_with("http://") || value.starts_with("https://")) {
        return Err(ConfigError::InvalidVariable {
            name: name.to_string(),
            reason: format!("'{}' is not an http(s) URL", value),
        });
    }
    Ok(value.trim_end_matches('/').to_string())
}

pub fn load_config() -> Result<ClientConfig, ConfigError> {
    dotenvy::dotenv().ok();

    let base_url = match env::var("OFF_BASE_URL") {
        Ok(raw) => check_base_url("OFF_BASE_URL", &raw)?,
        Err(_) => DEFAULT_BASE_URL.to_string(),
    };

    let user_agent = match env::var("OFF_USER_AGENT") {
        Ok(raw) if raw.trim().is_empty() => {
            return Err(ConfigError::InvalidVariable {
                name: "OFF_USER_AGENT".to_string(),
                reason: "must not be blank".to_string(),
            });
        }
        Ok(raw) => raw.trim().to_string(),
        Err(_) => default_user_agent(),
    };

    tracing::debug!("Remote API base URL: {}", base_url);
    Ok(ClientConfig {
        base_url,
        user_agent,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    /// Sets or clears one variable, restoring the previous value on drop.
    struct TempEnv {
        key: &'static str,
        prev: Option<String>,
    }

    impl TempEnv {
        fn set(key: &'static str, value: Option<&str>) -> Self {
            let prev = env::var(key).ok();
            unsafe {
                match value {
                    Some(v) => env::set_var(key, v),
                    None => env::remove_var(key),
                }
            }
            Self { key, prev }
        }
    }

    impl Drop for TempEnv {
        fn drop(&mut self) {
            unsafe {
                match &self.prev {
                    Some(value) => env::set_var(self.key, value),
                    None => env::remove_var(self.key),
                }
            }
        }
    }

    fn invalid_variable(result: Result<ClientConfig, ConfigError>) -> String {
        match result {
            Err(ConfigError::InvalidVariable { name, .. }) => name,
            other => panic!("Expected InvalidVariable error, got {:?}", other),
        }
    }

    #[test]
    fn default_config_points_at_public_site() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, "https://world.openfoodfacts.org");
        assert!(config.user_agent.starts_with("food-facts-service/"));
    }

    #[test]
    fn base_url_drops_trailing_slash() {
        let config = ClientConfig::with_base_url("http://127.0.0.1:8080/").unwrap();
        assert_eq!(config.base_url, "http://127.0.0.1:8080");
    }

    #[test]
    fn base_url_requires_http_scheme() {
        let result = ClientConfig::with_base_url("ftp://example.org");
        if let Err(ConfigError::InvalidVariable { name, .. }) = result {
            assert_eq!(name, "OFF_BASE_URL");
        } else {
            panic!("Expected InvalidVariable error, got {:?}", result);
        }
    }

    #[test]
    fn load_config_falls_back_to_defaults_when_unset() {
        let _lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let _base = TempEnv::set("OFF_BASE_URL", None);
        let _agent = TempEnv::set("OFF_USER_AGENT", None);

        let config = load_config().unwrap();
        assert_eq!(config, ClientConfig::default());
    }

    #[test]
    fn load_config_reads_and_checks_overrides() {
        let _lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let _base = TempEnv::set("OFF_BASE_URL", Some(" http://127.0.0.1:9/ "));
        let _agent = TempEnv::set("OFF_USER_AGENT", Some(" pantry-bot/1.0 "));

        let config = load_config().unwrap();
        assert_eq!(config.base_url, "http://127.0.0.1:9");
        assert_eq!(config.user_agent, "pantry-bot/1.0");
    }

    #[test]
    fn load_config_rejects_bad_scheme_and_blank_agent() {
        let _lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        {
            let _base = TempEnv::set("OFF_BASE_URL", Some("ftp://example.org"));
            let _agent = TempEnv::set("OFF_USER_AGENT", None);
            assert_eq!(invalid_variable(load_config()), "OFF_BASE_URL");
        }

        let _base = TempEnv::set("OFF_BASE_URL", None);
        let _agent = TempEnv::set("OFF_USER_AGENT", Some("   "));
        assert_eq!(invalid_variable(load_config()), "OFF_USER_AGENT");
    }
}
