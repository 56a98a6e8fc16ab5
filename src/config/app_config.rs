//! Application configuration
//!
//! Layered load: `config/default.toml`, then `config/local.toml`, then
//! `GATEWAY__`-prefixed environment variables. Every section carries
//! defaults, so an empty environment still yields a runnable configuration
//! (providers without credentials are registered but unavailable).

use std::time::Duration;

use serde::Deserialize;

use crate::domain::cache::ResponseCacheConfig;

/// Top-level application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub cache: ResponseCacheConfig,
    #[serde(default)]
    pub breaker: BreakerSettings,
    #[serde(default)]
    pub retry: RetrySettings,
    #[serde(default)]
    pub router: RouterSettings,
    #[serde(default)]
    pub session: SessionSettings,
    #[serde(default = "default_experiments")]
    pub experiments: Vec<ExperimentSeed>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            logging: LoggingConfig::default(),
            cache: ResponseCacheConfig::default(),
            breaker: BreakerSettings::default(),
            retry: RetrySettings::default(),
            router: RouterSettings::default(),
            session: SessionSettings::default(),
            experiments: default_experiments(),
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("GATEWAY")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Circuit breaker tuning
#[derive(Debug, Clone, Deserialize)]
pub struct BreakerSettings {
    pub failure_threshold: u32,
    pub recovery_timeout_secs: u64,
    pub half_open_max_calls: u32,
}

impl BreakerSettings {
    pub fn recovery_timeout(&self) -> Duration {
        Duration::from_secs(self.recovery_timeout_secs)
    }
}

impl Default for BreakerSettings {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            recovery_timeout_secs: 30,
            half_open_max_calls: 3,
        }
    }
}

/// Retry tuning for backend calls
#[derive(Debug, Clone, Deserialize)]
pub struct RetrySettings {
    pub max_retries: u32,
    pub initial_delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay_ms: 100,
        }
    }
}

/// Backend provider selection
///
/// Providers are registered in list order; the first entry is the primary
/// and the first later entry holding a credential is the failover target.
#[derive(Debug, Clone, Deserialize)]
pub struct RouterSettings {
    pub timeout_secs: u64,
    pub providers: Vec<ProviderSettings>,
}

impl RouterSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for RouterSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            providers: vec![
                ProviderSettings {
                    id: "dashscope".to_string(),
                    model: "qwen-plus".to_string(),
                    api_key_env: "DASHSCOPE_API_KEY".to_string(),
                    base_url: Some(
                        "https://dashscope.aliyuncs.com/compatible-mode".to_string(),
                    ),
                    temperature: None,
                    supports_tool_calls: false,
                },
                ProviderSettings {
                    id: "openai".to_string(),
                    model: "gpt-4o-mini".to_string(),
                    api_key_env: "OPENAI_API_KEY".to_string(),
                    base_url: None,
                    temperature: None,
                    supports_tool_calls: true,
                },
            ],
        }
    }
}

/// One configured backend provider
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderSettings {
    /// Stable identifier ("dashscope", "openai", ...)
    pub id: String,
    /// Model name as the provider knows it
    pub model: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
    /// Base URL override for OpenAI-compatible endpoints
    #[serde(default)]
    pub base_url: Option<String>,
    /// Temperature applied when the request leaves it unset
    #[serde(default)]
    pub temperature: Option<f32>,
    /// Whether the model accepts tool-role messages
    #[serde(default)]
    pub supports_tool_calls: bool,
}

/// Conversation history settings
#[derive(Debug, Clone, Deserialize)]
pub struct SessionSettings {
    /// Turns kept per session; older turns are dropped
    pub max_history: usize,
    /// Idle seconds before a session expires
    pub ttl_secs: u64,
}

impl SessionSettings {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            max_history: 20,
            ttl_secs: 3600,
        }
    }
}

/// Experiment registered at startup
#[derive(Debug, Clone, Deserialize)]
pub struct ExperimentSeed {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    pub variants: Vec<VariantSeed>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VariantSeed {
    pub name: String,
    pub weight: f64,
}

fn default_enabled() -> bool {
    true
}

fn seed(name: &str, description: &str, variants: &[(&str, f64)]) -> ExperimentSeed {
    ExperimentSeed {
        name: name.to_string(),
        description: Some(description.to_string()),
        enabled: true,
        variants: variants
            .iter()
            .map(|(name, weight)| VariantSeed {
                name: name.to_string(),
                weight: *weight,
            })
            .collect(),
    }
}

fn default_experiments() -> Vec<ExperimentSeed> {
    vec![
        seed(
            "llm_provider",
            "Primary versus fallback model comparison",
            &[("dashscope", 1.0), ("openai", 0.0)],
        ),
        seed(
            "prompt_version",
            "Prompt version comparison",
            &[("v1", 1.0), ("v2", 0.0)],
        ),
        seed(
            "cache_enabled",
            "Response cache toggle",
            &[("enabled", 1.0), ("disabled", 0.0)],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_runnable() {
        let config = AppConfig::default();

        assert_eq!(config.router.providers.len(), 2);
        assert_eq!(config.router.providers[0].id, "dashscope");
        assert_eq!(config.router.providers[1].id, "openai");
        assert_eq!(config.session.max_history, 20);
        assert_eq!(config.session.ttl(), Duration::from_secs(3600));
        assert_eq!(config.breaker.failure_threshold, 5);
        assert_eq!(config.experiments.len(), 3);
        assert_eq!(config.experiments[0].name, "llm_provider");
    }

    #[test]
    fn test_partial_file_fills_missing_sections() {
        let toml = r#"
            [logging]
            level = "debug"
            format = "json"

            [breaker]
            failure_threshold = 2
            recovery_timeout_secs = 10
            half_open_max_calls = 1
        "#;

        let config: AppConfig = config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.logging.level, "debug");
        assert!(matches!(config.logging.format, LogFormat::Json));
        assert_eq!(config.breaker.failure_threshold, 2);
        // Untouched sections fall back to defaults
        assert_eq!(config.session.max_history, 20);
        assert_eq!(config.cache.max_size, 1000);
        assert_eq!(config.experiments.len(), 3);
    }

    #[test]
    fn test_provider_and_experiment_lists_deserialize() {
        let toml = r#"
            [router]
            timeout_secs = 10

            [[router.providers]]
            id = "local"
            model = "llama-3"
            api_key_env = "LOCAL_API_KEY"
            base_url = "http://localhost:11434"
            temperature = 0.2
            supports_tool_calls = true

            [[experiments]]
            name = "rollout"
            variants = [
                { name = "on", weight = 0.5 },
                { name = "off", weight = 0.5 },
            ]
        "#;

        let config: AppConfig = config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.router.timeout(), Duration::from_secs(10));
        assert_eq!(config.router.providers.len(), 1);
        let provider = &config.router.providers[0];
        assert_eq!(provider.id, "local");
        assert_eq!(provider.base_url.as_deref(), Some("http://localhost:11434"));
        assert!(provider.supports_tool_calls);

        assert_eq!(config.experiments.len(), 1);
        assert!(config.experiments[0].enabled);
        assert_eq!(config.experiments[0].variants.len(), 2);
    }
}
