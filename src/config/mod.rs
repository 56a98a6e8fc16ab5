//! Configuration module

mod app_config;

pub use app_config::{
    AppConfig, BreakerSettings, ExperimentSeed, LogFormat, LoggingConfig, ProviderSettings,
    RetrySettings, RouterSettings, SessionSettings, VariantSeed,
};
