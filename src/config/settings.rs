use serde::{de, Deserialize, Deserializer, Serialize};
use config::{Config, ConfigError, File};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use crate::{
    config::SourceSettings,
    models::{FieldName, RiskScoreError, Result},
    scoring::{CollectorConfig, MissingDataPolicy, Normalizer, WeightTable},
    sources::RetryConfig,
    utils::DEFAULT_WALLET_COLUMN,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub app: AppSettings,
    pub scoring: ScoringSettings,
    pub collector: CollectorSettings,
    pub sources: SourceSettings,
    pub input: InputSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    pub name: String,
    pub log_level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringSettings {
    /// Read as overrides on top of `WeightTable::default()`, so a settings
    /// file may list only the keys it changes.
    #[serde(default, skip_serializing, deserialize_with = "weight_overrides")]
    pub weights: WeightTable,
    pub normalized_fields: Vec<FieldName>,
    pub missing_data: MissingDataPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectorSettings {
    pub max_concurrency: usize,
    pub request_timeout_seconds: u64,
    pub max_retries: u32,
    pub retry_base_delay_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputSettings {
    pub wallet_column: String,
}

fn weight_overrides<'de, D>(deserializer: D) -> std::result::Result<WeightTable, D::Error>
where
    D: Deserializer<'de>,
{
    let overrides = BTreeMap::<String, f64>::deserialize(deserializer)?;
    WeightTable::default()
        .with_overrides(&overrides)
        .map_err(de::Error::custom)
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            app: AppSettings {
                name: "Wallet Risk Scorer".to_string(),
                log_level: "info".to_string(),
            },
            scoring: ScoringSettings {
                weights: WeightTable::default(),
                normalized_fields: FieldName::ALL.to_vec(),
                missing_data: MissingDataPolicy::default(),
            },
            collector: CollectorSettings {
                max_concurrency: 8,
                request_timeout_seconds: 30,
                max_retries: 3,
                retry_base_delay_ms: 250,
            },
            sources: SourceSettings::default(),
            input: InputSettings {
                wallet_column: DEFAULT_WALLET_COLUMN.to_string(),
            },
        }
    }
}

impl Settings {
    pub fn new() -> std::result::Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(Config::try_from(&Settings::default())?)
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("WALLET_RISK")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        s.try_deserialize()
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> std::result::Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(Config::try_from(&Settings::default())?)
            .add_source(File::from(path.as_ref()))
            .build()?;

        s.try_deserialize()
    }

    pub fn validate(&self) -> Result<()> {
        self.scoring.weights.validate()?;

        if self.collector.max_concurrency == 0 {
            return Err(RiskScoreError::Configuration(
                "collector.max_concurrency must be at least 1".to_string()
            ));
        }

        if self.collector.request_timeout_seconds == 0 {
            return Err(RiskScoreError::Configuration(
                "collector.request_timeout_seconds must be at least 1".to_string()
            ));
        }

        if self.input.wallet_column.trim().is_empty() {
            return Err(RiskScoreError::Configuration("input.wallet_column is empty".to_string()));
        }

        Ok(())
    }

    pub fn collector_config(&self) -> CollectorConfig {
        CollectorConfig {
            max_concurrency: self.collector.max_concurrency,
            request_timeout: Duration::from_secs(self.collector.request_timeout_seconds),
            retry: RetryConfig {
                max_attempts: self.collector.max_retries.max(1),
                base_delay: Duration::from_millis(self.collector.retry_base_delay_ms),
                ..Default::default()
            },
        }
    }

    pub fn normalizer(&self) -> Normalizer {
        Normalizer::new(self.scoring.normalized_fields.iter().copied())
    }
}
