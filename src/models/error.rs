use thiserror::Error;

#[derive(Error, Debug)]
pub enum RiskScoreError {
    #[error("Source error from {source_name}: {message}")]
    Source { source_name: String, message: String },

    #[error("Request to {source_name} timed out after {seconds}s")]
    Timeout { source_name: String, seconds: u64 },

    #[error("Invalid wallet id: {0}")]
    InvalidWallet(String),

    #[error("Invalid account record for {wallet}: {message}")]
    InvalidRecord { wallet: String, message: String },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("No wallets left to score: {0}")]
    EmptyPopulation(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl RiskScoreError {
    /// Whether retrying the same request could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            RiskScoreError::Source { .. } | RiskScoreError::Timeout { .. } | RiskScoreError::Http(_)
        )
    }
}

impl From<config::ConfigError> for RiskScoreError {
    fn from(e: config::ConfigError) -> Self {
        RiskScoreError::Configuration(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, RiskScoreError>;
