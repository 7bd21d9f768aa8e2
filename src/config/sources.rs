use serde::{Deserialize, Serialize};

use crate::sources::SourceClientConfig;

pub const EXPLORER_API_KEY_ENV: &str = "WALLET_RISK_EXPLORER_API_KEY";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceSettings {
    pub lending: LendingEndpoint,
    pub explorer: ExplorerEndpoint,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LendingEndpoint {
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplorerEndpoint {
    pub url: String,
    pub api_key: Option<String>,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            lending: LendingEndpoint {
                url: "https://api.thegraph.com/subgraphs/name/graphprotocol/compound-v2".to_string(),
            },
            explorer: ExplorerEndpoint {
                url: "https://api.etherscan.io/api".to_string(),
                api_key: None,
            },
        }
    }
}

impl SourceSettings {
    pub fn lending_client_config(&self, timeout_seconds: u64) -> SourceClientConfig {
        SourceClientConfig {
            url: self.lending.url.clone(),
            api_key: None,
            timeout_seconds,
        }
    }

    /// A key in settings wins over the environment.
    pub fn explorer_client_config(&self, timeout_seconds: u64) -> SourceClientConfig {
        let api_key = self
            .explorer
            .api_key
            .clone()
            .filter(|k| !k.is_empty())
            .or_else(|| std::env::var(EXPLORER_API_KEY_ENV).ok().filter(|k| !k.is_empty()));

        SourceClientConfig {
            url: self.explorer.url.clone(),
            api_key,
            timeout_seconds,
        }
    }
}
