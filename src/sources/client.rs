use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::{AccountRecord, Result, WalletId};

#[cfg(test)]
use mockall::automock;

/// Lending-protocol account data, one wallet at a time.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait LendingDataSource: Send + Sync {
    fn name(&self) -> &'static str;

    /// `Ok(None)` when the source has no account for this wallet.
    async fn fetch_account(&self, wallet: &WalletId) -> Result<Option<AccountRecord>>;
}

/// First on-chain activity of a wallet.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait WalletAgeSource: Send + Sync {
    fn name(&self) -> &'static str;

    /// `Ok(None)` when the source knows of no activity.
    async fn fetch_first_activity(&self, wallet: &WalletId) -> Result<Option<DateTime<Utc>>>;
}

/// Configuration for HTTP source clients
#[derive(Debug, Clone)]
pub struct SourceClientConfig {
    pub url: String,
    pub api_key: Option<String>,
    pub timeout_seconds: u64,
}
