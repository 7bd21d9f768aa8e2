use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::{
    models::{AccountRecord, RiskScoreError, Result, WalletId},
    sources::client::{LendingDataSource, WalletAgeSource},
};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FixtureWallet {
    #[serde(default)]
    pub account: Option<AccountRecord>,
    #[serde(default)]
    pub first_activity: Option<DateTime<Utc>>,
    #[serde(default)]
    pub lending_error: Option<String>,
    #[serde(default)]
    pub age_error: Option<String>,
}

/// Pre-fetched source data served from memory, for offline runs and tests.
/// Wallets absent from the fixture are "not found" / "unknown age".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FixtureSource {
    wallets: HashMap<WalletId, FixtureWallet>,
}

impl FixtureSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a JSON object of `{ "<wallet>": FixtureWallet }`.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let wallets: HashMap<WalletId, FixtureWallet> = serde_json::from_str(&raw)?;
        Ok(Self { wallets })
    }

    /// Empty ids are ignored.
    fn entry(&mut self, wallet: &str) -> Option<&mut FixtureWallet> {
        let id = WalletId::parse(wallet).ok()?;
        Some(self.wallets.entry(id).or_default())
    }

    pub fn with_account(mut self, wallet: &str, account: AccountRecord) -> Self {
        if let Some(entry) = self.entry(wallet) {
            entry.account = Some(account);
        }
        self
    }

    pub fn with_first_activity(mut self, wallet: &str, at: DateTime<Utc>) -> Self {
        if let Some(entry) = self.entry(wallet) {
            entry.first_activity = Some(at);
        }
        self
    }

    pub fn with_lending_error(mut self, wallet: &str, message: &str) -> Self {
        if let Some(entry) = self.entry(wallet) {
            entry.lending_error = Some(message.to_string());
        }
        self
    }

    pub fn with_age_error(mut self, wallet: &str, message: &str) -> Self {
        if let Some(entry) = self.entry(wallet) {
            entry.age_error = Some(message.to_string());
        }
        self
    }

    pub fn len(&self) -> usize {
        self.wallets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wallets.is_empty()
    }
}

#[async_trait]
impl LendingDataSource for FixtureSource {
    fn name(&self) -> &'static str {
        "fixture-lending"
    }

    async fn fetch_account(&self, wallet: &WalletId) -> Result<Option<AccountRecord>> {
        let Some(entry) = self.wallets.get(wallet) else {
            return Ok(None);
        };
        if let Some(message) = &entry.lending_error {
            return Err(RiskScoreError::Source {
                source_name: LendingDataSource::name(self).to_string(),
                message: message.clone(),
            });
        }
        Ok(entry.account.clone())
    }
}

#[async_trait]
impl WalletAgeSource for FixtureSource {
    fn name(&self) -> &'static str {
        "fixture-age"
    }

    async fn fetch_first_activity(&self, wallet: &WalletId) -> Result<Option<DateTime<Utc>>> {
        let Some(entry) = self.wallets.get(wallet) else {
            return Ok(None);
        };
        if let Some(message) = &entry.age_error {
            return Err(RiskScoreError::Source {
                source_name: WalletAgeSource::name(self).to_string(),
                message: message.clone(),
            });
        }
        Ok(entry.first_activity)
    }
}
