use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use std::fmt;

use crate::models::{RiskScoreError, Result};

/// Lowercased wallet identifier. The only key used across the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WalletId(String);

impl WalletId {
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(RiskScoreError::InvalidWallet("empty wallet id".to_string()));
        }
        Ok(Self(trimmed.to_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WalletId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for WalletId {
    type Error = RiskScoreError;

    fn try_from(value: String) -> Result<Self> {
        WalletId::parse(&value)
    }
}

impl From<WalletId> for String {
    fn from(id: WalletId) -> Self {
        id.0
    }
}

/// One ledger entry of a lending account. Duplicate symbols are distinct entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenPosition {
    pub symbol: String,
    pub supplied_underlying: f64,
    pub borrowed_underlying: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AccountRecord {
    pub tokens: Vec<TokenPosition>,
    pub supply_count: u32,
    pub borrow_count: u32,
    pub liquidation_count: u32,
    /// Not every lending source reports repayments.
    pub repay_count: Option<u32>,
}

impl AccountRecord {
    /// Balances must be finite and non-negative.
    pub fn validate(&self, wallet: &WalletId) -> Result<()> {
        for token in &self.tokens {
            for (label, value) in [
                ("supplied", token.supplied_underlying),
                ("borrowed", token.borrowed_underlying),
            ] {
                if !value.is_finite() || value < 0.0 {
                    return Err(RiskScoreError::InvalidRecord {
                        wallet: wallet.to_string(),
                        message: format!("{} balance of {} is {}", label, token.symbol, value),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Result of an age lookup. Unknown is kept distinct from a zero-day age.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WalletAge {
    FirstActivity(DateTime<Utc>),
    Unknown,
}

impl WalletAge {
    /// Whole days between first activity and `as_of`; future timestamps give 0.
    pub fn days_as_of(&self, as_of: DateTime<Utc>) -> Option<u32> {
        match self {
            WalletAge::FirstActivity(first) => {
                let days = (as_of - *first).num_days().max(0);
                Some(u32::try_from(days).unwrap_or(u32::MAX))
            }
            WalletAge::Unknown => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectedWallet {
    pub wallet_id: WalletId,
    pub account: AccountRecord,
    pub age: WalletAge,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SkipReason {
    AccountNotFound,
    SourceError(String),
    InvalidRecord(String),
    MissingAge,
    MissingRepayCount,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::AccountNotFound => write!(f, "account not found"),
            SkipReason::SourceError(msg) => write!(f, "source error: {}", msg),
            SkipReason::InvalidRecord(msg) => write!(f, "invalid record: {}", msg),
            SkipReason::MissingAge => write!(f, "wallet age unknown"),
            SkipReason::MissingRepayCount => write!(f, "repay count unknown"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedWallet {
    pub wallet_id: WalletId,
    pub reason: SkipReason,
}

/// Everything the collection phase produced, frozen at `as_of`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionReport {
    pub as_of: DateTime<Utc>,
    pub collected: Vec<CollectedWallet>,
    pub skipped: Vec<SkippedWallet>,
}

impl CollectionReport {
    pub fn new(as_of: DateTime<Utc>) -> Self {
        Self {
            as_of,
            collected: Vec::new(),
            skipped: Vec::new(),
        }
    }

    /// Sort both halves by wallet id so later stages see a stable order.
    pub fn sort(&mut self) {
        self.collected.sort_by(|a, b| a.wallet_id.cmp(&b.wallet_id));
        self.skipped.sort_by(|a, b| a.wallet_id.cmp(&b.wallet_id));
    }
}
