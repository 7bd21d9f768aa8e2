use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn, debug};

use crate::{
    models::{
        AccountRecord, CollectedWallet, CollectionReport, RiskScoreError, Result, SkipReason,
        SkippedWallet, WalletAge, WalletId,
    },
    sources::{retry_with_backoff, with_timeout, LendingDataSource, RetryConfig, WalletAgeSource},
};

#[derive(Debug, Clone)]
pub struct CollectorConfig {
    pub max_concurrency: usize,
    pub request_timeout: Duration,
    pub retry: RetryConfig,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 8,
            request_timeout: Duration::from_secs(30),
            retry: RetryConfig::default(),
        }
    }
}

enum WalletOutcome {
    Collected(CollectedWallet),
    Skipped(SkippedWallet),
}

/// Fetches lending and age data for every wallet, skipping the ones that fail.
pub struct AccountCollector {
    lending: Arc<dyn LendingDataSource>,
    age: Arc<dyn WalletAgeSource>,
    config: CollectorConfig,
}

impl AccountCollector {
    pub fn new(
        lending: Arc<dyn LendingDataSource>,
        age: Arc<dyn WalletAgeSource>,
        config: CollectorConfig,
    ) -> Self {
        Self {
            lending,
            age,
            config,
        }
    }

    pub async fn collect(&self, wallets: &[WalletId]) -> CollectionReport {
        self.collect_as_of(wallets, Utc::now()).await
    }

    /// Collection with an explicit reference time for age calculation.
    /// Duplicate ids are collected once; the report is sorted by wallet id.
    pub async fn collect_as_of(&self, wallets: &[WalletId], as_of: DateTime<Utc>) -> CollectionReport {
        let mut seen = HashSet::new();
        let unique: Vec<&WalletId> = wallets
            .iter()
            .filter(|w| {
                let fresh = seen.insert(*w);
                if !fresh {
                    warn!("Duplicate wallet {} ignored", w);
                }
                fresh
            })
            .collect();

        info!(
            "Collecting {} wallets from {} / {} (concurrency {})",
            unique.len(),
            self.lending.name(),
            self.age.name(),
            self.config.max_concurrency
        );

        let outcomes: Vec<WalletOutcome> = stream::iter(unique)
            .map(|wallet| self.collect_one(wallet))
            .buffer_unordered(self.config.max_concurrency.max(1))
            .collect()
            .await;

        let mut report = CollectionReport::new(as_of);
        for outcome in outcomes {
            match outcome {
                WalletOutcome::Collected(wallet) => report.collected.push(wallet),
                WalletOutcome::Skipped(skipped) => report.skipped.push(skipped),
            }
        }
        report.sort();

        info!(
            "Collection finished: {} collected, {} skipped",
            report.collected.len(),
            report.skipped.len()
        );

        report
    }

    async fn collect_one(&self, wallet: &WalletId) -> WalletOutcome {
        let (account, age) = tokio::join!(self.fetch_account(wallet), self.fetch_age(wallet));

        let reason = match account {
            Ok(Some(account)) => {
                debug!("Collected {} ({} token entries)", wallet, account.tokens.len());
                return WalletOutcome::Collected(CollectedWallet {
                    wallet_id: wallet.clone(),
                    account,
                    age,
                });
            }
            Ok(None) => SkipReason::AccountNotFound,
            Err(RiskScoreError::InvalidRecord { message, .. }) => SkipReason::InvalidRecord(message),
            Err(e) => SkipReason::SourceError(e.to_string()),
        };

        warn!("Skipping wallet {}: {}", wallet, reason);
        WalletOutcome::Skipped(SkippedWallet {
            wallet_id: wallet.clone(),
            reason,
        })
    }

    async fn fetch_account(&self, wallet: &WalletId) -> Result<Option<AccountRecord>> {
        let name = self.lending.name();
        let operation = format!("{} account {}", name, wallet);
        retry_with_backoff(&self.config.retry, &operation, || {
            with_timeout(name, self.config.request_timeout, self.lending.fetch_account(wallet))
        }).await
    }

    /// Age failures never skip a wallet; they resolve to `Unknown`.
    async fn fetch_age(&self, wallet: &WalletId) -> WalletAge {
        let name = self.age.name();
        let operation = format!("{} first activity {}", name, wallet);
        let result = retry_with_backoff(&self.config.retry, &operation, || {
            with_timeout(name, self.config.request_timeout, self.age.fetch_first_activity(wallet))
        }).await;

        match result {
            Ok(Some(first)) => WalletAge::FirstActivity(first),
            Ok(None) => WalletAge::Unknown,
            Err(e) => {
                warn!("Age lookup failed for {}, treating as unknown: {}", wallet, e);
                WalletAge::Unknown
            }
        }
    }
}
