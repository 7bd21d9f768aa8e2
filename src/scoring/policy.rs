use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{CollectedWallet, SkipReason};

/// What to do with a feature input the sources could not provide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MissingValuePolicy {
    /// Substitute zero and keep the wallet.
    #[default]
    DefaultZero,
    /// Drop the wallet before normalization.
    Exclude,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct MissingDataPolicy {
    #[serde(default)]
    pub wallet_age: MissingValuePolicy,
    #[serde(default)]
    pub repay_count: MissingValuePolicy,
}

/// Feature inputs after every unknown has been resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedInputs {
    pub wallet_age_days: u32,
    pub repay_count: u32,
}

impl MissingDataPolicy {
    pub fn resolve(
        &self,
        wallet: &CollectedWallet,
        as_of: DateTime<Utc>,
    ) -> Result<ResolvedInputs, SkipReason> {
        let wallet_age_days = match (wallet.age.days_as_of(as_of), self.wallet_age) {
            (Some(days), _) => days,
            (None, MissingValuePolicy::DefaultZero) => 0,
            (None, MissingValuePolicy::Exclude) => return Err(SkipReason::MissingAge),
        };

        let repay_count = match (wallet.account.repay_count, self.repay_count) {
            (Some(count), _) => count,
            (None, MissingValuePolicy::DefaultZero) => 0,
            (None, MissingValuePolicy::Exclude) => return Err(SkipReason::MissingRepayCount),
        };

        Ok(ResolvedInputs {
            wallet_age_days,
            repay_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AccountRecord, WalletAge, WalletId};
    use chrono::{Duration, TimeZone};

    fn wallet(age: WalletAge, repay_count: Option<u32>) -> CollectedWallet {
        CollectedWallet {
            wallet_id: WalletId::parse("0x1").unwrap(),
            account: AccountRecord {
                repay_count,
                ..Default::default()
            },
            age,
        }
    }

    #[test]
    fn test_default_policy_substitutes_zero() {
        let as_of = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let resolved = MissingDataPolicy::default()
            .resolve(&wallet(WalletAge::Unknown, None), as_of)
            .unwrap();
        assert_eq!(resolved, ResolvedInputs { wallet_age_days: 0, repay_count: 0 });
    }

    #[test]
    fn test_known_values_win_over_policy() {
        let as_of = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let policy = MissingDataPolicy {
            wallet_age: MissingValuePolicy::Exclude,
            repay_count: MissingValuePolicy::Exclude,
        };
        let w = wallet(WalletAge::FirstActivity(as_of - Duration::days(10)), Some(4));
        assert_eq!(
            policy.resolve(&w, as_of).unwrap(),
            ResolvedInputs { wallet_age_days: 10, repay_count: 4 }
        );
    }

    #[test]
    fn test_exclude_policies() {
        let as_of = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let age_strict = MissingDataPolicy {
            wallet_age: MissingValuePolicy::Exclude,
            ..Default::default()
        };
        assert_eq!(
            age_strict.resolve(&wallet(WalletAge::Unknown, Some(1)), as_of),
            Err(SkipReason::MissingAge)
        );

        let repay_strict = MissingDataPolicy {
            repay_count: MissingValuePolicy::Exclude,
            ..Default::default()
        };
        assert_eq!(
            repay_strict.resolve(&wallet(WalletAge::Unknown, None), as_of),
            Err(SkipReason::MissingRepayCount)
        );
    }
}
