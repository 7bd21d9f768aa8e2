use crate::models::{AccountRecord, FeatureRecord, WalletId};

/// Turns one account into its feature row. No I/O.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureBuilder;

impl FeatureBuilder {
    pub fn new() -> Self {
        Self
    }

    /// `wallet_age_days` and `repay_count` arrive already resolved by the
    /// missing-data policy.
    pub fn build(
        &self,
        wallet_id: &WalletId,
        record: &AccountRecord,
        wallet_age_days: u32,
        repay_count: u32,
    ) -> FeatureRecord {
        let total_supplied: f64 = record.tokens.iter().map(|t| t.supplied_underlying).sum();
        let total_borrowed: f64 = record.tokens.iter().map(|t| t.borrowed_underlying).sum();

        FeatureRecord {
            wallet_id: wallet_id.clone(),
            total_supplied,
            total_borrowed,
            borrow_to_supply_ratio: Self::borrow_to_supply_ratio(total_supplied, total_borrowed),
            supply_count: record.supply_count,
            borrow_count: record.borrow_count,
            liquidation_count: record.liquidation_count,
            wallet_age_days,
            asset_count: u32::try_from(record.tokens.len()).unwrap_or(u32::MAX),
            activity_score: record
                .supply_count
                .saturating_add(record.borrow_count)
                .saturating_add(repay_count),
        }
    }

    /// Nothing supplied means no ratio is reported, whatever was borrowed.
    pub fn borrow_to_supply_ratio(total_supplied: f64, total_borrowed: f64) -> f64 {
        if total_supplied > 0.0 {
            total_borrowed / total_supplied
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TokenPosition;

    fn position(symbol: &str, supplied: f64, borrowed: f64) -> TokenPosition {
        TokenPosition {
            symbol: symbol.to_string(),
            supplied_underlying: supplied,
            borrowed_underlying: borrowed,
        }
    }

    #[test]
    fn test_sums_duplicate_symbols_as_separate_entries() {
        let wallet = WalletId::parse("0xabc").unwrap();
        let record = AccountRecord {
            tokens: vec![
                position("cUSDC", 100.0, 10.0),
                position("cUSDC", 50.0, 5.0),
                position("cETH", 2.0, 0.0),
            ],
            supply_count: 4,
            borrow_count: 2,
            liquidation_count: 1,
            repay_count: Some(3),
        };

        let features = FeatureBuilder::new().build(&wallet, &record, 30, 3);

        assert_eq!(features.total_supplied, 152.0);
        assert_eq!(features.total_borrowed, 15.0);
        assert_eq!(features.asset_count, 3);
        assert_eq!(features.activity_score, 9);
        assert_eq!(features.wallet_age_days, 30);
        assert_eq!(features.liquidation_count, 1);
        assert!((features.borrow_to_supply_ratio - 15.0 / 152.0).abs() < 1e-12);
    }

    #[test]
    fn test_ratio_is_zero_without_supply() {
        assert_eq!(FeatureBuilder::borrow_to_supply_ratio(0.0, 0.0), 0.0);
        assert_eq!(FeatureBuilder::borrow_to_supply_ratio(0.0, 1_000_000.0), 0.0);
        assert_eq!(FeatureBuilder::borrow_to_supply_ratio(200.0, 50.0), 0.25);
    }

    #[test]
    fn test_empty_account() {
        let wallet = WalletId::parse("0xdef").unwrap();
        let features = FeatureBuilder::new().build(&wallet, &AccountRecord::default(), 0, 0);

        assert_eq!(features.total_supplied, 0.0);
        assert_eq!(features.borrow_to_supply_ratio, 0.0);
        assert_eq!(features.asset_count, 0);
        assert_eq!(features.activity_score, 0);
    }
}
