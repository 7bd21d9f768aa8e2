use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use config::{Config, File};

use crate::models::{FieldName, RiskScoreError, Result};

/// Weights of the linear risk model. Signs live in `FieldName::risk_direction`,
/// so every weight here is a non-negative magnitude.
///
/// Keys are matched through `FieldName::from_key`, so snake_case, camelCase
/// and the lowercased form `config` hands back from a file all load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, f64>")]
pub struct WeightTable {
    pub borrow_to_supply_ratio: f64,
    pub liquidation_count: f64,
    pub total_borrowed: f64,
    pub total_supplied: f64,
    pub wallet_age_days: f64,
    pub asset_count: f64,
    pub activity_score: f64,
}

impl Default for WeightTable {
    fn default() -> Self {
        Self {
            borrow_to_supply_ratio: 0.30,
            liquidation_count: 0.25,
            total_borrowed: 0.10,
            total_supplied: 0.10,
            wallet_age_days: 0.10,
            asset_count: 0.05,
            activity_score: 0.10,
        }
    }
}

/// Strict: every weighted key exactly once, nothing else.
impl TryFrom<BTreeMap<String, f64>> for WeightTable {
    type Error = RiskScoreError;

    fn try_from(raw: BTreeMap<String, f64>) -> Result<Self> {
        let mut table = WeightTable::default();
        let seen = table.apply(&raw)?;

        let missing: Vec<&str> = FieldName::WEIGHTED
            .iter()
            .filter(|f| !seen.contains(f))
            .map(|f| f.as_str())
            .collect();
        if !missing.is_empty() {
            return Err(RiskScoreError::Configuration(
                format!("Weight table is missing {}", missing.join(", "))
            ));
        }

        Ok(table)
    }
}

impl WeightTable {
    /// Strict load: every key must be present and no unknown keys are allowed.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let s = Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()?;

        let raw: BTreeMap<String, f64> = s.try_deserialize()?;
        let table = WeightTable::try_from(raw)?;
        table.validate()?;
        Ok(table)
    }

    /// Copy of `self` with the given keys replaced; keys left out keep their value.
    pub fn with_overrides(&self, overrides: &BTreeMap<String, f64>) -> Result<Self> {
        let mut table = self.clone();
        table.apply(overrides)?;
        Ok(table)
    }

    fn apply(&mut self, raw: &BTreeMap<String, f64>) -> Result<Vec<FieldName>> {
        let mut seen = Vec::with_capacity(raw.len());
        for (key, value) in raw {
            let field = FieldName::from_key(key)
                .filter(|f| f.risk_direction().is_some())
                .ok_or_else(|| RiskScoreError::Configuration(format!("Unknown weight key: {}", key)))?;
            if seen.contains(&field) {
                return Err(RiskScoreError::Configuration(
                    format!("Weight for {} given more than once", field)
                ));
            }
            seen.push(field);
            if let Some(slot) = self.weight_mut(field) {
                *slot = *value;
            }
        }
        Ok(seen)
    }

    fn weight_mut(&mut self, field: FieldName) -> Option<&mut f64> {
        match field {
            FieldName::BorrowToSupplyRatio => Some(&mut self.borrow_to_supply_ratio),
            FieldName::LiquidationCount => Some(&mut self.liquidation_count),
            FieldName::TotalBorrowed => Some(&mut self.total_borrowed),
            FieldName::TotalSupplied => Some(&mut self.total_supplied),
            FieldName::WalletAgeDays => Some(&mut self.wallet_age_days),
            FieldName::AssetCount => Some(&mut self.asset_count),
            FieldName::ActivityScore => Some(&mut self.activity_score),
            FieldName::SupplyCount | FieldName::BorrowCount => None,
        }
    }

    pub fn weight(&self, field: FieldName) -> Option<f64> {
        match field {
            FieldName::BorrowToSupplyRatio => Some(self.borrow_to_supply_ratio),
            FieldName::LiquidationCount => Some(self.liquidation_count),
            FieldName::TotalBorrowed => Some(self.total_borrowed),
            FieldName::TotalSupplied => Some(self.total_supplied),
            FieldName::WalletAgeDays => Some(self.wallet_age_days),
            FieldName::AssetCount => Some(self.asset_count),
            FieldName::ActivityScore => Some(self.activity_score),
            FieldName::SupplyCount | FieldName::BorrowCount => None,
        }
    }

    pub fn entries(&self) -> impl Iterator<Item = (FieldName, f64)> + '_ {
        FieldName::WEIGHTED
            .into_iter()
            .filter_map(move |field| self.weight(field).map(|w| (field, w)))
    }

    pub fn total(&self) -> f64 {
        self.entries().map(|(_, w)| w).sum()
    }

    pub fn validate(&self) -> Result<()> {
        for (field, w) in self.entries() {
            if !w.is_finite() {
                return Err(RiskScoreError::Configuration(
                    format!("Weight for {} is not finite: {}", field, w)
                ));
            }
            if w < 0.0 {
                return Err(RiskScoreError::Configuration(
                    format!("Weight for {} must be non-negative, got {}", field, w)
                ));
            }
        }

        if self.entries().all(|(_, w)| w == 0.0) {
            return Err(RiskScoreError::Configuration("All weights are zero".to_string()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_weights_are_valid() {
        let weights = WeightTable::default();
        assert!(weights.validate().is_ok());
        assert!((weights.total() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_all_zero_weights_rejected() {
        let weights = WeightTable {
            borrow_to_supply_ratio: 0.0,
            liquidation_count: 0.0,
            total_borrowed: 0.0,
            total_supplied: 0.0,
            wallet_age_days: 0.0,
            asset_count: 0.0,
            activity_score: 0.0,
        };
        assert!(matches!(weights.validate(), Err(RiskScoreError::Configuration(_))));
    }

    #[test]
    fn test_negative_and_nan_weights_rejected() {
        let mut weights = WeightTable::default();
        weights.total_supplied = -0.1;
        assert!(weights.validate().is_err());

        let mut weights = WeightTable::default();
        weights.asset_count = f64::NAN;
        assert!(weights.validate().is_err());
    }

    #[test]
    fn test_unweighted_fields_have_no_weight() {
        let weights = WeightTable::default();
        assert_eq!(weights.weight(FieldName::SupplyCount), None);
        assert_eq!(weights.weight(FieldName::BorrowCount), None);
        assert_eq!(weights.entries().count(), 7);
    }

    #[test]
    fn test_from_file_requires_every_key() {
        let mut complete = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            complete,
            "borrow_to_supply_ratio = 0.4\nliquidation_count = 0.2\ntotal_borrowed = 0.1\n\
             total_supplied = 0.1\nwallet_age_days = 0.1\nasset_count = 0.05\nactivity_score = 0.05"
        ).unwrap();
        let table = WeightTable::from_file(complete.path()).unwrap();
        assert_eq!(table.borrow_to_supply_ratio, 0.4);

        let mut missing = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(missing, "borrow_to_supply_ratio = 0.4").unwrap();
        assert!(matches!(
            WeightTable::from_file(missing.path()),
            Err(RiskScoreError::Configuration(_))
        ));

        let mut unknown = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            unknown,
            "borrow_to_supply_ratio = 0.4\nliquidation_count = 0.2\ntotal_borrowed = 0.1\n\
             total_supplied = 0.1\nwallet_age_days = 0.1\nasset_count = 0.05\nactivity_score = 0.05\n\
             total_repaid = 0.3"
        ).unwrap();
        assert!(WeightTable::from_file(unknown.path()).is_err());
    }

    #[test]
    fn test_from_file_accepts_camel_case_keys() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "borrowToSupplyRatio = 0.4\nliquidationCount = 0.2\ntotalBorrowed = 0.1\n\
             totalSupplied = 0.1\nwalletAgeDays = 0.1\nassetCount = 0.05\nactivityScore = 0.05"
        ).unwrap();

        let table = WeightTable::from_file(file.path()).unwrap();
        assert_eq!(table.borrow_to_supply_ratio, 0.4);
        assert_eq!(table.liquidation_count, 0.2);
        assert_eq!(table.activity_score, 0.05);
    }

    #[test]
    fn test_json_weights_accept_both_spellings() {
        let table: WeightTable = serde_json::from_str(
            r#"{"borrowToSupplyRatio": 0.3, "liquidation_count": 0.25, "totalBorrowed": 0.1,
                "total_supplied": 0.1, "walletAgeDays": 0.1, "assetCount": 0.05, "activityScore": 0.1}"#,
        ).unwrap();
        assert_eq!(table, WeightTable::default());
    }

    #[test]
    fn test_same_weight_twice_rejected() {
        let mut raw: BTreeMap<String, f64> = WeightTable::default()
            .entries()
            .map(|(f, w)| (f.as_str().to_string(), w))
            .collect();
        raw.insert("liquidation_count".to_string(), 0.9);

        assert!(matches!(
            WeightTable::try_from(raw),
            Err(RiskScoreError::Configuration(_))
        ));
    }

    #[test]
    fn test_overrides_keep_unlisted_weights() {
        let overrides = BTreeMap::from([("liquidationcount".to_string(), 0.5)]);
        let table = WeightTable::default().with_overrides(&overrides).unwrap();
        assert_eq!(table.liquidation_count, 0.5);
        assert_eq!(table.total_supplied, 0.10);

        let unknown = BTreeMap::from([("supplyCount".to_string(), 0.5)]);
        assert!(WeightTable::default().with_overrides(&unknown).is_err());
    }
}
