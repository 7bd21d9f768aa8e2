use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::WalletId;

/// Shared column name for features, normalized features and weights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldName {
    TotalSupplied = 0,
    TotalBorrowed = 1,
    BorrowToSupplyRatio = 2,
    SupplyCount = 3,
    BorrowCount = 4,
    LiquidationCount = 5,
    WalletAgeDays = 6,
    AssetCount = 7,
    ActivityScore = 8,
}

/// Which way a feature pushes the raw risk score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskDirection {
    Increases,
    Mitigates,
}

impl FieldName {
    pub const COUNT: usize = 9;

    pub const ALL: [FieldName; FieldName::COUNT] = [
        FieldName::TotalSupplied,
        FieldName::TotalBorrowed,
        FieldName::BorrowToSupplyRatio,
        FieldName::SupplyCount,
        FieldName::BorrowCount,
        FieldName::LiquidationCount,
        FieldName::WalletAgeDays,
        FieldName::AssetCount,
        FieldName::ActivityScore,
    ];

    /// The fields the weighted model reads.
    pub const WEIGHTED: [FieldName; 7] = [
        FieldName::BorrowToSupplyRatio,
        FieldName::LiquidationCount,
        FieldName::TotalBorrowed,
        FieldName::TotalSupplied,
        FieldName::WalletAgeDays,
        FieldName::AssetCount,
        FieldName::ActivityScore,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldName::TotalSupplied => "totalSupplied",
            FieldName::TotalBorrowed => "totalBorrowed",
            FieldName::BorrowToSupplyRatio => "borrowToSupplyRatio",
            FieldName::SupplyCount => "supplyCount",
            FieldName::BorrowCount => "borrowCount",
            FieldName::LiquidationCount => "liquidationCount",
            FieldName::WalletAgeDays => "walletAgeDays",
            FieldName::AssetCount => "assetCount",
            FieldName::ActivityScore => "activityScore",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        FieldName::ALL.into_iter().find(|f| f.as_str() == s)
    }

    /// Lenient lookup for config keys: `borrowToSupplyRatio`,
    /// `borrow_to_supply_ratio` and `borrowtosupplyratio` all match.
    pub fn from_key(key: &str) -> Option<Self> {
        let folded: String = key
            .chars()
            .filter(|c| *c != '_')
            .map(|c| c.to_ascii_lowercase())
            .collect();
        FieldName::ALL
            .into_iter()
            .find(|f| f.as_str().eq_ignore_ascii_case(&folded))
    }

    /// Risk direction for weighted fields, `None` for unweighted ones.
    pub fn risk_direction(&self) -> Option<RiskDirection> {
        match self {
            FieldName::BorrowToSupplyRatio
            | FieldName::LiquidationCount
            | FieldName::TotalBorrowed => Some(RiskDirection::Increases),
            FieldName::TotalSupplied
            | FieldName::WalletAgeDays
            | FieldName::AssetCount
            | FieldName::ActivityScore => Some(RiskDirection::Mitigates),
            FieldName::SupplyCount | FieldName::BorrowCount => None,
        }
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRecord {
    pub wallet_id: WalletId,
    pub total_supplied: f64,
    pub total_borrowed: f64,
    pub borrow_to_supply_ratio: f64,
    pub supply_count: u32,
    pub borrow_count: u32,
    pub liquidation_count: u32,
    pub wallet_age_days: u32,
    pub asset_count: u32,
    pub activity_score: u32,
}

impl FeatureRecord {
    pub fn value(&self, field: FieldName) -> f64 {
        match field {
            FieldName::TotalSupplied => self.total_supplied,
            FieldName::TotalBorrowed => self.total_borrowed,
            FieldName::BorrowToSupplyRatio => self.borrow_to_supply_ratio,
            FieldName::SupplyCount => self.supply_count as f64,
            FieldName::BorrowCount => self.borrow_count as f64,
            FieldName::LiquidationCount => self.liquidation_count as f64,
            FieldName::WalletAgeDays => self.wallet_age_days as f64,
            FieldName::AssetCount => self.asset_count as f64,
            FieldName::ActivityScore => self.activity_score as f64,
        }
    }
}

/// Feature values after population min-max scaling, indexed by `FieldName`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedFeatureRecord {
    pub wallet_id: WalletId,
    pub values: [f64; FieldName::COUNT],
}

impl NormalizedFeatureRecord {
    pub fn get(&self, field: FieldName) -> f64 {
        self.values[field.index()]
    }
}
