use serde::{Deserialize, Serialize};

use crate::models::WalletId;

pub const MAX_SCORE: u16 = 1000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredWalletRecord {
    pub wallet_id: WalletId,
    pub raw_risk_score: f64,
    /// Population-scaled risk in [0, 1].
    pub normalized_risk: f64,
    /// 0 is riskiest, 1000 is safest.
    pub score: u16,
}

impl ScoredWalletRecord {
    pub fn to_row(&self) -> ScoreRow {
        ScoreRow {
            wallet_id: self.wallet_id.clone(),
            score: self.score,
        }
    }

    pub fn band(&self) -> RiskBand {
        RiskBand::from_score(self.score)
    }
}

/// The projection handed to a `ResultEmitter`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreRow {
    pub wallet_id: WalletId,
    pub score: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskBand {
    VeryHigh,
    High,
    Moderate,
    Low,
    VeryLow,
}

impl RiskBand {
    pub fn from_score(score: u16) -> Self {
        match score {
            s if s >= 800 => RiskBand::VeryLow,
            s if s >= 600 => RiskBand::Low,
            s if s >= 400 => RiskBand::Moderate,
            s if s >= 200 => RiskBand::High,
            _ => RiskBand::VeryHigh,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskBand::VeryHigh => "very_high",
            RiskBand::High => "high",
            RiskBand::Moderate => "moderate",
            RiskBand::Low => "low",
            RiskBand::VeryLow => "very_low",
        }
    }
}
