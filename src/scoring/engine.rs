use tracing::info;

use crate::{
    models::{
        FieldName, NormalizedFeatureRecord, RiskDirection, RiskScoreError, Result,
        ScoredWalletRecord, MAX_SCORE,
    },
    scoring::{normalizer::ColumnStats, WeightTable},
};

pub struct ScoringEngine {
    weights: WeightTable,
}

impl ScoringEngine {
    pub fn new(weights: WeightTable) -> Result<Self> {
        weights.validate()?;
        Ok(Self { weights })
    }

    /// Risk-increasing features add, mitigating features subtract.
    pub fn raw_risk_score(&self, record: &NormalizedFeatureRecord) -> f64 {
        FieldName::WEIGHTED
            .iter()
            .map(|field| {
                let w = self.weights.weight(*field).unwrap_or(0.0);
                let term = w * record.get(*field);
                match field.risk_direction() {
                    Some(RiskDirection::Increases) => term,
                    Some(RiskDirection::Mitigates) => -term,
                    None => 0.0,
                }
            })
            .sum()
    }

    /// Highest raw risk maps to 0, lowest to 1000.
    pub fn to_score(normalized_risk: f64) -> u16 {
        let scaled = ((1.0 - normalized_risk) * MAX_SCORE as f64).round();
        scaled.clamp(0.0, MAX_SCORE as f64) as u16
    }

    /// Scores the whole population. Output is sorted by wallet id.
    pub fn score(&self, records: &[NormalizedFeatureRecord]) -> Result<Vec<ScoredWalletRecord>> {
        if records.is_empty() {
            return Err(RiskScoreError::EmptyPopulation(
                "no normalized feature records to score".to_string()
            ));
        }

        let raw: Vec<f64> = records.iter().map(|r| self.raw_risk_score(r)).collect();
        let stats = ColumnStats::of(&raw).ok_or_else(|| {
            RiskScoreError::EmptyPopulation("no raw risk scores".to_string())
        })?;

        let mut scored: Vec<ScoredWalletRecord> = records
            .iter()
            .zip(raw.iter())
            .map(|(record, raw_risk_score)| {
                let normalized_risk = stats.scale(*raw_risk_score).clamp(0.0, 1.0);
                ScoredWalletRecord {
                    wallet_id: record.wallet_id.clone(),
                    raw_risk_score: *raw_risk_score,
                    normalized_risk,
                    score: Self::to_score(normalized_risk),
                }
            })
            .collect();

        scored.sort_by(|a, b| a.wallet_id.cmp(&b.wallet_id));

        info!(
            "Scored {} wallets (raw risk range {:.4}..{:.4})",
            scored.len(), stats.min, stats.max
        );

        Ok(scored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::WalletId;

    fn normalized(id: &str, values: [(FieldName, f64); 3]) -> NormalizedFeatureRecord {
        let mut row = NormalizedFeatureRecord {
            wallet_id: WalletId::parse(id).unwrap(),
            values: [0.0; FieldName::COUNT],
        };
        for (field, v) in values {
            row.values[field.index()] = v;
        }
        row
    }

    #[test]
    fn test_sign_convention() {
        let engine = ScoringEngine::new(WeightTable::default()).unwrap();
        let risky = normalized("0x1", [
            (FieldName::BorrowToSupplyRatio, 1.0),
            (FieldName::LiquidationCount, 1.0),
            (FieldName::TotalBorrowed, 1.0),
        ]);
        let safe = normalized("0x2", [
            (FieldName::TotalSupplied, 1.0),
            (FieldName::WalletAgeDays, 1.0),
            (FieldName::ActivityScore, 1.0),
        ]);

        assert!((engine.raw_risk_score(&risky) - 0.65).abs() < 1e-12);
        assert!((engine.raw_risk_score(&safe) + 0.30).abs() < 1e-12);
    }

    #[test]
    fn test_unweighted_fields_ignored() {
        let engine = ScoringEngine::new(WeightTable::default()).unwrap();
        let row = normalized("0x1", [
            (FieldName::SupplyCount, 1.0),
            (FieldName::BorrowCount, 1.0),
            (FieldName::SupplyCount, 1.0),
        ]);
        assert_eq!(engine.raw_risk_score(&row), 0.0);
    }

    #[test]
    fn test_extremes_map_to_bounds() {
        let engine = ScoringEngine::new(WeightTable::default()).unwrap();
        let rows = vec![
            normalized("0xb", [
                (FieldName::LiquidationCount, 1.0),
                (FieldName::TotalBorrowed, 1.0),
                (FieldName::BorrowToSupplyRatio, 1.0),
            ]),
            normalized("0xa", [
                (FieldName::TotalSupplied, 1.0),
                (FieldName::WalletAgeDays, 1.0),
                (FieldName::AssetCount, 1.0),
            ]),
            normalized("0xc", [
                (FieldName::LiquidationCount, 0.2),
                (FieldName::TotalSupplied, 0.4),
                (FieldName::AssetCount, 0.0),
            ]),
        ];

        let scored = engine.score(&rows).unwrap();
        let ids: Vec<&str> = scored.iter().map(|s| s.wallet_id.as_str()).collect();
        assert_eq!(ids, vec!["0xa", "0xb", "0xc"]);

        assert_eq!(scored[0].score, 1000);
        assert_eq!(scored[0].normalized_risk, 0.0);
        assert_eq!(scored[1].score, 0);
        assert_eq!(scored[1].normalized_risk, 1.0);
        assert!(scored[2].score > 0 && scored[2].score < 1000);
    }

    #[test]
    fn test_ties_share_a_score() {
        let engine = ScoringEngine::new(WeightTable::default()).unwrap();
        let same = [(FieldName::LiquidationCount, 0.5), (FieldName::TotalSupplied, 0.5), (FieldName::AssetCount, 0.1)];
        let rows = vec![
            normalized("0x1", same),
            normalized("0x2", same),
            normalized("0x3", [(FieldName::LiquidationCount, 1.0), (FieldName::TotalSupplied, 0.0), (FieldName::AssetCount, 0.0)]),
        ];
        let scored = engine.score(&rows).unwrap();
        assert_eq!(scored[0].score, scored[1].score);
        assert_eq!(scored[2].score, 0);
    }

    #[test]
    fn test_degenerate_population_is_clamped() {
        let engine = ScoringEngine::new(WeightTable::default()).unwrap();
        // one wallet: raw risk is negative, identity mapping then clamp
        let rows = vec![normalized("0x1", [
            (FieldName::TotalSupplied, 1.0),
            (FieldName::WalletAgeDays, 1.0),
            (FieldName::AssetCount, 1.0),
        ])];
        let scored = engine.score(&rows).unwrap();
        assert_eq!(scored[0].normalized_risk, 0.0);
        assert_eq!(scored[0].score, 1000);
    }

    #[test]
    fn test_to_score_bounds() {
        assert_eq!(ScoringEngine::to_score(0.0), 1000);
        assert_eq!(ScoringEngine::to_score(1.0), 0);
        assert_eq!(ScoringEngine::to_score(0.25), 750);
        assert_eq!(ScoringEngine::to_score(-3.0), 1000);
        assert_eq!(ScoringEngine::to_score(7.0), 0);
    }

    #[test]
    fn test_empty_population_is_an_error() {
        let engine = ScoringEngine::new(WeightTable::default()).unwrap();
        assert!(matches!(engine.score(&[]), Err(RiskScoreError::EmptyPopulation(_))));
    }

    #[test]
    fn test_invalid_weights_rejected_up_front() {
        let mut weights = WeightTable::default();
        weights.liquidation_count = -1.0;
        assert!(matches!(ScoringEngine::new(weights), Err(RiskScoreError::Configuration(_))));
    }
}
