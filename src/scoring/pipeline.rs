use tracing::{info, warn};

use crate::{
    models::{
        CollectionReport, FeatureRecord, RiskScoreError, Result, ScoreRow, ScoredWalletRecord,
        SkippedWallet, WalletId,
    },
    scoring::{
        AccountCollector, FeatureBuilder, MissingDataPolicy, Normalizer, ScoringEngine,
        WeightTable,
    },
};

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutcome {
    /// Sorted by wallet id.
    pub scored: Vec<ScoredWalletRecord>,
    /// Wallets dropped during collection or by the missing-data policy.
    pub skipped: Vec<SkippedWallet>,
}

impl PipelineOutcome {
    pub fn rows(&self) -> Vec<ScoreRow> {
        self.scored.iter().map(|s| s.to_row()).collect()
    }
}

/// Collect everything first, then run the batch stages over the full population.
pub struct RiskPipeline {
    builder: FeatureBuilder,
    normalizer: Normalizer,
    engine: ScoringEngine,
    policy: MissingDataPolicy,
}

impl RiskPipeline {
    pub fn new(weights: WeightTable, normalizer: Normalizer, policy: MissingDataPolicy) -> Result<Self> {
        Ok(Self {
            builder: FeatureBuilder::new(),
            normalizer,
            engine: ScoringEngine::new(weights)?,
            policy,
        })
    }

    /// Resolve unknowns and build one feature row per surviving wallet.
    pub fn build_features(&self, report: &CollectionReport) -> (Vec<FeatureRecord>, Vec<SkippedWallet>) {
        let mut features = Vec::with_capacity(report.collected.len());
        let mut excluded = Vec::new();

        for wallet in &report.collected {
            match self.policy.resolve(wallet, report.as_of) {
                Ok(inputs) => features.push(self.builder.build(
                    &wallet.wallet_id,
                    &wallet.account,
                    inputs.wallet_age_days,
                    inputs.repay_count,
                )),
                Err(reason) => {
                    warn!("Excluding wallet {}: {}", wallet.wallet_id, reason);
                    excluded.push(SkippedWallet {
                        wallet_id: wallet.wallet_id.clone(),
                        reason,
                    });
                }
            }
        }

        (features, excluded)
    }

    /// Score a frozen collection report. Pure: no I/O, same input gives same scores.
    pub fn score_report(&self, report: &CollectionReport) -> Result<PipelineOutcome> {
        let (features, excluded) = self.build_features(report);

        let mut skipped: Vec<SkippedWallet> = report.skipped.iter().cloned().chain(excluded).collect();
        skipped.sort_by(|a, b| a.wallet_id.cmp(&b.wallet_id));

        if features.is_empty() {
            return Err(RiskScoreError::EmptyPopulation(format!(
                "all {} wallets were skipped",
                skipped.len()
            )));
        }

        info!("Normalizing {} feature rows over {} fields", features.len(), self.normalizer.fields().len());
        let normalized = self.normalizer.normalize(&features);
        let scored = self.engine.score(&normalized)?;

        Ok(PipelineOutcome { scored, skipped })
    }

    pub async fn run(
        &self,
        collector: &AccountCollector,
        wallets: &[WalletId],
    ) -> Result<(CollectionReport, PipelineOutcome)> {
        if wallets.is_empty() {
            return Err(RiskScoreError::EmptyPopulation("no wallets supplied".to_string()));
        }

        let report = collector.collect(wallets).await;
        let outcome = self.score_report(&report)?;
        Ok((report, outcome))
    }
}
