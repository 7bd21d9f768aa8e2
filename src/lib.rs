pub mod models;
pub mod config;
pub mod sources;
pub mod scoring;
pub mod output;
pub mod utils;

pub use models::{
    WalletId, AccountRecord, FeatureRecord, NormalizedFeatureRecord, ScoredWalletRecord,
    ScoreRow, FieldName, RiskScoreError, Result,
};
pub use config::Settings;
pub use scoring::{RiskPipeline, WeightTable};
