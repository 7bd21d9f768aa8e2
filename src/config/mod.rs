pub mod settings;
pub mod sources;

pub use settings::{Settings, AppSettings, ScoringSettings, CollectorSettings, InputSettings};
pub use sources::{SourceSettings, LendingEndpoint, ExplorerEndpoint, EXPLORER_API_KEY_ENV};
pub use crate::scoring::WeightTable;
