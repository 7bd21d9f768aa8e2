pub mod weights;
pub mod features;
pub mod normalizer;
pub mod engine;
pub mod policy;
pub mod collector;
pub mod pipeline;

pub use weights::WeightTable;
pub use features::FeatureBuilder;
pub use normalizer::{ColumnStats, Normalizer, min_max};
pub use engine::ScoringEngine;
pub use policy::{MissingDataPolicy, MissingValuePolicy, ResolvedInputs};
pub use collector::{AccountCollector, CollectorConfig};
pub use pipeline::{PipelineOutcome, RiskPipeline};
