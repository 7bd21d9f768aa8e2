pub mod client;
pub mod subgraph;
pub mod explorer;
pub mod fixture;
pub mod resilience;

pub use client::{LendingDataSource, WalletAgeSource, SourceClientConfig};
pub use subgraph::SubgraphClient;
pub use explorer::ExplorerClient;
pub use fixture::{FixtureSource, FixtureWallet};
pub use resilience::{RetryConfig, retry_with_backoff, with_timeout};
