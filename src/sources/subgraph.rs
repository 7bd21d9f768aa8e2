use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tracing::debug;

use crate::{
    models::{AccountRecord, RiskScoreError, Result, TokenPosition, WalletId},
    sources::client::{LendingDataSource, SourceClientConfig},
};

const SOURCE_NAME: &str = "lending-subgraph";

const ACCOUNT_QUERY: &str = r#"
query Account($id: ID!) {
  account(id: $id) {
    id
    countSupply
    countBorrow
    countLiquidated
    countRepay
    tokens {
      symbol
      supplyBalanceUnderlying
      borrowBalanceUnderlying
    }
  }
}
"#;

/// Lending account lookups against a Compound-style subgraph over GraphQL.
pub struct SubgraphClient {
    http_client: reqwest::Client,
    url: String,
}

#[derive(Serialize)]
struct GraphQlRequest<'a> {
    query: &'a str,
    variables: serde_json::Value,
}

#[derive(Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    errors: Option<Vec<GraphQlError>>,
}

#[derive(Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Deserialize)]
struct AccountData {
    account: Option<SubgraphAccount>,
}

/// Subgraphs serialize BigDecimal/BigInt as strings, some proxies as numbers.
#[derive(Deserialize, Debug, Clone)]
#[serde(untagged)]
enum Numeric {
    Number(f64),
    Text(String),
}

impl Numeric {
    fn as_f64(&self) -> Option<f64> {
        match self {
            Numeric::Number(n) => Some(*n),
            Numeric::Text(s) => s.trim().parse::<f64>().ok(),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubgraphAccount {
    #[serde(default)]
    tokens: Vec<SubgraphToken>,
    count_supply: Numeric,
    count_borrow: Numeric,
    count_liquidated: Numeric,
    #[serde(default)]
    count_repay: Option<Numeric>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubgraphToken {
    symbol: String,
    supply_balance_underlying: Numeric,
    borrow_balance_underlying: Numeric,
}

fn parse_amount(wallet: &WalletId, label: &str, value: &Numeric) -> Result<f64> {
    value.as_f64().ok_or_else(|| RiskScoreError::InvalidRecord {
        wallet: wallet.to_string(),
        message: format!("{} is not a number: {:?}", label, value),
    })
}

fn parse_count(wallet: &WalletId, label: &str, value: &Numeric) -> Result<u32> {
    let n = parse_amount(wallet, label, value)?;
    if n < 0.0 || n.fract() != 0.0 || n > u32::MAX as f64 {
        return Err(RiskScoreError::InvalidRecord {
            wallet: wallet.to_string(),
            message: format!("{} is not a count: {}", label, n),
        });
    }
    Ok(n as u32)
}

impl SubgraphAccount {
    fn into_record(self, wallet: &WalletId) -> Result<AccountRecord> {
        let tokens = self
            .tokens
            .iter()
            .map(|t| {
                Ok(TokenPosition {
                    symbol: t.symbol.clone(),
                    supplied_underlying: parse_amount(wallet, "supplyBalanceUnderlying", &t.supply_balance_underlying)?,
                    borrowed_underlying: parse_amount(wallet, "borrowBalanceUnderlying", &t.borrow_balance_underlying)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let repay_count = match &self.count_repay {
            Some(v) => Some(parse_count(wallet, "countRepay", v)?),
            None => None,
        };

        let record = AccountRecord {
            tokens,
            supply_count: parse_count(wallet, "countSupply", &self.count_supply)?,
            borrow_count: parse_count(wallet, "countBorrow", &self.count_borrow)?,
            liquidation_count: parse_count(wallet, "countLiquidated", &self.count_liquidated)?,
            repay_count,
        };
        record.validate(wallet)?;
        Ok(record)
    }
}

/// Decode a raw GraphQL response body into an account, if any.
fn decode_account(wallet: &WalletId, body: &str) -> Result<Option<AccountRecord>> {
    let response: GraphQlResponse<AccountData> = serde_json::from_str(body)?;

    if let Some(errors) = response.errors.filter(|e| !e.is_empty()) {
        let message = errors
            .into_iter()
            .map(|e| e.message)
            .collect::<Vec<_>>()
            .join("; ");
        return Err(RiskScoreError::Source {
            source_name: SOURCE_NAME.to_string(),
            message,
        });
    }

    match response.data.and_then(|d| d.account) {
        Some(account) => account.into_record(wallet).map(Some),
        None => Ok(None),
    }
}

impl SubgraphClient {
    pub fn new(config: SourceClientConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| RiskScoreError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            url: config.url,
        })
    }
}

#[async_trait]
impl LendingDataSource for SubgraphClient {
    fn name(&self) -> &'static str {
        SOURCE_NAME
    }

    async fn fetch_account(&self, wallet: &WalletId) -> Result<Option<AccountRecord>> {
        let request = GraphQlRequest {
            query: ACCOUNT_QUERY,
            variables: json!({ "id": wallet.as_str() }),
        };

        let response = self.http_client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| RiskScoreError::Source {
                source_name: SOURCE_NAME.to_string(),
                message: format!("HTTP request failed: {}", e),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(RiskScoreError::Source {
                source_name: SOURCE_NAME.to_string(),
                message: format!("HTTP status {}", status),
            });
        }

        let body = response.text().await?;
        debug!("Subgraph response for {}: {} bytes", wallet, body.len());

        decode_account(wallet, &body)
    }
}
