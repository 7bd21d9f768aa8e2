use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;
use std::time::Duration;

use crate::{
    models::{RiskScoreError, Result, WalletId},
    sources::client::{SourceClientConfig, WalletAgeSource},
};

const SOURCE_NAME: &str = "block-explorer";

/// First-transaction lookups through an Etherscan-compatible `txlist` endpoint.
pub struct ExplorerClient {
    http_client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

#[derive(Deserialize)]
struct ExplorerResponse {
    status: String,
    message: String,
    result: serde_json::Value,
}

#[derive(Deserialize)]
struct ExplorerTx {
    #[serde(rename = "timeStamp")]
    time_stamp: String,
}

fn source_error(message: String) -> RiskScoreError {
    RiskScoreError::Source {
        source_name: SOURCE_NAME.to_string(),
        message,
    }
}

/// Decode a `txlist` body sorted ascending; the first entry is the oldest.
fn decode_first_activity(body: &str) -> Result<Option<DateTime<Utc>>> {
    let response: ExplorerResponse = serde_json::from_str(body)?;

    if response.status != "1" {
        if response.message.starts_with("No transactions found") {
            return Ok(None);
        }
        let detail = response.result.as_str().unwrap_or_default();
        return Err(source_error(format!("{} {}", response.message, detail).trim().to_string()));
    }

    let txs: Vec<ExplorerTx> = serde_json::from_value(response.result)?;
    let Some(first) = txs.first() else {
        return Ok(None);
    };

    let seconds: i64 = first
        .time_stamp
        .parse()
        .map_err(|_| source_error(format!("bad timeStamp {:?}", first.time_stamp)))?;

    Utc.timestamp_opt(seconds, 0)
        .single()
        .map(Some)
        .ok_or_else(|| source_error(format!("timestamp out of range: {}", seconds)))
}

impl ExplorerClient {
    pub fn new(config: SourceClientConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| RiskScoreError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url: config.url,
            api_key: config.api_key,
        })
    }
}

#[async_trait]
impl WalletAgeSource for ExplorerClient {
    fn name(&self) -> &'static str {
        SOURCE_NAME
    }

    async fn fetch_first_activity(&self, wallet: &WalletId) -> Result<Option<DateTime<Utc>>> {
        let mut query = vec![
            ("module", "account"),
            ("action", "txlist"),
            ("address", wallet.as_str()),
            ("startblock", "0"),
            ("endblock", "99999999"),
            ("page", "1"),
            ("offset", "1"),
            ("sort", "asc"),
        ];
        if let Some(key) = &self.api_key {
            query.push(("apikey", key.as_str()));
        }

        let response = self.http_client
            .get(&self.base_url)
            .query(&query)
            .send()
            .await
            .map_err(|e| source_error(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(source_error(format!("HTTP status {}", status)));
        }

        let body = response.text().await?;
        decode_first_activity(&body)
    }
}
