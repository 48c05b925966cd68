use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::models::TransactionRecord;

const MAKE_TRANSACTIONS_QUERY: &str = r#"
  query {
    makeTransactions {
      id
      action
      amounterc
      amountnft
      blockTime
      blockNumber
      dml
      price
      sender
      to
      transactionHash
    }
  }
"#;

/// Where a sync pass gets its candidate records from.
#[async_trait]
pub trait TransactionSource: Send + Sync {
    async fn fetch_transactions(&self) -> Result<Vec<TransactionRecord>>;
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    data: Option<MakeTransactions>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MakeTransactions {
    make_transactions: Vec<TransactionRecord>,
}

pub struct SubgraphClient {
    http: reqwest::Client,
    url: String,
}

impl SubgraphClient {
    pub fn new(url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            url: url.to_string(),
        }
    }
}

#[async_trait]
impl TransactionSource for SubgraphClient {
    async fn fetch_transactions(&self) -> Result<Vec<TransactionRecord>> {
        let body = self
            .http
            .post(&self.url)
            .json(&json!({ "query": MAKE_TRANSACTIONS_QUERY }))
            .send()
            .await
            .with_context(|| format!("subgraph request to {} failed", self.url))?
            .error_for_status()?
            .text()
            .await?;

        parse_response(&body)
    }
}

fn parse_response(body: &str) -> Result<Vec<TransactionRecord>> {
    let response: GraphQlResponse =
        serde_json::from_str(body).context("malformed subgraph response")?;

    if !response.errors.is_empty() {
        let messages: Vec<&str> = response.errors.iter().map(|e| e.message.as_str()).collect();
        return Err(anyhow!("subgraph returned errors: {}", messages.join("; ")));
    }

    let data = response
        .data
        .ok_or_else(|| anyhow!("subgraph response has no data"))?;

    Ok(data.make_transactions)
}
