use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::Value;
use sqlx::FromRow;

/// A `makeTransactions` entity as served by the subgraph and kept in the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct TransactionRecord {
    pub id: String,
    pub action: String,
    #[serde(rename = "amounterc", deserialize_with = "string_or_number")]
    pub amount_erc: String,
    #[serde(rename = "amountnft", deserialize_with = "string_or_number")]
    pub amount_nft: String,
    #[serde(rename = "blockTime", deserialize_with = "timestamp")]
    pub block_time: i64,
    #[serde(rename = "blockNumber", deserialize_with = "string_or_number")]
    pub block_number: String,
    #[serde(deserialize_with = "string_or_number")]
    pub price: String,
    pub sender: String,
    pub to: String,
    #[serde(rename = "transactionHash")]
    pub transaction_hash: String,
    pub dml: String,
}

// The subgraph serialises BigInt as a JSON string, but hand-written fixtures
// and other deployments send plain numbers.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Null => Ok(String::new()),
        other => Err(de::Error::custom(format!(
            "expected string or number, got {}",
            other
        ))),
    }
}

fn timestamp<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => s
            .trim()
            .parse()
            .map_err(|_| de::Error::custom(format!("invalid blockTime {:?}", s))),
        Value::Number(n) => n
            .as_i64()
            .ok_or_else(|| de::Error::custom(format!("blockTime {} out of range", n))),
        other => Err(de::Error::custom(format!(
            "expected unix timestamp, got {}",
            other
        ))),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetNames {
    pub token_name: String,
    pub nft_name: String,
}

/// Outcome of a name lookup. `Unresolved` stands in for every failure mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Resolved(AssetNames),
    Unresolved,
}

impl Resolution {
    pub fn into_names(self) -> AssetNames {
        match self {
            Resolution::Resolved(names) => names,
            Resolution::Unresolved => AssetNames::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub fetched: usize,
    pub skipped: usize,
    pub inserted: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionLink {
    pub value: String,
    pub link: String,
}

/// Public projection of a stored record. `dml` is deliberately absent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormattedRecord {
    pub action: ActionLink,
    pub amountnft: String,
    pub amounterc: String,
    pub sender: String,
    #[serde(rename = "blockTime")]
    pub block_time: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResult {
    pub data: Vec<FormattedRecord>,
    pub total_pages: i64,
    pub current_page: i64,
    pub has_next_page: bool,
    pub has_previous_page: bool,
    pub total_records: i64,
    pub next_page: Option<String>,
    pub previous_page: Option<String>,
}
