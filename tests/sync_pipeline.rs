//! Sync pass tests against a throwaway SQLite file, with the subgraph and the
//! name resolver replaced by in-process fakes.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

use polygon_dml_indexer::database::Database;
use polygon_dml_indexer::ethereum::NameResolver;
use polygon_dml_indexer::indexer::Indexer;
use polygon_dml_indexer::models::{AssetNames, Resolution, TransactionRecord};
use polygon_dml_indexer::subgraph::TransactionSource;

struct FixedSource {
    records: Vec<TransactionRecord>,
    fetches: AtomicUsize,
}

impl FixedSource {
    fn new(records: Vec<TransactionRecord>) -> Self {
        Self {
            records,
            fetches: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl TransactionSource for FixedSource {
    async fn fetch_transactions(&self) -> Result<Vec<TransactionRecord>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self.records.clone())
    }
}

struct BrokenSource;

#[async_trait]
impl TransactionSource for BrokenSource {
    async fn fetch_transactions(&self) -> Result<Vec<TransactionRecord>> {
        Err(anyhow!("subgraph unreachable"))
    }
}

/// Resolves the contracts it knows about and fails on everything else.
struct MapResolver {
    known: HashMap<String, AssetNames>,
    calls: Mutex<Vec<String>>,
}

impl MapResolver {
    fn new(known: &[(&str, &str, &str)]) -> Self {
        Self {
            known: known
                .iter()
                .map(|(dml, token, nft)| {
                    (
                        dml.to_string(),
                        AssetNames {
                            token_name: token.to_string(),
                            nft_name: nft.to_string(),
                        },
                    )
                })
                .collect(),
            calls: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl NameResolver for MapResolver {
    async fn resolve(&self, contract_address: &str) -> Resolution {
        self.calls.lock().unwrap().push(contract_address.to_string());
        match self.known.get(contract_address) {
            Some(names) => Resolution::Resolved(names.clone()),
            None => Resolution::Unresolved,
        }
    }
}

fn record(id: &str, action: &str, dml: &str, block_time: i64) -> TransactionRecord {
    TransactionRecord {
        id: id.to_string(),
        action: action.to_string(),
        amount_erc: "1000".to_string(),
        amount_nft: "1".to_string(),
        block_time,
        block_number: "40000000".to_string(),
        price: "1000".to_string(),
        sender: "0x1111111111111111111111111111111111111111".to_string(),
        to: "0x2222222222222222222222222222222222222222".to_string(),
        transaction_hash: format!("0xhash{}", id),
        dml: dml.to_string(),
    }
}

fn database_url(dir: &TempDir) -> String {
    format!("sqlite://{}", dir.path().join("sync.db").display())
}

async fn stored(url: &str, id: &str) -> Option<TransactionRecord> {
    let db = Database::connect(url).await.unwrap();
    let found = db.find_by_id(id).await.unwrap();
    db.close().await;
    found
}

async fn stored_count(url: &str) -> i64 {
    let db = Database::connect(url).await.unwrap();
    let count = db.count().await.unwrap();
    db.close().await;
    count
}

#[tokio::test]
async fn second_pass_inserts_nothing() {
    let dir = TempDir::new().unwrap();
    let url = database_url(&dir);
    let source = Arc::new(FixedSource::new(vec![
        record("1", "Bought", "0xmarket", 100),
        record("2", "Listed", "0xunknown", 200),
        record("3", "Sold", "0xmarket", 300),
    ]));
    let resolver = Arc::new(MapResolver::new(&[("0xmarket", "USD Coin", "Punks")]));
    let indexer = Indexer::new(source.clone(), resolver, &url);

    let first = indexer.run().await.unwrap();
    assert_eq!(first.fetched, 3);
    assert_eq!(first.inserted, 3);
    assert_eq!(first.skipped, 0);

    let second = indexer.run().await.unwrap();
    assert_eq!(second.fetched, 3);
    assert_eq!(second.inserted, 0);
    assert_eq!(second.skipped, 3);

    assert_eq!(stored_count(&url).await, 3);
    assert_eq!(source.fetches.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn stored_records_are_never_overwritten() {
    let dir = TempDir::new().unwrap();
    let url = database_url(&dir);
    let resolver = Arc::new(MapResolver::new(&[("0xmarket", "USD Coin", "Punks")]));

    let first = Indexer::new(
        Arc::new(FixedSource::new(vec![record("1", "Bought", "0xmarket", 100)])),
        resolver.clone(),
        &url,
    );
    first.run().await.unwrap();

    let changed = Indexer::new(
        Arc::new(FixedSource::new(vec![record("1", "Sold", "0xmarket", 999)])),
        resolver,
        &url,
    );
    let report = changed.run().await.unwrap();
    assert_eq!(report.inserted, 0);

    let kept = stored(&url, "1").await.unwrap();
    assert_eq!(kept.action, "Bought Punks from USD Coin");
    assert_eq!(kept.block_time, 100);
}

#[tokio::test]
async fn failed_resolution_still_inserts() {
    let dir = TempDir::new().unwrap();
    let url = database_url(&dir);
    let indexer = Indexer::new(
        Arc::new(FixedSource::new(vec![record("7", "Bought", "0xbroken", 1)])),
        Arc::new(MapResolver::new(&[])),
        &url,
    );

    let report = indexer.run().await.unwrap();
    assert_eq!(report.inserted, 1);

    let saved = stored(&url, "7").await.unwrap();
    assert_eq!(saved.action, "Bought  from ");
    assert!(saved.action.ends_with(" from "));

    // Degraded records are deduplicated like any other.
    assert_eq!(indexer.run().await.unwrap().inserted, 0);
}

#[tokio::test]
async fn enrichment_runs_in_source_order_and_once_per_record() {
    let dir = TempDir::new().unwrap();
    let url = database_url(&dir);
    let resolver = Arc::new(MapResolver::new(&[]));
    let indexer = Indexer::new(
        Arc::new(FixedSource::new(vec![
            record("a", "x", "0x03", 1),
            record("b", "x", "0x01", 2),
            record("c", "x", "0x02", 3),
        ])),
        resolver.clone(),
        &url,
    );

    indexer.run().await.unwrap();
    assert_eq!(*resolver.calls.lock().unwrap(), ["0x03", "0x01", "0x02"]);
}

#[tokio::test]
async fn repeated_id_in_one_fetch_is_inserted_once() {
    let dir = TempDir::new().unwrap();
    let url = database_url(&dir);
    let indexer = Indexer::new(
        Arc::new(FixedSource::new(vec![
            record("dup", "Bought", "0xmarket", 1),
            record("dup", "Bought", "0xmarket", 1),
            record("other", "Bought", "0xmarket", 2),
        ])),
        Arc::new(MapResolver::new(&[])),
        &url,
    );

    let report = indexer.run().await.unwrap();
    assert_eq!(report.inserted, 2);
    assert_eq!(report.skipped, 1);
    assert_eq!(stored_count(&url).await, 2);
}

#[tokio::test]
async fn empty_source_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let url = database_url(&dir);
    let indexer = Indexer::new(
        Arc::new(FixedSource::new(Vec::new())),
        Arc::new(MapResolver::new(&[])),
        &url,
    );

    let report = indexer.run().await.unwrap();
    assert_eq!(report.fetched, 0);
    assert_eq!(report.inserted, 0);
    assert_eq!(stored_count(&url).await, 0);
}

#[tokio::test]
async fn source_failure_aborts_without_writes() {
    let dir = TempDir::new().unwrap();
    let url = database_url(&dir);
    let indexer = Indexer::new(Arc::new(BrokenSource), Arc::new(MapResolver::new(&[])), &url);

    let err = indexer.run().await.unwrap_err();
    assert!(err.to_string().contains("subgraph unreachable"));
    assert_eq!(stored_count(&url).await, 0);
}

#[tokio::test]
async fn unreachable_store_aborts_before_fetching() {
    let dir = TempDir::new().unwrap();
    let url = format!(
        "sqlite://{}",
        dir.path().join("no-such-dir").join("sync.db").display()
    );
    let source = Arc::new(FixedSource::new(vec![record("1", "Bought", "0xmarket", 1)]));
    let indexer = Indexer::new(source.clone(), Arc::new(MapResolver::new(&[])), &url);

    let err = indexer.run().await.unwrap_err();
    assert!(format!("{:#}", err).contains("database unavailable"));
    assert_eq!(source.fetches.load(Ordering::SeqCst), 0);
}
