use anyhow::{Context, Result};
use log::info;
use std::collections::HashSet;
use std::sync::Arc;

use crate::{
    config::Config,
    database::Database,
    enricher::Enricher,
    ethereum::{EthereumClient, NameResolver},
    models::{SyncReport, TransactionRecord},
    subgraph::{SubgraphClient, TransactionSource},
};

/// One fetch → enrich → dedupe → insert pass over the subgraph.
pub struct Indexer {
    source: Arc<dyn TransactionSource>,
    enricher: Enricher,
    database_url: String,
}

impl Indexer {
    pub fn new(
        source: Arc<dyn TransactionSource>,
        resolver: Arc<dyn NameResolver>,
        database_url: &str,
    ) -> Self {
        Self {
            source,
            enricher: Enricher::new(resolver),
            database_url: database_url.to_string(),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let source = Arc::new(SubgraphClient::new(&config.subgraph_url));
        let resolver = Arc::new(EthereumClient::new(
            &config.rpc_url,
            &config.explorer_api_url,
            config.explorer_api_key.clone(),
        )?);

        Ok(Self::new(source, resolver, &config.database_url))
    }

    pub async fn run(&self) -> Result<SyncReport> {
        let database = Database::connect(&self.database_url)
            .await
            .context("sync aborted, database unavailable")?;
        info!("Connected to database");

        let outcome = self.sync(&database).await;

        database.close().await;
        info!("Database connection closed");

        if let Ok(report) = &outcome {
            info!(
                "Sync finished: {} fetched, {} skipped, {} inserted",
                report.fetched, report.skipped, report.inserted
            );
        }

        outcome
    }

    async fn sync(&self, database: &Database) -> Result<SyncReport> {
        let records = self.source.fetch_transactions().await?;
        info!("Fetched {} records from subgraph", records.len());

        let mut report = SyncReport {
            fetched: records.len(),
            ..SyncReport::default()
        };

        let batch = self.collect_new(database, records, &mut report).await?;

        if batch.is_empty() {
            info!("No new records to insert.");
        } else {
            report.inserted = database.insert_many(&batch).await?;
            info!("{} new records inserted", report.inserted);
        }

        Ok(report)
    }

    async fn collect_new(
        &self,
        database: &Database,
        records: Vec<TransactionRecord>,
        report: &mut SyncReport,
    ) -> Result<Vec<TransactionRecord>> {
        let mut batch = Vec::new();
        let mut batched_ids = HashSet::new();

        for record in records {
            let record = self.enricher.enrich(record).await;

            if database.find_by_id(&record.id).await?.is_some() {
                info!("Record with id {} already exists. Skipping insertion.", record.id);
                report.skipped += 1;
                continue;
            }

            if !batched_ids.insert(record.id.clone()) {
                info!("Record with id {} repeated in this fetch. Skipping.", record.id);
                report.skipped += 1;
                continue;
            }

            batch.push(record);
        }

        Ok(batch)
    }
}
