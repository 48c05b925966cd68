use log::debug;
use std::sync::Arc;

use crate::ethereum::NameResolver;
use crate::models::{AssetNames, TransactionRecord};

pub struct Enricher {
    resolver: Arc<dyn NameResolver>,
}

impl Enricher {
    pub fn new(resolver: Arc<dyn NameResolver>) -> Self {
        Self { resolver }
    }

    /// Rewrites `action` with the names behind `record.dml`. Leaves every
    /// other field untouched and never fails.
    pub async fn enrich(&self, mut record: TransactionRecord) -> TransactionRecord {
        let names = self.resolver.resolve(&record.dml).await.into_names();
        record.action = describe_action(&record.action, &names);
        debug!("Updated Action: {}", record.action);
        record
    }
}

/// `"<action> <nft name> from <token name>"`. Blank names are not elided.
pub fn describe_action(action: &str, names: &AssetNames) -> String {
    format!("{} {} from {}", action, names.nft_name, names.token_name)
}
