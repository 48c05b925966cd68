use anyhow::Result;
use chrono::{DateTime, Utc};
use reqwest::Url;

use crate::{
    config::Config,
    database::Database,
    models::{ActionLink, FormattedRecord, PageResult, TransactionRecord},
    relative_time::relative_time,
};

pub const DEFAULT_PAGE_SIZE: i64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: i64,
    pub page_size: i64,
    pub skip: i64,
    pub total_records: i64,
    pub total_pages: i64,
    pub has_next_page: bool,
    pub has_previous_page: bool,
}

impl Pagination {
    pub fn new(page: i64, page_size: i64, total_records: i64) -> Self {
        let page = page.max(1);
        let page_size = page_size.max(1);
        let skip = (page - 1).saturating_mul(page_size);

        Self {
            page,
            page_size,
            skip,
            total_records,
            total_pages: total_records / page_size + (total_records % page_size != 0) as i64,
            has_next_page: skip.saturating_add(page_size) < total_records,
            has_previous_page: page > 1,
        }
    }
}

/// Reads the `page` query value the way an integer-prefix parse would:
/// `"2abc"` is page 2. Anything missing, non-numeric or below 1 is page 1;
/// digit runs too large for `i64` saturate.
pub fn parse_page(raw: Option<&str>) -> i64 {
    let raw = match raw {
        Some(raw) => raw.trim_start(),
        None => return 1,
    };

    let (sign, digits) = match raw.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, raw.strip_prefix('+').unwrap_or(raw)),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());

    let digits = &digits[..end];
    if sign < 0 || digits.is_empty() {
        return 1;
    }

    match digits.parse::<i64>() {
        Ok(n) => n.max(1),
        Err(_) => i64::MAX,
    }
}

/// `request_url` with its `page` parameter set to `page`; every other query
/// parameter is kept as it was.
pub fn page_link(request_url: &Url, page: i64) -> String {
    let page = page.to_string();
    let mut pairs: Vec<(String, String)> = Vec::new();
    let mut replaced = false;

    for (key, value) in request_url.query_pairs() {
        if key == "page" {
            if !replaced {
                pairs.push(("page".to_string(), page.clone()));
                replaced = true;
            }
        } else {
            pairs.push((key.into_owned(), value.into_owned()));
        }
    }
    if !replaced {
        pairs.push(("page".to_string(), page));
    }

    let mut url = request_url.clone();
    url.query_pairs_mut().clear().extend_pairs(pairs);
    url.to_string()
}

pub struct QueryService {
    database_url: String,
    explorer_tx_url: String,
    page_size: i64,
}

impl QueryService {
    pub fn new(database_url: &str, explorer_tx_url: &str, page_size: i64) -> Self {
        Self {
            database_url: database_url.to_string(),
            explorer_tx_url: explorer_tx_url.to_string(),
            page_size: page_size.max(1),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            &config.database_url,
            &config.explorer_tx_url,
            config.page_size,
        )
    }

    /// Opens its own store handle for the duration of the read.
    pub async fn get_page(&self, page: i64, request_url: &Url) -> Result<PageResult> {
        let database = Database::connect(&self.database_url).await?;
        let result = self
            .read_page(&database, page, request_url, Utc::now())
            .await;
        database.close().await;
        result
    }

    async fn read_page(
        &self,
        database: &Database,
        page: i64,
        request_url: &Url,
        now: DateTime<Utc>,
    ) -> Result<PageResult> {
        let total_records = database.count().await?;
        let pagination = Pagination::new(page, self.page_size, total_records);
        let records = database
            .find_page(pagination.skip, pagination.page_size)
            .await?;

        let data = records
            .iter()
            .map(|record| self.format_record(record, now))
            .collect();

        let next_page = pagination
            .has_next_page
            .then(|| page_link(request_url, pagination.page.saturating_add(1)));
        let previous_page = pagination
            .has_previous_page
            .then(|| page_link(request_url, pagination.page - 1));

        Ok(PageResult {
            data,
            total_pages: pagination.total_pages,
            current_page: pagination.page,
            has_next_page: pagination.has_next_page,
            has_previous_page: pagination.has_previous_page,
            total_records,
            next_page,
            previous_page,
        })
    }

    pub fn format_record(&self, record: &TransactionRecord, now: DateTime<Utc>) -> FormattedRecord {
        FormattedRecord {
            action: ActionLink {
                value: record.action.clone(),
                link: self.transaction_link(&record.transaction_hash),
            },
            amountnft: record.amount_nft.clone(),
            amounterc: record.amount_erc.clone(),
            sender: record.sender.clone(),
            block_time: relative_time(record.block_time, now),
        }
    }

    pub fn transaction_link(&self, transaction_hash: &str) -> String {
        format!("{}{}", self.explorer_tx_url, transaction_hash)
    }
}
