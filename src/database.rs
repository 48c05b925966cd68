use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use std::str::FromStr;

use crate::models::TransactionRecord;

const SELECT_COLUMNS: &str = r#"id, action, amount_erc, amount_nft, block_time, block_number, price, sender, "to", transaction_hash, dml"#;

// 11 bound columns per row keeps a chunk well under SQLite's variable limit.
const INSERT_CHUNK_ROWS: usize = 500;

/// A handle on the transaction store, opened for one logical operation and
/// closed when that operation is done.
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub async fn connect(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("invalid database url {}", database_url))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .with_context(|| format!("failed to connect to {}", database_url))?;

        let db = Self { pool };
        db.create_tables().await?;
        Ok(db)
    }

    async fn create_tables(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS transactions (
                id TEXT PRIMARY KEY NOT NULL,
                action TEXT NOT NULL,
                amount_erc TEXT NOT NULL,
                amount_nft TEXT NOT NULL,
                block_time INTEGER NOT NULL,
                block_number TEXT NOT NULL,
                price TEXT NOT NULL,
                sender TEXT NOT NULL,
                "to" TEXT NOT NULL,
                transaction_hash TEXT NOT NULL,
                dml TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_block_time ON transactions(block_time)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<TransactionRecord>> {
        let query = format!("SELECT {} FROM transactions WHERE id = ?", SELECT_COLUMNS);
        let record = sqlx::query_as::<_, TransactionRecord>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(record)
    }

    pub async fn count(&self) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM transactions")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Most recent first; equal block times come back in insertion order.
    pub async fn find_page(&self, skip: i64, limit: i64) -> Result<Vec<TransactionRecord>> {
        let query = format!(
            "SELECT {} FROM transactions ORDER BY block_time DESC, rowid ASC LIMIT ? OFFSET ?",
            SELECT_COLUMNS
        );
        let records = sqlx::query_as::<_, TransactionRecord>(&query)
            .bind(limit)
            .bind(skip)
            .fetch_all(&self.pool)
            .await?;

        Ok(records)
    }

    /// Writes the whole batch in one transaction: either every row lands or
    /// none does.
    pub async fn insert_many(&self, records: &[TransactionRecord]) -> Result<u64> {
        let mut tx = self.pool.begin().await?;
        let mut inserted = 0;

        for chunk in records.chunks(INSERT_CHUNK_ROWS) {
            let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
                "INSERT INTO transactions ({}) ",
                SELECT_COLUMNS
            ));
            builder.push_values(chunk, |mut row, record| {
                row.push_bind(record.id.clone())
                    .push_bind(record.action.clone())
                    .push_bind(record.amount_erc.clone())
                    .push_bind(record.amount_nft.clone())
                    .push_bind(record.block_time)
                    .push_bind(record.block_number.clone())
                    .push_bind(record.price.clone())
                    .push_bind(record.sender.clone())
                    .push_bind(record.to.clone())
                    .push_bind(record.transaction_hash.clone())
                    .push_bind(record.dml.clone());
            });

            inserted += builder.build().execute(&mut *tx).await?.rows_affected();
        }

        tx.commit().await?;
        Ok(inserted)
    }

    pub async fn close(self) {
        self.pool.close().await;
    }
}
