//! Table reseeding.

use std::path::Path;
use std::time::{Duration, Instant};

use sqlx::{AnyConnection, AnyPool};
use thiserror::Error;
use tracing::{debug, info};

use crate::columns::ColumnSpec;
use crate::source::{CsvSource, PrepareError, PreparedData, Row};

/// Upper bound on bound parameters per statement. SQLite allows 32766 and
/// PostgreSQL 65535.
const MAX_BIND_PARAMS: usize = 30_000;

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Prepare(#[from] PrepareError),
    #[error("Row {row} has no value for column `{column}`")]
    MissingValue { row: usize, column: String },
    #[error("No columns to insert")]
    NoColumns,
}

/// Outcome of a seed operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedResult {
    /// Rows written to the table.
    pub rows: u64,
    pub elapsed: Duration,
}

/// Replaces the contents of a table with prepared CSV rows.
pub struct Seeder {
    pool: AnyPool,
    table: String,
    batch_size: usize,
}

impl Seeder {
    /// Creates a seeder that writes to `table`.
    pub fn new(pool: AnyPool, table: impl Into<String>) -> Self {
        Self {
            pool,
            table: table.into(),
            batch_size: 500,
        }
    }

    /// Sets the maximum number of rows per INSERT statement.
    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size.max(1);
        self
    }

    /// The table this seeder writes to.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Deletes every row from `table`, returning how many were removed.
    ///
    /// **WARNING**: there is no undo.
    pub async fn delete(&self, table: &str) -> Result<u64, SeedError> {
        let mut conn = self.pool.acquire().await?;
        let deleted = delete_all(&mut conn, table).await?;

        info!("Deleted {} rows from {}", deleted, table);
        Ok(deleted)
    }

    /// Reads `source` and keeps only the requested columns.
    ///
    /// Fails with [`PrepareError::HeaderDoesNotExist`] before any data line is
    /// parsed if a requested column is missing from the header.
    pub fn prepare(
        &self,
        source: impl AsRef<Path>,
        columns: &ColumnSpec,
    ) -> Result<PreparedData, SeedError> {
        Ok(CsvSource::load_file(source, columns)?)
    }

    /// Inserts `rows` into the configured table.
    ///
    /// All batches share one transaction, so either every row is written or
    /// none are. An empty `columns` list means the keys of the first row.
    pub async fn seed(&self, columns: &[String], rows: &[Row]) -> Result<SeedResult, SeedError> {
        let start = Instant::now();
        let mut tx = self.pool.begin().await?;

        let written = self.insert_rows(&mut tx, columns, rows).await?;
        tx.commit().await?;

        Ok(SeedResult {
            rows: written,
            elapsed: start.elapsed(),
        })
    }

    /// Empties the table and inserts `data` in a single transaction.
    ///
    /// If an insert fails the delete is rolled back and the table keeps its
    /// previous rows.
    pub async fn replace(&self, data: &PreparedData) -> Result<SeedResult, SeedError> {
        let start = Instant::now();
        let mut tx = self.pool.begin().await?;

        info!("Deleting table...");
        let deleted = delete_all(&mut tx, &self.table).await?;
        debug!("Deleted {} rows from {}", deleted, self.table);

        info!("Seeding database...");
        let written = self.insert_rows(&mut tx, &data.columns, &data.rows).await?;
        tx.commit().await?;

        Ok(SeedResult {
            rows: written,
            elapsed: start.elapsed(),
        })
    }

    /// Prepares `source` and replaces the table contents with it.
    ///
    /// Header validation happens before the table is touched.
    pub async fn reseed(
        &self,
        source: impl AsRef<Path>,
        columns: &ColumnSpec,
    ) -> Result<SeedResult, SeedError> {
        let start = Instant::now();

        info!("Preparing data...");
        let data = self.prepare(source, columns)?;
        let result = self.replace(&data).await?;

        Ok(SeedResult {
            rows: result.rows,
            elapsed: start.elapsed(),
        })
    }

    /// Returns a reference to the pool for advanced usage.
    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }

    async fn insert_rows(
        &self,
        conn: &mut AnyConnection,
        columns: &[String],
        rows: &[Row],
    ) -> Result<u64, SeedError> {
        if rows.is_empty() {
            info!("No rows to seed");
            return Ok(0);
        }

        let columns: Vec<String> = if columns.is_empty() {
            rows[0].keys().cloned().collect()
        } else {
            columns.to_vec()
        };
        if columns.is_empty() {
            return Err(SeedError::NoColumns);
        }

        info!("Seeding {} rows into {}...", rows.len(), self.table);

        let per_batch = rows_per_batch(self.batch_size, columns.len());
        let mut written = 0;

        for (i, chunk) in rows.chunks(per_batch).enumerate() {
            let offset = i * per_batch;
            written += insert_batch(conn, &self.table, &columns, chunk, offset).await?;
            debug!("  Seeded {}/{} rows", offset + chunk.len(), rows.len());
        }

        info!("Seeded {} rows", written);
        Ok(written)
    }
}

async fn delete_all(conn: &mut AnyConnection, table: &str) -> Result<u64, SeedError> {
    let sql = format!("DELETE FROM {}", quote_identifier(table));
    let result = sqlx::query(&sql).execute(&mut *conn).await?;
    Ok(result.rows_affected())
}

async fn insert_batch(
    conn: &mut AnyConnection,
    table: &str,
    columns: &[String],
    rows: &[Row],
    offset: usize,
) -> Result<u64, SeedError> {
    let sql = insert_statement(table, columns, rows.len());
    let mut query = sqlx::query(&sql);

    for (i, row) in rows.iter().enumerate() {
        for column in columns {
            let value = row.get(column).ok_or_else(|| SeedError::MissingValue {
                row: offset + i,
                column: column.clone(),
            })?;
            query = query.bind(value.as_str());
        }
    }

    let result = query.execute(&mut *conn).await?;
    Ok(result.rows_affected())
}

/// Quotes a table or column name. Dotted names quote each part.
fn quote_identifier(name: &str) -> String {
    name.split('.')
        .map(|part| format!("\"{}\"", part.replace('"', "\"\"")))
        .collect::<Vec<_>>()
        .join(".")
}

/// Builds a multi-row INSERT with `$n` placeholders.
fn insert_statement(table: &str, columns: &[String], row_count: usize) -> String {
    let column_list = columns
        .iter()
        .map(|c| quote_identifier(c))
        .collect::<Vec<_>>()
        .join(", ");

    let width = columns.len();
    let values = (0..row_count)
        .map(|r| {
            let placeholders = (1..=width)
                .map(|c| format!("${}", r * width + c))
                .collect::<Vec<_>>()
                .join(", ");
            format!("({placeholders})")
        })
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "INSERT INTO {} ({}) VALUES {}",
        quote_identifier(table),
        column_list,
        values
    )
}

fn rows_per_batch(batch_size: usize, width: usize) -> usize {
    let by_params = MAX_BIND_PARAMS / width.max(1);
    batch_size.min(by_params).max(1)
}
