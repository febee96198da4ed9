//! Storage for daily tick records.
//!
//! One table holds every symbol, keyed by `(symbol, ts)`. The table name comes
//! from configuration, so statements are built with sea-query against an
//! `Alias` rather than through a static entity.

use sea_orm::{ConnectionTrait, DatabaseConnection, DbErr, FromQueryResult, TransactionTrait};
use sea_orm_migration::prelude::*;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::{Config, MAX_SYMBOL_LEN};
use crate::models::tick::{PriceRecord, TickEntry, TickRow};

/// Rows per INSERT. Postgres allows 65535 bind parameters per statement and
/// each row binds 7.
pub const INSERT_BATCH_SIZE: usize = 5_000;

/// Chunk width used when the table becomes a TimescaleDB hypertable.
pub const HYPERTABLE_CHUNK_INTERVAL: &str = "7 days";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Db(#[from] DbErr),
    #[error("Failed to build statement: {0}")]
    Statement(#[from] sea_orm::sea_query::error::Error),
    #[error("Malformed event tags: {0}")]
    EventTags(#[from] serde_json::Error),
}

/// Which table and default symbol the service reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickSettings {
    pub table: String,
    pub symbol: String,
}

impl From<&Config> for TickSettings {
    fn from(config: &Config) -> Self {
        Self {
            table: config.ts_table.clone(),
            symbol: config.symbol.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplaceSummary {
    pub deleted: u64,
    pub inserted: u64,
    pub batches: usize,
}

#[derive(Iden)]
enum StockTicks {
    Symbol,
    Ts,
    ValidStart,
    PriceRaw,
    PriceAdjusted,
    Volume,
    EventTags,
}

/// Creates the tick table and its `(symbol, ts)` index if missing, then turns
/// it into a hypertable when TimescaleDB is installed. Safe to run repeatedly.
pub async fn ensure_tick_table(db: &DatabaseConnection, table: &str) -> Result<(), StoreError> {
    let manager = SchemaManager::new(db);

    manager.create_table(create_table_statement(table)).await?;
    manager.create_index(create_index_statement(table)).await?;

    db.execute_unprepared(&hypertable_sql(table)).await?;

    info!(table = %table, "Tick table ready");
    Ok(())
}

/// Deletes every row for `symbol` and inserts `records` in their given order,
/// all inside one transaction.
pub async fn replace_symbol_ticks(
    db: &DatabaseConnection,
    table: &str,
    symbol: &str,
    records: &[PriceRecord],
) -> Result<ReplaceSummary, StoreError> {
    let txn = db.begin().await?;
    let backend = txn.get_database_backend();

    let deleted = txn
        .execute(backend.build(&delete_symbol_statement(table, symbol)))
        .await?
        .rows_affected();
    info!(table = %table, symbol = %symbol, deleted, "Cleared existing ticks");

    let mut inserted = 0;
    let mut batches = 0;
    for chunk in records.chunks(INSERT_BATCH_SIZE) {
        let insert = insert_statement(table, chunk)?;
        inserted += txn.execute(backend.build(&insert)).await?.rows_affected();
        batches += 1;
        debug!(batch = batches, rows = chunk.len(), "Inserted tick batch");
    }

    txn.commit().await?;

    Ok(ReplaceSummary {
        deleted,
        inserted,
        batches,
    })
}

/// All rows for `symbol`, oldest first.
pub async fn fetch_ticks<C>(db: &C, table: &str, symbol: &str) -> Result<Vec<TickRow>, DbErr>
where
    C: ConnectionTrait,
{
    let stmt = db.get_database_backend().build(&select_ticks_statement(table, symbol));
    TickRow::find_by_statement(stmt).all(db).await
}

/// `fetch_ticks` projected to the API shape.
pub async fn fetch_tick_entries<C>(
    db: &C,
    table: &str,
    symbol: &str,
) -> Result<Vec<TickEntry>, StoreError>
where
    C: ConnectionTrait,
{
    let rows = fetch_ticks(db, table, symbol).await?;
    rows.into_iter()
        .map(|row| TickEntry::try_from(row).map_err(StoreError::from))
        .collect()
}

fn create_table_statement(table: &str) -> TableCreateStatement {
    Table::create()
        .table(Alias::new(table))
        .if_not_exists()
        .col(
            ColumnDef::new(StockTicks::Symbol)
                .string_len(MAX_SYMBOL_LEN as u32)
                .not_null(),
        )
        .col(
            ColumnDef::new(StockTicks::Ts)
                .timestamp_with_time_zone()
                .not_null(),
        )
        .col(
            ColumnDef::new(StockTicks::ValidStart)
                .timestamp_with_time_zone()
                .not_null(),
        )
        .col(ColumnDef::new(StockTicks::PriceRaw).double().not_null())
        .col(ColumnDef::new(StockTicks::PriceAdjusted).double().not_null())
        .col(ColumnDef::new(StockTicks::Volume).big_integer().not_null())
        .col(
            ColumnDef::new(StockTicks::EventTags)
                .json_binary() // jsonb
                .not_null()
                .default(Expr::cust("'[]'::jsonb")),
        )
        .primary_key(
            Index::create()
                .col(StockTicks::Symbol)
                .col(StockTicks::Ts),
        )
        .to_owned()
}

fn create_index_statement(table: &str) -> IndexCreateStatement {
    Index::create()
        .if_not_exists()
        .name(format!("idx_{}_symbol_ts", table))
        .table(Alias::new(table))
        .col(StockTicks::Symbol)
        .col(StockTicks::Ts)
        .to_owned()
}

fn hypertable_sql(table: &str) -> String {
    format!(
        r#"DO $$
BEGIN
    IF EXISTS (SELECT 1 FROM pg_extension WHERE extname = 'timescaledb') THEN
        PERFORM create_hypertable('{table}', 'ts',
            chunk_time_interval => INTERVAL '{interval}',
            if_not_exists => TRUE,
            migrate_data => TRUE);
    END IF;
END
$$;"#,
        table = table,
        interval = HYPERTABLE_CHUNK_INTERVAL,
    )
}

fn select_ticks_statement(table: &str, symbol: &str) -> SelectStatement {
    Query::select()
        .columns([
            StockTicks::Ts,
            StockTicks::ValidStart,
            StockTicks::PriceRaw,
            StockTicks::PriceAdjusted,
            StockTicks::Volume,
            StockTicks::EventTags,
        ])
        .from(Alias::new(table))
        .and_where(Expr::col(StockTicks::Symbol).eq(symbol))
        .and_where(Expr::col(StockTicks::Ts).is_not_null())
        .order_by(StockTicks::Ts, Order::Asc)
        .to_owned()
}

fn delete_symbol_statement(table: &str, symbol: &str) -> DeleteStatement {
    Query::delete()
        .from_table(Alias::new(table))
        .and_where(Expr::col(StockTicks::Symbol).eq(symbol))
        .to_owned()
}

fn insert_statement(table: &str, records: &[PriceRecord]) -> Result<InsertStatement, StoreError> {
    let mut insert = Query::insert();
    insert.into_table(Alias::new(table)).columns([
        StockTicks::Symbol,
        StockTicks::Ts,
        StockTicks::ValidStart,
        StockTicks::PriceRaw,
        StockTicks::PriceAdjusted,
        StockTicks::Volume,
        StockTicks::EventTags,
    ]);

    for record in records {
        let tags = serde_json::to_value(&record.event_tags)?;
        insert.values([
            record.symbol.clone().into(),
            record.ts.into(),
            record.valid_start.into(),
            record.price_raw.into(),
            record.price_adjusted.into(),
            record.volume.into(),
            tags.into(),
        ])?;
    }

    Ok(insert)
}
