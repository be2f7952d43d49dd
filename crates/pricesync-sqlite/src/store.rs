//! SQLite-backed [`PriceStore`].

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use pricesync_core::{
    Company, PriceBar, PriceStore, Result, Symbol, SyncError, normalize::DATE_FORMAT,
};
use rusqlite::{Connection, ErrorCode, OptionalExtension, Row, params, types::Type};
use tracing::{debug, instrument};

use crate::schema::{SCHEMA, SELECT_RANGE, UPSERT_PRICE};

/// Label recorded for sources created during ingestion.
const API_SOURCE_TYPE: &str = "api";

/// Price store over a single SQLite connection.
///
/// Every method takes the connection lock for its whole body and never awaits while
/// holding it, so a cancelled caller cannot leave a transaction open.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the database at `path` and ensure the schema exists.
    ///
    /// # Errors
    /// Returns [`SyncError::Storage`] if the file cannot be opened or the schema
    /// cannot be created.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path).map_err(|e| SyncError::storage("opening database", e))?;
        Self::with_connection(conn)
    }

    /// Create an in-memory store. Data is lost when the store is dropped.
    ///
    /// # Errors
    /// Returns [`SyncError::Storage`] if schema creation fails.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| SyncError::storage("opening database", e))?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.initialize_schema()?;
        Ok(store)
    }

    fn initialize_schema(&self) -> Result<()> {
        let conn = self.lock()?;
        conn.execute_batch(SCHEMA)
            .map_err(|e| SyncError::storage("creating schema", e))?;
        debug!("SQLite price store schema initialized");
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| SyncError::storage("acquiring connection", e))
    }
}

#[async_trait]
impl PriceStore for SqliteStore {
    #[instrument(skip(self, bars), fields(count = bars.len()))]
    async fn upsert(&self, bars: &[PriceBar]) -> Result<usize> {
        for bar in bars {
            bar.validate()?;
        }
        if bars.is_empty() {
            return Ok(0);
        }

        let now = Utc::now().to_rfc3339();
        let conn = self.lock()?;
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| SyncError::storage("beginning transaction", e))?;

        let mut companies: HashMap<&Symbol, i64> = HashMap::new();
        let mut sources: HashMap<&str, i64> = HashMap::new();
        {
            let mut stmt = tx
                .prepare_cached(UPSERT_PRICE)
                .map_err(|e| SyncError::storage("preparing price upsert", e))?;

            for bar in bars {
                let company_id = match companies.get(&bar.symbol) {
                    Some(id) => *id,
                    None => {
                        let id = resolve_company(&tx, &bar.symbol, &now)?;
                        companies.insert(&bar.symbol, id);
                        id
                    }
                };
                let source_id = match sources.get(bar.source.as_str()) {
                    Some(id) => *id,
                    None => {
                        let id = resolve_source(&tx, &bar.source, &now)?;
                        sources.insert(&bar.source, id);
                        id
                    }
                };

                stmt.execute(params![
                    company_id,
                    bar.symbol.as_str(),
                    bar.date.format(DATE_FORMAT).to_string(),
                    bar.open,
                    bar.high,
                    bar.low,
                    bar.close,
                    bar.adjusted_close,
                    bar.volume,
                    bar.dividend_amount,
                    bar.split_coefficient,
                    source_id,
                    now,
                ])
                .map_err(|e| {
                    SyncError::storage(format!("upserting {} on {}", bar.symbol, bar.date), e)
                })?;
            }
        }

        tx.commit()
            .map_err(|e| SyncError::storage("committing transaction", e))?;
        debug!(companies = companies.len(), "upserted price batch");
        Ok(bars.len())
    }

    #[instrument(skip(self), fields(symbol = %symbol))]
    async fn query_range(
        &self,
        symbol: &Symbol,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PriceBar>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare_cached(SELECT_RANGE)
            .map_err(|e| SyncError::storage("preparing range query", e))?;

        let rows = stmt
            .query_map(
                params![
                    symbol.as_str(),
                    start.format(DATE_FORMAT).to_string(),
                    end.format(DATE_FORMAT).to_string(),
                ],
                row_to_bar,
            )
            .map_err(|e| SyncError::storage("querying price range", e))?;

        let bars = rows
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| SyncError::storage("reading price rows", e))?;
        debug!(count = bars.len(), "loaded price range");
        Ok(bars)
    }

    async fn distinct_symbols(&self) -> Result<Vec<Symbol>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare_cached("SELECT DISTINCT symbol FROM stock_prices ORDER BY symbol ASC")
            .map_err(|e| SyncError::storage("preparing symbol query", e))?;
        let symbols = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .and_then(|rows| rows.collect::<rusqlite::Result<Vec<_>>>())
            .map_err(|e| SyncError::storage("listing symbols", e))?;
        Ok(symbols.into_iter().map(Symbol::from).collect())
    }

    async fn company(&self, symbol: &Symbol) -> Result<Option<Company>> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT company_id, symbol, name, is_active, created_at
             FROM companies WHERE symbol = ?1",
            params![symbol.as_str()],
            |row| {
                Ok(Company {
                    company_id: row.get(0)?,
                    symbol: Symbol::from(row.get::<_, String>(1)?),
                    name: row.get(2)?,
                    is_active: row.get(3)?,
                    created_at: timestamp_at(row, 4)?,
                })
            },
        )
        .optional()
        .map_err(|e| SyncError::storage("looking up company", e))
    }

    async fn ping(&self) -> Result<()> {
        let conn = self.lock()?;
        conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
            .map(|_| ())
            .map_err(|e| SyncError::storage("pinging database", e))
    }
}

/// Looks up the company for `symbol`, creating it with the symbol as placeholder name.
fn resolve_company(conn: &Connection, symbol: &Symbol, now: &str) -> Result<i64> {
    match find_company_id(conn, symbol)? {
        Some(id) => Ok(id),
        None => insert_company(conn, symbol, now),
    }
}

/// Inserts the company for `symbol`.
///
/// A uniqueness violation means another connection created it after our lookup;
/// the lookup is then repeated. Within one connection the store lock rules this out.
fn insert_company(conn: &Connection, symbol: &Symbol, now: &str) -> Result<i64> {
    match conn.execute(
        "INSERT INTO companies (symbol, name, is_active, created_at) VALUES (?1, ?1, 1, ?2)",
        params![symbol.as_str(), now],
    ) {
        Ok(_) => {
            debug!(symbol = %symbol, "created company");
            Ok(conn.last_insert_rowid())
        }
        Err(e) if is_unique_violation(&e) => find_company_id(conn, symbol)?
            .ok_or_else(|| SyncError::storage(format!("creating company {symbol}"), e)),
        Err(e) => Err(SyncError::storage(format!("creating company {symbol}"), e)),
    }
}

fn find_company_id(conn: &Connection, symbol: &Symbol) -> Result<Option<i64>> {
    conn.query_row(
        "SELECT company_id FROM companies WHERE symbol = ?1",
        params![symbol.as_str()],
        |row| row.get(0),
    )
    .optional()
    .map_err(|e| SyncError::storage(format!("looking up company {symbol}"), e))
}

fn resolve_source(conn: &Connection, name: &str, now: &str) -> Result<i64> {
    conn.execute(
        "INSERT INTO data_sources (source_name, source_type, is_active, created_at)
         VALUES (?1, ?2, 1, ?3)
         ON CONFLICT (source_name) DO NOTHING",
        params![name, API_SOURCE_TYPE, now],
    )
    .map_err(|e| SyncError::storage(format!("creating data source {name}"), e))?;

    conn.query_row(
        "SELECT source_id FROM data_sources WHERE source_name = ?1",
        params![name],
        |row| row.get(0),
    )
    .map_err(|e| SyncError::storage(format!("looking up data source {name}"), e))
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(err, rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation)
}

fn row_to_bar(row: &Row<'_>) -> rusqlite::Result<PriceBar> {
    let date: String = row.get(2)?;
    let date = NaiveDate::parse_from_str(&date, DATE_FORMAT)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(e)))?;

    Ok(PriceBar {
        company_id: row.get(0)?,
        symbol: Symbol::from(row.get::<_, String>(1)?),
        date,
        open: row.get(3)?,
        high: row.get(4)?,
        low: row.get(5)?,
        close: row.get(6)?,
        adjusted_close: row.get(7)?,
        volume: row.get(8)?,
        dividend_amount: row.get(9)?,
        split_coefficient: row.get(10)?,
        source: row.get(11)?,
        last_updated: timestamp_at(row, 12)?,
    })
}

fn timestamp_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}
