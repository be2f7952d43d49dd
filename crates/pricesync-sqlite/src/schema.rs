//! DDL for the price store. Every statement is idempotent.

pub(crate) const SCHEMA: &str = "
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS companies (
    company_id INTEGER PRIMARY KEY AUTOINCREMENT,
    symbol TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL,
    is_active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS data_sources (
    source_id INTEGER PRIMARY KEY AUTOINCREMENT,
    source_name TEXT NOT NULL UNIQUE,
    source_type TEXT NOT NULL,
    base_url TEXT,
    is_active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS stock_prices (
    price_id INTEGER PRIMARY KEY AUTOINCREMENT,
    company_id INTEGER NOT NULL REFERENCES companies(company_id),
    symbol TEXT NOT NULL,
    date TEXT NOT NULL,
    open_price REAL NOT NULL,
    high_price REAL NOT NULL,
    low_price REAL NOT NULL,
    close_price REAL NOT NULL,
    adjusted_close REAL NOT NULL,
    volume REAL NOT NULL,
    dividend_amount REAL NOT NULL DEFAULT 0,
    split_coefficient REAL NOT NULL DEFAULT 1,
    source_id INTEGER NOT NULL REFERENCES data_sources(source_id),
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    UNIQUE (company_id, date, source_id)
);

CREATE INDEX IF NOT EXISTS idx_stock_prices_symbol_date
    ON stock_prices(symbol, date);

CREATE INDEX IF NOT EXISTS idx_stock_prices_company_date
    ON stock_prices(company_id, date);
";

pub(crate) const UPSERT_PRICE: &str = "
INSERT INTO stock_prices
    (company_id, symbol, date, open_price, high_price, low_price, close_price,
     adjusted_close, volume, dividend_amount, split_coefficient, source_id,
     created_at, updated_at)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?13)
ON CONFLICT (company_id, date, source_id) DO UPDATE SET
    open_price = excluded.open_price,
    high_price = excluded.high_price,
    low_price = excluded.low_price,
    close_price = excluded.close_price,
    adjusted_close = excluded.adjusted_close,
    volume = excluded.volume,
    dividend_amount = excluded.dividend_amount,
    split_coefficient = excluded.split_coefficient,
    updated_at = excluded.updated_at
";

pub(crate) const SELECT_RANGE: &str = "
SELECT sp.company_id, c.symbol, sp.date, sp.open_price, sp.high_price, sp.low_price,
       sp.close_price, sp.adjusted_close, sp.volume, sp.dividend_amount,
       sp.split_coefficient, ds.source_name, sp.updated_at
FROM stock_prices sp
JOIN companies c ON c.company_id = sp.company_id
JOIN data_sources ds ON ds.source_id = sp.source_id
WHERE c.symbol = ?1 AND sp.date >= ?2 AND sp.date <= ?3
ORDER BY sp.date DESC, ds.source_name ASC
";
