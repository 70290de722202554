//! CSV loading for the transactions file.
//!
//! Reads `coffee_shop_clean.csv` (or any file with the same columns) into a
//! [`TransactionTable`], decoding both timestamp columns and deriving the
//! `month` and `hour` columns once, at load time.

use std::io::Read;
use std::path::Path;
use std::time::Instant;

use sales_core::error::{LoadError, Result};
use sales_core::models::{Transaction, TransactionTable};
use sales_core::time_utils::{hour_of, month_key, parse_date, parse_datetime};
use serde::Deserialize;
use tracing::{debug, info};

/// One record as it appears in the file, before timestamp decoding.
///
/// Columns not named here are ignored.
#[derive(Debug, Deserialize)]
struct RawRecord {
    transaction_id: u64,
    store_location: String,
    product_category: String,
    product_type: String,
    product_detail: String,
    transaction_date: String,
    transaction_datetime: String,
    total_price: f64,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Load the transactions file at `path`.
///
/// Fails on a missing or unreadable file, a malformed record, or a timestamp
/// that does not parse. There is no partial result.
pub fn load_transactions(path: &Path) -> Result<TransactionTable> {
    let started = Instant::now();
    let file = std::fs::File::open(path).map_err(|source| LoadError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;

    let table = read_transactions(std::io::BufReader::new(file), path)?;

    info!(
        rows = table.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "loaded {}",
        path.display()
    );
    Ok(table)
}

/// Read transactions from any reader; `source` is recorded on the table.
pub fn read_transactions<R: Read>(reader: R, source: &Path) -> Result<TransactionTable> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    debug!(columns = headers.len(), "header read from {}", source.display());

    let mut rows = Vec::new();
    for result in csv_reader.records() {
        let record = result?;
        // Blank lines are skipped by the csv reader itself; a row of empty
        // fields (",,,") is not, and is dropped here.
        if record.iter().all(str::is_empty) {
            continue;
        }
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        let raw: RawRecord = record.deserialize(Some(&headers))?;
        rows.push(to_transaction(raw, line)?);
    }

    debug!(rows = rows.len(), "parsed records from {}", source.display());
    Ok(TransactionTable::new(source, rows))
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Decode timestamps and compute the derived columns.
fn to_transaction(raw: RawRecord, line: u64) -> Result<Transaction> {
    let transaction_date =
        parse_date(&raw.transaction_date).ok_or_else(|| LoadError::TimestampParse {
            line,
            column: "transaction_date",
            value: raw.transaction_date.clone(),
        })?;
    let transaction_datetime =
        parse_datetime(&raw.transaction_datetime).ok_or_else(|| LoadError::TimestampParse {
            line,
            column: "transaction_datetime",
            value: raw.transaction_datetime.clone(),
        })?;

    Ok(Transaction {
        transaction_id: raw.transaction_id,
        store_location: raw.store_location,
        product_category: raw.product_category,
        product_type: raw.product_type,
        product_detail: raw.product_detail,
        month: month_key(transaction_date),
        hour: hour_of(transaction_datetime),
        transaction_date,
        transaction_datetime,
        total_price: raw.total_price,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
