//! Shared CSV <-> [`Table`] codec for the file-backed adapters.
//!
//! Layout convention: the first column holds the row key (symbol for
//! cross-sectional tables, period label for series), the remaining header
//! cells are the table's column names. Empty cells are null; cells that
//! parse as f64 are numeric; everything else is text. Numbers are written
//! with `Display`, whose shortest-round-trip formatting preserves exact
//! values across save/load.

use crate::domain::error::TsefilterError;
use crate::domain::table::{Table, Value};
use std::path::Path;

fn store_err(path: &Path, err: impl std::fmt::Display) -> TsefilterError {
    TsefilterError::Store {
        reason: format!("{}: {}", path.display(), err),
    }
}

fn parse_cell(raw: &str) -> Value {
    if raw.is_empty() {
        return Value::Null;
    }
    match raw.parse::<f64>() {
        Ok(n) => Value::Number(n),
        Err(_) => Value::Text(raw.to_string()),
    }
}

pub fn read_table(path: &Path) -> Result<Table, TsefilterError> {
    let mut rdr = csv::Reader::from_path(path).map_err(|e| store_err(path, e))?;
    let headers = rdr.headers().map_err(|e| store_err(path, e))?.clone();
    if headers.is_empty() {
        return Err(store_err(path, "missing header row"));
    }

    let columns: Vec<String> = headers.iter().skip(1).map(|h| h.to_string()).collect();
    let mut table = Table::new(columns);

    for result in rdr.records() {
        let record = result.map_err(|e| store_err(path, e))?;
        let key = record
            .get(0)
            .ok_or_else(|| store_err(path, "row without key column"))?
            .to_string();
        let values: Vec<Value> = record.iter().skip(1).map(parse_cell).collect();
        table.push_row(key, values)?;
    }

    Ok(table)
}

pub fn write_table(path: &Path, key_name: &str, table: &Table) -> Result<(), TsefilterError> {
    let mut wtr = csv::Writer::from_path(path).map_err(|e| store_err(path, e))?;

    let mut header = Vec::with_capacity(table.columns().len() + 1);
    header.push(key_name.to_string());
    header.extend(table.columns().iter().cloned());
    wtr.write_record(&header).map_err(|e| store_err(path, e))?;

    for (i, symbol) in table.symbols().iter().enumerate() {
        let mut record = Vec::with_capacity(header.len());
        record.push(symbol.clone());
        record.extend(table.row(i).iter().map(|v| v.to_string()));
        wtr.write_record(&record).map_err(|e| store_err(path, e))?;
    }

    wtr.flush().map_err(|e| store_err(path, e))?;
    Ok(())
}
