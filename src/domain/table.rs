//! Symbol-keyed tables of named, typed columns.
//!
//! A [`Table`] is one table kind's worth of data: one row per instrument,
//! every row sharing the same ordered column set. Cells are [`Value`]s —
//! numeric, text, or null. Tables are built once and replaced wholesale on
//! refresh; filtering produces a new table, never an in-place mutation.

use crate::domain::error::TsefilterError;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    Text(String),
    Null,
}

impl Value {
    /// Numeric view of the cell. Text and null cells have none, which is
    /// what makes comparisons on them evaluate to false downstream.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Text(_) | Value::Null => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{}", n),
            Value::Text(s) => write!(f, "{}", s),
            Value::Null => Ok(()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Table {
    columns: Vec<String>,
    col_index: HashMap<String, usize>,
    symbols: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        let col_index = columns
            .iter()
            .enumerate()
            .map(|(i, c)| (c.clone(), i))
            .collect();
        Self {
            columns,
            col_index,
            symbols: Vec::new(),
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, symbol: String, values: Vec<Value>) -> Result<(), TsefilterError> {
        if values.len() != self.columns.len() {
            return Err(TsefilterError::RowShape {
                symbol,
                got: values.len(),
                expected: self.columns.len(),
            });
        }
        if self.symbols.contains(&symbol) {
            return Err(TsefilterError::DuplicateSymbol { symbol });
        }
        self.symbols.push(symbol);
        self.rows.push(values);
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn column_position(&self, name: &str) -> Option<usize> {
        self.col_index.get(name).copied()
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, index: usize) -> &[Value] {
        &self.rows[index]
    }

    /// Cell lookup by row index and column name. `None` if the column does
    /// not exist; a present-but-null cell is `Some(&Value::Null)`.
    pub fn value(&self, row: usize, column: &str) -> Option<&Value> {
        let col = self.column_position(column)?;
        self.rows.get(row).map(|r| &r[col])
    }

    /// New table with the same columns and the rows where `mask` is true.
    pub fn select(&self, mask: &[bool]) -> Table {
        let mut out = self.empty_like();
        for (i, keep) in mask.iter().enumerate() {
            if *keep {
                out.symbols.push(self.symbols[i].clone());
                out.rows.push(self.rows[i].clone());
            }
        }
        out
    }

    /// Empty table with the same column shape.
    pub fn empty_like(&self) -> Table {
        Table::new(self.columns.clone())
    }
}
