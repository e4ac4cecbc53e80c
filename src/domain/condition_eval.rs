//! Predicate interpreter.
//!
//! Walks a compiled [`Condition`] over a [`Table`], producing the subset of
//! rows that satisfy it.
//!
//! # Evaluation semantics
//!
//! - A comparison is true only when both operands resolve to numbers and
//!   the operator holds; null and text cells make it false, never an
//!   error. NaN cells follow IEEE comparison semantics: every ordering
//!   operator and `==` is false, `!=` is true.
//! - The AND/OR chain folds row masks strictly left to right:
//!   `a and b or c` is `((a AND b) OR c)`.
//! - A referenced column missing from the table is a hard error — that is
//!   a condition compiled for the other table kind, not a data problem.

use crate::domain::condition::{CmpOp, Comparison, Condition, Connector, Operand};
use crate::domain::error::TsefilterError;
use crate::domain::table::Table;

/// Apply a compiled condition to a table, returning the matching rows as a
/// new table with the same column shape.
pub fn apply(table: &Table, condition: &Condition) -> Result<Table, TsefilterError> {
    for column in condition.referenced_columns() {
        if table.column_position(column).is_none() {
            return Err(TsefilterError::MissingColumn {
                column: column.to_string(),
            });
        }
    }
    if table.is_empty() {
        return Ok(table.empty_like());
    }

    let predicate = condition.predicate();
    let mut mask = comparison_mask(table, &predicate.first);
    for (connector, comparison) in &predicate.rest {
        let next = comparison_mask(table, comparison);
        for (m, n) in mask.iter_mut().zip(next) {
            *m = match connector {
                Connector::And => *m && n,
                Connector::Or => *m || n,
            };
        }
    }

    Ok(table.select(&mask))
}

fn comparison_mask(table: &Table, comparison: &Comparison) -> Vec<bool> {
    (0..table.len())
        .map(|row| {
            let left = resolve(table, row, &comparison.left);
            let right = resolve(table, row, &comparison.right);
            match (left, right) {
                (Some(l), Some(r)) => compare(l, comparison.op, r),
                _ => false,
            }
        })
        .collect()
}

fn resolve(table: &Table, row: usize, operand: &Operand) -> Option<f64> {
    match operand {
        Operand::Number(n) => Some(*n),
        // Column presence was checked up front; a null or text cell simply
        // has no numeric value.
        Operand::Column(name) => table.value(row, name).and_then(|v| v.as_number()),
    }
}

fn compare(left: f64, op: CmpOp, right: f64) -> bool {
    match op {
        CmpOp::Lt => left < right,
        CmpOp::Le => left <= right,
        CmpOp::Gt => left > right,
        CmpOp::Ge => left >= right,
        CmpOp::Eq => left == right,
        CmpOp::Ne => left != right,
    }
}
