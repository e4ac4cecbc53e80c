//! Condition AST and the validated [`Condition`] value type.
//!
//! A condition is a small boolean expression over schema columns:
//! comparisons chained by whole-word `and`/`or`. The chain is deliberately
//! flat — `a and b or c` folds left to right over row masks, with no
//! operator precedence beyond that order. The AST here is what the parser
//! produces and the evaluator walks; raw text is never executed.

use crate::domain::condition_eval;
use crate::domain::condition_parser;
use crate::domain::error::TsefilterError;
use crate::domain::schema::{Schema, TableKind};
use std::collections::BTreeSet;
use std::path::Path;

#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Column(String),
    Number(f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub left: Operand,
    pub op: CmpOp,
    pub right: Operand,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connector {
    And,
    Or,
}

/// A flat comparison chain: the first comparison plus connector-joined
/// followers, evaluated strictly left to right.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub first: Comparison,
    pub rest: Vec<(Connector, Comparison)>,
}

impl Predicate {
    pub fn comparisons(&self) -> impl Iterator<Item = &Comparison> {
        std::iter::once(&self.first).chain(self.rest.iter().map(|(_, c)| c))
    }
}

/// A validated, schema-bound condition.
///
/// Construction normalizes the text, parses it against the schema, and
/// dry-runs the compiled predicate on the schema's validation table. A
/// `Condition` that exists is therefore guaranteed compilable and
/// schema-safe for its kind; there is no partially-valid state.
#[derive(Debug, Clone)]
pub struct Condition {
    text: String,
    kind: TableKind,
    predicate: Predicate,
}

impl Condition {
    pub fn new(raw_text: &str, schema: &Schema) -> Result<Self, TsefilterError> {
        let text = raw_text.trim().to_lowercase();
        let predicate = condition_parser::parse(&text, schema)?;
        let condition = Self {
            text,
            kind: schema.kind(),
            predicate,
        };
        condition_eval::apply(&schema.validation_table(), &condition).map_err(|e| {
            TsefilterError::ConditionInvalid {
                reason: e.to_string(),
            }
        })?;
        Ok(condition)
    }

    pub fn from_file<P: AsRef<Path>>(path: P, schema: &Schema) -> Result<Self, TsefilterError> {
        let raw = std::fs::read_to_string(path)?;
        Self::new(&raw, schema)
    }

    /// Persist the normalized text; loading it back yields a condition with
    /// identical behavior.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), TsefilterError> {
        std::fs::write(path, &self.text)?;
        Ok(())
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn kind(&self) -> TableKind {
        self.kind
    }

    pub fn predicate(&self) -> &Predicate {
        &self.predicate
    }

    /// Every column the predicate reads, deduplicated.
    pub fn referenced_columns(&self) -> BTreeSet<&str> {
        let mut cols = BTreeSet::new();
        for cmp in self.predicate.comparisons() {
            for operand in [&cmp.left, &cmp.right] {
                if let Operand::Column(name) = operand {
                    cols.insert(name.as_str());
                }
            }
        }
        cols
    }
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.text)
    }
}
