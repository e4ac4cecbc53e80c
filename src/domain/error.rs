//! Domain error types.

/// A parse error with position information for condition parsing.
#[derive(Debug, Clone, thiserror::Error)]
#[error("parse error at position {position}: {message}")]
pub struct ParseError {
    pub message: String,
    pub position: usize,
}

impl ParseError {
    /// Format the error with a caret pointing at the error position in the input.
    pub fn display_with_context(&self, input: &str) -> String {
        let caret = " ".repeat(self.position) + "^";
        format!(
            "{input}\n{caret}\n{err}",
            input = input,
            caret = caret,
            err = self
        )
    }
}

/// Top-level error type for tsefilter.
#[derive(Debug, thiserror::Error)]
pub enum TsefilterError {
    #[error(transparent)]
    ConditionParse(#[from] ParseError),

    #[error("invalid condition: {reason}")]
    ConditionInvalid { reason: String },

    #[error("no condition bound to this session")]
    ConditionMissing,

    #[error("column '{column}' not present in table")]
    MissingColumn { column: String },

    #[error("duplicate symbol in table: {symbol}")]
    DuplicateSymbol { symbol: String },

    #[error("row for {symbol} has {got} values, table has {expected} columns")]
    RowShape {
        symbol: String,
        got: usize,
        expected: usize,
    },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("summary file {path} not found; run the download step first")]
    SummaryMissing { path: String },

    #[error("store error: {reason}")]
    Store { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&TsefilterError> for std::process::ExitCode {
    fn from(err: &TsefilterError) -> Self {
        let code: u8 = match err {
            TsefilterError::Io(_) => 1,
            TsefilterError::ConfigParse { .. } | TsefilterError::ConfigInvalid { .. } => 2,
            TsefilterError::Store { .. } | TsefilterError::SummaryMissing { .. } => 3,
            TsefilterError::ConditionParse(_)
            | TsefilterError::ConditionInvalid { .. }
            | TsefilterError::ConditionMissing => 4,
            TsefilterError::MissingColumn { .. }
            | TsefilterError::DuplicateSymbol { .. }
            | TsefilterError::RowShape { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
