use thiserror::Error;

/// Broad class of a [`SieveError`], so the application layer can decide how
/// to present it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The caller asked for something the data or parameters cannot satisfy.
    Input,
    /// The operation is not valid in the current lifecycle state.
    State,
}

/// Errors raised by the filtering core.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SieveError {
    #[error("column '{0}' not found in dataset")]
    UnknownColumn(String),

    #[error("column '{column}' is not numeric: row {row} holds '{value}'")]
    NonNumericCell {
        column: String,
        row: usize,
        value: String,
    },

    #[error("threshold must be a positive finite number, got {0}")]
    InvalidThreshold(f64),

    #[error("window must hold at least one sample, got {0}")]
    InvalidWindow(usize),

    #[error("column '{column}' has {found} rows but the dataset has {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        found: usize,
    },

    #[error("duplicate column name '{0}'")]
    DuplicateColumn(String),

    #[error("no column selected for filtering")]
    NoColumnSelected,

    #[error("nothing to save: no filter result is pending")]
    NothingToCommit,

    #[error("no dataset loaded")]
    NotLoaded,
}

impl SieveError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SieveError::NothingToCommit | SieveError::NotLoaded => ErrorKind::State,
            _ => ErrorKind::Input,
        }
    }
}

pub type Result<T> = std::result::Result<T, SieveError>;
