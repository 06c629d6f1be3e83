//! Error types for loading grids and word lists and for rendering fills.

use thiserror::Error;

use crate::grid::Variable;

/// Problems with a grid structure, detected while building a `Grid`.
#[derive(Debug, Error)]
pub enum GridError {
    #[error("Grid must have at least one row")]
    Empty,

    /// Rows of a rectangular grid must all have the same number of cells.
    #[error("Row {row} has {found} cells, but the first row has {expected}")]
    MalformedRow {
        row: usize,
        expected: usize,
        found: usize,
    },

    /// Prefilled letters must cover exactly the rows of the structure.
    #[error("Fill has {found} rows, but the structure has {expected}")]
    FillHeight { expected: usize, found: usize },

    #[error("Can’t read grid file “{path}”: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Problems with an individual word list source. These are collected rather than returned, so one
/// bad line doesn't prevent the rest of the list from loading.
#[derive(Debug, Clone, Error)]
pub enum WordListError {
    #[error("Can’t read file: “{0}”")]
    InvalidPath(String),

    #[error("Word list contains invalid word: “{0}”")]
    InvalidWord(String),
}

/// Problems turning an assignment into letters.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Only a complete assignment can be rendered.
    #[error("Assignment is incomplete; {} slot(s) have no word", unassigned.len())]
    IncompleteAssignment { unassigned: Vec<Variable> },

    #[error("Word “{word}” doesn’t fit slot {variable}")]
    WordLengthMismatch { variable: Variable, word: String },
}
