use std::io;

/// Everything that can stop a census before the recursion produces a result.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("parse error on line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("incidence matrix is empty ({rows}x{cols})")]
    EmptyGraph { rows: usize, cols: usize },

    #[error("entry ({row}, {col}) has multiplicity {multiplicity}; only simple graphs are supported")]
    ParallelEdge { row: usize, col: usize, multiplicity: u64 },

    #[error("entry ({row}, {col}) = {value} is not an edge multiplicity")]
    InvalidEntry { row: usize, col: usize, value: f64 },

    #[error("could not allocate a {rows}x{cols} matrix")]
    Allocation { rows: usize, cols: usize },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn parse(line: usize, message: impl Into<String>) -> Self {
        Error::Parse { line, message: message.into() }
    }
}
