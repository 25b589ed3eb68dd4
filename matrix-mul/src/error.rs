//! Error types for matrix-mul operations.

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("matrix file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("format error in {} at line {line}: {reason}", path.display())]
    Format {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("truncated input in {}: expected {expected} rows, found {found}", path.display())]
    TruncatedInput {
        path: PathBuf,
        expected: usize,
        found: usize,
    },

    #[error("matrix dimension mismatch: A is {0}x{1}, B is {2}x{3}")]
    DimensionMismatch(usize, usize, usize, usize),

    #[error("invalid matrix dimensions {rows}x{cols}")]
    InvalidDimensions { rows: usize, cols: usize },

    #[error("cannot allocate a {rows}x{cols} result matrix")]
    Allocation { rows: usize, cols: usize },

    #[error("worker failed: {0}")]
    Worker(String),

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Pipeline stage in which a failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Configure,
    ReadA,
    ReadB,
    Multiply,
    Write,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Configure => "configure",
            Stage::ReadA => "read A",
            Stage::ReadB => "read B",
            Stage::Multiply => "multiply",
            Stage::Write => "write result",
        };
        f.write_str(name)
    }
}

/// An [`Error`] tagged with the pipeline stage that produced it.
#[derive(Debug, Error)]
#[error("stage '{stage}' failed: {source}")]
pub struct PipelineError {
    pub stage: Stage,
    #[source]
    pub source: Error,
}

impl PipelineError {
    pub fn new(stage: Stage, source: Error) -> Self {
        Self { stage, source }
    }

    /// Returns a closure that tags an error with `stage`, for use with `map_err`.
    pub fn at(stage: Stage) -> impl FnOnce(Error) -> Self {
        move |source| Self::new(stage, source)
    }
}
