//! Pipeline configuration.

use std::path::PathBuf;

use crate::Error;

/// Location and out-of-band dimensions of a matrix file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatrixDescriptor {
    pub path: PathBuf,
    pub rows: usize,
    pub cols: usize,
}

impl MatrixDescriptor {
    pub fn new(path: impl Into<PathBuf>, rows: usize, cols: usize) -> Self {
        Self {
            path: path.into(),
            rows,
            cols,
        }
    }
}

/// Everything one pipeline run needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    pub a: MatrixDescriptor,
    pub b: MatrixDescriptor,
    pub output: PathBuf,
    /// Worker count for the multiply stage. `None` uses every available core.
    pub threads: Option<usize>,
}

impl PipelineConfig {
    /// Configuration for `A (m×n) × B (n×p)`.
    pub fn new(
        a: impl Into<PathBuf>,
        b: impl Into<PathBuf>,
        output: impl Into<PathBuf>,
        m: usize,
        n: usize,
        p: usize,
    ) -> Self {
        Self {
            a: MatrixDescriptor::new(a, m, n),
            b: MatrixDescriptor::new(b, n, p),
            output: output.into(),
            threads: None,
        }
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads);
        self
    }

    /// Checks the declared shapes before any file is touched.
    pub fn validate(&self) -> Result<(), Error> {
        for d in [&self.a, &self.b] {
            if d.rows == 0 || d.cols == 0 {
                return Err(Error::InvalidDimensions {
                    rows: d.rows,
                    cols: d.cols,
                });
            }
        }
        if self.a.cols != self.b.rows {
            return Err(Error::DimensionMismatch(
                self.a.rows,
                self.a.cols,
                self.b.rows,
                self.b.cols,
            ));
        }
        if self.threads == Some(0) {
            return Err(Error::Config("worker count must be positive".to_string()));
        }
        Ok(())
    }
}
