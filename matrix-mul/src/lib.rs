//! Parallel dense matrix multiplication over plain-text matrix files.
//!
//! `matrix-mul` reads two matrices from text files, multiplies them with the
//! output rows partitioned across a rayon thread pool, and writes the product
//! back as text. File I/O is asynchronous on tokio; the multiply stage runs
//! on the blocking pool and is the only timed stage.
//!
//! # File Format
//!
//! - One row per line, `\n` terminated
//! - Values separated by a single space
//! - Exactly two decimal digits per value (`23.47`)
//! - No header: dimensions are supplied by the caller
//!
//! # Example
//!
//! ```no_run
//! use matrix_mul::{PipelineConfig, pipeline};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // A is 2x3, B is 3x2.
//!     let config = PipelineConfig::new("a.txt", "b.txt", "result.txt", 2, 3, 2);
//!     let report = pipeline::run(&config).await?;
//!     println!("multiplied in {:?}", report.elapsed);
//!     Ok(())
//! }
//! ```

pub mod codec;
pub mod config;
mod error;
pub mod generate;
mod matrix;
pub mod multiply;
pub mod pipeline;

pub use config::{MatrixDescriptor, PipelineConfig};
pub use error::{Error, PipelineError, Stage};
pub use matrix::Matrix;
pub use multiply::Multiplier;
pub use pipeline::PipelineReport;
