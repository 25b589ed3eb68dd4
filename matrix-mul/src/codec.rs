//! Plain-text matrix codec.
//!
//! One row per line, values separated by a single space and rendered with
//! exactly two decimal digits. The file carries no header, so the caller
//! supplies the dimensions when reading.
//!
//! ```text
//! 19.00 22.00
//! 43.00 50.00
//! ```

use std::io::ErrorKind;
use std::path::Path;

use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use tracing::debug;

use crate::Error;
use crate::matrix::{Matrix, check_dimensions};

const DELIMITER: char = ' ';

/// Reads a `rows`x`cols` matrix from `path`.
///
/// Exactly `rows` lines are consumed in order. Tokens past the first `cols`
/// on a line are ignored, as is anything after line `rows`.
pub async fn read_matrix(
    path: impl AsRef<Path>,
    rows: usize,
    cols: usize,
) -> Result<Matrix, Error> {
    let path = path.as_ref();
    check_dimensions(rows, cols)?;

    let file = File::open(path).await.map_err(|source| match source.kind() {
        ErrorKind::NotFound => Error::NotFound {
            path: path.to_path_buf(),
        },
        _ => Error::Read {
            path: path.to_path_buf(),
            source,
        },
    })?;
    debug!(path = %path.display(), rows, cols, "reading matrix");

    let mut lines = BufReader::new(file).lines();
    // Sized by the lines actually read, never by the declared shape.
    let mut data = Vec::new();

    for i in 0..rows {
        let line = lines
            .next_line()
            .await
            .map_err(|source| match source.kind() {
                ErrorKind::InvalidData => Error::Format {
                    path: path.to_path_buf(),
                    line: i + 1,
                    reason: "line is not valid UTF-8".to_string(),
                },
                _ => Error::Read {
                    path: path.to_path_buf(),
                    source,
                },
            })?
            .ok_or_else(|| Error::TruncatedInput {
                path: path.to_path_buf(),
                expected: rows,
                found: i,
            })?;

        parse_row(&line, cols, &mut data).map_err(|reason| Error::Format {
            path: path.to_path_buf(),
            line: i + 1,
            reason,
        })?;
    }

    Matrix::new(rows, cols, data)
}

/// Writes `matrix` to `path`, replacing any existing content.
///
/// A failed write leaves whatever was already written in place; the file
/// must not be trusted afterwards.
pub async fn write_matrix(path: impl AsRef<Path>, matrix: &Matrix) -> Result<(), Error> {
    let path = path.as_ref();
    let write_error = |source| Error::Write {
        path: path.to_path_buf(),
        source,
    };

    let file = File::create(path).await.map_err(write_error)?;
    debug!(path = %path.display(), rows = matrix.rows(), cols = matrix.cols(), "writing matrix");

    let mut writer = BufWriter::new(file);
    let mut line = String::new();
    for row in matrix.iter_rows() {
        encode_row(row, &mut line);
        writer.write_all(line.as_bytes()).await.map_err(write_error)?;
    }
    writer.flush().await.map_err(write_error)?;

    Ok(())
}

fn parse_row(line: &str, cols: usize, out: &mut Vec<f64>) -> Result<(), String> {
    let mut tokens = line.split(DELIMITER);
    for col in 0..cols {
        let Some(token) = tokens.next() else {
            return Err(format!("expected {cols} values, found {col}"));
        };
        let value = token
            .parse::<f64>()
            .map_err(|e| format!("invalid value {token:?} in column {}: {e}", col + 1))?;
        out.push(value);
    }
    Ok(())
}

/// Encodes one row into `line`, newline included. `line` is cleared first.
fn encode_row(row: &[f64], line: &mut String) {
    line.clear();
    for (j, value) in row.iter().enumerate() {
        if j > 0 {
            line.push(DELIMITER);
        }
        line.push_str(&format!("{value:.2}"));
    }
    line.push('\n');
}
