//! Read → multiply → write orchestration.

use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::codec;
use crate::config::PipelineConfig;
use crate::error::{Error, PipelineError, Stage};
use crate::multiply::{Multiplier, check_inner_dimensions};

const PARTIAL_SUFFIX: &str = ".partial";

/// Outcome of a successful pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineReport {
    pub rows: usize,
    pub cols: usize,
    pub threads: usize,
    /// Wall-clock time of the multiply stage alone.
    pub elapsed: Duration,
}

/// Runs the pipeline described by `config`.
pub async fn run(config: &PipelineConfig) -> Result<PipelineReport, PipelineError> {
    config.validate().map_err(PipelineError::at(Stage::Configure))?;
    let multiplier = match config.threads {
        Some(threads) => Multiplier::with_threads(threads),
        None => Ok(Multiplier::new()),
    }
    .map_err(PipelineError::at(Stage::Configure))?;

    run_with(config, &multiplier).await
}

/// Runs the pipeline on an existing [`Multiplier`], ignoring `config.threads`.
///
/// Both inputs are read concurrently. The first failing stage stops the run.
/// The result is written to a sibling `.partial` file and renamed into place
/// only once it is complete, so `config.output` is never left half written.
pub async fn run_with(
    config: &PipelineConfig,
    multiplier: &Multiplier,
) -> Result<PipelineReport, PipelineError> {
    let (a, b) = tokio::try_join!(
        async {
            codec::read_matrix(&config.a.path, config.a.rows, config.a.cols)
                .await
                .map_err(PipelineError::at(Stage::ReadA))
        },
        async {
            codec::read_matrix(&config.b.path, config.b.rows, config.b.cols)
                .await
                .map_err(PipelineError::at(Stage::ReadB))
        },
    )?;
    info!(a = ?a.shape(), b = ?b.shape(), "inputs loaded");
    check_inner_dimensions(&a, &b).map_err(PipelineError::at(Stage::Multiply))?;

    let started = Instant::now();
    let result = multiplier
        .multiply_async(Arc::new(a), Arc::new(b))
        .await
        .map_err(PipelineError::at(Stage::Multiply))?;
    let elapsed = started.elapsed();
    info!(
        rows = result.rows(),
        cols = result.cols(),
        elapsed_ms = elapsed.as_millis() as u64,
        "multiply finished"
    );

    write_atomically(&config.output, &result)
        .await
        .map_err(PipelineError::at(Stage::Write))?;
    info!(path = %config.output.display(), "result written");

    Ok(PipelineReport {
        rows: result.rows(),
        cols: result.cols(),
        threads: multiplier.threads(),
        elapsed,
    })
}

async fn write_atomically(output: &Path, matrix: &crate::Matrix) -> Result<(), Error> {
    let partial = partial_path(output);

    if let Err(e) = codec::write_matrix(&partial, matrix).await {
        discard(&partial).await;
        return Err(e);
    }
    if let Err(source) = tokio::fs::rename(&partial, output).await {
        discard(&partial).await;
        return Err(Error::Write {
            path: output.to_path_buf(),
            source,
        });
    }
    Ok(())
}

async fn discard(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => debug!(path = %path.display(), "removed partial result"),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), error = %e, "could not remove partial result"),
    }
}

fn partial_path(output: &Path) -> PathBuf {
    let mut name = output
        .file_name()
        .map(OsString::from)
        .unwrap_or_default();
    name.push(PARTIAL_SUFFIX);
    output.with_file_name(name)
}
