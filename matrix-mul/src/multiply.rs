//! Row-partitioned parallel matrix multiplication.
//!
//! The result buffer is split into disjoint row slices before any work
//! starts, and each slice is handed to exactly one rayon task. Operands are
//! shared read-only, so no locking is involved.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::debug;

use crate::Error;
use crate::matrix::Matrix;

/// Parallel multiplier bound to a rayon thread pool.
///
/// By default the global pool is used, which rayon sizes to the host's
/// hardware concurrency.
#[derive(Clone, Default)]
pub struct Multiplier {
    pool: Option<Arc<ThreadPool>>,
}

impl Multiplier {
    /// Creates a multiplier on the global rayon pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a multiplier with a dedicated pool of `threads` workers.
    pub fn with_threads(threads: usize) -> Result<Self, Error> {
        if threads == 0 {
            return Err(Error::Config("worker count must be positive".to_string()));
        }
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("matrix-mul-{i}"))
            .build()?;
        Ok(Self {
            pool: Some(Arc::new(pool)),
        })
    }

    /// Number of workers the multiplication fans out to.
    pub fn threads(&self) -> usize {
        match &self.pool {
            Some(pool) => pool.current_num_threads(),
            None => rayon::current_num_threads(),
        }
    }

    /// Computes `a × b`, blocking until every row is done.
    pub fn multiply(&self, a: &Matrix, b: &Matrix) -> Result<Matrix, Error> {
        check_inner_dimensions(a, b)?;
        let (rows, cols) = (a.rows(), b.cols());
        let mut data = alloc_result(rows, cols)?;
        debug!(rows, cols, inner = a.cols(), threads = self.threads(), "multiplying");

        run_workers(|| match &self.pool {
            Some(pool) => pool.install(|| fill_rows(a, b, &mut data)),
            None => fill_rows(a, b, &mut data),
        })?;

        Matrix::new(rows, cols, data)
    }

    /// Runs [`Multiplier::multiply`] on tokio's blocking pool so the calling
    /// task is suspended rather than blocked.
    pub async fn multiply_async(&self, a: Arc<Matrix>, b: Arc<Matrix>) -> Result<Matrix, Error> {
        let multiplier = self.clone();
        tokio::task::spawn_blocking(move || multiplier.multiply(&a, &b))
            .await
            .map_err(|e| Error::Worker(e.to_string()))?
    }
}

/// Computes `a × b` on the global rayon pool.
pub fn multiply(a: &Matrix, b: &Matrix) -> Result<Matrix, Error> {
    Multiplier::new().multiply(a, b)
}

/// Single-threaded triple loop. Every cell is summed in the same order as
/// the parallel kernel, so the two agree bit for bit.
pub fn multiply_sequential(a: &Matrix, b: &Matrix) -> Result<Matrix, Error> {
    check_inner_dimensions(a, b)?;
    let (rows, cols) = (a.rows(), b.cols());
    let mut data = alloc_result(rows, cols)?;
    for (i, out) in data.chunks_mut(cols).enumerate() {
        compute_row(a, b, i, out);
    }
    Matrix::new(rows, cols, data)
}

pub(crate) fn check_inner_dimensions(a: &Matrix, b: &Matrix) -> Result<(), Error> {
    if a.cols() != b.rows() {
        return Err(Error::DimensionMismatch(
            a.rows(),
            a.cols(),
            b.rows(),
            b.cols(),
        ));
    }
    Ok(())
}

fn alloc_result(rows: usize, cols: usize) -> Result<Vec<f64>, Error> {
    let len = rows
        .checked_mul(cols)
        .ok_or(Error::Allocation { rows, cols })?;
    let mut data = Vec::new();
    data.try_reserve_exact(len)
        .map_err(|_| Error::Allocation { rows, cols })?;
    data.resize(len, 0.0);
    Ok(data)
}

/// Splits `out` into one slice per result row; each slice goes to exactly
/// one task.
fn fill_rows(a: &Matrix, b: &Matrix, out: &mut [f64]) {
    out.par_chunks_mut(b.cols())
        .enumerate()
        .for_each(|(i, row)| compute_row(a, b, i, row));
}

fn compute_row(a: &Matrix, b: &Matrix, i: usize, out: &mut [f64]) {
    let a_row = a.row(i);
    for (j, cell) in out.iter_mut().enumerate() {
        let mut sum = 0.0;
        for (k, &a_ik) in a_row.iter().enumerate() {
            sum += a_ik * b[(k, j)];
        }
        *cell = sum;
    }
}

/// Runs `fill` to completion, turning a panic in any worker into
/// [`Error::Worker`].
fn run_workers<F: FnOnce()>(fill: F) -> Result<(), Error> {
    panic::catch_unwind(AssertUnwindSafe(fill))
        .map_err(|payload| Error::Worker(panic_message(payload.as_ref())))
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "worker panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use proptest::collection::vec;
    use proptest::prelude::*;

    use super::*;

    fn m(rows: Vec<Vec<f64>>) -> Matrix {
        Matrix::from_rows(rows).unwrap()
    }

    #[test]
    fn two_by_two_product() {
        let a = m(vec![vec![1.0, 2.0], vec![3.0, 4.0]]);
        let b = m(vec![vec![5.0, 6.0], vec![7.0, 8.0]]);
        let c = multiply(&a, &b).unwrap();
        assert_eq!(c.to_rows(), vec![vec![19.0, 22.0], vec![43.0, 50.0]]);
    }

    #[test]
    fn rectangular_product_has_outer_shape() {
        let a = m(vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]);
        let b = m(vec![vec![7.0], vec![8.0], vec![9.0]]);
        let c = multiply(&a, &b).unwrap();
        assert_eq!(c.shape(), (2, 1));
        assert_eq!(c.to_rows(), vec![vec![50.0], vec![122.0]]);
    }

    #[test]
    fn inner_dimension_mismatch_is_rejected() {
        let a = Matrix::zeros(2, 3).unwrap();
        let b = Matrix::zeros(4, 2).unwrap();
        let err = multiply(&a, &b).unwrap_err();
        assert!(matches!(err, Error::DimensionMismatch(2, 3, 4, 2)));
        let err = multiply_sequential(&a, &b).unwrap_err();
        assert!(matches!(err, Error::DimensionMismatch(2, 3, 4, 2)));
    }

    #[test]
    fn oversized_result_is_an_allocation_error() {
        assert!(matches!(
            alloc_result(usize::MAX / 16, 2),
            Err(Error::Allocation { rows, cols: 2 }) if rows == usize::MAX / 16
        ));
        assert!(matches!(
            alloc_result(usize::MAX, 2),
            Err(Error::Allocation { .. })
        ));
    }

    #[test]
    fn panicking_worker_becomes_worker_error() {
        let pool = ThreadPoolBuilder::new().num_threads(2).build().unwrap();
        let mut data = vec![0.0; 8];
        let err = run_workers(|| {
            pool.install(|| {
                data.par_chunks_mut(2).enumerate().for_each(|(i, row)| {
                    if i == 3 {
                        panic!("row {i} failed");
                    }
                    row.fill(1.0);
                })
            })
        })
        .unwrap_err();
        match err {
            Error::Worker(message) => assert_eq!(message, "row 3 failed"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn static_panic_message_is_kept() {
        let err = run_workers(|| panic!("boom")).unwrap_err();
        assert!(matches!(err, Error::Worker(ref message) if message == "boom"));
    }

    #[test]
    fn zero_workers_is_a_config_error() {
        assert!(matches!(Multiplier::with_threads(0), Err(Error::Config(_))));
    }

    #[test]
    fn dedicated_pool_reports_its_size() {
        let multiplier = Multiplier::with_threads(3).unwrap();
        assert_eq!(multiplier.threads(), 3);
    }

    #[test]
    fn pool_size_does_not_change_result() {
        let a = Matrix::new(5, 4, (0..20).map(|v| v as f64 * 0.37 - 3.0).collect()).unwrap();
        let b = Matrix::new(4, 6, (0..24).map(|v| v as f64 * -1.13 + 7.5).collect()).unwrap();
        let single = Multiplier::with_threads(1).unwrap().multiply(&a, &b).unwrap();
        let many = Multiplier::with_threads(4).unwrap().multiply(&a, &b).unwrap();
        assert_eq!(single, many);
    }

    #[tokio::test]
    async fn async_multiply_matches_blocking() {
        let a = Arc::new(m(vec![vec![1.0, 2.0], vec![3.0, 4.0]]));
        let b = Arc::new(m(vec![vec![5.0, 6.0], vec![7.0, 8.0]]));
        let multiplier = Multiplier::new();
        let c = multiplier
            .multiply_async(Arc::clone(&a), Arc::clone(&b))
            .await
            .unwrap();
        assert_eq!(c, multiplier.multiply(&a, &b).unwrap());
    }

    fn operands() -> impl Strategy<Value = (Matrix, Matrix)> {
        (1usize..9, 1usize..9, 1usize..9).prop_flat_map(|(rows, inner, cols)| {
            (
                vec(-100.0f64..100.0, rows * inner),
                vec(-100.0f64..100.0, inner * cols),
            )
                .prop_map(move |(a, b)| {
                    (
                        Matrix::new(rows, inner, a).unwrap(),
                        Matrix::new(inner, cols, b).unwrap(),
                    )
                })
        })
    }

    proptest! {
        #[test]
        fn parallel_matches_sequential((a, b) in operands()) {
            let parallel = multiply(&a, &b).unwrap();
            let sequential = multiply_sequential(&a, &b).unwrap();
            prop_assert_eq!(parallel.shape(), (a.rows(), b.cols()));
            prop_assert_eq!(parallel, sequential);
        }

        #[test]
        fn identity_is_neutral((a, _b) in operands()) {
            let id = Matrix::identity(a.cols()).unwrap();
            prop_assert_eq!(multiply(&a, &id).unwrap(), a);
        }
    }
}
