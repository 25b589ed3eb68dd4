//! Random matrices for test inputs.

use std::path::Path;

use rand::Rng;

use crate::codec;
use crate::{Error, Matrix};

const MAX_VALUE: f64 = 100.0;

/// Fills a `rows`x`cols` matrix with values drawn uniformly from `[0, 100)`.
pub fn random_matrix<R: Rng + ?Sized>(
    rows: usize,
    cols: usize,
    rng: &mut R,
) -> Result<Matrix, Error> {
    let mut matrix = Matrix::zeros(rows, cols)?;
    for i in 0..rows {
        for value in matrix.row_mut(i) {
            *value = rng.gen_range(0.0..MAX_VALUE);
        }
    }
    Ok(matrix)
}

/// Generates a random matrix and writes it to `path`.
pub async fn generate_file<R: Rng + ?Sized>(
    path: impl AsRef<Path>,
    rows: usize,
    cols: usize,
    rng: &mut R,
) -> Result<Matrix, Error> {
    let matrix = random_matrix(rows, cols, rng)?;
    codec::write_matrix(path, &matrix).await?;
    Ok(matrix)
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn values_stay_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        let m = random_matrix(6, 9, &mut rng).unwrap();
        assert_eq!(m.shape(), (6, 9));
        assert!(m.as_slice().iter().all(|v| (0.0..MAX_VALUE).contains(v)));
    }

    #[test]
    fn same_seed_same_matrix() {
        let a = random_matrix(3, 3, &mut StdRng::seed_from_u64(42)).unwrap();
        let b = random_matrix(3, 3, &mut StdRng::seed_from_u64(42)).unwrap();
        assert_eq!(a, b);
    }
}
