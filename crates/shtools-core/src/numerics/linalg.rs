use faer::linalg::solvers::{Qr, ShapeCore, SolveLstsq};
use faer::Mat;

pub type DenseRealMatrix = Mat<f64>;

/// Column whose diagonal entry in `R` falls below this fraction of its
/// original norm is treated as linearly dependent.
const RANK_RELATIVE_EPSILON: f64 = 1.0e-12;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QrError {
    #[error("least-squares QR requires rows >= cols, got {rows}x{cols}")]
    WideMatrix { rows: usize, cols: usize },
    #[error("QR factorization requires a non-empty matrix")]
    EmptyMatrix,
    #[error("matrix is rank deficient at column {column}")]
    RankDeficient { column: usize },
    #[error("right-hand side length mismatch: expected {expected}, got {actual}")]
    RhsLengthMismatch { expected: usize, actual: usize },
}

/// Householder QR of a tall matrix, rejected up front when a column is
/// numerically dependent on the ones before it.
#[derive(Debug, Clone)]
pub struct HouseholderQr {
    qr: Qr<f64>,
}

impl HouseholderQr {
    pub fn factorize(matrix: &DenseRealMatrix) -> Result<Self, QrError> {
        validate_tall_shape(matrix)?;
        let qr = matrix.as_ref().qr();

        let r = qr.R();
        for column in 0..matrix.ncols() {
            let original = matrix.as_ref().col(column).norm_l2();
            let residual = r[(column, column)].abs();
            if residual.is_nan() || residual <= RANK_RELATIVE_EPSILON * original {
                return Err(QrError::RankDeficient { column });
            }
        }

        Ok(Self { qr })
    }

    /// Minimizer of `||A x - rhs||_2`.
    pub fn solve_least_squares(&self, rhs: &[f64]) -> Result<Vec<f64>, QrError> {
        let rows = self.qr.nrows();
        if rhs.len() != rows {
            return Err(QrError::RhsLengthMismatch {
                expected: rows,
                actual: rhs.len(),
            });
        }

        let column = DenseRealMatrix::from_fn(rows, 1, |row, _| rhs[row]);
        let solution = self.qr.solve_lstsq(&column);
        Ok((0..self.qr.ncols()).map(|row| solution[(row, 0)]).collect())
    }
}

fn validate_tall_shape(matrix: &DenseRealMatrix) -> Result<(), QrError> {
    let rows = matrix.nrows();
    let cols = matrix.ncols();
    if rows == 0 || cols == 0 {
        return Err(QrError::EmptyMatrix);
    }
    if rows < cols {
        return Err(QrError::WideMatrix { rows, cols });
    }

    Ok(())
}
