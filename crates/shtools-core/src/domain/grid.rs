use super::{ShtError, ShtResult};
use num_complex::Complex64;

/// Row-major samples indexed by (latitude row, longitude column). Row 0 is
/// the northernmost latitude and column 0 is longitude 0.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid<T> {
    rows: usize,
    cols: usize,
    data: Vec<T>,
}

pub type RealGrid = Grid<f64>;
pub type ComplexGrid = Grid<Complex64>;

impl<T: Copy + Default> Grid<T> {
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![T::default(); rows * cols],
        }
    }

    pub fn from_vec(rows: usize, cols: usize, data: Vec<T>) -> ShtResult<Self> {
        if rows == 0 || cols == 0 {
            return Err(ShtError::shape_mismatch(format!(
                "grid must have at least one row and column, got {rows}x{cols}"
            )));
        }
        if data.len() != rows * cols {
            return Err(ShtError::shape_mismatch(format!(
                "grid of {rows}x{cols} needs {} samples, got {}",
                rows * cols,
                data.len()
            )));
        }
        Ok(Self { rows, cols, data })
    }

    pub fn from_fn(rows: usize, cols: usize, mut f: impl FnMut(usize, usize) -> T) -> Self {
        let mut data = Vec::with_capacity(rows * cols);
        for row in 0..rows {
            for col in 0..cols {
                data.push(f(row, col));
            }
        }
        Self { rows, cols, data }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn get(&self, row: usize, col: usize) -> T {
        self.data[row * self.cols + col]
    }

    pub fn set(&mut self, row: usize, col: usize, value: T) {
        self.data[row * self.cols + col] = value;
    }

    pub fn row(&self, row: usize) -> &[T] {
        &self.data[row * self.cols..(row + 1) * self.cols]
    }

    pub fn row_mut(&mut self, row: usize) -> &mut [T] {
        &mut self.data[row * self.cols..(row + 1) * self.cols]
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    pub fn map<U: Copy + Default>(&self, f: impl FnMut(&T) -> U) -> Grid<U> {
        Grid {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().map(f).collect(),
        }
    }

    /// Pointwise combination of two grids of identical shape.
    pub fn zip_map<U: Copy + Default, V: Copy + Default>(
        &self,
        other: &Grid<U>,
        mut f: impl FnMut(T, U) -> V,
    ) -> ShtResult<Grid<V>> {
        if self.shape() != other.shape() {
            return Err(ShtError::shape_mismatch(format!(
                "grids of shape {:?} and {:?} cannot be combined",
                self.shape(),
                other.shape()
            )));
        }
        Ok(Grid {
            rows: self.rows,
            cols: self.cols,
            data: self
                .data
                .iter()
                .zip(&other.data)
                .map(|(lhs, rhs)| f(*lhs, *rhs))
                .collect(),
        })
    }

    /// Copy with one extra longitude column duplicating column 0.
    pub fn with_wraparound_column(&self) -> Self {
        Self::from_fn(self.rows, self.cols + 1, |row, col| {
            self.get(row, if col == self.cols { 0 } else { col })
        })
    }
}

impl RealGrid {
    pub fn max_abs_difference(&self, other: &Self) -> ShtResult<f64> {
        let differences = self.zip_map(other, |lhs, rhs| (lhs - rhs).abs())?;
        Ok(differences.data.into_iter().fold(0.0, f64::max))
    }
}

impl ComplexGrid {
    pub fn max_abs_difference(&self, other: &Self) -> ShtResult<f64> {
        let differences = self.zip_map(other, |lhs, rhs| (lhs - rhs).norm())?;
        Ok(differences.data.into_iter().fold(0.0, f64::max))
    }
}
