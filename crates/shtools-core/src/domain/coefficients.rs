//! Triangular spherical harmonic coefficient storage.
//!
//! Values live in a dense `(2, lmax+1, lmax+1)` array. For real sets the first
//! plane holds the cosine terms `C_lm` and the second the sine terms `S_lm`;
//! for complex sets the first plane holds orders `m >= 0` and the second
//! orders `m < 0`, indexed by `|m|`. Entries with `m > l`, and the second
//! plane at `m = 0`, are always zero.

use super::{ShtError, ShtResult};
use num_complex::Complex64;
use std::ops::{Add, Mul};

pub const COSINE: usize = 0;
pub const SINE: usize = 1;

#[derive(Debug, Clone, PartialEq)]
pub struct SphericalHarmonicCoefficients<T> {
    lmax: usize,
    data: Vec<T>,
}

pub type RealCoefficients = SphericalHarmonicCoefficients<f64>;
pub type ComplexCoefficients = SphericalHarmonicCoefficients<Complex64>;

const fn dense_len(lmax: usize) -> usize {
    2 * (lmax + 1) * (lmax + 1)
}

impl<T> SphericalHarmonicCoefficients<T>
where
    T: Copy + Default + PartialEq,
{
    pub fn zeros(lmax: usize) -> Self {
        Self {
            lmax,
            data: vec![T::default(); dense_len(lmax)],
        }
    }

    /// Wraps a dense `(2, lmax+1, lmax+1)` row-major array.
    pub fn from_vec(lmax: usize, data: Vec<T>) -> ShtResult<Self> {
        let expected = dense_len(lmax);
        if data.len() != expected {
            return Err(ShtError::invalid_argument(format!(
                "coefficient array for lmax={lmax} needs {expected} entries (2 x {0} x {0}), got {1}",
                lmax + 1,
                data.len()
            )));
        }

        let coefficients = Self { lmax, data };
        for plane in [COSINE, SINE] {
            for degree in 0..=lmax {
                for order in 0..=lmax {
                    let unused = order > degree || (plane == SINE && order == 0);
                    if unused && coefficients.component(plane, degree, order) != T::default() {
                        return Err(ShtError::invalid_argument(format!(
                            "coefficient ({plane}, {degree}, {order}) lies outside the triangular degree/order layout but is non-zero"
                        )));
                    }
                }
            }
        }

        Ok(coefficients)
    }

    pub fn lmax(&self) -> usize {
        self.lmax
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    fn index(&self, plane: usize, degree: usize, order: usize) -> usize {
        let width = self.lmax + 1;
        (plane * width + degree) * width + order
    }

    /// Raw access by plane (`COSINE`/`SINE`), degree and non-negative order.
    pub fn component(&self, plane: usize, degree: usize, order: usize) -> T {
        self.data[self.index(plane, degree, order)]
    }

    /// Value at `(degree, order)` using signed orders: negative orders address
    /// the second plane. Degrees above `lmax` read as zero.
    pub fn get(&self, degree: usize, order: i64) -> T {
        let absolute = order.unsigned_abs() as usize;
        if degree > self.lmax || absolute > degree {
            return T::default();
        }
        let plane = if order < 0 { SINE } else { COSINE };
        self.component(plane, degree, absolute)
    }

    pub fn set(&mut self, degree: usize, order: i64, value: T) -> ShtResult<()> {
        let absolute = order.unsigned_abs() as usize;
        if degree > self.lmax || absolute > degree {
            return Err(ShtError::invalid_argument(format!(
                "(l={degree}, m={order}) is outside a coefficient set with lmax={}",
                self.lmax
            )));
        }
        let plane = if order < 0 { SINE } else { COSINE };
        let index = self.index(plane, degree, absolute);
        self.data[index] = value;
        Ok(())
    }

    pub(crate) fn set_component(&mut self, plane: usize, degree: usize, order: usize, value: T) {
        let index = self.index(plane, degree, order);
        self.data[index] = value;
    }

    /// Copy truncated or zero-padded to `lmax`.
    pub fn resized(&self, lmax: usize) -> Self {
        let mut resized = Self::zeros(lmax);
        let shared = self.lmax.min(lmax);
        for plane in [COSINE, SINE] {
            for degree in 0..=shared {
                for order in 0..=degree {
                    resized.set_component(plane, degree, order, self.component(plane, degree, order));
                }
            }
        }
        resized
    }

    pub fn map(&self, mut f: impl FnMut(T) -> T) -> Self {
        Self {
            lmax: self.lmax,
            data: self.data.iter().map(|value| f(*value)).collect(),
        }
    }
}

impl<T> SphericalHarmonicCoefficients<T>
where
    T: Copy + Default + PartialEq + Add<Output = T> + Mul<f64, Output = T>,
{
    pub fn scaled(&self, factor: f64) -> Self {
        self.map(|value| value * factor)
    }

    /// `a * self + b * other`; both sets must share `lmax`.
    pub fn linear_combination(&self, a: f64, other: &Self, b: f64) -> ShtResult<Self> {
        if self.lmax != other.lmax {
            return Err(ShtError::shape_mismatch(format!(
                "cannot combine coefficient sets with lmax {} and {}",
                self.lmax, other.lmax
            )));
        }
        Ok(Self {
            lmax: self.lmax,
            data: self
                .data
                .iter()
                .zip(&other.data)
                .map(|(lhs, rhs)| *lhs * a + *rhs * b)
                .collect(),
        })
    }
}

impl RealCoefficients {
    /// Largest absolute difference against another real set, padding the
    /// smaller one with zeros.
    pub fn max_abs_difference(&self, other: &Self) -> f64 {
        let lmax = self.lmax.max(other.lmax);
        let lhs = self.resized(lmax);
        let rhs = other.resized(lmax);
        lhs.data
            .iter()
            .zip(&rhs.data)
            .fold(0.0, |best: f64, (a, b)| best.max((a - b).abs()))
    }
}

impl ComplexCoefficients {
    pub fn max_abs_difference(&self, other: &Self) -> f64 {
        let lmax = self.lmax.max(other.lmax);
        let lhs = self.resized(lmax);
        let rhs = other.resized(lmax);
        lhs.data
            .iter()
            .zip(&rhs.data)
            .fold(0.0, |best: f64, (a, b)| best.max((a - b).norm()))
    }
}

#[cfg(test)]
mod tests {
    use super::{ComplexCoefficients, RealCoefficients, COSINE, SINE};
    use crate::domain::ShtError;
    use num_complex::Complex64;

    #[test]
    fn signed_orders_address_cosine_and_sine_planes() {
        let mut coefficients = RealCoefficients::zeros(3);
        coefficients.set(2, 1, 0.5).expect("cosine term");
        coefficients.set(2, -1, -0.25).expect("sine term");

        assert_eq!(coefficients.component(COSINE, 2, 1), 0.5);
        assert_eq!(coefficients.component(SINE, 2, 1), -0.25);
        assert_eq!(coefficients.get(2, -1), -0.25);
        assert_eq!(coefficients.get(7, 0), 0.0);
        assert!(coefficients.set(2, 3, 1.0).is_err());
    }

    #[test]
    fn from_vec_rejects_wrong_length_and_upper_triangle_values() {
        let error = RealCoefficients::from_vec(2, vec![0.0; 17]).expect_err("bad length");
        assert!(matches!(error, ShtError::InvalidArgument(_)));

        let mut data = vec![0.0; 18];
        data[1] = 1.0; // (cosine, l=0, m=1)
        assert!(RealCoefficients::from_vec(2, data).is_err());

        let mut data = vec![0.0; 18];
        data[9 + 3] = 1.0; // (sine, l=1, m=0)
        assert!(RealCoefficients::from_vec(2, data).is_err());

        let mut data = vec![0.0; 18];
        data[9 + 3 + 1] = 2.0; // (sine, l=1, m=1)
        let parsed = RealCoefficients::from_vec(2, data).expect("valid layout");
        assert_eq!(parsed.get(1, -1), 2.0);
    }

    #[test]
    fn resized_truncates_and_pads() {
        let mut coefficients = RealCoefficients::zeros(3);
        coefficients.set(1, 0, 1.0).expect("set");
        coefficients.set(3, -2, 4.0).expect("set");

        let truncated = coefficients.resized(2);
        assert_eq!(truncated.lmax(), 2);
        assert_eq!(truncated.get(1, 0), 1.0);
        assert_eq!(truncated.get(3, -2), 0.0);

        let padded = coefficients.resized(5);
        assert_eq!(padded.get(3, -2), 4.0);
        assert_eq!(padded.max_abs_difference(&coefficients), 0.0);
    }

    #[test]
    fn linear_combination_requires_matching_degree() {
        let mut lhs = ComplexCoefficients::zeros(1);
        lhs.set(1, -1, Complex64::new(1.0, 2.0)).expect("set");
        let rhs = lhs.scaled(3.0);

        let combined = lhs.linear_combination(2.0, &rhs, -1.0).expect("combine");
        assert_eq!(combined.get(1, -1), Complex64::new(-1.0, -2.0));
        assert!(lhs.linear_combination(1.0, &ComplexCoefficients::zeros(2), 1.0).is_err());
    }
}
