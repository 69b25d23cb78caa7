//! Transforms between grids, coefficients and scattered samples.

pub mod analysis;
pub mod evaluate;
pub mod least_squares;
pub mod multiply;
pub mod synthesis;
pub mod transformer;

pub use analysis::{
    expand_complex, expand_dh, expand_dh_complex, expand_glq, expand_glq_complex, expand_real,
};
pub use evaluate::{
    evaluate_point, evaluate_point_complex, make_grid_2d, spherical_harmonic_lm,
    spherical_harmonic_lm_complex, spherical_harmonics, spherical_harmonics_complex, GridBounds,
};
pub use least_squares::{
    expand_least_squares, expand_weighted_least_squares, LeastSquaresExpansion, Observation,
};
pub use multiply::multiply;
pub use synthesis::{
    make_gradient_dh, make_gradient_glq, make_grid_dh, make_grid_dh_complex, make_grid_glq,
    make_grid_glq_complex, synthesize_complex, synthesize_gradient, synthesize_real,
    GradientGrids,
};
pub use transformer::{SphericalHarmonicTransformApi, SphericalHarmonicTransformer};

use crate::domain::{
    ComplexCoefficients, QuadratureRule, RealCoefficients, ShtError, ShtResult, COSINE, SINE,
};
use crate::numerics::{legendre_index, QuadratureTable};
use num_complex::Complex64;

fn check_quadrature_rule(table: &QuadratureTable, rule: QuadratureRule) -> ShtResult<()> {
    if table.rule() != rule {
        return Err(ShtError::shape_mismatch(format!(
            "expected a {} quadrature table, got {}",
            rule.as_str(),
            table.rule().as_str()
        )));
    }
    Ok(())
}

fn latitude_to_colatitude(latitude: f64) -> ShtResult<f64> {
    if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
        return Err(ShtError::invalid_argument(format!(
            "latitude must lie in [-90, 90] degrees, got {latitude}"
        )));
    }
    Ok((90.0 - latitude).to_radians())
}

/// `Σ_l C_lm P_lm` and `Σ_l S_lm P_lm` at one colatitude.
fn real_order_sums(
    coefficients: &RealCoefficients,
    legendre: &[f64],
    order: usize,
    lmax: usize,
) -> (f64, f64) {
    let mut cosine = 0.0;
    let mut sine = 0.0;
    for degree in order..=lmax {
        let p = legendre[legendre_index(degree, order)];
        cosine += coefficients.component(COSINE, degree, order) * p;
        sine += coefficients.component(SINE, degree, order) * p;
    }
    (cosine, sine)
}

/// Degree sums for orders `+m` and `-m` of a complex set, with the complex
/// Legendre scaling and the `(-1)^m` factor of negative orders applied.
fn complex_order_sums(
    coefficients: &ComplexCoefficients,
    legendre: &[f64],
    order: usize,
    lmax: usize,
    scale: f64,
) -> (Complex64, Complex64) {
    let mut positive = Complex64::new(0.0, 0.0);
    let mut negative = Complex64::new(0.0, 0.0);
    for degree in order..=lmax {
        let p = legendre[legendre_index(degree, order)] * scale;
        positive += coefficients.component(COSINE, degree, order) * p;
        if order > 0 {
            negative += coefficients.component(SINE, degree, order) * p;
        }
    }
    (positive, negative * negative_order_sign(order))
}

const fn negative_order_sign(order: usize) -> f64 {
    if order % 2 == 1 { -1.0 } else { 1.0 }
}
