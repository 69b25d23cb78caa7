pub mod fourier;
pub mod legendre;
pub mod linalg;
pub mod quadrature;

pub use fourier::LongitudeFft;
pub use legendre::{
    legendre_index, legendre_table_len, legendre_values, legendre_values_with_derivatives,
    LegendreEngine,
};
pub use linalg::{DenseRealMatrix, HouseholderQr, QrError};
pub use quadrature::{
    dh_quadrature, glq_quadrature, quadrature_table, QuadratureCache, QuadratureTable,
    GLQ_MAX_NEWTON_ITERATIONS,
};

fn kahan_add(sum: &mut f64, correction: &mut f64, value: f64) {
    let corrected = value - *correction;
    let next = *sum + corrected;
    *correction = (next - *sum) - corrected;
    *sum = next;
}

pub fn stable_sum(values: &[f64]) -> f64 {
    let mut sum = 0.0;
    let mut correction = 0.0;

    for &value in values {
        kahan_add(&mut sum, &mut correction, value);
    }

    sum
}

/// Compensated sum of `values[i]^2 * weights[i]`, or plain squares when no
/// weights are given.
pub fn stable_weighted_square_sum(values: &[f64], weights: Option<&[f64]>) -> f64 {
    let mut sum = 0.0;
    let mut correction = 0.0;

    for (index, &value) in values.iter().enumerate() {
        let weight = weights.map_or(1.0, |weights| weights[index]);
        kahan_add(&mut sum, &mut correction, value * value * weight);
    }

    sum
}

/// `(l - m)! / (l + m)!` as a running product, valid while the result stays
/// inside the double range.
pub fn factorial_ratio(degree: usize, order: usize) -> f64 {
    if order == 0 {
        return 1.0;
    }

    let mut ratio = 1.0;
    for term in (degree - order + 1)..=(degree + order) {
        ratio /= term as f64;
    }

    ratio
}
