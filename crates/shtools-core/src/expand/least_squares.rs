//! Least-squares expansion of scattered observations.
//!
//! Unknowns are ordered by degree; degree `l` contributes the cosine terms
//! `m = 0..=l` followed by the sine terms `m = 1..=l`, so there are
//! `(lmax+1)^2` columns in total.

use super::latitude_to_colatitude;
use crate::domain::{RealCoefficients, ShtError, ShtResult, TransformOptions, COSINE, SINE};
use crate::numerics::linalg::{DenseRealMatrix, HouseholderQr, QrError};
use crate::numerics::{legendre_index, stable_weighted_square_sum, LegendreEngine};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// One scattered sample; angles in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub latitude: f64,
    pub longitude: f64,
    pub value: f64,
}

impl Observation {
    pub fn new(latitude: f64, longitude: f64, value: f64) -> Self {
        Self {
            latitude,
            longitude,
            value,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LeastSquaresExpansion {
    pub coefficients: RealCoefficients,
    /// Residual sum of squares, weighted when weights were supplied.
    pub chi2: f64,
}

pub fn expand_least_squares(
    observations: &[Observation],
    lmax: usize,
    options: TransformOptions,
) -> ShtResult<LeastSquaresExpansion> {
    solve(observations, None, lmax, options)
}

/// Minimizes `Σ w_i (d_i - f(x_i))^2`; every weight must be positive.
pub fn expand_weighted_least_squares(
    observations: &[Observation],
    weights: &[f64],
    lmax: usize,
    options: TransformOptions,
) -> ShtResult<LeastSquaresExpansion> {
    if weights.len() != observations.len() {
        return Err(ShtError::shape_mismatch(format!(
            "{} weights supplied for {} observations",
            weights.len(),
            observations.len()
        )));
    }
    if let Some(bad) = weights.iter().find(|weight| !weight.is_finite() || **weight <= 0.0) {
        return Err(ShtError::invalid_argument(format!(
            "least-squares weights must be positive and finite, got {bad}"
        )));
    }
    solve(observations, Some(weights), lmax, options)
}

fn solve(
    observations: &[Observation],
    weights: Option<&[f64]>,
    lmax: usize,
    options: TransformOptions,
) -> ShtResult<LeastSquaresExpansion> {
    let unknowns = (lmax + 1) * (lmax + 1);
    if observations.len() < unknowns {
        return Err(ShtError::UnderdeterminedSystem {
            observations: observations.len(),
            unknowns,
            independent: observations.len(),
        });
    }
    if let Some(bad) = observations.iter().find(|sample| !sample.value.is_finite()) {
        return Err(ShtError::invalid_argument(format!(
            "observation at ({}, {}) has non-finite value {}",
            bad.latitude, bad.longitude, bad.value
        )));
    }

    let design = design_matrix(observations, lmax, options)?;
    let mut system = design.clone();
    let mut rhs: Vec<f64> = observations.iter().map(|sample| sample.value).collect();
    if let Some(weights) = weights {
        for (row, weight) in weights.iter().enumerate() {
            let scale = weight.sqrt();
            for col in 0..unknowns {
                system[(row, col)] *= scale;
            }
            rhs[row] *= scale;
        }
    }

    debug!(
        observations = observations.len(),
        unknowns,
        lmax,
        weighted = weights.is_some(),
        "least-squares expansion"
    );
    let solution = HouseholderQr::factorize(&system)
        .and_then(|qr| qr.solve_least_squares(&rhs))
        .map_err(|error| qr_error(error, observations.len(), unknowns))?;

    let residuals: Vec<f64> = observations
        .iter()
        .enumerate()
        .map(|(row, sample)| {
            let predicted: f64 = (0..unknowns)
                .map(|col| design[(row, col)] * solution[col])
                .sum();
            sample.value - predicted
        })
        .collect();
    let chi2 = stable_weighted_square_sum(&residuals, weights);

    let mut coefficients = RealCoefficients::zeros(lmax);
    for degree in 0..=lmax {
        for order in 0..=degree {
            coefficients.set_component(
                COSINE,
                degree,
                order,
                solution[unknown_index(COSINE, degree, order)],
            );
            if order > 0 {
                coefficients.set_component(
                    SINE,
                    degree,
                    order,
                    solution[unknown_index(SINE, degree, order)],
                );
            }
        }
    }

    Ok(LeastSquaresExpansion { coefficients, chi2 })
}

fn design_matrix(
    observations: &[Observation],
    lmax: usize,
    options: TransformOptions,
) -> ShtResult<DenseRealMatrix> {
    let engine = LegendreEngine::new(lmax, options.normalization, options.phase)?;
    let mut legendre = vec![0.0; engine.table_len()];
    let mut design = DenseRealMatrix::zeros(observations.len(), (lmax + 1) * (lmax + 1));

    for (row, sample) in observations.iter().enumerate() {
        if !sample.longitude.is_finite() {
            return Err(ShtError::invalid_argument(format!(
                "observation {row} has non-finite longitude {}",
                sample.longitude
            )));
        }
        engine.evaluate(latitude_to_colatitude(sample.latitude)?, &mut legendre)?;
        let phi = sample.longitude.to_radians();
        for order in 0..=lmax {
            let (sin_m, cos_m) = (order as f64 * phi).sin_cos();
            for degree in order..=lmax {
                let p = legendre[legendre_index(degree, order)];
                design[(row, unknown_index(COSINE, degree, order))] = p * cos_m;
                if order > 0 {
                    design[(row, unknown_index(SINE, degree, order))] = p * sin_m;
                }
            }
        }
    }

    Ok(design)
}

const fn unknown_index(plane: usize, degree: usize, order: usize) -> usize {
    if plane == COSINE {
        degree * degree + order
    } else {
        degree * degree + degree + order
    }
}

fn qr_error(error: QrError, observations: usize, unknowns: usize) -> ShtError {
    match error {
        QrError::RankDeficient { column } => ShtError::UnderdeterminedSystem {
            observations,
            unknowns,
            independent: column,
        },
        other => ShtError::shape_mismatch(other.to_string()),
    }
}
