//! Direct evaluation of spherical harmonic expansions at arbitrary points.
//!
//! Latitudes and longitudes are in degrees for the expansion evaluators and
//! the 2D grid; the harmonic function tables take colatitude and longitude in
//! radians.

use super::{complex_order_sums, latitude_to_colatitude, negative_order_sign, real_order_sums};
use crate::domain::{
    ComplexCoefficients, RealCoefficients, RealGrid, ShtError, ShtResult, TransformOptions,
    COSINE, SINE,
};
use crate::numerics::legendre::complex_order_scale;
use crate::numerics::{legendre_index, LegendreEngine};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Geographic window of [`make_grid_2d`] in degrees; both ends are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridBounds {
    pub north: f64,
    pub south: f64,
    pub west: f64,
    pub east: f64,
}

impl GridBounds {
    pub fn new(north: f64, south: f64, west: f64, east: f64) -> Self {
        Self {
            north,
            south,
            west,
            east,
        }
    }

    fn validate(&self) -> ShtResult<()> {
        let finite = [self.north, self.south, self.west, self.east]
            .iter()
            .all(|value| value.is_finite());
        if !finite {
            return Err(ShtError::invalid_argument("grid bounds must be finite"));
        }
        if self.north > 90.0 || self.south < -90.0 || self.north < self.south {
            return Err(ShtError::invalid_argument(format!(
                "latitude bounds need -90 <= south <= north <= 90, got south={} north={}",
                self.south, self.north
            )));
        }
        if self.east < self.west {
            return Err(ShtError::invalid_argument(format!(
                "longitude bounds need west <= east, got west={} east={}",
                self.west, self.east
            )));
        }
        Ok(())
    }
}

impl Default for GridBounds {
    fn default() -> Self {
        Self::new(90.0, -90.0, 0.0, 360.0)
    }
}

/// Value of a real expansion at `(latitude, longitude)` in degrees.
pub fn evaluate_point(
    coefficients: &RealCoefficients,
    latitude: f64,
    longitude: f64,
    options: TransformOptions,
) -> ShtResult<f64> {
    let lmax = options.resolve_lmax_calc(coefficients.lmax())?;
    let colatitude = latitude_to_colatitude(latitude)?;
    let phi = checked_longitude(longitude)?.to_radians();
    let engine = LegendreEngine::new(lmax, options.normalization, options.phase)?;
    let mut legendre = vec![0.0; engine.table_len()];
    engine.evaluate(colatitude, &mut legendre)?;

    let mut value = 0.0;
    for order in 0..=lmax {
        let (cosine, sine) = real_order_sums(coefficients, &legendre, order, lmax);
        let (sin_m, cos_m) = (order as f64 * phi).sin_cos();
        value += cosine * cos_m + sine * sin_m;
    }
    Ok(value)
}

pub fn evaluate_point_complex(
    coefficients: &ComplexCoefficients,
    latitude: f64,
    longitude: f64,
    options: TransformOptions,
) -> ShtResult<Complex64> {
    let lmax = options.resolve_lmax_calc(coefficients.lmax())?;
    let colatitude = latitude_to_colatitude(latitude)?;
    let phi = checked_longitude(longitude)?.to_radians();
    let engine = LegendreEngine::new(lmax, options.normalization, options.phase)?;
    let mut legendre = vec![0.0; engine.table_len()];
    engine.evaluate(colatitude, &mut legendre)?;

    let mut value = Complex64::new(0.0, 0.0);
    for order in 0..=lmax {
        let scale = complex_order_scale(options.normalization, order);
        let (positive, negative) = complex_order_sums(coefficients, &legendre, order, lmax, scale);
        let rotation = Complex64::from_polar(1.0, order as f64 * phi);
        value += positive * rotation;
        if order > 0 {
            value += negative * rotation.conj();
        }
    }
    Ok(value)
}

/// Evaluates a real expansion on a regular latitude/longitude grid with
/// spacing `interval` degrees. Rows run north to south, columns west to east.
pub fn make_grid_2d(
    coefficients: &RealCoefficients,
    interval: f64,
    bounds: GridBounds,
    options: TransformOptions,
) -> ShtResult<RealGrid> {
    if !interval.is_finite() || interval <= 0.0 {
        return Err(ShtError::invalid_argument(format!(
            "grid interval must be positive and finite, got {interval}"
        )));
    }
    bounds.validate()?;
    let lmax = options.resolve_lmax_calc(coefficients.lmax())?;
    let engine = LegendreEngine::new(lmax, options.normalization, options.phase)?;

    let rows = sample_count(bounds.north - bounds.south, interval);
    let cols = sample_count(bounds.east - bounds.west, interval);
    debug!(rows, cols, lmax, interval, "evaluating 2D grid");

    let longitudes: Vec<f64> = (0..cols)
        .map(|col| (bounds.west + col as f64 * interval).to_radians())
        .collect();
    let mut legendre = vec![0.0; engine.table_len()];
    let mut sums = vec![(0.0, 0.0); lmax + 1];
    let mut grid = RealGrid::zeros(rows, cols);

    for row in 0..rows {
        let latitude = (bounds.north - row as f64 * interval).max(-90.0);
        engine.evaluate(latitude_to_colatitude(latitude)?, &mut legendre)?;
        for (order, sum) in sums.iter_mut().enumerate() {
            *sum = real_order_sums(coefficients, &legendre, order, lmax);
        }
        for (sample, &phi) in grid.row_mut(row).iter_mut().zip(&longitudes) {
            *sample = sums
                .iter()
                .enumerate()
                .map(|(order, &(cosine, sine))| {
                    let (sin_m, cos_m) = (order as f64 * phi).sin_cos();
                    cosine * cos_m + sine * sin_m
                })
                .sum();
        }
    }

    Ok(grid)
}

/// Every real harmonic of degree `<= lmax` at one point, laid out like a
/// coefficient set: `P_lm cos mφ` in the cosine plane, `P_lm sin mφ` in the
/// sine plane.
pub fn spherical_harmonics(
    lmax: usize,
    colatitude: f64,
    longitude: f64,
    options: TransformOptions,
) -> ShtResult<RealCoefficients> {
    let engine = LegendreEngine::new(lmax, options.normalization, options.phase)?;
    let phi = checked_longitude(longitude)?;
    let mut legendre = vec![0.0; engine.table_len()];
    engine.evaluate(colatitude, &mut legendre)?;

    let mut harmonics = RealCoefficients::zeros(lmax);
    for order in 0..=lmax {
        let (sin_m, cos_m) = (order as f64 * phi).sin_cos();
        for degree in order..=lmax {
            let p = legendre[legendre_index(degree, order)];
            harmonics.set_component(COSINE, degree, order, p * cos_m);
            if order > 0 {
                harmonics.set_component(SINE, degree, order, p * sin_m);
            }
        }
    }
    Ok(harmonics)
}

/// Every complex harmonic `Y_lm` of degree `<= lmax` at one point; negative
/// orders satisfy `Y_l,-m = (-1)^m conj(Y_lm)`.
pub fn spherical_harmonics_complex(
    lmax: usize,
    colatitude: f64,
    longitude: f64,
    options: TransformOptions,
) -> ShtResult<ComplexCoefficients> {
    let engine = LegendreEngine::new(lmax, options.normalization, options.phase)?;
    let phi = checked_longitude(longitude)?;
    let mut legendre = vec![0.0; engine.table_len()];
    engine.evaluate(colatitude, &mut legendre)?;

    let mut harmonics = ComplexCoefficients::zeros(lmax);
    for order in 0..=lmax {
        let rotation = Complex64::from_polar(
            complex_order_scale(options.normalization, order),
            order as f64 * phi,
        );
        for degree in order..=lmax {
            let value = rotation * legendre[legendre_index(degree, order)];
            harmonics.set_component(COSINE, degree, order, value);
            if order > 0 {
                harmonics.set_component(
                    SINE,
                    degree,
                    order,
                    value.conj() * negative_order_sign(order),
                );
            }
        }
    }
    Ok(harmonics)
}

/// A single real harmonic; negative orders select `sin |m|φ`.
pub fn spherical_harmonic_lm(
    degree: usize,
    order: i64,
    colatitude: f64,
    longitude: f64,
    options: TransformOptions,
) -> ShtResult<f64> {
    check_order(degree, order)?;
    let harmonics = spherical_harmonics(degree, colatitude, longitude, options)?;
    Ok(harmonics.get(degree, order))
}

pub fn spherical_harmonic_lm_complex(
    degree: usize,
    order: i64,
    colatitude: f64,
    longitude: f64,
    options: TransformOptions,
) -> ShtResult<Complex64> {
    check_order(degree, order)?;
    let harmonics = spherical_harmonics_complex(degree, colatitude, longitude, options)?;
    Ok(harmonics.get(degree, order))
}

fn check_order(degree: usize, order: i64) -> ShtResult<()> {
    if order.unsigned_abs() as usize > degree {
        return Err(ShtError::invalid_argument(format!(
            "spherical harmonics require |m| <= l, got l={degree} m={order}"
        )));
    }
    Ok(())
}

fn checked_longitude(longitude: f64) -> ShtResult<f64> {
    if !longitude.is_finite() {
        return Err(ShtError::invalid_argument(format!(
            "longitude must be finite, got {longitude}"
        )));
    }
    Ok(longitude)
}

fn sample_count(span: f64, interval: f64) -> usize {
    (span / interval + 1.0e-9).floor() as usize + 1
}

#[cfg(test)]
mod tests {
    use super::{
        evaluate_point, evaluate_point_complex, make_grid_2d, spherical_harmonic_lm,
        spherical_harmonic_lm_complex, spherical_harmonics, spherical_harmonics_complex,
        GridBounds,
    };
    use crate::domain::{
        ComplexCoefficients, CondonShortleyPhase, Normalization, RealCoefficients, ShtError,
        TransformOptions,
    };
    use num_complex::Complex64;
    use std::f64::consts::PI;

    fn orthonormal_with_phase() -> TransformOptions {
        TransformOptions::new(Normalization::Orthonormal, CondonShortleyPhase::Included)
    }

    #[test]
    fn complex_harmonics_match_representative_known_values() {
        let options = orthonormal_with_phase();
        let y00 = spherical_harmonic_lm_complex(0, 0, 1.2, -0.8, options).expect("Y_00");
        assert_complex_close("Y_0^0", Complex64::new((1.0 / (4.0 * PI)).sqrt(), 0.0), y00);

        let theta = PI / 3.0;
        let y10 = spherical_harmonic_lm_complex(1, 0, theta, 0.4, options).expect("Y_10");
        assert_complex_close(
            "Y_1^0",
            Complex64::new((3.0 / (4.0 * PI)).sqrt() * theta.cos(), 0.0),
            y10,
        );

        let y11 = spherical_harmonic_lm_complex(1, 1, PI / 2.0, 0.0, options).expect("Y_11");
        assert_complex_close("Y_1^1", Complex64::new(-(3.0 / (8.0 * PI)).sqrt(), 0.0), y11);
    }

    #[test]
    fn negative_orders_follow_conjugate_symmetry() {
        let options = orthonormal_with_phase();
        let (theta, phi) = (0.77, -1.35);
        for degree in 0..=5_usize {
            for order in 1..=degree as i64 {
                let positive =
                    spherical_harmonic_lm_complex(degree, order, theta, phi, options).expect("+m");
                let negative =
                    spherical_harmonic_lm_complex(degree, -order, theta, phi, options).expect("-m");
                let sign = if order % 2 == 0 { 1.0 } else { -1.0 };
                assert_complex_close(
                    &format!("l={degree} m={order}"),
                    positive.conj() * sign,
                    negative,
                );
            }
        }
    }

    #[test]
    fn harmonics_satisfy_addition_theorem() {
        let (theta, phi) = (1.1, 2.3);
        let complex = spherical_harmonics_complex(8, theta, phi, orthonormal_with_phase())
            .expect("complex");
        let real = spherical_harmonics(8, theta, phi, TransformOptions::default()).expect("real");
        for degree in 0..=8_usize {
            let complex_power: f64 = (-(degree as i64)..=degree as i64)
                .map(|order| complex.get(degree, order).norm_sqr())
                .sum();
            assert_close(
                &format!("complex l={degree}"),
                (2 * degree + 1) as f64 / (4.0 * PI),
                complex_power,
                1.0e-13,
            );

            // 4π real harmonics average to 1 each, and sum to 2l+1 at any point.
            let real_power: f64 = (-(degree as i64)..=degree as i64)
                .map(|order| real.get(degree, order).powi(2))
                .sum();
            assert_close(
                &format!("real l={degree}"),
                (2 * degree + 1) as f64,
                real_power,
                1.0e-12,
            );
        }
    }

    #[test]
    fn real_harmonic_lm_selects_sine_for_negative_orders() {
        let options = TransformOptions::new(Normalization::Schmidt, CondonShortleyPhase::Excluded);
        let (theta, phi) = (0.6_f64, 0.9_f64);
        let sine = spherical_harmonic_lm(1, -1, theta, phi, options).expect("sine");
        let cosine = spherical_harmonic_lm(1, 1, theta, phi, options).expect("cosine");
        assert_close("S_11", theta.sin() * phi.sin(), sine, 1.0e-15);
        assert_close("C_11", theta.sin() * phi.cos(), cosine, 1.0e-15);
        assert!(matches!(
            spherical_harmonic_lm(1, 2, theta, phi, options),
            Err(ShtError::InvalidArgument(_))
        ));
    }

    #[test]
    fn harmonic_tables_reject_overflowing_degree() {
        let options = TransformOptions::default().with_normalization(Normalization::Unnormalized);
        assert!(matches!(
            spherical_harmonics(3000, 0.5, 0.0, options),
            Err(ShtError::DegreeOverflow { lmax: 3000, .. })
        ));
    }

    #[test]
    fn point_evaluation_sums_cosine_and_sine_terms() {
        let mut coefficients = RealCoefficients::zeros(2);
        coefficients.set(0, 0, 1.5).expect("set");
        coefficients.set(2, -1, 0.5).expect("set");
        let (latitude, longitude) = (30.0_f64, 45.0_f64);
        let theta = (90.0 - latitude).to_radians();
        let phi = longitude.to_radians();
        let expected = 1.5 + 0.5 * 15.0_f64.sqrt() * theta.cos() * theta.sin() * phi.sin();
        let actual = evaluate_point(&coefficients, latitude, longitude, TransformOptions::default())
            .expect("point");
        assert_close("f(30, 45)", expected, actual, 1.0e-14);

        assert!(matches!(
            evaluate_point(&coefficients, 91.0, 0.0, TransformOptions::default()),
            Err(ShtError::InvalidArgument(_))
        ));
    }

    #[test]
    fn point_longitudes_are_read_in_degrees() {
        // 4π C_11 = sqrt(3) sin θ cos φ on the equator.
        let mut coefficients = RealCoefficients::zeros(1);
        coefficients.set(1, 1, 1.0).expect("set");
        let options = TransformOptions::default();
        for (longitude, expected) in [(0.0, 3.0_f64.sqrt()), (90.0, 0.0), (180.0, -(3.0_f64.sqrt()))] {
            let actual = evaluate_point(&coefficients, 0.0, longitude, options).expect("point");
            assert_close(&format!("lon={longitude}"), expected, actual, 1.0e-14);
        }

        let mut complex = ComplexCoefficients::zeros(1);
        complex.set(1, 1, Complex64::new(1.0, 0.0)).expect("set");
        let value = evaluate_point_complex(&complex, 0.0, 90.0, options).expect("complex point");
        // e^{iφ} at φ = 90° is purely imaginary.
        assert!(value.re.abs() < 1.0e-14, "re={}", value.re);
        assert!(value.im > 0.0, "im={}", value.im);
    }

    #[test]
    fn complex_point_evaluation_matches_harmonic_table() {
        let options = orthonormal_with_phase();
        let mut coefficients = ComplexCoefficients::zeros(3);
        coefficients.set(3, -2, Complex64::new(0.25, 1.0)).expect("set");
        coefficients.set(1, 1, Complex64::new(-2.0, 0.5)).expect("set");
        let (latitude, longitude) = (-20.0_f64, 200.0_f64);
        let (theta, phi) = ((90.0 - latitude).to_radians(), longitude.to_radians());
        let harmonics = spherical_harmonics_complex(3, theta, phi, options).expect("table");
        let expected = Complex64::new(0.25, 1.0) * harmonics.get(3, -2)
            + Complex64::new(-2.0, 0.5) * harmonics.get(1, 1);
        let actual =
            evaluate_point_complex(&coefficients, latitude, longitude, options).expect("point");
        assert_complex_close("f(-20, 200)", expected, actual);
    }

    #[test]
    fn grid_2d_covers_inclusive_bounds_north_to_south() {
        let mut coefficients = RealCoefficients::zeros(1);
        coefficients.set(1, 0, 1.0).expect("set");
        let bounds = GridBounds::new(60.0, -30.0, 10.0, 40.0);
        let grid = make_grid_2d(&coefficients, 15.0, bounds, TransformOptions::default())
            .expect("grid");
        assert_eq!(grid.shape(), (7, 3));
        for row in 0..7 {
            let latitude = 60.0 - 15.0 * row as f64;
            let expected = 3.0_f64.sqrt() * latitude.to_radians().sin();
            assert_close(&format!("row {row}"), expected, grid.get(row, 2), 1.0e-14);
        }

        let global = make_grid_2d(&coefficients, 30.0, GridBounds::default(), TransformOptions::default())
            .expect("global");
        assert_eq!(global.shape(), (7, 13));
    }

    #[test]
    fn grid_2d_validates_interval_and_bounds() {
        let coefficients = RealCoefficients::zeros(1);
        let options = TransformOptions::default();
        assert!(make_grid_2d(&coefficients, 0.0, GridBounds::default(), options).is_err());
        assert!(
            make_grid_2d(&coefficients, 1.0, GridBounds::new(-10.0, 10.0, 0.0, 1.0), options)
                .is_err()
        );
        assert!(
            make_grid_2d(&coefficients, 1.0, GridBounds::new(95.0, 10.0, 0.0, 1.0), options)
                .is_err()
        );
    }

    fn assert_close(label: &str, expected: f64, actual: f64, rel_tol: f64) {
        let abs_diff = (actual - expected).abs();
        let rel_diff = abs_diff / expected.abs().max(1.0);
        assert!(
            rel_diff <= rel_tol,
            "{label} expected={expected:.15e} actual={actual:.15e} abs_diff={abs_diff:.3e} rel_diff={rel_diff:.3e}"
        );
    }

    fn assert_complex_close(label: &str, expected: Complex64, actual: Complex64) {
        let abs_diff = (actual - expected).norm();
        let rel_diff = abs_diff / expected.norm().max(1.0);
        assert!(
            rel_diff <= 1.0e-13,
            "{label} expected={expected} actual={actual} abs_diff={abs_diff:.3e}"
        );
    }
}
