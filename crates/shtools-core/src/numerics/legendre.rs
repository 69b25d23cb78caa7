//! Normalized associated Legendre functions `P_lm(cos θ)` for `0 <= m <= l <= lmax`.
//!
//! Each normalization runs its own three-term recurrence in `l` at fixed `m`,
//! seeded from closed-form sectoral terms `P_mm`. The sectoral terms carry a
//! `1e-280` scale with the `sin^m θ` factor kept apart, which keeps the
//! normalized conventions finite up to degree 2800. Condon-Shortley signs are
//! applied after the recurrence.
//!
//! Values are packed triangularly: `(l, m)` lives at `l(l+1)/2 + m`.

use crate::domain::{CondonShortleyPhase, Normalization, ShtError, ShtResult};
use crate::numerics::factorial_ratio;
use std::f64::consts::PI;

const SECTORAL_RESCALE: f64 = 1.0e-280;
/// Colatitudes this close to a pole are treated as the pole itself.
const POLE_SNAP: f64 = 1.0e-14;
const COLATITUDE_SLACK: f64 = 1.0e-12;

pub const fn legendre_index(degree: usize, order: usize) -> usize {
    degree * (degree + 1) / 2 + order
}

pub const fn legendre_table_len(lmax: usize) -> usize {
    (lmax + 1) * (lmax + 2) / 2
}

#[derive(Debug, Clone)]
pub struct LegendreEngine {
    lmax: usize,
    normalization: Normalization,
    phase: CondonShortleyPhase,
    start: f64,
    sectoral: Vec<f64>,
    first_off_diagonal: Vec<f64>,
    recurrence_a: Vec<f64>,
    recurrence_b: Vec<f64>,
}

impl LegendreEngine {
    pub fn new(
        lmax: usize,
        normalization: Normalization,
        phase: CondonShortleyPhase,
    ) -> ShtResult<Self> {
        normalization.check_degree(lmax)?;

        let table_len = legendre_table_len(lmax);
        let mut recurrence_a = vec![0.0; table_len];
        let mut recurrence_b = vec![0.0; table_len];
        for order in 0..=lmax {
            for degree in (order + 2)..=lmax {
                let (a, b) = three_term_constants(normalization, degree, order);
                let index = legendre_index(degree, order);
                recurrence_a[index] = a;
                recurrence_b[index] = b;
            }
        }

        Ok(Self {
            lmax,
            normalization,
            phase,
            start: start_value(normalization),
            sectoral: (0..=lmax)
                .map(|order| sectoral_ratio(normalization, order))
                .collect(),
            first_off_diagonal: (0..=lmax)
                .map(|order| first_off_diagonal(normalization, order))
                .collect(),
            recurrence_a,
            recurrence_b,
        })
    }

    pub fn lmax(&self) -> usize {
        self.lmax
    }

    pub fn normalization(&self) -> Normalization {
        self.normalization
    }

    pub fn phase(&self) -> CondonShortleyPhase {
        self.phase
    }

    pub fn table_len(&self) -> usize {
        legendre_table_len(self.lmax)
    }

    /// Fills `values` with `P_lm(cos θ)` for colatitude `θ` in radians.
    pub fn evaluate(&self, colatitude: f64, values: &mut [f64]) -> ShtResult<()> {
        self.check_buffer("values", values.len())?;
        let (z, u) = colatitude_to_cos_sin(colatitude)?;
        self.fill_values(z, u, values);
        self.apply_phase(values);
        Ok(())
    }

    /// Same as [`evaluate`](Self::evaluate) with the argument given as `cos θ`.
    pub fn evaluate_cosine(&self, cos_colatitude: f64, values: &mut [f64]) -> ShtResult<()> {
        self.check_buffer("values", values.len())?;
        if !cos_colatitude.is_finite() || cos_colatitude.abs() > 1.0 {
            return Err(ShtError::invalid_argument(format!(
                "cos(colatitude) must lie in [-1, 1], got {cos_colatitude}"
            )));
        }
        let u = ((1.0 - cos_colatitude) * (1.0 + cos_colatitude)).sqrt();
        self.fill_values(cos_colatitude, u, values);
        self.apply_phase(values);
        Ok(())
    }

    /// Fills `values` and their first derivatives `dP_lm/dθ`.
    ///
    /// At the poles only order 1 has a non-zero derivative; its exact limit
    /// is returned there.
    pub fn evaluate_with_derivatives(
        &self,
        colatitude: f64,
        values: &mut [f64],
        derivatives: &mut [f64],
    ) -> ShtResult<()> {
        self.check_buffer("values", values.len())?;
        self.check_buffer("derivatives", derivatives.len())?;
        let (z, u) = colatitude_to_cos_sin(colatitude)?;
        self.fill_values(z, u, values);

        for degree in 0..=self.lmax {
            for order in 0..=degree {
                let index = legendre_index(degree, order);
                derivatives[index] = if u == 0.0 {
                    if order == 1 {
                        let limit = pole_derivative(self.normalization, degree);
                        if z < 0.0 && degree % 2 == 1 {
                            -limit
                        } else {
                            limit
                        }
                    } else {
                        0.0
                    }
                } else {
                    let previous = if degree > order {
                        derivative_coupling(self.normalization, degree, order)
                            * values[legendre_index(degree - 1, order)]
                    } else {
                        0.0
                    };
                    ((degree as f64) * z * values[index] - previous) / u
                };
            }
        }

        self.apply_phase(values);
        self.apply_phase(derivatives);
        Ok(())
    }

    fn check_buffer(&self, name: &str, len: usize) -> ShtResult<()> {
        let needed = self.table_len();
        if len < needed {
            return Err(ShtError::invalid_argument(format!(
                "Legendre {name} buffer for lmax={} needs {needed} entries, got {len}",
                self.lmax
            )));
        }
        Ok(())
    }

    fn fill_values(&self, z: f64, u: f64, values: &mut [f64]) {
        let lmax = self.lmax;
        values[0] = self.start;
        if lmax == 0 {
            return;
        }

        let mut p2 = self.start;
        let mut p1 = self.first_off_diagonal[0] * z * self.start;
        values[legendre_index(1, 0)] = p1;
        for degree in 2..=lmax {
            let index = legendre_index(degree, 0);
            let p = self.recurrence_a[index] * z * p1 - self.recurrence_b[index] * p2;
            values[index] = p;
            p2 = p1;
            p1 = p;
        }

        let mut sectoral = SECTORAL_RESCALE * self.start;
        let mut sin_power = 1.0 / SECTORAL_RESCALE;
        for order in 1..=lmax {
            sin_power *= u;
            sectoral *= self.sectoral[order];
            values[legendre_index(order, order)] = sectoral * sin_power;
            if order == lmax {
                break;
            }

            let mut p2 = sectoral;
            let mut p1 = self.first_off_diagonal[order] * z * sectoral;
            values[legendre_index(order + 1, order)] = p1 * sin_power;
            for degree in (order + 2)..=lmax {
                let index = legendre_index(degree, order);
                let p = self.recurrence_a[index] * z * p1 - self.recurrence_b[index] * p2;
                values[index] = p * sin_power;
                p2 = p1;
                p1 = p;
            }
        }
    }

    fn apply_phase(&self, values: &mut [f64]) {
        if self.phase == CondonShortleyPhase::Excluded {
            return;
        }
        for degree in 1..=self.lmax {
            for order in (1..=degree).step_by(2) {
                values[legendre_index(degree, order)] = -values[legendre_index(degree, order)];
            }
        }
    }
}

/// Allocating convenience wrapper around [`LegendreEngine::evaluate`].
pub fn legendre_values(
    lmax: usize,
    colatitude: f64,
    normalization: Normalization,
    phase: CondonShortleyPhase,
) -> ShtResult<Vec<f64>> {
    let engine = LegendreEngine::new(lmax, normalization, phase)?;
    let mut values = vec![0.0; engine.table_len()];
    engine.evaluate(colatitude, &mut values)?;
    Ok(values)
}

pub fn legendre_values_with_derivatives(
    lmax: usize,
    colatitude: f64,
    normalization: Normalization,
    phase: CondonShortleyPhase,
) -> ShtResult<(Vec<f64>, Vec<f64>)> {
    let engine = LegendreEngine::new(lmax, normalization, phase)?;
    let mut values = vec![0.0; engine.table_len()];
    let mut derivatives = vec![0.0; engine.table_len()];
    engine.evaluate_with_derivatives(colatitude, &mut values, &mut derivatives)?;
    Ok((values, derivatives))
}

/// Reciprocal of `∫ (P_lm cos mφ)^2 dΩ` for the real harmonics.
pub fn inverse_real_norm(normalization: Normalization, degree: usize, order: usize) -> f64 {
    match normalization {
        Normalization::FourPi => 1.0 / (4.0 * PI),
        Normalization::Schmidt => (2 * degree + 1) as f64 / (4.0 * PI),
        Normalization::Orthonormal => 1.0,
        Normalization::Unnormalized => {
            let order_factor = if order == 0 { 1.0 } else { 2.0 };
            (2 * degree + 1) as f64 * order_factor * factorial_ratio(degree, order) / (4.0 * PI)
        }
    }
}

/// Reciprocal of `∫ |Y_lm|^2 dΩ` for the complex harmonics.
pub fn inverse_complex_norm(normalization: Normalization, degree: usize, order: usize) -> f64 {
    match normalization {
        Normalization::Unnormalized => {
            (2 * degree + 1) as f64 * factorial_ratio(degree, order) / (4.0 * PI)
        }
        _ => inverse_real_norm(normalization, degree, order),
    }
}

/// Factor turning a real-harmonic Legendre value into its complex counterpart:
/// the normalized conventions drop the `sqrt(2)` carried by orders `m > 0`.
pub fn complex_order_scale(normalization: Normalization, order: usize) -> f64 {
    if order == 0 || normalization == Normalization::Unnormalized {
        1.0
    } else {
        std::f64::consts::FRAC_1_SQRT_2
    }
}

fn colatitude_to_cos_sin(colatitude: f64) -> ShtResult<(f64, f64)> {
    if !colatitude.is_finite()
        || colatitude < -COLATITUDE_SLACK
        || colatitude > PI + COLATITUDE_SLACK
    {
        return Err(ShtError::invalid_argument(format!(
            "colatitude must lie in [0, π], got {colatitude}"
        )));
    }

    if colatitude <= POLE_SNAP {
        return Ok((1.0, 0.0));
    }
    if colatitude >= PI - POLE_SNAP {
        return Ok((-1.0, 0.0));
    }
    let (sin, cos) = colatitude.sin_cos();
    Ok((cos, sin))
}

fn start_value(normalization: Normalization) -> f64 {
    match normalization {
        Normalization::Orthonormal => 1.0 / (4.0 * PI).sqrt(),
        _ => 1.0,
    }
}

/// `P_mm / (sin θ · P_{m-1,m-1})`.
fn sectoral_ratio(normalization: Normalization, order: usize) -> f64 {
    if order == 0 {
        return 1.0;
    }
    let m = order as f64;
    match normalization {
        Normalization::FourPi | Normalization::Orthonormal => {
            if order == 1 {
                3.0_f64.sqrt()
            } else {
                ((2.0 * m + 1.0) / (2.0 * m)).sqrt()
            }
        }
        Normalization::Schmidt => {
            if order == 1 {
                1.0
            } else {
                ((2.0 * m - 1.0) / (2.0 * m)).sqrt()
            }
        }
        Normalization::Unnormalized => 2.0 * m - 1.0,
    }
}

/// `P_{m+1,m} / (cos θ · P_mm)`.
fn first_off_diagonal(normalization: Normalization, order: usize) -> f64 {
    let m = order as f64;
    match normalization {
        Normalization::FourPi | Normalization::Orthonormal => (2.0 * m + 3.0).sqrt(),
        Normalization::Schmidt => (2.0 * m + 1.0).sqrt(),
        Normalization::Unnormalized => 2.0 * m + 1.0,
    }
}

/// `(a, b)` in `P_lm = a cos θ P_{l-1,m} - b P_{l-2,m}`, for `l >= m + 2`.
fn three_term_constants(normalization: Normalization, degree: usize, order: usize) -> (f64, f64) {
    let l = degree as f64;
    let m = order as f64;
    match normalization {
        Normalization::FourPi | Normalization::Orthonormal => {
            let a = ((2.0 * l - 1.0) * (2.0 * l + 1.0) / ((l - m) * (l + m))).sqrt();
            let b = ((2.0 * l + 1.0) * (l + m - 1.0) * (l - m - 1.0)
                / ((l - m) * (l + m) * (2.0 * l - 3.0)))
                .sqrt();
            (a, b)
        }
        Normalization::Schmidt => {
            let a = (2.0 * l - 1.0) / ((l - m) * (l + m)).sqrt();
            let b = ((l - m - 1.0) * (l + m - 1.0) / ((l - m) * (l + m))).sqrt();
            (a, b)
        }
        Normalization::Unnormalized => ((2.0 * l - 1.0) / (l - m), (l + m - 1.0) / (l - m)),
    }
}

/// `c` in `sin θ dP_lm/dθ = l cos θ P_lm - c P_{l-1,m}`.
fn derivative_coupling(normalization: Normalization, degree: usize, order: usize) -> f64 {
    let l = degree as f64;
    let m = order as f64;
    match normalization {
        Normalization::FourPi | Normalization::Orthonormal => {
            ((2.0 * l + 1.0) * (l - m) * (l + m) / (2.0 * l - 1.0)).sqrt()
        }
        Normalization::Schmidt => ((l - m) * (l + m)).sqrt(),
        Normalization::Unnormalized => l + m,
    }
}

/// `dP_l1/dθ` at the north pole, before any Condon-Shortley sign.
fn pole_derivative(normalization: Normalization, degree: usize) -> f64 {
    let l = degree as f64;
    let half_product = l * (l + 1.0) / 2.0;
    match normalization {
        Normalization::FourPi => ((2.0 * l + 1.0) * half_product).sqrt(),
        Normalization::Schmidt => half_product.sqrt(),
        Normalization::Orthonormal => ((2.0 * l + 1.0) * half_product / (4.0 * PI)).sqrt(),
        Normalization::Unnormalized => half_product,
    }
}

#[cfg(test)]
mod tests {
    use super::{
        complex_order_scale, inverse_real_norm, legendre_index, legendre_values,
        legendre_values_with_derivatives, LegendreEngine,
    };
    use crate::domain::{CondonShortleyPhase, Normalization, ShtError};
    use std::f64::consts::PI;

    #[test]
    fn geodesy_values_match_closed_forms() {
        let theta = 0.9_f64;
        let (u, z) = theta.sin_cos();
        let values =
            legendre_values(2, theta, Normalization::FourPi, CondonShortleyPhase::Excluded)
                .expect("values");

        let expected = [
            (0, 0, 1.0),
            (1, 0, 3.0_f64.sqrt() * z),
            (1, 1, 3.0_f64.sqrt() * u),
            (2, 0, 5.0_f64.sqrt() * (3.0 * z * z - 1.0) / 2.0),
            (2, 1, 15.0_f64.sqrt() * z * u),
            (2, 2, 15.0_f64.sqrt() / 2.0 * u * u),
        ];
        for (degree, order, value) in expected {
            assert_close(
                &format!("P_{degree}{order}"),
                value,
                values[legendre_index(degree, order)],
                1.0e-14,
            );
        }
    }

    #[test]
    fn normalizations_differ_by_degree_dependent_factors() {
        let theta = 1.3;
        let lmax = 12;
        let four_pi =
            legendre_values(lmax, theta, Normalization::FourPi, CondonShortleyPhase::Excluded)
                .expect("4pi");
        let schmidt =
            legendre_values(lmax, theta, Normalization::Schmidt, CondonShortleyPhase::Excluded)
                .expect("schmidt");
        let orthonormal = legendre_values(
            lmax,
            theta,
            Normalization::Orthonormal,
            CondonShortleyPhase::Excluded,
        )
        .expect("orthonormal");

        for degree in 0..=lmax {
            for order in 0..=degree {
                let index = legendre_index(degree, order);
                let label = format!("l={degree} m={order}");
                assert_close(
                    &label,
                    four_pi[index] / ((2 * degree + 1) as f64).sqrt(),
                    schmidt[index],
                    1.0e-13,
                );
                assert_close(
                    &label,
                    four_pi[index] / (4.0 * PI).sqrt(),
                    orthonormal[index],
                    1.0e-13,
                );
            }
        }
    }

    #[test]
    fn unnormalized_values_match_textbook_polynomials() {
        let theta = 0.4_f64;
        let (u, z) = theta.sin_cos();
        let values = legendre_values(
            3,
            theta,
            Normalization::Unnormalized,
            CondonShortleyPhase::Excluded,
        )
        .expect("values");

        assert_close("P_21", 3.0 * z * u, values[legendre_index(2, 1)], 1.0e-14);
        assert_close("P_22", 3.0 * u * u, values[legendre_index(2, 2)], 1.0e-14);
        assert_close(
            "P_30",
            (5.0 * z * z * z - 3.0 * z) / 2.0,
            values[legendre_index(3, 0)],
            1.0e-14,
        );
        assert_close("P_33", 15.0 * u * u * u, values[legendre_index(3, 3)], 1.0e-13);
    }

    #[test]
    fn condon_shortley_phase_flips_only_odd_orders() {
        let theta = 2.1;
        let without =
            legendre_values(6, theta, Normalization::Schmidt, CondonShortleyPhase::Excluded)
                .expect("without");
        let with = legendre_values(6, theta, Normalization::Schmidt, CondonShortleyPhase::Included)
            .expect("with");

        for degree in 0..=6 {
            for order in 0..=degree {
                let index = legendre_index(degree, order);
                let sign = if order % 2 == 1 { -1.0 } else { 1.0 };
                assert_eq!(with[index], sign * without[index], "l={degree} m={order}");
            }
        }
    }

    #[test]
    fn high_degree_values_satisfy_addition_theorem() {
        let lmax = 2000;
        let values =
            legendre_values(lmax, 0.3, Normalization::FourPi, CondonShortleyPhase::Excluded)
                .expect("values");

        for degree in [10, 500, 1999, 2000] {
            let power: f64 = (0..=degree)
                .map(|order| values[legendre_index(degree, order)].powi(2))
                .sum();
            assert_close(
                &format!("sum_m P_{degree}m^2"),
                (2 * degree + 1) as f64,
                power,
                1.0e-9,
            );
        }
    }

    #[test]
    fn derivatives_match_central_differences() {
        let theta = 1.1;
        let step = 1.0e-6;
        for normalization in Normalization::ALL {
            let (_, derivatives) = legendre_values_with_derivatives(
                8,
                theta,
                normalization,
                CondonShortleyPhase::Included,
            )
            .expect("derivatives");
            let ahead = legendre_values(8, theta + step, normalization, CondonShortleyPhase::Included)
                .expect("ahead");
            let behind =
                legendre_values(8, theta - step, normalization, CondonShortleyPhase::Included)
                    .expect("behind");

            for index in 0..derivatives.len() {
                let difference = (ahead[index] - behind[index]) / (2.0 * step);
                assert_close(
                    &format!("{normalization} index {index}"),
                    difference,
                    derivatives[index],
                    1.0e-6,
                );
            }
        }
    }

    #[test]
    fn pole_derivatives_use_order_one_limit() {
        let (_, north) = legendre_values_with_derivatives(
            4,
            0.0,
            Normalization::Unnormalized,
            CondonShortleyPhase::Excluded,
        )
        .expect("north");
        let (_, south) = legendre_values_with_derivatives(
            4,
            PI,
            Normalization::Unnormalized,
            CondonShortleyPhase::Excluded,
        )
        .expect("south");

        for degree in 1..=4 {
            let limit = (degree * (degree + 1)) as f64 / 2.0;
            let south_sign = if degree % 2 == 0 { 1.0 } else { -1.0 };
            assert_eq!(north[legendre_index(degree, 1)], limit);
            assert_eq!(south[legendre_index(degree, 1)], south_sign * limit);
            assert_eq!(north[legendre_index(degree, 0)], 0.0);
        }
        assert_eq!(north[legendre_index(3, 2)], 0.0);
    }

    #[test]
    fn overflowing_degree_is_rejected_per_normalization() {
        let error = LegendreEngine::new(
            3000,
            Normalization::Unnormalized,
            CondonShortleyPhase::Excluded,
        )
        .expect_err("unnormalized lmax=3000 must overflow");
        assert!(matches!(error, ShtError::DegreeOverflow { lmax: 3000, .. }));

        assert!(
            LegendreEngine::new(2801, Normalization::FourPi, CondonShortleyPhase::Excluded)
                .is_err()
        );
        assert!(
            LegendreEngine::new(86, Normalization::Unnormalized, CondonShortleyPhase::Excluded)
                .is_err()
        );
    }

    #[test]
    fn colatitude_outside_zero_pi_is_invalid() {
        let engine = LegendreEngine::new(3, Normalization::FourPi, CondonShortleyPhase::Excluded)
            .expect("engine");
        let mut values = vec![0.0; engine.table_len()];
        assert!(matches!(
            engine.evaluate(-0.1, &mut values),
            Err(ShtError::InvalidArgument(_))
        ));
        assert!(engine.evaluate(PI + 0.1, &mut values).is_err());
        assert!(engine.evaluate(f64::NAN, &mut values).is_err());
        assert!(engine.evaluate_cosine(1.5, &mut values).is_err());
        assert!(engine.evaluate(PI, &mut values).is_ok());
        assert!(engine.evaluate(0.5, &mut values[..3]).is_err());
    }

    #[test]
    fn cosine_argument_agrees_with_colatitude_argument() {
        let engine =
            LegendreEngine::new(10, Normalization::Orthonormal, CondonShortleyPhase::Included)
                .expect("engine");
        let mut from_angle = vec![0.0; engine.table_len()];
        let mut from_cosine = vec![0.0; engine.table_len()];
        engine.evaluate(0.7, &mut from_angle).expect("angle");
        engine.evaluate_cosine(0.7_f64.cos(), &mut from_cosine).expect("cosine");
        for (index, (a, b)) in from_angle.iter().zip(&from_cosine).enumerate() {
            assert_close(&format!("index {index}"), *a, *b, 1.0e-12);
        }
    }

    #[test]
    fn norm_helpers_follow_convention() {
        assert_close("ortho", 1.0, inverse_real_norm(Normalization::Orthonormal, 3, 2), 0.0);
        assert_close(
            "unnormalized l=1 m=1",
            3.0 * 2.0 * 0.5 / (4.0 * PI),
            inverse_real_norm(Normalization::Unnormalized, 1, 1),
            1.0e-15,
        );
        assert_eq!(complex_order_scale(Normalization::Unnormalized, 2), 1.0);
        assert_eq!(complex_order_scale(Normalization::FourPi, 0), 1.0);
    }

    fn assert_close(label: &str, expected: f64, actual: f64, rel_tol: f64) {
        let abs_diff = (actual - expected).abs();
        let rel_diff = abs_diff / expected.abs().max(1.0);
        assert!(
            rel_diff <= rel_tol,
            "{label} expected={expected:.15e} actual={actual:.15e} abs_diff={abs_diff:.15e} rel_diff={rel_diff:.15e}"
        );
    }
}
