//! Coefficient to grid synthesis on DH and GLQ grids.
//!
//! For every output row the degree sums `A_m = Σ_l C_lm P_lm` and
//! `B_m = Σ_l S_lm P_lm` are formed first; the longitude sum is then a single
//! inverse FFT of `A_m - i B_m`.

use super::{check_quadrature_rule, complex_order_sums, real_order_sums};
use crate::domain::{
    ComplexCoefficients, ComplexGrid, DhSampling, GridRegime, RealCoefficients, RealGrid,
    ShtError, ShtResult, TransformOptions,
};
use crate::numerics::legendre::complex_order_scale;
use crate::numerics::{dh_quadrature, LegendreEngine, LongitudeFft, QuadratureTable};
use num_complex::Complex64;
use std::f64::consts::PI;
use tracing::debug;

const POLE_TOLERANCE: f64 = 1.0e-14;

/// Horizontal gradient components of a scalar field.
#[derive(Debug, Clone, PartialEq)]
pub struct GradientGrids {
    /// `-(1/r) ∂f/∂θ`.
    pub north: RealGrid,
    /// `(1/(r sin θ)) ∂f/∂φ`, zero on pole rows.
    pub east: RealGrid,
}

/// Synthesizes a real DH grid of degree `grid_lmax` (the coefficient degree
/// when `None`).
pub fn make_grid_dh(
    coefficients: &RealCoefficients,
    grid_lmax: Option<usize>,
    sampling: DhSampling,
    options: TransformOptions,
) -> ShtResult<RealGrid> {
    let table = dh_quadrature(grid_lmax.unwrap_or(coefficients.lmax()));
    synthesize_real(coefficients, GridRegime::DriscollHealy(sampling), &table, options)
}

/// Synthesizes a real GLQ grid on the rows of `table`.
pub fn make_grid_glq(
    coefficients: &RealCoefficients,
    table: &QuadratureTable,
    options: TransformOptions,
) -> ShtResult<RealGrid> {
    synthesize_real(coefficients, GridRegime::GaussLegendre, table, options)
}

pub fn make_grid_dh_complex(
    coefficients: &ComplexCoefficients,
    grid_lmax: Option<usize>,
    sampling: DhSampling,
    options: TransformOptions,
) -> ShtResult<ComplexGrid> {
    let table = dh_quadrature(grid_lmax.unwrap_or(coefficients.lmax()));
    synthesize_complex(coefficients, GridRegime::DriscollHealy(sampling), &table, options)
}

pub fn make_grid_glq_complex(
    coefficients: &ComplexCoefficients,
    table: &QuadratureTable,
    options: TransformOptions,
) -> ShtResult<ComplexGrid> {
    synthesize_complex(coefficients, GridRegime::GaussLegendre, table, options)
}

pub fn make_gradient_dh(
    coefficients: &RealCoefficients,
    grid_lmax: Option<usize>,
    sampling: DhSampling,
    radius: f64,
    options: TransformOptions,
) -> ShtResult<GradientGrids> {
    let table = dh_quadrature(grid_lmax.unwrap_or(coefficients.lmax()));
    synthesize_gradient(
        coefficients,
        GridRegime::DriscollHealy(sampling),
        &table,
        radius,
        options,
    )
}

pub fn make_gradient_glq(
    coefficients: &RealCoefficients,
    table: &QuadratureTable,
    radius: f64,
    options: TransformOptions,
) -> ShtResult<GradientGrids> {
    synthesize_gradient(coefficients, GridRegime::GaussLegendre, table, radius, options)
}

pub fn synthesize_real(
    coefficients: &RealCoefficients,
    regime: GridRegime,
    table: &QuadratureTable,
    options: TransformOptions,
) -> ShtResult<RealGrid> {
    let layout = SynthesisLayout::new(coefficients.lmax(), regime, table, &options, "real")?;
    let engine = LegendreEngine::new(layout.lmax_calc, options.normalization, options.phase)?;
    let mut legendre = vec![0.0; engine.table_len()];
    let mut fft = LongitudeFft::new(layout.cols);
    let mut grid = RealGrid::zeros(layout.colatitudes.len(), layout.cols);

    for (row, &colatitude) in layout.colatitudes.iter().enumerate() {
        engine.evaluate(colatitude, &mut legendre)?;
        let spectrum = fft.spectrum_mut();
        for order in 0..=layout.lmax_calc {
            let (cosine, sine) = real_order_sums(coefficients, &legendre, order, layout.lmax_calc);
            spectrum[order] = Complex64::new(cosine, -sine);
        }
        for (sample, value) in grid.row_mut(row).iter_mut().zip(fft.synthesize()) {
            *sample = value.re;
        }
    }

    Ok(layout.finish(grid))
}

pub fn synthesize_complex(
    coefficients: &ComplexCoefficients,
    regime: GridRegime,
    table: &QuadratureTable,
    options: TransformOptions,
) -> ShtResult<ComplexGrid> {
    let layout = SynthesisLayout::new(coefficients.lmax(), regime, table, &options, "complex")?;
    let engine = LegendreEngine::new(layout.lmax_calc, options.normalization, options.phase)?;
    let mut legendre = vec![0.0; engine.table_len()];
    let mut fft = LongitudeFft::new(layout.cols);
    let mut grid = ComplexGrid::zeros(layout.colatitudes.len(), layout.cols);
    let cols = layout.cols;

    for (row, &colatitude) in layout.colatitudes.iter().enumerate() {
        engine.evaluate(colatitude, &mut legendre)?;
        let spectrum = fft.spectrum_mut();
        for order in 0..=layout.lmax_calc {
            let scale = complex_order_scale(options.normalization, order);
            let (positive, negative) =
                complex_order_sums(coefficients, &legendre, order, layout.lmax_calc, scale);
            spectrum[order] += positive;
            if order > 0 {
                spectrum[cols - order] += negative;
            }
        }
        grid.row_mut(row).copy_from_slice(fft.synthesize());
    }

    Ok(layout.finish(grid))
}

/// North and east gradient components scaled by `1/radius`.
pub fn synthesize_gradient(
    coefficients: &RealCoefficients,
    regime: GridRegime,
    table: &QuadratureTable,
    radius: f64,
    options: TransformOptions,
) -> ShtResult<GradientGrids> {
    if !radius.is_finite() || radius <= 0.0 {
        return Err(ShtError::invalid_argument(format!(
            "gradient radius must be positive and finite, got {radius}"
        )));
    }
    let layout = SynthesisLayout::new(coefficients.lmax(), regime, table, &options, "gradient")?;
    let lmax_calc = layout.lmax_calc;
    let engine = LegendreEngine::new(lmax_calc, options.normalization, options.phase)?;
    let mut legendre = vec![0.0; engine.table_len()];
    let mut derivatives = vec![0.0; engine.table_len()];
    let mut fft = LongitudeFft::new(layout.cols);
    let mut north = RealGrid::zeros(layout.colatitudes.len(), layout.cols);
    let mut east = RealGrid::zeros(layout.colatitudes.len(), layout.cols);
    let mut sums = vec![(0.0, 0.0); lmax_calc + 1];

    for (row, &colatitude) in layout.colatitudes.iter().enumerate() {
        engine.evaluate_with_derivatives(colatitude, &mut legendre, &mut derivatives)?;

        let spectrum = fft.spectrum_mut();
        for order in 0..=lmax_calc {
            let (cosine, sine) = real_order_sums(coefficients, &derivatives, order, lmax_calc);
            spectrum[order] = Complex64::new(cosine, -sine);
            sums[order] = real_order_sums(coefficients, &legendre, order, lmax_calc);
        }
        for (sample, value) in north.row_mut(row).iter_mut().zip(fft.synthesize()) {
            *sample = -value.re / radius;
        }

        let at_pole = colatitude <= POLE_TOLERANCE || colatitude >= PI - POLE_TOLERANCE;
        if at_pole {
            continue;
        }
        let spectrum = fft.spectrum_mut();
        for (order, &(cosine, sine)) in sums.iter().enumerate() {
            spectrum[order] = Complex64::new(sine, cosine) * order as f64;
        }
        let scale = 1.0 / (radius * colatitude.sin());
        for (sample, value) in east.row_mut(row).iter_mut().zip(fft.synthesize()) {
            *sample = value.re * scale;
        }
    }

    Ok(GradientGrids {
        north: layout.finish(north),
        east: layout.finish(east),
    })
}

/// Output rows, columns and effective degree of one synthesis call.
struct SynthesisLayout {
    colatitudes: Vec<f64>,
    cols: usize,
    lmax_calc: usize,
    extend: bool,
}

impl SynthesisLayout {
    fn new(
        coefficient_lmax: usize,
        regime: GridRegime,
        table: &QuadratureTable,
        options: &TransformOptions,
        field: &str,
    ) -> ShtResult<Self> {
        check_quadrature_rule(table, regime.quadrature_rule())?;
        let grid_lmax = table.lmax();
        let lmax_calc = options.resolve_lmax_calc(grid_lmax)?.min(coefficient_lmax);
        options.normalization.check_degree(lmax_calc)?;

        let (_, cols) = regime.shape(grid_lmax);
        let mut colatitudes = table.colatitudes().to_vec();
        if options.extend && matches!(regime, GridRegime::DriscollHealy(_)) {
            colatitudes.push(PI);
        }

        debug!(
            rule = regime.quadrature_rule().as_str(),
            field,
            grid_lmax,
            lmax_calc,
            normalization = %options.normalization,
            extend = options.extend,
            "spherical harmonic synthesis"
        );
        Ok(Self {
            colatitudes,
            cols,
            lmax_calc,
            extend: options.extend,
        })
    }

    fn finish<T: Copy + Default>(&self, grid: crate::domain::Grid<T>) -> crate::domain::Grid<T> {
        if self.extend {
            grid.with_wraparound_column()
        } else {
            grid
        }
    }
}
