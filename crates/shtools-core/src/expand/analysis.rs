//! Grid to coefficient analysis.
//!
//! Each latitude row is Fourier transformed along longitude, then the order
//! `m` spectra are contracted against quadrature weights and Legendre values
//! row by row. With the DH and GLQ weights both contractions are exact for
//! grids band-limited to their natural degree.

use super::{check_quadrature_rule, negative_order_sign};
use crate::domain::{
    ComplexCoefficients, ComplexGrid, DhSampling, GridRegime, RealCoefficients, RealGrid,
    ShtError, ShtResult, TransformOptions, COSINE, SINE,
};
use crate::numerics::legendre::{complex_order_scale, inverse_complex_norm, inverse_real_norm};
use crate::numerics::{dh_quadrature, legendre_index, LegendreEngine, LongitudeFft, QuadratureTable};
use num_complex::Complex64;
use std::f64::consts::PI;
use tracing::debug;

/// Expands a real DH grid; the sampling is inferred from its shape.
pub fn expand_dh(grid: &RealGrid, options: TransformOptions) -> ShtResult<RealCoefficients> {
    let (regime, table) = dh_regime_and_table(grid.rows(), grid.cols())?;
    expand_real(grid, regime, &table, options)
}

/// Expands a real GLQ grid with a table built for its degree.
pub fn expand_glq(
    grid: &RealGrid,
    table: &QuadratureTable,
    options: TransformOptions,
) -> ShtResult<RealCoefficients> {
    expand_real(grid, GridRegime::GaussLegendre, table, options)
}

pub fn expand_dh_complex(
    grid: &ComplexGrid,
    options: TransformOptions,
) -> ShtResult<ComplexCoefficients> {
    let (regime, table) = dh_regime_and_table(grid.rows(), grid.cols())?;
    expand_complex(grid, regime, &table, options)
}

pub fn expand_glq_complex(
    grid: &ComplexGrid,
    table: &QuadratureTable,
    options: TransformOptions,
) -> ShtResult<ComplexCoefficients> {
    expand_complex(grid, GridRegime::GaussLegendre, table, options)
}

pub fn expand_real(
    grid: &RealGrid,
    regime: GridRegime,
    table: &QuadratureTable,
    options: TransformOptions,
) -> ShtResult<RealCoefficients> {
    let lmax_calc = prepare_analysis(grid.shape(), regime, table, &options, "real")?;
    let engine = LegendreEngine::new(lmax_calc, options.normalization, options.phase)?;
    let cols = grid.cols();
    let mut fft = LongitudeFft::new(cols);
    let mut legendre = vec![0.0; engine.table_len()];
    let mut cosine = vec![0.0; engine.table_len()];
    let mut sine = vec![0.0; engine.table_len()];
    let longitude_step = 2.0 * PI / cols as f64;

    for (row, (&colatitude, &weight)) in table
        .colatitudes()
        .iter()
        .zip(table.weights())
        .enumerate()
    {
        if weight == 0.0 {
            continue;
        }
        engine.evaluate(colatitude, &mut legendre)?;
        let spectrum = fft.analyze_real(grid.row(row));
        let scale = weight * longitude_step;
        for order in 0..=lmax_calc {
            let cosine_part = scale * spectrum[order].re;
            let sine_part = -scale * spectrum[order].im;
            for degree in order..=lmax_calc {
                let index = legendre_index(degree, order);
                cosine[index] += legendre[index] * cosine_part;
                sine[index] += legendre[index] * sine_part;
            }
        }
    }

    let mut coefficients = RealCoefficients::zeros(lmax_calc);
    for degree in 0..=lmax_calc {
        for order in 0..=degree {
            let index = legendre_index(degree, order);
            let norm = inverse_real_norm(options.normalization, degree, order);
            coefficients.set_component(COSINE, degree, order, norm * cosine[index]);
            if order > 0 {
                coefficients.set_component(SINE, degree, order, norm * sine[index]);
            }
        }
    }

    Ok(coefficients)
}

pub fn expand_complex(
    grid: &ComplexGrid,
    regime: GridRegime,
    table: &QuadratureTable,
    options: TransformOptions,
) -> ShtResult<ComplexCoefficients> {
    let lmax_calc = prepare_analysis(grid.shape(), regime, table, &options, "complex")?;
    let engine = LegendreEngine::new(lmax_calc, options.normalization, options.phase)?;
    let cols = grid.cols();
    let mut fft = LongitudeFft::new(cols);
    let mut legendre = vec![0.0; engine.table_len()];
    let zero = Complex64::new(0.0, 0.0);
    let mut positive = vec![zero; engine.table_len()];
    let mut negative = vec![zero; engine.table_len()];
    let longitude_step = 2.0 * PI / cols as f64;

    for (row, (&colatitude, &weight)) in table
        .colatitudes()
        .iter()
        .zip(table.weights())
        .enumerate()
    {
        if weight == 0.0 {
            continue;
        }
        engine.evaluate(colatitude, &mut legendre)?;
        let spectrum = fft.analyze_complex(grid.row(row));
        for order in 0..=lmax_calc {
            let scale = weight * longitude_step * complex_order_scale(options.normalization, order);
            let positive_part = spectrum[order] * scale;
            let negative_part =
                spectrum[(cols - order) % cols] * (scale * negative_order_sign(order));
            for degree in order..=lmax_calc {
                let index = legendre_index(degree, order);
                positive[index] += positive_part * legendre[index];
                if order > 0 {
                    negative[index] += negative_part * legendre[index];
                }
            }
        }
    }

    let mut coefficients = ComplexCoefficients::zeros(lmax_calc);
    for degree in 0..=lmax_calc {
        for order in 0..=degree {
            let index = legendre_index(degree, order);
            let norm = inverse_complex_norm(options.normalization, degree, order);
            coefficients.set_component(COSINE, degree, order, positive[index] * norm);
            if order > 0 {
                coefficients.set_component(SINE, degree, order, negative[index] * norm);
            }
        }
    }

    Ok(coefficients)
}

fn dh_regime_and_table(rows: usize, cols: usize) -> ShtResult<(GridRegime, QuadratureTable)> {
    let regime = GridRegime::DriscollHealy(DhSampling::from_grid_shape(rows, cols)?);
    let lmax = regime.lmax_from_shape(rows, cols)?;
    Ok((regime, dh_quadrature(lmax)))
}

fn prepare_analysis(
    (rows, cols): (usize, usize),
    regime: GridRegime,
    table: &QuadratureTable,
    options: &TransformOptions,
    field: &str,
) -> ShtResult<usize> {
    let lmax = regime.lmax_from_shape(rows, cols)?;
    check_quadrature_rule(table, regime.quadrature_rule())?;
    if table.lmax() != lmax {
        return Err(ShtError::shape_mismatch(format!(
            "grid of {rows}x{cols} has degree {lmax} but the quadrature table was built for {}",
            table.lmax()
        )));
    }
    let lmax_calc = options.resolve_lmax_calc(lmax)?;
    options.normalization.check_degree(lmax_calc)?;

    debug!(
        rule = regime.quadrature_rule().as_str(),
        field,
        lmax,
        lmax_calc,
        normalization = %options.normalization,
        "spherical harmonic analysis"
    );
    Ok(lmax_calc)
}
