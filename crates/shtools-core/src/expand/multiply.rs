use super::{expand_dh, make_grid_dh};
use crate::domain::{DhSampling, RealCoefficients, ShtResult, TransformOptions};
use tracing::debug;

/// Coefficients of the pointwise product of two expansions, truncated or
/// zero-padded to `lmax_out`.
///
/// Both fields are synthesized on a DH grid of degree `la + lb`, where their
/// product is still exactly band-limited, so the re-analysis is alias free.
/// Only the normalization and phase of `options` are used.
pub fn multiply(
    lhs: &RealCoefficients,
    rhs: &RealCoefficients,
    lmax_out: usize,
    options: TransformOptions,
) -> ShtResult<RealCoefficients> {
    let lmax_grid = lhs.lmax() + rhs.lmax();
    let lmax_calc = lmax_out.min(lmax_grid);
    options.normalization.check_degree(lmax_grid)?;
    debug!(
        lhs_lmax = lhs.lmax(),
        rhs_lmax = rhs.lmax(),
        lmax_grid,
        lmax_out,
        "spectral multiplication"
    );

    let grid_options = TransformOptions::new(options.normalization, options.phase);
    let sampling = DhSampling::EquallySampled;
    let lhs_grid = make_grid_dh(lhs, Some(lmax_grid), sampling, grid_options)?;
    let rhs_grid = make_grid_dh(rhs, Some(lmax_grid), sampling, grid_options)?;
    let product = lhs_grid.zip_map(&rhs_grid, |a, b| a * b)?;

    let product_coefficients = expand_dh(&product, grid_options.with_lmax_calc(lmax_calc))?;
    Ok(product_coefficients.resized(lmax_out))
}
