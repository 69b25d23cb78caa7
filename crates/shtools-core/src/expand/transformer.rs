use super::{
    evaluate_point, expand_complex, expand_least_squares, expand_real,
    expand_weighted_least_squares, multiply, synthesize_complex, synthesize_gradient,
    synthesize_real, GradientGrids, LeastSquaresExpansion, Observation,
};
use crate::domain::{
    ComplexCoefficients, ComplexGrid, GridRegime, QuadratureRule, RealCoefficients, RealGrid,
    ShtResult, TransformOptions,
};
use crate::numerics::{QuadratureCache, QuadratureTable};
use std::sync::Arc;

/// Transform entry points with the quadrature table resolved from the regime.
pub trait SphericalHarmonicTransformApi {
    fn analyze(
        &self,
        grid: &RealGrid,
        regime: GridRegime,
        options: TransformOptions,
    ) -> ShtResult<RealCoefficients>;

    fn analyze_complex(
        &self,
        grid: &ComplexGrid,
        regime: GridRegime,
        options: TransformOptions,
    ) -> ShtResult<ComplexCoefficients>;

    /// `grid_lmax` defaults to the coefficient degree.
    fn synthesize(
        &self,
        coefficients: &RealCoefficients,
        regime: GridRegime,
        grid_lmax: Option<usize>,
        options: TransformOptions,
    ) -> ShtResult<RealGrid>;

    fn synthesize_complex(
        &self,
        coefficients: &ComplexCoefficients,
        regime: GridRegime,
        grid_lmax: Option<usize>,
        options: TransformOptions,
    ) -> ShtResult<ComplexGrid>;

    fn synthesize_gradient(
        &self,
        coefficients: &RealCoefficients,
        regime: GridRegime,
        grid_lmax: Option<usize>,
        radius: f64,
        options: TransformOptions,
    ) -> ShtResult<GradientGrids>;

    fn evaluate_point(
        &self,
        coefficients: &RealCoefficients,
        latitude: f64,
        longitude: f64,
        options: TransformOptions,
    ) -> ShtResult<f64>;

    fn expand_least_squares(
        &self,
        observations: &[Observation],
        lmax: usize,
        weights: Option<&[f64]>,
        options: TransformOptions,
    ) -> ShtResult<LeastSquaresExpansion>;

    fn multiply(
        &self,
        lhs: &RealCoefficients,
        rhs: &RealCoefficients,
        lmax_out: usize,
        options: TransformOptions,
    ) -> ShtResult<RealCoefficients>;

    fn quadrature_table(&self, lmax: usize, rule: QuadratureRule) -> ShtResult<Arc<QuadratureTable>>;
}

/// Transformer sharing one [`QuadratureCache`] across calls and threads.
#[derive(Debug, Default)]
pub struct SphericalHarmonicTransformer {
    cache: QuadratureCache,
}

impl SphericalHarmonicTransformer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cache(&self) -> &QuadratureCache {
        &self.cache
    }

    fn table_for_grid(
        &self,
        regime: GridRegime,
        rows: usize,
        cols: usize,
    ) -> ShtResult<Arc<QuadratureTable>> {
        let lmax = regime.lmax_from_shape(rows, cols)?;
        self.cache.table(lmax, regime.quadrature_rule())
    }
}

impl SphericalHarmonicTransformApi for SphericalHarmonicTransformer {
    fn analyze(
        &self,
        grid: &RealGrid,
        regime: GridRegime,
        options: TransformOptions,
    ) -> ShtResult<RealCoefficients> {
        let table = self.table_for_grid(regime, grid.rows(), grid.cols())?;
        expand_real(grid, regime, &table, options)
    }

    fn analyze_complex(
        &self,
        grid: &ComplexGrid,
        regime: GridRegime,
        options: TransformOptions,
    ) -> ShtResult<ComplexCoefficients> {
        let table = self.table_for_grid(regime, grid.rows(), grid.cols())?;
        expand_complex(grid, regime, &table, options)
    }

    fn synthesize(
        &self,
        coefficients: &RealCoefficients,
        regime: GridRegime,
        grid_lmax: Option<usize>,
        options: TransformOptions,
    ) -> ShtResult<RealGrid> {
        let lmax = grid_lmax.unwrap_or(coefficients.lmax());
        let table = self.cache.table(lmax, regime.quadrature_rule())?;
        synthesize_real(coefficients, regime, &table, options)
    }

    fn synthesize_complex(
        &self,
        coefficients: &ComplexCoefficients,
        regime: GridRegime,
        grid_lmax: Option<usize>,
        options: TransformOptions,
    ) -> ShtResult<ComplexGrid> {
        let lmax = grid_lmax.unwrap_or(coefficients.lmax());
        let table = self.cache.table(lmax, regime.quadrature_rule())?;
        synthesize_complex(coefficients, regime, &table, options)
    }

    fn synthesize_gradient(
        &self,
        coefficients: &RealCoefficients,
        regime: GridRegime,
        grid_lmax: Option<usize>,
        radius: f64,
        options: TransformOptions,
    ) -> ShtResult<GradientGrids> {
        let lmax = grid_lmax.unwrap_or(coefficients.lmax());
        let table = self.cache.table(lmax, regime.quadrature_rule())?;
        synthesize_gradient(coefficients, regime, &table, radius, options)
    }

    fn evaluate_point(
        &self,
        coefficients: &RealCoefficients,
        latitude: f64,
        longitude: f64,
        options: TransformOptions,
    ) -> ShtResult<f64> {
        evaluate_point(coefficients, latitude, longitude, options)
    }

    fn expand_least_squares(
        &self,
        observations: &[Observation],
        lmax: usize,
        weights: Option<&[f64]>,
        options: TransformOptions,
    ) -> ShtResult<LeastSquaresExpansion> {
        match weights {
            Some(weights) => expand_weighted_least_squares(observations, weights, lmax, options),
            None => expand_least_squares(observations, lmax, options),
        }
    }

    fn multiply(
        &self,
        lhs: &RealCoefficients,
        rhs: &RealCoefficients,
        lmax_out: usize,
        options: TransformOptions,
    ) -> ShtResult<RealCoefficients> {
        multiply(lhs, rhs, lmax_out, options)
    }

    fn quadrature_table(&self, lmax: usize, rule: QuadratureRule) -> ShtResult<Arc<QuadratureTable>> {
        self.cache.table(lmax, rule)
    }
}
