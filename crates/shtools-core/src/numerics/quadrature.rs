//! Latitude quadrature for Driscoll-Healy and Gauss-Legendre grids.
//!
//! Weights integrate `∫_0^π g(θ) sin θ dθ`, so they sum to 2. Nodes are
//! ordered north to south (increasing colatitude).

use crate::domain::{DhSampling, QuadratureRule, ShtError, ShtResult};
use std::collections::HashMap;
use std::f64::consts::PI;
use std::sync::{Arc, RwLock};
use tracing::{debug, trace};

pub const GLQ_MAX_NEWTON_ITERATIONS: usize = 100;
const NEWTON_TOLERANCE: f64 = 1.0e-15;

#[derive(Debug, Clone, PartialEq)]
pub struct QuadratureTable {
    rule: QuadratureRule,
    lmax: usize,
    nodes: Vec<f64>,
    colatitudes: Vec<f64>,
    weights: Vec<f64>,
}

impl QuadratureTable {
    pub fn rule(&self) -> QuadratureRule {
        self.rule
    }

    /// Band limit the table integrates exactly.
    pub fn lmax(&self) -> usize {
        self.lmax
    }

    /// Node positions as `cos θ`.
    pub fn nodes(&self) -> &[f64] {
        &self.nodes
    }

    pub fn colatitudes(&self) -> &[f64] {
        &self.colatitudes
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    pub fn latitudes_degrees(&self) -> Vec<f64> {
        self.colatitudes
            .iter()
            .map(|colatitude| 90.0 - colatitude.to_degrees())
            .collect()
    }
}

/// Driscoll-Healy rows `θ_i = iπ/N`, `N = 2*lmax + 2`, with weights
/// `w_i = (4/N) sin θ_i Σ_{k<N/2} sin((2k+1)θ_i) / (2k+1)`.
pub fn dh_quadrature(lmax: usize) -> QuadratureTable {
    let rows = 2 * lmax + 2;
    let colatitudes: Vec<f64> = (0..rows)
        .map(|row| PI * row as f64 / rows as f64)
        .collect();
    let weights = colatitudes
        .iter()
        .map(|&colatitude| {
            let series: f64 = (0..rows / 2)
                .map(|k| {
                    let odd = (2 * k + 1) as f64;
                    (odd * colatitude).sin() / odd
                })
                .sum();
            4.0 / rows as f64 * colatitude.sin() * series
        })
        .collect();

    QuadratureTable {
        rule: QuadratureRule::DriscollHealy,
        lmax,
        nodes: colatitudes.iter().map(|colatitude| colatitude.cos()).collect(),
        colatitudes,
        weights,
    }
}

/// Gauss-Legendre nodes (roots of `P_{lmax+1}`) and weights by Newton
/// iteration from Chebyshev-like initial guesses.
pub fn glq_quadrature(lmax: usize) -> ShtResult<QuadratureTable> {
    let count = lmax + 1;
    let mut nodes = vec![0.0; count];
    let mut weights = vec![0.0; count];

    for index in 0..count.div_ceil(2) {
        let mut z = (PI * (index as f64 + 0.75) / (count as f64 + 0.5)).cos();
        let mut converged = false;
        for iteration in 1..=GLQ_MAX_NEWTON_ITERATIONS {
            let (p, dp) = legendre_polynomial_and_derivative(count, z);
            let step = p / dp;
            z -= step;
            if !z.is_finite() {
                break;
            }
            if step.abs() <= NEWTON_TOLERANCE {
                trace!(node = index, iteration, "GLQ node converged");
                converged = true;
                break;
            }
        }
        if !converged {
            return Err(ShtError::ConvergenceFailure {
                node: index,
                node_count: count,
                iterations: GLQ_MAX_NEWTON_ITERATIONS,
            });
        }

        let (_, dp) = legendre_polynomial_and_derivative(count, z);
        let weight = 2.0 / ((1.0 - z * z) * dp * dp);
        nodes[index] = z;
        nodes[count - 1 - index] = -z;
        weights[index] = weight;
        weights[count - 1 - index] = weight;
    }

    Ok(QuadratureTable {
        rule: QuadratureRule::GaussLegendre,
        lmax,
        colatitudes: nodes.iter().map(|node| node.acos()).collect(),
        nodes,
        weights,
    })
}

pub fn quadrature_table(lmax: usize, rule: QuadratureRule) -> ShtResult<QuadratureTable> {
    match rule {
        QuadratureRule::DriscollHealy => Ok(dh_quadrature(lmax)),
        QuadratureRule::GaussLegendre => glq_quadrature(lmax),
    }
}

/// `P_n(x)` and `P_n'(x)` by the Bonnet recurrence.
fn legendre_polynomial_and_derivative(n: usize, x: f64) -> (f64, f64) {
    if n == 0 {
        return (1.0, 0.0);
    }

    let mut p_prev = 1.0;
    let mut p_curr = x;
    for k in 2..=n {
        let p_next = ((2 * k - 1) as f64 * x * p_curr - (k - 1) as f64 * p_prev) / k as f64;
        p_prev = p_curr;
        p_curr = p_next;
    }

    let dp = n as f64 * (x * p_curr - p_prev) / (x * x - 1.0);
    (p_curr, dp)
}

/// Memoized quadrature tables keyed by `(lmax, rule)`.
///
/// Concurrent misses for the same key may both compute the table; the first
/// insert wins and every caller receives that entry.
#[derive(Debug, Default)]
pub struct QuadratureCache {
    tables: RwLock<HashMap<(usize, QuadratureRule), Arc<QuadratureTable>>>,
}

impl QuadratureCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table(&self, lmax: usize, rule: QuadratureRule) -> ShtResult<Arc<QuadratureTable>> {
        let key = (lmax, rule);
        {
            let tables = self
                .tables
                .read()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            if let Some(table) = tables.get(&key) {
                debug!(lmax, rule = rule.as_str(), "quadrature cache hit");
                return Ok(Arc::clone(table));
            }
        }

        debug!(lmax, rule = rule.as_str(), "quadrature cache miss");
        let computed = Arc::new(quadrature_table(lmax, rule)?);
        let mut tables = self
            .tables
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(Arc::clone(tables.entry(key).or_insert(computed)))
    }

    pub fn glq(&self, lmax: usize) -> ShtResult<Arc<QuadratureTable>> {
        self.table(lmax, QuadratureRule::GaussLegendre)
    }

    pub fn dh(&self, lmax: usize) -> ShtResult<Arc<QuadratureTable>> {
        self.table(lmax, QuadratureRule::DriscollHealy)
    }

    pub fn len(&self) -> usize {
        self.tables
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.tables
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clear();
    }
}

/// Latitudes and longitudes (degrees) of a GLQ grid.
pub fn glq_grid_coordinates(lmax: usize, extend: bool) -> ShtResult<(Vec<f64>, Vec<f64>)> {
    let table = glq_quadrature(lmax)?;
    let cols = 2 * lmax + 1;
    Ok((table.latitudes_degrees(), longitudes_degrees(cols, extend)))
}

/// Latitudes and longitudes (degrees) of a DH grid; `extend` adds the south
/// pole row and the 360° column.
pub fn dh_grid_coordinates(lmax: usize, sampling: DhSampling, extend: bool) -> (Vec<f64>, Vec<f64>) {
    let rows = 2 * lmax + 2;
    let lat_count = if extend { rows + 1 } else { rows };
    let latitudes = (0..lat_count)
        .map(|row| 90.0 - 180.0 * row as f64 / rows as f64)
        .collect();
    (latitudes, longitudes_degrees(sampling.longitude_count(rows), extend))
}

fn longitudes_degrees(cols: usize, extend: bool) -> Vec<f64> {
    let count = if extend { cols + 1 } else { cols };
    (0..count)
        .map(|col| 360.0 * col as f64 / cols as f64)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{
        dh_grid_coordinates, dh_quadrature, glq_grid_coordinates, glq_quadrature,
        QuadratureCache,
    };
    use crate::domain::{DhSampling, QuadratureRule};
    use crate::numerics::stable_sum;
    use std::sync::Arc;

    #[test]
    fn glq_weights_sum_to_two_for_many_degrees() {
        for lmax in [0, 1, 2, 5, 16, 63, 200, 511] {
            let table = glq_quadrature(lmax).expect("glq");
            assert_eq!(table.len(), lmax + 1);
            let total = stable_sum(table.weights());
            assert!((total - 2.0).abs() <= 1.0e-12, "lmax={lmax} total={total}");
        }
    }

    #[test]
    fn glq_nodes_are_legendre_roots_in_increasing_colatitude() {
        let table = glq_quadrature(20).expect("glq");
        assert!(
            table
                .colatitudes()
                .windows(2)
                .all(|pair| pair[0] < pair[1])
        );
        for &node in table.nodes() {
            let (p, dp) = super::legendre_polynomial_and_derivative(21, node);
            let residual = (p / dp).abs();
            assert!(residual < 1.0e-14, "node={node} residual={residual}");
        }
    }

    #[test]
    fn glq_integrates_polynomials_up_to_degree_2n_minus_1_exactly() {
        let table = glq_quadrature(4).expect("glq");
        // ∫ x^8 dx over [-1, 1] = 2/9, degree 8 < 2*5
        let integral: f64 = table
            .nodes()
            .iter()
            .zip(table.weights())
            .map(|(x, w)| w * x.powi(8))
            .sum();
        assert!((integral - 2.0 / 9.0).abs() < 1.0e-15);
    }

    #[test]
    fn dh_weights_integrate_even_cosines_exactly() {
        let table = dh_quadrature(5);
        let rows = table.len();
        assert_eq!(rows, 12);
        assert_eq!(table.weights()[0], 0.0);
        for k in 0..rows {
            let expected = if k % 2 == 1 {
                0.0
            } else {
                2.0 / (1.0 - (k * k) as f64)
            };
            let actual: f64 = table
                .colatitudes()
                .iter()
                .zip(table.weights())
                .map(|(theta, w)| w * (k as f64 * theta).cos())
                .sum();
            assert!((actual - expected).abs() < 1.0e-13, "k={k} actual={actual}");
        }
    }

    #[test]
    fn cache_returns_the_same_entry_for_repeated_keys() {
        let cache = QuadratureCache::new();
        let first = cache.glq(12).expect("glq");
        let second = cache.table(12, QuadratureRule::GaussLegendre).expect("glq");
        assert!(Arc::ptr_eq(&first, &second));

        let dh = cache.dh(12).expect("dh");
        assert_eq!(dh.rule(), QuadratureRule::DriscollHealy);
        let again = cache.table(12, QuadratureRule::DriscollHealy).expect("dh");
        assert!(Arc::ptr_eq(&dh, &again));
        assert_eq!(cache.len(), 2);

        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn cache_is_shareable_across_threads() {
        let cache = Arc::new(QuadratureCache::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || cache.glq(40).expect("glq"))
            })
            .collect();
        let tables: Vec<_> = handles
            .into_iter()
            .map(|handle| handle.join().expect("thread"))
            .collect();
        let cached = cache.glq(40).expect("glq");
        for table in &tables {
            assert_eq!(table.as_ref(), cached.as_ref());
        }
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn grid_coordinates_follow_row_and_column_conventions() {
        let (latitudes, longitudes) = dh_grid_coordinates(1, DhSampling::EquallySpaced, true);
        assert_eq!(latitudes, vec![90.0, 45.0, 0.0, -45.0, -90.0]);
        assert_eq!(longitudes.len(), 9);
        assert_eq!(longitudes[8], 360.0);

        let (latitudes, longitudes) = glq_grid_coordinates(2, false).expect("glq");
        assert_eq!(latitudes.len(), 3);
        assert!(latitudes[1].abs() < 1.0e-12);
        assert!(latitudes[0] > 0.0 && latitudes[2] < 0.0);
        assert_eq!(longitudes, vec![0.0, 72.0, 144.0, 216.0, 288.0]);
    }
}
