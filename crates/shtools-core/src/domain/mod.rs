pub mod coefficients;
pub mod errors;
pub mod grid;

pub use coefficients::{
    ComplexCoefficients, RealCoefficients, SphericalHarmonicCoefficients, COSINE, SINE,
};
pub use errors::{ShtError, ShtErrorCategory, ShtResult};
pub use grid::{ComplexGrid, Grid, RealGrid};

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Largest degree the scaled recurrences keep inside the double range.
pub const NORMALIZED_MAX_DEGREE: usize = 2800;
/// Largest degree whose unnormalized inner product `(2l)!` stays finite.
pub const UNNORMALIZED_MAX_DEGREE: usize = 85;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Normalization {
    /// Geodesy convention: every real harmonic has mean square 1 over the sphere.
    #[default]
    #[serde(rename = "geodesy4pi", alias = "4pi")]
    FourPi,
    #[serde(rename = "schmidt")]
    Schmidt,
    #[serde(rename = "unnormalized")]
    Unnormalized,
    #[serde(rename = "orthonormal")]
    Orthonormal,
}

impl Normalization {
    pub const ALL: [Self; 4] = [
        Self::FourPi,
        Self::Schmidt,
        Self::Unnormalized,
        Self::Orthonormal,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FourPi => "geodesy4pi",
            Self::Schmidt => "schmidt",
            Self::Unnormalized => "unnormalized",
            Self::Orthonormal => "orthonormal",
        }
    }

    pub const fn max_degree(self) -> usize {
        match self {
            Self::Unnormalized => UNNORMALIZED_MAX_DEGREE,
            Self::FourPi | Self::Schmidt | Self::Orthonormal => NORMALIZED_MAX_DEGREE,
        }
    }

    pub fn check_degree(self, lmax: usize) -> ShtResult<()> {
        let max_degree = self.max_degree();
        if lmax > max_degree {
            return Err(ShtError::DegreeOverflow {
                lmax,
                max_degree,
                normalization: self,
            });
        }
        Ok(())
    }
}

impl Display for Normalization {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CondonShortleyPhase {
    #[default]
    Excluded,
    Included,
}

impl CondonShortleyPhase {
    /// Sign applied to every function of order `m`.
    pub const fn sign(self, order: usize) -> f64 {
        match self {
            Self::Included if order % 2 == 1 => -1.0,
            _ => 1.0,
        }
    }
}

/// Longitude sampling of a Driscoll-Healy grid with `N` latitude rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DhSampling {
    /// `N x N`: longitude spacing equals colatitude spacing.
    #[default]
    EquallySampled,
    /// `N x 2N`: longitude spacing is half the colatitude spacing.
    EquallySpaced,
}

impl DhSampling {
    pub const fn longitude_count(self, rows: usize) -> usize {
        match self {
            Self::EquallySampled => rows,
            Self::EquallySpaced => 2 * rows,
        }
    }

    /// Sampling implied by a DH grid of `rows x cols`.
    pub fn from_grid_shape(rows: usize, cols: usize) -> ShtResult<Self> {
        if rows >= 2 && cols == rows {
            Ok(Self::EquallySampled)
        } else if rows >= 2 && cols == 2 * rows {
            Ok(Self::EquallySpaced)
        } else {
            Err(ShtError::shape_mismatch(format!(
                "DH grid needs N x N or N x 2N samples, got {rows}x{cols}"
            )))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuadratureRule {
    DriscollHealy,
    GaussLegendre,
}

impl QuadratureRule {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DriscollHealy => "DH",
            Self::GaussLegendre => "GLQ",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GridRegime {
    DriscollHealy(DhSampling),
    GaussLegendre,
}

impl GridRegime {
    pub const fn quadrature_rule(self) -> QuadratureRule {
        match self {
            Self::DriscollHealy(_) => QuadratureRule::DriscollHealy,
            Self::GaussLegendre => QuadratureRule::GaussLegendre,
        }
    }

    /// `(rows, columns)` of the native grid for a band limit `lmax`.
    pub const fn shape(self, lmax: usize) -> (usize, usize) {
        match self {
            Self::DriscollHealy(sampling) => {
                let rows = 2 * lmax + 2;
                (rows, sampling.longitude_count(rows))
            }
            Self::GaussLegendre => (lmax + 1, 2 * lmax + 1),
        }
    }

    /// Natural degree of a grid with the given dimensions.
    pub fn lmax_from_shape(self, rows: usize, cols: usize) -> ShtResult<usize> {
        match self {
            Self::DriscollHealy(sampling) => {
                if rows < 2 || rows % 2 != 0 {
                    return Err(ShtError::shape_mismatch(format!(
                        "DH grids need an even number of latitude rows (>= 2), got {rows}"
                    )));
                }
                let expected = sampling.longitude_count(rows);
                if cols != expected {
                    return Err(ShtError::shape_mismatch(format!(
                        "DH grid with {rows} rows and {sampling:?} sampling needs {expected} columns, got {cols}"
                    )));
                }
                Ok(rows / 2 - 1)
            }
            Self::GaussLegendre => {
                if rows == 0 || cols != 2 * rows - 1 {
                    return Err(ShtError::shape_mismatch(format!(
                        "GLQ grid needs rows = lmax+1 and columns = 2*lmax+1, got {rows}x{cols}"
                    )));
                }
                Ok(rows - 1)
            }
        }
    }
}

/// Options shared by analysis and synthesis. Analysis ignores `extend`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TransformOptions {
    pub normalization: Normalization,
    pub phase: CondonShortleyPhase,
    pub lmax_calc: Option<usize>,
    pub extend: bool,
}

impl TransformOptions {
    pub fn new(normalization: Normalization, phase: CondonShortleyPhase) -> Self {
        Self {
            normalization,
            phase,
            lmax_calc: None,
            extend: false,
        }
    }

    pub fn with_normalization(mut self, normalization: Normalization) -> Self {
        self.normalization = normalization;
        self
    }

    pub fn with_phase(mut self, phase: CondonShortleyPhase) -> Self {
        self.phase = phase;
        self
    }

    pub fn with_lmax_calc(mut self, lmax_calc: usize) -> Self {
        self.lmax_calc = Some(lmax_calc);
        self
    }

    pub fn with_extend(mut self, extend: bool) -> Self {
        self.extend = extend;
        self
    }

    /// Degree actually used when `natural` is the largest admissible one.
    pub fn resolve_lmax_calc(&self, natural: usize) -> ShtResult<usize> {
        match self.lmax_calc {
            Some(lmax_calc) if lmax_calc > natural => Err(ShtError::invalid_argument(format!(
                "lmax_calc {lmax_calc} exceeds the natural degree {natural}"
            ))),
            Some(lmax_calc) => Ok(lmax_calc),
            None => Ok(natural),
        }
    }
}
