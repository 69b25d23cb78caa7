use super::CliError;
use anyhow::Context;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use shtools_core::common::{load_transform_config, TransformConfig};
use shtools_core::domain::{RealCoefficients, RealGrid, ShtError, COSINE, SINE};
use shtools_core::expand::Observation;
use std::fs;
use std::path::Path;

/// Real coefficients as two dense `(lmax+1) x (lmax+1)` planes indexed
/// `[degree][order]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(super) struct CoefficientsRecord {
    pub(super) lmax: usize,
    pub(super) cosine: Vec<Vec<f64>>,
    pub(super) sine: Vec<Vec<f64>>,
}

impl CoefficientsRecord {
    pub(super) fn from_coefficients(coefficients: &RealCoefficients) -> Self {
        let lmax = coefficients.lmax();
        let plane = |index: usize| -> Vec<Vec<f64>> {
            (0..=lmax)
                .map(|degree| {
                    (0..=lmax)
                        .map(|order| coefficients.component(index, degree, order))
                        .collect()
                })
                .collect()
        };
        Self {
            lmax,
            cosine: plane(COSINE),
            sine: plane(SINE),
        }
    }

    pub(super) fn into_coefficients(self) -> Result<RealCoefficients, CliError> {
        let width = self.lmax + 1;
        let mut data = Vec::with_capacity(2 * width * width);
        for (name, plane) in [("cosine", self.cosine), ("sine", self.sine)] {
            if plane.len() != width || plane.iter().any(|row| row.len() != width) {
                return Err(ShtError::invalid_argument(format!(
                    "{name} plane must be {width} x {width} for lmax={}",
                    self.lmax
                ))
                .into());
            }
            data.extend(plane.into_iter().flatten());
        }
        Ok(RealCoefficients::from_vec(self.lmax, data)?)
    }
}

/// Grid samples as rows of longitudes, north to south.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(super) struct GridRecord {
    pub(super) values: Vec<Vec<f64>>,
}

impl GridRecord {
    pub(super) fn from_grid(grid: &RealGrid) -> Self {
        Self {
            values: (0..grid.rows()).map(|row| grid.row(row).to_vec()).collect(),
        }
    }

    pub(super) fn into_grid(self) -> Result<RealGrid, CliError> {
        let rows = self.values.len();
        let cols = self.values.first().map_or(0, Vec::len);
        if self.values.iter().any(|row| row.len() != cols) {
            return Err(ShtError::shape_mismatch("grid rows must all have the same length").into());
        }
        let data = self.values.into_iter().flatten().collect();
        Ok(RealGrid::from_vec(rows, cols, data)?)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub(super) struct ObservationRecord {
    pub(super) latitude: f64,
    pub(super) longitude: f64,
    pub(super) value: f64,
    #[serde(default)]
    pub(super) weight: Option<f64>,
}

/// Splits records into observations and, when every record carries one,
/// their weights.
pub(super) fn split_observations(
    records: &[ObservationRecord],
) -> Result<(Vec<Observation>, Option<Vec<f64>>), CliError> {
    let observations = records
        .iter()
        .map(|record| Observation::new(record.latitude, record.longitude, record.value))
        .collect();
    let weights: Vec<f64> = records.iter().filter_map(|record| record.weight).collect();
    match weights.len() {
        0 => Ok((observations, None)),
        count if count == records.len() => Ok((observations, Some(weights))),
        count => Err(CliError::Usage(format!(
            "either every observation or none must carry a weight; {count} of {} do",
            records.len()
        ))),
    }
}

pub(super) fn read_json<T: DeserializeOwned>(path: &Path, what: &str) -> Result<T, CliError> {
    let source = fs::read_to_string(path)
        .with_context(|| format!("failed to read {what} '{}'", path.display()))?;
    let value = serde_json::from_str(&source)
        .with_context(|| format!("failed to parse {what} '{}'", path.display()))?;
    Ok(value)
}

pub(super) fn write_json<T: Serialize>(value: &T, output: Option<&Path>) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value).context("failed to serialize output")?;
    match output {
        Some(path) => fs::write(path, format!("{rendered}\n"))
            .with_context(|| format!("failed to write output '{}'", path.display()))?,
        None => println!("{rendered}"),
    }
    Ok(())
}

pub(super) fn load_config(path: Option<&Path>) -> Result<TransformConfig, CliError> {
    match path {
        Some(path) => Ok(load_transform_config(path).map_err(anyhow::Error::from)?),
        None => Ok(TransformConfig::default()),
    }
}
