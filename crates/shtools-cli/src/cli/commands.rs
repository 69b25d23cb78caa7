use super::CliError;
use super::helpers::{
    load_config, read_json, split_observations, write_json, CoefficientsRecord, GridRecord,
    ObservationRecord,
};
use serde::Serialize;
use shtools_core::common::TransformConfig;
use shtools_core::domain::{
    CondonShortleyPhase, DhSampling, GridRegime, Normalization, QuadratureRule, RealCoefficients,
};
use shtools_core::expand::{
    make_grid_2d, GridBounds, SphericalHarmonicTransformApi, SphericalHarmonicTransformer,
};
use shtools_core::numerics::quadrature::glq_grid_coordinates;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub(super) enum RegimeArg {
    /// Driscoll-Healy grid (sampling from --sampling or the config)
    Dh,
    /// Gauss-Legendre quadrature grid
    Glq,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub(super) enum NormalizationArg {
    #[value(name = "geodesy4pi", alias = "4pi")]
    FourPi,
    Schmidt,
    Unnormalized,
    Orthonormal,
}

impl From<NormalizationArg> for Normalization {
    fn from(value: NormalizationArg) -> Self {
        match value {
            NormalizationArg::FourPi => Self::FourPi,
            NormalizationArg::Schmidt => Self::Schmidt,
            NormalizationArg::Unnormalized => Self::Unnormalized,
            NormalizationArg::Orthonormal => Self::Orthonormal,
        }
    }
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub(super) enum SamplingArg {
    EquallySampled,
    EquallySpaced,
}

/// Transform settings; flags override values from `--config`.
#[derive(clap::Args, Debug, Default)]
pub(super) struct TransformFlags {
    /// JSON transform configuration
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, value_enum)]
    normalization: Option<NormalizationArg>,

    /// Include the Condon-Shortley phase
    #[arg(long)]
    with_phase: bool,

    /// Truncate the calculation at this degree
    #[arg(long)]
    lmax_calc: Option<usize>,

    /// Append the wraparound column (and the DH south pole row)
    #[arg(long)]
    extend: bool,

    #[arg(long, value_enum)]
    sampling: Option<SamplingArg>,
}

impl TransformFlags {
    fn resolve(&self) -> Result<TransformConfig, CliError> {
        let mut config = load_config(self.config.as_deref())?;
        if let Some(normalization) = self.normalization {
            config.options.normalization = normalization.into();
        }
        if self.with_phase {
            config.options.phase = CondonShortleyPhase::Included;
        }
        if let Some(lmax_calc) = self.lmax_calc {
            config.options.lmax_calc = Some(lmax_calc);
        }
        if self.extend {
            config.options.extend = true;
        }
        if let Some(sampling) = self.sampling {
            config.sampling = match sampling {
                SamplingArg::EquallySampled => DhSampling::EquallySampled,
                SamplingArg::EquallySpaced => DhSampling::EquallySpaced,
            };
        }
        Ok(config)
    }
}

#[derive(clap::Args)]
pub(super) struct GlqArgs {
    /// Band limit of the GLQ grid
    #[arg(long)]
    lmax: usize,

    /// Append the 360 degree longitude
    #[arg(long)]
    extend: bool,

    /// Output JSON path (stdout when omitted)
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(clap::Args)]
pub(super) struct ExpandArgs {
    /// Grid JSON ({"values": [[...], ...]})
    #[arg(long)]
    grid: PathBuf,

    #[arg(long, value_enum, default_value = "dh")]
    regime: RegimeArg,

    #[command(flatten)]
    transform: TransformFlags,

    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(clap::Args)]
pub(super) struct MakeGridArgs {
    /// Coefficient JSON ({"lmax", "cosine", "sine"})
    #[arg(long)]
    coefficients: PathBuf,

    #[arg(long, value_enum, default_value = "dh")]
    regime: RegimeArg,

    /// Degree of the output grid (coefficient degree when omitted)
    #[arg(long)]
    grid_lmax: Option<usize>,

    #[command(flatten)]
    transform: TransformFlags,

    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(clap::Args)]
pub(super) struct GradientArgs {
    #[arg(long)]
    coefficients: PathBuf,

    #[arg(long, value_enum, default_value = "dh")]
    regime: RegimeArg,

    #[arg(long)]
    grid_lmax: Option<usize>,

    /// Reference radius (overrides the config)
    #[arg(long)]
    radius: Option<f64>,

    #[command(flatten)]
    transform: TransformFlags,

    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(clap::Args)]
pub(super) struct MakeGrid2dArgs {
    #[arg(long)]
    coefficients: PathBuf,

    /// Sample spacing in degrees
    #[arg(long)]
    interval: f64,

    #[arg(long, default_value_t = 90.0, allow_hyphen_values = true)]
    north: f64,

    #[arg(long, default_value_t = -90.0, allow_hyphen_values = true)]
    south: f64,

    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    west: f64,

    #[arg(long, default_value_t = 360.0, allow_hyphen_values = true)]
    east: f64,

    #[command(flatten)]
    transform: TransformFlags,

    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(clap::Args)]
pub(super) struct PointArgs {
    #[arg(long)]
    coefficients: PathBuf,

    /// Latitude in degrees
    #[arg(long, allow_hyphen_values = true)]
    lat: f64,

    /// Longitude in degrees
    #[arg(long, allow_hyphen_values = true)]
    lon: f64,

    #[command(flatten)]
    transform: TransformFlags,
}

#[derive(clap::Args)]
pub(super) struct MultiplyArgs {
    #[arg(long)]
    lhs: PathBuf,

    #[arg(long)]
    rhs: PathBuf,

    /// Degree of the product coefficients
    #[arg(long)]
    lmax: usize,

    #[command(flatten)]
    transform: TransformFlags,

    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(clap::Args)]
pub(super) struct LsqArgs {
    /// JSON array of {"latitude", "longitude", "value", "weight"?}
    #[arg(long)]
    observations: PathBuf,

    #[arg(long)]
    lmax: usize,

    #[command(flatten)]
    transform: TransformFlags,

    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Serialize)]
struct GlqRecord {
    lmax: usize,
    nodes: Vec<f64>,
    weights: Vec<f64>,
    latitudes: Vec<f64>,
    longitudes: Vec<f64>,
}

#[derive(Serialize)]
struct GradientRecord {
    north: GridRecord,
    east: GridRecord,
}

#[derive(Serialize)]
struct PointRecord {
    latitude: f64,
    longitude: f64,
    value: f64,
}

#[derive(Serialize)]
struct LeastSquaresRecord {
    coefficients: CoefficientsRecord,
    chi2: f64,
}

pub(super) fn run_glq_command(args: GlqArgs) -> Result<i32, CliError> {
    let transformer = SphericalHarmonicTransformer::new();
    let table = transformer.quadrature_table(args.lmax, QuadratureRule::GaussLegendre)?;
    let (latitudes, longitudes) = glq_grid_coordinates(args.lmax, args.extend)?;
    let record = GlqRecord {
        lmax: args.lmax,
        nodes: table.nodes().to_vec(),
        weights: table.weights().to_vec(),
        latitudes,
        longitudes,
    };
    write_json(&record, args.output.as_deref())?;
    Ok(0)
}

pub(super) fn run_expand_command(args: ExpandArgs) -> Result<i32, CliError> {
    let config = args.transform.resolve()?;
    let grid = read_json::<GridRecord>(&args.grid, "grid")?.into_grid()?;
    let regime = match args.regime {
        RegimeArg::Dh => GridRegime::DriscollHealy(DhSampling::from_grid_shape(
            grid.rows(),
            grid.cols(),
        )?),
        RegimeArg::Glq => GridRegime::GaussLegendre,
    };
    info!(rows = grid.rows(), cols = grid.cols(), "expanding grid");

    let coefficients = SphericalHarmonicTransformer::new().analyze(&grid, regime, config.options)?;
    write_json(
        &CoefficientsRecord::from_coefficients(&coefficients),
        args.output.as_deref(),
    )?;
    Ok(0)
}

pub(super) fn run_make_grid_command(args: MakeGridArgs) -> Result<i32, CliError> {
    let config = args.transform.resolve()?;
    let coefficients = read_coefficients(&args.coefficients)?;
    let regime = grid_regime(args.regime, &config);

    let grid = SphericalHarmonicTransformer::new().synthesize(
        &coefficients,
        regime,
        args.grid_lmax,
        config.options,
    )?;
    write_json(&GridRecord::from_grid(&grid), args.output.as_deref())?;
    Ok(0)
}

pub(super) fn run_gradient_command(args: GradientArgs) -> Result<i32, CliError> {
    let config = args.transform.resolve()?;
    let coefficients = read_coefficients(&args.coefficients)?;
    let regime = grid_regime(args.regime, &config);
    let radius = args.radius.unwrap_or(config.radius);

    let gradient = SphericalHarmonicTransformer::new().synthesize_gradient(
        &coefficients,
        regime,
        args.grid_lmax,
        radius,
        config.options,
    )?;
    let record = GradientRecord {
        north: GridRecord::from_grid(&gradient.north),
        east: GridRecord::from_grid(&gradient.east),
    };
    write_json(&record, args.output.as_deref())?;
    Ok(0)
}

pub(super) fn run_make_grid_2d_command(args: MakeGrid2dArgs) -> Result<i32, CliError> {
    let config = args.transform.resolve()?;
    let coefficients = read_coefficients(&args.coefficients)?;
    let bounds = GridBounds::new(args.north, args.south, args.west, args.east);

    let grid = make_grid_2d(&coefficients, args.interval, bounds, config.options)?;
    write_json(&GridRecord::from_grid(&grid), args.output.as_deref())?;
    Ok(0)
}

pub(super) fn run_point_command(args: PointArgs) -> Result<i32, CliError> {
    let config = args.transform.resolve()?;
    let coefficients = read_coefficients(&args.coefficients)?;

    let value = SphericalHarmonicTransformer::new().evaluate_point(
        &coefficients,
        args.lat,
        args.lon,
        config.options,
    )?;
    let record = PointRecord {
        latitude: args.lat,
        longitude: args.lon,
        value,
    };
    write_json(&record, None)?;
    Ok(0)
}

pub(super) fn run_multiply_command(args: MultiplyArgs) -> Result<i32, CliError> {
    let config = args.transform.resolve()?;
    let lhs = read_coefficients(&args.lhs)?;
    let rhs = read_coefficients(&args.rhs)?;

    let product =
        SphericalHarmonicTransformer::new().multiply(&lhs, &rhs, args.lmax, config.options)?;
    write_json(
        &CoefficientsRecord::from_coefficients(&product),
        args.output.as_deref(),
    )?;
    Ok(0)
}

pub(super) fn run_lsq_command(args: LsqArgs) -> Result<i32, CliError> {
    let config = args.transform.resolve()?;
    let records: Vec<ObservationRecord> = read_json(&args.observations, "observations")?;
    let (observations, weights) = split_observations(&records)?;
    info!(
        observations = observations.len(),
        weighted = weights.is_some(),
        "least-squares expansion"
    );

    let fit = SphericalHarmonicTransformer::new().expand_least_squares(
        &observations,
        args.lmax,
        weights.as_deref(),
        config.options,
    )?;
    let record = LeastSquaresRecord {
        coefficients: CoefficientsRecord::from_coefficients(&fit.coefficients),
        chi2: fit.chi2,
    };
    write_json(&record, args.output.as_deref())?;
    Ok(0)
}

fn read_coefficients(path: &Path) -> Result<RealCoefficients, CliError> {
    read_json::<CoefficientsRecord>(path, "coefficients")?.into_coefficients()
}

fn grid_regime(regime: RegimeArg, config: &TransformConfig) -> GridRegime {
    match regime {
        RegimeArg::Dh => GridRegime::DriscollHealy(config.sampling),
        RegimeArg::Glq => GridRegime::GaussLegendre,
    }
}
