mod commands;
mod helpers;

use clap::Parser;
use shtools_core::domain::ShtError;
use tracing_subscriber::EnvFilter;

const EXIT_USAGE: i32 = 2;
const EXIT_IO: i32 = 3;
const EXIT_COMPUTE: i32 = 4;

pub fn run_from_env() -> i32 {
    init_tracing();
    let args: Vec<String> = std::env::args().skip(1).collect();

    match run(args) {
        Ok(code) => code,
        Err(error) => {
            eprintln!("error: {error:#}");
            error.exit_code()
        }
    }
}

pub fn run<I, S>(args: I) -> Result<i32, CliError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let full_args = std::iter::once("shtools".to_string())
        .chain(args.into_iter().map(Into::into))
        .collect::<Vec<_>>();

    match Cli::try_parse_from(&full_args) {
        Ok(cli) => dispatch_parsed(cli.command),
        Err(err) => match err.kind() {
            clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => {
                print!("{err}");
                Ok(0)
            }
            _ => Err(CliError::Usage(err.to_string())),
        },
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

#[derive(Parser)]
#[command(name = "shtools", about = "Spherical harmonic transforms over JSON files")]
struct Cli {
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(clap::Subcommand)]
enum CliCommand {
    /// Print Gauss-Legendre nodes, weights and grid coordinates
    Glq(commands::GlqArgs),
    /// Expand a DH or GLQ grid into coefficients
    Expand(commands::ExpandArgs),
    /// Synthesize a DH or GLQ grid from coefficients
    MakeGrid(commands::MakeGridArgs),
    /// Synthesize the horizontal gradient of a field
    Gradient(commands::GradientArgs),
    /// Evaluate coefficients on a regular latitude/longitude window
    MakeGrid2d(commands::MakeGrid2dArgs),
    /// Evaluate coefficients at a single point
    Point(commands::PointArgs),
    /// Multiply two fields in the spatial domain
    Multiply(commands::MultiplyArgs),
    /// Least-squares expansion of scattered observations
    Lsq(commands::LsqArgs),
}

fn dispatch_parsed(command: CliCommand) -> Result<i32, CliError> {
    match command {
        CliCommand::Glq(args) => commands::run_glq_command(args),
        CliCommand::Expand(args) => commands::run_expand_command(args),
        CliCommand::MakeGrid(args) => commands::run_make_grid_command(args),
        CliCommand::Gradient(args) => commands::run_gradient_command(args),
        CliCommand::MakeGrid2d(args) => commands::run_make_grid_2d_command(args),
        CliCommand::Point(args) => commands::run_point_command(args),
        CliCommand::Multiply(args) => commands::run_multiply_command(args),
        CliCommand::Lsq(args) => commands::run_lsq_command(args),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error("{0}")]
    Compute(#[from] ShtError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Usage(_) => EXIT_USAGE,
            Self::Compute(_) => EXIT_COMPUTE,
            Self::Internal(_) => EXIT_IO,
        }
    }
}
