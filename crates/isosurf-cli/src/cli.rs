use clap::{Args, Parser, Subcommand, ValueEnum};
use isosurf::engine::config::SurfacePhase;
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "Tony Kan, Ted Yu",
    version,
    about = "isosurf - scalar-field grids and Marching Cubes isosurfaces for molecular visualization.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Set the number of threads for parallel computation.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Extract isosurfaces from a cube file and write them as OBJ meshes.
    Extract(ExtractArgs),
    /// Print a summary of a cube file.
    Info(InfoArgs),
    /// Combine two cube files of identical size into a new one.
    Combine(CombineArgs),
    /// Halve the grid step of a cube file with tri-cubic interpolation.
    Upsample(UpsampleArgs),
}

/// Arguments for the `extract` subcommand.
#[derive(Args, Debug)]
pub struct ExtractArgs {
    /// Path to the input Gaussian cube file.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Path for the output OBJ file. With two surfaces, `_positive` and `_negative`
    /// are appended to the file stem.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub output: PathBuf,

    /// Path to an optional configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Override the isovalue from the config file.
    #[arg(long, value_name = "FLOAT", allow_negative_numbers = true)]
    pub isovalue: Option<f64>,

    /// Override which surfaces are extracted.
    #[arg(long, value_enum, value_name = "PHASE")]
    pub phase: Option<PhaseArg>,

    /// Upsample the grid before extraction, overriding the config file.
    #[arg(long)]
    pub upsample: bool,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S surface.isovalue=0.05
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseArg {
    Positive,
    Negative,
    Both,
    Auto,
}

impl From<PhaseArg> for SurfacePhase {
    fn from(arg: PhaseArg) -> Self {
        match arg {
            PhaseArg::Positive => SurfacePhase::Positive,
            PhaseArg::Negative => SurfacePhase::Negative,
            PhaseArg::Both => SurfacePhase::Both,
            PhaseArg::Auto => SurfacePhase::Auto,
        }
    }
}

/// Arguments for the `info` subcommand.
#[derive(Args, Debug)]
pub struct InfoArgs {
    /// Path to the input Gaussian cube file.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,
}

/// Arguments for the `combine` subcommand.
#[derive(Args, Debug)]
pub struct CombineArgs {
    /// First input cube file.
    #[arg(short = 'a', long = "first", required = true, value_name = "PATH")]
    pub first: PathBuf,

    /// Second input cube file.
    #[arg(short = 'b', long = "second", required = true, value_name = "PATH")]
    pub second: PathBuf,

    /// Path for the combined cube file.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub output: PathBuf,

    /// Subtract the second grid instead of adding it.
    #[arg(long)]
    pub subtract: bool,

    /// Factor applied to the first grid.
    #[arg(long, value_name = "FLOAT", default_value_t = 1.0, allow_negative_numbers = true)]
    pub scale_a: f64,

    /// Factor applied to the second grid.
    #[arg(long, value_name = "FLOAT", default_value_t = 1.0, allow_negative_numbers = true)]
    pub scale_b: f64,
}

/// Arguments for the `upsample` subcommand.
#[derive(Args, Debug)]
pub struct UpsampleArgs {
    /// Path to the input Gaussian cube file.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Path for the upsampled cube file.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub output: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_extract_with_overrides() {
        let cli = Cli::parse_from([
            "isosurf", "-vv", "extract", "-i", "in.cube", "-o", "out.obj", "--isovalue", "-0.05",
            "--phase", "both", "-S", "surface.upsample=true",
        ]);
        assert_eq!(cli.verbose, 2);
        let Commands::Extract(args) = cli.command else {
            panic!("Expected 'extract' subcommand");
        };
        assert_eq!(args.isovalue, Some(-0.05));
        assert_eq!(args.phase, Some(PhaseArg::Both));
        assert_eq!(args.set_values, vec!["surface.upsample=true"]);
        assert!(!args.upsample);
    }

    #[test]
    fn combine_scales_default_to_one() {
        let cli = Cli::parse_from([
            "isosurf", "combine", "-a", "a.cube", "-b", "b.cube", "-o", "c.cube", "--subtract",
        ]);
        let Commands::Combine(args) = cli.command else {
            panic!("Expected 'combine' subcommand");
        };
        assert!(args.subtract);
        assert_eq!((args.scale_a, args.scale_b), (1.0, 1.0));
    }

    #[test]
    fn quiet_conflicts_with_verbose() {
        let result = Cli::try_parse_from(["isosurf", "-q", "-v", "info", "-i", "x.cube"]);
        assert!(result.is_err());
    }
}
