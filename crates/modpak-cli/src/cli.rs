use crate::error::{CliError, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use modpak::model::{BasicModel, GridShape};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "modpak developers",
    version,
    about = "modpak CLI - A command-line interface for reading, validating, and writing MODFLOW boundary-condition package files (GHB, LAK).",
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
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load a package file, validate it, and print a summary of its contents.
    Check(CheckArgs),
    /// Load a package file and write it back out, normalizing its layout.
    Rewrite(RewriteArgs),
    /// Build a package file from a TOML deck description.
    Build(BuildArgs),
}

/// Which package format a file should be interpreted as.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageKind {
    /// General-Head Boundary package
    Ghb,
    /// Lake package
    Lak,
}

/// Simulation context shared by the file-oriented subcommands. Package
/// files do not carry grid dimensions or timing themselves; the engine's
/// discretization file does, so they must be restated here.
#[derive(Args, Debug, Clone)]
pub struct ModelArgs {
    /// Number of stress periods in the simulation
    #[arg(long, value_name = "INT", default_value_t = 1)]
    pub nper: usize,

    /// Number of model layers
    #[arg(long, value_name = "INT", default_value_t = 1)]
    pub nlay: usize,

    /// Number of model rows
    #[arg(long, value_name = "INT", default_value_t = 1)]
    pub nrow: usize,

    /// Number of model columns
    #[arg(long, value_name = "INT", default_value_t = 1)]
    pub ncol: usize,

    /// Stress periods (1-based, comma-separated) that are steady-state
    #[arg(long, value_name = "PERIODS", value_delimiter = ',')]
    pub steady: Vec<usize>,

    /// Interpret the file as fixed-width columns instead of free format
    #[arg(long)]
    pub fixed_format: bool,
}

impl ModelArgs {
    pub fn build(&self) -> Result<BasicModel> {
        if self.nper == 0 {
            return Err(CliError::Argument(
                "the simulation needs at least one stress period".to_string(),
            ));
        }
        let mut steady = vec![false; self.nper];
        for &period in &self.steady {
            if period == 0 || period > self.nper {
                return Err(CliError::Argument(format!(
                    "steady period {period} out of range 1..={}",
                    self.nper
                )));
            }
            steady[period - 1] = true;
        }
        Ok(
            BasicModel::new(GridShape::new(self.nlay, self.nrow, self.ncol), self.nper)
                .with_steady(steady)
                .with_free_format(!self.fixed_format),
        )
    }
}

/// Arguments for the `check` subcommand.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Path to the package input file
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Package format of the input file
    #[arg(short, long, value_enum, value_name = "KIND")]
    pub package: PackageKind,

    #[command(flatten)]
    pub model: ModelArgs,
}

/// Arguments for the `rewrite` subcommand.
#[derive(Args, Debug)]
pub struct RewriteArgs {
    /// Path to the package input file
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Path for the normalized output file
    #[arg(short, long, required = true, value_name = "PATH")]
    pub output: PathBuf,

    /// Package format of the input file
    #[arg(short, long, value_enum, value_name = "KIND")]
    pub package: PackageKind,

    #[command(flatten)]
    pub model: ModelArgs,
}

/// Arguments for the `build` subcommand.
#[derive(Args, Debug)]
pub struct BuildArgs {
    /// Path to the TOML deck describing the model and package
    #[arg(short, long, required = true, value_name = "PATH")]
    pub deck: PathBuf,

    /// Path for the generated package file
    #[arg(short, long, required = true, value_name = "PATH")]
    pub output: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;
    use modpak::model::Model;

    #[test]
    fn model_args_mark_one_based_steady_periods() {
        let args = ModelArgs {
            nper: 3,
            nlay: 1,
            nrow: 2,
            ncol: 2,
            steady: vec![1, 3],
            fixed_format: false,
        };
        let model = args.build().unwrap();
        assert!(model.is_steady(0));
        assert!(!model.is_steady(1));
        assert!(model.is_steady(2));
        assert!(model.free_format());
    }

    #[test]
    fn out_of_range_steady_period_is_rejected() {
        let args = ModelArgs {
            nper: 2,
            nlay: 1,
            nrow: 1,
            ncol: 1,
            steady: vec![3],
            fixed_format: false,
        };
        assert!(matches!(args.build(), Err(CliError::Argument(_))));
    }
}
