use clap::{Args, Parser, Subcommand, ValueEnum, ValueHint};
use std::path::PathBuf;

/// Transport demand CLI (argument schema only)
#[derive(Parser, Debug)]
#[command(name = "tripvec", version, about, propagate_version = true)]
pub struct Cli {
    /// Increase output verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Lookup directory holding zoning/segmentation/translation tables
    #[arg(long, global = true, default_value = "lookups", value_hint = ValueHint::DirPath)]
    pub lookups: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build a demand vector pack from a long-format CSV
    Build(BuildArgs),

    /// Aggregate a pack to a coarser segmentation
    Aggregate(AggregateArgs),

    /// Translate a pack onto a different zoning system
    Translate(TranslateArgs),

    /// Write sector reports from a pack
    Report(ReportArgs),
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, ValueEnum)]
pub enum Weighting {
    /// Split values across targets in proportion to overlap weights
    Weighted,
    /// Copy values in full to every overlapping target (factor vectors)
    NoWeight,
}

#[derive(Args, Debug)]
pub struct BuildArgs {
    /// Input CSV, one row per non-zero zone x segment combination
    #[arg(value_hint = ValueHint::FilePath)]
    pub input: PathBuf,

    /// Zoning system name
    #[arg(long)]
    pub zoning: String,

    /// Segmentation level name
    #[arg(long)]
    pub segmentation: String,

    /// Column holding zone identifiers
    #[arg(long, default_value = "zone")]
    pub zone_col: String,

    /// Column holding demand values
    #[arg(long, default_value = "val")]
    pub val_col: String,

    /// Output pack file (must be a file path; "-" is rejected)
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    pub output: PathBuf,

    /// Overwrite if the file exists
    #[arg(long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct AggregateArgs {
    /// Input pack file
    #[arg(value_hint = ValueHint::FilePath)]
    pub input: PathBuf,

    /// Target segmentation level name
    #[arg(long)]
    pub to: String,

    /// Output pack file
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    pub output: PathBuf,

    /// Overwrite if the file exists
    #[arg(long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct TranslateArgs {
    /// Input pack file
    #[arg(value_hint = ValueHint::FilePath)]
    pub input: PathBuf,

    /// Target zoning system name
    #[arg(long)]
    pub to: String,

    /// How values are spread across overlapping target zones
    #[arg(long, value_enum, default_value = "weighted")]
    pub weighting: Weighting,

    /// Output pack file
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    pub output: PathBuf,

    /// Overwrite if the file exists
    #[arg(long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct ReportArgs {
    /// Input pack file
    #[arg(value_hint = ValueHint::FilePath)]
    pub input: PathBuf,

    /// Reporting segmentation level name
    #[arg(long)]
    pub segmentation: String,

    /// Sector zoning system name
    #[arg(long)]
    pub sectors: String,

    /// How values are spread across sectors
    #[arg(long, value_enum, default_value = "weighted")]
    pub weighting: Weighting,

    /// Output CSV file
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    pub output: PathBuf,

    /// Overwrite if the file exists
    #[arg(long)]
    pub force: bool,
}
