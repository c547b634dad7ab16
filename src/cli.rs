use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "brandhealth",
    version,
    about = "Brand health CSV extraction and reconciliation tooling"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Extract(ExtractArgs),
    Validate(ValidateArgs),
    Correct(CorrectArgs),
    Status(StatusArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ExtractArgs {
    #[arg(long, default_value = ".cache/brandhealth")]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub csv_path: PathBuf,

    #[arg(long)]
    pub snapshot_path: Option<PathBuf>,

    #[arg(long)]
    pub manifest_path: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct ValidateArgs {
    #[arg(long, default_value = ".cache/brandhealth")]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub csv_path: PathBuf,

    #[arg(long)]
    pub baseline_path: Option<PathBuf>,

    #[arg(long, default_value_t = 0.1)]
    pub tolerance: f64,

    #[arg(long, default_value_t = false)]
    pub report_missing: bool,

    #[arg(long)]
    pub report_path: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct CorrectArgs {
    #[arg(long, default_value = ".cache/brandhealth")]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub snapshot_path: Option<PathBuf>,

    #[arg(long)]
    pub corrections_path: PathBuf,

    #[arg(long)]
    pub out_path: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[arg(long, default_value = ".cache/brandhealth")]
    pub cache_root: PathBuf,
}
