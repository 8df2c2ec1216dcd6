//! hdrv - inspect, convert and downscale HDR images
//!
//! Thin front end over `hdrv-io`: every command loads through
//! [`hdrv_io::load`], stores through [`hdrv_io::store`] and reports the
//! adapter's error text.

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "hdrv")]
#[command(author, version, about = "Inspect, convert and downscale HDR images")]
#[command(long_about = "hdrv reads PFM, Radiance HDR, OpenEXR and common 8-bit formats.

Examples:
  hdrv info render.exr
  hdrv info --stats --pixel 10,20 render.exr
  hdrv convert render.exr render.hdr
  hdrv convert --layer 1 render.exr depth.pfm
  hdrv downscale -n 2 render.exr -o quarter.exr")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log progress (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Display resolution, layers and channels
    #[command(visible_alias = "i")]
    Info(InfoArgs),

    /// Convert between formats, picking the output by extension
    #[command(visible_alias = "c")]
    Convert(ConvertArgs),

    /// Halve resolution with a box filter
    #[command(visible_alias = "d")]
    Downscale(DownscaleArgs),
}

#[derive(Args)]
struct InfoArgs {
    /// Input image(s)
    #[arg(required = true)]
    input: Vec<PathBuf>,

    /// Per-channel min/max/mean for every layer
    #[arg(short, long)]
    stats: bool,

    /// Print the texel at X,Y (top-left origin) for every layer
    #[arg(short, long, value_name = "X,Y")]
    pixel: Option<String>,
}

#[derive(Args)]
struct ConvertArgs {
    /// Input file
    input: PathBuf,

    /// Output file
    output: PathBuf,

    /// Layer to store
    #[arg(short, long, default_value = "0")]
    layer: usize,
}

#[derive(Args)]
struct DownscaleArgs {
    /// Input file
    input: PathBuf,

    /// Output file
    #[arg(short, long)]
    output: PathBuf,

    /// Number of halvings
    #[arg(short = 'n', long, default_value = "1")]
    times: u32,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Info(args) => commands::info::run(args, cli.verbose),
        Commands::Convert(args) => commands::convert::run(args),
        Commands::Downscale(args) => commands::downscale::run(args),
    }
}
