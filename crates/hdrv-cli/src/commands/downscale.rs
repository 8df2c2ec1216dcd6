//! Half-resolution downscale command.

use crate::DownscaleArgs;
use anyhow::{Context, Result};
use tracing::{info, trace};

/// Applies `times` box-filter halvings to the primary layer and stores it.
pub fn run(args: DownscaleArgs) -> Result<()> {
    trace!(
        input = %args.input.display(),
        output = %args.output.display(),
        times = args.times,
        "downscale"
    );

    let mut image = super::load_image(&args.input)?;
    for step in 0..args.times {
        image = image
            .scale_by_half()
            .with_context(|| format!("Downscale step {} of {}", step + 1, args.times))?;
        info!(width = image.width(), height = image.height(), "Downscaled");
    }
    super::save_image(&args.output, &image, 0)
}
