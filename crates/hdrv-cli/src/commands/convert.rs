//! Format conversion command.

use crate::ConvertArgs;
use anyhow::{Result, bail};
use tracing::{info, trace};

/// Loads `input` and stores the selected layer to `output`.
pub fn run(args: ConvertArgs) -> Result<()> {
    trace!(
        input = %args.input.display(),
        output = %args.output.display(),
        layer = args.layer,
        "convert"
    );

    let image = super::load_image(&args.input)?;
    if args.layer >= image.layer_count() {
        bail!(
            "Layer {} out of range, {} has {} layer(s)",
            args.layer,
            args.input.display(),
            image.layer_count()
        );
    }

    info!(
        width = image.width(),
        height = image.height(),
        layer = %image.layers()[args.layer].display_name(),
        "Converting image"
    );
    super::save_image(&args.output, &image, args.layer)
}
