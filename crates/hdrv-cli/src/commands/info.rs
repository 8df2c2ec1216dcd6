//! Image info command.
//!
//! Prints dimensions and the layer/channel structure, optionally with
//! per-channel statistics and a texel readout.

use crate::InfoArgs;
use anyhow::{Context, Result, bail};
use hdrv_core::Image;
use hdrv_io::Format;
use std::fs;
use tracing::trace;

/// Runs the info command for every input.
pub fn run(args: InfoArgs, verbose: bool) -> Result<()> {
    let pixel = args.pixel.as_deref().map(parse_pixel).transpose()?;

    for path in &args.input {
        trace!(input = %path.display(), "info");
        let file_size = fs::metadata(path)
            .with_context(|| format!("Failed to load: {}", path.display()))?
            .len();
        let format = Format::detect(path).unwrap_or(Format::Unknown);
        let image = super::load_image(path)?;

        println!("{}", path.display());
        println!("  Format:     {:?}", format);
        println!("  Resolution: {}x{}", image.width(), image.height());
        println!("  File size:  {}", super::format_size(file_size));
        println!("  Layers:     {}", image.layer_count());

        for (index, layer) in image.layers().iter().enumerate() {
            println!(
                "    [{}] {} ({} x {:?})",
                index,
                layer.display_name(),
                layer.channel_count(),
                layer.format
            );
            if verbose {
                println!("        {}", super::format_size(image.size_in_bytes(index) as u64));
            }
            if args.stats {
                for (c, stats) in channel_stats(&image, index).iter().enumerate() {
                    println!(
                        "        {:<6} min {:<12.6} max {:<12.6} mean {:.6}",
                        image.channel_name(index, c),
                        stats.min,
                        stats.max,
                        stats.mean
                    );
                }
            }
            if let Some((x, y)) = pixel {
                if x >= image.width() || y >= image.height() {
                    bail!(
                        "Pixel {},{} is outside {}x{}",
                        x,
                        y,
                        image.width(),
                        image.height()
                    );
                }
                println!("        texel {:?}", image.texel(x, y, index));
            }
        }

        if args.input.len() > 1 {
            println!();
        }
    }

    Ok(())
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct ChannelStats {
    min: f32,
    max: f32,
    mean: f32,
}

fn channel_stats(image: &Image, layer: usize) -> Vec<ChannelStats> {
    let count = image.width() * image.height();
    (0..image.channels(layer))
        .map(|c| {
            let mut min = f32::INFINITY;
            let mut max = f32::NEG_INFINITY;
            let mut sum = 0.0f64;
            for y in 0..image.height() {
                for x in 0..image.width() {
                    let v = image.value(x, y, c, layer);
                    min = min.min(v);
                    max = max.max(v);
                    sum += v as f64;
                }
            }
            if count == 0 {
                return ChannelStats::default();
            }
            ChannelStats {
                min,
                max,
                mean: (sum / count as f64) as f32,
            }
        })
        .collect()
}

fn parse_pixel(text: &str) -> Result<(usize, usize)> {
    let Some((x, y)) = text.split_once(',') else {
        bail!("Expected X,Y, got '{}'", text);
    };
    let x = x.trim().parse().with_context(|| format!("Invalid x in '{}'", text))?;
    let y = y.trim().parse().with_context(|| format!("Invalid y in '{}'", text))?;
    Ok((x, y))
}
