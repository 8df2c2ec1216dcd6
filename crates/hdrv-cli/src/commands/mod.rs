//! CLI command implementations

pub mod convert;
pub mod downscale;
pub mod info;

use anyhow::{Context, Result};
use hdrv_core::Image;
use std::path::Path;

/// Load image from path
pub fn load_image(path: &Path) -> Result<Image> {
    hdrv_io::load(path).with_context(|| format!("Failed to load: {}", path.display()))
}

/// Save one layer of an image to path
pub fn save_image(path: &Path, image: &Image, layer: usize) -> Result<()> {
    hdrv_io::store(path, image, layer)
        .with_context(|| format!("Failed to save: {}", path.display()))
}

/// Format file size for display
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
