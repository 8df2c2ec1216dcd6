//! # hdrv-io
//!
//! Image I/O for hdrv.
//!
//! Every adapter translates between one container format and the layered
//! [`Image`] model of `hdrv-core`:
//!
//! - **PFM** - portable float map, grayscale or RGB `f32`
//! - **HDR** - Radiance RGBE (`32-bit_rle_rgbe`, `-Y +X`)
//! - **EXR** - OpenEXR, any channel set, reconstructed into layers
//! - **LDR** - PNG, JPEG, BMP, TGA, GIF, PNM through the `image` crate
//!
//! # Architecture
//!
//! - [`FormatReader`] / [`FormatWriter`] - per-format whole-image traits
//! - [`ScanlineReader`] / [`ScanlineWriter`] - the narrow codec surface the
//!   PFM and HDR adapters are written against
//! - [`exr::ChannelSource`] - the frame-buffer surface of the EXR adapter
//! - [`load`] / [`store`] - dispatch by magic bytes and extension
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use hdrv_io::{load, store};
//!
//! let image = load("input.exr")?;
//! store("output.hdr", &image, 0)?;
//! ```
//!
//! # Coordinates
//!
//! Layer buffers hold rows bottom-to-top. Adapters flip rows for containers
//! that store the top row first (HDR, EXR, LDR) and copy them as-is for PFM,
//! so `image.value(x, 0, c, l)` is always the visual top row.
//!
//! # Errors
//!
//! Failures inside an adapter carry its name as a prefix, e.g.
//! `"Radiance PIC loader: format '32-bit_rle_xyze' not supported"`. Writers
//! encode into memory before touching the destination, so a rejected store
//! never creates or truncates a file. An OS error during the final write can
//! still leave a partial file.
//!
//! # Feature Flags
//!
//! - `pfm` - PFM support (default)
//! - `hdr` - Radiance HDR support (default)
//! - `exr` - OpenEXR support (default)
//! - `ldr` - 8-bit formats via the `image` crate (default)

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod detect;
mod error;
pub mod traits;

#[cfg(feature = "exr")]
pub mod exr;

#[cfg(feature = "hdr")]
pub mod hdr;

#[cfg(feature = "ldr")]
pub mod ldr;

#[cfg(feature = "pfm")]
pub mod pfm;

pub use detect::Format;
pub use error::{IoError, IoResult};
pub use traits::{FormatReader, FormatWriter, ScanlineReader, ScanlineWriter};

pub use hdrv_core::{Image, Layer, PixelFormat};

use std::path::Path;
use tracing::debug;

/// Loads an image, choosing the adapter by magic bytes, then extension.
///
/// Files no other adapter claims go to the 8-bit loader.
///
/// # Errors
///
/// [`IoError::NotFound`] if `path` does not exist, otherwise whatever the
/// chosen adapter reports.
pub fn load<P: AsRef<Path>>(path: P) -> IoResult<Image> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(IoError::NotFound(path.display().to_string()));
    }
    let format = Format::detect(path)?;
    debug!(path = %path.display(), ?format, "load");

    let image = match format {
        #[cfg(feature = "pfm")]
        Format::Pfm => pfm::read(path),

        #[cfg(feature = "hdr")]
        Format::Hdr => hdr::read(path),

        #[cfg(feature = "exr")]
        Format::Exr => self::exr::read(path),

        #[cfg(feature = "ldr")]
        Format::Ldr | Format::Unknown => ldr::read(path),

        #[allow(unreachable_patterns)]
        _ => Err(IoError::UnsupportedFormat(extension_of(path))),
    }?;

    debug!(
        width = image.width(),
        height = image.height(),
        layers = image.layer_count(),
        "Loaded image"
    );
    Ok(image)
}

/// Loads an image from memory.
///
/// The float readers are asked in turn whether they recognize the leading
/// bytes; anything else goes to the 8-bit loader.
pub fn load_from_memory(bytes: &[u8]) -> IoResult<Image> {
    let found: Option<IoResult<Image>> = None;

    #[cfg(feature = "pfm")]
    let found = found.or_else(|| read_if_recognized(&pfm::PfmReader::new(), bytes));

    #[cfg(feature = "hdr")]
    let found = found.or_else(|| read_if_recognized(&hdr::HdrReader::new(), bytes));

    #[cfg(feature = "exr")]
    let found = found.or_else(|| read_if_recognized(&self::exr::ExrReader::new(), bytes));

    #[cfg(feature = "ldr")]
    let found = found.or_else(|| Some(ldr::LdrReader::new().read_from_memory(bytes)));

    found.unwrap_or_else(|| Err(IoError::UnsupportedFormat("unrecognized data".into())))
}

fn read_if_recognized<R: FormatReader>(reader: &R, bytes: &[u8]) -> Option<IoResult<Image>> {
    if !reader.can_read(bytes) {
        return None;
    }
    debug!(len = bytes.len(), format = reader.format_name(), "load_from_memory");
    Some(reader.read_from_memory(bytes))
}

/// Stores `layer` of `image`, choosing the container by extension.
///
/// # Errors
///
/// [`IoError::UnsupportedFormat`] for an unknown extension; otherwise the
/// adapter's validation or encoding error. In every error case except a
/// failing final OS write the destination is left untouched.
pub fn store<P: AsRef<Path>>(path: P, image: &Image, layer: usize) -> IoResult<()> {
    let path = path.as_ref();
    let format = Format::from_extension(path);
    debug!(path = %path.display(), ?format, layer, "store");

    match format {
        #[cfg(feature = "pfm")]
        Format::Pfm => pfm::write(path, image, layer),

        #[cfg(feature = "hdr")]
        Format::Hdr => hdr::write(path, image, layer),

        #[cfg(feature = "exr")]
        Format::Exr => self::exr::write(path, image, layer),

        #[cfg(feature = "ldr")]
        Format::Ldr => ldr::write(path, image, layer),

        #[allow(unreachable_patterns)]
        _ => Err(IoError::UnsupportedFormat(extension_of(path))),
    }
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("unknown")
        .to_string()
}
