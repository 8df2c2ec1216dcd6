//! 8-bit formats through the `image` crate.
//!
//! Every input is normalized to RGB8, or RGBA8 when the source has alpha,
//! and flipped into the bottom-to-top buffer order. Stores take byte
//! layers with three or four channels.

use crate::traits::{FormatReader, FormatWriter};
use crate::{IoError, IoResult};
use hdrv_core::{Image, PixelFormat};
use image::{DynamicImage, ImageFormat, RgbImage, RgbaImage};
use std::io::{Cursor, Read, Seek};
use std::path::Path;
use tracing::{debug, trace};

const LOADER: &str = "Image loader";
const EXPORTER: &str = "Image export failed";

/// Target encoding for [`LdrWriter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LdrFormat {
    /// Portable Network Graphics.
    Png,
    /// JPEG; alpha is dropped.
    Jpeg,
    /// Windows bitmap.
    Bmp,
    /// Truevision TGA.
    Tga,
    /// GIF.
    Gif,
    /// Portable anymap.
    Pnm,
}

impl LdrFormat {
    /// Picks the format from a file extension.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Self> {
        let ext = path.as_ref().extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "bmp" => Some(Self::Bmp),
            "tga" => Some(Self::Tga),
            "gif" => Some(Self::Gif),
            "pgm" | "pnm" => Some(Self::Pnm),
            _ => None,
        }
    }

    fn image_format(self) -> ImageFormat {
        match self {
            Self::Png => ImageFormat::Png,
            Self::Jpeg => ImageFormat::Jpeg,
            Self::Bmp => ImageFormat::Bmp,
            Self::Tga => ImageFormat::Tga,
            Self::Gif => ImageFormat::Gif,
            Self::Pnm => ImageFormat::Pnm,
        }
    }
}

/// Options for writing 8-bit files.
#[derive(Debug, Clone, Default)]
pub struct LdrWriterOptions {
    /// Output encoding. `None` picks it from the file extension, PNG in memory.
    pub format: Option<LdrFormat>,
}

/// Reader for every 8-bit format the `image` crate decodes.
#[derive(Debug, Clone, Default)]
pub struct LdrReader;

impl LdrReader {
    /// Creates a new reader.
    pub fn new() -> Self {
        Self
    }
}

impl FormatReader for LdrReader {
    fn format_name(&self) -> &'static str {
        "Image"
    }

    fn can_read(&self, header: &[u8]) -> bool {
        image::guess_format(header).is_ok()
    }

    fn read<P: AsRef<Path>>(&self, path: P) -> IoResult<Image> {
        let path = path.as_ref();
        trace!(path = %path.display(), "ldr::read");
        // extension first: TGA has no magic bytes
        let decoded = image::open(path).map_err(|e| decode_error(e).within(LOADER))?;
        from_dynamic(decoded).map_err(|e| e.within(LOADER))
    }

    fn read_from<R: Read + Seek + Send>(&self, mut reader: R) -> IoResult<Image> {
        let mut bytes = Vec::new();
        reader
            .read_to_end(&mut bytes)
            .map_err(|e| IoError::from(e).within(LOADER))?;
        let decoded = image::load_from_memory(&bytes).map_err(|e| decode_error(e).within(LOADER))?;
        from_dynamic(decoded).map_err(|e| e.within(LOADER))
    }

    fn with_options(_options: ()) -> Self {
        Self
    }
}

/// Writer for byte layers.
#[derive(Debug, Clone, Default)]
pub struct LdrWriter {
    options: LdrWriterOptions,
}

impl LdrWriter {
    /// Creates a writer with default options.
    pub fn new() -> Self {
        Self::default()
    }
}

impl FormatWriter<LdrWriterOptions> for LdrWriter {
    fn write<P: AsRef<Path>>(&self, path: P, image: &Image, layer: usize) -> IoResult<()> {
        let path = path.as_ref();
        let format = match self.options.format.or_else(|| LdrFormat::from_path(path)) {
            Some(format) => format,
            None => {
                return Err(IoError::UnsupportedFormat(path.display().to_string()).within(EXPORTER));
            }
        };
        let bytes = encode(image, layer, format).map_err(|e| e.within(EXPORTER))?;
        std::fs::write(path, bytes).map_err(|e| IoError::from(e).within(EXPORTER))
    }

    fn write_to_memory(&self, image: &Image, layer: usize) -> IoResult<Vec<u8>> {
        let format = self.options.format.unwrap_or(LdrFormat::Png);
        encode(image, layer, format).map_err(|e| e.within(EXPORTER))
    }

    fn with_options(options: LdrWriterOptions) -> Self {
        Self { options }
    }
}

fn decode_error(e: image::ImageError) -> IoError {
    match e {
        image::ImageError::IoError(io) => IoError::Io(io),
        other => IoError::DecodeError(other.to_string()),
    }
}

/// Converts a decoded image into a single byte layer, rows bottom-to-top.
pub fn from_dynamic(decoded: DynamicImage) -> IoResult<Image> {
    let has_alpha = decoded.color().has_alpha();
    let (width, height) = (decoded.width() as usize, decoded.height() as usize);
    let flipped = decoded.flipv();
    let (channels, data) = if has_alpha {
        (4, flipped.to_rgba8().into_raw())
    } else {
        (3, flipped.to_rgb8().into_raw())
    };
    debug!(width, height, channels, "Read LDR image");
    Ok(Image::single(width, height, channels, PixelFormat::Byte, data)?)
}

fn encode(image: &Image, layer: usize, format: LdrFormat) -> IoResult<Vec<u8>> {
    let source = image.try_layer(layer)?;
    if source.format.is_float() {
        return Err(IoError::FormatMismatch(
            "Cannot store HDR image as LDR image.".into(),
        ));
    }
    let channels = source.channel_count();
    if channels != 3 && channels != 4 {
        return Err(IoError::UnsupportedChannels(channels));
    }
    let (width, height) = (image.width(), image.height());
    trace!(width, height, channels, ?format, "ldr::encode");

    // back to top-to-bottom
    let row = width * channels;
    let mut top_down = Vec::with_capacity(source.data.len());
    if row > 0 {
        for chunk in source.data.chunks_exact(row).rev() {
            top_down.extend_from_slice(chunk);
        }
    }

    let too_large = || IoError::EncodeError(format!("{}x{} is too large", width, height));
    let w = u32::try_from(width).map_err(|_| too_large())?;
    let h = u32::try_from(height).map_err(|_| too_large())?;
    let mut dynamic = if channels == 4 {
        DynamicImage::ImageRgba8(RgbaImage::from_raw(w, h, top_down).ok_or_else(too_large)?)
    } else {
        DynamicImage::ImageRgb8(RgbImage::from_raw(w, h, top_down).ok_or_else(too_large)?)
    };
    if format == LdrFormat::Jpeg && channels == 4 {
        dynamic = DynamicImage::ImageRgb8(dynamic.to_rgb8());
    }

    let mut bytes = Vec::new();
    dynamic
        .write_to(&mut Cursor::new(&mut bytes), format.image_format())
        .map_err(|e| IoError::EncodeError(e.to_string()))?;
    Ok(bytes)
}

/// Reads an 8-bit image file.
pub fn read<P: AsRef<Path>>(path: P) -> IoResult<Image> {
    LdrReader::default().read(path)
}

/// Writes `layer` of `image`, choosing the encoding from the extension.
pub fn write<P: AsRef<Path>>(path: P, image: &Image, layer: usize) -> IoResult<()> {
    LdrWriter::default().write(path, image, layer)
}
