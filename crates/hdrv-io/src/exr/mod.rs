//! OpenEXR format support.
//!
//! Loading reconstructs one [`Layer`] per channel prefix (see
//! [`grouping`]) and lets the container deposit every channel straight into
//! its interleaved, bottom-to-top layer buffer through a [`FrameBuffer`].
//! Storing writes one layer as half-float RGBA.
//!
//! # Example
//!
//! ```rust,ignore
//! use hdrv_io::exr;
//!
//! let image = exr::read("render.exr")?;
//! for layer in image.layers() {
//!     println!("{}", layer.display_name());
//! }
//! ```

mod codec;
pub mod frame;
pub mod grouping;

pub use codec::{ExrDecoder, ExrEncoder};
pub use frame::{ChannelSink, ChannelSource, DataWindow, FrameBuffer, Slice};
pub use grouping::{ChannelGroup, group_channels};

use crate::traits::{FormatReader, FormatWriter};
use crate::{IoError, IoResult};
use hdrv_core::{Image, Layer, PixelFormat};
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;
use tracing::{debug, trace};

const LOADER: &str = "OpenEXR loader";
const EXPORTER: &str = "OpenEXR export failed";

/// EXR compression method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Compression {
    /// No compression.
    None,
    /// Run-length encoding.
    Rle,
    /// ZIP, one scanline per block.
    Zips,
    /// ZIP, 16 scanlines per block.
    #[default]
    Zip,
    /// Wavelet (lossless, good for noisy images).
    Piz,
    /// Lossy 24-bit float.
    Pxr24,
    /// Lossy 4x4 block compression.
    B44,
}

/// Options for writing OpenEXR files.
#[derive(Debug, Clone, Default)]
pub struct ExrWriterOptions {
    /// Compression method. Default: ZIP.
    pub compression: Compression,
}

/// OpenEXR reader.
#[derive(Debug, Clone, Default)]
pub struct ExrReader;

impl ExrReader {
    /// Creates a new reader.
    pub fn new() -> Self {
        Self
    }
}

impl FormatReader for ExrReader {
    fn format_name(&self) -> &'static str {
        "OpenEXR"
    }

    fn can_read(&self, header: &[u8]) -> bool {
        header.starts_with(&[0x76, 0x2f, 0x31, 0x01])
    }

    fn read<P: AsRef<Path>>(&self, path: P) -> IoResult<Image> {
        let file = File::open(path.as_ref()).map_err(|e| IoError::from(e).within(LOADER))?;
        self.read_from(BufReader::new(file))
    }

    fn read_from<R: Read + Seek + Send>(&self, reader: R) -> IoResult<Image> {
        ExrDecoder::new(reader)
            .and_then(load)
            .map_err(|e| e.within(LOADER))
    }

    fn with_options(_options: ()) -> Self {
        Self
    }
}

/// OpenEXR writer.
#[derive(Debug, Clone, Default)]
pub struct ExrWriter {
    options: ExrWriterOptions,
}

impl ExrWriter {
    /// Creates a writer with default options.
    pub fn new() -> Self {
        Self::default()
    }
}

impl FormatWriter<ExrWriterOptions> for ExrWriter {
    fn write_to_memory(&self, image: &Image, layer: usize) -> IoResult<Vec<u8>> {
        let mut encoder = ExrEncoder::new(self.options.compression);
        store(&mut encoder, image, layer).map_err(|e| e.within(EXPORTER))?;
        Ok(encoder.into_inner())
    }

    fn with_options(options: ExrWriterOptions) -> Self {
        Self { options }
    }
}

/// Builds an image with one float layer per channel group of `source`.
pub fn load<S: ChannelSource>(mut source: S) -> IoResult<Image> {
    let window = source.data_window();
    let (width, height) = (window.width, window.height);
    let groups = group_channels(source.channel_names());
    if groups.is_empty() {
        return Err(IoError::DecodeError("no channels".into()));
    }
    trace!(width, height, origin = ?window.origin, layers = groups.len(), "exr::load");

    let mut layers = Vec::with_capacity(groups.len());
    for group in groups {
        let channels = group.channels.len();
        let pixel_bytes = channels * 4;
        let row_bytes = width
            .checked_mul(pixel_bytes)
            .ok_or_else(|| IoError::InvalidHeader(format!("dimensions {}x{}", width, height)))?;
        let size = row_bytes
            .checked_mul(height)
            .ok_or_else(|| IoError::InvalidHeader(format!("dimensions {}x{}", width, height)))?;
        let (Ok(x_stride), Ok(y_stride)) =
            (isize::try_from(pixel_bytes), isize::try_from(row_bytes))
        else {
            return Err(IoError::InvalidHeader(format!("dimensions {}x{}", width, height)));
        };

        let mut data = vec![0u8; size];
        {
            let mut frame = FrameBuffer::new(&mut data);
            // file row 0 lands on the last buffer row
            let top = row_bytes * height.saturating_sub(1);
            for (c, channel) in group.channels.iter().enumerate() {
                frame.insert(Slice {
                    channel: group.full_name(channel),
                    base: top + c * 4,
                    x_stride,
                    y_stride: -y_stride,
                });
            }
            source.read_pixels(&mut frame)?;
        }

        debug!(layer = %group.display_name(), channels, "Read EXR layer");
        layers.push(Layer::new(
            group.prefix,
            group.channels,
            PixelFormat::Float,
            data,
        ));
    }

    Ok(Image::new(width, height, layers)?)
}

/// Writes `layer` of `image` as RGBA planes, top row first.
///
/// Missing green and blue repeat the first channel, missing alpha is 1.0.
pub fn store<S: ChannelSink>(sink: &mut S, image: &Image, layer: usize) -> IoResult<()> {
    let source = image.try_layer(layer)?;
    if !source.format.is_float() {
        return Err(IoError::FormatMismatch(
            "Cannot store LDR image as HDR image.".into(),
        ));
    }
    let channels = source.channel_count();
    let (width, height) = (image.width(), image.height());
    trace!(width, height, layer, channels, "exr::store");

    let plane = |c: Option<usize>, fill: f32| -> Vec<f32> {
        let mut out = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                out.push(c.map_or(fill, |c| image.value(x, y, c, layer)));
            }
        }
        out
    };
    let pick = |c: usize| Some(if c < channels { c } else { 0 });

    let planes = vec![
        ("R", plane(Some(0), 0.0)),
        ("G", plane(pick(1), 0.0)),
        ("B", plane(pick(2), 0.0)),
        ("A", plane((channels > 3).then_some(3), 1.0)),
    ];
    sink.write_channels(width, height, planes)
}

/// Reads an OpenEXR file.
pub fn read<P: AsRef<Path>>(path: P) -> IoResult<Image> {
    ExrReader::default().read(path)
}

/// Writes `layer` of `image` to an OpenEXR file with default options.
pub fn write<P: AsRef<Path>>(path: P, image: &Image, layer: usize) -> IoResult<()> {
    ExrWriter::default().write(path, image, layer)
}
