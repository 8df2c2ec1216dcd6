//! Portable float map (PFM) support.
//!
//! PFM stores rows bottom-to-top, the same order as layer buffers, so rows
//! move between file and layer without flipping.
//!
//! # Example
//!
//! ```rust,ignore
//! use hdrv_io::pfm;
//!
//! let image = pfm::read("render.pfm")?;
//! pfm::write("copy.pfm", &image, 0)?;
//! ```

mod codec;

pub use codec::{ByteOrder, PfmColor, PfmDecoder, PfmEncoder, PfmHeader};

use crate::traits::{
    FormatReader, FormatWriter, ScanlineReader, ScanlineWriter, append_scanline, scanline_buffer,
};
use crate::{IoError, IoResult};
use hdrv_core::{Image, Layer};
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;
use tracing::{debug, trace};

const LOADER: &str = "PFM loader";
const EXPORTER: &str = "PFM export failed";

/// Options for writing PFM files.
#[derive(Debug, Clone, Default)]
pub struct PfmWriterOptions {
    /// Sample byte order. Default: host order.
    pub byte_order: ByteOrder,
}

/// PFM format reader.
#[derive(Debug, Clone, Default)]
pub struct PfmReader;

impl PfmReader {
    /// Creates a new PFM reader.
    pub fn new() -> Self {
        Self
    }
}

impl FormatReader for PfmReader {
    fn format_name(&self) -> &'static str {
        "PFM"
    }

    fn can_read(&self, header: &[u8]) -> bool {
        header.len() >= 3
            && header[0] == b'P'
            && (header[1] == b'F' || header[1] == b'f')
            && header[2].is_ascii_whitespace()
    }

    fn read<P: AsRef<Path>>(&self, path: P) -> IoResult<Image> {
        let file = File::open(path.as_ref()).map_err(|e| IoError::from(e).within(LOADER))?;
        self.read_from(BufReader::new(file))
    }

    fn read_from<R: Read + Seek + Send>(&self, reader: R) -> IoResult<Image> {
        load(PfmDecoder::new(BufReader::new(reader))).map_err(|e| e.within(LOADER))
    }

    fn with_options(_options: ()) -> Self {
        Self
    }
}

/// PFM format writer.
#[derive(Debug, Clone, Default)]
pub struct PfmWriter {
    options: PfmWriterOptions,
}

impl PfmWriter {
    /// Creates a new PFM writer with default options.
    pub fn new() -> Self {
        Self::default()
    }
}

impl FormatWriter<PfmWriterOptions> for PfmWriter {
    fn write_to_memory(&self, image: &Image, layer: usize) -> IoResult<Vec<u8>> {
        let mut encoder = PfmEncoder::new(Vec::new());
        store(&mut encoder, image, layer, self.options.byte_order).map_err(|e| e.within(EXPORTER))?;
        Ok(encoder.into_inner())
    }

    fn with_options(options: PfmWriterOptions) -> Self {
        Self { options }
    }
}

/// Decodes a whole image from a PFM scanline source.
pub fn load<S>(mut source: S) -> IoResult<Image>
where
    S: ScanlineReader<Header = PfmHeader, Sample = f32>,
{
    let header = source.read_header()?;
    let channels = header.color.channels();
    let (width, height) = (header.width, header.height);
    trace!(width, height, channels, byte_order = ?header.byte_order, "pfm::load");

    let row_len = width
        .checked_mul(channels)
        .filter(|n| n.checked_mul(height).is_some())
        .ok_or_else(|| IoError::InvalidHeader(format!("dimensions {}x{}", width, height)))?;

    let mut samples = Vec::new();
    if row_len > 0 {
        let mut row = scanline_buffer::<f32>(row_len)?;
        // file rows are already bottom-to-top
        for _ in 0..height {
            source.read_scanline(&mut row)?;
            append_scanline(&mut samples, &row)?;
        }
    }

    debug!(width, height, channels, "Read PFM");
    let layer = Layer::single_floats(channels, &samples)?;
    Ok(Image::new(width, height, vec![layer])?)
}

/// Encodes `layer` of `image` into a PFM scanline sink.
///
/// One-channel layers become grayscale `Pf`, layers with three or more
/// channels become color `PF` built from the first three channels.
pub fn store<S>(sink: &mut S, image: &Image, layer: usize, byte_order: ByteOrder) -> IoResult<()>
where
    S: ScanlineWriter<Header = PfmHeader, Sample = f32>,
{
    let source = image.try_layer(layer)?;
    if !source.format.is_float() {
        return Err(IoError::FormatMismatch(
            "Cannot store LDR image as HDR image.".into(),
        ));
    }
    let color = match source.channel_count() {
        1 => PfmColor::Grayscale,
        n if n >= 3 => PfmColor::Color,
        n => return Err(IoError::UnsupportedChannels(n)),
    };
    let channels = color.channels();
    let (width, height) = (image.width(), image.height());
    trace!(width, height, channels, layer, "pfm::store");

    sink.write_header(&PfmHeader {
        color,
        width,
        height,
        byte_order,
        scale: 1.0,
    })?;

    let mut row = vec![0.0f32; width * channels];
    // bottom visual row first
    for y in (0..height).rev() {
        for x in 0..width {
            for c in 0..channels {
                row[x * channels + c] = image.value(x, y, c, layer);
            }
        }
        sink.write_scanline(&row)?;
    }
    Ok(())
}

/// Reads a PFM file with default options.
pub fn read<P: AsRef<Path>>(path: P) -> IoResult<Image> {
    PfmReader::default().read(path)
}

/// Writes `layer` of `image` to a PFM file in host byte order.
pub fn write<P: AsRef<Path>>(path: P, image: &Image, layer: usize) -> IoResult<()> {
    PfmWriter::default().write(path, image, layer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hdrv_core::PixelFormat;

    /// In-memory PFM source yielding rows in file order.
    struct FakeSource {
        header: PfmHeader,
        rows: Vec<Vec<f32>>,
        next: usize,
    }

    impl ScanlineReader for FakeSource {
        type Header = PfmHeader;
        type Sample = f32;

        fn read_header(&mut self) -> IoResult<PfmHeader> {
            Ok(self.header.clone())
        }

        fn read_scanline(&mut self, row: &mut [f32]) -> IoResult<()> {
            row.copy_from_slice(&self.rows[self.next]);
            self.next += 1;
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakeSink {
        header: Option<PfmHeader>,
        rows: Vec<Vec<f32>>,
    }

    impl ScanlineWriter for FakeSink {
        type Header = PfmHeader;
        type Sample = f32;

        fn write_header(&mut self, header: &PfmHeader) -> IoResult<()> {
            self.header = Some(header.clone());
            Ok(())
        }

        fn write_scanline(&mut self, row: &[f32]) -> IoResult<()> {
            self.rows.push(row.to_vec());
            Ok(())
        }
    }

    fn header(color: PfmColor, width: usize, height: usize) -> PfmHeader {
        PfmHeader {
            color,
            width,
            height,
            byte_order: ByteOrder::Little,
            scale: 1.0,
        }
    }

    #[test]
    fn first_file_row_is_visual_bottom() {
        let source = FakeSource {
            header: header(PfmColor::Grayscale, 2, 2),
            rows: vec![vec![1.0, 2.0], vec![3.0, 4.0]],
            next: 0,
        };
        let image = load(source).unwrap();
        assert_eq!(image.value(0, 1, 0, 0), 1.0);
        assert_eq!(image.value(1, 1, 0, 0), 2.0);
        assert_eq!(image.value(0, 0, 0, 0), 3.0);
        assert_eq!(image.value(1, 0, 0, 0), 4.0);
    }

    #[test]
    fn color_loads_three_channels() {
        let source = FakeSource {
            header: header(PfmColor::Color, 1, 1),
            rows: vec![vec![0.1, 0.2, 0.3]],
            next: 0,
        };
        let image = load(source).unwrap();
        assert_eq!(image.channels(0), 3);
        assert_eq!(image.channel_name(0, 2), "B");
        assert_eq!(image.value(0, 0, 2, 0), 0.3);
    }

    #[test]
    fn store_writes_bottom_row_first() {
        let layer = Layer::single_floats(1, &[1.0, 2.0, 3.0, 4.0]).unwrap();
        let image = Image::new(2, 2, vec![layer]).unwrap();
        let mut sink = FakeSink::default();
        store(&mut sink, &image, 0, ByteOrder::Big).unwrap();

        let header = sink.header.unwrap();
        assert_eq!(header.color, PfmColor::Grayscale);
        assert_eq!(header.byte_order, ByteOrder::Big);
        assert_eq!(sink.rows, vec![vec![1.0, 2.0], vec![3.0, 4.0]]);
    }

    #[test]
    fn store_drops_alpha() {
        let layer = Layer::single_floats(4, &[1.0, 2.0, 3.0, 4.0]).unwrap();
        let image = Image::new(1, 1, vec![layer]).unwrap();
        let mut sink = FakeSink::default();
        store(&mut sink, &image, 0, ByteOrder::Little).unwrap();
        assert_eq!(sink.header.unwrap().color, PfmColor::Color);
        assert_eq!(sink.rows, vec![vec![1.0, 2.0, 3.0]]);
    }

    #[test]
    fn store_rejects_byte_layer() {
        let image = Image::single(1, 1, 3, PixelFormat::Byte, vec![1, 2, 3]).unwrap();
        let mut sink = FakeSink::default();
        let err = store(&mut sink, &image, 0, ByteOrder::Little).unwrap_err();
        assert!(matches!(err, IoError::FormatMismatch(_)));
        assert!(sink.header.is_none());
    }

    #[test]
    fn store_rejects_two_channels() {
        let layer = Layer::single_floats(2, &[1.0, 2.0]).unwrap();
        let image = Image::new(1, 1, vec![layer]).unwrap();
        let mut sink = FakeSink::default();
        assert!(matches!(
            store(&mut sink, &image, 0, ByteOrder::Little),
            Err(IoError::UnsupportedChannels(2))
        ));
    }

    #[test]
    fn memory_roundtrip_big_endian() {
        let samples: Vec<f32> = (0..12).map(|i| i as f32 * 0.5 - 2.0).collect();
        let layer = Layer::single_floats(3, &samples).unwrap();
        let image = Image::new(2, 2, vec![layer]).unwrap();

        let writer = PfmWriter::with_options(PfmWriterOptions {
            byte_order: ByteOrder::Big,
        });
        let bytes = writer.write_to_memory(&image, 0).unwrap();
        assert!(bytes.starts_with(b"PF\n2 2\n1\n"));

        let loaded = PfmReader::new().read_from_memory(&bytes).unwrap();
        assert_eq!(loaded, image);
    }

    #[test]
    fn truncated_pixel_data_is_an_error() {
        let err = PfmReader::new()
            .read_from_memory(b"PF\n1000000 1000000\n-1\n\0\0\0\0")
            .unwrap_err();
        assert!(err.to_string().starts_with("PFM loader: "));

        // one of two rows present
        let bytes = b"Pf\n1 2\n-1\n\0\0\x80\x3f";
        assert!(PfmReader::new().read_from_memory(bytes).is_err());
    }

    #[test]
    fn oversized_header_is_an_error() {
        let err = PfmReader::new()
            .read_from_memory(b"PF\n1152921504606846976 1\n-1\n\0\0\0\0")
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "PFM loader: invalid header: scanline of 3458764513820540928 samples is too large"
        );

        let err = PfmReader::new()
            .read_from_memory(b"PF\n6148914691236517206 2\n-1\n")
            .unwrap_err();
        assert!(err.to_string().contains("invalid header: dimensions"));
    }

    #[test]
    fn errors_carry_prefix() {
        let err = PfmReader::new().read_from_memory(b"P6\n1 1\n255\n").unwrap_err();
        assert!(err.to_string().starts_with("PFM loader: "));
    }
}
