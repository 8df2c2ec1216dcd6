//! Radiance HDR (RGBE) format support.
//!
//! Only the `32-bit_rle_rgbe` encoding in the standard `-Y +X` orientation
//! is loaded. Files store the top row first, so rows are flipped on the way
//! into and out of the bottom-to-top layer buffer.

mod codec;
pub mod rgbe;

pub use codec::{HdrDecoder, HdrEncoder, HdrFormat, HdrHeader, Orientation};

use crate::traits::{
    FormatReader, FormatWriter, ScanlineReader, ScanlineWriter, append_scanline, scanline_buffer,
};
use crate::{IoError, IoResult};
use hdrv_core::{Image, Layer};
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;
use tracing::{debug, trace};

const LOADER: &str = "Radiance PIC loader";
const EXPORTER: &str = "Radiance PIC export failed";

/// Options for writing Radiance files.
#[derive(Debug, Clone)]
pub struct HdrWriterOptions {
    /// Value of the `EXPOSURE=` header line. Samples are not rescaled.
    pub exposure: f32,
    /// Run-length encode scanlines (when the width allows it).
    pub rle: bool,
}

impl Default for HdrWriterOptions {
    fn default() -> Self {
        Self {
            exposure: 1.0,
            rle: true,
        }
    }
}

/// Radiance HDR reader.
#[derive(Debug, Clone, Default)]
pub struct HdrReader;

impl HdrReader {
    /// Creates a new reader.
    pub fn new() -> Self {
        Self
    }
}

impl FormatReader for HdrReader {
    fn format_name(&self) -> &'static str {
        "Radiance HDR"
    }

    fn can_read(&self, header: &[u8]) -> bool {
        header.starts_with(b"#?")
    }

    fn read<P: AsRef<Path>>(&self, path: P) -> IoResult<Image> {
        let file = File::open(path.as_ref()).map_err(|e| IoError::from(e).within(LOADER))?;
        self.read_from(file)
    }

    fn read_from<R: Read + Seek + Send>(&self, reader: R) -> IoResult<Image> {
        load(HdrDecoder::new(BufReader::new(reader))).map_err(|e| e.within(LOADER))
    }

    fn with_options(_options: ()) -> Self {
        Self
    }
}

/// Radiance HDR writer.
#[derive(Debug, Clone, Default)]
pub struct HdrWriter {
    options: HdrWriterOptions,
}

impl HdrWriter {
    /// Creates a writer with default options.
    pub fn new() -> Self {
        Self::default()
    }
}

impl FormatWriter<HdrWriterOptions> for HdrWriter {
    fn write_to_memory(&self, image: &Image, layer: usize) -> IoResult<Vec<u8>> {
        let mut encoder = HdrEncoder::new(Vec::new(), self.options.rle);
        store(&mut encoder, image, layer, self.options.exposure).map_err(|e| e.within(EXPORTER))?;
        Ok(encoder.into_inner())
    }

    fn with_options(options: HdrWriterOptions) -> Self {
        Self { options }
    }
}

/// Decodes a whole image from an RGBE scanline source.
///
/// The header's exposure is reported but not applied to the samples.
pub fn load<S>(mut source: S) -> IoResult<Image>
where
    S: ScanlineReader<Header = HdrHeader, Sample = [u8; 4]>,
{
    let header = source.read_header()?;
    if header.format != HdrFormat::Rle32Rgbe {
        return Err(IoError::UnsupportedVariant(format!(
            "format '{}'",
            header.format.name()
        )));
    }
    if header.orientation != Orientation::NegYPosX {
        return Err(IoError::UnsupportedVariant(format!(
            "resolution type '{}'",
            header.orientation
        )));
    }

    let (width, height) = (header.width, header.height);
    trace!(width, height, exposure = header.exposure, "hdr::load");
    let row_len = width
        .checked_mul(3)
        .filter(|n| n.checked_mul(height).is_some())
        .ok_or_else(|| IoError::InvalidHeader(format!("dimensions {}x{}", width, height)))?;

    // collected top row first, reversed once complete
    let mut top_down = Vec::new();
    if row_len > 0 {
        let mut scanline = scanline_buffer::<[u8; 4]>(width)?;
        let mut decoded = scanline_buffer::<f32>(row_len)?;
        for _ in 0..height {
            source.read_scanline(&mut scanline)?;
            for (px, quad) in decoded.chunks_exact_mut(3).zip(&scanline) {
                px.copy_from_slice(&rgbe::decode(*quad));
            }
            append_scanline(&mut top_down, &decoded)?;
        }
    }
    let mut samples = Vec::with_capacity(top_down.len());
    if row_len > 0 {
        for row in top_down.chunks_exact(row_len).rev() {
            samples.extend_from_slice(row);
        }
    }

    debug!(width, height, "Read Radiance HDR");
    let layer = Layer::single_floats(3, &samples)?;
    Ok(Image::new(width, height, vec![layer])?)
}

/// Encodes `layer` of `image` into an RGBE scanline sink, top row first.
///
/// Grayscale layers are replicated into all three components; layers with
/// more than three channels keep the first three.
pub fn store<S>(sink: &mut S, image: &Image, layer: usize, exposure: f32) -> IoResult<()>
where
    S: ScanlineWriter<Header = HdrHeader, Sample = [u8; 4]>,
{
    let source = image.try_layer(layer)?;
    if !source.format.is_float() {
        return Err(IoError::FormatMismatch(
            "Cannot store LDR image as HDR image.".into(),
        ));
    }
    let map: [usize; 3] = match source.channel_count() {
        1 => [0, 0, 0],
        n if n >= 3 => [0, 1, 2],
        n => return Err(IoError::UnsupportedChannels(n)),
    };
    let (width, height) = (image.width(), image.height());
    trace!(width, height, layer, exposure, "hdr::store");

    sink.write_header(&HdrHeader {
        format: HdrFormat::Rle32Rgbe,
        exposure: exposure as f64,
        orientation: Orientation::NegYPosX,
        width,
        height,
    })?;

    let mut scanline = vec![[0u8; 4]; width];
    for y in 0..height {
        for (x, quad) in scanline.iter_mut().enumerate() {
            *quad = rgbe::encode(map.map(|c| image.value(x, y, c, layer)));
        }
        sink.write_scanline(&scanline)?;
    }
    Ok(())
}

/// Reads a Radiance HDR file.
pub fn read<P: AsRef<Path>>(path: P) -> IoResult<Image> {
    HdrReader::default().read(path)
}

/// Writes `layer` of `image` to a Radiance HDR file with default options.
pub fn write<P: AsRef<Path>>(path: P, image: &Image, layer: usize) -> IoResult<()> {
    HdrWriter::default().write(path, image, layer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hdrv_core::PixelFormat;

    struct FakeSource {
        header: HdrHeader,
        rows: Vec<Vec<[u8; 4]>>,
        next: usize,
    }

    impl FakeSource {
        fn new(header: HdrHeader, rows: Vec<Vec<[u8; 4]>>) -> Self {
            Self {
                header,
                rows,
                next: 0,
            }
        }
    }

    impl ScanlineReader for FakeSource {
        type Header = HdrHeader;
        type Sample = [u8; 4];

        fn read_header(&mut self) -> IoResult<HdrHeader> {
            Ok(self.header.clone())
        }

        fn read_scanline(&mut self, row: &mut [[u8; 4]]) -> IoResult<()> {
            row.copy_from_slice(&self.rows[self.next]);
            self.next += 1;
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakeSink {
        header: Option<HdrHeader>,
        rows: Vec<Vec<[u8; 4]>>,
    }

    impl ScanlineWriter for FakeSink {
        type Header = HdrHeader;
        type Sample = [u8; 4];

        fn write_header(&mut self, header: &HdrHeader) -> IoResult<()> {
            self.header = Some(header.clone());
            Ok(())
        }

        fn write_scanline(&mut self, row: &[[u8; 4]]) -> IoResult<()> {
            self.rows.push(row.to_vec());
            Ok(())
        }
    }

    fn header(width: usize, height: usize) -> HdrHeader {
        HdrHeader {
            format: HdrFormat::Rle32Rgbe,
            exposure: 1.0,
            orientation: Orientation::NegYPosX,
            width,
            height,
        }
    }

    // 1.0, 0.5 and 0.25 in RGBE
    const ONE: [u8; 4] = [128, 128, 128, 129];
    const HALF: [u8; 4] = [128, 128, 128, 128];
    const QUARTER: [u8; 4] = [128, 128, 128, 127];

    #[test]
    fn first_file_row_is_visual_top() {
        let source = FakeSource::new(
            header(2, 2),
            vec![vec![ONE, HALF], vec![QUARTER, [0; 4]]],
        );
        let image = load(source).unwrap();
        assert_eq!(image.channels(0), 3);
        assert_eq!(image.value(0, 0, 0, 0), 1.0);
        assert_eq!(image.value(1, 0, 1, 0), 0.5);
        assert_eq!(image.value(0, 1, 2, 0), 0.25);
        assert_eq!(image.value(1, 1, 0, 0), 0.0);
        // buffer row 0 holds the last file row
        assert_eq!(&image.data(0)[..4], &0.25f32.to_ne_bytes());
    }

    #[test]
    fn rejects_unsupported_format() {
        let mut h = header(1, 1);
        h.format = HdrFormat::Rle32Xyze;
        let err = load(FakeSource::new(h, vec![])).unwrap_err();
        assert!(matches!(err, IoError::UnsupportedVariant(_)));
        assert!(err.to_string().contains("32-bit_rle_xyze"));
    }

    #[test]
    fn rejects_unsupported_orientation() {
        let mut h = header(1, 1);
        h.orientation = Orientation::PosYPosX;
        let err = load(FakeSource::new(h, vec![])).unwrap_err();
        assert_eq!(err.to_string(), "resolution type '+Y +X' not supported");
    }

    #[test]
    fn store_writes_top_row_first() {
        let layer = Layer::single_floats(3, &[0.25, 0.25, 0.25, 1.0, 1.0, 1.0]).unwrap();
        let image = Image::new(1, 2, vec![layer]).unwrap();
        let mut sink = FakeSink::default();
        store(&mut sink, &image, 0, 2.0).unwrap();

        let header = sink.header.unwrap();
        assert_eq!(header.exposure, 2.0);
        assert_eq!((header.width, header.height), (1, 2));
        assert_eq!(sink.rows, vec![vec![ONE], vec![QUARTER]]);
    }

    #[test]
    fn store_replicates_grayscale() {
        let layer = Layer::single_floats(1, &[0.5]).unwrap();
        let image = Image::new(1, 1, vec![layer]).unwrap();
        let mut sink = FakeSink::default();
        store(&mut sink, &image, 0, 1.0).unwrap();
        assert_eq!(sink.rows, vec![vec![HALF]]);
    }

    #[test]
    fn store_rejects_byte_layer() {
        let image = Image::single(1, 1, 3, PixelFormat::Byte, vec![0; 3]).unwrap();
        let mut sink = FakeSink::default();
        let err = store(&mut sink, &image, 0, 1.0).unwrap_err();
        assert_eq!(err.to_string(), "Cannot store LDR image as HDR image.");
        assert!(sink.header.is_none());
    }

    #[test]
    fn memory_roundtrip_with_rle() {
        let samples: Vec<f32> = (0..16 * 3 * 3).map(|i| (i % 7) as f32 * 0.5).collect();
        let layer = Layer::single_floats(3, &samples).unwrap();
        let image = Image::new(16, 3, vec![layer]).unwrap();

        let bytes = HdrWriter::new().write_to_memory(&image, 0).unwrap();
        assert!(bytes.starts_with(b"#?RADIANCE\n"));
        let loaded = HdrReader::new().read_from_memory(&bytes).unwrap();
        // multiples of 0.5 up to 3.0 are exact in RGBE
        assert_eq!(loaded, image);
    }

    #[test]
    fn truncated_pixel_data_is_an_error() {
        let bytes = b"#?RADIANCE\nFORMAT=32-bit_rle_rgbe\n\n-Y 1000000 +X 1000000\n";
        let err = HdrReader::new().read_from_memory(bytes).unwrap_err();
        assert!(err.to_string().starts_with("Radiance PIC loader: "));

        // two of three scanlines present
        let bytes = b"#?RADIANCE\n\n-Y 3 +X 1\n\x80\x80\x80\x81\x80\x80\x80\x81";
        assert!(HdrReader::new().read_from_memory(bytes).is_err());
    }

    #[test]
    fn oversized_header_is_an_error() {
        let bytes = b"#?RADIANCE\n\n-Y 1 +X 1152921504606846976\n\0\0\0\0";
        let err = HdrReader::new().read_from_memory(bytes).unwrap_err();
        assert!(err.to_string().starts_with("Radiance PIC loader: "));
    }

    #[test]
    fn loader_prefixes_errors() {
        let bytes = b"#?RADIANCE\nFORMAT=32-bit_rle_xyze\n\n-Y 1 +X 1\n\0\0\0\0";
        let err = HdrReader::new().read_from_memory(bytes).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Radiance PIC loader: format '32-bit_rle_xyze' not supported"
        );
    }
}
