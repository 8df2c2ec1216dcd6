//! I/O traits for image readers, writers and the codecs behind them.
//!
//! Two levels of abstraction:
//!
//! - [`FormatReader`] / [`FormatWriter`] - what callers use: whole images in,
//!   whole images out, with per-format options.
//! - [`ScanlineReader`] / [`ScanlineWriter`] - the narrow surface an adapter
//!   needs from a container codec (read header, read one row, write header,
//!   write one row). Adapters are generic over these so flip and pixel
//!   conversion logic can be tested against in-memory fakes.

use crate::{IoError, IoResult};
use hdrv_core::Image;
use std::io::{Cursor, Read, Seek};
use std::path::Path;

/// Trait for image format readers.
///
/// # Example
///
/// ```rust,ignore
/// use hdrv_io::{FormatReader, pfm::PfmReader};
///
/// let image = PfmReader::default().read("input.pfm")?;
/// println!("{}x{}", image.width(), image.height());
/// ```
pub trait FormatReader<O = ()>: Sized {
    /// Human-readable format name.
    fn format_name(&self) -> &'static str;

    /// Returns true if `header` (the first bytes of a file) looks like this format.
    fn can_read(&self, header: &[u8]) -> bool;

    /// Reads an image from a file path.
    fn read<P: AsRef<Path>>(&self, path: P) -> IoResult<Image>;

    /// Reads an image from any seekable stream.
    fn read_from<R: Read + Seek + Send>(&self, reader: R) -> IoResult<Image>;

    /// Reads an image from memory.
    fn read_from_memory(&self, data: &[u8]) -> IoResult<Image> {
        self.read_from(Cursor::new(data))
    }

    /// Creates a reader with options.
    fn with_options(options: O) -> Self;
}

/// Trait for image format writers.
///
/// Writers store exactly one layer of an image. Validation and encoding
/// happen before the destination is touched.
pub trait FormatWriter<O = ()>: Sized {
    /// Writes `layer` of `image` to a file path.
    fn write<P: AsRef<Path>>(&self, path: P, image: &Image, layer: usize) -> IoResult<()> {
        let bytes = self.write_to_memory(image, layer)?;
        std::fs::write(path.as_ref(), bytes)?;
        Ok(())
    }

    /// Encodes `layer` of `image` into memory.
    fn write_to_memory(&self, image: &Image, layer: usize) -> IoResult<Vec<u8>>;

    /// Creates a writer with options.
    fn with_options(options: O) -> Self;
}

/// Read side of a scanline container codec.
///
/// Opening for read is the implementor's constructor.
pub trait ScanlineReader {
    /// Parsed container header.
    type Header;
    /// One element of a scanline (a float sample, an RGBE quad, ...).
    type Sample: Copy + Default;

    /// Reads and parses the header. Must be called once, before any scanline.
    fn read_header(&mut self) -> IoResult<Self::Header>;

    /// Fills `row` with the next scanline in file order.
    fn read_scanline(&mut self, row: &mut [Self::Sample]) -> IoResult<()>;
}

/// Write side of a scanline container codec.
///
/// Opening for write is the implementor's constructor.
pub trait ScanlineWriter {
    /// Container header to emit.
    type Header;
    /// One element of a scanline.
    type Sample: Copy;

    /// Writes the header. Must be called once, before any scanline.
    fn write_header(&mut self, header: &Self::Header) -> IoResult<()>;

    /// Appends one scanline in file order.
    fn write_scanline(&mut self, row: &[Self::Sample]) -> IoResult<()>;
}

/// Allocates a zeroed buffer of `len` samples for one scanline.
///
/// Header dimensions are untrusted, so an allocation the allocator refuses
/// is reported as [`IoError::InvalidHeader`] instead of aborting.
pub(crate) fn scanline_buffer<T: Copy + Default>(len: usize) -> IoResult<Vec<T>> {
    let mut row = Vec::new();
    row.try_reserve_exact(len)
        .map_err(|_| IoError::InvalidHeader(format!("scanline of {} samples is too large", len)))?;
    row.resize(len, T::default());
    Ok(row)
}

/// Appends a decoded scanline to `samples`, growing it only as data arrives.
pub(crate) fn append_scanline<T: Copy>(samples: &mut Vec<T>, row: &[T]) -> IoResult<()> {
    samples
        .try_reserve(row.len())
        .map_err(|_| IoError::DecodeError("out of memory while decoding".into()))?;
    samples.extend_from_slice(row);
    Ok(())
}
