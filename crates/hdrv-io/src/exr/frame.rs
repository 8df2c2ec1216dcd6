//! Frame buffer descriptors for per-channel pixel delivery.
//!
//! A [`Slice`] tells a [`ChannelSource`] where the samples of one channel
//! go inside a caller-owned interleaved buffer: the byte offset of pixel
//! `(0, 0)` of the data window plus byte strides along x and y. A negative
//! y stride with the base on the last buffer row stores file rows
//! (top-to-bottom) into bottom-to-top layer buffers while reading.

use crate::{IoError, IoResult};

/// Extent of the stored pixels, `origin` in container coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataWindow {
    /// Position of the top-left stored pixel.
    pub origin: (i32, i32),
    /// Width in pixels.
    pub width: usize,
    /// Height in pixels.
    pub height: usize,
}

/// Placement of one channel inside a frame buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slice {
    /// Full channel name as listed by the container.
    pub channel: String,
    /// Byte offset of data-window pixel `(0, 0)`.
    pub base: usize,
    /// Bytes between horizontally adjacent samples.
    pub x_stride: isize,
    /// Bytes between vertically adjacent samples (file order).
    pub y_stride: isize,
}

/// Caller-owned destination for `f32` samples, written in native byte order.
#[derive(Debug)]
pub struct FrameBuffer<'a> {
    data: &'a mut [u8],
    slices: Vec<Slice>,
}

impl<'a> FrameBuffer<'a> {
    /// Wraps `data` with no slices.
    pub fn new(data: &'a mut [u8]) -> Self {
        Self {
            data,
            slices: Vec::new(),
        }
    }

    /// Adds a channel slice.
    pub fn insert(&mut self, slice: Slice) {
        self.slices.push(slice);
    }

    /// All slices in insertion order.
    pub fn slices(&self) -> &[Slice] {
        &self.slices
    }

    /// Stores sample `(x, y)` of slice `index`.
    ///
    /// Fails if the slice and strides place the sample outside the buffer.
    pub fn put(&mut self, index: usize, x: usize, y: usize, value: f32) -> IoResult<()> {
        let slice = &self.slices[index];
        let offset = (x as isize)
            .checked_mul(slice.x_stride)
            .zip((y as isize).checked_mul(slice.y_stride))
            .and_then(|(dx, dy)| dx.checked_add(dy))
            .and_then(|d| (slice.base as isize).checked_add(d))
            .and_then(|o| usize::try_from(o).ok())
            .filter(|o| o.checked_add(4).is_some_and(|end| end <= self.data.len()))
            .ok_or_else(|| {
                IoError::DecodeError(format!(
                    "sample ({}, {}) of channel '{}' outside frame buffer",
                    x, y, slice.channel
                ))
            })?;
        self.data[offset..offset + 4].copy_from_slice(&value.to_ne_bytes());
        Ok(())
    }
}

/// Read side of a multi-channel float container.
///
/// Opening is the implementor's constructor.
pub trait ChannelSource {
    /// Extent of the stored pixels.
    fn data_window(&self) -> DataWindow;

    /// Full names of every channel in the container.
    fn channel_names(&self) -> Vec<String>;

    /// Delivers the samples of every slice in `frame`, rows in file order.
    fn read_pixels(&mut self, frame: &mut FrameBuffer<'_>) -> IoResult<()>;
}

/// Write side of a multi-channel float container.
pub trait ChannelSink {
    /// Writes full-resolution planes, each `width * height` samples with
    /// rows top-to-bottom.
    fn write_channels(
        &mut self,
        width: usize,
        height: usize,
        channels: Vec<(&'static str, Vec<f32>)>,
    ) -> IoResult<()>;
}
