//! Layered image model.
//!
//! An [`Image`] owns an ordered list of [`Layer`]s that all share the image
//! dimensions. Each layer stores its samples in one flat byte buffer:
//!
//! ```text
//! buffer row 0            = bottom row on screen
//! buffer row height - 1   = top row on screen
//!
//! row:   [c0 c1 c2 | c0 c1 c2 | ...]   (channels interleaved per pixel)
//! ```
//!
//! Byte layers hold one `u8` per sample, float layers hold one native-endian
//! IEEE-754 `f32` (4 bytes) per sample. Accessors take `y` in visual,
//! top-to-bottom coordinates and map it to buffer row `height - y - 1`.
//!
//! # Example
//!
//! ```rust
//! use hdrv_core::{Image, Layer, PixelFormat};
//!
//! // 1x2 grayscale float image, buffer rows bottom-to-top
//! let layer = Layer::from_floats("", vec!["Y".into()], &[0.25, 0.75]);
//! let image = Image::new(1, 2, vec![layer]).unwrap();
//!
//! assert_eq!(image.format(0), PixelFormat::Float);
//! assert_eq!(image.value(0, 0, 0, 0), 0.75); // top row
//! assert_eq!(image.value(0, 1, 0, 0), 0.25); // bottom row
//! ```

use crate::{Error, Result};
use std::collections::HashSet;

/// Channel names used when a single-layer source carries no names of its own.
const DEFAULT_CHANNEL_NAMES: [&str; 4] = ["R", "G", "B", "A"];

/// Storage representation of every sample in a layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// 8-bit unsigned integer per sample.
    Byte,
    /// 32-bit float per sample.
    Float,
}

impl PixelFormat {
    /// Returns the size of one sample in bytes.
    pub const fn bytes_per_sample(self) -> usize {
        match self {
            Self::Byte => 1,
            Self::Float => 4,
        }
    }

    /// Returns true if this is a floating-point format.
    pub const fn is_float(self) -> bool {
        matches!(self, Self::Float)
    }
}

/// A named group of channels sharing one pixel format and one buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    /// Layer name: empty for a nameless layer, otherwise a dot-terminated
    /// prefix such as `"diffuse."`.
    pub name: String,
    /// Channel names in interleaving order.
    pub channels: Vec<String>,
    /// Sample representation.
    pub format: PixelFormat,
    /// Interleaved samples, rows stored bottom-to-top.
    pub data: Vec<u8>,
}

impl Layer {
    /// Creates a layer from its parts. Validation happens in [`Image::new`].
    pub fn new(
        name: impl Into<String>,
        channels: Vec<String>,
        format: PixelFormat,
        data: Vec<u8>,
    ) -> Self {
        Self {
            name: name.into(),
            channels,
            format,
            data,
        }
    }

    /// Creates a nameless layer whose channels are named `R`, `G`, `B`, `A`
    /// in order, truncated to `channel_count`.
    pub fn single(format: PixelFormat, channel_count: usize, data: Vec<u8>) -> Result<Self> {
        if channel_count > DEFAULT_CHANNEL_NAMES.len() {
            return Err(Error::TooManyChannels {
                count: channel_count,
            });
        }
        let channels = DEFAULT_CHANNEL_NAMES[..channel_count]
            .iter()
            .map(|c| c.to_string())
            .collect();
        Ok(Self::new(String::new(), channels, format, data))
    }

    /// Like [`Layer::single`] for float samples, encoding them in native byte order.
    pub fn single_floats(channel_count: usize, samples: &[f32]) -> Result<Self> {
        let mut layer = Self::single(PixelFormat::Float, channel_count, Vec::new())?;
        layer.data = encode_floats(samples);
        Ok(layer)
    }

    /// Creates a float layer from `f32` samples, encoding them in native byte order.
    pub fn from_floats(name: impl Into<String>, channels: Vec<String>, samples: &[f32]) -> Self {
        Self::new(name, channels, PixelFormat::Float, encode_floats(samples))
    }

    /// Number of channels in this layer.
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Size of one sample in bytes.
    pub fn pixel_size_in_bytes(&self) -> usize {
        self.format.bytes_per_sample()
    }

    /// Name used for identification in UIs and logs: the prefix followed by
    /// the concatenated channel names, e.g. `"diffuse.RGB"`.
    pub fn display_name(&self) -> String {
        let mut name = self.name.clone();
        for channel in &self.channels {
            name.push_str(channel);
        }
        name
    }

    /// Reads the sample at flat `index` (counted in samples, not bytes).
    #[inline]
    pub(crate) fn sample(&self, index: usize) -> f32 {
        match self.format {
            PixelFormat::Byte => self.data[index] as f32,
            PixelFormat::Float => {
                let o = index * 4;
                let b = &self.data[o..o + 4];
                f32::from_ne_bytes([b[0], b[1], b[2], b[3]])
            }
        }
    }
}

fn encode_floats(samples: &[f32]) -> Vec<u8> {
    let mut data = Vec::with_capacity(samples.len() * 4);
    for s in samples {
        data.extend_from_slice(&s.to_ne_bytes());
    }
    data
}

/// Image made of one or more equally sized layers.
///
/// Construction validates every layer against the dimensions; afterwards
/// the image is immutable. The first layer is the primary layer used by
/// single-layer consumers such as [`Image::scale_by_half`].
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    width: usize,
    height: usize,
    layers: Vec<Layer>,
}

impl Image {
    /// Builds an image from fully populated layers.
    ///
    /// # Errors
    ///
    /// - [`Error::NoLayers`] if `layers` is empty
    /// - [`Error::NoChannels`] / [`Error::DuplicateChannel`] for bad channel lists
    /// - [`Error::BufferSizeMismatch`] if a buffer does not hold exactly
    ///   `width * height * channels * sample size` bytes
    pub fn new(width: usize, height: usize, layers: Vec<Layer>) -> Result<Self> {
        if layers.is_empty() {
            return Err(Error::NoLayers);
        }
        let pixels = width
            .checked_mul(height)
            .ok_or(Error::InvalidDimensions { width, height })?;

        for layer in &layers {
            if layer.channels.is_empty() {
                return Err(Error::NoChannels {
                    layer: layer.name.clone(),
                });
            }
            let mut seen = HashSet::with_capacity(layer.channels.len());
            for channel in &layer.channels {
                if !seen.insert(channel.as_str()) {
                    return Err(Error::DuplicateChannel {
                        layer: layer.name.clone(),
                        channel: channel.clone(),
                    });
                }
            }
            let expected = pixels
                .checked_mul(layer.channel_count())
                .and_then(|n| n.checked_mul(layer.pixel_size_in_bytes()))
                .ok_or(Error::InvalidDimensions { width, height })?;
            if layer.data.len() != expected {
                return Err(Error::BufferSizeMismatch {
                    layer: layer.name.clone(),
                    expected,
                    actual: layer.data.len(),
                });
            }
        }

        Ok(Self {
            width,
            height,
            layers,
        })
    }

    /// Builds a single-layer image with channels named from `RGBA`.
    pub fn single(
        width: usize,
        height: usize,
        channels: usize,
        format: PixelFormat,
        data: Vec<u8>,
    ) -> Result<Self> {
        Self::new(width, height, vec![Layer::single(format, channels, data)?])
    }

    /// The canonical empty image: 0x0 with one byte layer holding channel `R`.
    pub fn empty() -> Self {
        Self {
            width: 0,
            height: 0,
            layers: vec![Layer::new(
                String::new(),
                vec!["R".to_string()],
                PixelFormat::Byte,
                Vec::new(),
            )],
        }
    }

    /// Returns true for a 0x0 image.
    pub fn is_empty(&self) -> bool {
        self.width == 0 && self.height == 0
    }

    /// Image width in pixels.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Image height in pixels.
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of layers.
    #[inline]
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// All layers in order.
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Returns the layer at `index`, if present.
    pub fn layer(&self, index: usize) -> Option<&Layer> {
        self.layers.get(index)
    }

    /// Returns the layer at `index` or [`Error::LayerOutOfRange`].
    pub fn try_layer(&self, index: usize) -> Result<&Layer> {
        self.layers.get(index).ok_or(Error::LayerOutOfRange {
            index,
            count: self.layers.len(),
        })
    }

    /// Consumes the image, returning its layers.
    pub fn into_layers(self) -> Vec<Layer> {
        self.layers
    }

    /// Number of channels in `layer`.
    ///
    /// # Panics
    ///
    /// Panics if `layer` is out of range. Use [`Image::try_channels`] for a
    /// checked variant.
    pub fn channels(&self, layer: usize) -> usize {
        self.layers[layer].channel_count()
    }

    /// Number of channels in `layer`, or [`Error::LayerOutOfRange`].
    pub fn try_channels(&self, layer: usize) -> Result<usize> {
        self.try_layer(layer).map(Layer::channel_count)
    }

    /// Sample format of `layer`.
    pub fn format(&self, layer: usize) -> PixelFormat {
        self.layers[layer].format
    }

    /// Size of one sample of `layer` in bytes: 1 for byte, 4 for float.
    pub fn pixel_size_in_bytes(&self, layer: usize) -> usize {
        self.layers[layer].pixel_size_in_bytes()
    }

    /// Total buffer length of `layer` in bytes.
    pub fn size_in_bytes(&self, layer: usize) -> usize {
        self.width * self.height * self.channels(layer) * self.pixel_size_in_bytes(layer)
    }

    /// Raw interleaved buffer of `layer`, rows bottom-to-top.
    pub fn data(&self, layer: usize) -> &[u8] {
        &self.layers[layer].data
    }

    /// Name (prefix) of `layer`.
    pub fn layer_name(&self, layer: usize) -> &str {
        &self.layers[layer].name
    }

    /// Name of `channel` within `layer`.
    pub fn channel_name(&self, layer: usize, channel: usize) -> &str {
        &self.layers[layer].channels[channel]
    }

    /// Reads one sample with `y` in visual (top-to-bottom) coordinates.
    ///
    /// Byte samples are widened without normalization (`255u8` reads as
    /// `255.0`); float samples are returned as stored.
    ///
    /// # Panics
    ///
    /// Out-of-range coordinates, channel or layer indices panic.
    #[inline]
    pub fn value(&self, x: usize, y: usize, channel: usize, layer: usize) -> f32 {
        let l = &self.layers[layer];
        let channels = l.channel_count();
        debug_assert!(x < self.width && y < self.height && channel < channels);
        let row = self.height - y - 1;
        l.sample((row * self.width + x) * channels + channel)
    }

    /// Reads up to four channels of one pixel; missing channels are `0.0`.
    pub fn texel(&self, x: usize, y: usize, layer: usize) -> [f32; 4] {
        let mut texel = [0.0f32; 4];
        let channels = self.channels(layer).min(4);
        for (c, out) in texel.iter_mut().enumerate().take(channels) {
            *out = self.value(x, y, c, layer);
        }
        texel
    }
}

impl Default for Image {
    fn default() -> Self {
        Self::empty()
    }
}
