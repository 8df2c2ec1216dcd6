//! OpenEXR container codec on top of the `exr` crate.

use super::frame::{ChannelSink, ChannelSource, DataWindow, FrameBuffer};
use super::Compression;
use crate::{IoError, IoResult};
use std::io::{Cursor, Read, Seek};
use tracing::trace;

/// Decoded channels of the first valid layer of an OpenEXR file.
///
/// Samples are held as `f32` regardless of the stored sample type, rows
/// top-to-bottom within the data window.
#[derive(Debug)]
pub struct ExrDecoder {
    window: DataWindow,
    channels: Vec<(String, Vec<f32>)>,
}

impl ExrDecoder {
    /// Decodes an OpenEXR stream.
    pub fn new<R: Read + Seek + Send>(reader: R) -> IoResult<Self> {
        use ::exr::prelude::*;

        let image = read()
            .no_deep_data()
            .largest_resolution_level()
            .all_channels()
            .first_valid_layer()
            .all_attributes()
            .from_buffered(reader)
            .map_err(|e| IoError::DecodeError(e.to_string()))?;

        let layer = image.layer_data;
        let width = layer.size.width();
        let height = layer.size.height();
        let position = layer.attributes.layer_position;
        let pixels = width * height;

        let mut channels = Vec::with_capacity(layer.channel_data.list.len());
        for channel in &layer.channel_data.list {
            let name = channel.name.to_string();
            if channel.sample_data.len() != pixels {
                return Err(IoError::DecodeError(format!(
                    "subsampled channel '{}' not supported",
                    name
                )));
            }
            channels.push((name, channel.sample_data.values_as_f32().collect()));
        }
        trace!(width, height, channels = channels.len(), "exr decoded");

        Ok(Self {
            window: DataWindow {
                origin: (position.x(), position.y()),
                width,
                height,
            },
            channels,
        })
    }

    fn samples(&self, name: &str) -> IoResult<&[f32]> {
        self.channels
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, s)| s.as_slice())
            .ok_or_else(|| IoError::DecodeError(format!("no channel named '{}'", name)))
    }
}

impl ChannelSource for ExrDecoder {
    fn data_window(&self) -> DataWindow {
        self.window
    }

    fn channel_names(&self) -> Vec<String> {
        self.channels.iter().map(|(n, _)| n.clone()).collect()
    }

    fn read_pixels(&mut self, frame: &mut FrameBuffer<'_>) -> IoResult<()> {
        let width = self.window.width;
        for index in 0..frame.slices().len() {
            let samples = self.samples(&frame.slices()[index].channel)?;
            for (i, &v) in samples.iter().enumerate() {
                frame.put(index, i % width, i / width, v)?;
            }
        }
        Ok(())
    }
}

/// Encodes half-float scanline OpenEXR files into memory.
#[derive(Debug)]
pub struct ExrEncoder {
    compression: Compression,
    bytes: Vec<u8>,
}

impl ExrEncoder {
    /// Creates an encoder using `compression`.
    pub fn new(compression: Compression) -> Self {
        Self {
            compression,
            bytes: Vec::new(),
        }
    }

    /// Returns the encoded file.
    pub fn into_inner(self) -> Vec<u8> {
        self.bytes
    }
}

impl ChannelSink for ExrEncoder {
    fn write_channels(
        &mut self,
        width: usize,
        height: usize,
        channels: Vec<(&'static str, Vec<f32>)>,
    ) -> IoResult<()> {
        use ::exr::prelude::*;
        use smallvec::SmallVec;

        let list: SmallVec<[AnyChannel<FlatSamples>; 4]> = channels
            .into_iter()
            .map(|(name, plane)| {
                let halfs = plane.into_iter().map(half::f16::from_f32).collect();
                AnyChannel::new(name, FlatSamples::F16(halfs))
            })
            .collect();

        let encoding = Encoding {
            compression: self.compression.to_exr(),
            ..Encoding::SMALL_LOSSLESS
        };
        let layer = Layer::new(
            (width, height),
            LayerAttributes::default(),
            encoding,
            AnyChannels::sort(list),
        );

        let mut bytes = Vec::new();
        Image::from_layer(layer)
            .write()
            .to_buffered(Cursor::new(&mut bytes))
            .map_err(|e| IoError::EncodeError(e.to_string()))?;
        self.bytes = bytes;
        Ok(())
    }
}

impl Compression {
    fn to_exr(self) -> ::exr::compression::Compression {
        use ::exr::compression::Compression as C;
        match self {
            Self::None => C::Uncompressed,
            Self::Rle => C::RLE,
            Self::Zips => C::ZIP1,
            Self::Zip => C::ZIP16,
            Self::Piz => C::PIZ,
            Self::Pxr24 => C::PXR24,
            Self::B44 => C::B44,
        }
    }
}
