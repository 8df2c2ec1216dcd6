//! Error types for hdrv-core operations.
//!
//! Covers failures while assembling an [`Image`](crate::Image) from layers
//! and while deriving new images from existing ones (downscaling).
//!
//! Out-of-range pixel, channel or layer indices passed to the plain
//! accessors are caller bugs and panic instead of producing an [`Error`].

use thiserror::Error;

/// Result type alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when building or transforming images.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// Layer index is not present in the image.
    #[error("layer {index} out of range (image has {count} layers)")]
    LayerOutOfRange {
        /// Requested layer index
        index: usize,
        /// Number of layers in the image
        count: usize,
    },

    /// An image was built from an empty layer list.
    #[error("image has no layers")]
    NoLayers,

    /// A layer was declared without channels.
    #[error("layer '{layer}' has no channels")]
    NoChannels {
        /// Layer name
        layer: String,
    },

    /// The same channel name appears twice within one layer.
    #[error("layer '{layer}' contains channel '{channel}' more than once")]
    DuplicateChannel {
        /// Layer name
        layer: String,
        /// Repeated channel name
        channel: String,
    },

    /// The pixel buffer does not match `width * height * channels * sample size`.
    #[error("layer '{layer}' buffer holds {actual} bytes, expected {expected}")]
    BufferSizeMismatch {
        /// Layer name
        layer: String,
        /// Required byte count
        expected: usize,
        /// Provided byte count
        actual: usize,
    },

    /// Image dimensions overflow the addressable buffer size.
    #[error("invalid dimensions: {width}x{height}")]
    InvalidDimensions {
        /// Requested width
        width: usize,
        /// Requested height
        height: usize,
    },

    /// The single-layer helper only names up to four channels (RGBA).
    #[error("cannot name {count} channels, at most 4 (RGBA) are supported")]
    TooManyChannels {
        /// Requested channel count
        count: usize,
    },

    /// Operation is not defined for this pixel format.
    #[error("{0}")]
    UnsupportedFormat(String),

    /// Image is already at the minimum size for the operation.
    #[error("{0}")]
    TooSmall(String),
}
