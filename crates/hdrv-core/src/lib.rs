//! # hdrv-core
//!
//! Core types for viewing high- and low-dynamic-range images.
//!
//! - [`Image`] - Layered image with validated buffers
//! - [`Layer`] - Named channel group with one [`PixelFormat`] and one buffer
//! - [`Image::value`] - Sample accessor in visual (top-to-bottom) coordinates
//! - [`Image::scale_by_half`] - Box-filter downscale of the primary layer
//!
//! ## Storage Convention
//!
//! Layer buffers store rows **bottom-to-top** with channels interleaved per
//! pixel. Every reader that fills a layer and every writer that drains one
//! goes through this convention, so [`Image::value`] never needs to know
//! where the pixels came from.
//!
//! ## Crate Structure
//!
//! ```text
//! hdrv-core (this crate)
//!    ^
//!    |
//!    +-- hdrv-io (PFM, Radiance HDR, OpenEXR, LDR adapters)
//!    +-- hdrv-cli
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod error;
pub mod image;
mod scale;

pub use error::{Error, Result};
pub use image::{Image, Layer, PixelFormat};
