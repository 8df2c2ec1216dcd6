//! Half-resolution box filter.
//!
//! Each output pixel is the mean of the 2x2 source block at
//! `(2x, 2y)..(2x + 1, 2y + 1)` in visual coordinates. Coordinates past the
//! last column/row clamp to the border, so a 1-pixel-wide axis averages the
//! same column twice. Odd dimensions drop their last row/column.

use crate::{Error, Image, Layer, Result};
use tracing::{debug, trace};

impl Image {
    /// Downscales the primary (first) layer to half resolution.
    ///
    /// Output size is `max(width / 2, 1) x max(height / 2, 1)`; the result has a
    /// single float layer with the source layer's name and channels.
    ///
    /// # Errors
    ///
    /// - [`Error::TooSmall`] if both dimensions are already `<= 1` or either is 0
    /// - [`Error::UnsupportedFormat`] if the primary layer is not float
    ///
    /// # Example
    ///
    /// ```rust
    /// use hdrv_core::{Image, Layer};
    ///
    /// let layer = Layer::from_floats("", vec!["Y".into()], &[1.0, 2.0, 3.0, 4.0]);
    /// let image = Image::new(2, 2, vec![layer]).unwrap();
    /// let half = image.scale_by_half().unwrap();
    /// assert_eq!((half.width(), half.height()), (1, 1));
    /// assert_eq!(half.value(0, 0, 0, 0), 2.5);
    /// ```
    pub fn scale_by_half(&self) -> Result<Image> {
        const LAYER: usize = 0;
        trace!(width = self.width(), height = self.height(), "scale_by_half");

        let degenerate = self.width() == 0 || self.height() == 0;
        if degenerate || (self.width() <= 1 && self.height() <= 1) {
            return Err(Error::TooSmall(
                "Image is too small for further downscaling by half.".into(),
            ));
        }
        let source = &self.layers()[LAYER];
        if !source.format.is_float() {
            return Err(Error::UnsupportedFormat(
                "Scaling non-floating-point images is not supported.".into(),
            ));
        }

        let (width, height) = (self.width(), self.height());
        let new_width = (width / 2).max(1);
        let new_height = (height / 2).max(1);
        let channels = source.channel_count();
        debug!(width, height, new_width, new_height, channels, "Downscaling by half");

        let mut samples = vec![0.0f32; new_width * new_height * channels];
        for y in 0..new_height {
            // output rows are stored bottom-to-top like every other layer
            let out_row = new_height - y - 1;
            for x in 0..new_width {
                for c in 0..channels {
                    let mut sum = 0.0f32;
                    for dy in 0..2 {
                        let sy = (2 * y + dy).min(height - 1);
                        for dx in 0..2 {
                            let sx = (2 * x + dx).min(width - 1);
                            sum += self.value(sx, sy, c, LAYER);
                        }
                    }
                    samples[(out_row * new_width + x) * channels + c] = sum / 4.0;
                }
            }
        }

        let layer = Layer::from_floats(source.name.clone(), source.channels.clone(), &samples);
        Image::new(new_width, new_height, vec![layer])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PixelFormat;
    use approx::assert_relative_eq;

    /// Builds a single-channel float image from visual rows (top first).
    fn from_rows(width: usize, height: usize, f: impl Fn(usize, usize) -> f32) -> Image {
        let mut samples = vec![0.0f32; width * height];
        for y in 0..height {
            for x in 0..width {
                samples[(height - y - 1) * width + x] = f(x, y);
            }
        }
        let layer = Layer::from_floats("", vec!["Y".into()], &samples);
        Image::new(width, height, vec![layer]).unwrap()
    }

    #[test]
    fn box_average_4x4() {
        let image = from_rows(4, 4, |x, y| x as f32 + 10.0 * y as f32);
        let half = image.scale_by_half().unwrap();

        assert_eq!(half.width(), 2);
        assert_eq!(half.height(), 2);
        assert_eq!(half.format(0), PixelFormat::Float);
        // (0 + 1 + 10 + 11) / 4
        assert_relative_eq!(half.value(0, 0, 0, 0), 5.5);
        // (2 + 3 + 12 + 13) / 4
        assert_relative_eq!(half.value(1, 0, 0, 0), 7.5);
        // (20 + 21 + 30 + 31) / 4
        assert_relative_eq!(half.value(0, 1, 0, 0), 25.5);
        assert_relative_eq!(half.value(1, 1, 0, 0), 27.5);
    }

    #[test]
    fn one_by_one_is_too_small() {
        let image = from_rows(1, 1, |_, _| 1.0);
        assert!(matches!(image.scale_by_half(), Err(Error::TooSmall(_))));
    }

    #[test]
    fn zero_dimension_is_too_small() {
        for (width, height) in [(0, 4), (6, 0)] {
            let layer = Layer::from_floats("", vec!["Y".into()], &[]);
            let image = Image::new(width, height, vec![layer]).unwrap();
            assert!(matches!(image.scale_by_half(), Err(Error::TooSmall(_))));
        }
    }

    #[test]
    fn byte_layer_rejected() {
        let image = Image::single(2, 2, 1, PixelFormat::Byte, vec![0; 4]).unwrap();
        assert!(matches!(
            image.scale_by_half(),
            Err(Error::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn thin_column_clamps_horizontally() {
        // 1x4: x + 1 clamps back to column 0
        let image = from_rows(1, 4, |_, y| y as f32);
        let half = image.scale_by_half().unwrap();
        assert_eq!((half.width(), half.height()), (1, 2));
        assert_relative_eq!(half.value(0, 0, 0, 0), 0.5);
        assert_relative_eq!(half.value(0, 1, 0, 0), 2.5);
    }

    #[test]
    fn odd_size_drops_last_row_and_column() {
        let image = from_rows(3, 3, |x, y| (x + 3 * y) as f32);
        let half = image.scale_by_half().unwrap();
        assert_eq!((half.width(), half.height()), (1, 1));
        // top-left block: 0, 1, 3, 4
        assert_relative_eq!(half.value(0, 0, 0, 0), 2.0);
    }

    #[test]
    fn keeps_channels_and_name() {
        let layer = Layer::from_floats(
            "beauty.",
            vec!["R".into(), "G".into()],
            &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0],
        );
        let image = Image::new(2, 2, vec![layer]).unwrap();
        let half = image.scale_by_half().unwrap();
        assert_eq!(half.layer_name(0), "beauty.");
        assert_eq!(half.channels(0), 2);
        assert_relative_eq!(half.value(0, 0, 0, 0), 4.0);
        assert_relative_eq!(half.value(0, 0, 1, 0), 5.0);
    }

    #[test]
    fn only_primary_layer_is_scaled() {
        let a = Layer::from_floats("", vec!["Y".into()], &[1.0; 4]);
        let b = Layer::from_floats("extra.", vec!["Y".into()], &[9.0; 4]);
        let image = Image::new(2, 2, vec![a, b]).unwrap();
        let half = image.scale_by_half().unwrap();
        assert_eq!(half.layer_count(), 1);
        assert_relative_eq!(half.value(0, 0, 0, 0), 1.0);
    }
}
