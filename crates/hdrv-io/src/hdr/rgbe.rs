//! Shared-exponent RGBE pixel encoding.
//!
//! Three 8-bit mantissas share one 8-bit exponent biased by 128. Values
//! whose mantissas fit exactly survive a round trip unchanged; everything
//! else is truncated to 8 significant bits of the largest component.

/// Components below this encode as black.
const MIN_VALUE: f32 = 1.0e-32;

/// Encodes linear RGB. Negative components are clamped to zero.
pub fn encode(rgb: [f32; 3]) -> [u8; 4] {
    let [r, g, b] = rgb.map(|v| if v > 0.0 { v } else { 0.0 });
    let max = r.max(g).max(b);
    if !(max >= MIN_VALUE) {
        return [0, 0, 0, 0];
    }
    if !max.is_finite() {
        // saturate infinities to the largest encodable value
        return [255, 255, 255, 255];
    }

    let (m, e) = frexp(max);
    let scale = m * 256.0 / max;
    [
        (r * scale).clamp(0.0, 255.0) as u8,
        (g * scale).clamp(0.0, 255.0) as u8,
        (b * scale).clamp(0.0, 255.0) as u8,
        (e + 128).clamp(0, 255) as u8,
    ]
}

/// Decodes an RGBE quad to linear RGB. A zero exponent is black.
pub fn decode(rgbe: [u8; 4]) -> [f32; 3] {
    let [r, g, b, e] = rgbe;
    if e == 0 {
        return [0.0; 3];
    }
    let f = ldexp(1.0, e as i32 - 136);
    [r as f32 * f, g as f32 * f, b as f32 * f]
}

/// Splits a positive normal float into `m * 2^e` with `m` in `[0.5, 1)`.
fn frexp(x: f32) -> (f32, i32) {
    let bits = x.to_bits();
    let exp = ((bits >> 23) & 0xff) as i32;
    if exp == 0 {
        // subnormal: normalize first
        let (m, e) = frexp(x * 2f32.powi(64));
        return (m, e - 64);
    }
    let m = f32::from_bits((bits & 0x807f_ffff) | (126 << 23));
    (m, exp - 126)
}

fn ldexp(x: f32, e: i32) -> f32 {
    // split so intermediate powers stay inside the f32 range
    let half = e / 2;
    x * 2f32.powi(half) * 2f32.powi(e - half)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn frexp_matches_definition() {
        assert_eq!(frexp(1.0), (0.5, 1));
        assert_eq!(frexp(0.75), (0.75, 0));
        assert_eq!(frexp(10.0), (0.625, 4));
    }

    #[test]
    fn representable_values_are_exact() {
        for rgb in [[1.0, 0.5, 0.25], [128.0, 3.0, 0.0], [0.5, 0.5, 0.5]] {
            assert_eq!(decode(encode(rgb)), rgb);
        }
    }

    #[test]
    fn known_encoding() {
        assert_eq!(encode([1.0, 0.5, 0.25]), [128, 64, 32, 129]);
        assert_eq!(decode([128, 64, 32, 129]), [1.0, 0.5, 0.25]);
    }

    #[test]
    fn black_and_negative() {
        assert_eq!(encode([0.0, 0.0, 0.0]), [0, 0, 0, 0]);
        assert_eq!(encode([-1.0, -2.0, 0.0]), [0, 0, 0, 0]);
        assert_eq!(encode([f32::NAN, 0.0, 0.0]), [0, 0, 0, 0]);
        assert_eq!(decode([10, 20, 30, 0]), [0.0; 3]);
    }

    #[test]
    fn lossy_within_mantissa_precision() {
        let rgb = [0.123, 4.56, 7.89];
        let out = decode(encode(rgb));
        for (a, b) in rgb.iter().zip(out) {
            assert_relative_eq!(*a, b, epsilon = 7.89 / 128.0);
        }
    }
}
