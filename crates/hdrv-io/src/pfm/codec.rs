//! Portable float map container codec.
//!
//! ```text
//! PF|Pf <ws> width <ws> height <ws> scale <single ws byte>
//! <raw f32 rows, bottom row first>
//! ```
//!
//! `PF` is three samples per pixel, `Pf` one. A negative scale marks
//! little-endian samples, a positive one big-endian.

use crate::traits::{ScanlineReader, ScanlineWriter};
use crate::{IoError, IoResult};
use std::io::{BufRead, Write};

/// Longest header token accepted before giving up on a file.
const MAX_TOKEN_LEN: usize = 64;

/// Samples per pixel declared by the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PfmColor {
    /// `Pf`, one sample per pixel.
    Grayscale,
    /// `PF`, three samples per pixel.
    Color,
}

impl PfmColor {
    /// Samples per pixel.
    pub fn channels(self) -> usize {
        match self {
            Self::Grayscale => 1,
            Self::Color => 3,
        }
    }
}

/// Byte order of the float samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    /// Little-endian (negative scale).
    Little,
    /// Big-endian (positive scale).
    Big,
}

impl ByteOrder {
    /// Byte order of the running machine.
    pub const fn host() -> Self {
        if cfg!(target_endian = "big") {
            Self::Big
        } else {
            Self::Little
        }
    }
}

impl Default for ByteOrder {
    fn default() -> Self {
        Self::host()
    }
}

/// Parsed PFM header.
#[derive(Debug, Clone, PartialEq)]
pub struct PfmHeader {
    /// Grayscale or color.
    pub color: PfmColor,
    /// Width in pixels.
    pub width: usize,
    /// Height in pixels.
    pub height: usize,
    /// Sample byte order.
    pub byte_order: ByteOrder,
    /// Absolute value of the declared scale.
    pub scale: f64,
}

/// Reads a PFM stream.
pub struct PfmDecoder<R> {
    reader: R,
    byte_order: ByteOrder,
}

impl<R: BufRead> PfmDecoder<R> {
    /// Opens a PFM stream for reading.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            byte_order: ByteOrder::host(),
        }
    }

    /// Reads one whitespace-delimited header token and consumes its terminator.
    fn token(&mut self) -> IoResult<String> {
        let mut token = Vec::new();
        loop {
            let mut byte = [0u8; 1];
            if self.reader.read(&mut byte)? == 0 {
                if token.is_empty() {
                    return Err(IoError::InvalidHeader("unexpected end of header".into()));
                }
                break;
            }
            let b = byte[0];
            if b.is_ascii_whitespace() {
                if token.is_empty() {
                    continue;
                }
                if b == b'\r' {
                    // tolerate CRLF after the last token
                    if self.reader.fill_buf()?.first() == Some(&b'\n') {
                        self.reader.consume(1);
                    }
                }
                break;
            }
            token.push(b);
            if token.len() > MAX_TOKEN_LEN {
                return Err(IoError::InvalidHeader("header token too long".into()));
            }
        }
        String::from_utf8(token).map_err(|_| IoError::InvalidHeader("non-ASCII header".into()))
    }

    fn number<T: std::str::FromStr>(&mut self, what: &str) -> IoResult<T> {
        let token = self.token()?;
        token
            .parse()
            .map_err(|_| IoError::InvalidHeader(format!("invalid {}: '{}'", what, token)))
    }
}

impl<R: BufRead> ScanlineReader for PfmDecoder<R> {
    type Header = PfmHeader;
    type Sample = f32;

    fn read_header(&mut self) -> IoResult<PfmHeader> {
        let magic = self.token()?;
        let color = match magic.as_str() {
            "PF" => PfmColor::Color,
            "Pf" => PfmColor::Grayscale,
            other => {
                return Err(IoError::InvalidHeader(format!("bad magic '{}'", other)));
            }
        };
        let width: usize = self.number("width")?;
        let height: usize = self.number("height")?;
        let scale: f64 = self.number("scale")?;
        if scale == 0.0 || !scale.is_finite() {
            return Err(IoError::InvalidHeader(format!("invalid scale {}", scale)));
        }
        let byte_order = if scale < 0.0 {
            ByteOrder::Little
        } else {
            ByteOrder::Big
        };
        self.byte_order = byte_order;

        Ok(PfmHeader {
            color,
            width,
            height,
            byte_order,
            scale: scale.abs(),
        })
    }

    fn read_scanline(&mut self, row: &mut [f32]) -> IoResult<()> {
        for out in row.iter_mut() {
            let mut bytes = [0u8; 4];
            self.reader.read_exact(&mut bytes)?;
            *out = match self.byte_order {
                ByteOrder::Little => f32::from_le_bytes(bytes),
                ByteOrder::Big => f32::from_be_bytes(bytes),
            };
        }
        Ok(())
    }
}

/// Writes a PFM stream.
pub struct PfmEncoder<W> {
    writer: W,
    byte_order: ByteOrder,
}

impl<W: Write> PfmEncoder<W> {
    /// Opens a PFM stream for writing.
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            byte_order: ByteOrder::host(),
        }
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> ScanlineWriter for PfmEncoder<W> {
    type Header = PfmHeader;
    type Sample = f32;

    fn write_header(&mut self, header: &PfmHeader) -> IoResult<()> {
        let magic = match header.color {
            PfmColor::Color => "PF",
            PfmColor::Grayscale => "Pf",
        };
        let scale = match header.byte_order {
            ByteOrder::Little => -header.scale.abs(),
            ByteOrder::Big => header.scale.abs(),
        };
        self.byte_order = header.byte_order;
        write!(self.writer, "{}\n{} {}\n{}\n", magic, header.width, header.height, scale)?;
        Ok(())
    }

    fn write_scanline(&mut self, row: &[f32]) -> IoResult<()> {
        for v in row {
            let bytes = match self.byte_order {
                ByteOrder::Little => v.to_le_bytes(),
                ByteOrder::Big => v.to_be_bytes(),
            };
            self.writer.write_all(&bytes)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn parse_big_endian_header() {
        let mut bytes = b"PF\n2 1\n1.0\n".to_vec();
        for v in [1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0] {
            bytes.extend_from_slice(&v.to_be_bytes());
        }
        let mut decoder = PfmDecoder::new(Cursor::new(bytes));
        let header = decoder.read_header().unwrap();
        assert_eq!(header.color, PfmColor::Color);
        assert_eq!((header.width, header.height), (2, 1));
        assert_eq!(header.byte_order, ByteOrder::Big);

        let mut row = [0.0f32; 6];
        decoder.read_scanline(&mut row).unwrap();
        assert_eq!(row, [1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn parse_little_endian_grayscale() {
        let mut bytes = b"Pf\r\n1 1\r\n-0.5\n".to_vec();
        bytes.extend_from_slice(&0.25f32.to_le_bytes());
        let mut decoder = PfmDecoder::new(Cursor::new(bytes));
        let header = decoder.read_header().unwrap();
        assert_eq!(header.color, PfmColor::Grayscale);
        assert_eq!(header.byte_order, ByteOrder::Little);
        assert_eq!(header.scale, 0.5);

        let mut row = [0.0f32; 1];
        decoder.read_scanline(&mut row).unwrap();
        assert_eq!(row[0], 0.25);
    }

    #[test]
    fn rejects_bad_header() {
        let mut decoder = PfmDecoder::new(Cursor::new(b"P6\n1 1\n255\n".to_vec()));
        assert!(matches!(decoder.read_header(), Err(IoError::InvalidHeader(_))));

        let mut decoder = PfmDecoder::new(Cursor::new(b"PF\n1 x\n-1\n".to_vec()));
        assert!(matches!(decoder.read_header(), Err(IoError::InvalidHeader(_))));

        let mut decoder = PfmDecoder::new(Cursor::new(b"PF\n1 1\n0\n".to_vec()));
        assert!(matches!(decoder.read_header(), Err(IoError::InvalidHeader(_))));
    }

    #[test]
    fn truncated_scanline_is_io_error() {
        let mut decoder = PfmDecoder::new(Cursor::new(b"Pf\n2 1\n-1\n\0\0".to_vec()));
        decoder.read_header().unwrap();
        let mut row = [0.0f32; 2];
        assert!(matches!(decoder.read_scanline(&mut row), Err(IoError::Io(_))));
    }

    #[test]
    fn encoder_writes_declared_order() {
        let mut encoder = PfmEncoder::new(Vec::new());
        encoder
            .write_header(&PfmHeader {
                color: PfmColor::Grayscale,
                width: 1,
                height: 1,
                byte_order: ByteOrder::Big,
                scale: 1.0,
            })
            .unwrap();
        encoder.write_scanline(&[1.5]).unwrap();
        let bytes = encoder.into_inner();

        let mut expected = b"Pf\n1 1\n1\n".to_vec();
        expected.extend_from_slice(&1.5f32.to_be_bytes());
        assert_eq!(bytes, expected);
    }
}
