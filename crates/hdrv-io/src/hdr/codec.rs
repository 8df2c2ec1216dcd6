//! Radiance picture container codec.
//!
//! ```text
//! #?RADIANCE
//! FORMAT=32-bit_rle_rgbe
//! EXPOSURE=1.0
//!
//! -Y <height> +X <width>
//! <scanlines of RGBE quads, flat or new-style RLE>
//! ```
//!
//! An RLE scanline starts with `02 02 hi lo` (the scanline length), followed
//! by the four byte planes, each as runs (`count > 128`: repeat next byte
//! `count - 128` times) and literals (`count <= 128`: copy `count` bytes).
//! Old-style RLE (`01 01 01 n`) is not decoded.

use crate::traits::{ScanlineReader, ScanlineWriter};
use crate::{IoError, IoResult};
use std::fmt;
use std::io::{BufRead, Read, Write};

const MAGIC: &[u8] = b"#?";
const MAX_HEADER_LINE: usize = 4096;
const MIN_RLE_LEN: usize = 8;
const MAX_RLE_LEN: usize = 0x7fff;

/// Pixel encoding declared by the `FORMAT=` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HdrFormat {
    /// `32-bit_rle_rgbe`.
    Rle32Rgbe,
    /// `32-bit_rle_xyze`.
    Rle32Xyze,
    /// Anything else, kept verbatim.
    Other(String),
}

impl HdrFormat {
    fn parse(value: &str) -> Self {
        match value {
            "32-bit_rle_rgbe" => Self::Rle32Rgbe,
            "32-bit_rle_xyze" => Self::Rle32Xyze,
            other => Self::Other(other.to_string()),
        }
    }

    /// Header spelling of this format.
    pub fn name(&self) -> &str {
        match self {
            Self::Rle32Rgbe => "32-bit_rle_rgbe",
            Self::Rle32Xyze => "32-bit_rle_xyze",
            Self::Other(s) => s,
        }
    }
}

/// Scanline orientation from the resolution string.
///
/// The first axis is the scanline (major) axis, listed in file order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// `-Y h +X w`, the standard top-to-bottom, left-to-right layout.
    NegYPosX,
    /// `-Y h -X w`.
    NegYNegX,
    /// `+Y h -X w`.
    PosYNegX,
    /// `+Y h +X w`.
    PosYPosX,
    /// `+X w -Y h`.
    PosXNegY,
    /// `-X w -Y h`.
    NegXNegY,
    /// `-X w +Y h`.
    NegXPosY,
    /// `+X w +Y h`.
    PosXPosY,
}

impl Orientation {
    const ALL: [Orientation; 8] = [
        Self::NegYPosX,
        Self::NegYNegX,
        Self::PosYNegX,
        Self::PosYPosX,
        Self::PosXNegY,
        Self::NegXNegY,
        Self::NegXPosY,
        Self::PosXPosY,
    ];

    /// Axis tokens in file order.
    pub fn axes(self) -> (&'static str, &'static str) {
        match self {
            Self::NegYPosX => ("-Y", "+X"),
            Self::NegYNegX => ("-Y", "-X"),
            Self::PosYNegX => ("+Y", "-X"),
            Self::PosYPosX => ("+Y", "+X"),
            Self::PosXNegY => ("+X", "-Y"),
            Self::NegXNegY => ("-X", "-Y"),
            Self::NegXPosY => ("-X", "+Y"),
            Self::PosXPosY => ("+X", "+Y"),
        }
    }

    /// True if scanlines run along X (one scanline per Y value).
    pub fn is_y_major(self) -> bool {
        self.axes().0.ends_with('Y')
    }

    fn from_axes(major: &str, minor: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|o| o.axes() == (major, minor))
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (a, b) = self.axes();
        write!(f, "{} {}", a, b)
    }
}

/// Parsed Radiance header.
#[derive(Debug, Clone, PartialEq)]
pub struct HdrHeader {
    /// Declared pixel encoding.
    pub format: HdrFormat,
    /// Product of all `EXPOSURE=` lines (1.0 when absent).
    pub exposure: f64,
    /// Scanline orientation.
    pub orientation: Orientation,
    /// Extent along X.
    pub width: usize,
    /// Extent along Y.
    pub height: usize,
}

impl HdrHeader {
    /// Quads per scanline.
    pub fn scanline_len(&self) -> usize {
        if self.orientation.is_y_major() {
            self.width
        } else {
            self.height
        }
    }

    /// Number of scanlines.
    pub fn scanline_count(&self) -> usize {
        if self.orientation.is_y_major() {
            self.height
        } else {
            self.width
        }
    }
}

/// Reads a Radiance picture stream.
pub struct HdrDecoder<R> {
    reader: R,
    plane: Vec<u8>,
}

impl<R: BufRead> HdrDecoder<R> {
    /// Opens a Radiance stream for reading.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            plane: Vec::new(),
        }
    }

    /// Reads one header line without its terminator. `None` at end of stream.
    fn line(&mut self) -> IoResult<Option<String>> {
        let mut buf = Vec::new();
        let n = (&mut self.reader)
            .take(MAX_HEADER_LINE as u64)
            .read_until(b'\n', &mut buf)?;
        if n == 0 {
            return Ok(None);
        }
        if buf.last() != Some(&b'\n') && n == MAX_HEADER_LINE {
            return Err(IoError::InvalidHeader("header line too long".into()));
        }
        while matches!(buf.last(), Some(b'\n' | b'\r')) {
            buf.pop();
        }
        Ok(Some(String::from_utf8_lossy(&buf).into_owned()))
    }

    fn byte(&mut self) -> IoResult<u8> {
        let mut b = [0u8; 1];
        self.reader.read_exact(&mut b)?;
        Ok(b[0])
    }

    fn read_rle(&mut self, row: &mut [[u8; 4]]) -> IoResult<()> {
        let len = row.len();
        self.plane.resize(len, 0);
        for c in 0..4 {
            let mut x = 0;
            while x < len {
                let count = self.byte()? as usize;
                if count > 128 {
                    let run = count - 128;
                    if x + run > len {
                        return Err(IoError::DecodeError("RLE run overflows scanline".into()));
                    }
                    let value = self.byte()?;
                    self.plane[x..x + run].fill(value);
                    x += run;
                } else {
                    if count == 0 || x + count > len {
                        return Err(IoError::DecodeError("bad RLE literal length".into()));
                    }
                    self.reader.read_exact(&mut self.plane[x..x + count])?;
                    x += count;
                }
            }
            for (quad, v) in row.iter_mut().zip(&self.plane) {
                quad[c] = *v;
            }
        }
        Ok(())
    }
}

impl<R: BufRead> ScanlineReader for HdrDecoder<R> {
    type Header = HdrHeader;
    type Sample = [u8; 4];

    fn read_header(&mut self) -> IoResult<HdrHeader> {
        let first = self
            .line()?
            .ok_or_else(|| IoError::InvalidHeader("empty file".into()))?;
        if !first.as_bytes().starts_with(MAGIC) {
            return Err(IoError::InvalidHeader("missing #? signature".into()));
        }

        let mut format = HdrFormat::Rle32Rgbe;
        let mut exposure = 1.0f64;
        loop {
            let line = self
                .line()?
                .ok_or_else(|| IoError::InvalidHeader("unexpected end of header".into()))?;
            let line = line.trim();
            if line.is_empty() {
                break;
            }
            if let Some(value) = line.strip_prefix("FORMAT=") {
                format = HdrFormat::parse(value.trim());
            } else if let Some(value) = line.strip_prefix("EXPOSURE=") {
                let v: f64 = value.trim().parse().map_err(|_| {
                    IoError::InvalidHeader(format!("invalid exposure '{}'", value.trim()))
                })?;
                exposure *= v;
            }
        }

        let res = self
            .line()?
            .ok_or_else(|| IoError::InvalidHeader("missing resolution string".into()))?;
        let parts: Vec<&str> = res.split_whitespace().collect();
        let [major, n1, minor, n2] = parts.as_slice() else {
            return Err(IoError::InvalidHeader(format!("bad resolution string '{}'", res)));
        };
        let orientation = Orientation::from_axes(major, minor)
            .ok_or_else(|| IoError::InvalidHeader(format!("bad resolution string '{}'", res)))?;
        let n1: usize = n1
            .parse()
            .map_err(|_| IoError::InvalidHeader(format!("bad resolution string '{}'", res)))?;
        let n2: usize = n2
            .parse()
            .map_err(|_| IoError::InvalidHeader(format!("bad resolution string '{}'", res)))?;
        let (width, height) = if orientation.is_y_major() {
            (n2, n1)
        } else {
            (n1, n2)
        };

        Ok(HdrHeader {
            format,
            exposure,
            orientation,
            width,
            height,
        })
    }

    fn read_scanline(&mut self, row: &mut [[u8; 4]]) -> IoResult<()> {
        let len = row.len();
        if len == 0 {
            return Ok(());
        }
        let mut first = [0u8; 4];
        self.reader.read_exact(&mut first)?;

        let is_rle = (MIN_RLE_LEN..=MAX_RLE_LEN).contains(&len)
            && first[0] == 2
            && first[1] == 2
            && first[2] & 0x80 == 0;
        if is_rle {
            let encoded = (first[2] as usize) << 8 | first[3] as usize;
            if encoded != len {
                return Err(IoError::DecodeError(format!(
                    "RLE scanline length {} does not match width {}",
                    encoded, len
                )));
            }
            return self.read_rle(row);
        }
        if first[..3] == [1, 1, 1] {
            return Err(IoError::UnsupportedVariant("old-style run-length encoding".into()));
        }

        row[0] = first;
        for quad in &mut row[1..] {
            self.reader.read_exact(quad)?;
        }
        Ok(())
    }
}

/// Writes a Radiance picture stream.
pub struct HdrEncoder<W> {
    writer: W,
    rle: bool,
    plane: Vec<u8>,
}

impl<W: Write> HdrEncoder<W> {
    /// Opens a Radiance stream for writing. `rle` enables run-length
    /// encoding for scanlines whose length allows it.
    pub fn new(writer: W, rle: bool) -> Self {
        Self {
            writer,
            rle,
            plane: Vec::new(),
        }
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> ScanlineWriter for HdrEncoder<W> {
    type Header = HdrHeader;
    type Sample = [u8; 4];

    fn write_header(&mut self, header: &HdrHeader) -> IoResult<()> {
        writeln!(self.writer, "#?RADIANCE")?;
        writeln!(self.writer, "FORMAT={}", header.format.name())?;
        if header.exposure != 1.0 {
            writeln!(self.writer, "EXPOSURE={}", header.exposure)?;
        }
        writeln!(self.writer)?;
        let (a, b) = header.orientation.axes();
        let (n1, n2) = if header.orientation.is_y_major() {
            (header.height, header.width)
        } else {
            (header.width, header.height)
        };
        writeln!(self.writer, "{} {} {} {}", a, n1, b, n2)?;
        Ok(())
    }

    fn write_scanline(&mut self, row: &[[u8; 4]]) -> IoResult<()> {
        let len = row.len();
        if !self.rle || !(MIN_RLE_LEN..=MAX_RLE_LEN).contains(&len) {
            for quad in row {
                self.writer.write_all(quad)?;
            }
            return Ok(());
        }

        self.writer
            .write_all(&[2, 2, (len >> 8) as u8, (len & 0xff) as u8])?;
        for c in 0..4 {
            self.plane.clear();
            self.plane.extend(row.iter().map(|q| q[c]));
            encode_plane(&mut self.writer, &self.plane)?;
        }
        Ok(())
    }
}

/// Length of the run of equal bytes starting at `data[0]`, capped at 127.
fn run_length(data: &[u8]) -> usize {
    let first = data[0];
    data.iter().take(127).take_while(|&&b| b == first).count()
}

fn encode_plane<W: Write>(writer: &mut W, data: &[u8]) -> IoResult<()> {
    let mut i = 0;
    while i < data.len() {
        let run = run_length(&data[i..]);
        if run >= 4 {
            writer.write_all(&[(128 + run) as u8, data[i]])?;
            i += run;
            continue;
        }

        // literal until the next run worth encoding
        let start = i;
        while i < data.len() && i - start < 128 && run_length(&data[i..]) < 4 {
            i += 1;
        }
        writer.write_all(&[(i - start) as u8])?;
        writer.write_all(&data[start..i])?;
    }
    Ok(())
}
