//! Format detection utilities.
//!
//! Detects image formats from file extensions and magic bytes.

use crate::IoResult;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Supported container formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Portable float map.
    Pfm,
    /// Radiance RGBE picture.
    Hdr,
    /// OpenEXR.
    Exr,
    /// Common 8-bit formats decoded by the `image` crate.
    Ldr,
    /// Unknown/unsupported format.
    Unknown,
}

impl Format {
    /// Detects format from file path (magic bytes first, then extension).
    pub fn detect<P: AsRef<Path>>(path: P) -> IoResult<Self> {
        let path = path.as_ref();

        if let Ok(format) = Self::from_magic_bytes(path) {
            if format != Format::Unknown {
                return Ok(format);
            }
        }

        Ok(Self::from_extension(path))
    }

    /// Detects format from file extension only.
    pub fn from_extension<P: AsRef<Path>>(path: P) -> Self {
        let ext = path
            .as_ref()
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());

        match ext.as_deref() {
            // float maps are commonly saved as .ppm
            Some("pfm") | Some("ppm") => Format::Pfm,
            Some("hdr") | Some("pic") | Some("rgbe") => Format::Hdr,
            Some("exr") => Format::Exr,
            Some("png") | Some("jpg") | Some("jpeg") | Some("bmp") | Some("tga")
            | Some("gif") | Some("pgm") | Some("pnm") => Format::Ldr,
            _ => Format::Unknown,
        }
    }

    /// Detects format from file magic bytes.
    pub fn from_magic_bytes<P: AsRef<Path>>(path: P) -> IoResult<Self> {
        let mut file = File::open(path)?;
        let mut header = [0u8; 8];

        let bytes_read = file.read(&mut header)?;
        Ok(Self::from_bytes(&header[..bytes_read]))
    }

    /// Detects format from raw bytes (magic number check).
    pub fn from_bytes(bytes: &[u8]) -> Self {
        if bytes.len() < 2 {
            return Format::Unknown;
        }

        // PFM: "PF" (color) or "Pf" (grayscale) followed by whitespace
        if bytes[0] == b'P'
            && (bytes[1] == b'F' || bytes[1] == b'f')
            && bytes.get(2).is_some_and(u8::is_ascii_whitespace)
        {
            return Format::Pfm;
        }

        // HDR: "#?"
        if bytes[0..2] == [b'#', b'?'] {
            return Format::Hdr;
        }

        // EXR: 0x76 0x2f 0x31 0x01
        if bytes.len() >= 4 && bytes[0..4] == [0x76, 0x2f, 0x31, 0x01] {
            return Format::Exr;
        }

        // PNG
        if bytes.len() >= 8 && bytes[0..8] == [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A] {
            return Format::Ldr;
        }

        // JPEG: 0xFF 0xD8 0xFF
        if bytes.len() >= 3 && bytes[0..3] == [0xFF, 0xD8, 0xFF] {
            return Format::Ldr;
        }

        // GIF87a / GIF89a
        if bytes.len() >= 4 && &bytes[0..4] == b"GIF8" {
            return Format::Ldr;
        }

        // BMP
        if &bytes[0..2] == b"BM" {
            return Format::Ldr;
        }

        // Binary/ASCII PNM: P1..P7
        if bytes[0] == b'P' && (b'1'..=b'7').contains(&bytes[1]) {
            return Format::Ldr;
        }

        Format::Unknown
    }
}
