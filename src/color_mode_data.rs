//! Color-mode data block (§3 "Color map"): the 768-byte Indexed palette, an
//! opaque Duotone blob, or the synthetic 2-entry Bitmap palette.
//!
//! No teacher precedent (`chinedufn-psd` never read this block at all);
//! grounded in GIMP's `psd-util.c` palette loader for the planar
//! R-plane/G-plane/B-plane layout (confirmed in SPEC_FULL.md §3).

use crate::color::ColorMode;
use crate::error::{PsdError, Result};
use crate::io::{ByteReader, ByteWriter, Endian, Version};
use std::io::{Read, Seek, Write};

const INDEXED_PALETTE_LEN: usize = 768;

/// The color-mode data block, parsed per `color_mode`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColorModeData {
    /// No color-mode data (Grayscale, RGB, CMYK, Multichannel, Lab).
    Empty,
    /// 256 R values, then 256 G values, then 256 B values.
    IndexedPalette { red: Vec<u8>, green: Vec<u8>, blue: Vec<u8> },
    /// Opaque Duotone payload, preserved verbatim.
    Duotone(Vec<u8>),
    /// Synthesized for Bitmap mode; not actually present on disk.
    BitmapPalette,
}

impl ColorModeData {
    pub fn read<R: Read + Seek>(
        reader: &mut ByteReader<R>,
        _version: Version,
        color_mode: ColorMode,
    ) -> Result<Self> {
        // Unlike the top-level block/layer-info lengths, this field does not
        // widen to u64 for PSB (§6 "Color-mode data: u32 length").
        let len = reader.read_u32(Endian::Big)? as usize;
        let bytes = reader.read_bytes(len)?;

        match color_mode {
            ColorMode::Bitmap => Ok(ColorModeData::BitmapPalette),
            ColorMode::Indexed => {
                if bytes.len() != INDEXED_PALETTE_LEN {
                    return Err(PsdError::corrupt(format!(
                        "indexed palette length {} != 768",
                        bytes.len()
                    )));
                }
                Ok(ColorModeData::IndexedPalette {
                    red: bytes[0..256].to_vec(),
                    green: bytes[256..512].to_vec(),
                    blue: bytes[512..768].to_vec(),
                })
            }
            ColorMode::Duotone => Ok(ColorModeData::Duotone(bytes)),
            _ => Ok(ColorModeData::Empty),
        }
    }

    pub fn write<W: Write + Seek>(&self, writer: &mut ByteWriter<W>, _version: Version) -> Result<()> {
        // This length field stays u32 even for PSB (§6); force that width
        // regardless of the document version.
        let token = writer.reserve_length(Version::Psd)?;
        match self {
            ColorModeData::Empty | ColorModeData::BitmapPalette => {}
            ColorModeData::IndexedPalette { red, green, blue } => {
                writer.write_bytes(red)?;
                writer.write_bytes(green)?;
                writer.write_bytes(blue)?;
            }
            ColorModeData::Duotone(bytes) => writer.write_bytes(bytes)?,
        }
        writer.patch_length(token)?;
        Ok(())
    }

    /// The palette entry at `index` as `(r, g, b)`, synthesizing Bitmap's
    /// 2-entry black/white palette.
    pub fn palette_entry(&self, index: u8) -> Option<(u8, u8, u8)> {
        match self {
            ColorModeData::BitmapPalette => Some(if index == 0 {
                (0, 0, 0)
            } else {
                (255, 255, 255)
            }),
            ColorModeData::IndexedPalette { red, green, blue } => {
                let i = index as usize;
                Some((*red.get(i)?, *green.get(i)?, *blue.get(i)?))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn reads_indexed_palette_planes() {
        let mut bytes = vec![0u8; 768];
        bytes[0] = 10; // red[0]
        bytes[256] = 20; // green[0]
        bytes[512] = 30; // blue[0]
        let mut payload = vec![0, 0, 3, 0]; // u32 len = 768
        payload.extend_from_slice(&bytes);
        payload[0..4].copy_from_slice(&768u32.to_be_bytes());

        let mut r = ByteReader::new(Cursor::new(payload));
        let data = ColorModeData::read(&mut r, Version::Psd, ColorMode::Indexed).unwrap();
        assert_eq!(data.palette_entry(0), Some((10, 20, 30)));
    }

    #[test]
    fn bitmap_mode_synthesizes_palette_even_with_empty_block() {
        let payload = 0u32.to_be_bytes().to_vec();
        let mut r = ByteReader::new(Cursor::new(payload));
        let data = ColorModeData::read(&mut r, Version::Psd, ColorMode::Bitmap).unwrap();
        assert_eq!(data.palette_entry(0), Some((0, 0, 0)));
        assert_eq!(data.palette_entry(1), Some((255, 255, 255)));
    }

    #[test]
    fn rgb_mode_has_no_palette() {
        let payload = 0u32.to_be_bytes().to_vec();
        let mut r = ByteReader::new(Cursor::new(payload));
        let data = ColorModeData::read(&mut r, Version::Psd, ColorMode::Rgb).unwrap();
        assert_eq!(data, ColorModeData::Empty);
        assert_eq!(data.palette_entry(0), None);
    }
}
