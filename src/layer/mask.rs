//! Layer-mask sub-record (§3 "Layer-mask sub-record invariants", §4.6).
//!
//! No teacher precedent — `chinedufn-psd`'s old reader skips mask bytes
//! entirely (`layer_and_mask_information_section/mod.rs`). Built fresh from
//! the invariants `spec.md` states directly, using the bounded-seek tolerant
//! recovery pattern the rest of this reader uses for declared-length blocks.

use crate::error::{PsdError, Result};
use crate::io::{ByteReader, ByteWriter, Endian};
use std::io::{Read, Seek, Write};

const FLAG_RENDERED: u8 = 0b0000_1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaskRect {
    pub top: i32,
    pub left: i32,
    pub bottom: i32,
    pub right: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RealMask {
    pub flags: u8,
    pub default_color: u8,
    pub rect: MaskRect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayerMask {
    pub rect: MaskRect,
    pub default_color: u8,
    pub flags: u8,
    /// Present when the sub-record is >= 36 bytes: a second, disk-relative
    /// rectangle/flags/color that overrides `rect`/`flags`/`default_color`.
    pub real: Option<RealMask>,
}

impl LayerMask {
    /// True if the `rendered` flag bit is set: the stored rectangle may be
    /// the degenerate `(0, 0, 0, -1)` placeholder and must not be rejected.
    pub fn is_rendered(&self) -> bool {
        self.flags & FLAG_RENDERED != 0
    }

    pub fn is_disabled(&self) -> bool {
        self.flags & 0b0000_0010 != 0
    }

    pub fn is_inverted(&self) -> bool {
        self.flags & 0b0001_0000 != 0
    }

    pub fn is_relative_to_layer(&self) -> bool {
        self.flags & 0b0000_0001 != 0
    }
}

fn read_rect<R: Read + Seek>(reader: &mut ByteReader<R>) -> Result<MaskRect> {
    Ok(MaskRect {
        top: reader.read_i32(Endian::Big)?,
        left: reader.read_i32(Endian::Big)?,
        bottom: reader.read_i32(Endian::Big)?,
        right: reader.read_i32(Endian::Big)?,
    })
}

/// Reads the mask sub-record including its own length prefix. Returns `None`
/// for length 0. Always leaves the stream positioned at the declared end,
/// even if the payload shape doesn't match what we expected to parse.
pub fn read_layer_mask<R: Read + Seek>(reader: &mut ByteReader<R>) -> Result<Option<LayerMask>> {
    let len = reader.read_u32(Endian::Big)? as u64;
    if len == 0 {
        return Ok(None);
    }
    let start = reader.position()?;
    let end = start + len;

    let rect = read_rect(reader)?;
    let default_color = reader.read_u8()?;
    let flags = reader.read_u8()?;

    // §3: the rendered-flag case allows the stored rectangle to be the
    // degenerate (0,0,0,-1) placeholder; otherwise bottom < top is corrupt.
    if flags & FLAG_RENDERED == 0 && rect.bottom < rect.top {
        return Err(PsdError::corrupt("layer mask rectangle has bottom < top"));
    }

    let real = if len >= 36 {
        let real_flags = reader.read_u8()?;
        let real_default_color = reader.read_u8()?;
        let real_rect = read_rect(reader)?;
        Some(RealMask {
            flags: real_flags,
            default_color: real_default_color,
            rect: real_rect,
        })
    } else {
        None
    };

    reader.seek(end)?;

    Ok(Some(LayerMask {
        rect,
        default_color,
        flags,
        real,
    }))
}

fn write_rect<W: Write + Seek>(writer: &mut ByteWriter<W>, rect: &MaskRect) -> Result<()> {
    writer.write_i32(rect.top, Endian::Big)?;
    writer.write_i32(rect.left, Endian::Big)?;
    writer.write_i32(rect.bottom, Endian::Big)?;
    writer.write_i32(rect.right, Endian::Big)?;
    Ok(())
}

/// Writes the mask sub-record including its own length prefix, or a bare
/// zero length when `mask` is `None`.
pub fn write_layer_mask<W: Write + Seek>(
    writer: &mut ByteWriter<W>,
    mask: &Option<LayerMask>,
) -> Result<()> {
    let mask = match mask {
        Some(mask) => mask,
        None => {
            writer.write_u32(0, Endian::Big)?;
            return Ok(());
        }
    };

    let token = writer.reserve_length(crate::io::Version::Psd)?;
    write_rect(writer, &mask.rect)?;
    writer.write_u8(mask.default_color)?;
    writer.write_u8(mask.flags)?;

    if let Some(real) = &mask.real {
        writer.write_u8(real.flags)?;
        writer.write_u8(real.default_color)?;
        write_rect(writer, &real.rect)?;
    }

    writer.patch_length(token)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn zero_length_is_no_mask() {
        let bytes = 0u32.to_be_bytes().to_vec();
        let mut r = ByteReader::new(Cursor::new(bytes));
        assert_eq!(read_layer_mask(&mut r).unwrap(), None);
    }

    #[test]
    fn twenty_byte_mask_parses_rect_and_flags() {
        let mut bytes = 20u32.to_be_bytes().to_vec();
        bytes.extend_from_slice(&1i32.to_be_bytes());
        bytes.extend_from_slice(&2i32.to_be_bytes());
        bytes.extend_from_slice(&3i32.to_be_bytes());
        bytes.extend_from_slice(&4i32.to_be_bytes());
        bytes.push(255); // default color
        bytes.push(0); // flags
        bytes.extend_from_slice(&[0, 0]); // padding

        let mut r = ByteReader::new(Cursor::new(bytes));
        let mask = read_layer_mask(&mut r).unwrap().unwrap();
        assert_eq!(mask.rect, MaskRect { top: 1, left: 2, bottom: 3, right: 4 });
        assert_eq!(mask.default_color, 255);
        assert!(mask.real.is_none());
    }

    #[test]
    fn rendered_flag_allows_degenerate_rect() {
        let mut bytes = 20u32.to_be_bytes().to_vec();
        bytes.extend_from_slice(&0i32.to_be_bytes());
        bytes.extend_from_slice(&0i32.to_be_bytes());
        bytes.extend_from_slice(&0i32.to_be_bytes());
        bytes.extend_from_slice(&(-1i32).to_be_bytes());
        bytes.push(0);
        bytes.push(0b0000_1000); // rendered
        bytes.extend_from_slice(&[0, 0]);

        let mut r = ByteReader::new(Cursor::new(bytes));
        let mask = read_layer_mask(&mut r).unwrap().unwrap();
        assert!(mask.is_rendered());
    }

    #[test]
    fn degenerate_rect_without_rendered_flag_is_rejected() {
        let mut bytes = 20u32.to_be_bytes().to_vec();
        bytes.extend_from_slice(&0i32.to_be_bytes());
        bytes.extend_from_slice(&0i32.to_be_bytes());
        bytes.extend_from_slice(&0i32.to_be_bytes());
        bytes.extend_from_slice(&(-1i32).to_be_bytes());
        bytes.push(0);
        bytes.push(0); // not rendered
        bytes.extend_from_slice(&[0, 0]);

        let mut r = ByteReader::new(Cursor::new(bytes));
        assert!(read_layer_mask(&mut r).is_err());
    }
}
