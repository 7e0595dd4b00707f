//! Pascal strings and length-prefixed UTF-16BE strings (§4.2 "StringCodec").
//!
//! The teacher never implemented a string codec (`chinedufn-psd` skips layer
//! names entirely in its old reader); this is grounded in
//! `lifegpc-msg-tool`'s `PascalString`/`PascalString4`/`UnicodeString`
//! pack/unpack methods, generalized to an explicit padding multiple instead
//! of two hardcoded variants.

use crate::error::Result;
use crate::io::{ByteReader, ByteWriter, Endian};
use std::io::{Read, Seek, Write};

/// Reads a length-prefixed (u8) pascal string, padded so the total bytes
/// consumed (1 length byte + payload) is a multiple of `pad_to`.
pub fn read_pascal_string<R: Read + Seek>(
    reader: &mut ByteReader<R>,
    pad_to: u64,
) -> Result<String> {
    let start = reader.position()?;
    let len = reader.read_u8()? as usize;
    let bytes = reader.read_bytes(len)?;
    reader.pad_to(start, pad_to)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Writes a pascal string, clipping to 255 bytes, padded to a multiple of
/// `pad_to`.
pub fn write_pascal_string<W: Write + Seek>(
    writer: &mut ByteWriter<W>,
    s: &str,
    pad_to: u64,
) -> Result<()> {
    let start = writer.position()?;
    let bytes = s.as_bytes();
    let clipped = &bytes[..bytes.len().min(255)];
    writer.write_u8(clipped.len() as u8)?;
    writer.write_bytes(clipped)?;
    writer.pad_to(start, pad_to)?;
    Ok(())
}

/// Reads a u32-prefixed (count of UTF-16 code units) big-endian unicode
/// string, padded to a multiple of `pad_to` total bytes.
pub fn read_unicode_string<R: Read + Seek>(
    reader: &mut ByteReader<R>,
    pad_to: u64,
) -> Result<String> {
    let start = reader.position()?;
    let units = reader.read_u32(Endian::Big)? as usize;
    let mut code_units = Vec::with_capacity(units);
    for _ in 0..units {
        code_units.push(reader.read_u16(Endian::Big)?);
    }
    reader.pad_to(start, pad_to)?;
    Ok(String::from_utf16_lossy(&code_units))
}

pub fn write_unicode_string<W: Write + Seek>(
    writer: &mut ByteWriter<W>,
    s: &str,
    pad_to: u64,
) -> Result<()> {
    let start = writer.position()?;
    let units: Vec<u16> = s.encode_utf16().collect();
    writer.write_u32(units.len() as u32, Endian::Big)?;
    for unit in units {
        writer.write_u16(unit, Endian::Big)?;
    }
    writer.pad_to(start, pad_to)?;
    Ok(())
}
