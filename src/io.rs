//! Endian-aware sequential I/O over a seekable stream.
//!
//! Generalizes the teacher's `PsdCursor` (which only read big-endian bytes out
//! of an in-memory `Cursor<&[u8]>`) to a generic `Read + Seek` / `Write + Seek`
//! stream with an explicit per-call endianness, since PSD standard fields are
//! big-endian but `MIB8`-tagged additional-layer-info blocks switch the whole
//! nested scope to little-endian (§9 "Endianness mode").

use crate::error::{PsdError, Result};
use byteorder::{BigEndian, LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Read, Seek, SeekFrom, Write};

/// Byte order for a single field or an entire nested scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    Big,
    Little,
}

/// Selects whether length fields are 32-bit (PSD) or 64-bit (PSB).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Version {
    Psd,
    Psb,
}

impl Version {
    pub fn from_u16(v: u16) -> Result<Self> {
        match v {
            1 => Ok(Version::Psd),
            2 => Ok(Version::Psb),
            other => Err(PsdError::UnsupportedVersion(other)),
        }
    }

    pub fn as_u16(self) -> u16 {
        match self {
            Version::Psd => 1,
            Version::Psb => 2,
        }
    }
}

fn eof_to_unexpected(e: std::io::Error) -> PsdError {
    if e.kind() == std::io::ErrorKind::UnexpectedEof {
        PsdError::UnexpectedEof
    } else {
        PsdError::Io(e)
    }
}

/// Sequential reader over a seekable stream.
pub struct ByteReader<R> {
    inner: R,
}

impl<R: Read + Seek> ByteReader<R> {
    pub fn new(inner: R) -> Self {
        ByteReader { inner }
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    pub fn get_mut(&mut self) -> &mut R {
        &mut self.inner
    }

    pub fn position(&mut self) -> Result<u64> {
        Ok(self.inner.stream_position()?)
    }

    pub fn seek(&mut self, absolute: u64) -> Result<()> {
        self.inner.seek(SeekFrom::Start(absolute))?;
        Ok(())
    }

    pub fn skip(&mut self, delta: i64) -> Result<()> {
        self.inner.seek(SeekFrom::Current(delta))?;
        Ok(())
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        self.inner.read_u8().map_err(eof_to_unexpected)
    }

    pub fn read_i8(&mut self) -> Result<i8> {
        self.inner.read_i8().map_err(eof_to_unexpected)
    }

    pub fn read_u16(&mut self, endian: Endian) -> Result<u16> {
        match endian {
            Endian::Big => self.inner.read_u16::<BigEndian>(),
            Endian::Little => self.inner.read_u16::<LittleEndian>(),
        }
        .map_err(eof_to_unexpected)
    }

    pub fn read_i16(&mut self, endian: Endian) -> Result<i16> {
        match endian {
            Endian::Big => self.inner.read_i16::<BigEndian>(),
            Endian::Little => self.inner.read_i16::<LittleEndian>(),
        }
        .map_err(eof_to_unexpected)
    }

    pub fn read_u32(&mut self, endian: Endian) -> Result<u32> {
        match endian {
            Endian::Big => self.inner.read_u32::<BigEndian>(),
            Endian::Little => self.inner.read_u32::<LittleEndian>(),
        }
        .map_err(eof_to_unexpected)
    }

    pub fn read_i32(&mut self, endian: Endian) -> Result<i32> {
        match endian {
            Endian::Big => self.inner.read_i32::<BigEndian>(),
            Endian::Little => self.inner.read_i32::<LittleEndian>(),
        }
        .map_err(eof_to_unexpected)
    }

    pub fn read_u64(&mut self, endian: Endian) -> Result<u64> {
        match endian {
            Endian::Big => self.inner.read_u64::<BigEndian>(),
            Endian::Little => self.inner.read_u64::<LittleEndian>(),
        }
        .map_err(eof_to_unexpected)
    }

    /// Reads a u32 for PSD, u64 for PSB; always big-endian (length fields are
    /// never little-endian even inside `MIB8` scopes).
    pub fn read_len(&mut self, version: Version) -> Result<u64> {
        match version {
            Version::Psd => Ok(self.read_u32(Endian::Big)? as u64),
            Version::Psb => self.read_u64(Endian::Big),
        }
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; n];
        self.inner.read_exact(&mut buf).map_err(eof_to_unexpected)?;
        Ok(buf)
    }

    pub fn read_array4(&mut self) -> Result<[u8; 4]> {
        let mut buf = [0u8; 4];
        self.inner.read_exact(&mut buf).map_err(eof_to_unexpected)?;
        Ok(buf)
    }

    pub fn peek_u8(&mut self) -> Result<u8> {
        let pos = self.position()?;
        let v = self.read_u8();
        self.seek(pos)?;
        v
    }

    /// Advances the stream until `position() - base` is a multiple of
    /// `multiple`, discarding the skipped bytes.
    pub fn pad_to(&mut self, base: u64, multiple: u64) -> Result<()> {
        let pos = self.position()?;
        let consumed = pos - base;
        let remainder = consumed % multiple;
        if remainder != 0 {
            self.skip((multiple - remainder) as i64)?;
        }
        Ok(())
    }
}

/// Sequential writer over a seekable stream.
pub struct ByteWriter<W> {
    inner: W,
}

/// Width of a reserved length field, recorded so `patch_length` knows how many
/// bytes to subtract for the field itself.
#[derive(Debug, Clone, Copy)]
enum LenWidth {
    U32,
    U64,
}

/// A placeholder length field's position, to be back-patched once the framed
/// payload has been written.
#[derive(Debug, Clone, Copy)]
pub struct LengthToken {
    field_pos: u64,
    width: LenWidth,
}

impl<W: Write + Seek> ByteWriter<W> {
    pub fn new(inner: W) -> Self {
        ByteWriter { inner }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }

    pub fn position(&mut self) -> Result<u64> {
        Ok(self.inner.stream_position()?)
    }

    pub fn seek(&mut self, absolute: u64) -> Result<()> {
        self.inner.seek(SeekFrom::Start(absolute))?;
        Ok(())
    }

    pub fn write_u8(&mut self, v: u8) -> Result<()> {
        self.inner.write_u8(v)?;
        Ok(())
    }

    pub fn write_i8(&mut self, v: i8) -> Result<()> {
        self.inner.write_i8(v)?;
        Ok(())
    }

    pub fn write_u16(&mut self, v: u16, endian: Endian) -> Result<()> {
        match endian {
            Endian::Big => self.inner.write_u16::<BigEndian>(v),
            Endian::Little => self.inner.write_u16::<LittleEndian>(v),
        }?;
        Ok(())
    }

    pub fn write_i16(&mut self, v: i16, endian: Endian) -> Result<()> {
        match endian {
            Endian::Big => self.inner.write_i16::<BigEndian>(v),
            Endian::Little => self.inner.write_i16::<LittleEndian>(v),
        }?;
        Ok(())
    }

    pub fn write_u32(&mut self, v: u32, endian: Endian) -> Result<()> {
        match endian {
            Endian::Big => self.inner.write_u32::<BigEndian>(v),
            Endian::Little => self.inner.write_u32::<LittleEndian>(v),
        }?;
        Ok(())
    }

    pub fn write_i32(&mut self, v: i32, endian: Endian) -> Result<()> {
        match endian {
            Endian::Big => self.inner.write_i32::<BigEndian>(v),
            Endian::Little => self.inner.write_i32::<LittleEndian>(v),
        }?;
        Ok(())
    }

    pub fn write_u64(&mut self, v: u64, endian: Endian) -> Result<()> {
        match endian {
            Endian::Big => self.inner.write_u64::<BigEndian>(v),
            Endian::Little => self.inner.write_u64::<LittleEndian>(v),
        }?;
        Ok(())
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.inner.write_all(bytes)?;
        Ok(())
    }

    pub fn write_len(&mut self, len: u64, version: Version) -> Result<()> {
        match version {
            Version::Psd => self.write_u32(len as u32, Endian::Big),
            Version::Psb => self.write_u64(len, Endian::Big),
        }
    }

    /// Writes a placeholder length field and returns a token to back-patch
    /// once the framed payload has been written.
    pub fn reserve_length(&mut self, version: Version) -> Result<LengthToken> {
        let field_pos = self.position()?;
        let width = match version {
            Version::Psd => LenWidth::U32,
            Version::Psb => LenWidth::U64,
        };
        match width {
            LenWidth::U32 => self.write_u32(0, Endian::Big)?,
            LenWidth::U64 => self.write_u64(0, Endian::Big)?,
        }
        Ok(LengthToken { field_pos, width })
    }

    /// Seeks back to the reserved field, writes `current_position -
    /// token_position - size_of_field`, then restores the stream to its
    /// current end so writing can continue.
    pub fn patch_length(&mut self, token: LengthToken) -> Result<()> {
        let end = self.position()?;
        let field_width = match token.width {
            LenWidth::U32 => 4,
            LenWidth::U64 => 8,
        };
        let len = end - token.field_pos - field_width;
        self.seek(token.field_pos)?;
        match token.width {
            LenWidth::U32 => self.write_u32(len as u32, Endian::Big)?,
            LenWidth::U64 => self.write_u64(len, Endian::Big)?,
        }
        self.seek(end)?;
        Ok(())
    }

    /// Pads with a single zero byte if `position() - base` is currently odd
    /// (or, more generally, not a multiple of `multiple`).
    pub fn pad_to(&mut self, base: u64, multiple: u64) -> Result<()> {
        let pos = self.position()?;
        let written = pos - base;
        let remainder = written % multiple;
        if remainder != 0 {
            for _ in 0..(multiple - remainder) {
                self.write_u8(0)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn round_trips_big_and_little_endian_fields() {
        let mut buf = Cursor::new(Vec::new());
        {
            let mut w = ByteWriter::new(&mut buf);
            w.write_u32(0x01020304, Endian::Big).unwrap();
            w.write_u32(0x01020304, Endian::Little).unwrap();
        }
        let mut r = ByteReader::new(Cursor::new(buf.into_inner()));
        assert_eq!(r.read_u32(Endian::Big).unwrap(), 0x01020304);
        assert_eq!(r.read_u32(Endian::Little).unwrap(), 0x01020304);
    }

    #[test]
    fn patch_length_computes_payload_size_only() {
        let mut buf = Cursor::new(Vec::new());
        let mut w = ByteWriter::new(&mut buf);
        let token = w.reserve_length(Version::Psd).unwrap();
        w.write_bytes(&[1, 2, 3, 4, 5]).unwrap();
        w.patch_length(token).unwrap();

        let mut r = ByteReader::new(Cursor::new(buf.into_inner()));
        assert_eq!(r.read_len(Version::Psd).unwrap(), 5);
    }

    #[test]
    fn pad_to_reaches_next_multiple() {
        let mut buf = Cursor::new(vec![0u8; 16]);
        let mut r = ByteReader::new(&mut buf);
        r.seek(3).unwrap();
        r.pad_to(0, 4).unwrap();
        assert_eq!(r.position().unwrap(), 4);
    }
}
