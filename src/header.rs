//! File header section (§3 "Image header", §6 "26 bytes").
//!
//! Grounded in the teacher's `file_header_section.rs`: the newtype-plus-
//! `::new()`-validation shape (`ChannelCount`, `PsdWidth`, `PsdHeight`,
//! `PsdDepth`) is kept, generalized from the teacher's fixed PSD-only limits
//! to the PSB-aware tolerances this crate documents (channel count tolerance
//! widened to 99, consistent with `spec.md`'s stated "extended tolerance").

use crate::color::ColorMode;
use crate::error::{PsdError, Result};
use crate::io::{ByteReader, ByteWriter, Endian, Version};
use std::io::{Read, Seek, Write};

const SIGNATURE: [u8; 4] = *b"8BPS";
const MAX_CHANNELS: u16 = 99;
const MAX_DIMENSION: u32 = 30_000;

/// Number of channels declared in the header, `1..=99`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelCount(u16);

impl ChannelCount {
    pub fn new(count: u16) -> Result<Self> {
        if count == 0 || count > MAX_CHANNELS {
            return Err(PsdError::ChannelCountExceeded(count as u32));
        }
        Ok(ChannelCount(count))
    }

    pub fn value(self) -> u16 {
        self.0
    }
}

/// Bits per channel sample, one of `{1, 8, 16, 32}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Depth(u16);

impl Depth {
    pub fn new(bps: u16) -> Result<Self> {
        match bps {
            1 | 8 | 16 | 32 => Ok(Depth(bps)),
            other => Err(PsdError::UnsupportedBps(other)),
        }
    }

    pub fn value(self) -> u16 {
        self.0
    }

    pub fn bytes_per_sample(self) -> u32 {
        match self.0 {
            1 => 1, // expanded to one byte per pixel after decode, not on disk
            8 => 1,
            16 => 2,
            32 => 4,
            _ => unreachable!(),
        }
    }
}

/// Parsed and validated file header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHeader {
    pub version: Version,
    pub channels: ChannelCount,
    pub rows: u32,
    pub columns: u32,
    pub depth: Depth,
    pub color_mode: ColorMode,
}

impl FileHeader {
    pub fn read<R: Read + Seek>(reader: &mut ByteReader<R>) -> Result<Self> {
        let signature = reader.read_array4()?;
        if signature != SIGNATURE {
            return Err(PsdError::NotPsd);
        }

        let version = Version::from_u16(reader.read_u16(Endian::Big)?)?;

        let _reserved = reader.read_bytes(6)?;

        let channels = ChannelCount::new(reader.read_u16(Endian::Big)?)?;
        let rows = reader.read_u32(Endian::Big)?;
        let columns = reader.read_u32(Endian::Big)?;
        let bps = reader.read_u16(Endian::Big)?;
        let depth = Depth::new(bps)?;
        let color_mode_code = reader.read_u16(Endian::Big)?;
        let color_mode = ColorMode::new(color_mode_code, depth.value())?;

        if rows == 0 || columns == 0 {
            return Err(PsdError::InvalidDimensions { rows, columns });
        }
        if rows > MAX_DIMENSION || columns > MAX_DIMENSION {
            return Err(PsdError::TooLarge {
                width: columns,
                height: rows,
            });
        }
        (columns as u64)
            .checked_mul(depth.value() as u64)
            .ok_or(PsdError::InvalidDimensions { rows, columns })?;

        Ok(FileHeader {
            version,
            channels,
            rows,
            columns,
            depth,
            color_mode,
        })
    }

    pub fn write<W: Write + Seek>(&self, writer: &mut ByteWriter<W>) -> Result<()> {
        writer.write_bytes(&SIGNATURE)?;
        writer.write_u16(self.version.as_u16(), Endian::Big)?;
        writer.write_bytes(&[0u8; 6])?;
        writer.write_u16(self.channels.value(), Endian::Big)?;
        writer.write_u32(self.rows, Endian::Big)?;
        writer.write_u32(self.columns, Endian::Big)?;
        writer.write_u16(self.depth.value(), Endian::Big)?;
        writer.write_u16(self.color_mode.as_u16(), Endian::Big)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn valid_header_bytes() -> Vec<u8> {
        vec![
            b'8', b'B', b'P', b'S', // signature
            0, 1, // version
            0, 0, 0, 0, 0, 0, // reserved
            0, 3, // channels
            0, 0, 0, 10, // rows
            0, 0, 0, 20, // columns
            0, 8, // bps
            0, 3, // color mode RGB
        ]
    }

    #[test]
    fn reads_a_valid_header() {
        let bytes = valid_header_bytes();
        let mut r = ByteReader::new(Cursor::new(bytes));
        let header = FileHeader::read(&mut r).unwrap();
        assert_eq!(header.channels.value(), 3);
        assert_eq!(header.rows, 10);
        assert_eq!(header.columns, 20);
        assert_eq!(header.color_mode, ColorMode::Rgb);
    }

    #[test]
    fn rejects_bad_signature() {
        let mut bytes = valid_header_bytes();
        bytes[0] = b'X';
        let mut r = ByteReader::new(Cursor::new(bytes));
        assert!(matches!(FileHeader::read(&mut r), Err(PsdError::NotPsd)));
    }

    #[test]
    fn rejects_unsupported_version() {
        let mut bytes = valid_header_bytes();
        bytes[4] = 0;
        bytes[5] = 9;
        let mut r = ByteReader::new(Cursor::new(bytes));
        assert!(matches!(
            FileHeader::read(&mut r),
            Err(PsdError::UnsupportedVersion(9))
        ));
    }

    #[test]
    fn rejects_zero_channels() {
        let mut bytes = valid_header_bytes();
        bytes[12] = 0;
        bytes[13] = 0;
        let mut r = ByteReader::new(Cursor::new(bytes));
        assert!(FileHeader::read(&mut r).is_err());
    }

    #[test]
    fn round_trips_through_write() {
        let mut r = ByteReader::new(Cursor::new(valid_header_bytes()));
        let header = FileHeader::read(&mut r).unwrap();

        let mut buf = Cursor::new(Vec::new());
        let mut w = ByteWriter::new(&mut buf);
        header.write(&mut w).unwrap();

        let mut r2 = ByteReader::new(Cursor::new(buf.into_inner()));
        assert_eq!(FileHeader::read(&mut r2).unwrap(), header);
    }
}
