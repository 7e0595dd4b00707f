//! Additional-info block chain (§3 "Additional-info block", §4.6 steps 5-6).
//!
//! Grounded in `lifegpc-msg-tool/src/utils/psd/types.rs`'s
//! `AdditionalLayerInfo` (signature/key/length framing), extended with the
//! PSB u64-length-key tolerance `spec.md` calls out ("data_len: u32 or
//! u64-for-selected-keys") and parsed interpretations for the keys
//! `LayerInfoReader` actually consumes (`lsct`/`lsdk`, `luni`, `lyid`).

use crate::error::Result;
use crate::io::{ByteReader, ByteWriter, Endian, Version};
use crate::strings::{read_unicode_string, write_unicode_string};
use std::io::{Read, Seek, Write};

/// Keys whose length field is u64 even inside a PSB-version document whose
/// *other* fields already use u64 lengths. Per Adobe's documented tolerance
/// for "big" additional-info blocks.
const LONG_LENGTH_KEYS: &[&[u8; 4]] = &[
    b"LMsk", b"Lr16", b"Lr32", b"Layr", b"Mt16", b"Mt32", b"Mtrn", b"Alph", b"FMsk", b"lnk2",
    b"FEid", b"FXid", b"PxSD",
];

fn is_long_length_key(key: &[u8; 4], version: Version) -> bool {
    version == Version::Psb && LONG_LENGTH_KEYS.contains(&key)
}

/// One raw additional-info block: signature-checked, key-tagged, data kept
/// as opaque bytes for the caller to interpret further.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdditionalInfoBlock {
    pub key: [u8; 4],
    pub data: Vec<u8>,
}

/// Section-divider payload (`lsct`/`lsdk`): group-start/group-end marker
/// plus an optional true blend mode for pass-through groups (§4.6, §4.7).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionDividerKind {
    Other,
    OpenFolder,
    ClosedFolder,
    BoundingSectionDivider,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionDivider {
    pub kind: SectionDividerKind,
    pub blend_mode: Option<[u8; 4]>,
}

pub fn read_additional_info_block<R: Read + Seek>(
    reader: &mut ByteReader<R>,
    version: Version,
) -> Result<AdditionalInfoBlock> {
    let _signature = reader.read_array4()?; // "8BIM" or "8B64"
    let key = reader.read_array4()?;
    let len = if is_long_length_key(&key, version) {
        reader.read_u64(Endian::Big)?
    } else {
        reader.read_u32(Endian::Big)? as u64
    };

    let start = reader.position()?;
    let padded_len = ((len + 3) / 4) * 4;
    let data = reader.read_bytes(len as usize)?;
    reader.seek(start + padded_len)?;

    Ok(AdditionalInfoBlock { key, data })
}

/// Reads blocks until `end_pos`, tolerating a final short block by stopping
/// early rather than erroring (§4.6 "tolerant recovery").
pub fn read_additional_info_chain<R: Read + Seek>(
    reader: &mut ByteReader<R>,
    end_pos: u64,
    version: Version,
) -> Result<Vec<AdditionalInfoBlock>> {
    let mut blocks = Vec::new();
    while reader.position()? + 12 <= end_pos {
        match read_additional_info_block(reader, version) {
            Ok(block) => blocks.push(block),
            Err(_) => break,
        }
    }
    reader.seek(end_pos)?;
    Ok(blocks)
}

pub fn write_additional_info_block<W: Write + Seek>(
    writer: &mut ByteWriter<W>,
    key: &[u8; 4],
    data: &[u8],
    version: Version,
) -> Result<()> {
    writer.write_bytes(b"8BIM")?;
    writer.write_bytes(key)?;
    if is_long_length_key(key, version) {
        writer.write_u64(data.len() as u64, Endian::Big)?;
    } else {
        writer.write_u32(data.len() as u32, Endian::Big)?;
    }
    let start = writer.position()?;
    writer.write_bytes(data)?;
    writer.pad_to(start, 4)?;
    Ok(())
}

pub fn parse_section_divider(block: &AdditionalInfoBlock) -> Result<SectionDivider> {
    let mut r = ByteReader::new(std::io::Cursor::new(block.data.clone()));
    let kind_code = r.read_u32(Endian::Big)?;
    let kind = match kind_code {
        0 => SectionDividerKind::Other,
        1 => SectionDividerKind::OpenFolder,
        2 => SectionDividerKind::ClosedFolder,
        3 => SectionDividerKind::BoundingSectionDivider,
        _ => SectionDividerKind::Other,
    };

    let blend_mode = if block.data.len() >= 12 {
        let _signature = r.read_array4()?;
        Some(r.read_array4()?)
    } else {
        None
    };

    Ok(SectionDivider { kind, blend_mode })
}

pub fn parse_unicode_name(block: &AdditionalInfoBlock) -> Result<String> {
    let mut r = ByteReader::new(std::io::Cursor::new(block.data.clone()));
    read_unicode_string(&mut r, 1)
}

pub fn write_unicode_name_block<W: Write + Seek>(
    writer: &mut ByteWriter<W>,
    name: &str,
    version: Version,
) -> Result<()> {
    let mut payload = Vec::new();
    {
        let mut w = ByteWriter::new(std::io::Cursor::new(&mut payload));
        write_unicode_string(&mut w, name, 1)?;
    }
    write_additional_info_block(writer, b"luni", &payload, version)
}

pub fn parse_layer_id(block: &AdditionalInfoBlock) -> Result<u32> {
    let mut r = ByteReader::new(std::io::Cursor::new(block.data.clone()));
    r.read_u32(Endian::Big)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn block(key: &[u8; 4], data: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(b"8BIM");
        out.extend_from_slice(key);
        out.extend_from_slice(&(data.len() as u32).to_be_bytes());
        out.extend_from_slice(data);
        while out.len() % 4 != 0 {
            out.push(0);
        }
        out
    }

    #[test]
    fn reads_section_divider_with_blend_mode() {
        let mut data = 1u32.to_be_bytes().to_vec(); // open folder
        data.extend_from_slice(b"8BIM");
        data.extend_from_slice(b"pass");

        let bytes = block(b"lsct", &data);
        let mut r = ByteReader::new(Cursor::new(bytes));
        let raw = read_additional_info_block(&mut r, Version::Psd).unwrap();
        let divider = parse_section_divider(&raw).unwrap();
        assert_eq!(divider.kind, SectionDividerKind::OpenFolder);
        assert_eq!(divider.blend_mode, Some(*b"pass"));
    }

    #[test]
    fn reads_layer_id() {
        let data = 42u32.to_be_bytes().to_vec();
        let bytes = block(b"lyid", &data);
        let mut r = ByteReader::new(Cursor::new(bytes));
        let raw = read_additional_info_block(&mut r, Version::Psd).unwrap();
        assert_eq!(parse_layer_id(&raw).unwrap(), 42);
    }

    #[test]
    fn chain_stops_at_declared_end() {
        let mut bytes = block(b"lyid", &1u32.to_be_bytes());
        bytes.extend_from_slice(&block(b"lyid", &2u32.to_be_bytes()));
        let end = bytes.len() as u64;
        let mut r = ByteReader::new(Cursor::new(bytes));
        let chain = read_additional_info_chain(&mut r, end, Version::Psd).unwrap();
        assert_eq!(chain.len(), 2);
    }
}
