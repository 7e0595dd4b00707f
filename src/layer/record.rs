//! Flat layer record (§3 "Layer record", §4.6 `LayerInfoReader`).
//!
//! The rectangle/channel-table shape is grounded in `chinedufn-psd`'s
//! `layer_and_mask_information_section/layer.rs`'s `LayerRecord` (top/left/
//! bottom/right plus `channel_data_lengths: Vec<(PsdChannelKind, u32)>`),
//! extended to carry the mask sub-record, blending ranges, and the full
//! additional-info chain the teacher's version skips past without reading.

use crate::error::{PsdError, Result};
use crate::io::{ByteReader, ByteWriter, Endian, Version};
use crate::layer::additional_info::{
    parse_layer_id, parse_section_divider, parse_unicode_name, read_additional_info_chain,
    write_additional_info_block, AdditionalInfoBlock, SectionDivider,
};
use crate::layer::mask::{read_layer_mask, write_layer_mask, LayerMask};
use crate::strings::{read_pascal_string, write_pascal_string};
use std::io::{Read, Seek, Write};

/// Channel identifier: non-negative is a color plane index, negative values
/// are the reserved alpha/mask channels (§3 `channel_info[]`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelId {
    Color(u16),
    TransparencyMask,
    UserSuppliedLayerMask,
    RealUserSuppliedLayerMask,
    /// Any id outside `{-3, -2, -1, 0..}`; the channel is skipped by its
    /// declared length rather than decoded (§4.6 "tolerant recovery": "If a
    /// channel ID is unknown ... the channel is skipped by its declared
    /// length").
    Unknown(i16),
}

impl ChannelId {
    pub fn from_i16(id: i16) -> Self {
        match id {
            -1 => ChannelId::TransparencyMask,
            -2 => ChannelId::UserSuppliedLayerMask,
            -3 => ChannelId::RealUserSuppliedLayerMask,
            n if n >= 0 => ChannelId::Color(n as u16),
            n => ChannelId::Unknown(n),
        }
    }

    pub fn as_i16(self) -> i16 {
        match self {
            ChannelId::Color(n) => n as i16,
            ChannelId::TransparencyMask => -1,
            ChannelId::UserSuppliedLayerMask => -2,
            ChannelId::RealUserSuppliedLayerMask => -3,
            ChannelId::Unknown(n) => n,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayerRect {
    pub top: i32,
    pub left: i32,
    pub bottom: i32,
    pub right: i32,
}

impl LayerRect {
    pub fn width(&self) -> u32 {
        (self.right - self.left).max(0) as u32
    }

    pub fn height(&self) -> u32 {
        (self.bottom - self.top).max(0) as u32
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }
}

/// Layer record flag bits (§3 `flags`).
const FLAG_TRANSPARENCY_PROTECTED: u8 = 0b0000_0001;
const FLAG_HIDDEN: u8 = 0b0000_0010;
const FLAG_PIXEL_DATA_IRRELEVANT_BIT3: u8 = 0b0000_1000;
const FLAG_PIXEL_DATA_IRRELEVANT_BIT4: u8 = 0b0001_0000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerRecord {
    pub rect: LayerRect,
    pub channels: Vec<(ChannelId, u64)>,
    pub blend_mode: [u8; 4],
    pub opacity: u8,
    pub clipping: u8,
    pub flags: u8,
    pub mask: Option<LayerMask>,
    pub blending_ranges: Vec<u8>,
    pub name: String,
    pub unicode_name: Option<String>,
    pub layer_id: Option<u32>,
    pub section_divider: Option<SectionDivider>,
    pub additional_info: Vec<AdditionalInfoBlock>,
}

impl LayerRecord {
    pub fn display_name(&self) -> &str {
        self.unicode_name.as_deref().unwrap_or(&self.name)
    }

    pub fn is_hidden(&self) -> bool {
        self.flags & FLAG_HIDDEN != 0
    }

    pub fn is_transparency_protected(&self) -> bool {
        self.flags & FLAG_TRANSPARENCY_PROTECTED != 0
    }

    pub fn pixel_data_irrelevant(&self) -> bool {
        self.flags & (FLAG_PIXEL_DATA_IRRELEVANT_BIT3 | FLAG_PIXEL_DATA_IRRELEVANT_BIT4) != 0
    }

    pub fn is_clip_follower(&self) -> bool {
        self.clipping == 1
    }

    pub fn read<R: Read + Seek>(reader: &mut ByteReader<R>, version: Version) -> Result<Self> {
        let top = reader.read_i32(Endian::Big)?;
        let left = reader.read_i32(Endian::Big)?;
        let bottom = reader.read_i32(Endian::Big)?;
        let right = reader.read_i32(Endian::Big)?;
        let rect = LayerRect { top, left, bottom, right };

        let num_channels = reader.read_u16(Endian::Big)?;
        if num_channels as u32 > 99 {
            return Err(PsdError::ChannelCountExceeded(num_channels as u32));
        }
        let mut channels = Vec::with_capacity(num_channels as usize);
        for _ in 0..num_channels {
            let id = reader.read_i16(Endian::Big)?;
            let len = reader.read_len(version)?;
            channels.push((ChannelId::from_i16(id), len));
        }

        let mode_signature = reader.read_array4()?;
        if &mode_signature != b"8BIM" && &mode_signature != b"MIB8" && &mode_signature != b"8B64" {
            return Err(PsdError::corrupt("layer record missing blend signature"));
        }
        let blend_mode = reader.read_array4()?;
        let opacity = reader.read_u8()?;
        let clipping = reader.read_u8()?;
        let flags = reader.read_u8()?;
        let _filler = reader.read_u8()?;

        let extra_len = reader.read_u32(Endian::Big)? as u64;
        let extra_start = reader.position()?;
        let extra_end = extra_start + extra_len;

        let mask = read_layer_mask(reader)?;

        let blending_ranges_len = reader.read_u32(Endian::Big)? as usize;
        let blending_ranges = reader.read_bytes(blending_ranges_len)?;

        let name = read_pascal_string(reader, 4)?;

        let additional_info = read_additional_info_chain(reader, extra_end, version)?;

        let mut unicode_name = None;
        let mut layer_id = None;
        let mut section_divider = None;
        for block in &additional_info {
            match &block.key {
                b"luni" => unicode_name = parse_unicode_name(block).ok(),
                b"lyid" => layer_id = parse_layer_id(block).ok(),
                b"lsct" | b"lsdk" => section_divider = parse_section_divider(block).ok(),
                _ => {}
            }
        }

        reader.seek(extra_end)?;

        Ok(LayerRecord {
            rect,
            channels,
            blend_mode,
            opacity,
            clipping,
            flags,
            mask,
            blending_ranges,
            name,
            unicode_name,
            layer_id,
            section_divider,
            additional_info,
        })
    }

    /// Writes the layer record header (rectangle through name); channel
    /// pixel data is written separately by the caller once all records have
    /// been emitted, per §4.9.
    pub fn write<W: Write + Seek>(&self, writer: &mut ByteWriter<W>, version: Version) -> Result<()> {
        writer.write_i32(self.rect.top, Endian::Big)?;
        writer.write_i32(self.rect.left, Endian::Big)?;
        writer.write_i32(self.rect.bottom, Endian::Big)?;
        writer.write_i32(self.rect.right, Endian::Big)?;

        writer.write_u16(self.channels.len() as u16, Endian::Big)?;
        for (id, len) in &self.channels {
            writer.write_i16(id.as_i16(), Endian::Big)?;
            writer.write_len(*len, version)?;
        }

        writer.write_bytes(b"8BIM")?;
        writer.write_bytes(&self.blend_mode)?;
        writer.write_u8(self.opacity)?;
        writer.write_u8(self.clipping)?;
        writer.write_u8(self.flags)?;
        writer.write_u8(0)?;

        let extra_token = writer.reserve_length(Version::Psd)?;

        write_layer_mask(writer, &self.mask)?;
        writer.write_u32(self.blending_ranges.len() as u32, Endian::Big)?;
        writer.write_bytes(&self.blending_ranges)?;
        write_pascal_string(writer, &self.name, 4)?;

        for block in &self.additional_info {
            write_additional_info_block(writer, &block.key, &block.data, version)?;
        }

        writer.patch_length(extra_token)?;
        Ok(())
    }
}
