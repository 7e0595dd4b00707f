//! Layer-and-mask information block (§3, §4.6 "LayerInfoReader").

pub mod additional_info;
pub mod channel;
pub mod clipping;
pub mod mask;
pub mod record;
pub mod tree;

use crate::error::Result;
use crate::io::{ByteReader, ByteWriter, Endian, Version};
use channel::decode_channel;
use record::{ChannelId, LayerRecord};
use std::io::{Cursor, Read, Seek, Write};

/// One layer's decoded channel rasters, in the same declaration order as
/// `LayerRecord::channels`.
pub type LayerChannelData = Vec<(ChannelId, Vec<u8>)>;

/// A channel's raster dimensions: the layer rectangle for color/alpha
/// channels, or the mask rectangle for the two mask channel ids (§4.6
/// "Per-layer channel read" — mask channels are sized by the mask
/// sub-record, not the layer rectangle).
fn channel_dims(record: &LayerRecord, id: ChannelId, layer_rows: u32, layer_columns: u32) -> (u32, u32) {
    match id {
        ChannelId::UserSuppliedLayerMask | ChannelId::RealUserSuppliedLayerMask => {
            match &record.mask {
                Some(mask) => (
                    (mask.rect.bottom - mask.rect.top).max(0) as u32,
                    (mask.rect.right - mask.rect.left).max(0) as u32,
                ),
                None => (layer_rows, layer_columns),
            }
        }
        _ => (layer_rows, layer_columns),
    }
}

/// The fully-parsed layer-and-mask information block, including decoded
/// channel rasters (§4.6 steps 1-7). Tree/clipping reconstruction is a
/// separate pass over `records` (see `crate::layer::tree`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerAndMaskInfo {
    pub records: Vec<LayerRecord>,
    pub channel_data: Vec<LayerChannelData>,
    /// Negative layer count in the on-disk field indicates the merged image
    /// carries a meaningful alpha channel (§4.6 step 3).
    pub merged_has_alpha: bool,
}

impl LayerAndMaskInfo {
    /// `bps` is the file header's bit depth, shared by every channel raster
    /// in the document.
    pub fn read<R: Read + Seek>(
        reader: &mut ByteReader<R>,
        version: Version,
        bps: u16,
    ) -> Result<Self> {
        let block_len = reader.read_len(version)?;
        let block_start = reader.position()?;
        let block_end = block_start + block_len;

        if block_len == 0 {
            return Ok(LayerAndMaskInfo {
                records: Vec::new(),
                channel_data: Vec::new(),
                merged_has_alpha: false,
            });
        }

        let layer_info_len = reader.read_len(version)?;
        let layer_info_start = reader.position()?;
        let layer_info_end = layer_info_start + layer_info_len;

        let (records, merged_has_alpha) = if layer_info_len == 0 {
            (Vec::new(), false)
        } else {
            let raw_count = reader.read_i16(Endian::Big)?;
            let merged_has_alpha = raw_count < 0;
            let count = raw_count.unsigned_abs() as usize;

            let mut records = Vec::with_capacity(count);
            for _ in 0..count {
                match LayerRecord::read(reader, version) {
                    Ok(record) => records.push(record),
                    Err(_) => break,
                }
            }

            (records, merged_has_alpha)
        };

        // Tolerant recovery: if the declared sub-block length disagrees with
        // the cumulative record sizes, trust the declared end (§4.6).
        reader.seek(layer_info_end)?;

        // §4.6 step 7: channel raster data for every record, in the same
        // bottom-up order, immediately follows the layer-info sub-block.
        let mut channel_data = Vec::with_capacity(records.len());
        for record in &records {
            let rows = record.rect.height();
            let columns = record.rect.width();
            let mut channels = Vec::with_capacity(record.channels.len());

            for (id, len) in &record.channels {
                let raster = if matches!(id, ChannelId::Unknown(_)) {
                    // §4.6 tolerant recovery: an id outside {-3, -2, -1, 0..}
                    // is skipped by its declared length rather than decoded.
                    reader.skip(*len as i64)?;
                    Vec::new()
                } else {
                    let (channel_rows, channel_columns) = channel_dims(record, *id, rows, columns);
                    if channel_rows == 0 || channel_columns == 0 {
                        reader.skip(*len as i64)?;
                        Vec::new()
                    } else {
                        decode_channel(reader, *len, channel_rows, channel_columns, bps, version)?
                    }
                };
                channels.push((*id, raster));
            }
            channel_data.push(channels);
        }

        // Global layer-mask info block: opaque, skipped (§4.6 step 5). This
        // length field is always 4 bytes, even in PSB (only the top-level
        // block/layer-info lengths widen to u64).
        if reader.position()? < block_end {
            let global_mask_len = reader.read_u32(Endian::Big)?;
            reader.skip(global_mask_len as i64)?;
        }

        // Additional `Lr16`/`Lr32` blocks and other registry entries follow;
        // tolerated as opaque trailing bytes up to the declared block end
        // (§4.6 step 6).
        reader.seek(block_end)?;

        Ok(LayerAndMaskInfo {
            records,
            channel_data,
            merged_has_alpha,
        })
    }

    pub fn write<W: Write + Seek>(
        &self,
        writer: &mut ByteWriter<W>,
        version: Version,
        bps: u16,
    ) -> Result<()> {
        // Channels are encoded up front so each record's channel-length
        // table (written before any raster data, per the on-disk layout)
        // reports the true encoded size rather than a stale value carried
        // over from whatever compression the record was originally read
        // with (§4.9 "back-patching all length fields").
        let mut patched_records = Vec::with_capacity(self.records.len());
        let mut encoded_channels: Vec<Vec<u8>> = Vec::with_capacity(self.records.len());

        for (record, channels) in self.records.iter().zip(self.channel_data.iter()) {
            let rows = record.rect.height();
            let columns = record.rect.width();
            let mut patched = record.clone();
            let mut record_bytes = Vec::new();

            for ((id, len), (_, raster)) in patched.channels.iter_mut().zip(channels.iter()) {
                let (channel_rows, channel_columns) = channel_dims(record, *id, rows, columns);
                let mut buf = Cursor::new(Vec::new());
                {
                    let mut w = ByteWriter::new(&mut buf);
                    // Unknown channel ids were skipped by length on read and
                    // carry no raster; re-emit them as an empty raw channel
                    // rather than reconstructing bytes we never kept.
                    if raster.is_empty() {
                        w.write_u16(channel::ChannelCompression::Raw.as_u16(), Endian::Big)?;
                    } else {
                        channel::encode_channel_rle(
                            &mut w,
                            raster,
                            channel_rows,
                            channel_columns,
                            bps,
                            version,
                        )?;
                    }
                }
                let bytes = buf.into_inner();
                *len = bytes.len() as u64;
                record_bytes.extend_from_slice(&bytes);
            }

            patched_records.push(patched);
            encoded_channels.push(record_bytes);
        }

        let block_token = writer.reserve_length(version)?;
        let layer_info_token = writer.reserve_length(version)?;

        let count = patched_records.len() as i16;
        let signed_count = if self.merged_has_alpha { -count } else { count };
        writer.write_i16(signed_count, Endian::Big)?;

        for record in &patched_records {
            record.write(writer, version)?;
        }

        writer.patch_length(layer_info_token)?;

        for record_bytes in &encoded_channels {
            writer.write_bytes(record_bytes)?;
        }

        // Global layer-mask info: none written.
        writer.write_u32(0, Endian::Big)?;

        writer.patch_length(block_token)?;
        Ok(())
    }
}
