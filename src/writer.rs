//! Top-level PSD/PSB writer (§4.9 "PsdWriter (inverse of the reader)").
//!
//! No teacher precedent — `chinedufn-psd` never serializes a document back to
//! bytes. The fixed-resource-order-then-layer-block-then-merged-image shape
//! is read directly off `spec.md` §4.9 and composed from this crate's own
//! per-section `write` methods.

use crate::canvas::Canvas;
use crate::color::ColorMode;
use crate::color_mode_data::ColorModeData;
use crate::error::{PsdError, Result};
use crate::header::{ChannelCount, Depth, FileHeader};
use crate::io::{ByteWriter, Endian, Version};
use crate::layer::tree::flatten_tree;
use crate::layer::LayerAndMaskInfo;
use crate::resources::{write_resource, ImageResource, ResourcePayload};
use std::io::{Seek, Write};

const MAX_PSD_DIMENSION: u32 = 30_000;

/// A clipping-path override for the written document (§6 `clipping_path`).
#[derive(Debug, Clone, PartialEq)]
pub struct ClippingPathOption {
    pub name: String,
    pub flatness_0_to_100: f64,
}

/// Options accepted by [`write`] (§6 "options = {export_as_cmyk,
/// export_as_duotone, clipping_path}").
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteOptions {
    /// Declares the header's `color_mode` as CMYK regardless of
    /// `canvas.color_mode`. The writer re-tags the header field only; it does
    /// not convert pixel data (color conversion is out of scope).
    pub export_as_cmyk: bool,
    /// As `export_as_cmyk`, but declares Duotone.
    pub export_as_duotone: bool,
    pub clipping_path: Option<ClippingPathOption>,
}

/// Canonical resource emission order (§4.9): everything else the canvas
/// carries is appended afterward, in its original order, so resources
/// outside this registry still round-trip.
const RESOURCE_ORDER: &[u16] = &[
    0x03ee, // channel names
    0x0435, // channel properties
    0x0408, // guides
    0x0bb7, // clipping-path name
    0x03ed, // resolution
    0x042d, // layer selection ids
    0x0400, // legacy single selection
    0x040f, // ICC profile
];

/// Writes a [`Canvas`] to a PSD/PSB stream (§4.9).
pub fn write<W: Write + Seek>(stream: W, canvas: &Canvas, options: &WriteOptions) -> Result<()> {
    if canvas.width > MAX_PSD_DIMENSION || canvas.height > MAX_PSD_DIMENSION {
        return Err(PsdError::TooLarge {
            width: canvas.width,
            height: canvas.height,
        });
    }

    let mut writer = ByteWriter::new(stream);

    let color_mode = if options.export_as_cmyk {
        ColorMode::Cmyk
    } else if options.export_as_duotone {
        ColorMode::Duotone
    } else {
        canvas.color_mode
    };

    let channel_count = canvas.base_channel_count()
        + if canvas.merged_has_alpha { 1 } else { 0 };

    let header = FileHeader {
        version: canvas.version,
        channels: ChannelCount::new(channel_count)?,
        rows: canvas.height,
        columns: canvas.width,
        depth: Depth::new(canvas.depth)?,
        color_mode,
    };
    header.write(&mut writer)?;

    canvas.color_mode_data.write(&mut writer, canvas.version)?;

    let resources_token = writer.reserve_length(Version::Psd)?;
    write_resources(&mut writer, canvas, options)?;
    writer.patch_length(resources_token)?;

    let (records, channel_data) = flatten_tree(&canvas.layers);
    let layer_info = LayerAndMaskInfo {
        records,
        channel_data,
        merged_has_alpha: canvas.merged_has_alpha,
    };
    layer_info.write(&mut writer, canvas.version, canvas.depth)?;

    canvas
        .merged_image
        .write(&mut writer, canvas.height, canvas.width, canvas.depth, canvas.version)?;

    Ok(())
}

fn write_resources<W: Write + Seek>(
    writer: &mut ByteWriter<W>,
    canvas: &Canvas,
    options: &WriteOptions,
) -> Result<()> {
    let mut remaining: Vec<&ImageResource> = canvas.resources.iter().collect();
    let mut written_path_ids = std::collections::HashSet::new();

    // Paths (2000-2998) in ascending id order.
    let mut paths: Vec<&ImageResource> = remaining
        .iter()
        .filter(|r| (2000..=2998).contains(&r.id))
        .copied()
        .collect();
    paths.sort_by_key(|r| r.id);
    for resource in &paths {
        write_resource(writer, resource)?;
        written_path_ids.insert(resource.id);
    }
    remaining.retain(|r| !written_path_ids.contains(&r.id));

    let clipping_override = options.clipping_path.as_ref().map(|opt| ImageResource {
        id: 0x0bb7,
        name: String::new(),
        payload: ResourcePayload::ClippingPathName {
            name: opt.name.clone(),
            flatness: opt.flatness_0_to_100,
        },
    });

    let mut written_fixed_ids = std::collections::HashSet::new();
    for &id in RESOURCE_ORDER {
        if id == 0x0bb7 {
            if let Some(resource) = &clipping_override {
                write_resource(writer, resource)?;
                written_fixed_ids.insert(id);
                continue;
            }
        }
        if let Some(resource) = remaining.iter().find(|r| r.id == id) {
            write_resource(writer, resource)?;
            written_fixed_ids.insert(id);
        }
    }
    remaining.retain(|r| !written_fixed_ids.contains(&r.id));

    for resource in remaining {
        write_resource(writer, resource)?;
    }

    Ok(())
}
