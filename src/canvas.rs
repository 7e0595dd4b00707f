//! In-memory image model (§1 "in-memory image model", §6 "in-memory interface
//! surface").
//!
//! No teacher precedent — `chinedufn-psd`'s public `Psd` struct (`lib.rs`)
//! wraps the raw section structs directly and exposes pixel-flattening
//! methods; this crate separates decode (`crate::reader`) from the resulting
//! owned model, which carries the reconstructed layer tree instead of a flat
//! section.

use crate::color::ColorMode;
use crate::color_mode_data::ColorModeData;
use crate::io::Version;
use crate::layer::tree::LayerNode;
use crate::merged_image::MergedImage;
use crate::resources::ImageResource;

/// Feature flags the reader sets when it recognizes, but does not fully
/// model, a layer or document feature (§7 "Unsupported-feature reporting").
/// Each flag corresponds to an additional-info key the reader saw in at
/// least one layer's chain, or a header-level property the core does not
/// interpret.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UnsupportedFeatures {
    pub adjustment_layers: bool,
    pub text_layers: bool,
    pub fill_layers: bool,
    pub linked_layers: bool,
    pub vector_masks: bool,
    pub smart_objects: bool,
    pub strokes: bool,
    pub layer_effects: bool,
    pub layer_comps: bool,
    pub duotone_mode: bool,
}

impl UnsupportedFeatures {
    /// Updates the flags from one layer record's additional-info key chain.
    /// Adjustment-layer keys per GIMP's `PSD_LADJ_*` table
    /// (`examples/original_source/plug-ins/file-psd/psd.h`).
    pub fn observe_additional_info_key(&mut self, key: &[u8; 4]) {
        const ADJUSTMENT_KEYS: &[&[u8; 4]] = &[
            b"levl", b"curv", b"brit", b"blnc", b"blwh", b"hue ", b"hue2", b"selc", b"mixr",
            b"grdm", b"phfl", b"expA", b"nvrt", b"thrs", b"post", b"vibA", b"clrL",
        ];
        const FILL_KEYS: &[&[u8; 4]] = &[b"SoCo", b"PtFl", b"GdFl"];
        const LINKED_KEYS: &[&[u8; 4]] = &[b"lnkD", b"lnk2", b"lnk3", b"lnkE"];

        match key {
            b"TySh" | b"tySh" => self.text_layers = true,
            b"vmsk" => self.vector_masks = true,
            b"SoLd" | b"PlLd" | b"SoLE" => self.smart_objects = true,
            b"lrFX" | b"lfx2" => self.layer_effects = true,
            b"vscg" => self.strokes = true,
            key if ADJUSTMENT_KEYS.contains(&key) => self.adjustment_layers = true,
            key if FILL_KEYS.contains(&key) => self.fill_layers = true,
            key if LINKED_KEYS.contains(&key) => self.linked_layers = true,
            _ => {}
        }
    }
}

/// A fully-decoded PSD/PSB document: canvas geometry, palette, resources, and
/// the reconstructed layer tree (§3 "Ownership & lifecycle").
#[derive(Debug, Clone, PartialEq)]
pub struct Canvas {
    pub version: Version,
    pub width: u32,
    pub height: u32,
    /// Bits per channel sample: one of `{1, 8, 16, 32}`.
    pub depth: u16,
    pub color_mode: ColorMode,
    pub color_mode_data: ColorModeData,
    pub resources: Vec<ImageResource>,
    pub layers: Vec<LayerNode>,
    pub merged_image: MergedImage,
    /// True when the on-disk layer count was negative, meaning the merged
    /// image carries a meaningful alpha channel (§4.6 step 3).
    pub merged_has_alpha: bool,
}

impl Canvas {
    /// Number of color channels implied by `color_mode`, not counting any
    /// alpha channel.
    pub fn base_channel_count(&self) -> u16 {
        self.color_mode.base_channel_count()
    }

    /// Walks the layer tree, including synthetic clipping-group containers,
    /// in on-disk storage order (depth-first, children before their group's
    /// own boundary) calling `visit` on every raster layer.
    pub fn for_each_layer<'a>(&'a self, mut visit: impl FnMut(&'a LayerNode)) {
        fn walk<'a>(nodes: &'a [LayerNode], visit: &mut impl FnMut(&'a LayerNode)) {
            for node in nodes {
                visit(node);
                if let LayerNode::Group { children, .. } = node {
                    walk(children, visit);
                }
            }
        }
        walk(&self.layers, &mut visit);
    }
}
