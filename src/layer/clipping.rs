//! Clipping-group pre-pass (§4.6 "Clipping-group pre-pass", §4.6
//! "Clipping-group synthesis").
//!
//! Grounded in GIMP's `psd-load.c` `clipping_group_type` walk
//! (`examples/original_source/plug-ins/file-psd/psd-load.c`): a top-down
//! scan over the flat layer list with a per-nesting-level stack, tagging
//! synthetic group boundaries the same way GIMP assigns
//! `PSD_CLIPPING_BASE`/`PSD_CLIPPING_NON_BASE` spans to folders.

use crate::layer::additional_info::SectionDividerKind;
use crate::layer::record::LayerRecord;

/// Per-layer tag produced by the pre-pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipTag {
    StartClipGroup,
    EndClipGroup,
    Neither,
}

#[derive(Debug, Clone, Copy)]
enum FlatEntry {
    Layer { clipping: bool },
    GroupStart,
    GroupEnd,
}

fn flat_entry(record: &LayerRecord) -> FlatEntry {
    match record.section_divider.as_ref().map(|d| d.kind) {
        Some(SectionDividerKind::OpenFolder) | Some(SectionDividerKind::ClosedFolder) => {
            FlatEntry::GroupStart
        }
        Some(SectionDividerKind::BoundingSectionDivider) => FlatEntry::GroupEnd,
        _ => FlatEntry::Layer {
            clipping: record.is_clip_follower(),
        },
    }
}

struct PendingSet {
    /// Index (into the top-down traversal) of the topmost clip-follower.
    top_index: usize,
}

/// Runs the pre-pass over `records`, which must be in on-disk (bottom-up)
/// storage order — index 0 is the storage-first (visually bottommost at its
/// nesting level) entry. Returns one tag per record.
pub fn resolve_clipping(records: &[LayerRecord]) -> Vec<ClipTag> {
    let mut tags = vec![ClipTag::Neither; records.len()];

    // Walk top-down (from the visually topmost downward), which is the
    // storage array in reverse.
    let mut stack: Vec<Option<PendingSet>> = vec![None];

    for top_down_idx in 0..records.len() {
        let storage_idx = records.len() - 1 - top_down_idx;
        let record = &records[storage_idx];

        match flat_entry(record) {
            FlatEntry::GroupStart => {
                // A group-start marker is stored above its contents; in our
                // top-down walk we encounter it before the layers it
                // contains, matching descent into a nested level.
                stack.push(None);
            }
            FlatEntry::GroupEnd => {
                if let Some(Some(pending)) = stack.pop() {
                    // An active clip set still open when its level's
                    // group-end marker (stored below the contents, visited
                    // last in top-down order at this depth) is reached: the
                    // group boundary itself becomes the synthetic base.
                    tags[storage_idx] = ClipTag::StartClipGroup;
                    tags[pending.top_index] = ClipTag::EndClipGroup;
                }
            }
            FlatEntry::Layer { clipping } => {
                let level = stack.len() - 1;
                if clipping {
                    if stack[level].is_none() {
                        stack[level] = Some(PendingSet { top_index: storage_idx });
                    }
                } else if let Some(pending) = stack[level].take() {
                    tags[storage_idx] = ClipTag::StartClipGroup;
                    tags[pending.top_index] = ClipTag::EndClipGroup;
                }
            }
        }
    }

    tags
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::record::LayerRect;

    fn layer(clipping: u8) -> LayerRecord {
        LayerRecord {
            rect: LayerRect { top: 0, left: 0, bottom: 1, right: 1 },
            channels: Vec::new(),
            blend_mode: *b"norm",
            opacity: 255,
            clipping,
            flags: 0,
            mask: None,
            blending_ranges: Vec::new(),
            name: String::new(),
            unicode_name: None,
            layer_id: None,
            section_divider: None,
            additional_info: Vec::new(),
        }
    }

    #[test]
    fn base_with_one_clip_follower_forms_a_set() {
        // Storage order (bottom-up): [base, follower] — follower is
        // visually above base.
        let records = vec![layer(0), layer(1)];
        let tags = resolve_clipping(&records);
        assert_eq!(tags[0], ClipTag::StartClipGroup);
        assert_eq!(tags[1], ClipTag::EndClipGroup);
    }

    #[test]
    fn no_clipping_layers_produce_no_tags() {
        let records = vec![layer(0), layer(0)];
        let tags = resolve_clipping(&records);
        assert!(tags.iter().all(|t| *t == ClipTag::Neither));
    }

    #[test]
    fn trailing_clip_follower_with_no_base_is_untagged() {
        let records = vec![layer(1)];
        let tags = resolve_clipping(&records);
        assert_eq!(tags[0], ClipTag::Neither);
    }
}
