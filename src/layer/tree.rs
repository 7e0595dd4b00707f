//! Flat-layer-list to host-tree reconstruction (§4.6 "Tree construction").
//!
//! No direct teacher precedent for groups-with-clipping (the teacher's
//! `groups.rs`/`container.rs` track a flat id-keyed map, not a nested tree);
//! this builds the nested-container shape `spec.md` describes directly,
//! reusing `ClipTag` from `crate::layer::clipping` for the synthetic
//! clipping containers.

use crate::layer::additional_info::SectionDividerKind;
use crate::layer::clipping::{resolve_clipping, ClipTag};
use crate::layer::record::LayerRecord;
use crate::layer::LayerChannelData;

/// One node of the reconstructed tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayerNode {
    /// A raster layer with its decoded channel rasters, in the same order
    /// as `LayerRecord::channels` (§3 "Ownership & lifecycle").
    Layer(LayerRecord, LayerChannelData),
    Group {
        /// The open/closed-folder record (carries name, blend mode). `None`
        /// for a synthetic clipping-group container.
        record: Option<LayerRecord>,
        /// The bounding-section-divider record stored below the group's
        /// contents (§4.6 "group-end marker"). `None` for a synthetic
        /// clipping-group container, which has no on-disk boundary of its
        /// own.
        end_record: Option<LayerRecord>,
        children: Vec<LayerNode>,
    },
}

struct Builder {
    /// Stack of in-progress containers; the last entry is the innermost.
    stack: Vec<Vec<LayerNode>>,
    /// Parallel stack of the bounding-divider record that opened each
    /// in-progress container.
    end_records: Vec<Option<LayerRecord>>,
}

impl Builder {
    fn push_container(&mut self, end_record: Option<LayerRecord>) {
        self.stack.push(Vec::new());
        self.end_records.push(end_record);
    }

    fn pop_container(&mut self) -> (Vec<LayerNode>, Option<LayerRecord>) {
        (
            self.stack.pop().unwrap_or_default(),
            self.end_records.pop().flatten(),
        )
    }

    fn current(&mut self) -> &mut Vec<LayerNode> {
        self.stack.last_mut().expect("root container always present")
    }
}

/// Builds the host tree from the flat, bottom-up-stored layer array and its
/// parallel, index-aligned decoded channel rasters.
pub fn build_tree(records: Vec<LayerRecord>, channel_data: Vec<LayerChannelData>) -> Vec<LayerNode> {
    let clip_tags = resolve_clipping(&records);
    let mut builder = Builder {
        stack: vec![Vec::new()],
        end_records: vec![None],
    };

    let mut channel_data = channel_data.into_iter();
    for (idx, record) in records.into_iter().enumerate() {
        let tag = clip_tags[idx];
        let channels = channel_data.next().unwrap_or_default();

        if tag == ClipTag::StartClipGroup {
            builder.push_container(None);
        }

        match record.section_divider.as_ref().map(|d| d.kind) {
            Some(SectionDividerKind::BoundingSectionDivider) => {
                builder.push_container(Some(record));
            }
            Some(SectionDividerKind::OpenFolder) | Some(SectionDividerKind::ClosedFolder) => {
                let (children, end_record) = builder.pop_container();
                builder.current().push(LayerNode::Group {
                    record: Some(record),
                    end_record,
                    children,
                });
            }
            _ => {
                builder.current().push(LayerNode::Layer(record, channels));
            }
        }

        if tag == ClipTag::EndClipGroup {
            let (children, _) = builder.pop_container();
            builder.current().push(LayerNode::Group {
                record: None,
                end_record: None,
                children,
            });
        }
    }

    builder.pop_container().0
}

/// Flattens the host tree back into on-disk storage order (bottom-up),
/// reconstructing the parallel channel-data array the writer needs (§4.9).
/// Synthetic clipping-group containers are unwrapped without re-emitting a
/// boundary, matching §8 scenario 3.
pub fn flatten_tree(tree: &[LayerNode]) -> (Vec<LayerRecord>, Vec<LayerChannelData>) {
    let mut records = Vec::new();
    let mut channel_data = Vec::new();
    flatten_into(tree, &mut records, &mut channel_data);
    (records, channel_data)
}

fn flatten_into(
    nodes: &[LayerNode],
    records: &mut Vec<LayerRecord>,
    channel_data: &mut Vec<LayerChannelData>,
) {
    for node in nodes {
        match node {
            LayerNode::Layer(record, channels) => {
                records.push(record.clone());
                channel_data.push(channels.clone());
            }
            LayerNode::Group { record: Some(record), end_record, children } => {
                if let Some(end_record) = end_record {
                    records.push(end_record.clone());
                    channel_data.push(Vec::new());
                }
                flatten_into(children, records, channel_data);
                records.push(record.clone());
                channel_data.push(Vec::new());
            }
            LayerNode::Group { record: None, children, .. } => {
                flatten_into(children, records, channel_data);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::additional_info::SectionDivider;
    use crate::layer::record::LayerRect;

    fn plain_layer(name: &str, clipping: u8) -> LayerRecord {
        LayerRecord {
            rect: LayerRect { top: 0, left: 0, bottom: 1, right: 1 },
            channels: Vec::new(),
            blend_mode: *b"norm",
            opacity: 255,
            clipping,
            flags: 0,
            mask: None,
            blending_ranges: Vec::new(),
            name: name.to_string(),
            unicode_name: None,
            layer_id: None,
            section_divider: None,
            additional_info: Vec::new(),
        }
    }

    fn group_boundary(name: &str, kind: SectionDividerKind) -> LayerRecord {
        let mut record = plain_layer(name, 0);
        record.section_divider = Some(SectionDivider { kind, blend_mode: None });
        record
    }

    fn no_channels(records: &[LayerRecord]) -> Vec<LayerChannelData> {
        records.iter().map(|_| Vec::new()).collect()
    }

    #[test]
    fn flat_layers_stay_flat() {
        let records = vec![plain_layer("bg", 0), plain_layer("fg", 0)];
        let channel_data = no_channels(&records);
        let tree = build_tree(records, channel_data);
        assert_eq!(tree.len(), 2);
        assert!(matches!(tree[0], LayerNode::Layer(..)));
    }

    #[test]
    fn group_start_end_nests_contents() {
        // Storage order bottom-up: end marker, inner layer, start marker.
        let records = vec![
            group_boundary("end", SectionDividerKind::BoundingSectionDivider),
            plain_layer("inner", 0),
            group_boundary("Group 1", SectionDividerKind::OpenFolder),
        ];
        let channel_data = no_channels(&records);
        let tree = build_tree(records, channel_data);
        assert_eq!(tree.len(), 1);
        match &tree[0] {
            LayerNode::Group { record, end_record, children } => {
                assert_eq!(record.as_ref().unwrap().name, "Group 1");
                assert_eq!(end_record.as_ref().unwrap().name, "end");
                assert_eq!(children.len(), 1);
            }
            other => panic!("expected a group, got {:?}", other),
        }
    }

    #[test]
    fn clipping_set_synthesizes_a_container() {
        let records = vec![plain_layer("base", 0), plain_layer("clip follower", 1)];
        let channel_data = no_channels(&records);
        let tree = build_tree(records, channel_data);
        assert_eq!(tree.len(), 1);
        match &tree[0] {
            LayerNode::Group { record, children, .. } => {
                assert!(record.is_none());
                assert_eq!(children.len(), 2);
            }
            other => panic!("expected a synthetic group, got {:?}", other),
        }
    }

    #[test]
    fn flatten_round_trips_group_boundaries() {
        let records = vec![
            group_boundary("end", SectionDividerKind::BoundingSectionDivider),
            plain_layer("inner", 0),
            group_boundary("Group 1", SectionDividerKind::OpenFolder),
        ];
        let channel_data = no_channels(&records);
        let tree = build_tree(records.clone(), channel_data);
        let (flat_records, _) = flatten_tree(&tree);
        assert_eq!(flat_records, records);
    }

    #[test]
    fn flatten_unwraps_synthetic_clip_group_without_boundary() {
        let records = vec![plain_layer("base", 0), plain_layer("clip follower", 1)];
        let channel_data = no_channels(&records);
        let tree = build_tree(records.clone(), channel_data);
        let (flat_records, _) = flatten_tree(&tree);
        assert_eq!(flat_records, records);
    }
}
