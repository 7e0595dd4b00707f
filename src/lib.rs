//! A PSD/PSB (Adobe Photoshop Document) binary codec.
//!
//! Decodes the on-disk layer tree, image resources, and merged image into an
//! owned [`Canvas`], and re-encodes a `Canvas` back to bytes. Pixel
//! compositing, vector-shape authoring, and text-engine interpretation are
//! out of scope; unsupported layer features are reported rather than
//! dropped silently, via [`UnsupportedFeatures`].
//!
//! psd spec: https://www.adobe.com/devnet-apps/photoshop/fileformatashtml/

#![warn(missing_docs)]

pub use crate::blend::BlendMode;
pub use crate::canvas::{Canvas, UnsupportedFeatures};
pub use crate::color::ColorMode;
pub use crate::color_mode_data::ColorModeData;
pub use crate::error::{PsdError, Result};
pub use crate::header::{ChannelCount, Depth, FileHeader};
pub use crate::io::Version;
pub use crate::layer::additional_info::{AdditionalInfoBlock, SectionDivider, SectionDividerKind};
pub use crate::layer::channel::ChannelCompression;
pub use crate::layer::clipping::ClipTag;
pub use crate::layer::mask::LayerMask;
pub use crate::layer::record::{ChannelId, LayerRect, LayerRecord};
pub use crate::layer::tree::LayerNode;
pub use crate::layer::{LayerAndMaskInfo, LayerChannelData};
pub use crate::merged_image::MergedImage;
pub use crate::reader::{read, read_thumbnail, JpegDecoder, ReadOptions};
pub use crate::resources::{GuidesInfo, ImageResource, PathResource, ResolutionInfo, ResourcePayload};
pub use crate::writer::{write, ClippingPathOption, WriteOptions};

mod blend;
mod canvas;
mod color;
mod color_mode_data;
mod error;
mod fixed_point;
mod header;
mod io;
mod layer;
mod merged_image;
mod packbits;
mod predictor;
mod reader;
mod resources;
mod strings;
mod writer;
