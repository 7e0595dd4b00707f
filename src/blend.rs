//! Blend-mode key mapping (§4.7 "Blend-mode mapping").
//!
//! Rendering and compositing pixels is an explicit non-goal (§1); this module
//! only identifies a layer's blend mode from its on-disk 4-character key so
//! host collaborators can interpret it. No teacher precedent — the old
//! `chinedufn-psd` renderer (`blend.rs`/`render.rs`) implemented full pixel
//! compositing math, which this crate does not carry forward (see DESIGN.md
//! trimming notes).

/// A layer's blend mode, mapped from its on-disk 4-character key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum BlendMode {
    Normal,
    Dissolve,
    Darken,
    Lighten,
    Multiply,
    Screen,
    Overlay,
    Difference,
    LinearDodge,
    Dodge,
    Burn,
    HardLight,
    SoftLight,
    Hue,
    Saturation,
    Color,
    Luminosity,
    /// Pass-through group: the group's true mode is carried in the
    /// `lsct`/`lsdk` section-divider block instead of the layer record,
    /// which always stores `norm` for pass-through groups (§4.7).
    PassThrough,
}

/// Keys the format recognizes but this codec does not map to a distinct host
/// mode; per §4.7 these fall back to [`BlendMode::Normal`] with a warning.
const UNSUPPORTED_KEYS: &[&[u8; 4]] = &[b"smud", b"lbrn", b"lLit", b"pLit", b"vLit", b"hMix"];

impl BlendMode {
    /// Maps a layer record's 4-character blend key (§4.7 table) to the
    /// host's blend semantics. Unsupported-but-recognized keys fall back to
    /// `Normal` with a logged warning rather than erroring, consistent with
    /// §7's "local recovery" propagation rule.
    pub fn from_key(key: &[u8; 4]) -> BlendMode {
        match key {
            b"norm" => BlendMode::Normal,
            b"diss" => BlendMode::Dissolve,
            b"dark" => BlendMode::Darken,
            b"lite" => BlendMode::Lighten,
            b"mul " => BlendMode::Multiply,
            b"scrn" => BlendMode::Screen,
            b"over" => BlendMode::Overlay,
            b"diff" => BlendMode::Difference,
            b"lddg" => BlendMode::LinearDodge,
            b"div " => BlendMode::Dodge,
            b"idiv" => BlendMode::Burn,
            b"hLit" => BlendMode::HardLight,
            b"sLit" => BlendMode::SoftLight,
            b"hue " => BlendMode::Hue,
            b"sat " => BlendMode::Saturation,
            b"colr" => BlendMode::Color,
            b"lum " => BlendMode::Luminosity,
            b"pass" => BlendMode::PassThrough,
            other if UNSUPPORTED_KEYS.contains(&other) => {
                log::warn!(
                    "blend mode {:?} is not supported, falling back to Normal",
                    String::from_utf8_lossy(other)
                );
                BlendMode::Normal
            }
            other => {
                log::warn!(
                    "unrecognized blend mode key {:?}, falling back to Normal",
                    String::from_utf8_lossy(other)
                );
                BlendMode::Normal
            }
        }
    }

    /// The 4-character key written to a layer record. Pass-through groups
    /// write `norm` in the layer record itself; the true mode is carried in
    /// the section-divider block (§4.7).
    pub fn as_key(self) -> [u8; 4] {
        match self {
            BlendMode::Normal | BlendMode::PassThrough => *b"norm",
            BlendMode::Dissolve => *b"diss",
            BlendMode::Darken => *b"dark",
            BlendMode::Lighten => *b"lite",
            BlendMode::Multiply => *b"mul ",
            BlendMode::Screen => *b"scrn",
            BlendMode::Overlay => *b"over",
            BlendMode::Difference => *b"diff",
            BlendMode::LinearDodge => *b"lddg",
            BlendMode::Dodge => *b"div ",
            BlendMode::Burn => *b"idiv",
            BlendMode::HardLight => *b"hLit",
            BlendMode::SoftLight => *b"sLit",
            BlendMode::Hue => *b"hue ",
            BlendMode::Saturation => *b"sat ",
            BlendMode::Color => *b"colr",
            BlendMode::Luminosity => *b"lum ",
        }
    }

    /// The key written to a group's section-divider block when the group is
    /// pass-through; `None` for every other mode (the layer record's own key
    /// already carries it).
    pub fn section_divider_key(self) -> Option<[u8; 4]> {
        match self {
            BlendMode::PassThrough => Some(*b"pass"),
            _ => None,
        }
    }
}
