use crate::color::ColorMode;

/// All failure modes the codec can produce.
///
/// Mirrors the reader/writer error kinds: most reader-side problems are local
/// recoveries (logged via the `log` crate and skipped by their declared
/// length) rather than values of this enum — see the call sites in
/// [`crate::reader`] for which conditions are tolerated versus fatal.
#[derive(Debug, thiserror::Error)]
pub enum PsdError {
    /// The byte stream did not start with the `8BPS` signature.
    #[error("not a PSD/PSB file: missing '8BPS' signature")]
    NotPsd,

    /// `version` was not 1 (PSD) or 2 (PSB).
    #[error("unsupported PSD version {0} (expected 1 or 2)")]
    UnsupportedVersion(u16),

    /// The color mode isn't one this codec recognizes, or is paired with an
    /// incompatible bit depth (CMYK/Lab at bps 1 or 32).
    #[error("unsupported color mode {0:?} for this bit depth")]
    UnsupportedColorMode(ColorMode),

    /// `bps` was not one of 1, 8, 16, 32.
    #[error("unsupported bit depth {0}")]
    UnsupportedBps(u16),

    /// Declared canvas dimensions exceed the format's limit (30,000px for PSD).
    #[error("image too large: {width}x{height}")]
    TooLarge { width: u32, height: u32 },

    /// Declared dimensions are zero, or overflow when multiplied by bps.
    #[error("invalid dimensions: {rows}x{columns}")]
    InvalidDimensions { rows: u32, columns: u32 },

    /// Declared channel count exceeds the codec's maximum tolerance (99).
    #[error("channel count {0} exceeds codec maximum")]
    ChannelCountExceeded(u32),

    /// A length field, tag, or nested structure didn't make sense.
    #[error("corrupt PSD data: {0}")]
    Corrupt(String),

    /// The external ZIP (DEFLATE) codec rejected the input.
    #[error("zip decompression failed: {0}")]
    Decompress(String),

    /// The underlying stream returned an I/O error.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The stream ended in the middle of a field.
    #[error("unexpected end of file")]
    UnexpectedEof,
}

impl PsdError {
    pub(crate) fn corrupt(msg: impl Into<String>) -> Self {
        PsdError::Corrupt(msg.into())
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, PsdError>;
