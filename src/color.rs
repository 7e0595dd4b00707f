//! The `color_mode` header field (§3 "Image header").
//!
//! Follows the teacher's `ColorMode::new` validation shape in
//! `file_header_section.rs`, extended with the two modes
//! (`Multichannel`, `Duotone`, `Lab`) the teacher's reader never handled.

use crate::error::{PsdError, Result};

/// Recognized `color_mode` header values and their depth restrictions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorMode {
    Bitmap,
    Grayscale,
    Indexed,
    Rgb,
    Cmyk,
    Multichannel,
    Duotone,
    Lab,
}

impl ColorMode {
    /// Parses the raw header code, rejecting codes CMYK/Lab pair with an
    /// incompatible `bps`.
    pub fn new(code: u16, bps: u16) -> Result<Self> {
        let mode = match code {
            0 => ColorMode::Bitmap,
            1 => ColorMode::Grayscale,
            2 => ColorMode::Indexed,
            3 => ColorMode::Rgb,
            4 => ColorMode::Cmyk,
            7 => ColorMode::Multichannel,
            8 => ColorMode::Duotone,
            9 => ColorMode::Lab,
            _ => return Err(PsdError::UnsupportedColorMode(ColorMode::Rgb)),
        };

        if matches!(mode, ColorMode::Cmyk | ColorMode::Lab) && !matches!(bps, 8 | 16) {
            return Err(PsdError::UnsupportedColorMode(mode));
        }

        Ok(mode)
    }

    pub fn as_u16(self) -> u16 {
        match self {
            ColorMode::Bitmap => 0,
            ColorMode::Grayscale => 1,
            ColorMode::Indexed => 2,
            ColorMode::Rgb => 3,
            ColorMode::Cmyk => 4,
            ColorMode::Multichannel => 7,
            ColorMode::Duotone => 8,
            ColorMode::Lab => 9,
        }
    }

    /// Number of color channels implied by the mode, excluding any alpha
    /// channel declared separately in the header's `channels` count.
    pub fn base_channel_count(self) -> u16 {
        match self {
            ColorMode::Bitmap | ColorMode::Grayscale | ColorMode::Indexed | ColorMode::Duotone => {
                1
            }
            ColorMode::Rgb | ColorMode::Lab => 3,
            ColorMode::Cmyk => 4,
            ColorMode::Multichannel => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgb_is_valid_at_any_supported_bps() {
        assert_eq!(ColorMode::new(3, 8).unwrap(), ColorMode::Rgb);
        assert_eq!(ColorMode::new(3, 32).unwrap(), ColorMode::Rgb);
    }

    #[test]
    fn cmyk_rejects_bps_32() {
        assert!(matches!(
            ColorMode::new(4, 32),
            Err(PsdError::UnsupportedColorMode(ColorMode::Cmyk))
        ));
    }

    #[test]
    fn lab_rejects_bps_1() {
        assert!(matches!(
            ColorMode::new(9, 1),
            Err(PsdError::UnsupportedColorMode(ColorMode::Lab))
        ));
    }

    #[test]
    fn unknown_code_is_unsupported() {
        assert!(ColorMode::new(42, 8).is_err());
    }
}
