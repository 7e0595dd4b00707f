//! Fixed-point helpers for resolution (16.16) and path knot/flatness (8.24)
//! values (§9 Glossary).
//!
//! The teacher never parsed resolution or path resources, so there is no
//! direct precedent in `chinedufn-psd`; this follows the general fixed-point
//! conversion idiom used throughout `lifegpc-msg-tool` (integer storage,
//! `f64` intermediate for the scaled conversion).

/// Converts a signed 32-bit 16.16 fixed-point value to an `f64`.
pub fn fixed_16_16_to_f64(raw: i32) -> f64 {
    raw as f64 / (1u32 << 16) as f64
}

/// Converts an `f64` to the nearest signed 32-bit 16.16 fixed-point value.
pub fn f64_to_fixed_16_16(value: f64) -> i32 {
    (value * (1u32 << 16) as f64).round() as i32
}

/// Converts a signed 32-bit 8.24 fixed-point value to an `f64`.
pub fn fixed_8_24_to_f64(raw: i32) -> f64 {
    raw as f64 / (1u32 << 24) as f64
}

/// Converts an `f64` to the nearest signed 32-bit 8.24 fixed-point value.
pub fn f64_to_fixed_8_24(value: f64) -> i32 {
    (value * (1u32 << 24) as f64).round() as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_16_16_round_trips_whole_numbers() {
        assert_eq!(fixed_16_16_to_f64(72 << 16), 72.0);
        assert_eq!(f64_to_fixed_16_16(72.0), 72 << 16);
    }

    #[test]
    fn fixed_8_24_round_trips_fractional_values() {
        let raw = f64_to_fixed_8_24(0.5);
        assert!((fixed_8_24_to_f64(raw) - 0.5).abs() < 1e-6);
    }
}
