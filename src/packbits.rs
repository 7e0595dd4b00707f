//! PackBits (Apple TIFF-style) RLE codec (§4.3), used per scanline.
//!
//! Grounded in the teacher's inline decode loop in
//! `psd_channel.rs::rle_decompress_channel` (header-byte sign dispatch is
//! identical) and `lifegpc-msg-tool`'s `rle_compress`/`rle_decompress` for the
//! encoder's minimum-run-length greedy strategy.

use crate::error::{PsdError, Result};

const MAX_LITERAL_RUN: usize = 128;
const MAX_REPLICATE_RUN: usize = 128;

/// Decodes one PackBits stream, stopping once `unpacked_len` output bytes
/// have been produced. Excess packed bytes beyond that point are tolerated
/// (not consumed, not an error) per spec.
pub fn unpack(packed: &[u8], unpacked_len: usize) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(unpacked_len);
    let mut i = 0;

    while out.len() < unpacked_len {
        if i >= packed.len() {
            return Err(PsdError::corrupt("packbits stream underrun"));
        }
        let n = packed[i] as i8;
        i += 1;

        if n == -128 {
            continue;
        } else if n >= 0 {
            let count = n as usize + 1;
            let end = i + count;
            if end > packed.len() {
                return Err(PsdError::corrupt("packbits literal run overruns input"));
            }
            out.extend_from_slice(&packed[i..end]);
            i = end;
        } else {
            if i >= packed.len() {
                return Err(PsdError::corrupt("packbits replicate run missing byte"));
            }
            let count = 1 - n as isize;
            let byte = packed[i];
            i += 1;
            out.extend(std::iter::repeat(byte).take(count as usize));
        }
    }

    out.truncate(unpacked_len);
    Ok(out)
}

/// Encodes `data` using a greedy minimum-run-length strategy: the encoder
/// never emits the `-128` (nop) header byte.
pub fn pack(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    let mut i = 0;

    while i < data.len() {
        let run_len = replicate_run_len(data, i);

        if run_len >= 3 {
            let take = run_len.min(MAX_REPLICATE_RUN);
            out.push((1 - take as i32) as i8 as u8);
            out.push(data[i]);
            i += take;
            continue;
        }

        let lit_len = literal_run_len(data, i);
        out.push((lit_len - 1) as i8 as u8);
        out.extend_from_slice(&data[i..i + lit_len]);
        i += lit_len;
    }

    out
}

fn replicate_run_len(data: &[u8], start: usize) -> usize {
    let mut len = 1;
    while start + len < data.len() && data[start + len] == data[start] && len < MAX_REPLICATE_RUN {
        len += 1;
    }
    len
}

fn literal_run_len(data: &[u8], start: usize) -> usize {
    let mut len = 1;
    while start + len < data.len() && len < MAX_LITERAL_RUN {
        if replicate_run_len(data, start + len) >= 3 {
            break;
        }
        len += 1;
    }
    len
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spec_example_decodes_literal_run() {
        let packed = [0x02, 0xFF, 0x00, 0x7F, 0x40];
        let decoded = unpack(&packed, 4).unwrap();
        assert_eq!(decoded, vec![0xFF, 0x00, 0x7F, 0x40]);
    }

    #[test]
    fn decodes_replicate_run() {
        let packed = [0xFEu8, 0xAA];
        assert_eq!(unpack(&packed, 3).unwrap(), vec![0xAA, 0xAA, 0xAA]);
    }

    #[test]
    fn nop_byte_is_skipped() {
        let packed = [0x80u8, 0x00, 0x02, 0x01];
        assert_eq!(unpack(&packed, 2).unwrap(), vec![0x00, 0x02]);
    }

    #[test]
    fn pack_unpack_round_trips_for_mixed_data() {
        let data: Vec<u8> = (0..=255u8)
            .chain(std::iter::repeat(7u8).take(10))
            .chain([1, 2, 3, 3, 3, 3, 200])
            .collect();
        let packed = pack(&data);
        assert!(!packed.iter().any(|&b| b as i8 == -128));
        let unpacked = unpack(&packed, data.len()).unwrap();
        assert_eq!(unpacked, data);
    }

    #[test]
    fn pack_never_emits_nop_header() {
        let data = vec![0u8; 400];
        let packed = pack(&data);
        assert!(!packed.iter().any(|&b| b as i8 == -128));
    }
}
