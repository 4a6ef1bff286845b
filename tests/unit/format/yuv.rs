use super::*;

#[test]
fn gray_decodes_to_gray() {
    for v in [0u8, 16, 128, 235, 255] {
        let px = yuv_to_argb16(v, 128, 128);
        let c = u16::from(v) * 257;
        assert_eq!(px, Argb16::new(0xffff, c, c, c));
    }
}

#[test]
fn saturated_sample_matches_hand_computation() {
    // r = 101 + 1.370705 * 74 = 202.43
    // g = 101 - 0.698001 * 74 + 0.337633 * 96 = 81.76
    // b = 101 - 1.732446 * 96 < 0, clamped
    let px = yuv_to_argb16(101, 32, 202);
    assert_eq!(px, Argb16::new(0xffff, 202 * 257, 82 * 257, 0));
}

#[test]
fn gray_encodes_with_neutral_chroma() {
    for v in [0u16, 1, 77, 128, 254, 255] {
        let c = v * 257;
        assert_eq!(argb16_to_yuv(Argb16::new(0xffff, c, c, c)), (v as u8, 128, 128));
    }
}

#[test]
fn primaries_encode_to_expected_chroma_sides() {
    let (y, u, v) = argb16_to_yuv(Argb16::new(0xffff, 0xffff, 0, 0));
    // 76.245, 90.515 rounded half-up, 284.8 clamped.
    assert_eq!(y, 76);
    assert_eq!(u, 91);
    assert_eq!(v, 255);
}

#[test]
fn planar_and_interleaved_rows_share_chroma_pairs() {
    let luma = [10u8, 20, 30, 40];
    let u = [100u8, 150];
    let v = [200u8, 50];
    let uv = [100u8, 200, 150, 50];

    let mut planar = [Argb16::TRANSPARENT; 4];
    let mut interleaved = [Argb16::TRANSPARENT; 4];
    assert_eq!(
        decode_yuv_row(&luma, ChromaRow::Planar { u: &u, v: &v }, 0, &mut planar),
        4
    );
    assert_eq!(
        decode_yuv_row(&luma, ChromaRow::Interleaved { uv: &uv }, 0, &mut interleaved),
        4
    );
    assert_eq!(planar, interleaved);
    assert_eq!(planar[0], yuv_to_argb16(10, 100, 200));
    assert_eq!(planar[1], yuv_to_argb16(20, 100, 200));
    assert_eq!(planar[3], yuv_to_argb16(40, 150, 50));
}

#[test]
fn decode_honors_start_column_and_capacity() {
    let luma = [1u8, 2, 3, 4, 5];
    let u = [128u8, 128, 128];
    let v = [128u8, 128, 128];
    let mut out = [Argb16::TRANSPARENT; 4];
    let n = decode_yuv_row(&luma, ChromaRow::Planar { u: &u, v: &v }, 3, &mut out);
    assert_eq!(n, 2);
    assert_eq!(out[0].r, 4 * 257);
    assert_eq!(out[1].r, 5 * 257);
    assert_eq!(out[2], Argb16::TRANSPARENT);
}

#[test]
fn encode_writes_luma_and_top_left_chroma() {
    let white = Argb16::new(0xffff, 0xffff, 0xffff, 0xffff);
    let black = Argb16::new(0xffff, 0, 0, 0);
    let line = [white, black, black, white];

    let mut luma = [0u8; 4];
    assert_eq!(encode_luma_row(&line, &mut luma, 0), 4);
    assert_eq!(luma, [255, 0, 0, 255]);

    let mut uv = [0u8; 4];
    encode_chroma_row(&line, &mut uv, 0, ChromaPlane::Uv);
    assert_eq!(uv, [128, 128, 128, 128]);

    let mut u = [7u8; 2];
    encode_chroma_row(&line[1..], &mut u, 1, ChromaPlane::U);
    // Column 1 is odd and skipped, column 2 lands in chroma sample 1.
    assert_eq!(u, [7, 128]);
}
