use super::*;
use crate::compose::blend::blend_channel;
use crate::format::canonical::Argb16;
use crate::format::codec::{decode_packed_row, encode_packed_row};
use crate::foundation::core::{FixedRect, Rect};
use crate::foundation::crc::crc32_le;

fn solid(format: PixelFormat, w: u32, h: u32, px: Argb16) -> FrameInfo {
    let info = FrameInfo::alloc(format, w, h).unwrap();
    {
        let mut bytes = info.maps[0].write().unwrap();
        let line = vec![px; w as usize];
        for row in bytes.chunks_exact_mut(info.pitch()) {
            encode_packed_row(format, &line, row);
        }
    }
    info
}

fn read_ar48(info: &FrameInfo) -> Vec<Argb16> {
    let bytes = info.maps[0].snapshot().unwrap();
    let mut out = vec![Argb16::default(); bytes.len() / 8];
    decode_packed_row(PixelFormat::Argb16161616, &bytes, &mut out);
    out
}

fn crc_of(rows: &[&[Argb16]]) -> u32 {
    rows.iter().fold(0, |crc, row| {
        let bytes: Vec<u8> = row.iter().flat_map(|p| p.to_le_bytes()).collect();
        crc32_le(crc, &bytes)
    })
}

const BLACK: Argb16 = Argb16::new(0xffff, 0, 0, 0);
const WHITE: Argb16 = Argb16::new(0xffff, 0xffff, 0xffff, 0xffff);

#[test]
fn half_alpha_overlay_matches_blend_formula() {
    let primary = solid(PixelFormat::Argb16161616, 3, 2, BLACK);
    let overlay = solid(PixelFormat::Argb16161616, 3, 2, Argb16::new(0x8080, 0x8080, 0, 0));
    let stack = PlaneStack::new(primary).with_overlay(overlay);
    let wb = FrameInfo::alloc(PixelFormat::Argb16161616, 3, 2).unwrap();

    let outcome = ComposeEngine::default().compose(&stack, Some(&wb)).unwrap();
    assert!(outcome.wrote_back);
    assert_eq!((outcome.width, outcome.height), (3, 2));

    let expected_r = blend_channel(0x8080, 0, 0x8080);
    assert_eq!(expected_r, 0x8080);
    let expected = Argb16::new(0xffff, expected_r, 0, 0);
    assert!(read_ar48(&wb).iter().all(|p| *p == expected));

    let row = [expected; 3];
    assert_eq!(outcome.crc, crc_of(&[&row, &row]));
}

#[test]
fn full_red_at_half_alpha_is_taken_as_premultiplied() {
    let primary = solid(PixelFormat::Argb16161616, 2, 1, BLACK);
    let overlay = solid(PixelFormat::Argb16161616, 2, 1, Argb16::new(0x8080, 0xffff, 0, 0));
    let stack = PlaneStack::new(primary).with_overlay(overlay);
    let wb = FrameInfo::alloc(PixelFormat::Argb16161616, 2, 1).unwrap();
    ComposeEngine::default().compose(&stack, Some(&wb)).unwrap();

    // Color channels are not scaled by alpha again.
    assert_eq!(blend_channel(0xffff, 0, 0x8080), 0xffff);
    let expected = Argb16::new(0xffff, 0xffff, 0, 0);
    assert_eq!(read_ar48(&wb), vec![expected; 2]);
}

#[test]
fn identical_contents_give_identical_crc() {
    let build = || {
        PlaneStack::new(solid(
            PixelFormat::Xrgb8888,
            4,
            4,
            Argb16::new(0xffff, 0x1111, 0x2222, 0x3333),
        ))
        .with_overlay(solid(PixelFormat::Rgb565, 2, 2, WHITE).with_dst(Rect::from_xywh(1, 1, 2, 2)))
    };
    let engine = ComposeEngine::default();
    let a = engine.compose(&build(), None).unwrap();
    let b = engine.compose(&build(), None).unwrap();
    assert_eq!(a, b);
    assert!(!a.wrote_back);
}

#[test]
fn overlay_lands_at_its_destination() {
    let primary = solid(PixelFormat::Xrgb8888, 4, 3, BLACK);
    let overlay = solid(PixelFormat::Argb8888, 2, 1, WHITE).with_dst(Rect::from_xywh(1, 1, 2, 1));
    let stack = PlaneStack::new(primary).with_overlay(overlay);
    let wb = FrameInfo::alloc(PixelFormat::Argb16161616, 4, 3).unwrap();

    ComposeEngine::default().compose(&stack, Some(&wb)).unwrap();
    let px = read_ar48(&wb);
    assert_eq!(&px[..4], &[BLACK; 4]);
    assert_eq!(&px[4..8], &[BLACK, WHITE, WHITE, BLACK]);
    assert_eq!(&px[8..], &[BLACK; 4]);
}

#[test]
fn primary_alpha_is_kept_as_decoded() {
    let seed = Argb16::new(0x1000, 0x1000, 0, 0x0800);
    let stack = PlaneStack::new(solid(PixelFormat::Argb16161616, 2, 1, seed));
    let wb = FrameInfo::alloc(PixelFormat::Argb16161616, 2, 1).unwrap();

    let outcome = ComposeEngine::default().compose(&stack, Some(&wb)).unwrap();
    assert_eq!(read_ar48(&wb), vec![seed; 2]);
    assert_eq!(outcome.crc, crc_of(&[&[seed; 2]]));
}

#[test]
fn overlay_past_right_edge_aborts() {
    let primary = solid(PixelFormat::Xrgb8888, 2, 2, BLACK);
    let overlay = solid(PixelFormat::Argb8888, 2, 2, WHITE).with_dst(Rect::from_xywh(1, 0, 2, 2));
    let stack = PlaneStack::new(primary).with_overlay(overlay);
    let wb = FrameInfo::alloc(PixelFormat::Argb8888, 2, 2).unwrap();

    let err = ComposeEngine::default().compose(&stack, Some(&wb)).unwrap_err();
    assert!(matches!(err, VcrtcError::Configuration(_)));
    assert!(wb.maps[0].snapshot().unwrap().iter().all(|b| *b == 0));
}

#[test]
fn negative_destination_offset_aborts() {
    let primary = solid(PixelFormat::Xrgb8888, 2, 2, BLACK);
    let overlay = solid(PixelFormat::Argb8888, 1, 1, WHITE).with_dst(Rect::from_xywh(-1, 0, 1, 1));
    let stack = PlaneStack::new(primary).with_overlay(overlay);
    assert!(ComposeEngine::default().compose(&stack, None).is_err());
}

#[test]
fn source_rect_past_framebuffer_aborts() {
    let primary = solid(PixelFormat::Xrgb8888, 2, 2, BLACK)
        .with_src(FixedRect::from_xywh(1, 0, 2, 2).unwrap());
    let stack = PlaneStack::new(primary);
    let err = ComposeEngine::default().compose(&stack, None).unwrap_err();
    assert!(matches!(err, VcrtcError::Configuration(_)));
}

#[test]
fn empty_primary_destination_aborts() {
    let primary = solid(PixelFormat::Xrgb8888, 2, 2, BLACK).with_dst(Rect::from_xywh(0, 0, 0, 2));
    assert!(ComposeEngine::default().compose(&PlaneStack::new(primary), None).is_err());
}

#[test]
fn unknown_fourcc_follows_resolver() {
    const YV12: u32 = 0x3231_5659;
    let known = PlaneStack::new(solid(PixelFormat::Xrgb8888, 2, 2, WHITE));
    let unknown = PlaneStack::new(solid(PixelFormat::Xrgb8888, 2, 2, WHITE).with_fourcc(YV12));

    let lenient = ComposeEngine::default();
    assert_eq!(
        lenient.compose(&known, None).unwrap(),
        lenient.compose(&unknown, None).unwrap()
    );

    let strict = ComposeEngine::new(FormatResolver::new(None));
    let err = strict.compose(&unknown, None).unwrap_err();
    assert!(matches!(err, VcrtcError::UnsupportedFormat(YV12)));
}

#[test]
fn yuv_writeback_of_gray_frame() {
    let gray = Argb16::new(0xffff, 100 * 257, 100 * 257, 100 * 257);
    let stack = PlaneStack::new(solid(PixelFormat::Xrgb8888, 4, 2, gray));
    let wb = FrameInfo::alloc(PixelFormat::Yuv420, 4, 2).unwrap();

    ComposeEngine::default().compose(&stack, Some(&wb)).unwrap();
    let bytes = wb.maps[0].snapshot().unwrap();
    assert_eq!(&bytes[..8], &[100; 8]);
    assert_eq!(&bytes[8..12], &[128; 4]);
}

#[test]
fn read_back_decodes_whole_frame() {
    let color = Argb16::new(0xffff, 0x1111, 0x2222, 0x3333);
    let info = solid(PixelFormat::Xrgb8888, 3, 2, color);
    let pixels = ComposeEngine::default().read_back(&info).unwrap();
    assert_eq!(pixels, vec![color; 6]);

    let nv12 = FrameInfo::alloc(PixelFormat::Nv12, 2, 2).unwrap();
    let pixels = ComposeEngine::default().read_back(&nv12).unwrap();
    assert_eq!(pixels.len(), 4);
    assert!(pixels.iter().all(|p| p.a == 0xffff));
}
