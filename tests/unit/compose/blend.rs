use super::*;

#[test]
fn opaque_source_replaces_destination() {
    let src = Argb16::new(0xffff, 0x1234, 0xabcd, 0x0001);
    for dst in [
        Argb16::new(0xffff, 0, 0, 0),
        Argb16::new(0xffff, 0xffff, 0xffff, 0xffff),
        Argb16::new(0x0000, 0x4000, 0x8000, 0xc000),
    ] {
        assert_eq!(blend_pixel(src, dst), src);
    }
}

#[test]
fn transparent_source_keeps_destination_color() {
    let src = Argb16::TRANSPARENT;
    let dst = Argb16::new(0x1000, 0x0102, 0x0304, 0x0506);
    assert_eq!(blend_pixel(src, dst), Argb16::new(0xffff, 0x0102, 0x0304, 0x0506));
}

#[test]
fn half_alpha_rounds_up() {
    // (0x8080 * 0xffff + 0xffff * 0x7f7f) / 0xffff = 0xffff exactly.
    assert_eq!(blend_channel(0x8080, 0xffff, 0x8080), 0xffff);
    // 0x8080 + 1 * 0x7f7f / 0xffff rounds up to 0x8081.
    assert_eq!(blend_channel(0x8080, 1, 0x8080), 0x8081);
    assert_eq!(blend_channel(0x8080, 0, 0x8080), 0x8080);
}

#[test]
fn non_premultiplied_input_saturates() {
    assert_eq!(blend_channel(0xffff, 0xffff, 0), 0xffff);
}

#[test]
fn blend_line_stops_at_shorter_side() {
    let src = [Argb16::new(0xffff, 1, 2, 3); 2];
    let mut dst = [Argb16::new(0xffff, 9, 9, 9); 3];
    blend_line(&src, &mut dst);
    assert_eq!(dst[0], Argb16::new(0xffff, 1, 2, 3));
    assert_eq!(dst[1], Argb16::new(0xffff, 1, 2, 3));
    assert_eq!(dst[2], Argb16::new(0xffff, 9, 9, 9));
}
