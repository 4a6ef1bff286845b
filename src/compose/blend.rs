use crate::format::canonical::Argb16;
use crate::foundation::fixed::div_round_up;

/// Premultiplied "over" for one channel: `ceil((src * 65535 + dst * (65535 - alpha)) / 65535)`.
///
/// Inputs that are not validly premultiplied (`src > alpha`) saturate at 65535.
pub fn blend_channel(src: u16, dst: u16, alpha: u16) -> u16 {
    let pre_blend = u64::from(src) * 0xffff + u64::from(dst) * u64::from(0xffff - alpha);
    div_round_up(pre_blend, 0xffff).min(0xffff) as u16
}

/// Blend `src` over an opaque `dst`; the result is always opaque.
pub fn blend_pixel(src: Argb16, dst: Argb16) -> Argb16 {
    Argb16 {
        a: 0xffff,
        r: blend_channel(src.r, dst.r, src.a),
        g: blend_channel(src.g, dst.g, src.a),
        b: blend_channel(src.b, dst.b, src.a),
    }
}

/// Blend a staged row onto the accumulator, pixel for pixel.
pub(crate) fn blend_line(src: &[Argb16], dst: &mut [Argb16]) {
    for (d, s) in dst.iter_mut().zip(src) {
        *d = blend_pixel(*s, *d);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/compose/blend.rs"]
mod tests;
