//! Row codecs between packed pixel formats and [`Argb16`].
//!
//! Decoders read from a byte slice starting at the row's first pixel and stop at whichever comes
//! first: the end of the slice or the end of the output line. They return the number of pixels
//! produced. Encoders mirror that contract.

use crate::format::PixelFormat;
use crate::format::canonical::Argb16;
use crate::foundation::fixed::{Fixed, div_round_up};

/// 65535 / 31, the 5-bit to 16-bit ratio.
const RB_RATIO: Fixed = Fixed::from_int(65535).div(Fixed::from_int(31));
/// 65535 / 63, the 6-bit to 16-bit ratio.
const G_RATIO: Fixed = Fixed::from_int(65535).div(Fixed::from_int(63));

/// Widen an 8-bit channel; 257 is exactly (2^16 - 1) / (2^8 - 1).
pub(crate) fn expand_u8(c: u8) -> u16 {
    u16::from(c) * 257
}

/// Narrow a 16-bit channel with ceiling division by 257.
pub(crate) fn narrow_u16(c: u16) -> u8 {
    div_round_up(u64::from(c), 257) as u8
}

fn read_u16(bytes: &[u8], i: usize) -> u16 {
    u16::from_le_bytes([bytes[2 * i], bytes[2 * i + 1]])
}

fn write_u16(bytes: &mut [u8], i: usize, v: u16) {
    bytes[2 * i..2 * i + 2].copy_from_slice(&v.to_le_bytes());
}

/// Decode one packed RGB565 value.
pub fn rgb565_to_argb16(v: u16) -> Argb16 {
    let r = Fixed::from_int(i32::from((v >> 11) & 0x1f));
    let g = Fixed::from_int(i32::from((v >> 5) & 0x3f));
    let b = Fixed::from_int(i32::from(v & 0x1f));

    Argb16 {
        a: 0xffff,
        r: r.mul(RB_RATIO).round() as u16,
        g: g.mul(G_RATIO).round() as u16,
        b: b.mul(RB_RATIO).round() as u16,
    }
}

/// Encode one pixel as packed RGB565; alpha is dropped.
pub fn argb16_to_rgb565(px: Argb16) -> u16 {
    let r = Fixed::from_int(i32::from(px.r)).div(RB_RATIO).round().min(0x1f) as u16;
    let g = Fixed::from_int(i32::from(px.g)).div(G_RATIO).round().min(0x3f) as u16;
    let b = Fixed::from_int(i32::from(px.b)).div(RB_RATIO).round().min(0x1f) as u16;
    (r << 11) | (g << 5) | b
}

/// Decode a packed row into `out`. `format` must not be a YUV layout.
pub(crate) fn decode_packed_row(format: PixelFormat, src: &[u8], out: &mut [Argb16]) -> usize {
    let cpp = format.cpp(0);
    let n = out.len().min(src.len() / cpp);

    for (px, s) in out[..n].iter_mut().zip(src.chunks_exact(cpp)) {
        *px = match format {
            PixelFormat::Argb8888 => Argb16 {
                a: expand_u8(s[3]),
                r: expand_u8(s[2]),
                g: expand_u8(s[1]),
                b: expand_u8(s[0]),
            },
            PixelFormat::Xrgb8888 => Argb16 {
                a: 0xffff,
                r: expand_u8(s[2]),
                g: expand_u8(s[1]),
                b: expand_u8(s[0]),
            },
            PixelFormat::Argb16161616 => Argb16 {
                a: read_u16(s, 3),
                r: read_u16(s, 2),
                g: read_u16(s, 1),
                b: read_u16(s, 0),
            },
            PixelFormat::Xrgb16161616 => Argb16 {
                a: 0xffff,
                r: read_u16(s, 2),
                g: read_u16(s, 1),
                b: read_u16(s, 0),
            },
            PixelFormat::Rgb565 => rgb565_to_argb16(read_u16(s, 0)),
            PixelFormat::Yuv420 | PixelFormat::Nv12 => {
                unreachable!("planar formats are staged through the yuv codec")
            }
        };
    }
    n
}

/// Encode `line` into a packed row. `format` must not be a YUV layout.
pub(crate) fn encode_packed_row(format: PixelFormat, line: &[Argb16], dst: &mut [u8]) -> usize {
    let cpp = format.cpp(0);
    let n = line.len().min(dst.len() / cpp);

    for (d, px) in dst.chunks_exact_mut(cpp).zip(&line[..n]) {
        match format {
            PixelFormat::Argb8888 => {
                d.copy_from_slice(&[
                    narrow_u16(px.b),
                    narrow_u16(px.g),
                    narrow_u16(px.r),
                    narrow_u16(px.a),
                ]);
            }
            PixelFormat::Xrgb8888 => {
                d.copy_from_slice(&[narrow_u16(px.b), narrow_u16(px.g), narrow_u16(px.r), 0xff]);
            }
            PixelFormat::Argb16161616 => {
                write_u16(d, 0, px.b);
                write_u16(d, 1, px.g);
                write_u16(d, 2, px.r);
                write_u16(d, 3, px.a);
            }
            PixelFormat::Xrgb16161616 => {
                write_u16(d, 0, px.b);
                write_u16(d, 1, px.g);
                write_u16(d, 2, px.r);
                write_u16(d, 3, 0xffff);
            }
            PixelFormat::Rgb565 => write_u16(d, 0, argb16_to_rgb565(*px)),
            PixelFormat::Yuv420 | PixelFormat::Nv12 => {
                unreachable!("planar formats are stored through the yuv codec")
            }
        }
    }
    n
}

#[cfg(test)]
#[path = "../../tests/unit/format/codec.rs"]
mod tests;
