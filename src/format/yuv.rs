//! 4:2:0 YUV row codecs (BT.601 coefficients, 32.32 fixed point).
//!
//! Luma is addressed at `x`, chroma at `x / 2`; the caller picks the chroma row (`y / 2`).

use crate::format::canonical::Argb16;
use crate::format::codec::{expand_u8, narrow_u16};
use crate::foundation::fixed::Fixed;

const CHROMA_OFFSET: Fixed = Fixed::from_int(128);

const R_V: Fixed = Fixed::from_fraction(1_370_705, 1_000_000);
const G_V: Fixed = Fixed::from_fraction(698_001, 1_000_000);
const G_U: Fixed = Fixed::from_fraction(337_633, 1_000_000);
const B_U: Fixed = Fixed::from_fraction(1_732_446, 1_000_000);

const Y_R: Fixed = Fixed::from_fraction(299, 1000);
const Y_G: Fixed = Fixed::from_fraction(587, 1000);
const Y_B: Fixed = Fixed::from_fraction(114, 1000);
const U_R: Fixed = Fixed::from_fraction(-147, 1000);
const U_G: Fixed = Fixed::from_fraction(-289, 1000);
const U_B: Fixed = Fixed::from_fraction(436, 1000);
const V_R: Fixed = Fixed::from_fraction(615, 1000);
const V_G: Fixed = Fixed::from_fraction(-515, 1000);
const V_B: Fixed = Fixed::from_fraction(-100, 1000);

fn clamp_u8(v: i64) -> u8 {
    v.clamp(0, 255) as u8
}

/// Convert one YUV sample triple to an opaque canonical pixel.
pub fn yuv_to_argb16(y: u8, u: u8, v: u8) -> Argb16 {
    let y = Fixed::from_int(i32::from(y));
    let u = Fixed::from_int(i32::from(u)).sub(CHROMA_OFFSET);
    let v = Fixed::from_int(i32::from(v)).sub(CHROMA_OFFSET);

    let r = y.add(R_V.mul(v));
    let g = y.sub(G_V.mul(v)).sub(G_U.mul(u));
    let b = y.add(B_U.mul(u));

    Argb16 {
        a: 0xffff,
        r: expand_u8(clamp_u8(r.round())),
        g: expand_u8(clamp_u8(g.round())),
        b: expand_u8(clamp_u8(b.round())),
    }
}

/// Convert a canonical pixel to a `(y, u, v)` triple; alpha is dropped.
pub fn argb16_to_yuv(px: Argb16) -> (u8, u8, u8) {
    let r = Fixed::from_int(i32::from(narrow_u16(px.r)));
    let g = Fixed::from_int(i32::from(narrow_u16(px.g)));
    let b = Fixed::from_int(i32::from(narrow_u16(px.b)));

    let y = Y_R.mul(r).add(Y_G.mul(g)).add(Y_B.mul(b));
    let u = U_R.mul(r).add(U_G.mul(g)).add(U_B.mul(b)).add(CHROMA_OFFSET);
    let v = V_R.mul(r).add(V_G.mul(g)).add(V_B.mul(b)).add(CHROMA_OFFSET);

    (
        clamp_u8(y.round()),
        clamp_u8(u.round()),
        clamp_u8(v.round()),
    )
}

/// Chroma samples of one chroma row, each slice starting at the row's first sample.
#[derive(Clone, Copy, Debug)]
pub(crate) enum ChromaRow<'a> {
    /// Separate U and V planes, one byte per sample.
    Planar { u: &'a [u8], v: &'a [u8] },
    /// One plane of `[U, V]` byte pairs.
    Interleaved { uv: &'a [u8] },
}

impl ChromaRow<'_> {
    fn sample(&self, x: usize) -> Option<(u8, u8)> {
        let cx = x / 2;
        match self {
            ChromaRow::Planar { u, v } => Some((*u.get(cx)?, *v.get(cx)?)),
            ChromaRow::Interleaved { uv } => Some((*uv.get(2 * cx)?, *uv.get(2 * cx + 1)?)),
        }
    }
}

/// Decode a YUV row starting at absolute column `x_start`.
///
/// `luma` starts at the luma row's column 0. Decoding stops at the first sample that falls
/// outside either plane.
pub(crate) fn decode_yuv_row(
    luma: &[u8],
    chroma: ChromaRow<'_>,
    x_start: usize,
    out: &mut [Argb16],
) -> usize {
    let mut n = 0;
    for (i, px) in out.iter_mut().enumerate() {
        let x = x_start + i;
        let Some(&y) = luma.get(x) else {
            break;
        };
        let Some((u, v)) = chroma.sample(x) else {
            break;
        };
        *px = yuv_to_argb16(y, u, v);
        n += 1;
    }
    n
}

/// Which chroma plane an encoder pass writes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ChromaPlane {
    U,
    V,
    Uv,
}

/// Store luma for every pixel of `line` starting at column `x_start`.
pub(crate) fn encode_luma_row(line: &[Argb16], dst: &mut [u8], x_start: usize) -> usize {
    let Some(row) = dst.get_mut(x_start..) else {
        return 0;
    };
    let n = line.len().min(row.len());
    for (d, px) in row.iter_mut().zip(&line[..n]) {
        *d = argb16_to_yuv(*px).0;
    }
    n
}

/// Store chroma sampled from the top-left pixel of each 2x2 block.
///
/// The caller only invokes this for even luma rows; odd columns are skipped here.
pub(crate) fn encode_chroma_row(
    line: &[Argb16],
    dst: &mut [u8],
    x_start: usize,
    plane: ChromaPlane,
) {
    for (i, px) in line.iter().enumerate() {
        let x = x_start + i;
        if x % 2 != 0 {
            continue;
        }
        let (_, u, v) = argb16_to_yuv(*px);
        let cx = x / 2;
        let written = match plane {
            ChromaPlane::U => dst.get_mut(cx).map(|d| *d = u),
            ChromaPlane::V => dst.get_mut(cx).map(|d| *d = v),
            ChromaPlane::Uv => dst
                .get_mut(2 * cx..2 * cx + 2)
                .map(|d| d.copy_from_slice(&[u, v])),
        };
        if written.is_none() {
            break;
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/format/yuv.rs"]
mod tests;
