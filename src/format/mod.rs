pub(crate) mod canonical;
pub(crate) mod codec;
pub(crate) mod yuv;

use smallvec::SmallVec;

use crate::foundation::error::{VcrtcError, VcrtcResult};

/// Build a DRM-style little-endian fourcc code.
pub const fn fourcc(code: &[u8; 4]) -> u32 {
    (code[0] as u32) | (code[1] as u32) << 8 | (code[2] as u32) << 16 | (code[3] as u32) << 24
}

/// Pixel formats with a codec.
///
/// Packed formats are little-endian with blue in the lowest bits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PixelFormat {
    /// 32-bit `[B, G, R, A]`.
    Argb8888,
    /// 32-bit `[B, G, R, X]`, alpha implicitly opaque.
    Xrgb8888,
    /// 64-bit, four little-endian 16-bit channels `[B, G, R, A]`.
    Argb16161616,
    /// 64-bit `[B, G, R, X]`, alpha implicitly opaque.
    Xrgb16161616,
    /// 16-bit `r:5 g:6 b:5`, red in the top bits.
    Rgb565,
    /// 4:2:0 with separate Y, U and V planes.
    Yuv420,
    /// 4:2:0 with a Y plane and one interleaved UV plane.
    Nv12,
}

impl PixelFormat {
    /// Every format with a codec, in a stable order.
    pub const ALL: [PixelFormat; 7] = [
        PixelFormat::Argb8888,
        PixelFormat::Xrgb8888,
        PixelFormat::Argb16161616,
        PixelFormat::Xrgb16161616,
        PixelFormat::Rgb565,
        PixelFormat::Yuv420,
        PixelFormat::Nv12,
    ];

    /// DRM fourcc for this format.
    pub const fn fourcc(self) -> u32 {
        match self {
            PixelFormat::Argb8888 => fourcc(b"AR24"),
            PixelFormat::Xrgb8888 => fourcc(b"XR24"),
            PixelFormat::Argb16161616 => fourcc(b"AR48"),
            PixelFormat::Xrgb16161616 => fourcc(b"XR48"),
            PixelFormat::Rgb565 => fourcc(b"RG16"),
            PixelFormat::Yuv420 => fourcc(b"YU12"),
            PixelFormat::Nv12 => fourcc(b"NV12"),
        }
    }

    /// Look up the format for a fourcc; `None` when no codec exists.
    pub fn from_fourcc(code: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.fourcc() == code)
    }

    /// Short lowercase name, matching the serde representation.
    pub const fn name(self) -> &'static str {
        match self {
            PixelFormat::Argb8888 => "argb8888",
            PixelFormat::Xrgb8888 => "xrgb8888",
            PixelFormat::Argb16161616 => "argb16161616",
            PixelFormat::Xrgb16161616 => "xrgb16161616",
            PixelFormat::Rgb565 => "rgb565",
            PixelFormat::Yuv420 => "yuv420",
            PixelFormat::Nv12 => "nv12",
        }
    }

    /// Number of color planes a framebuffer of this format carries.
    pub const fn color_planes(self) -> usize {
        match self {
            PixelFormat::Yuv420 => 3,
            PixelFormat::Nv12 => 2,
            _ => 1,
        }
    }

    /// Bytes per sample in color plane `plane`.
    pub const fn cpp(self, plane: usize) -> usize {
        match self {
            PixelFormat::Argb8888 | PixelFormat::Xrgb8888 => 4,
            PixelFormat::Argb16161616 | PixelFormat::Xrgb16161616 => 8,
            PixelFormat::Rgb565 => 2,
            PixelFormat::Yuv420 => 1,
            PixelFormat::Nv12 => {
                if plane == 0 {
                    1
                } else {
                    2
                }
            }
        }
    }

    /// Return `true` for the chroma-subsampled layouts.
    pub const fn is_yuv(self) -> bool {
        matches!(self, PixelFormat::Yuv420 | PixelFormat::Nv12)
    }
}

impl std::fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Maps raw fourcc codes onto codecs, applying the configured fallback for unknown codes.
#[derive(Clone, Copy, Debug)]
pub struct FormatResolver {
    fallback: Option<PixelFormat>,
}

impl FormatResolver {
    /// `fallback: None` makes unknown codes an error instead of silently decoding them.
    pub fn new(fallback: Option<PixelFormat>) -> Self {
        Self { fallback }
    }

    /// Resolve a fourcc, falling back when configured.
    pub fn resolve(&self, code: u32) -> VcrtcResult<PixelFormat> {
        let (format, fell_back) = self.lookup(code)?;
        if fell_back {
            warn_fallback(code, format);
        }
        Ok(format)
    }

    /// Resolve every code of one composition, warning once per distinct unknown fourcc.
    ///
    /// Also returns the unknown codes that were warned about.
    pub(crate) fn resolve_all(
        &self,
        codes: impl IntoIterator<Item = u32>,
    ) -> VcrtcResult<(SmallVec<[PixelFormat; 4]>, SmallVec<[u32; 2]>)> {
        let mut formats = SmallVec::new();
        let mut unknown: SmallVec<[u32; 2]> = SmallVec::new();
        for code in codes {
            let (format, fell_back) = self.lookup(code)?;
            if fell_back && !unknown.contains(&code) {
                warn_fallback(code, format);
                unknown.push(code);
            }
            formats.push(format);
        }
        Ok((formats, unknown))
    }

    fn lookup(&self, code: u32) -> VcrtcResult<(PixelFormat, bool)> {
        if let Some(format) = PixelFormat::from_fourcc(code) {
            return Ok((format, false));
        }
        match self.fallback {
            Some(fallback) => Ok((fallback, true)),
            None => Err(VcrtcError::UnsupportedFormat(code)),
        }
    }
}

impl Default for FormatResolver {
    fn default() -> Self {
        Self::new(Some(PixelFormat::Xrgb8888))
    }
}

fn warn_fallback(code: u32, fallback: PixelFormat) {
    tracing::warn!(
        fourcc = format_args!("{code:#010x}"),
        fallback = %fallback,
        "no codec for format, using fallback"
    );
}

#[cfg(test)]
#[path = "../../tests/unit/format/mod.rs"]
mod tests;
