//! JSON scene description: a stack of solid-color planes and an optional writeback target.
//!
//! ```json
//! {
//!   "planes": [
//!     { "format": "xrgb8888", "width": 64, "height": 48, "fill": [65535, 0, 0, 0] },
//!     { "format": "argb16161616", "width": 32, "height": 16,
//!       "fill": [32896, 32896, 0, 0], "dst": { "x": 8, "y": 8, "width": 32, "height": 16 } }
//!   ],
//!   "writeback": "argb8888"
//! }
//! ```
//!
//! `fill` is a premultiplied `[a, r, g, b]` canonical pixel.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::format::PixelFormat;
use crate::format::canonical::Argb16;
use crate::format::codec::encode_packed_row;
use crate::format::yuv::argb16_to_yuv;
use crate::foundation::core::{FixedRect, Rect};
use crate::foundation::error::{VcrtcError, VcrtcResult};
use crate::frame::{FrameInfo, PlaneStack};

/// Placement rectangle in whole pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegionDef {
    /// Left edge.
    pub x: i32,
    /// Top edge.
    pub y: i32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// One plane of a scene.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlaneDef {
    /// Storage format of the framebuffer.
    pub format: PixelFormat,
    /// Raw fourcc to advertise instead of `format`'s own.
    #[serde(default)]
    pub fourcc: Option<u32>,
    /// Framebuffer width.
    pub width: u32,
    /// Framebuffer height.
    pub height: u32,
    /// Solid premultiplied `[a, r, g, b]` fill.
    pub fill: [u16; 4],
    /// Source rectangle; the whole framebuffer when absent.
    #[serde(default)]
    pub src: Option<RegionDef>,
    /// Destination rectangle; the framebuffer size at the origin when absent.
    #[serde(default)]
    pub dst: Option<RegionDef>,
}

/// Raw scene definition as parsed from JSON.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SceneDef {
    /// Planes in z-order; the first is the primary.
    pub planes: Vec<PlaneDef>,
    /// Format of a writeback buffer covering the primary destination.
    #[serde(default)]
    pub writeback: Option<PixelFormat>,
}

/// A parsed, validated scene.
#[derive(Clone, Debug)]
pub struct Scene {
    def: SceneDef,
}

impl Scene {
    /// Parse a scene from a JSON reader.
    pub fn from_reader<R: std::io::Read>(r: R) -> VcrtcResult<Self> {
        let def: SceneDef = serde_json::from_reader(r)
            .map_err(|e| VcrtcError::serde(format!("parse scene JSON: {e}")))?;
        Self::from_def(def)
    }

    /// Parse a scene from a JSON string.
    pub fn from_json_str(s: &str) -> VcrtcResult<Self> {
        Self::from_reader(s.as_bytes())
    }

    /// Parse a scene from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> VcrtcResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            VcrtcError::serde(format!("open scene JSON '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    /// Wrap an already-built definition.
    pub fn from_def(def: SceneDef) -> VcrtcResult<Self> {
        if def.planes.is_empty() {
            return Err(VcrtcError::configuration("scene has no planes"));
        }
        Ok(Self { def })
    }

    /// The underlying definition.
    pub fn def(&self) -> &SceneDef {
        &self.def
    }

    /// Allocate and fill every plane.
    pub fn build_stack(&self) -> VcrtcResult<PlaneStack> {
        let mut planes = self.def.planes.iter().map(build_plane);
        let primary = planes
            .next()
            .ok_or_else(|| VcrtcError::configuration("scene has no planes"))??;
        let mut stack = PlaneStack::new(primary);
        for plane in planes {
            stack.push_overlay(plane?);
        }
        Ok(stack)
    }

    /// Allocate the writeback buffer, if the scene asks for one.
    ///
    /// It covers the output from the origin to the primary destination's far corner, so rows
    /// land at the coordinates they have on the output.
    pub fn build_writeback(&self, stack: &PlaneStack) -> VcrtcResult<Option<FrameInfo>> {
        let Some(format) = self.def.writeback else {
            return Ok(None);
        };
        let dst = stack.primary().dst;
        let width = dst.x2.max(0) as u32;
        let height = dst.y2.max(0) as u32;
        Ok(Some(FrameInfo::alloc(format, width, height)?))
    }
}

fn build_plane(def: &PlaneDef) -> VcrtcResult<FrameInfo> {
    let mut info = FrameInfo::alloc(def.format, def.width, def.height)?;
    let [a, r, g, b] = def.fill;
    fill_solid(&info, def.format, Argb16::new(a, r, g, b))?;

    if let Some(src) = def.src {
        let x = u32::try_from(src.x)
            .map_err(|_| VcrtcError::configuration(format!("negative source x {}", src.x)))?;
        let y = u32::try_from(src.y)
            .map_err(|_| VcrtcError::configuration(format!("negative source y {}", src.y)))?;
        info = info.with_src(FixedRect::from_xywh(x, y, src.width, src.height)?);
    }
    if let Some(dst) = def.dst {
        info = info.with_dst(Rect::from_xywh(dst.x, dst.y, dst.width, dst.height));
    }
    if let Some(code) = def.fourcc {
        info = info.with_fourcc(code);
    }
    Ok(info)
}

/// Encode `px` into every pixel of a freshly allocated framebuffer.
fn fill_solid(info: &FrameInfo, format: PixelFormat, px: Argb16) -> VcrtcResult<()> {
    let mut bytes = info.maps[0].write()?;
    let planes = &info.layout;
    match format {
        PixelFormat::Yuv420 | PixelFormat::Nv12 => {
            let (y, u, v) = argb16_to_yuv(px);
            let luma_end = planes.get(1).map_or(bytes.len(), |l| l.offset);
            bytes[..luma_end].fill(y);
            match format {
                PixelFormat::Yuv420 => {
                    let v_start = planes.get(2).map_or(bytes.len(), |l| l.offset);
                    bytes[luma_end..v_start].fill(u);
                    bytes[v_start..].fill(v);
                }
                _ => {
                    for pair in bytes[luma_end..].chunks_exact_mut(2) {
                        pair.copy_from_slice(&[u, v]);
                    }
                }
            }
        }
        packed => {
            let line = vec![px; info.width as usize];
            let pitch = info.pitch().max(1);
            for row in bytes.chunks_mut(pitch) {
                encode_packed_row(packed, &line, row);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "../tests/unit/scene.rs"]
mod tests;
