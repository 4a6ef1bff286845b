use std::sync::RwLockReadGuard;

use smallvec::SmallVec;

use crate::format::PixelFormat;
use crate::format::canonical::Argb16;
use crate::format::codec::decode_packed_row;
use crate::format::yuv::{ChromaRow, decode_yuv_row};
use crate::frame::{FrameInfo, MappedBuffer, PlaneLayout, PlaneStack};
use crate::foundation::error::{VcrtcError, VcrtcResult};

/// Read locks over every distinct mapping referenced by a plane stack, held for one activation.
pub(crate) struct ReadMaps<'a> {
    entries: SmallVec<[(&'a MappedBuffer, RwLockReadGuard<'a, Vec<u8>>); 8]>,
}

impl<'a> ReadMaps<'a> {
    /// Lock each mapping once, even when several planes share it.
    pub(crate) fn lock(stack: &'a PlaneStack) -> VcrtcResult<Self> {
        let mut entries: SmallVec<[(&'a MappedBuffer, RwLockReadGuard<'a, Vec<u8>>); 8]> =
            SmallVec::new();
        for map in stack.iter().flat_map(|p| p.maps.iter()) {
            if entries.iter().any(|(m, _)| m.same_memory(map)) {
                continue;
            }
            entries.push((map, map.read()?));
        }
        Ok(Self { entries })
    }

    pub(crate) fn contains(&self, map: &MappedBuffer) -> bool {
        self.entries.iter().any(|(m, _)| m.same_memory(map))
    }

    fn bytes(&self, map: &MappedBuffer) -> &[u8] {
        self.entries
            .iter()
            .find(|(m, _)| m.same_memory(map))
            .map(|(_, g)| g.as_slice())
            .unwrap_or(&[])
    }
}

/// Check that `info` carries one valid layout entry per color plane of `format`.
pub(crate) fn check_layout(info: &FrameInfo, format: PixelFormat) -> VcrtcResult<()> {
    let needed = format.color_planes();
    if info.layout.len() < needed {
        return Err(VcrtcError::configuration(format!(
            "{format} needs {needed} color planes, frame describes {}",
            info.layout.len()
        )));
    }
    if let Some(bad) = info.layout[..needed]
        .iter()
        .find(|l| l.map >= info.maps.len())
    {
        return Err(VcrtcError::configuration(format!(
            "color plane references map {} of {}",
            bad.map,
            info.maps.len()
        )));
    }
    Ok(())
}

/// One plane resolved against its locked mappings, ready to produce rows.
pub(crate) struct PlaneSource<'m> {
    info: &'m FrameInfo,
    format: PixelFormat,
    planes: SmallVec<[(&'m [u8], PlaneLayout); 3]>,
}

impl<'m> PlaneSource<'m> {
    pub(crate) fn new(
        info: &'m FrameInfo,
        format: PixelFormat,
        maps: &'m ReadMaps<'_>,
    ) -> VcrtcResult<Self> {
        check_layout(info, format)?;
        let planes = info.layout[..format.color_planes()]
            .iter()
            .map(|l| (maps.bytes(&info.maps[l.map]), *l))
            .collect();
        Ok(Self {
            info,
            format,
            planes,
        })
    }

    pub(crate) fn info(&self) -> &'m FrameInfo {
        self.info
    }

    fn row(&self, plane: usize, row: usize, col_bytes: usize) -> &'m [u8] {
        let (bytes, layout) = self.planes[plane];
        layout
            .row_start(row, col_bytes)
            .and_then(|start| bytes.get(start..))
            .unwrap_or(&[])
    }

    /// Decode the part of this plane that lands on output row `y` into `out`.
    ///
    /// `out` is the plane's destination width. Pixels the buffer cannot supply are left
    /// transparent. Returns the number of decoded pixels.
    pub(crate) fn stage_row(&self, y: i32, out: &mut [Argb16]) -> usize {
        let x_src = self.info.src.x1_int().max(0) as usize;
        let y_src = y - self.info.dst.y1 + self.info.src.y1_int();

        let n = match usize::try_from(y_src) {
            Err(_) => 0,
            Ok(y_src) => match self.format {
                PixelFormat::Yuv420 => {
                    let chroma = ChromaRow::Planar {
                        u: self.row(1, y_src / 2, 0),
                        v: self.row(2, y_src / 2, 0),
                    };
                    decode_yuv_row(self.row(0, y_src, 0), chroma, x_src, out)
                }
                PixelFormat::Nv12 => {
                    let chroma = ChromaRow::Interleaved {
                        uv: self.row(1, y_src / 2, 0),
                    };
                    decode_yuv_row(self.row(0, y_src, 0), chroma, x_src, out)
                }
                packed => {
                    let src = self.row(0, y_src, x_src.saturating_mul(self.info.cpp));
                    decode_packed_row(packed, src, out)
                }
            },
        };
        out[n..].fill(Argb16::TRANSPARENT);
        n
    }
}

#[cfg(test)]
#[path = "../../tests/unit/compose/stage.rs"]
mod tests;
