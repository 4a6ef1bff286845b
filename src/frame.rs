use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use smallvec::{SmallVec, smallvec};

use crate::format::PixelFormat;
use crate::foundation::core::{FixedRect, Rect};
use crate::foundation::error::{VcrtcError, VcrtcResult};

/// Already-mapped pixel memory shared between its owner and the composer.
///
/// Clones share the same bytes; identity is pointer identity.
#[derive(Clone, Debug, Default)]
pub struct MappedBuffer(Arc<RwLock<Vec<u8>>>);

impl MappedBuffer {
    /// Wrap bytes that are already laid out in some pixel format.
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(Arc::new(RwLock::new(bytes)))
    }

    /// Allocate `len` zero bytes, reporting allocation failure instead of aborting.
    pub fn zeroed(len: usize) -> VcrtcResult<Self> {
        let mut bytes = Vec::new();
        bytes.try_reserve_exact(len).map_err(|e| {
            VcrtcError::allocation(format!("mapped buffer of {len} bytes: {e}"))
        })?;
        bytes.resize(len, 0);
        Ok(Self::new(bytes))
    }

    /// Copy of the current contents.
    pub fn snapshot(&self) -> VcrtcResult<Vec<u8>> {
        Ok(self.read()?.clone())
    }

    /// Return `true` when both handles refer to the same memory.
    pub fn same_memory(&self, other: &MappedBuffer) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn read(&self) -> VcrtcResult<RwLockReadGuard<'_, Vec<u8>>> {
        self.0
            .read()
            .map_err(|_| VcrtcError::configuration("mapped buffer lock poisoned"))
    }

    pub(crate) fn write(&self) -> VcrtcResult<RwLockWriteGuard<'_, Vec<u8>>> {
        self.0
            .write()
            .map_err(|_| VcrtcError::configuration("mapped buffer lock poisoned"))
    }
}

/// Where one color plane lives inside the frame's mapped buffers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PlaneLayout {
    /// Index into [`FrameInfo::maps`].
    pub map: usize,
    /// Byte offset of the plane's first row.
    pub offset: usize,
    /// Bytes per row.
    pub pitch: usize,
}

impl PlaneLayout {
    /// Byte index of `col_bytes` into row `row`, or `None` on overflow.
    pub(crate) fn row_start(&self, row: usize, col_bytes: usize) -> Option<usize> {
        row.checked_mul(self.pitch)?
            .checked_add(self.offset)?
            .checked_add(col_bytes)
    }
}

/// A ready-to-read (or ready-to-write, for writeback) framebuffer plus its placement.
#[derive(Clone, Debug)]
pub struct FrameInfo {
    /// DRM fourcc; codes without a codec go through the configured fallback.
    pub fourcc: u32,
    /// One or two base mappings.
    pub maps: SmallVec<[MappedBuffer; 2]>,
    /// Per color plane placement: one entry for packed formats, two for NV12, three for YUV420.
    pub layout: SmallVec<[PlaneLayout; 3]>,
    /// Bytes per pixel of color plane 0.
    pub cpp: usize,
    /// Declared framebuffer width; source rectangles must stay inside it.
    pub width: u32,
    /// Declared framebuffer height; source rectangles must stay inside it.
    pub height: u32,
    /// Source rectangle, 16.16.
    pub src: FixedRect,
    /// Destination rectangle on the output, in pixels.
    pub dst: Rect,
}

impl FrameInfo {
    /// Describe a packed single-plane framebuffer shown 1:1 at the output origin.
    pub fn packed(
        format: PixelFormat,
        map: MappedBuffer,
        width: u32,
        height: u32,
        pitch: usize,
    ) -> VcrtcResult<Self> {
        if format.is_yuv() {
            return Err(VcrtcError::configuration(format!(
                "{format} is planar, use FrameInfo::alloc"
            )));
        }
        Ok(Self {
            fourcc: format.fourcc(),
            maps: smallvec![map],
            layout: smallvec![PlaneLayout {
                map: 0,
                offset: 0,
                pitch,
            }],
            cpp: format.cpp(0),
            width,
            height,
            src: FixedRect::from_xywh(0, 0, width, height)?,
            dst: Rect::from_xywh(0, 0, width, height),
        })
    }

    /// Allocate a zeroed, tightly packed framebuffer in one mapping.
    ///
    /// Chroma planes of the 4:2:0 layouts are `ceil(w/2) x ceil(h/2)` samples.
    pub fn alloc(format: PixelFormat, width: u32, height: u32) -> VcrtcResult<Self> {
        let (w, h) = (width as usize, height as usize);
        let (cw, ch) = (w.div_ceil(2), h.div_ceil(2));

        let mut layout: SmallVec<[PlaneLayout; 3]> = SmallVec::new();
        let mut total = 0usize;
        let mut push = |pitch: usize, rows: usize| {
            layout.push(PlaneLayout {
                map: 0,
                offset: total,
                pitch,
            });
            total += pitch * rows;
        };
        match format {
            PixelFormat::Yuv420 => {
                push(w, h);
                push(cw, ch);
                push(cw, ch);
            }
            PixelFormat::Nv12 => {
                push(w, h);
                push(cw * 2, ch);
            }
            _ => push(w * format.cpp(0), h),
        }

        Ok(Self {
            fourcc: format.fourcc(),
            maps: smallvec![MappedBuffer::zeroed(total)?],
            layout,
            cpp: format.cpp(0),
            width,
            height,
            src: FixedRect::from_xywh(0, 0, width, height)?,
            dst: Rect::from_xywh(0, 0, width, height),
        })
    }

    /// Replace the source rectangle.
    pub fn with_src(mut self, src: FixedRect) -> Self {
        self.src = src;
        self
    }

    /// Replace the destination rectangle.
    pub fn with_dst(mut self, dst: Rect) -> Self {
        self.dst = dst;
        self
    }

    /// Override the fourcc without touching the layout.
    pub fn with_fourcc(mut self, fourcc: u32) -> Self {
        self.fourcc = fourcc;
        self
    }

    /// Pitch of color plane 0.
    pub fn pitch(&self) -> usize {
        self.layout.first().map_or(0, |l| l.pitch)
    }

    /// Byte offset of color plane 0.
    pub fn offset(&self) -> usize {
        self.layout.first().map_or(0, |l| l.offset)
    }
}

/// Z-ordered planes; entry 0 is the primary plane and always exists.
#[derive(Clone, Debug)]
pub struct PlaneStack {
    planes: SmallVec<[FrameInfo; 4]>,
}

impl PlaneStack {
    /// Start a stack with its primary plane.
    pub fn new(primary: FrameInfo) -> Self {
        Self {
            planes: smallvec![primary],
        }
    }

    /// Add an overlay on top of everything pushed so far.
    pub fn with_overlay(mut self, overlay: FrameInfo) -> Self {
        self.planes.push(overlay);
        self
    }

    /// Add an overlay on top of everything pushed so far.
    pub fn push_overlay(&mut self, overlay: FrameInfo) {
        self.planes.push(overlay);
    }

    /// The primary plane.
    pub fn primary(&self) -> &FrameInfo {
        &self.planes[0]
    }

    /// Overlays in ascending z-order.
    pub fn overlays(&self) -> &[FrameInfo] {
        &self.planes[1..]
    }

    /// All planes, primary first.
    pub fn iter(&self) -> impl Iterator<Item = &FrameInfo> {
        self.planes.iter()
    }

    /// Number of planes, primary included.
    pub fn len(&self) -> usize {
        self.planes.len()
    }

    /// Always `false`; a stack holds at least its primary.
    pub fn is_empty(&self) -> bool {
        false
    }
}

#[cfg(test)]
#[path = "../tests/unit/frame.rs"]
mod tests;
