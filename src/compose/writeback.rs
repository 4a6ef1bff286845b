use std::sync::RwLockWriteGuard;

use smallvec::SmallVec;

use crate::compose::stage::{ReadMaps, check_layout};
use crate::format::PixelFormat;
use crate::format::canonical::Argb16;
use crate::format::codec::encode_packed_row;
use crate::format::yuv::{ChromaPlane, encode_chroma_row, encode_luma_row};
use crate::foundation::core::Rect;
use crate::foundation::error::{VcrtcError, VcrtcResult};
use crate::frame::FrameInfo;

/// How a writeback job ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WritebackStatus {
    /// The composed frame was stored into the job's buffer.
    Completed,
    /// The output was torn down before the job ran.
    Cancelled,
}

type DoneFn = Box<dyn FnOnce(WritebackStatus) + Send>;

/// A buffer that receives the next composed frame, plus its completion callback.
///
/// The callback runs exactly once: on completion, or with [`WritebackStatus::Cancelled`] when
/// the job is dropped unfinished.
pub struct WritebackJob {
    frame: FrameInfo,
    done: Option<DoneFn>,
}

impl WritebackJob {
    /// Create a job that reports through `done`.
    pub fn new(frame: FrameInfo, done: impl FnOnce(WritebackStatus) + Send + 'static) -> Self {
        Self {
            frame,
            done: Some(Box::new(done)),
        }
    }

    /// Create a job whose status is delivered on a channel.
    pub fn with_receiver(frame: FrameInfo) -> (Self, crossbeam_channel::Receiver<WritebackStatus>) {
        let (tx, rx) = crossbeam_channel::bounded(1);
        let job = Self::new(frame, move |status| {
            let _ = tx.send(status);
        });
        (job, rx)
    }

    /// The target buffer.
    pub fn frame(&self) -> &FrameInfo {
        &self.frame
    }

    pub(crate) fn complete(mut self, status: WritebackStatus) {
        if let Some(done) = self.done.take() {
            done(status);
        }
    }
}

impl Drop for WritebackJob {
    fn drop(&mut self) {
        if let Some(done) = self.done.take() {
            done(WritebackStatus::Cancelled);
        }
    }
}

impl std::fmt::Debug for WritebackJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WritebackJob")
            .field("frame", &self.frame)
            .field("pending", &self.done.is_some())
            .finish()
    }
}

/// Write-locked writeback buffer for the duration of one activation.
pub(crate) struct WritebackTarget<'a> {
    info: &'a FrameInfo,
    format: PixelFormat,
    guards: SmallVec<[RwLockWriteGuard<'a, Vec<u8>>; 2]>,
    x: usize,
}

impl<'a> WritebackTarget<'a> {
    /// Lock the target for writing rows of `canvas`, the primary plane's destination.
    ///
    /// The target may not share memory with any source plane, nor between its own mappings.
    pub(crate) fn lock(
        info: &'a FrameInfo,
        format: PixelFormat,
        sources: &ReadMaps<'_>,
        canvas: Rect,
    ) -> VcrtcResult<Self> {
        check_layout(info, format)?;
        if canvas.x1 < 0 || canvas.y1 < 0 {
            return Err(VcrtcError::configuration(format!(
                "writeback origin ({}, {}) is outside the buffer",
                canvas.x1, canvas.y1
            )));
        }
        for (i, map) in info.maps.iter().enumerate() {
            if sources.contains(map) {
                return Err(VcrtcError::configuration(
                    "writeback buffer aliases a source plane",
                ));
            }
            if info.maps[..i].iter().any(|m| m.same_memory(map)) {
                return Err(VcrtcError::configuration(
                    "writeback mappings must be distinct",
                ));
            }
        }

        let guards = info
            .maps
            .iter()
            .map(|m| m.write())
            .collect::<VcrtcResult<_>>()?;
        Ok(Self {
            info,
            format,
            guards,
            x: canvas.x1 as usize,
        })
    }

    /// Bytes of `row` in color plane `plane` from `col_bytes` to the end of the row.
    fn row_mut(&mut self, plane: usize, row: usize, col_bytes: usize) -> &mut [u8] {
        let layout = self.info.layout[plane];
        let bytes: &mut Vec<u8> = &mut self.guards[layout.map];
        let end = row
            .checked_add(1)
            .and_then(|next| layout.row_start(next, 0))
            .map_or(bytes.len(), |e| e.min(bytes.len()));
        match layout.row_start(row, col_bytes) {
            Some(start) if start < end => &mut bytes[start..end],
            _ => &mut [],
        }
    }

    /// Encode one composed row into target row `y`.
    pub(crate) fn store_row(&mut self, y: i32, line: &[Argb16]) {
        let Ok(y) = usize::try_from(y) else {
            return;
        };
        let x = self.x;
        match self.format {
            PixelFormat::Yuv420 => {
                encode_luma_row(line, self.row_mut(0, y, 0), x);
                if y % 2 == 0 {
                    encode_chroma_row(line, self.row_mut(1, y / 2, 0), x, ChromaPlane::U);
                    encode_chroma_row(line, self.row_mut(2, y / 2, 0), x, ChromaPlane::V);
                }
            }
            PixelFormat::Nv12 => {
                encode_luma_row(line, self.row_mut(0, y, 0), x);
                if y % 2 == 0 {
                    encode_chroma_row(line, self.row_mut(1, y / 2, 0), x, ChromaPlane::Uv);
                }
            }
            packed => {
                let cpp = self.info.cpp;
                encode_packed_row(packed, line, self.row_mut(0, y, x.saturating_mul(cpp)));
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/compose/writeback.rs"]
mod tests;
