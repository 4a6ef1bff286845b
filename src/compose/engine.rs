use smallvec::SmallVec;

use crate::compose::blend::blend_line;
use crate::compose::line::{LineBuffer, try_row_bytes};
use crate::compose::stage::{PlaneSource, ReadMaps, check_layout};
use crate::compose::writeback::WritebackTarget;
use crate::format::canonical::Argb16;
use crate::format::{FormatResolver, PixelFormat};
use crate::foundation::crc::FrameCrc;
use crate::foundation::error::{VcrtcError, VcrtcResult};
use crate::frame::{FrameInfo, PlaneStack};

/// Result of one successful composition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ComposeOutcome {
    /// CRC-32 over the composed frame's canonical byte image.
    pub crc: u32,
    /// Composed width (primary destination width).
    pub width: u32,
    /// Composed height (primary destination height).
    pub height: u32,
    /// Whether the rows were also stored into a writeback buffer.
    pub wrote_back: bool,
}

/// Line-by-line compositor: stages each plane's row, blends overlays in z-order, checksums
/// the result and optionally re-encodes it into a writeback buffer.
#[derive(Clone, Debug, Default)]
pub struct ComposeEngine {
    resolver: FormatResolver,
}

impl ComposeEngine {
    /// Create an engine that resolves fourccs through `resolver`.
    pub fn new(resolver: FormatResolver) -> Self {
        Self { resolver }
    }

    /// Compose one frame of `stack`.
    ///
    /// Validation happens once up front; on any error nothing has been composed and the
    /// writeback buffer is untouched.
    #[tracing::instrument(skip_all, fields(planes = stack.len(), writeback = writeback.is_some()))]
    pub fn compose(
        &self,
        stack: &PlaneStack,
        writeback: Option<&FrameInfo>,
    ) -> VcrtcResult<ComposeOutcome> {
        let codes = stack.iter().chain(writeback).map(|info| info.fourcc);
        let (mut formats, _) = self.resolver.resolve_all(codes)?;
        let wb_format = match writeback {
            Some(_) => formats.pop(),
            None => None,
        };
        validate_stack(stack, &formats)?;

        let primary = stack.primary();
        let canvas = primary.dst;
        let width = canvas.width();
        let height = canvas.height();

        let maps = ReadMaps::lock(stack)?;
        let sources = stack
            .iter()
            .zip(&formats)
            .map(|(info, format)| PlaneSource::new(info, *format, &maps))
            .collect::<VcrtcResult<SmallVec<[PlaneSource<'_>; 4]>>>()?;
        let mut target = match (writeback, wb_format) {
            (Some(info), Some(format)) => Some(WritebackTarget::lock(info, format, &maps, canvas)?),
            _ => None,
        };

        let mut output = LineBuffer::try_new(width as usize, "output")?;
        let mut stage = LineBuffer::try_new(width as usize, "stage")?;
        let mut row_bytes = try_row_bytes(width as usize)?;
        let mut crc = FrameCrc::new();

        for y in canvas.y1..canvas.y2 {
            sources[0].stage_row(y, output.as_mut_slice());

            for overlay in &sources[1..] {
                let dst = overlay.info().dst;
                if !dst.contains_row(y) {
                    continue;
                }
                let x = dst.x1 as usize;
                let w = dst.width() as usize;
                let staged = &mut stage.as_mut_slice()[..w];
                overlay.stage_row(y, staged);
                blend_line(staged, &mut output.as_mut_slice()[x..x + w]);
            }

            output.write_le_bytes(&mut row_bytes);
            crc.update(&row_bytes);

            if let Some(target) = target.as_mut() {
                target.store_row(y, output.as_slice());
            }
        }

        let crc = crc.finish();
        tracing::debug!(crc = format_args!("{crc:#010x}"), width, height, "frame composed");
        Ok(ComposeOutcome {
            crc,
            width,
            height,
            wrote_back: target.is_some(),
        })
    }

    /// Decode a whole framebuffer (its source rectangle) into canonical pixels, row-major.
    pub fn read_back(&self, info: &FrameInfo) -> VcrtcResult<Vec<Argb16>> {
        let format = self.resolver.resolve(info.fourcc)?;
        let stack = PlaneStack::new(info.clone());
        let maps = ReadMaps::lock(&stack)?;
        let source = PlaneSource::new(stack.primary(), format, &maps)?;

        let dst = info.dst;
        let width = dst.width() as usize;
        let len = width.saturating_mul(dst.height() as usize);
        let mut pixels = Vec::new();
        pixels
            .try_reserve_exact(len)
            .map_err(|e| VcrtcError::allocation(format!("read back of {len} px: {e}")))?;
        pixels.resize(len, Argb16::TRANSPARENT);

        if width > 0 {
            for (row, y) in pixels.chunks_exact_mut(width).zip(dst.y1..dst.y2) {
                source.stage_row(y, row);
            }
        }
        Ok(pixels)
    }
}

/// Check every bound the scan loop relies on, before any row is touched.
pub(crate) fn validate_stack(stack: &PlaneStack, formats: &[PixelFormat]) -> VcrtcResult<()> {
    let canvas = stack.primary().dst;
    if canvas.width() == 0 || canvas.height() == 0 {
        return Err(VcrtcError::configuration(format!(
            "primary destination {}x{} is empty",
            canvas.width(),
            canvas.height()
        )));
    }
    let canvas_w = i64::from(canvas.width());

    for (z, (info, format)) in stack.iter().zip(formats).enumerate() {
        let dst_w = i64::from(info.dst.width());
        if info.dst.x1 < 0 || i64::from(info.dst.x1) + dst_w > canvas_w {
            return Err(VcrtcError::configuration(format!(
                "plane {z}: destination x {}..{} exceeds output width {canvas_w}",
                info.dst.x1,
                i64::from(info.dst.x1) + dst_w
            )));
        }
        if info.src.x1 < 0 || info.src.y1 < 0 {
            return Err(VcrtcError::configuration(format!(
                "plane {z}: negative source origin"
            )));
        }
        if i64::from(info.src.x2_int()) > i64::from(info.width)
            || i64::from(info.src.y2_int()) > i64::from(info.height)
        {
            return Err(VcrtcError::configuration(format!(
                "plane {z}: source rectangle {}x{} exceeds framebuffer {}x{}",
                info.src.x2_int(),
                info.src.y2_int(),
                info.width,
                info.height
            )));
        }
        check_layout(info, *format)?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/compose/engine.rs"]
mod tests;
