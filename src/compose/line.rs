use crate::format::canonical::Argb16;
use crate::foundation::error::{VcrtcError, VcrtcResult};

/// Fixed-width row of canonical pixels, reused for every scanline of one activation.
#[derive(Debug)]
pub(crate) struct LineBuffer {
    px: Vec<Argb16>,
}

impl LineBuffer {
    /// Allocate `width` transparent pixels; failure is reported, not fatal.
    pub(crate) fn try_new(width: usize, what: &str) -> VcrtcResult<Self> {
        let mut px = Vec::new();
        px.try_reserve_exact(width).map_err(|e| {
            VcrtcError::allocation(format!("{what} line buffer ({width} px): {e}"))
        })?;
        px.resize(width, Argb16::TRANSPARENT);
        Ok(Self { px })
    }

    pub(crate) fn as_slice(&self) -> &[Argb16] {
        &self.px
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [Argb16] {
        &mut self.px
    }

    /// Serialize the row into `out` (8 bytes per pixel), the image the frame CRC covers.
    pub(crate) fn write_le_bytes(&self, out: &mut Vec<u8>) {
        out.clear();
        for px in &self.px {
            out.extend_from_slice(&px.to_le_bytes());
        }
    }
}

/// Allocate the per-row byte scratch used for checksumming.
pub(crate) fn try_row_bytes(width: usize) -> VcrtcResult<Vec<u8>> {
    let len = width.saturating_mul(8);
    let mut bytes = Vec::new();
    bytes
        .try_reserve_exact(len)
        .map_err(|e| VcrtcError::allocation(format!("checksum row scratch ({len} bytes): {e}")))?;
    Ok(bytes)
}
