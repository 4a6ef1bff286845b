//! vcrtc is the scan-line compositor of a virtual display adapter.
//!
//! Every refresh tick it turns a stack of planes into one output frame:
//!
//! - Decode each plane's row into canonical 16-bit premultiplied ARGB
//! - Blend overlays in z-order onto the primary plane
//! - Fold the row into a CRC-32 and optionally re-encode it into a writeback buffer
//!
//! An [`Output`] ties this to refresh ticks, running compositions on a dedicated worker and
//! reporting one checksum per tick to a [`CrcSink`], including ticks the worker fell behind on.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod compose;
mod foundation;
mod format;
mod frame;
mod schedule;

/// CRC source names accepted by [`Output::set_crc_source`].
pub mod crc_source;
/// JSON scene descriptions for driving an output without a real display stack.
pub mod scene;

pub use crate::compose::blend::{blend_channel, blend_pixel};
pub use crate::compose::engine::{ComposeEngine, ComposeOutcome};
pub use crate::compose::writeback::{WritebackJob, WritebackStatus};
pub use crate::format::canonical::Argb16;
pub use crate::format::codec::{argb16_to_rgb565, rgb565_to_argb16};
pub use crate::format::yuv::{argb16_to_yuv, yuv_to_argb16};
pub use crate::format::{FormatResolver, PixelFormat, fourcc};
pub use crate::foundation::core::{FixedRect, FrameIndex, Rect};
pub use crate::foundation::crc::{FrameCrc, crc32_le};
pub use crate::foundation::error::{VcrtcError, VcrtcResult};
pub use crate::frame::{FrameInfo, MappedBuffer, PlaneLayout, PlaneStack};
pub use crate::scene::Scene;
pub use crate::schedule::opts::ComposerOpts;
pub use crate::schedule::output::{ComposerStats, Output};
pub use crate::schedule::sink::{CountingRefresh, CrcSink, InMemoryCrcSink, RefreshSource};
pub use crate::schedule::state::{ComposerPhase, FrameScheduleState};
