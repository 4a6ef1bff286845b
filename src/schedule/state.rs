use crate::foundation::core::FrameIndex;

/// Where the composer is in its tick → compose cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ComposerPhase {
    /// Nothing requested.
    #[default]
    Idle,
    /// A tick requested a composition that has not started yet.
    ScheduledPending,
    /// The worker is composing.
    Composing,
}

/// Bookkeeping shared between the tick path and the worker, always behind the composer lock.
///
/// `frame_start..=frame_end` is the range of ticks that have not been reported yet; it grows
/// while the worker falls behind and is handed over as a whole on the next activation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameScheduleState {
    /// First unreported tick.
    pub frame_start: FrameIndex,
    /// Last unreported tick.
    pub frame_end: FrameIndex,
    /// A composition has been requested since the last capture.
    pub crc_pending: bool,
    /// A writeback job is attached and waiting for a composition.
    pub wb_pending: bool,
    /// Current phase.
    pub phase: ComposerPhase,
}

/// The part of [`FrameScheduleState`] one activation works from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Capture {
    pub(crate) frame_start: FrameIndex,
    pub(crate) frame_end: FrameIndex,
    pub(crate) crc_pending: bool,
    pub(crate) wb_pending: bool,
}

impl Capture {
    /// Every tick this activation reports, ascending.
    pub(crate) fn frames(&self) -> impl Iterator<Item = FrameIndex> + use<> {
        (self.frame_start.0..=self.frame_end.0).map(FrameIndex)
    }
}

impl FrameScheduleState {
    /// Record a refresh tick. Returns `true` when an earlier tick is still unreported.
    pub(crate) fn note_refresh(&mut self, frame: FrameIndex) -> bool {
        let behind = self.crc_pending;
        if !behind {
            self.frame_start = frame;
        }
        self.frame_end = frame;
        self.crc_pending = true;
        if self.phase != ComposerPhase::Composing {
            self.phase = ComposerPhase::ScheduledPending;
        }
        behind
    }

    /// Copy out and clear the pending request; the worker then owns it.
    ///
    /// `wb_pending` is only handed over together with a composition request, so a job attached
    /// between two ticks stays armed for the next one.
    pub(crate) fn capture(&mut self) -> Capture {
        let capture = Capture {
            frame_start: self.frame_start,
            frame_end: self.frame_end,
            crc_pending: self.crc_pending,
            wb_pending: self.wb_pending,
        };
        self.frame_start = FrameIndex(0);
        self.frame_end = FrameIndex(0);
        if self.crc_pending {
            self.wb_pending = false;
        }
        self.crc_pending = false;
        self.phase = ComposerPhase::Composing;
        capture
    }

    /// Leave `Composing`, back to `ScheduledPending` if a tick arrived meanwhile.
    pub(crate) fn finish(&mut self) {
        self.phase = if self.crc_pending {
            ComposerPhase::ScheduledPending
        } else {
            ComposerPhase::Idle
        };
    }
}

#[cfg(test)]
#[path = "../../tests/unit/schedule/state.rs"]
mod tests;
