use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::compose::engine::ComposeEngine;
use crate::compose::writeback::{WritebackJob, WritebackStatus};
use crate::crc_source::parse_crc_source;
use crate::foundation::core::FrameIndex;
use crate::foundation::error::{VcrtcError, VcrtcResult};
use crate::frame::PlaneStack;
use crate::schedule::opts::ComposerOpts;
use crate::schedule::queue::ComposerQueue;
use crate::schedule::sink::{CrcSink, RefreshSource};
use crate::schedule::state::{Capture, FrameScheduleState};

/// Composer activity counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ComposerStats {
    /// Worker activations, including ones with nothing to do.
    pub activations: u64,
    /// Activations that composed a frame.
    pub compositions: u64,
    /// Activations that found no pending request.
    pub skipped: u64,
    /// Activations aborted by an error.
    pub failures: u64,
    /// CRC entries handed to the sink.
    pub crc_entries: u64,
    /// Writeback jobs completed.
    pub writebacks: u64,
}

#[derive(Debug, Default)]
struct Switches {
    composer: bool,
    crc: bool,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// State shared by the tick path and the worker thread.
pub(crate) struct Composer {
    schedule: Mutex<FrameScheduleState>,
    switches: Mutex<Switches>,
    committed: Mutex<Option<PlaneStack>>,
    writeback: Mutex<Option<WritebackJob>>,
    wb_jobs: AtomicUsize,
    stats: Mutex<ComposerStats>,
    engine: ComposeEngine,
    sink: Arc<dyn CrcSink>,
    refresh: Arc<dyn RefreshSource>,
}

impl Composer {
    pub(crate) fn new(
        opts: &ComposerOpts,
        refresh: Arc<dyn RefreshSource>,
        sink: Arc<dyn CrcSink>,
    ) -> Self {
        Self {
            schedule: Mutex::default(),
            switches: Mutex::default(),
            committed: Mutex::default(),
            writeback: Mutex::default(),
            wb_jobs: AtomicUsize::new(0),
            stats: Mutex::default(),
            engine: ComposeEngine::new(opts.resolver()),
            sink,
            refresh,
        }
    }

    /// Ticks are only taken while CRC capture is on or a writeback job is attached.
    fn is_enabled(&self) -> bool {
        lock(&self.switches).composer || self.wb_jobs.load(Ordering::SeqCst) > 0
    }

    /// Record a tick. Returns `false` when the composer is disabled.
    pub(crate) fn note_refresh(&self, frame: FrameIndex) -> bool {
        if !self.is_enabled() {
            return false;
        }
        if lock(&self.schedule).note_refresh(frame) {
            tracing::debug!(frame = frame.0, "crc worker falling behind");
        }
        true
    }

    pub(crate) fn set_composer(&self, enabled: bool) {
        if enabled {
            self.refresh.get();
        }
        let old = std::mem::replace(&mut lock(&self.switches).composer, enabled);
        if old {
            self.refresh.put();
        }
    }

    pub(crate) fn set_crc_source(&self, source: Option<&str>) -> VcrtcResult<()> {
        let parsed = parse_crc_source(source);
        let enabled = matches!(parsed, Ok(true));
        lock(&self.switches).crc = enabled;
        self.set_composer(enabled);
        parsed.map(|_| ())
    }

    pub(crate) fn commit(&self, stack: PlaneStack) {
        *lock(&self.committed) = Some(stack);
    }

    pub(crate) fn attach_writeback(&self, job: WritebackJob) {
        self.refresh.get();
        self.wb_jobs.fetch_add(1, Ordering::SeqCst);
        let replaced = lock(&self.writeback).replace(job);
        lock(&self.schedule).wb_pending = true;
        if let Some(old) = replaced {
            tracing::debug!("replacing unfinished writeback job");
            self.release_writeback(old, WritebackStatus::Cancelled);
        }
    }

    fn release_writeback(&self, job: WritebackJob, status: WritebackStatus) {
        job.complete(status);
        self.wb_jobs.fetch_sub(1, Ordering::SeqCst);
        self.refresh.put();
    }

    /// Put back a job whose composition failed, unless a newer one was attached meanwhile.
    fn reattach_writeback(&self, job: WritebackJob) {
        let mut slot = lock(&self.writeback);
        if slot.is_some() {
            drop(slot);
            self.release_writeback(job, WritebackStatus::Cancelled);
            return;
        }
        *slot = Some(job);
        drop(slot);
        lock(&self.schedule).wb_pending = true;
    }

    pub(crate) fn stats(&self) -> ComposerStats {
        *lock(&self.stats)
    }

    pub(crate) fn schedule(&self) -> FrameScheduleState {
        *lock(&self.schedule)
    }

    /// One worker pass: take the pending request, compose, report.
    #[tracing::instrument(skip(self), level = "debug")]
    pub(crate) fn run_activation(&self) {
        let capture = lock(&self.schedule).capture();
        lock(&self.stats).activations += 1;

        if !capture.crc_pending {
            lock(&self.stats).skipped += 1;
            lock(&self.schedule).finish();
            return;
        }

        let job = if capture.wb_pending {
            lock(&self.writeback).take()
        } else {
            None
        };
        let stack = lock(&self.committed).clone();

        let result = match &stack {
            Some(stack) => self
                .engine
                .compose(stack, job.as_ref().map(WritebackJob::frame)),
            None => Err(VcrtcError::configuration("no plane stack committed")),
        };

        match result {
            Ok(outcome) => {
                if let Some(job) = job {
                    self.release_writeback(job, WritebackStatus::Completed);
                    lock(&self.stats).writebacks += 1;
                }
                let reported = self.report(&capture, outcome.crc);
                let mut stats = lock(&self.stats);
                stats.compositions += 1;
                stats.crc_entries += reported;
            }
            Err(err) => {
                match &err {
                    VcrtcError::Allocation(_) => {
                        tracing::error!(%err, "composition aborted");
                    }
                    _ => tracing::warn!(%err, "composition aborted"),
                }
                if let Some(job) = job {
                    self.reattach_writeback(job);
                }
                lock(&self.stats).failures += 1;
            }
        }

        lock(&self.schedule).finish();
    }

    fn report(&self, capture: &Capture, crc: u32) -> u64 {
        if !lock(&self.switches).crc {
            return 0;
        }
        let mut n = 0;
        for frame in capture.frames() {
            self.sink.report(frame, crc);
            n += 1;
        }
        n
    }

    /// Release everything the composer holds; the worker must be gone.
    pub(crate) fn teardown(&self) {
        let pending = lock(&self.writeback).take();
        if let Some(job) = pending {
            self.release_writeback(job, WritebackStatus::Cancelled);
        }
        lock(&self.switches).crc = false;
        self.set_composer(false);
        *lock(&self.committed) = None;
        *lock(&self.schedule) = FrameScheduleState::default();
    }
}

/// A virtual display output: accepts plane stacks and refresh ticks, composes on a dedicated
/// worker thread and reports one checksum per refresh.
///
/// Dropping the output drains queued work and joins the worker before releasing buffers.
pub struct Output {
    composer: Arc<Composer>,
    queue: ComposerQueue,
    torn_down: bool,
}

impl Output {
    /// Start an output and its worker thread.
    pub fn new(
        opts: ComposerOpts,
        refresh: Arc<dyn RefreshSource>,
        sink: Arc<dyn CrcSink>,
    ) -> VcrtcResult<Self> {
        let composer = Arc::new(Composer::new(&opts, refresh, sink));
        let worker = Arc::clone(&composer);
        let queue = ComposerQueue::spawn(&opts.worker_name, move || worker.run_activation())?;
        tracing::debug!(worker = %opts.worker_name, "output started");
        Ok(Self {
            composer,
            queue,
            torn_down: false,
        })
    }

    /// Handle a refresh tick. Returns `true` if a composition was queued by this tick.
    pub fn handle_refresh_tick(&self, frame: u64) -> bool {
        if !self.composer.note_refresh(FrameIndex(frame)) {
            return false;
        }
        let queued = self.queue.queue();
        if !queued {
            tracing::debug!(frame, "composer worker already queued");
        }
        queued
    }

    /// Replace the plane stack composed from the next activation on.
    pub fn commit(&self, stack: PlaneStack) {
        self.composer.commit(stack);
    }

    /// Attach a writeback job filled by the next composition.
    ///
    /// A job still waiting from earlier is cancelled.
    pub fn queue_writeback(&self, job: WritebackJob) {
        self.composer.attach_writeback(job);
    }

    /// Enable or disable composition, balancing refresh references.
    pub fn set_composer(&self, enabled: bool) {
        self.composer.set_composer(enabled);
    }

    /// Select the CRC source: `Some("auto")` enables, `None` disables.
    ///
    /// Unknown names disable capture and return [`VcrtcError::InvalidArgument`].
    pub fn set_crc_source(&self, source: Option<&str>) -> VcrtcResult<()> {
        self.composer.set_crc_source(source)
    }

    /// Wait until everything queued so far has been composed.
    pub fn flush(&self) -> VcrtcResult<()> {
        self.queue.flush()
    }

    /// Snapshot of the activity counters.
    pub fn stats(&self) -> ComposerStats {
        self.composer.stats()
    }

    /// Snapshot of the scheduling state.
    pub fn schedule(&self) -> FrameScheduleState {
        self.composer.schedule()
    }

    /// Drain queued work, join the worker and release committed buffers.
    pub fn shutdown(mut self) -> VcrtcResult<()> {
        self.teardown()
    }

    fn teardown(&mut self) -> VcrtcResult<()> {
        if self.torn_down {
            return Ok(());
        }
        self.torn_down = true;
        let joined = self.queue.shutdown();
        self.composer.teardown();
        joined
    }
}

impl Drop for Output {
    fn drop(&mut self) {
        if let Err(err) = self.teardown() {
            tracing::error!(%err, "output teardown failed");
        }
    }
}

impl std::fmt::Debug for Output {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Output")
            .field("schedule", &self.composer.schedule())
            .field("stats", &self.composer.stats())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/schedule/output.rs"]
mod tests;
