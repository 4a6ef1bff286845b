use crossbeam_channel::Receiver;

use super::*;
use crate::format::PixelFormat;
use crate::foundation::core::Rect;
use crate::frame::FrameInfo;
use crate::schedule::sink::{CountingRefresh, InMemoryCrcSink};
use crate::schedule::state::ComposerPhase;

struct Harness {
    composer: Composer,
    refresh: Arc<CountingRefresh>,
    sink: Arc<InMemoryCrcSink>,
}

fn harness() -> Harness {
    let refresh = Arc::new(CountingRefresh::new());
    let sink = Arc::new(InMemoryCrcSink::new());
    let composer = Composer::new(
        &ComposerOpts::default(),
        Arc::clone(&refresh) as Arc<dyn RefreshSource>,
        Arc::clone(&sink) as Arc<dyn CrcSink>,
    );
    Harness {
        composer,
        refresh,
        sink,
    }
}

fn stack() -> PlaneStack {
    PlaneStack::new(FrameInfo::alloc(PixelFormat::Xrgb8888, 2, 2).unwrap())
}

fn bad_stack() -> PlaneStack {
    let overlay = FrameInfo::alloc(PixelFormat::Argb8888, 2, 2)
        .unwrap()
        .with_dst(Rect::from_xywh(1, 0, 2, 2));
    stack().with_overlay(overlay)
}

fn wb_job() -> (WritebackJob, Receiver<WritebackStatus>) {
    WritebackJob::with_receiver(FrameInfo::alloc(PixelFormat::Argb8888, 2, 2).unwrap())
}

fn crc_of(stack: &PlaneStack) -> u32 {
    ComposeEngine::default().compose(stack, None).unwrap().crc
}

#[test]
fn catch_up_reports_every_missed_frame() {
    let h = harness();
    h.composer.set_crc_source(Some("auto")).unwrap();
    h.composer.commit(stack());
    for f in 5..=8 {
        assert!(h.composer.note_refresh(FrameIndex(f)));
    }
    h.composer.run_activation();

    let c = crc_of(&stack());
    assert_eq!(
        h.sink.entries(),
        vec![
            (FrameIndex(5), c),
            (FrameIndex(6), c),
            (FrameIndex(7), c),
            (FrameIndex(8), c),
        ]
    );
    let stats = h.composer.stats();
    assert_eq!(stats.compositions, 1);
    assert_eq!(stats.crc_entries, 4);
    assert_eq!(h.composer.schedule().phase, ComposerPhase::Idle);
}

#[test]
fn disabled_composer_ignores_ticks() {
    let h = harness();
    h.composer.commit(stack());
    assert!(!h.composer.note_refresh(FrameIndex(1)));
    h.composer.run_activation();
    assert!(h.sink.entries().is_empty());
    assert_eq!(h.composer.stats().skipped, 1);
}

#[test]
fn activation_without_request_does_nothing() {
    let h = harness();
    h.composer.set_crc_source(Some("auto")).unwrap();
    h.composer.commit(stack());
    h.composer.run_activation();
    let stats = h.composer.stats();
    assert_eq!((stats.activations, stats.skipped, stats.compositions), (1, 1, 0));
    assert!(h.sink.entries().is_empty());
}

#[test]
fn failed_activation_reports_nothing_and_next_tick_recovers() {
    let h = harness();
    h.composer.set_crc_source(Some("auto")).unwrap();
    h.composer.commit(bad_stack());
    h.composer.note_refresh(FrameIndex(1));
    h.composer.run_activation();
    assert!(h.sink.entries().is_empty());
    assert_eq!(h.composer.stats().failures, 1);
    assert_eq!(h.composer.schedule().phase, ComposerPhase::Idle);

    h.composer.commit(stack());
    h.composer.note_refresh(FrameIndex(2));
    h.composer.run_activation();
    assert_eq!(h.sink.entries(), vec![(FrameIndex(2), crc_of(&stack()))]);
}

#[test]
fn missing_commit_is_a_failure() {
    let h = harness();
    h.composer.set_crc_source(Some("auto")).unwrap();
    h.composer.note_refresh(FrameIndex(1));
    h.composer.run_activation();
    assert_eq!(h.composer.stats().failures, 1);
    assert!(h.sink.entries().is_empty());
}

#[test]
fn composer_switch_balances_refresh_refs() {
    let h = harness();
    h.composer.set_composer(true);
    assert_eq!(h.refresh.refs(), 1);
    h.composer.set_composer(true);
    assert_eq!(h.refresh.refs(), 1);
    h.composer.set_composer(false);
    assert_eq!(h.refresh.refs(), 0);
    h.composer.set_composer(false);
    assert_eq!(h.refresh.refs(), 0);
}

#[test]
fn unknown_crc_source_disables_capture() {
    let h = harness();
    h.composer.set_crc_source(Some("auto")).unwrap();
    assert_eq!(h.refresh.refs(), 1);

    let err = h.composer.set_crc_source(Some("plane0")).unwrap_err();
    assert!(matches!(err, VcrtcError::InvalidArgument(_)));
    assert_eq!(h.refresh.refs(), 0);
    assert!(!h.composer.note_refresh(FrameIndex(1)));
}

#[test]
fn writeback_alone_enables_ticks() {
    let h = harness();
    h.composer.commit(stack());
    let (job, rx) = wb_job();
    h.composer.attach_writeback(job);
    assert_eq!(h.refresh.refs(), 1);
    assert!(h.composer.schedule().wb_pending);

    assert!(h.composer.note_refresh(FrameIndex(7)));
    h.composer.run_activation();
    assert_eq!(rx.try_recv(), Ok(WritebackStatus::Completed));
    assert_eq!(h.refresh.refs(), 0);
    // CRC capture is off: the frame is composed but not reported.
    assert!(h.sink.entries().is_empty());
    assert_eq!(h.composer.stats().writebacks, 1);
    assert!(!h.composer.note_refresh(FrameIndex(8)));
}

#[test]
fn failed_writeback_is_rearmed() {
    let h = harness();
    h.composer.commit(bad_stack());
    let (job, rx) = wb_job();
    h.composer.attach_writeback(job);
    h.composer.note_refresh(FrameIndex(1));
    h.composer.run_activation();
    assert!(rx.try_recv().is_err());
    assert!(h.composer.schedule().wb_pending);
    assert_eq!(h.refresh.refs(), 1);

    h.composer.commit(stack());
    h.composer.note_refresh(FrameIndex(2));
    h.composer.run_activation();
    assert_eq!(rx.try_recv(), Ok(WritebackStatus::Completed));
    assert_eq!(h.refresh.refs(), 0);
}

#[test]
fn newer_writeback_cancels_older() {
    let h = harness();
    let (first, first_rx) = wb_job();
    let (second, second_rx) = wb_job();
    h.composer.attach_writeback(first);
    h.composer.attach_writeback(second);
    assert_eq!(first_rx.try_recv(), Ok(WritebackStatus::Cancelled));
    assert_eq!(h.refresh.refs(), 1);

    h.composer.teardown();
    assert_eq!(second_rx.try_recv(), Ok(WritebackStatus::Cancelled));
    assert_eq!(h.refresh.refs(), 0);
}

#[test]
fn teardown_releases_composer_reference() {
    let h = harness();
    h.composer.set_crc_source(Some("auto")).unwrap();
    h.composer.commit(stack());
    h.composer.note_refresh(FrameIndex(3));
    h.composer.teardown();
    assert_eq!(h.refresh.refs(), 0);
    assert_eq!(h.composer.schedule(), FrameScheduleState::default());
}

#[test]
fn writeback_attached_after_coalesced_pass_still_completes() {
    let h = harness();
    h.composer.set_crc_source(Some("auto")).unwrap();
    h.composer.commit(stack());
    h.composer.note_refresh(FrameIndex(1));
    h.composer.run_activation();

    let (job, rx) = wb_job();
    h.composer.attach_writeback(job);
    // A second queued pass finds no tick pending.
    h.composer.run_activation();
    assert_eq!(h.composer.stats().skipped, 1);
    assert!(h.composer.schedule().wb_pending);
    assert!(rx.try_recv().is_err());

    h.composer.note_refresh(FrameIndex(2));
    h.composer.run_activation();
    assert_eq!(rx.try_recv(), Ok(WritebackStatus::Completed));
    assert_eq!(h.composer.stats().writebacks, 1);
    // Only the CRC source reference is left.
    assert_eq!(h.refresh.refs(), 1);
}
