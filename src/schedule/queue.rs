use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;

use crossbeam_channel::{Sender, bounded, unbounded};

use crate::foundation::error::{VcrtcError, VcrtcResult};

enum QueueMsg {
    Compose,
    Flush(Sender<()>),
}

/// Single-slot ordered work queue served by one dedicated thread.
///
/// At most one compose request is outstanding; queueing again before the worker picks it up
/// is a no-op. Dropping the queue drains outstanding work and joins the thread.
pub(crate) struct ComposerQueue {
    tx: Option<Sender<QueueMsg>>,
    queued: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl ComposerQueue {
    /// Start the worker thread; `work` runs once per dequeued compose request.
    pub(crate) fn spawn(name: &str, mut work: impl FnMut() + Send + 'static) -> VcrtcResult<Self> {
        let (tx, rx) = unbounded::<QueueMsg>();
        let queued = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&queued);

        let worker = std::thread::Builder::new()
            .name(name.to_owned())
            .spawn(move || {
                for msg in rx.iter() {
                    match msg {
                        QueueMsg::Compose => {
                            // Cleared before running so a request arriving mid-compose
                            // schedules another pass.
                            flag.store(false, Ordering::Release);
                            work();
                        }
                        QueueMsg::Flush(ack) => {
                            let _ = ack.send(());
                        }
                    }
                }
            })
            .map_err(|e| VcrtcError::worker(format!("failed to spawn '{name}': {e}")))?;

        Ok(Self {
            tx: Some(tx),
            queued,
            worker: Some(worker),
        })
    }

    /// Request one pass. Returns `false` when a request is already waiting.
    pub(crate) fn queue(&self) -> bool {
        if self.queued.swap(true, Ordering::AcqRel) {
            return false;
        }
        match &self.tx {
            Some(tx) if tx.send(QueueMsg::Compose).is_ok() => true,
            _ => {
                self.queued.store(false, Ordering::Release);
                false
            }
        }
    }

    /// Block until every request queued before this call has run.
    pub(crate) fn flush(&self) -> VcrtcResult<()> {
        let tx = self
            .tx
            .as_ref()
            .ok_or_else(|| VcrtcError::worker("composer queue is shut down"))?;
        let (ack_tx, ack_rx) = bounded(1);
        tx.send(QueueMsg::Flush(ack_tx))
            .map_err(|_| VcrtcError::worker("composer worker is not accepting work"))?;
        ack_rx
            .recv()
            .map_err(|_| VcrtcError::worker("composer worker exited before flushing"))
    }

    /// Drain outstanding work and join the worker. Idempotent.
    pub(crate) fn shutdown(&mut self) -> VcrtcResult<()> {
        drop(self.tx.take());
        match self.worker.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| VcrtcError::worker("composer worker panicked")),
            None => Ok(()),
        }
    }
}

impl Drop for ComposerQueue {
    fn drop(&mut self) {
        if let Err(err) = self.shutdown() {
            tracing::error!(%err, "composer queue teardown failed");
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/schedule/queue.rs"]
mod tests;
