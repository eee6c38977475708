use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::error::MpptError;

/// Pending-sweep flag shared between the trigger and the control loop.
///
/// Holds at most one request: raising it while it is already raised has no
/// further effect. Only the control loop clears it, through `take`.
#[derive(Clone, Debug, Default)]
pub struct SweepRequest {
    pending: Arc<AtomicBool>,
}

impl SweepRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the flag. Never blocks.
    pub fn request(&self) {
        self.pending.store(true, Ordering::Release);
    }

    /// Clear the flag, returning whether it was raised.
    pub fn take(&self) -> bool {
        self.pending.swap(false, Ordering::AcqRel)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }
}

/// Background thread raising a `SweepRequest` at a fixed interval.
///
/// Ticks are scheduled from the trigger's own clock, so a long sweep does
/// not shift them.
pub struct SweepTrigger {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl SweepTrigger {
    pub fn spawn(request: SweepRequest, interval: Duration) -> Result<Self, MpptError> {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_clone = Arc::clone(&stop);

        let handle = thread::Builder::new()
            .name("sweep-trigger".into())
            .spawn(move || {
                let mut next_tick = Instant::now() + interval;
                while !stop_clone.load(Ordering::Acquire) {
                    let now = Instant::now();
                    if now >= next_tick {
                        request.request();
                        next_tick += interval;
                    } else {
                        thread::park_timeout(next_tick - now);
                    }
                }
            })
            .map_err(MpptError::TriggerSpawn)?;

        log::debug!("Sweep trigger started, interval {:?}", interval);
        Ok(Self {
            stop,
            handle: Some(handle),
        })
    }

    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.stop.store(true, Ordering::Release);
            handle.thread().unpark();
            let _ = handle.join();
        }
    }
}

impl Drop for SweepTrigger {
    fn drop(&mut self) {
        self.stop();
    }
}
