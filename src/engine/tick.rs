//! Background progress tick.
//!
//! While a session is navigating, a named thread re-runs the arrival check
//! and refreshes the distance/time-remaining estimates from the last known
//! location, independent of incoming location fixes. The task holds only a
//! `Weak` reference to the engine, so dropping every `Navigator` handle
//! never leaks a repeating timer.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use super::Inner;

/// Sleep granularity of the tick loop; keeps cancellation prompt.
const SLICE: Duration = Duration::from_millis(100);

/// Handle to the running tick thread.
///
/// `cancel` is safe to call more than once and from any thread, including
/// the tick thread itself (the self-join is skipped; the thread exits on
/// its own after observing the shutdown flag).
pub(crate) struct TickTask {
    shutdown: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl TickTask {
    pub fn spawn(inner: Weak<Inner>, interval: Duration) -> Self {
        let shutdown = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&shutdown);
        let handle = thread::Builder::new()
            .name("nav-tick".into())
            .spawn(move || run(inner, flag, interval))
            .expect("Failed to spawn navigation tick thread");
        Self {
            shutdown,
            handle: Some(handle),
        }
    }

    pub fn cancel(&mut self) {
        self.shutdown.store(true, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            if handle.thread().id() != thread::current().id() {
                let _ = handle.join();
            }
        }
    }
}

impl Drop for TickTask {
    fn drop(&mut self) {
        self.cancel();
    }
}

fn run(weak: Weak<Inner>, shutdown: Arc<AtomicBool>, interval: Duration) {
    let mut next_tick = Instant::now() + interval;

    loop {
        if shutdown.load(Ordering::Acquire) {
            break;
        }

        let now = Instant::now();
        if now < next_tick {
            thread::sleep(SLICE.min(next_tick - now));
            continue;
        }
        next_tick = now + interval;

        let Some(inner) = weak.upgrade() else {
            break;
        };
        let keep_going = super::tick_once(&inner);
        drop(inner);
        if !keep_going {
            break;
        }
    }

    tracing::debug!("navigation tick task exited");
}
