//! Cancellable repeating timer thread.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::error::Result;

/// Runs a task every `interval` on its own thread until cancelled.
///
/// Deadlines advance by whole intervals from the start, so a slow task
/// shortens the next wait instead of pushing every later tick back. A task
/// that overruns a whole interval skips the missed ticks rather than firing
/// them back to back.
pub struct PollTimer {
    cancelled: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl PollTimer {
    pub fn spawn<F>(name: &str, interval: Duration, mut task: F) -> Result<Self>
    where
        F: FnMut() + Send + 'static,
    {
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = cancelled.clone();

        let handle = thread::Builder::new().name(name.into()).spawn(move || {
            let mut deadline = Instant::now();
            while !flag.load(Ordering::Acquire) {
                task();

                deadline += interval;
                let now = Instant::now();
                if deadline <= now {
                    let behind = now.duration_since(deadline);
                    let missed = behind.as_nanos() / interval.as_nanos().max(1);
                    deadline += interval * (missed as u32 + 1);
                }
                // Woken early by `cancel`
                thread::park_timeout(deadline.saturating_duration_since(Instant::now()));
            }
            log::debug!("timer thread exiting");
        })?;

        Ok(Self {
            cancelled,
            handle: Some(handle),
        })
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// The thread has exited, either cancelled or because a tick panicked
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Stop after the current tick. Never interrupts a running task.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
        if let Some(handle) = &self.handle {
            handle.thread().unpark();
        }
    }

    /// Cancel and wait for the thread to finish
    pub fn join(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        self.cancel();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("timer thread panicked");
            }
        }
    }
}

impl Drop for PollTimer {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_ticks_until_cancelled() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = count.clone();
        let timer = PollTimer::spawn("test-timer", Duration::from_millis(5), move || {
            counter.fetch_add(1, Ordering::Relaxed);
        })
        .expect("spawn timer");

        thread::sleep(Duration::from_millis(60));
        timer.join();

        let ticks = count.load(Ordering::Relaxed);
        assert!(ticks >= 2, "only {ticks} ticks");

        // Nothing runs after join
        thread::sleep(Duration::from_millis(20));
        assert_eq!(count.load(Ordering::Relaxed), ticks);
    }

    #[test]
    fn test_panicking_task_finishes_thread() {
        let timer = PollTimer::spawn("test-timer", Duration::from_millis(5), || panic!("tick failed"))
            .expect("spawn timer");
        let start = Instant::now();
        while !timer.is_finished() && start.elapsed() < Duration::from_secs(5) {
            thread::sleep(Duration::from_millis(5));
        }
        assert!(timer.is_finished());
        assert!(!timer.is_cancelled());
        timer.join();
    }

    #[test]
    fn test_cancel_wakes_long_interval() {
        let timer = PollTimer::spawn("test-timer", Duration::from_secs(60), || {}).expect("spawn timer");
        let start = Instant::now();
        timer.cancel();
        assert!(timer.is_cancelled());
        timer.join();
        assert!(start.elapsed() < Duration::from_secs(5));
    }
}
