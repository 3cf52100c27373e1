//! A thread which invokes a callback at a fixed rate.

use std::{
    io,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
    thread::JoinHandle,
    time::{Duration, Instant},
};

/// The longest the timer thread sleeps before re-checking its sentinel, so
/// that `stop()` never waits a full interval.
const MAX_SLEEP: Duration = Duration::from_millis(5);

pub struct TimerThread {
    cb: Arc<Mutex<dyn FnMut() + Send + 'static>>,
    thread: Option<JoinHandle<()>>,
    name: String,

    interval: Duration,
    sentinel: Arc<AtomicBool>,
}

impl TimerThread {
    pub fn new<F: FnMut() + Send + 'static>(name: &str, cb: F) -> Self {
        Self {
            cb: Arc::new(Mutex::new(cb)),
            thread: None,
            name: name.to_owned(),

            interval: Duration::ZERO,
            sentinel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Starts calling the callback every `interval`. Does nothing if the
    /// timer is already running.
    ///
    /// # Errors
    ///
    /// Returns an error if the thread could not be spawned.
    pub fn start(&mut self, interval: Duration) -> io::Result<()> {
        if self.thread.is_some() {
            return Ok(());
        }

        self.interval = interval;
        self.sentinel.store(true, Ordering::Release);

        let sentinel = Arc::clone(&self.sentinel);
        let cb = Arc::clone(&self.cb);

        let thread = std::thread::Builder::new()
            .name(self.name.clone())
            .spawn(move || {
                let mut next_tick = Instant::now() + interval;

                while sentinel.load(Ordering::Acquire) {
                    let now = Instant::now();

                    if now >= next_tick {
                        if let Ok(mut guard) = cb.lock() {
                            (*guard)();
                        }

                        next_tick += interval;
                        // if the callback overran, don't try to catch up
                        if next_tick < now {
                            next_tick = now + interval;
                        }

                        continue;
                    }

                    std::thread::sleep((next_tick - now).min(MAX_SLEEP));
                }
            })?;

        self.thread = Some(thread);
        Ok(())
    }

    /// # Errors
    ///
    /// Returns an error if the thread could not be spawned.
    ///
    /// # Panics
    ///
    /// Panics if `rate_hz` is not positive.
    pub fn start_hz(&mut self, rate_hz: f64) -> io::Result<()> {
        assert!(rate_hz > 0.0);
        self.start(Duration::from_secs_f64(rate_hz.recip()))
    }

    /// Stops the timer and joins its thread.
    pub fn stop(&mut self) {
        if let Some(thread) = self.thread.take() {
            self.sentinel.store(false, Ordering::Release);

            if thread.join().is_err() {
                log::error!("timer thread \"{}\" panicked", self.name);
            }
        }
    }

    pub const fn is_running(&self) -> bool {
        self.thread.is_some()
    }

    pub const fn interval(&self) -> Duration {
        self.interval
    }
}

impl Drop for TimerThread {
    fn drop(&mut self) {
        self.stop();
    }
}
