//! An interval timer for driving generator-style producers.
//!
//! The engine itself never blocks on time; timers are external drivers
//! that deliver callbacks from their own thread. Anything exposing
//! [`listen`](MonotonousTimer::listen) can drive a
//! [`Generator`](crate::nodes::Generator).

use std::sync::{Condvar, Mutex};
use std::time::Duration;

type Listener = Box<dyn Fn() + Send + Sync>;

/// A timer that notifies its listeners repeatedly at a fixed interval.
///
/// [`run`](MonotonousTimer::run) is the timer's execution loop, meant to be
/// spawned on its own thread; [`stop`](MonotonousTimer::stop) makes it
/// return promptly, without waiting out the current interval.
pub struct MonotonousTimer {
    listeners: Mutex<Vec<Listener>>,
    interval: Duration,
    stop: Mutex<bool>,
    stopped: Condvar,
}

impl MonotonousTimer {
    /// Create a timer that fires every `interval`.
    pub fn new(interval: Duration) -> Self {
        Self {
            listeners: Mutex::new(Vec::new()),
            interval,
            stop: Mutex::new(false),
            stopped: Condvar::new(),
        }
    }

    /// Register a listener to be called on every tick.
    pub fn listen(&self, listener: impl Fn() + Send + Sync + 'static) {
        self.listeners.lock().unwrap().push(Box::new(listener));
    }

    /// True once the timer has been stopped.
    pub fn is_stopped(&self) -> bool {
        *self.stop.lock().unwrap()
    }

    /// Stop the timer, releasing a `run` in mid-interval.
    pub fn stop(&self) {
        let mut stop = self.stop.lock().unwrap();
        *stop = true;
        self.stopped.notify_all();
    }

    /// Notify every listener once.
    pub fn tick(&self) {
        for listener in self.listeners.lock().unwrap().iter() {
            listener();
        }
    }

    /// The timer's execution loop: tick, wait out the interval, repeat
    /// until stopped.
    pub fn run(&self) {
        loop {
            if self.is_stopped() {
                return;
            }

            self.tick();

            let stop = self.stop.lock().unwrap();
            let (stop, _) = self
                .stopped
                .wait_timeout_while(stop, self.interval, |stopped| !*stopped)
                .unwrap();
            if *stop {
                return;
            }
        }
    }
}
