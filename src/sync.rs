//! Shared concurrency primitives: the node state machine signal and a
//! resettable latch for bodies that block outside the execution loops.

use std::sync::{Condvar, Mutex};
use std::time::Instant;

/// The lifecycle state of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum State {
    /// The node's worker is executing its role loop.
    Started,
    /// The node's worker is suspended. This is the initial state.
    #[default]
    Paused,
    /// The node's worker has exited or will exit on its next observation.
    /// Terminal and sticky for the worker.
    Stopped,
}

/// A node's transition signal: the current [`State`] behind a mutex, paired
/// with the condition variable the worker suspends on.
///
/// The same condition variable serves two wake-up sources: lifecycle
/// transitions issued by the graph, and packet-arrival notifications from
/// the producing side of a connected pipe.
#[derive(Debug, Default)]
pub struct TransitionSignal {
    state: Mutex<State>,
    transition: Condvar,
}

impl TransitionSignal {
    /// Create a signal in the initial `Paused` state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot the current state.
    pub fn state(&self) -> State {
        *self.state.lock().unwrap()
    }

    /// Set a new state and wake one waiter.
    pub(crate) fn set(&self, next: State) {
        let mut state = self.state.lock().unwrap();
        *state = next;
        self.transition.notify_one();
    }

    /// Wake one waiter without changing state.
    ///
    /// Called when a packet has been queued on a pipe feeding this node.
    /// The lock is taken so a waiter between its predicate check and its
    /// wait cannot miss the notification.
    pub fn notify(&self) {
        let _state = self.state.lock().unwrap();
        self.transition.notify_one();
    }

    /// Block until the state is no longer `Paused`, returning the new state.
    pub(crate) fn wait_while_paused(&self) -> State {
        let mut state = self.state.lock().unwrap();
        while *state == State::Paused {
            state = self.transition.wait(state).unwrap();
        }
        *state
    }

    /// Block while the state is `Started` and `has_packet` is false.
    ///
    /// Returns the observed state and whether a packet is waiting. The
    /// predicate is evaluated under the signal's mutex, so a push that
    /// notifies after queueing cannot be lost.
    pub(crate) fn wait_ready(&self, mut has_packet: impl FnMut() -> bool) -> (State, bool) {
        let mut state = self.state.lock().unwrap();
        loop {
            if *state != State::Started {
                return (*state, false);
            }
            if has_packet() {
                return (*state, true);
            }
            state = self.transition.wait(state).unwrap();
        }
    }
}

/// A resettable event for node bodies that block outside the base loops.
///
/// A generator waiting on a timer tick, or a consumer sleeping until a
/// packet's consumption time, parks on a latch; lifecycle hooks release the
/// wait by setting it. A set latch stays set until a wait consumes it, so a
/// release that races the wait is never lost.
#[derive(Debug, Default)]
pub struct Latch {
    flag: Mutex<bool>,
    cond: Condvar,
}

impl Latch {
    /// Create an unset latch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the latch, releasing all current and future waits.
    pub fn set(&self) {
        let mut flag = self.flag.lock().unwrap();
        *flag = true;
        self.cond.notify_all();
    }

    /// Block until the latch is set, then reset it.
    pub fn wait(&self) {
        let mut flag = self.flag.lock().unwrap();
        while !*flag {
            flag = self.cond.wait(flag).unwrap();
        }
        *flag = false;
    }

    /// Block until the latch is set or the deadline passes.
    ///
    /// Returns `true` if the latch was set (and has been reset), `false` on
    /// timeout.
    pub fn wait_deadline(&self, deadline: Instant) -> bool {
        let mut flag = self.flag.lock().unwrap();
        loop {
            if *flag {
                *flag = false;
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            let (guard, _timed_out) = self.cond.wait_timeout(flag, deadline - now).unwrap();
            flag = guard;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_initial_state_is_paused() {
        let signal = TransitionSignal::new();
        assert_eq!(signal.state(), State::Paused);
    }

    #[test]
    fn test_set_updates_state() {
        let signal = TransitionSignal::new();
        signal.set(State::Started);
        assert_eq!(signal.state(), State::Started);
        signal.set(State::Stopped);
        assert_eq!(signal.state(), State::Stopped);
    }

    #[test]
    fn test_wait_while_paused_releases_on_transition() {
        let signal = Arc::new(TransitionSignal::new());
        let waiter = {
            let signal = Arc::clone(&signal);
            thread::spawn(move || signal.wait_while_paused())
        };

        thread::sleep(Duration::from_millis(20));
        signal.set(State::Started);
        assert_eq!(waiter.join().unwrap(), State::Started);
    }

    #[test]
    fn test_wait_ready_returns_on_notify_with_packet() {
        let signal = Arc::new(TransitionSignal::new());
        signal.set(State::Started);

        let flag = Arc::new(Mutex::new(false));
        let waiter = {
            let signal = Arc::clone(&signal);
            let flag = Arc::clone(&flag);
            thread::spawn(move || signal.wait_ready(|| *flag.lock().unwrap()))
        };

        thread::sleep(Duration::from_millis(20));
        *flag.lock().unwrap() = true;
        signal.notify();
        assert_eq!(waiter.join().unwrap(), (State::Started, true));
    }

    #[test]
    fn test_wait_ready_returns_on_stop_without_packet() {
        let signal = Arc::new(TransitionSignal::new());
        signal.set(State::Started);

        let waiter = {
            let signal = Arc::clone(&signal);
            thread::spawn(move || signal.wait_ready(|| false))
        };

        thread::sleep(Duration::from_millis(20));
        signal.set(State::Stopped);
        assert_eq!(waiter.join().unwrap(), (State::Stopped, false));
    }

    #[test]
    fn test_latch_set_before_wait_is_not_lost() {
        let latch = Latch::new();
        latch.set();
        latch.wait();
    }

    #[test]
    fn test_latch_releases_waiter() {
        let latch = Arc::new(Latch::new());
        let waiter = {
            let latch = Arc::clone(&latch);
            thread::spawn(move || latch.wait())
        };

        thread::sleep(Duration::from_millis(20));
        latch.set();
        waiter.join().unwrap();
    }

    #[test]
    fn test_latch_deadline_times_out() {
        let latch = Latch::new();
        let deadline = Instant::now() + Duration::from_millis(20);
        assert!(!latch.wait_deadline(deadline));
        assert!(Instant::now() >= deadline);
    }

    #[test]
    fn test_latch_deadline_consumes_set() {
        let latch = Latch::new();
        latch.set();
        assert!(latch.wait_deadline(Instant::now() + Duration::from_secs(1)));
        // The set was consumed; the next deadline wait times out.
        assert!(!latch.wait_deadline(Instant::now() + Duration::from_millis(10)));
    }
}
