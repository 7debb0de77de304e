//! Helper node bodies shared by the integration tests.

use conflux::node::{Consume, InPin, OutPin, Produce, Transform};
use conflux::packet::Packet;
use conflux::sync::Latch;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// Emits exactly `n` default-valued packets on every output, then parks
/// until the node leaves the started state.
pub struct ProduceN {
    remaining: AtomicUsize,
    total: usize,
    parked: Latch,
}

impl ProduceN {
    pub fn new(n: usize) -> Self {
        Self {
            remaining: AtomicUsize::new(n),
            total: n,
            parked: Latch::new(),
        }
    }

    pub fn reset(&self) {
        self.remaining.store(self.total, Ordering::Release);
    }
}

impl<T: Default + Send> Produce<T> for ProduceN {
    fn produce(&self, outputs: &[OutPin<T>]) {
        if self.remaining.load(Ordering::Acquire) > 0 {
            self.remaining.fetch_sub(1, Ordering::AcqRel);
            for output in outputs {
                let _ = output.push(Packet::new(T::default()));
            }
        } else {
            self.parked.wait();
        }
    }

    fn paused(&self) {
        self.parked.set();
    }

    fn stopped(&self) {
        self.parked.set();
    }
}

/// Forwards packets from input `i` to output `i`, counting per pin.
pub struct TransformationCounter {
    received: Vec<AtomicUsize>,
}

impl TransformationCounter {
    pub fn new(inouts: usize) -> Self {
        Self {
            received: (0..inouts).map(|_| AtomicUsize::new(0)).collect(),
        }
    }

    pub fn count(&self, i: usize) -> usize {
        self.received[i].load(Ordering::Acquire)
    }

    pub fn reset(&self) {
        for count in &self.received {
            count.store(0, Ordering::Release);
        }
    }
}

impl<T: Send> Transform<T, T> for TransformationCounter {
    fn ready(&self, index: usize, inputs: &[InPin<T>], outputs: &[OutPin<T>]) {
        if let Some(packet) = inputs[index].pop() {
            let _ = outputs[index].push(packet);
            self.received[index].fetch_add(1, Ordering::AcqRel);
        }
    }
}

/// Pops packets from each input, counting per pin.
pub struct ConsumptionCounter {
    received: Vec<AtomicUsize>,
}

impl ConsumptionCounter {
    pub fn new(ins: usize) -> Self {
        Self {
            received: (0..ins).map(|_| AtomicUsize::new(0)).collect(),
        }
    }

    pub fn count(&self, i: usize) -> usize {
        self.received[i].load(Ordering::Acquire)
    }

    pub fn reset(&self) {
        for count in &self.received {
            count.store(0, Ordering::Release);
        }
    }
}

impl<T: Send> Consume<T> for ConsumptionCounter {
    fn ready(&self, index: usize, inputs: &[InPin<T>]) {
        if inputs[index].pop().is_some() {
            self.received[index].fetch_add(1, Ordering::AcqRel);
        }
    }
}

/// Produces nothing on its own; the test pushes through the node's output
/// pin by hand. The loop parks until the node leaves the started state.
pub struct Pusher {
    parked: Latch,
}

impl Pusher {
    pub fn new() -> Self {
        Self {
            parked: Latch::new(),
        }
    }
}

impl<T: Send> Produce<T> for Pusher {
    fn produce(&self, _outputs: &[OutPin<T>]) {
        self.parked.wait();
    }

    fn paused(&self) {
        self.parked.set();
    }

    fn stopped(&self) {
        self.parked.set();
    }
}

/// Consumes nothing on its own; the test pops through the node's input pin
/// by hand.
pub struct Popper;

impl<T: Send> Consume<T> for Popper {
    fn ready(&self, _index: usize, _inputs: &[InPin<T>]) {}
}

/// Poll `pred` until it holds or `timeout` passes.
pub fn wait_until(timeout: Duration, mut pred: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if pred() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(1));
    }
    pred()
}
