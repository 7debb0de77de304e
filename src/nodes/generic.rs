//! General-purpose node bodies: timed generation, stream output, fan-out,
//! and consumption-time shifting.

use crate::node::{Consume, InPin, OutPin, Produce, Transform};
use crate::packet::Packet;
use crate::sync::Latch;
use crate::timer::MonotonousTimer;
use std::fmt::Display;
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::debug;

/// A producer body that emits one generated packet per timer tick.
///
/// Registers itself as a timer listener at construction; each tick releases
/// one `produce` call, which pushes `gen_fn()` onto output 0.
///
/// Stopping the node releases a pending wait promptly, but a tick that
/// races the stop is not ordered against it: the generator may emit one
/// final packet after being stopped, before its worker exits.
pub struct Generator<T> {
    gen_fn: Box<dyn Fn() -> T + Send + Sync>,
    awake: Arc<Latch>,
    stopping: AtomicBool,
}

impl<T> Generator<T> {
    /// Create a generator driven by `timer`, producing `gen_fn()` packets.
    pub fn new(timer: &MonotonousTimer, gen_fn: impl Fn() -> T + Send + Sync + 'static) -> Self {
        let awake = Arc::new(Latch::new());
        let tick = Arc::clone(&awake);
        timer.listen(move || tick.set());
        Self {
            gen_fn: Box::new(gen_fn),
            awake,
            stopping: AtomicBool::new(false),
        }
    }
}

impl<T: Send> Produce<T> for Generator<T> {
    fn produce(&self, outputs: &[OutPin<T>]) {
        self.awake.wait();

        if !self.stopping.load(Ordering::Acquire) {
            let _ = outputs[0].push(Packet::new((self.gen_fn)()));
        }
    }

    fn started(&self) {
        self.stopping.store(false, Ordering::Release);
    }

    fn stopped(&self) {
        self.stopping.store(true, Ordering::Release);
        self.awake.set();
    }
}

/// A consumer body that writes packet payloads to a writer, one per line.
///
/// Honors consumption time:
/// - unset: the payload is written immediately;
/// - in the future: the body sleeps until then, releasing early (and
///   dropping the packet) if the node is stopped in the meantime;
/// - in the past: the packet arrived too late and is discarded.
pub struct Ostreamer<W: Write + Send> {
    out: Mutex<W>,
    awake: Latch,
    stopping: AtomicBool,
}

impl<W: Write + Send> Ostreamer<W> {
    /// Create an ostreamer writing to `out`.
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
            awake: Latch::new(),
            stopping: AtomicBool::new(false),
        }
    }

    /// Locked access to the writer.
    pub fn writer(&self) -> std::sync::MutexGuard<'_, W> {
        self.out.lock().unwrap()
    }
}

impl<T, W> Consume<T> for Ostreamer<W>
where
    T: Display + Send,
    W: Write + Send,
{
    fn ready(&self, index: usize, inputs: &[InPin<T>]) {
        while let Some(packet) = inputs[index].pop() {
            if self.stopping.load(Ordering::Acquire) {
                return;
            }

            match packet.consumption_time() {
                None => {
                    let _ = writeln!(self.writer(), "{}", packet.data());
                }
                Some(due) if due <= Instant::now() => {
                    debug!("discarding packet past its consumption time");
                }
                Some(due) => {
                    if self.awake.wait_deadline(due) {
                        // Released early: the node was stopped.
                        return;
                    }
                    let _ = writeln!(self.writer(), "{}", packet.data());
                }
            }
        }
    }

    fn started(&self) {
        self.stopping.store(false, Ordering::Release);
    }

    fn stopped(&self) {
        self.stopping.store(true, Ordering::Release);
        self.awake.set();
    }
}

/// A transformer body that clones each input packet to every output.
///
/// The original packet moves to output 0; outputs 1..n receive clones. A
/// clone that fails to push (capped pipe, disconnected pin) is dropped, and
/// the move to output 0 proceeds regardless; partially-failed fan-out is
/// not recovered.
#[derive(Debug, Default)]
pub struct Tee;

impl Tee {
    /// Create a tee body. Pair it with a transformer that has one input
    /// and as many outputs as clones are wanted.
    pub fn new() -> Self {
        Self
    }
}

impl<T: Clone + Send> Transform<T, T> for Tee {
    fn ready(&self, index: usize, inputs: &[InPin<T>], outputs: &[OutPin<T>]) {
        while let Some(packet) = inputs[index].pop() {
            for output in &outputs[1..] {
                let _ = output.push(packet.clone());
            }
            let _ = outputs[0].push(packet);
        }
    }
}

/// A transformer body that shifts each packet's consumption time by a
/// fixed offset.
///
/// A packet with no consumption time gets now-plus-offset: the delay counts
/// from the moment this node received it.
#[derive(Debug)]
pub struct Delay {
    offset: Duration,
}

impl Delay {
    /// Create a delay body adding `offset` to each packet's consumption
    /// time.
    pub fn new(offset: Duration) -> Self {
        Self { offset }
    }
}

impl<T: Send> Transform<T, T> for Delay {
    fn ready(&self, index: usize, inputs: &[InPin<T>], outputs: &[OutPin<T>]) {
        while let Some(mut packet) = inputs[index].pop() {
            let due = match packet.consumption_time() {
                Some(at) => at + self.offset,
                None => Instant::now() + self.offset,
            };
            packet.set_consumption_time(due);
            let _ = outputs[0].push(packet);
        }
    }
}
