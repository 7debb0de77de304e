//! The producer role: nodes with output pins only.

use crate::node::pin::OutPin;
use crate::node::{Node, Role};
use crate::sync::{State, TransitionSignal};
use std::any::Any;
use std::sync::{Arc, RwLock};

/// The body of a producing node.
///
/// `produce` is invoked repeatedly by the worker loop while the node is
/// started; its job is to push packets onto the output pins. A producer
/// driven by an external event (a timer, say) typically blocks inside
/// `produce` on its own wait and must release that wait from `stopped`
/// (and `paused` when prompt pausing matters) — see
/// [`Latch`](crate::sync::Latch).
///
/// The lifecycle hooks run on the graph's thread, concurrently with the
/// worker loop, so bodies use interior mutability for anything both sides
/// touch.
pub trait Produce<T>: Send + Sync {
    /// Produce packets, pushing them onto `outputs`.
    fn produce(&self, outputs: &[OutPin<T>]);

    /// The node has been started.
    fn started(&self) {}

    /// The node has been paused.
    fn paused(&self) {}

    /// The node has been stopped.
    fn stopped(&self) {}
}

/// A pure producing node: a body plus its output pins.
pub struct Producer<T, B: Produce<T>> {
    name: RwLock<String>,
    signal: Arc<TransitionSignal>,
    outputs: Vec<OutPin<T>>,
    body: B,
}

impl<T, B: Produce<T>> Producer<T, B> {
    /// Create a producer with `outs` output pins, named `{name}_out{i}`.
    pub fn new(name: impl Into<String>, outs: usize, body: B) -> Self {
        let name = name.into();
        let outputs = (0..outs)
            .map(|i| OutPin::new(format!("{name}_out{i}")))
            .collect();
        Self {
            name: RwLock::new(name),
            signal: Arc::new(TransitionSignal::new()),
            outputs,
            body,
        }
    }

    /// The node's body.
    pub fn body(&self) -> &B {
        &self.body
    }

    /// A reference to output pin `n`.
    ///
    /// # Panics
    ///
    /// Panics if `n` is out of range.
    pub fn output(&self, n: usize) -> &OutPin<T> {
        &self.outputs[n]
    }

    /// All output pins, in index order.
    pub fn outputs(&self) -> &[OutPin<T>] {
        &self.outputs
    }
}

/// The pure-producer execution loop, shared with nothing: wait out pauses
/// on the transition signal, call `produce` while started, exit on stop.
pub(crate) fn run_producer_loop<T, B: Produce<T>>(
    signal: &TransitionSignal,
    body: &B,
    outputs: &[OutPin<T>],
) {
    let mut s = signal.state();
    while s != State::Stopped {
        if s == State::Paused {
            s = signal.wait_while_paused();
        } else {
            s = signal.state();
        }

        if s == State::Started {
            body.produce(outputs);
        }
    }
}

impl<T: Send + 'static, B: Produce<T>> Node for Producer<T, B> {
    fn name(&self) -> String {
        self.name.read().unwrap().clone()
    }

    fn rename(&self, name: &str) -> String {
        for (i, pin) in self.outputs.iter().enumerate() {
            pin.rename(format!("{name}_out{i}"));
        }
        std::mem::replace(&mut *self.name.write().unwrap(), name.to_owned())
    }

    fn role(&self) -> Role {
        Role::Producer
    }

    fn signal(&self) -> &TransitionSignal {
        &self.signal
    }

    fn transition(&self, next: State) {
        self.signal.set(next);
        match next {
            State::Started => self.body.started(),
            State::Paused => self.body.paused(),
            State::Stopped => self.body.stopped(),
        }
    }

    fn sever(&self) {
        for pin in &self.outputs {
            pin.disconnect();
        }
    }

    fn run(&self) {
        run_producer_loop(&self.signal, &self.body, &self.outputs);
    }

    fn ins(&self) -> usize {
        0
    }

    fn outs(&self) -> usize {
        self.outputs.len()
    }

    fn inpin_any(&self, _index: usize) -> Option<&dyn Any> {
        None
    }

    fn outpin_any(&self, index: usize) -> Option<&dyn Any> {
        self.outputs.get(index).map(|pin| pin as &dyn Any)
    }
}

/// Typed access to a node's output pins, for compile-time-checked
/// connections.
pub trait ProducerNode<T>: Node {
    /// All output pins, in index order.
    fn outpins(&self) -> &[OutPin<T>];
}

impl<T: Send + 'static, B: Produce<T>> ProducerNode<T> for Producer<T, B> {
    fn outpins(&self) -> &[OutPin<T>] {
        &self.outputs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::Packet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountedProduce {
        calls: AtomicUsize,
        limit: usize,
        parked: crate::sync::Latch,
    }

    impl Produce<u32> for CountedProduce {
        fn produce(&self, outputs: &[OutPin<u32>]) {
            let calls = self.calls.fetch_add(1, Ordering::Relaxed);
            if calls < self.limit {
                let _ = outputs[0].push(Packet::new(calls as u32));
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

    fn counted(limit: usize) -> Producer<u32, CountedProduce> {
        Producer::new(
            "counted",
            1,
            CountedProduce {
                calls: AtomicUsize::new(0),
                limit,
                parked: crate::sync::Latch::new(),
            },
        )
    }

    #[test]
    fn test_pins_are_autonamed() {
        let producer = counted(0);
        assert_eq!(producer.output(0).name(), "counted_out0");
        assert_eq!(producer.outs(), 1);
        assert_eq!(producer.ins(), 0);
        assert_eq!(producer.role(), Role::Producer);
    }

    #[test]
    fn test_rename_cascades_to_pins() {
        let producer = counted(0);
        let previous = producer.rename("renamed");
        assert_eq!(previous, "counted");
        assert_eq!(Node::name(&producer), "renamed");
        assert_eq!(producer.output(0).name(), "renamed_out0");
    }

    #[test]
    fn test_loop_produces_while_started_and_exits_on_stop() {
        let producer = Arc::new(counted(3));
        let sink = crate::node::InPin::<u32>::new(
            "sink_in0".into(),
            Arc::new(TransitionSignal::new()),
        );
        producer.output(0).connect(&sink, 0, 0);

        let worker = {
            let producer = Arc::clone(&producer);
            std::thread::spawn(move || producer.run())
        };

        producer.transition(State::Started);
        while producer.body().calls.load(Ordering::Relaxed) <= 3 {
            std::thread::yield_now();
        }
        producer.transition(State::Stopped);
        worker.join().unwrap();

        for expected in 0..3 {
            assert_eq!(sink.pop().unwrap().into_data(), expected);
        }
        assert!(sink.pop().is_none());
    }

    #[test]
    fn test_sever_disconnects_outputs() {
        let producer = counted(0);
        let sink = crate::node::InPin::<u32>::new(
            "sink_in0".into(),
            Arc::new(TransitionSignal::new()),
        );
        producer.output(0).connect(&sink, 0, 0);
        assert!(producer.output(0).is_connected());

        producer.sever();
        assert!(!producer.output(0).is_connected());
    }
}
