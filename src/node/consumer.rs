//! The consumer role: nodes with input pins only.

use crate::node::pin::InPin;
use crate::node::{Node, Role};
use crate::sync::{State, TransitionSignal};
use std::any::Any;
use std::sync::{Arc, RwLock};

/// The body of a consuming node.
///
/// `ready(index)` is dispatched by the worker loop for each input pin that
/// holds a packet; the body pops from `inputs[index]` to drain it. A body
/// needing N-ary synchronization (acting only when every input has a
/// packet) checks `peek` across all inputs inside `ready` and defers until
/// the set is complete — that policy belongs to the concrete node, not the
/// loop.
///
/// The lifecycle hooks run on the graph's thread, concurrently with the
/// worker loop. A body that blocks inside `ready` (waiting out a packet's
/// consumption time, say) must release its own wait from `stopped`.
pub trait Consume<T>: Send + Sync {
    /// A packet is waiting on `inputs[index]`.
    fn ready(&self, index: usize, inputs: &[InPin<T>]);

    /// The node has been started.
    fn started(&self) {}

    /// The node has been paused.
    fn paused(&self) {}

    /// The node has been stopped.
    fn stopped(&self) {}
}

/// A pure consuming node: a body plus its input pins.
pub struct Consumer<T, B: Consume<T>> {
    name: RwLock<String>,
    signal: Arc<TransitionSignal>,
    inputs: Vec<InPin<T>>,
    body: B,
}

impl<T, B: Consume<T>> Consumer<T, B> {
    /// Create a consumer with `ins` input pins, named `{name}_in{i}`.
    pub fn new(name: impl Into<String>, ins: usize, body: B) -> Self {
        let name = name.into();
        let signal = Arc::new(TransitionSignal::new());
        let inputs = (0..ins)
            .map(|i| InPin::new(format!("{name}_in{i}"), Arc::clone(&signal)))
            .collect();
        Self {
            name: RwLock::new(name),
            signal,
            inputs,
            body,
        }
    }

    /// The node's body.
    pub fn body(&self) -> &B {
        &self.body
    }

    /// A reference to input pin `n`.
    ///
    /// # Panics
    ///
    /// Panics if `n` is out of range.
    pub fn input(&self, n: usize) -> &InPin<T> {
        &self.inputs[n]
    }

    /// All input pins, in index order.
    pub fn inputs(&self) -> &[InPin<T>] {
        &self.inputs
    }
}

/// The consuming execution loop: suspend while paused, suspend while
/// started until a packet arrives, dispatch `ready` per holding pin, exit
/// on stop. Shared with the transformer role.
pub(crate) fn run_consumer_loop<T>(
    signal: &TransitionSignal,
    inputs: &[InPin<T>],
    mut ready: impl FnMut(usize),
) {
    let mut s = signal.state();
    while s != State::Stopped {
        let mut packet_waiting = false;

        if s == State::Paused {
            s = signal.wait_while_paused();
        } else if s == State::Started {
            let (next, waiting) = signal.wait_ready(|| inputs.iter().any(InPin::peek));
            s = next;
            packet_waiting = waiting;
        }

        if packet_waiting {
            for (i, input) in inputs.iter().enumerate() {
                if input.peek() {
                    ready(i);
                }
            }
        }
    }
}

impl<T: Send + 'static, B: Consume<T>> Node for Consumer<T, B> {
    fn name(&self) -> String {
        self.name.read().unwrap().clone()
    }

    fn rename(&self, name: &str) -> String {
        for (i, pin) in self.inputs.iter().enumerate() {
            pin.rename(format!("{name}_in{i}"));
        }
        std::mem::replace(&mut *self.name.write().unwrap(), name.to_owned())
    }

    fn role(&self) -> Role {
        Role::Consumer
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
        for pin in &self.inputs {
            pin.disconnect();
        }
    }

    fn run(&self) {
        run_consumer_loop(&self.signal, &self.inputs, |i| {
            self.body.ready(i, &self.inputs);
        });
    }

    fn ins(&self) -> usize {
        self.inputs.len()
    }

    fn outs(&self) -> usize {
        0
    }

    fn inpin_any(&self, index: usize) -> Option<&dyn Any> {
        self.inputs.get(index).map(|pin| pin as &dyn Any)
    }

    fn outpin_any(&self, _index: usize) -> Option<&dyn Any> {
        None
    }
}

/// Typed access to a node's input pins, for compile-time-checked
/// connections.
pub trait ConsumerNode<T>: Node {
    /// All input pins, in index order.
    fn inpins(&self) -> &[InPin<T>];
}

impl<T: Send + 'static, B: Consume<T>> ConsumerNode<T> for Consumer<T, B> {
    fn inpins(&self) -> &[InPin<T>] {
        &self.inputs
    }
}
