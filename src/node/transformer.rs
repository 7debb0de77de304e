//! The transformer role: nodes that consume one element type and produce
//! another (or the same).

use crate::node::consumer::{run_consumer_loop, ConsumerNode};
use crate::node::pin::{InPin, OutPin};
use crate::node::producer::ProducerNode;
use crate::node::{Node, Role};
use crate::sync::{State, TransitionSignal};
use std::any::Any;
use std::sync::{Arc, RwLock};

/// The body of a transforming node.
///
/// Same contract as [`Consume`](crate::node::Consume), with the node's
/// output pins available for pushing results. The consuming element type
/// `C` and producing element type `P` may differ.
pub trait Transform<C, P>: Send + Sync {
    /// A packet is waiting on `inputs[index]`.
    fn ready(&self, index: usize, inputs: &[InPin<C>], outputs: &[OutPin<P>]);

    /// The node has been started.
    fn started(&self) {}

    /// The node has been paused.
    fn paused(&self) {}

    /// The node has been stopped.
    fn stopped(&self) {}
}

/// A transforming node: a body, input pins of type `C`, output pins of
/// type `P`.
///
/// Runs the consumer execution loop; the producing side exists purely to
/// own the output pins.
pub struct Transformer<C, P, B: Transform<C, P>> {
    name: RwLock<String>,
    signal: Arc<TransitionSignal>,
    inputs: Vec<InPin<C>>,
    outputs: Vec<OutPin<P>>,
    body: B,
}

impl<C, P, B: Transform<C, P>> Transformer<C, P, B> {
    /// Create a transformer with `ins` input pins and `outs` output pins,
    /// named `{name}_in{i}` and `{name}_out{i}`.
    pub fn new(name: impl Into<String>, ins: usize, outs: usize, body: B) -> Self {
        let name = name.into();
        let signal = Arc::new(TransitionSignal::new());
        let inputs = (0..ins)
            .map(|i| InPin::new(format!("{name}_in{i}"), Arc::clone(&signal)))
            .collect();
        let outputs = (0..outs)
            .map(|i| OutPin::new(format!("{name}_out{i}")))
            .collect();
        Self {
            name: RwLock::new(name),
            signal,
            inputs,
            outputs,
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
    pub fn input(&self, n: usize) -> &InPin<C> {
        &self.inputs[n]
    }

    /// A reference to output pin `n`.
    ///
    /// # Panics
    ///
    /// Panics if `n` is out of range.
    pub fn output(&self, n: usize) -> &OutPin<P> {
        &self.outputs[n]
    }

    /// All input pins, in index order.
    pub fn inputs(&self) -> &[InPin<C>] {
        &self.inputs
    }

    /// All output pins, in index order.
    pub fn outputs(&self) -> &[OutPin<P>] {
        &self.outputs
    }
}

impl<C, P, B> Node for Transformer<C, P, B>
where
    C: Send + 'static,
    P: Send + 'static,
    B: Transform<C, P>,
{
    fn name(&self) -> String {
        self.name.read().unwrap().clone()
    }

    fn rename(&self, name: &str) -> String {
        for (i, pin) in self.outputs.iter().enumerate() {
            pin.rename(format!("{name}_out{i}"));
        }
        for (i, pin) in self.inputs.iter().enumerate() {
            pin.rename(format!("{name}_in{i}"));
        }
        std::mem::replace(&mut *self.name.write().unwrap(), name.to_owned())
    }

    fn role(&self) -> Role {
        Role::Transformer
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
        for pin in &self.outputs {
            pin.disconnect();
        }
    }

    fn run(&self) {
        run_consumer_loop(&self.signal, &self.inputs, |i| {
            self.body.ready(i, &self.inputs, &self.outputs);
        });
    }

    fn ins(&self) -> usize {
        self.inputs.len()
    }

    fn outs(&self) -> usize {
        self.outputs.len()
    }

    fn inpin_any(&self, index: usize) -> Option<&dyn Any> {
        self.inputs.get(index).map(|pin| pin as &dyn Any)
    }

    fn outpin_any(&self, index: usize) -> Option<&dyn Any> {
        self.outputs.get(index).map(|pin| pin as &dyn Any)
    }
}

impl<C, P, B> ProducerNode<P> for Transformer<C, P, B>
where
    C: Send + 'static,
    P: Send + 'static,
    B: Transform<C, P>,
{
    fn outpins(&self) -> &[OutPin<P>] {
        &self.outputs
    }
}

impl<C, P, B> ConsumerNode<C> for Transformer<C, P, B>
where
    C: Send + 'static,
    P: Send + 'static,
    B: Transform<C, P>,
{
    fn inpins(&self) -> &[InPin<C>] {
        &self.inputs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::Packet;
    use std::time::{Duration, Instant};

    /// Parses the decimal payload and forwards its length. Exercises C≠P.
    struct Stringify;

    impl Transform<u32, String> for Stringify {
        fn ready(&self, index: usize, inputs: &[InPin<u32>], outputs: &[OutPin<String>]) {
            while let Some(packet) = inputs[index].pop() {
                let _ = outputs[0].push(Packet::new(packet.into_data().to_string()));
            }
        }
    }

    #[test]
    fn test_pins_are_autonamed() {
        let transformer = Transformer::<u32, String, _>::new("fmt", 2, 1, Stringify);
        assert_eq!(transformer.input(0).name(), "fmt_in0");
        assert_eq!(transformer.input(1).name(), "fmt_in1");
        assert_eq!(transformer.output(0).name(), "fmt_out0");
        assert_eq!(transformer.role(), Role::Transformer);
    }

    #[test]
    fn test_rename_cascades_to_both_pin_sets() {
        let transformer = Transformer::<u32, String, _>::new("fmt", 1, 1, Stringify);
        transformer.rename("fmt2");
        assert_eq!(transformer.input(0).name(), "fmt2_in0");
        assert_eq!(transformer.output(0).name(), "fmt2_out0");
    }

    #[test]
    fn test_worker_transforms_across_types() {
        let transformer = Arc::new(Transformer::<u32, String, _>::new("fmt", 1, 1, Stringify));
        let feeder = OutPin::<u32>::new("feeder_out0".into());
        feeder.connect(transformer.input(0), 0, 0);
        let sink = InPin::<String>::new("sink_in0".into(), Arc::new(TransitionSignal::new()));
        transformer.output(0).connect(&sink, 0, 0);

        let worker = {
            let transformer = Arc::clone(&transformer);
            std::thread::spawn(move || transformer.run())
        };
        transformer.transition(State::Started);

        feeder.push(Packet::new(42)).unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        while !sink.peek() && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(1));
        }
        assert_eq!(sink.pop().unwrap().into_data(), "42");

        transformer.transition(State::Stopped);
        worker.join().unwrap();
    }

    #[test]
    fn test_sever_disconnects_inputs_then_outputs() {
        let transformer = Transformer::<u32, String, _>::new("fmt", 1, 1, Stringify);
        let feeder = OutPin::<u32>::new("feeder_out0".into());
        feeder.connect(transformer.input(0), 0, 0);
        let sink = InPin::<String>::new("sink_in0".into(), Arc::new(TransitionSignal::new()));
        transformer.output(0).connect(&sink, 0, 0);

        transformer.sever();
        assert!(!transformer.input(0).is_connected());
        assert!(!transformer.output(0).is_connected());
        // The severed pipes stay with the far ends.
        assert!(feeder.is_connected());
        assert!(sink.is_connected());
    }
}
