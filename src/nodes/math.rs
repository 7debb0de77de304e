//! Node bodies performing arithmetic on their inputs.

use crate::node::{InPin, OutPin, Transform};
use crate::packet::Packet;
use std::ops::AddAssign;

/// A transformer body that sums one packet from every input.
///
/// An N-ary join: nothing happens until every input pin holds a packet.
/// Then one packet is popped from each, the payloads are accumulated with
/// `+=`, and the sum goes to output 0.
#[derive(Debug, Default)]
pub struct Adder;

impl Adder {
    /// Create an adder body. Pair it with a transformer that has as many
    /// inputs as there are terms and one output.
    pub fn new() -> Self {
        Self
    }
}

impl<T: AddAssign + Send> Transform<T, T> for Adder {
    fn ready(&self, _index: usize, inputs: &[InPin<T>], outputs: &[OutPin<T>]) {
        if !inputs.iter().all(InPin::peek) {
            return;
        }

        let mut terms = Vec::with_capacity(inputs.len());
        for input in inputs {
            match input.pop() {
                Some(packet) => terms.push(packet),
                None => return,
            }
        }

        let mut terms = terms.into_iter();
        let Some(first) = terms.next() else {
            return;
        };
        let mut sum = first.into_data();
        for term in terms {
            sum += term.into_data();
        }

        let _ = outputs[0].push(Packet::new(sum));
    }
}

/// A transformer body that adds a constant to every packet in place.
#[derive(Debug)]
pub struct ConstAdder<T> {
    addend: T,
}

impl<T> ConstAdder<T> {
    /// Create a body adding `addend` to each packet's payload.
    pub fn new(addend: T) -> Self {
        Self { addend }
    }
}

impl<T: AddAssign + Clone + Send + Sync> Transform<T, T> for ConstAdder<T> {
    fn ready(&self, index: usize, inputs: &[InPin<T>], outputs: &[OutPin<T>]) {
        while let Some(mut packet) = inputs[index].pop() {
            *packet.data_mut() += self.addend.clone();
            let _ = outputs[0].push(packet);
        }
    }
}
