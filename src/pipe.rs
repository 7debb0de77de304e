//! The pipe: a bounded FIFO carrying packets between two pins.

use crate::error::PushError;
use crate::packet::Packet;
use crate::sync::TransitionSignal;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, Weak};

/// Shared-ownership handle to a pipe. Both connected pins hold one; the
/// pipe lives as long as either side does.
pub(crate) type SharedPipe<T> = Arc<Mutex<Pipe<T>>>;

/// A pin's pipe holder. Shared behind an `Arc` so that a pipe can refer
/// back to the producer pin's slot (weakly) and detach it when another
/// output pin adopts the pipe.
pub(crate) type PinSlot<T> = Mutex<Option<SharedPipe<T>>>;

/// The producer-side endpoint record of a pipe.
///
/// Holds only the pin's display name and a weak reference to its slot;
/// a pipe never owns its pins.
pub(crate) struct InputEnd<T> {
    pub(crate) name: String,
    pub(crate) slot: Weak<PinSlot<T>>,
}

/// The consumer-side endpoint record of a pipe.
///
/// Carries the consuming node's transition signal so a successful push can
/// wake that node. The signal is a leaf object, so holding it strongly
/// creates no ownership cycle.
pub(crate) struct OutputEnd {
    pub(crate) name: String,
    pub(crate) signal: Arc<TransitionSignal>,
}

/// A bounded FIFO of packets flowing from one output pin to one input pin.
///
/// Packets accumulate in a pipe when the consuming end does not keep up.
/// If accumulation is expected but memory is a concern, the pipe can be
/// capped by length (packet count) and weight (total bytes); a push that
/// would exceed a cap fails and hands the packet back. A graph that
/// produces more than it consumes is unbalanced and should be modified.
///
/// A pipe is always created with both endpoints attached. Disconnection
/// may null either endpoint, but the pipe itself persists while at least
/// one pin still holds it, so queued packets survive live topology edits.
///
/// All access goes through the pipe's mutex; the methods here run with
/// that lock held by the owning pin.
pub struct Pipe<T> {
    name: String,
    packets: VecDeque<Packet<T>>,
    weight: usize,
    max_length: usize,
    max_weight: usize,
    input: Option<InputEnd<T>>,
    output: Option<OutputEnd>,
}

impl<T> Pipe<T> {
    /// Create a pipe with both endpoints attached.
    pub(crate) fn new(
        name: String,
        input: InputEnd<T>,
        output: OutputEnd,
        max_length: usize,
        max_weight: usize,
    ) -> Self {
        Self {
            name,
            packets: VecDeque::new(),
            weight: 0,
            max_length,
            max_weight,
            input: Some(input),
            output: Some(output),
        }
    }

    /// The pipe's display name, typically `{output_pin}_to_{input_pin}`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Replace the display name, returning the previous one.
    pub(crate) fn rename(&mut self, name: String) -> String {
        std::mem::replace(&mut self.name, name)
    }

    /// The number of packets currently queued.
    pub fn length(&self) -> usize {
        self.packets.len()
    }

    /// The maximum number of packets this pipe will carry. 0 = uncapped.
    pub fn max_length(&self) -> usize {
        self.max_length
    }

    /// The sum of the sizes of all queued packets, in bytes.
    pub fn weight(&self) -> usize {
        self.weight
    }

    /// The maximum number of bytes this pipe will carry. 0 = uncapped.
    pub fn max_weight(&self) -> usize {
        self.max_weight
    }

    /// Replace the length cap, returning the previous one.
    ///
    /// Lowering the cap below the current length does not drop queued
    /// packets; it only refuses further pushes.
    pub fn cap_length(&mut self, max_length: usize) -> usize {
        std::mem::replace(&mut self.max_length, max_length)
    }

    /// Replace the weight cap, returning the previous one.
    ///
    /// Lowering the cap below the current weight does not drop queued
    /// packets; it only refuses further pushes.
    pub fn cap_weight(&mut self, max_weight: usize) -> usize {
        std::mem::replace(&mut self.max_weight, max_weight)
    }

    /// Discard all queued packets, returning how many there were.
    pub fn flush(&mut self) -> usize {
        let count = self.packets.len();
        self.packets.clear();
        self.weight = 0;
        count
    }

    /// Queue a packet.
    ///
    /// Fails without queueing when a cap would be exceeded; the packet is
    /// handed back inside the error.
    pub fn push(&mut self, packet: Packet<T>) -> Result<(), PushError<T>> {
        if self.max_length != 0 && self.packets.len() == self.max_length {
            return Err(PushError::Full(packet));
        }
        if self.max_weight != 0 && self.weight + Packet::<T>::size() > self.max_weight {
            return Err(PushError::Full(packet));
        }

        self.weight += Packet::<T>::size();
        self.packets.push_back(packet);
        Ok(())
    }

    /// Extract the next packet, FIFO order. `None` when empty.
    pub fn pop(&mut self) -> Option<Packet<T>> {
        let packet = self.packets.pop_front()?;
        self.weight -= Packet::<T>::size();
        Some(packet)
    }

    /// The name of the producing pin currently attached, if any.
    pub fn input_name(&self) -> Option<&str> {
        self.input.as_ref().map(|end| end.name.as_str())
    }

    /// The name of the consuming pin currently attached, if any.
    pub fn output_name(&self) -> Option<&str> {
        self.output.as_ref().map(|end| end.name.as_str())
    }

    pub(crate) fn output(&self) -> Option<&OutputEnd> {
        self.output.as_ref()
    }

    pub(crate) fn output_mut(&mut self) -> Option<&mut OutputEnd> {
        self.output.as_mut()
    }

    pub(crate) fn input_mut(&mut self) -> Option<&mut InputEnd<T>> {
        self.input.as_mut()
    }

    pub(crate) fn set_input(&mut self, input: Option<InputEnd<T>>) {
        self.input = input;
    }

    pub(crate) fn set_output(&mut self, output: Option<OutputEnd>) {
        self.output = output;
    }

    pub(crate) fn take_input(&mut self) -> Option<InputEnd<T>> {
        self.input.take()
    }
}
