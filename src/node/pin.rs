//! Pins: the typed endpoints through which nodes reach their pipes.
//!
//! An [`InPin`] receives packets, an [`OutPin`] emits them. Connecting an
//! output pin to an input pin of the same element type gives both pins
//! shared ownership of a single pipe; when one side disconnects, the pipe
//! stays attached to the remaining pin so queued packets are not lost.

use crate::error::PushError;
use crate::packet::Packet;
use crate::pipe::{InputEnd, OutputEnd, Pipe, PinSlot, SharedPipe};
use crate::sync::TransitionSignal;
use std::sync::{Arc, Mutex, RwLock};
use tracing::debug;

/// A node inlet. Nodes that consume packets (consumers and transformers)
/// have at least one.
pub struct InPin<T> {
    name: RwLock<String>,
    slot: Arc<PinSlot<T>>,
    signal: Arc<TransitionSignal>,
}

impl<T> InPin<T> {
    /// Create a pin wired to its owning node's transition signal.
    pub(crate) fn new(name: String, signal: Arc<TransitionSignal>) -> Self {
        Self {
            name: RwLock::new(name),
            slot: Arc::new(Mutex::new(None)),
            signal,
        }
    }

    /// The pin's name, typically `{node}_in{index}`.
    pub fn name(&self) -> String {
        self.name.read().unwrap().clone()
    }

    /// Rename the pin, keeping the pipe's display name in step.
    pub(crate) fn rename(&self, name: String) -> String {
        if let Some(pipe) = self.pipe() {
            let mut state = pipe.lock().unwrap();
            if let Some(output) = state.output_mut() {
                output.name.clone_from(&name);
            }
            if let Some(input_name) = state.input_name().map(str::to_owned) {
                state.rename(format!("{input_name}_to_{name}"));
            }
        }

        std::mem::replace(&mut *self.name.write().unwrap(), name)
    }

    /// True iff the pin is attached to a pipe holding at least one packet.
    pub fn peek(&self) -> bool {
        match self.pipe() {
            Some(pipe) => pipe.lock().unwrap().length() != 0,
            None => false,
        }
    }

    /// Extract the next packet from the pipe.
    ///
    /// `None` when the pin has no pipe or the pipe is empty.
    pub fn pop(&self) -> Option<Packet<T>> {
        self.pipe().and_then(|pipe| pipe.lock().unwrap().pop())
    }

    /// Notify the owning node that a packet has been queued.
    ///
    /// The connected output pin calls this after a successful push, outside
    /// the pipe's mutex.
    pub fn incoming(&self) {
        self.signal.notify();
    }

    /// True iff the pin currently holds a pipe.
    pub fn is_connected(&self) -> bool {
        self.slot.lock().unwrap().is_some()
    }

    /// Release this pin's share of its pipe, if any.
    ///
    /// The pipe survives while the producing side still holds it.
    pub(crate) fn disconnect(&self) {
        let pipe = self.slot.lock().unwrap().take();
        if let Some(pipe) = pipe {
            let mut state = pipe.lock().unwrap();
            state.set_output(None);
            if let Some(input_name) = state.input_name().map(str::to_owned) {
                state.rename(format!("{input_name}_to_nothing"));
            }
            debug!(pipe = %state.name(), "inpin disconnected");
        }
    }

    pub(crate) fn pipe(&self) -> Option<SharedPipe<T>> {
        self.slot.lock().unwrap().clone()
    }

    pub(crate) fn signal(&self) -> &Arc<TransitionSignal> {
        &self.signal
    }
}

/// A node outlet. Nodes that produce packets (producers and transformers)
/// have at least one.
pub struct OutPin<T> {
    name: RwLock<String>,
    slot: Arc<PinSlot<T>>,
}

impl<T> OutPin<T> {
    pub(crate) fn new(name: String) -> Self {
        Self {
            name: RwLock::new(name),
            slot: Arc::new(Mutex::new(None)),
        }
    }

    /// The pin's name, typically `{node}_out{index}`.
    pub fn name(&self) -> String {
        self.name.read().unwrap().clone()
    }

    /// Rename the pin, keeping the pipe's display name in step.
    pub(crate) fn rename(&self, name: String) -> String {
        if let Some(pipe) = self.pipe() {
            let mut state = pipe.lock().unwrap();
            if let Some(input) = state.input_mut() {
                input.name.clone_from(&name);
            }
            if let Some(output_name) = state.output_name().map(str::to_owned) {
                state.rename(format!("{name}_to_{output_name}"));
            }
        }

        std::mem::replace(&mut *self.name.write().unwrap(), name)
    }

    /// Connect this output pin to an input pin, the sole way a pipe comes
    /// to exist.
    ///
    /// - If this pin already has a pipe, it is disconnected from it first
    ///   (the old pipe survives if its consuming side still holds it).
    /// - If `inpin` already has a pipe, that pipe is adopted: its previous
    ///   producing pin, if still attached, is detached, and its caps are
    ///   overwritten with `max_length` / `max_weight`.
    /// - Otherwise a fresh pipe is created with both endpoints attached and
    ///   the given caps. 0 means uncapped.
    pub(crate) fn connect(&self, inpin: &InPin<T>, max_length: usize, max_weight: usize) {
        if self.is_connected() {
            self.disconnect();
        }

        let name = self.name();
        if let Some(pipe) = inpin.pipe() {
            let mut state = pipe.lock().unwrap();

            // Detach the pipe's previous producing pin. Done inline rather
            // than through that pin's disconnect, which would re-lock this
            // pipe.
            if let Some(old_input) = state.take_input() {
                if let Some(old_slot) = old_input.slot.upgrade() {
                    old_slot.lock().unwrap().take();
                }
            }

            state.set_input(Some(InputEnd {
                name: name.clone(),
                slot: Arc::downgrade(&self.slot),
            }));
            if let Some(output_name) = state.output_name().map(str::to_owned) {
                state.rename(format!("{name}_to_{output_name}"));
            }
            state.cap_length(max_length);
            state.cap_weight(max_weight);
            debug!(pipe = %state.name(), "outpin adopted existing pipe");
            drop(state);

            *self.slot.lock().unwrap() = Some(pipe);
        } else {
            let inpin_name = inpin.name();
            let pipe_name = format!("{name}_to_{inpin_name}");
            debug!(pipe = %pipe_name, "pipe created");

            let pipe: SharedPipe<T> = Arc::new(Mutex::new(Pipe::new(
                pipe_name,
                InputEnd {
                    name,
                    slot: Arc::downgrade(&self.slot),
                },
                OutputEnd {
                    name: inpin_name,
                    signal: Arc::clone(inpin.signal()),
                },
                max_length,
                max_weight,
            )));

            *inpin.slot.lock().unwrap() = Some(Arc::clone(&pipe));
            *self.slot.lock().unwrap() = Some(pipe);
        }
    }

    /// Move a packet onto the pipe.
    ///
    /// On success the connected input pin's node is notified, after the
    /// pipe's mutex has been released. On failure the packet comes back in
    /// the error: [`PushError::Disconnected`] when there is no pipe,
    /// [`PushError::Full`] when a cap refused it.
    pub fn push(&self, packet: Packet<T>) -> Result<(), PushError<T>> {
        let Some(pipe) = self.pipe() else {
            return Err(PushError::Disconnected(packet));
        };

        let signal = {
            let mut state = pipe.lock().unwrap();
            state.push(packet)?;
            state.output().map(|end| Arc::clone(&end.signal))
        };

        if let Some(signal) = signal {
            signal.notify();
        }
        Ok(())
    }

    /// True iff the pin currently holds a pipe.
    pub fn is_connected(&self) -> bool {
        self.slot.lock().unwrap().is_some()
    }

    /// Release this pin's share of its pipe, if any.
    ///
    /// The pipe survives while the consuming side still holds it, so
    /// already-queued packets can still be drained.
    pub(crate) fn disconnect(&self) {
        let pipe = self.slot.lock().unwrap().take();
        if let Some(pipe) = pipe {
            let mut state = pipe.lock().unwrap();
            state.set_input(None);
            if let Some(output_name) = state.output_name().map(str::to_owned) {
                state.rename(format!("nothing_to_{output_name}"));
            }
            debug!(pipe = %state.name(), "outpin disconnected");
        }
    }

    pub(crate) fn pipe(&self) -> Option<SharedPipe<T>> {
        self.slot.lock().unwrap().clone()
    }
}
