//! # Conflux
//!
//! A typed dataflow engine. Conflux provides the building blocks for
//! streaming data packets through a graph of concurrently executing nodes:
//!
//! - **Packets** are typed, move-only data carriers with an optional
//!   consumption time.
//! - **Pipes** are bounded, mutex-guarded FIFOs connecting exactly one
//!   output pin to one input pin. Both pins share ownership of the pipe, so
//!   a half-disconnected pipe keeps its queued packets until the remaining
//!   side drains or releases them.
//! - **Nodes** come in three roles — producer, consumer, transformer — and
//!   each runs on its own worker thread, suspending on a per-node condition
//!   variable whenever there is nothing to do.
//! - The **Graph** registers nodes under unique names, wires pins together
//!   with type-checked connections, and drives the coordinated
//!   start/pause/stop of the whole topology.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use conflux::prelude::*;
//! use std::sync::Arc;
//!
//! let source = Arc::new(Producer::<u64, _>::new("source", 1, MySource::new()));
//! let sink = Arc::new(Consumer::<u64, _>::new("sink", 1, MySink::new()));
//!
//! let mut graph = Graph::new();
//! graph.add(source);
//! graph.add(sink);
//! graph.connect::<u64>("source", 0, "sink", 0)?;
//!
//! graph.start();
//! // ... packets flow ...
//! graph.stop();
//! ```
//!
//! User logic is supplied as a *body* implementing [`Produce`],
//! [`Consume`], or [`Transform`]; the role shells own the pins and the
//! execution loop. See the [`nodes`] module for ready-made bodies.
//!
//! [`Produce`]: node::Produce
//! [`Consume`]: node::Consume
//! [`Transform`]: node::Transform

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod graph;
pub mod node;
pub mod nodes;
pub mod packet;
pub mod pipe;
pub mod sync;
pub mod timer;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::error::{Error, PushError, Result};
    pub use crate::graph::Graph;
    pub use crate::node::{
        Consume, Consumer, ConsumerNode, InPin, Node, OutPin, Produce, Producer, ProducerNode,
        Role, Transform, Transformer,
    };
    pub use crate::nodes::{Adder, ConstAdder, Delay, Generator, Ostreamer, Tee};
    pub use crate::packet::Packet;
    pub use crate::sync::{Latch, State, TransitionSignal};
    pub use crate::timer::MonotonousTimer;
}

pub use error::{Error, Result};
