//! The graph: registry, wiring, and coordinated lifecycle of nodes.

use crate::error::{Error, Result};
use crate::node::{ConsumerNode, InPin, Node, OutPin, ProducerNode, Role};
use crate::sync::State;
use std::collections::BTreeMap;
use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, info, warn};

type NodeMap = BTreeMap<String, Arc<dyn Node>>;
type WorkerMap = BTreeMap<String, JoinHandle<()>>;

/// Where a logged connection points: `(consumer_name, in_index)`, or `None`
/// once disconnected.
type LogTarget = Option<(String, usize)>;

/// A controller managing a set of nodes, their connections, and their
/// worker threads.
///
/// Nodes are registered under unique names and held in three role classes.
/// Lifecycle transitions traverse the classes in orders chosen to minimize
/// packet build-up in pipes: consumers are started first so they are
/// draining before producers push, and producers are paused or stopped
/// first so downstream nodes can drain what is already in flight. Within a
/// class, traversal is deterministic (sorted by name).
///
/// Each node gets a dedicated worker thread, spawned the first time it is
/// started and joined by [`stop`](Graph::stop). Registry mutation and
/// lifecycle calls belong to the owning thread; workers only touch the
/// graph indirectly through their pins.
///
/// Dropping a graph stops it, so no worker outlives it.
pub struct Graph {
    name: String,
    producers: NodeMap,
    transformers: NodeMap,
    consumers: NodeMap,
    workers: WorkerMap,
    connections: BTreeMap<String, BTreeMap<usize, LogTarget>>,
}

impl Graph {
    /// Create an empty graph named "graph".
    pub fn new() -> Self {
        Self::with_name("graph")
    }

    /// Create an empty graph with a custom name.
    pub fn with_name(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            producers: NodeMap::new(),
            transformers: NodeMap::new(),
            consumers: NodeMap::new(),
            workers: WorkerMap::new(),
            connections: BTreeMap::new(),
        }
    }

    /// The graph's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Add a node to the graph, keyed by its current name.
    ///
    /// The node starts out disconnected and paused. A node with the same
    /// name replaces the previous entry.
    pub fn add(&mut self, node: Arc<dyn Node>) {
        let name = node.name();
        debug!(graph = %self.name, node = %name, role = ?node.role(), "node added");
        self.connections.entry(name.clone()).or_default();
        self.class_of_mut(node.role()).insert(name, node);
    }

    /// Rename a node, then add it to the graph.
    pub fn add_as(&mut self, node: Arc<dyn Node>, name: &str) {
        node.rename(name);
        self.add(node);
    }

    /// Remove a node, severing all its pins first.
    ///
    /// Returns the extracted node handle, or `None` if the name is unknown.
    pub fn remove(&mut self, name: &str) -> Option<Arc<dyn Node>> {
        let node = self
            .producers
            .remove(name)
            .or_else(|| self.transformers.remove(name))
            .or_else(|| self.consumers.remove(name));

        if let Some(node) = &node {
            node.sever();
            debug!(graph = %self.name, node = %name, "node removed");
        }
        self.connections.remove(name);

        node
    }

    /// Remove a node by handle. Equivalent to `remove(&node.name())`.
    pub fn remove_node(&mut self, node: &Arc<dyn Node>) -> Option<Arc<dyn Node>> {
        self.remove(&node.name())
    }

    /// True iff a node with this name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    /// The number of registered nodes.
    pub fn node_count(&self) -> usize {
        self.producers.len() + self.transformers.len() + self.consumers.len()
    }

    /// True iff no node is registered.
    pub fn is_empty(&self) -> bool {
        self.node_count() == 0
    }

    /// The number of live worker threads.
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Connect a producing node's output pin to a consuming node's input
    /// pin with an uncapped pipe.
    ///
    /// `T` is the pins' element type; naming a pin of a different type is
    /// rejected with [`Error::TypeMismatch`].
    pub fn connect<T: Send + 'static>(
        &mut self,
        producer: &str,
        out_index: usize,
        consumer: &str,
        in_index: usize,
    ) -> Result<()> {
        self.connect_with_limits::<T>(producer, out_index, consumer, in_index, 0, 0)
    }

    /// Connect two pins with pipe caps. 0 = uncapped.
    ///
    /// Reuses the input pin's pipe when it already has one (overwriting its
    /// caps); see [`OutPin`] connection semantics.
    pub fn connect_with_limits<T: Send + 'static>(
        &mut self,
        producer: &str,
        out_index: usize,
        consumer: &str,
        in_index: usize,
        max_length: usize,
        max_weight: usize,
    ) -> Result<()> {
        let p = self
            .find(producer)
            .ok_or_else(|| Error::NodeNotFound(producer.to_owned()))?;
        let c = self
            .find(consumer)
            .ok_or_else(|| Error::NodeNotFound(consumer.to_owned()))?;

        let outpin = p
            .outpin_any(out_index)
            .ok_or_else(|| Error::PinOutOfRange {
                node: producer.to_owned(),
                index: out_index,
            })?
            .downcast_ref::<OutPin<T>>()
            .ok_or_else(|| Error::TypeMismatch {
                node: producer.to_owned(),
            })?;
        let inpin = c
            .inpin_any(in_index)
            .ok_or_else(|| Error::PinOutOfRange {
                node: consumer.to_owned(),
                index: in_index,
            })?
            .downcast_ref::<InPin<T>>()
            .ok_or_else(|| Error::TypeMismatch {
                node: consumer.to_owned(),
            })?;

        outpin.connect(inpin, max_length, max_weight);

        debug!(
            graph = %self.name,
            producer = %producer,
            out_index,
            consumer = %consumer,
            in_index,
            "connected"
        );
        self.connections
            .entry(producer.to_owned())
            .or_default()
            .insert(out_index, Some((consumer.to_owned(), in_index)));
        Ok(())
    }

    /// Connect two pins through typed node handles, checking the element
    /// type at compile time. Both nodes must already be registered.
    pub fn connect_nodes<T, P, C>(
        &mut self,
        producer: &Arc<P>,
        out_index: usize,
        consumer: &Arc<C>,
        in_index: usize,
        max_length: usize,
        max_weight: usize,
    ) -> Result<()>
    where
        T: Send + 'static,
        P: ProducerNode<T>,
        C: ConsumerNode<T>,
    {
        let p_name = producer.name();
        let c_name = consumer.name();
        if !self.contains(&p_name) {
            return Err(Error::NodeNotFound(p_name));
        }
        if !self.contains(&c_name) {
            return Err(Error::NodeNotFound(c_name));
        }

        let outpin = producer
            .outpins()
            .get(out_index)
            .ok_or_else(|| Error::PinOutOfRange {
                node: p_name.clone(),
                index: out_index,
            })?;
        let inpin = consumer
            .inpins()
            .get(in_index)
            .ok_or_else(|| Error::PinOutOfRange {
                node: c_name.clone(),
                index: in_index,
            })?;

        outpin.connect(inpin, max_length, max_weight);

        debug!(
            graph = %self.name,
            producer = %p_name,
            out_index,
            consumer = %c_name,
            in_index,
            "connected"
        );
        self.connections
            .entry(p_name)
            .or_default()
            .insert(out_index, Some((c_name, in_index)));
        Ok(())
    }

    /// Disconnect a node's output pin, releasing that side's pipe share and
    /// nulling the connection log entry.
    pub fn disconnect_output<T: Send + 'static>(&mut self, name: &str, index: usize) -> Result<()> {
        let node = self
            .find(name)
            .ok_or_else(|| Error::NodeNotFound(name.to_owned()))?;
        let outpin = node
            .outpin_any(index)
            .ok_or_else(|| Error::PinOutOfRange {
                node: name.to_owned(),
                index,
            })?
            .downcast_ref::<OutPin<T>>()
            .ok_or_else(|| Error::TypeMismatch {
                node: name.to_owned(),
            })?;
        outpin.disconnect();

        debug!(graph = %self.name, node = %name, index, "output disconnected");
        if let Some(targets) = self.connections.get_mut(name) {
            targets.insert(index, None);
        }
        Ok(())
    }

    /// Disconnect a node's input pin, releasing that side's pipe share and
    /// nulling any connection log entry targeting it.
    pub fn disconnect_input<T: Send + 'static>(&mut self, name: &str, index: usize) -> Result<()> {
        let node = self
            .find(name)
            .ok_or_else(|| Error::NodeNotFound(name.to_owned()))?;
        let inpin = node
            .inpin_any(index)
            .ok_or_else(|| Error::PinOutOfRange {
                node: name.to_owned(),
                index,
            })?
            .downcast_ref::<InPin<T>>()
            .ok_or_else(|| Error::TypeMismatch {
                node: name.to_owned(),
            })?;
        inpin.disconnect();

        debug!(graph = %self.name, node = %name, index, "input disconnected");
        for targets in self.connections.values_mut() {
            for target in targets.values_mut() {
                if matches!(target, Some((n, i)) if n == name && *i == index) {
                    *target = None;
                }
            }
        }
        Ok(())
    }

    /// Start every node: consumers first, then transformers, then
    /// producers, so downstream is draining before upstream pushes.
    ///
    /// A node without a live worker gets one spawned. Starting an
    /// already-started graph is an idempotent state rewrite.
    pub fn start(&mut self) {
        info!(graph = %self.name, "starting");
        Self::start_class(&self.consumers, &mut self.workers);
        Self::start_class(&self.transformers, &mut self.workers);
        Self::start_class(&self.producers, &mut self.workers);
    }

    /// Pause every node: producers first, then transformers, then
    /// consumers, letting downstream drain while upstream is already quiet.
    pub fn pause(&mut self) {
        info!(graph = %self.name, "pausing");
        Self::pause_class(&self.producers);
        Self::pause_class(&self.transformers);
        Self::pause_class(&self.consumers);
    }

    /// Stop every node and join its worker: producers first, then
    /// transformers, then consumers.
    ///
    /// Blocks until every worker has exited. Stopping an already-stopped
    /// graph is a no-op.
    pub fn stop(&mut self) {
        info!(graph = %self.name, "stopping");
        Self::stop_class(&self.producers, &mut self.workers);
        Self::stop_class(&self.transformers, &mut self.workers);
        Self::stop_class(&self.consumers, &mut self.workers);
    }

    /// Write a Graphviz DOT rendition of the logged connections.
    ///
    /// One edge per connection, tail-labeled with the output pin index and
    /// head-labeled with the input pin index. Informational only.
    pub fn to_dot<W: io::Write>(&self, out: &mut W) -> io::Result<()> {
        let name = if self.name == "graph" {
            "graph1"
        } else {
            &self.name
        };
        writeln!(out, "digraph {name}")?;
        writeln!(out, "{{")?;
        writeln!(out, "\trankdir = LR")?;
        writeln!(out, "\tnode [shape = record, fontname = \"Helvetica\"]")?;
        writeln!(out, "\tedge [color = \"midnightblue\", labelfontname = \"Courier\"]")?;

        for (producer, targets) in &self.connections {
            for (out_index, target) in targets {
                if let Some((consumer, in_index)) = target {
                    writeln!(
                        out,
                        "\t{producer} -> {consumer} [taillabel = \"{out_index}\", headlabel = \"{in_index}\"]"
                    )?;
                }
            }
        }

        writeln!(out, "}}")
    }

    fn find(&self, name: &str) -> Option<&Arc<dyn Node>> {
        self.producers
            .get(name)
            .or_else(|| self.transformers.get(name))
            .or_else(|| self.consumers.get(name))
    }

    fn class_of_mut(&mut self, role: Role) -> &mut NodeMap {
        match role {
            Role::Producer => &mut self.producers,
            Role::Transformer => &mut self.transformers,
            Role::Consumer => &mut self.consumers,
        }
    }

    fn start_class(nodes: &NodeMap, workers: &mut WorkerMap) {
        for (name, node) in nodes {
            node.transition(State::Started);
            if !workers.contains_key(name) {
                debug!(node = %name, "spawning worker");
                let worker = Arc::clone(node);
                workers.insert(name.clone(), thread::spawn(move || worker.run()));
            }
        }
    }

    fn pause_class(nodes: &NodeMap) {
        for node in nodes.values() {
            node.transition(State::Paused);
        }
    }

    fn stop_class(nodes: &NodeMap, workers: &mut WorkerMap) {
        for (name, node) in nodes {
            node.transition(State::Stopped);
            if let Some(worker) = workers.remove(name) {
                debug!(node = %name, "joining worker");
                if worker.join().is_err() {
                    warn!(node = %name, "worker panicked before joining");
                }
            }
        }
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Graph {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for Graph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Graph")
            .field("name", &self.name)
            .field("producers", &self.producers.len())
            .field("transformers", &self.transformers.len())
            .field("consumers", &self.consumers.len())
            .field("workers", &self.workers.len())
            .finish()
    }
}
