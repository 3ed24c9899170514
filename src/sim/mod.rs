//! Main simulator interface.
//!
//! The simulator owns the graph's nodes and a flat output arena, one `f64`
//! per node. Each tick every node runs once, in declaration order, reading
//! its resolved inputs from the arena and writing its output back. A node
//! that references a later node therefore reads that node's previous-tick
//! value, which is what closes feedback loops with a one-sample delay.

use crate::diag::{Diagnostics, MessageSink, TracingSink};
use crate::graph::builder::NodeSlot;
use crate::graph::{Graph, Input, NodeRef, SimParams};

/// The discrete sound graph simulator.
pub struct Simulator {
    nodes: Vec<NodeSlot>,
    /// One output value per node, indexed by [`NodeRef`].
    outputs: Vec<f64>,
    /// Resolved input values of the node currently running.
    scratch: Vec<f64>,
    params: SimParams,
    output: NodeRef,
    sink: Box<dyn MessageSink>,
}

impl Simulator {
    /// Create a simulator for the given graph, with diagnostics going to
    /// `tracing`.
    pub fn new(graph: Graph, sample_rate: f64) -> Self {
        Self::with_sink(graph, sample_rate, Box::new(TracingSink))
    }

    /// Create a simulator with a custom diagnostic sink.
    pub fn with_sink(graph: Graph, sample_rate: f64, sink: Box<dyn MessageSink>) -> Self {
        let outputs = vec![0.0; graph.len()];
        let mut sim = Self {
            nodes: graph.nodes,
            outputs,
            scratch: Vec::new(),
            params: SimParams::new(sample_rate),
            output: graph.output,
            sink,
        };
        sim.reset_all();
        sim
    }

    /// The sample rate the simulation currently runs at.
    pub fn sample_rate(&self) -> f64 {
        self.params.sample_rate
    }

    /// Simulation parameters derived from the sample rate.
    pub fn params(&self) -> SimParams {
        self.params
    }

    /// Change the sample rate.
    ///
    /// Every derived constant (filter exponents, ramp steps, countdowns)
    /// depends on it, so the whole graph is re-reset and any accumulated
    /// state is lost.
    pub fn set_sample_rate(&mut self, sample_rate: f64) {
        self.params = SimParams::new(sample_rate);
        self.reset_all();
    }

    /// Run every node's reset in declaration order.
    ///
    /// Resets that sample their inputs (multiplexer, sample & hold) see the
    /// initial outputs of the nodes declared before them.
    fn reset_all(&mut self) {
        for idx in 0..self.nodes.len() {
            self.resolve_inputs(idx);
            let node = &mut self.nodes[idx];
            let mut diag = Diagnostics::new(&mut *self.sink, NodeRef(idx));
            self.outputs[idx] = node.element.reset(&self.scratch, &self.params, &mut diag);
        }
    }

    /// Copy node `idx`'s input slots into the scratch row, chasing node
    /// bindings through the arena.
    fn resolve_inputs(&mut self, idx: usize) {
        self.scratch.clear();
        for input in &self.nodes[idx].inputs {
            self.scratch.push(match *input {
                Input::Value(v) => v,
                Input::Node(node) => self.outputs[node.0],
            });
        }
    }

    /// Advance the graph one tick and return the designated output value.
    pub fn step(&mut self) -> f64 {
        for idx in 0..self.nodes.len() {
            self.resolve_inputs(idx);
            let node = &mut self.nodes[idx];
            let mut diag = Diagnostics::new(&mut *self.sink, NodeRef(idx));
            self.outputs[idx] =
                node.element
                    .step(&self.scratch, self.outputs[idx], &self.params, &mut diag);
        }
        self.outputs[self.output.0]
    }

    /// Fill a buffer with consecutive output samples.
    pub fn process_block(&mut self, buffer: &mut [f64]) {
        for sample in buffer {
            *sample = self.step();
        }
    }

    /// Current output of an arbitrary node, for probing interior points.
    pub fn node_output(&self, node: NodeRef) -> Option<f64> {
        self.outputs.get(node.0).copied()
    }
}
