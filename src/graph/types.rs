//! Core types for graph representation.

use std::fmt;

/// A unique identifier for a node in the graph.
///
/// The index doubles as the node's position in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeRef(pub usize);

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NODE_{:02}", self.0)
    }
}

/// One wired input slot of a node.
///
/// A slot either carries a constant, set once at graph build, or it is bound
/// to another node's output. Bindings are resolved to arena indices exactly
/// once before simulation starts and never reseated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Input {
    /// A fixed scalar value.
    Value(f64),
    /// The live output of another node.
    Node(NodeRef),
}

impl Input {
    /// Shorthand for a constant slot.
    pub fn value(v: f64) -> Self {
        Input::Value(v)
    }

    /// A constant logic-high, the usual way to wire an always-on enable.
    pub const ON: Input = Input::Value(1.0);

    /// A constant logic-low / ground.
    pub const OFF: Input = Input::Value(0.0);
}

impl From<f64> for Input {
    fn from(v: f64) -> Self {
        Input::Value(v)
    }
}

impl From<NodeRef> for Input {
    fn from(n: NodeRef) -> Self {
        Input::Node(n)
    }
}

/// Process-wide simulation parameters, shared read-only by every node's
/// reset and step computations.
///
/// Changing the sample rate invalidates every derived constant (filter
/// exponents, ramp steps), so [`crate::Simulator::set_sample_rate`] re-runs
/// the full reset pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimParams {
    /// Sample rate in Hz.
    pub sample_rate: f64,
    /// Duration of one tick in seconds (1 / sample_rate).
    pub sample_time: f64,
}

impl SimParams {
    /// Create parameters for the given sample rate.
    pub fn new(sample_rate: f64) -> Self {
        Self {
            sample_rate,
            sample_time: 1.0 / sample_rate,
        }
    }
}
