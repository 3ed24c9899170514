//! Graph description: node identities, input wiring and the builder.
//!
//! A graph is an ordered list of circuit elements. Declaration order is
//! evaluation order, exactly like the block list of the original hardware
//! description: an input bound to an earlier node reads the value computed
//! this tick, an input bound to a later node reads the value from the
//! previous tick. The latter is the one-sample-delay escape valve that makes
//! feedback loops legal.

pub(crate) mod builder;
mod types;

pub use builder::{Graph, GraphBuilder};
pub use types::{Input, NodeRef, SimParams};
