//! # Discrete Core
//!
//! A sample-accurate simulator for the discrete analog sound circuits of
//! early arcade hardware.
//!
//! This library provides:
//! - A graph builder for wiring circuit elements into a sound effect
//! - Some thirty element models: adders, mixers, logic gates, flip-flops,
//!   one-shots, DAC ladders, Norton op-amp stages and an RPN transform
//! - A fixed-order evaluator that runs every node once per audio sample
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`graph`] - Node identities, input wiring and the graph builder
//! - [`nodes`] - The circuit element implementations
//! - [`sim`] - The per-sample evaluator
//! - [`diag`] - Non-fatal runtime diagnostics
//! - [`audio`] - WAV rendering and raw streaming (CLI only)
//!
//! ## Usage
//!
//! ```
//! use discrete_core::graph::{GraphBuilder, Input};
//! use discrete_core::nodes::{Element, MixerDesc};
//! use discrete_core::Simulator;
//!
//! let mut g = GraphBuilder::new();
//! let sum = g.add(
//!     Element::adder(),
//!     vec![Input::ON, Input::value(1.0), Input::value(2.0), Input::OFF, Input::OFF],
//! )?;
//! let mix = g.add(
//!     Element::mixer(MixerDesc::resistor(vec![1000.0, 1000.0]))?,
//!     vec![Input::ON, sum.into(), Input::value(0.0)],
//! )?;
//! let mut sim = Simulator::new(g.finish(mix)?, 48_000.0);
//! let sample = sim.step();
//! assert!((sample - 1.5).abs() < 1e-9);
//! # Ok::<(), discrete_core::DiscreteError>(())
//! ```
//!
//! ## Simulation Method
//!
//! There is no equation solver. Each element carries the already-worked-out
//! transfer function of its circuit, discretized per sample: resistor
//! networks collapse to Millman's theorem, capacitors charge by a
//! precomputed per-tick exponential, Norton op-amps balance input currents.
//! Nodes run in declaration order; a reference to a later node reads its
//! previous-tick output, which is what makes feedback loops legal at the
//! cost of one sample of delay.

pub mod diag;
pub mod error;
pub mod graph;
pub mod nodes;
pub mod sim;

#[cfg(feature = "cli")]
pub mod audio;

// Re-export main types for convenience
pub use error::{DiscreteError, Result};
pub use graph::{Graph, GraphBuilder, Input, NodeRef, SimParams};
pub use nodes::Element;
pub use sim::Simulator;

/// Default sample rate in Hz
pub const DEFAULT_SAMPLE_RATE: f64 = 48000.0;
