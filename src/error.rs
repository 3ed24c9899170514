//! Error types for the discrete sound-circuit simulator.
//!
//! This module provides a unified error type [`DiscreteError`] for everything
//! that can go wrong while *building* a graph. Bad static configuration is
//! fatal and fails the build; bad runtime data (a zero divisor, an address
//! that wandered out of range) never produces an error; those are reported
//! through the diagnostic sink and the simulation keeps running with a
//! documented fallback value. See [`crate::diag`].

use thiserror::Error;

/// Result type alias using [`DiscreteError`].
pub type Result<T> = std::result::Result<T, DiscreteError>;

/// Unified error type for graph construction and the CLI frontend.
#[derive(Error, Debug)]
pub enum DiscreteError {
    // ============ Graph Wiring Errors ============
    /// A node was wired with the wrong number of inputs for its type.
    #[error("{element} takes {min}..={max} inputs, {given} were wired")]
    InputCount {
        element: &'static str,
        given: usize,
        min: usize,
        max: usize,
    },

    /// An input slot references a node that does not exist in the graph.
    #[error("{node} is not part of this graph")]
    DanglingRef { node: crate::graph::NodeRef },

    /// A feedback placeholder was declared but never filled.
    #[error("placeholder {node} was never filled")]
    UnfilledPlaceholder { node: crate::graph::NodeRef },

    /// The graph has no nodes at all.
    #[error("graph has no nodes")]
    EmptyGraph,

    // ============ Static Configuration Errors ============
    /// A DAC ladder table with fewer than 2 or more than the supported
    /// number of rungs.
    #[error("DAC ladder needs 2..={max} resistors, table has {len}")]
    LadderLength { len: usize, max: usize },

    /// An RPN transform program pushed past the fixed stack depth.
    #[error("RPN program {program:?} overflows the operand stack at opcode {at}")]
    RpnStackOverflow { program: String, at: usize },

    /// An RPN transform program popped from an empty operand stack.
    #[error("RPN program {program:?} underflows the operand stack at opcode {at}")]
    RpnStackUnderflow { program: String, at: usize },

    /// An RPN transform program contains an opcode the interpreter does
    /// not know.
    #[error("RPN program {program:?} contains unknown opcode {op:?}")]
    RpnUnknownOp { program: String, op: char },

    /// A static parameter that makes the element meaningless (e.g. a mixer
    /// with zero channels).
    #[error("invalid parameter for {element}: {message}")]
    InvalidParameter {
        element: &'static str,
        message: String,
    },

    // ============ I/O Errors (CLI only) ============
    /// Error writing raw samples to stdout.
    #[error("audio output error: {message}")]
    AudioOutputError { message: String },

    /// Error writing the rendered WAV file.
    #[cfg(feature = "cli")]
    #[error("WAV write error: {0}")]
    WavError(#[from] hound::Error),
}

impl DiscreteError {
    /// Create an invalid-parameter error.
    pub fn invalid_parameter(element: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            element,
            message: message.into(),
        }
    }
}
