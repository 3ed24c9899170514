//! Runtime diagnostic sink.
//!
//! The original circuits tolerate bad runtime data: a divider fed a zero
//! divisor maxes out instead of faulting, a multiplexer fed a wild address
//! holds its output. Each such anomaly is reported once through a
//! [`MessageSink`] and the simulation carries on. The core only depends on
//! the sink capability, not on any particular log destination; the default
//! [`TracingSink`] routes messages to `tracing::warn!`.

use std::fmt;

/// Destination for non-fatal runtime diagnostics.
pub trait MessageSink {
    /// Deliver one formatted diagnostic message.
    fn message(&mut self, args: fmt::Arguments<'_>);
}

/// Default sink: forwards diagnostics to `tracing` at WARN level.
#[derive(Debug, Default)]
pub struct TracingSink;

impl MessageSink for TracingSink {
    fn message(&mut self, args: fmt::Arguments<'_>) {
        tracing::warn!(target: "discrete_core", "{}", args);
    }
}

/// Sink that records every message, for tests and host inspection.
#[derive(Debug, Default)]
pub struct CollectSink {
    messages: Vec<String>,
}

impl CollectSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages recorded so far, oldest first.
    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    /// Number of messages recorded so far.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl MessageSink for CollectSink {
    fn message(&mut self, args: fmt::Arguments<'_>) {
        self.messages.push(args.to_string());
    }
}

/// Sink that discards everything.
#[derive(Debug, Default)]
pub struct NullSink;

impl MessageSink for NullSink {
    fn message(&mut self, _args: fmt::Arguments<'_>) {}
}

/// Per-step view handed to a node: the shared sink plus the identity of the
/// node currently stepping, so messages can name their source.
pub struct Diagnostics<'a> {
    sink: &'a mut dyn MessageSink,
    node: crate::graph::NodeRef,
}

impl<'a> Diagnostics<'a> {
    pub(crate) fn new(sink: &'a mut dyn MessageSink, node: crate::graph::NodeRef) -> Self {
        Self { sink, node }
    }

    /// Report one anomaly for the node currently stepping.
    pub fn report(&mut self, args: fmt::Arguments<'_>) {
        self.sink.message(format_args!("{}: {}", self.node, args));
    }
}
