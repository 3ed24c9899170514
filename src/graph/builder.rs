//! Graph construction and validation.

use crate::error::{DiscreteError, Result};
use crate::nodes::Element;

use super::{Input, NodeRef};

/// One node of a finished graph: the element plus its wired input slots.
#[derive(Debug, Clone)]
pub(crate) struct NodeSlot {
    pub element: Element,
    pub inputs: Vec<Input>,
}

/// Builder for a discrete sound graph.
///
/// Nodes are appended in evaluation order. Wiring an input to a node that is
/// declared *later* is allowed and reads that node's previous-tick output;
/// use [`GraphBuilder::placeholder`] to obtain such a reference up front.
///
/// # Example
///
/// ```
/// use discrete_core::graph::{GraphBuilder, Input};
/// use discrete_core::nodes::Element;
///
/// let mut g = GraphBuilder::new();
/// let sum = g.add(
///     Element::adder(),
///     vec![Input::ON, Input::value(1.5), Input::value(2.5), Input::OFF, Input::OFF],
/// )?;
/// let graph = g.finish(sum)?;
/// # Ok::<(), discrete_core::DiscreteError>(())
/// ```
#[derive(Debug, Default)]
pub struct GraphBuilder {
    slots: Vec<Option<NodeSlot>>,
}

impl GraphBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a node. Returns its reference.
    ///
    /// Fails if the number of wired inputs is outside the element's range.
    pub fn add(&mut self, element: Element, inputs: Vec<Input>) -> Result<NodeRef> {
        self.slots.push(Some(make_slot(element, inputs)?));
        Ok(NodeRef(self.slots.len() - 1))
    }

    /// Reserve a slot in evaluation order without deciding its element yet.
    ///
    /// This is how feedback loops are wired: reserve the looped-back node,
    /// reference it from the nodes that feed on it, then [`fill`] it.
    ///
    /// [`fill`]: GraphBuilder::fill
    pub fn placeholder(&mut self) -> NodeRef {
        self.slots.push(None);
        NodeRef(self.slots.len() - 1)
    }

    /// Fill a previously reserved slot.
    pub fn fill(&mut self, node: NodeRef, element: Element, inputs: Vec<Input>) -> Result<()> {
        let slot = self
            .slots
            .get_mut(node.0)
            .ok_or(DiscreteError::DanglingRef { node })?;
        if slot.is_some() {
            return Err(DiscreteError::invalid_parameter(
                "placeholder",
                format!("{node} is already filled"),
            ));
        }
        *slot = Some(make_slot(element, inputs)?);
        Ok(())
    }

    /// Validate the wiring and produce an immutable [`Graph`].
    ///
    /// `output` designates the node whose output the simulator hands to the
    /// surrounding audio subsystem each tick.
    pub fn finish(self, output: NodeRef) -> Result<Graph> {
        if self.slots.is_empty() {
            return Err(DiscreteError::EmptyGraph);
        }

        let len = self.slots.len();
        let mut nodes = Vec::with_capacity(len);
        for (idx, slot) in self.slots.into_iter().enumerate() {
            let slot = slot.ok_or(DiscreteError::UnfilledPlaceholder {
                node: NodeRef(idx),
            })?;
            for input in &slot.inputs {
                if let Input::Node(node) = *input {
                    if node.0 >= len {
                        return Err(DiscreteError::DanglingRef { node });
                    }
                }
            }
            nodes.push(slot);
        }

        if output.0 >= len {
            return Err(DiscreteError::DanglingRef { node: output });
        }

        Ok(Graph { nodes, output })
    }
}

/// A validated, immutable graph description, ready to simulate.
#[derive(Debug, Clone)]
pub struct Graph {
    pub(crate) nodes: Vec<NodeSlot>,
    pub(crate) output: NodeRef,
}

impl Graph {
    /// Number of nodes in the graph.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The designated output node.
    pub fn output(&self) -> NodeRef {
        self.output
    }
}

/// Arity-check the wired inputs, then append any slots the element itself
/// asks for (the mixer's resistor-node bindings). The appended refs are
/// validated by `finish` like any other input.
fn make_slot(element: Element, mut inputs: Vec<Input>) -> Result<NodeSlot> {
    let (min, max) = element.input_range();
    if inputs.len() < min || inputs.len() > max {
        return Err(DiscreteError::InputCount {
            element: element.name(),
            given: inputs.len(),
            min,
            max,
        });
    }
    inputs.extend(element.hidden_inputs());
    Ok(NodeSlot { element, inputs })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adder_inputs() -> Vec<Input> {
        vec![Input::ON, 1.0.into(), 2.0.into(), Input::OFF, Input::OFF]
    }

    #[test]
    fn add_checks_arity() {
        let mut g = GraphBuilder::new();
        let err = g.add(Element::adder(), vec![Input::ON]).unwrap_err();
        assert!(matches!(err, DiscreteError::InputCount { given: 1, .. }));
    }

    #[test]
    fn finish_rejects_empty_graph() {
        let g = GraphBuilder::new();
        assert!(matches!(
            g.finish(NodeRef(0)),
            Err(DiscreteError::EmptyGraph)
        ));
    }

    #[test]
    fn finish_rejects_unfilled_placeholder() {
        let mut g = GraphBuilder::new();
        let p = g.placeholder();
        let err = g.finish(p).unwrap_err();
        assert!(matches!(err, DiscreteError::UnfilledPlaceholder { node } if node == p));
    }

    #[test]
    fn finish_rejects_dangling_input() {
        let mut g = GraphBuilder::new();
        let n = g
            .add(
                Element::gain(),
                vec![Input::ON, Input::Node(NodeRef(9)), 1.0.into(), 0.0.into()],
            )
            .unwrap();
        let err = g.finish(n).unwrap_err();
        assert!(matches!(err, DiscreteError::DanglingRef { node } if node == NodeRef(9)));
    }

    #[test]
    fn placeholder_fill_round_trip() {
        let mut g = GraphBuilder::new();
        let fb = g.placeholder();
        let sum = g
            .add(
                Element::adder(),
                vec![Input::ON, fb.into(), 1.0.into(), Input::OFF, Input::OFF],
            )
            .unwrap();
        g.fill(
            fb,
            Element::gain(),
            vec![Input::ON, sum.into(), 0.5.into(), 0.0.into()],
        )
        .unwrap();
        let graph = g.finish(sum).unwrap();
        assert_eq!(graph.len(), 2);
    }

    #[test]
    fn fill_twice_is_rejected() {
        let mut g = GraphBuilder::new();
        let p = g.placeholder();
        g.fill(p, Element::adder(), adder_inputs()).unwrap();
        let err = g.fill(p, Element::adder(), adder_inputs()).unwrap_err();
        assert!(matches!(err, DiscreteError::InvalidParameter { .. }));
    }
}
