//! Circuit primitive implementations.
//!
//! One struct per primitive, each holding its immutable configuration
//! (resistor tables, RPN program, mixer description) and its mutable
//! per-instance state (capacitor voltages, last clock level, countdown
//! timers) as separate fields. The closed [`Element`] enum wraps them all
//! and dispatches `reset`/`step` by `match`.
//!
//! Shared contract (every primitive):
//! - `reset` derives per-sample-rate constants, seeds the state and returns
//!   the initial output. It runs exactly once before any `step`, and again
//!   whenever the sample rate changes.
//! - `step` is a pure function of the resolved input values, the config, the
//!   state and the previous output; it returns the new output. It never
//!   fails: runtime anomalies go through [`crate::diag::Diagnostics`] and a
//!   documented fallback value.

mod arith;
mod dac;
mod logic;
mod mixer;
mod oneshot;
mod opamp;
mod switch;
mod transform;

pub use arith::{Adder, Clamp, CompAdderKind, CompAdderTable, ComponentAdder, Divide, Gain, LookupTable};
pub use dac::{DacR1, DacR1Ladder, LADDER_MAX_RES};
pub use logic::{DFlipFlop, GateOp, JkFlipFlop, LogicGate};
pub use mixer::{DiodeMixer, Mixer, MixerDesc, MixerKind, MIXER_MAX_INPUTS};
pub use oneshot::{OneShot, OneShotMode, Ramp};
pub use opamp::{
    Integrate, IntegrateInfo, IntegrateKind, OpAmp, OpAmpInfo, OpAmpOneShot, OpAmpOneShotInfo,
    TriggerFn, TvcaInfo, TvcaOpAmp, OP_AMP_NORTON_VBE, OP_AMP_VP_RAIL_OFFSET,
};
pub use switch::{
    AnalogSwitch, Multiplex, SampleHold, Switch, SAMPHOLD_FEDGE, SAMPHOLD_HLATCH, SAMPHOLD_LLATCH,
    SAMPHOLD_REDGE,
};
pub use transform::{RpnProgram, Transform, RPN_MAX_STACK};

use crate::diag::Diagnostics;
use crate::error::Result;
use crate::graph::{Input, SimParams};

/// Discretized first-order RC charge constant.
///
/// `v += (target - v) * rc_exponent(r, c, rate)` advances an RC charge or
/// discharge by one sample. The exact formula matters: audio regression
/// against the original hardware tables assumes it.
pub(crate) fn rc_exponent(r: f64, c: f64, sample_rate: f64) -> f64 {
    1.0 - (-1.0 / (r * c * sample_rate)).exp()
}

/// A circuit primitive, ready to wire into a graph.
#[derive(Debug, Clone)]
pub enum Element {
    Adder(Adder),
    ComponentAdder(ComponentAdder),
    Clamp(Clamp),
    DacR1(DacR1),
    DiodeMixer(DiodeMixer),
    Divide(Divide),
    Gain(Gain),
    Integrate(Integrate),
    LogicGate(LogicGate),
    DFlipFlop(DFlipFlop),
    JkFlipFlop(JkFlipFlop),
    LookupTable(LookupTable),
    Mixer(Mixer),
    Multiplex(Multiplex),
    OneShot(OneShot),
    Ramp(Ramp),
    SampleHold(SampleHold),
    Switch(Switch),
    AnalogSwitch(AnalogSwitch),
    Transform(Transform),
    OpAmp(OpAmp),
    OpAmpOneShot(OpAmpOneShot),
    TvcaOpAmp(TvcaOpAmp),
}

impl Element {
    // ---- constructors ------------------------------------------------

    /// Multichannel adder: `enable, in0..` (up to 4 channels).
    pub fn adder() -> Self {
        Element::Adder(Adder)
    }

    /// Selectable parallel component network: `enable, bit select`.
    pub fn component_adder(table: CompAdderTable) -> Result<Self> {
        Ok(Element::ComponentAdder(ComponentAdder::new(table)?))
    }

    /// Signal clamp: `enable, in, min, max, clamp-when-disabled`.
    pub fn clamp() -> Self {
        Element::Clamp(Clamp)
    }

    /// R1-ladder DAC with cap smoothing: `enable, data, vON`.
    pub fn dac_r1(ladder: DacR1Ladder) -> Result<Self> {
        Ok(Element::DacR1(DacR1::new(ladder)?))
    }

    /// Diode mixer: `enable, junction drop, in0..` (up to 8).
    pub fn diode_mixer() -> Self {
        Element::DiodeMixer(DiodeMixer)
    }

    /// Division: `enable, in, divisor`.
    pub fn divide() -> Self {
        Element::Divide(Divide)
    }

    /// Gain and offset: `enable, in, gain, offset`.
    pub fn gain() -> Self {
        Element::Gain(Gain)
    }

    /// Op-amp integrator: `trig0[, trig1]`.
    pub fn integrate(info: IntegrateInfo) -> Self {
        Element::Integrate(Integrate::new(info))
    }

    /// Logic inverter: `enable, in`.
    pub fn logic_inv() -> Self {
        Element::LogicGate(LogicGate::new(GateOp::Inv))
    }

    /// Logic AND: `enable, in0..` (up to 4).
    pub fn logic_and() -> Self {
        Element::LogicGate(LogicGate::new(GateOp::And))
    }

    /// Logic NAND: `enable, in0..` (up to 4).
    pub fn logic_nand() -> Self {
        Element::LogicGate(LogicGate::new(GateOp::Nand))
    }

    /// Logic OR: `enable, in0..` (up to 4).
    pub fn logic_or() -> Self {
        Element::LogicGate(LogicGate::new(GateOp::Or))
    }

    /// Logic NOR: `enable, in0..` (up to 4).
    pub fn logic_nor() -> Self {
        Element::LogicGate(LogicGate::new(GateOp::Nor))
    }

    /// Logic XOR: `enable, in0, in1`.
    pub fn logic_xor() -> Self {
        Element::LogicGate(LogicGate::new(GateOp::Xor))
    }

    /// Logic XNOR: `enable, in0, in1`.
    pub fn logic_xnor() -> Self {
        Element::LogicGate(LogicGate::new(GateOp::Xnor))
    }

    /// D-type flip-flop: `enable, /reset, /set, clock, data`.
    pub fn d_flip_flop() -> Self {
        Element::DFlipFlop(DFlipFlop::new())
    }

    /// JK-type flip-flop: `enable, /reset, /set, clock, J, K`.
    pub fn jk_flip_flop() -> Self {
        Element::JkFlipFlop(JkFlipFlop::new())
    }

    /// Table lookup: `enable, address`.
    pub fn lookup_table(table: Vec<f64>) -> Result<Self> {
        Ok(Element::LookupTable(LookupTable::new(table)?))
    }

    /// Final mixer stage: `enable, in0..` (channel count fixed by the
    /// description).
    pub fn mixer(desc: MixerDesc) -> Result<Self> {
        Ok(Element::Mixer(Mixer::new(desc)?))
    }

    /// 1-of-x multiplexer: `enable, address, in0..` (up to 8).
    pub fn multiplex() -> Self {
        Element::Multiplex(Multiplex::new())
    }

    /// One-shot pulse generator: `reset, trigger, amplitude, width`.
    pub fn one_shot(mode: OneShotMode) -> Self {
        Element::OneShot(OneShot::new(mode))
    }

    /// Ramp up/down: `enable, direction, gradient, start, end,
    /// clamp-when-disabled`.
    pub fn ramp() -> Self {
        Element::Ramp(Ramp::new())
    }

    /// Sample and hold: `enable, in, clock, clock type`.
    pub fn sample_hold() -> Self {
        Element::SampleHold(SampleHold::new())
    }

    /// Two-pole switch: `enable, select, in0, in1`.
    pub fn switch() -> Self {
        Element::Switch(Switch)
    }

    /// Analog switch: `enable, control, in, threshold`.
    pub fn analog_switch() -> Self {
        Element::AnalogSwitch(AnalogSwitch)
    }

    /// RPN math transform: `enable, in0..` (as many channels as the program
    /// references).
    pub fn transform(program: &str) -> Result<Self> {
        Ok(Element::Transform(Transform::new(RpnProgram::parse(
            program,
        )?)))
    }

    /// Norton op-amp stage: `enable, in0, in1`.
    pub fn op_amp(info: OpAmpInfo) -> Self {
        Element::OpAmp(OpAmp::new(info))
    }

    /// Norton op-amp one-shot: `trigger`.
    pub fn op_amp_one_shot(info: OpAmpOneShotInfo) -> Self {
        Element::OpAmpOneShot(OpAmpOneShot::new(info))
    }

    /// Triggered op-amp VCA: `trig0, trig1, trig2, in0, in1`.
    pub fn tvca_op_amp(info: TvcaInfo) -> Self {
        Element::TvcaOpAmp(TvcaOpAmp::new(info))
    }

    // ---- dispatch ----------------------------------------------------

    /// Human-readable element name for errors and diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            Element::Adder(_) => "adder",
            Element::ComponentAdder(_) => "component adder",
            Element::Clamp(_) => "clamp",
            Element::DacR1(_) => "DAC R1 ladder",
            Element::DiodeMixer(_) => "diode mixer",
            Element::Divide(_) => "divide",
            Element::Gain(_) => "gain",
            Element::Integrate(_) => "integrate",
            Element::LogicGate(g) => g.name(),
            Element::DFlipFlop(_) => "D flip-flop",
            Element::JkFlipFlop(_) => "JK flip-flop",
            Element::LookupTable(_) => "lookup table",
            Element::Mixer(_) => "mixer",
            Element::Multiplex(_) => "multiplex",
            Element::OneShot(_) => "one-shot",
            Element::Ramp(_) => "ramp",
            Element::SampleHold(_) => "sample & hold",
            Element::Switch(_) => "switch",
            Element::AnalogSwitch(_) => "analog switch",
            Element::Transform(_) => "transform",
            Element::OpAmp(_) => "op-amp",
            Element::OpAmpOneShot(_) => "op-amp one-shot",
            Element::TvcaOpAmp(_) => "TVCA op-amp",
        }
    }

    /// Inclusive range of wired input slots this instance accepts.
    pub fn input_range(&self) -> (usize, usize) {
        match self {
            Element::Adder(_) => (2, 5),
            Element::ComponentAdder(_) => (2, 2),
            Element::Clamp(_) => (5, 5),
            Element::DacR1(_) => (3, 3),
            Element::DiodeMixer(_) => (3, 10),
            Element::Divide(_) => (3, 3),
            Element::Gain(_) => (4, 4),
            Element::Integrate(i) => i.input_range(),
            Element::LogicGate(g) => g.input_range(),
            Element::DFlipFlop(_) => (5, 5),
            Element::JkFlipFlop(_) => (6, 6),
            Element::LookupTable(_) => (2, 2),
            Element::Mixer(m) => m.input_range(),
            Element::Multiplex(_) => (3, 10),
            Element::OneShot(_) => (4, 4),
            Element::Ramp(_) => (6, 6),
            Element::SampleHold(_) => (4, 4),
            Element::Switch(_) => (4, 4),
            Element::AnalogSwitch(_) => (4, 4),
            Element::Transform(t) => t.input_range(),
            Element::OpAmp(_) => (3, 3),
            Element::OpAmpOneShot(_) => (1, 1),
            Element::TvcaOpAmp(_) => (5, 5),
        }
    }

    /// Extra input slots the simulator must wire beyond the caller's list.
    ///
    /// Only the mixer uses this: its resistor-node bindings are part of the
    /// description, but their live values arrive like any other input.
    pub(crate) fn hidden_inputs(&self) -> Vec<Input> {
        match self {
            Element::Mixer(m) => m.hidden_inputs(),
            _ => Vec::new(),
        }
    }

    /// Derive per-sample-rate constants, seed the state, return the initial
    /// output.
    pub(crate) fn reset(
        &mut self,
        ins: &[f64],
        params: &SimParams,
        diag: &mut Diagnostics<'_>,
    ) -> f64 {
        match self {
            Element::DacR1(n) => n.reset(params),
            Element::DiodeMixer(n) => n.reset(ins),
            Element::Integrate(n) => n.reset(params),
            Element::DFlipFlop(n) => n.reset(),
            Element::JkFlipFlop(n) => n.reset(),
            Element::Mixer(n) => n.reset(params),
            Element::Multiplex(n) => n.reset(ins, diag),
            Element::OneShot(n) => n.reset(ins),
            Element::Ramp(n) => n.reset(ins, params),
            Element::SampleHold(n) => n.reset(ins, diag),
            Element::OpAmp(n) => n.reset(params),
            Element::OpAmpOneShot(n) => n.reset(params),
            Element::TvcaOpAmp(n) => n.reset(ins, params),
            // Stateless elements start from a zero output.
            _ => 0.0,
        }
    }

    /// Advance one tick. `out` is the node's previous output.
    pub(crate) fn step(
        &mut self,
        ins: &[f64],
        out: f64,
        params: &SimParams,
        diag: &mut Diagnostics<'_>,
    ) -> f64 {
        match self {
            Element::Adder(n) => n.step(ins),
            Element::ComponentAdder(n) => n.step(ins),
            Element::Clamp(n) => n.step(ins),
            Element::DacR1(n) => n.step(ins, out),
            Element::DiodeMixer(n) => n.step(ins),
            Element::Divide(n) => n.step(ins, diag),
            Element::Gain(n) => n.step(ins),
            Element::Integrate(n) => n.step(ins, out, params),
            Element::LogicGate(n) => n.step(ins),
            Element::DFlipFlop(n) => n.step(ins, out),
            Element::JkFlipFlop(n) => n.step(ins, out),
            Element::LookupTable(n) => n.step(ins, diag),
            Element::Mixer(n) => n.step(ins, params),
            Element::Multiplex(n) => n.step(ins, out, diag),
            Element::OneShot(n) => n.step(ins, out, params),
            Element::Ramp(n) => n.step(ins, out),
            Element::SampleHold(n) => n.step(ins, out, diag),
            Element::Switch(n) => n.step(ins),
            Element::AnalogSwitch(n) => n.step(ins),
            Element::Transform(n) => n.step(ins),
            Element::OpAmp(n) => n.step(ins),
            Element::OpAmpOneShot(n) => n.step(ins, out),
            Element::TvcaOpAmp(n) => n.step(ins),
        }
    }
}

#[cfg(test)]
pub(crate) mod test_util {
    //! Helpers shared by the node-level tests.

    use super::Element;
    use crate::diag::{CollectSink, MessageSink};
    use crate::diag::Diagnostics;
    use crate::graph::{NodeRef, SimParams};

    /// Drive a single element outside any graph: reset once, then step with
    /// the given input rows, returning every output.
    pub fn run_element(element: &mut Element, rows: &[Vec<f64>], sample_rate: f64) -> Vec<f64> {
        let mut sink = CollectSink::new();
        run_element_with_sink(element, rows, sample_rate, &mut sink)
    }

    pub fn run_element_with_sink(
        element: &mut Element,
        rows: &[Vec<f64>],
        sample_rate: f64,
        sink: &mut dyn MessageSink,
    ) -> Vec<f64> {
        let params = SimParams::new(sample_rate);
        let first = rows.first().cloned().unwrap_or_default();
        let mut out = {
            let mut diag = Diagnostics::new(sink, NodeRef(0));
            element.reset(&first, &params, &mut diag)
        };
        let mut outputs = Vec::with_capacity(rows.len());
        for row in rows {
            let mut diag = Diagnostics::new(sink, NodeRef(0));
            out = element.step(row, out, &params, &mut diag);
            outputs.push(out);
        }
        outputs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rc_exponent_matches_closed_form() {
        let e = rc_exponent(1000.0, 1e-6, 48000.0);
        let expect = 1.0 - (-1.0f64 / (1000.0 * 1e-6 * 48000.0)).exp();
        assert!((e - expect).abs() < 1e-15);
        assert!(e > 0.0 && e < 1.0);
    }
}
