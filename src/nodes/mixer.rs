//! Final mixer stage and the simple diode mixer.

use crate::graph::{Input, NodeRef, SimParams};
use crate::error::{DiscreteError, Result};
use crate::nodes::rc_exponent;

/// Channel limit of [`Mixer`].
pub const MIXER_MAX_INPUTS: usize = 8;

/// Output stage impedance assumed for the amp coupling cap. The real
/// amp/speaker chain dominates the filtering either way.
const AMP_IMPEDANCE: f64 = 100_000.0;

/// Mixer topology.
///
/// An op-amp description with a non-zero `r_i` is promoted to an inverting
/// amplifier internally: Millman including `v_ref / r_i`, then
/// `v = v_ref + (r_f / r_i) * (v_ref - v)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MixerKind {
    /// Passive resistor network, straight Millman.
    Resistor,
    /// Op-amp summing node, `v = i * r_f`.
    OpAmp,
}

/// Static description of a [`Mixer`].
///
/// `r` sets the channel count (1 to [`MIXER_MAX_INPUTS`]). A channel with an
/// entry in `r_node` has that node's live output in series with its static
/// resistor; a node value of 0 disconnects the channel entirely. `c` entries
/// of 0 mean no input coupling cap on that channel.
#[derive(Debug, Clone)]
pub struct MixerDesc {
    pub kind: MixerKind,
    pub r: Vec<f64>,
    pub r_node: Vec<Option<NodeRef>>,
    pub c: Vec<f64>,
    pub r_i: f64,
    pub r_f: f64,
    pub c_f: f64,
    pub c_amp: f64,
    pub v_ref: f64,
    pub gain: f64,
}

impl MixerDesc {
    /// A passive resistor mixer with no caps and no variable resistors.
    pub fn resistor(r: Vec<f64>) -> Self {
        let n = r.len();
        Self {
            kind: MixerKind::Resistor,
            r,
            r_node: vec![None; n],
            c: vec![0.0; n],
            r_i: 0.0,
            r_f: 0.0,
            c_f: 0.0,
            c_amp: 0.0,
            v_ref: 0.0,
            gain: 1.0,
        }
    }
}

/// Resolved topology, after `r_i` promotion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Topology {
    Resistor,
    OpAmp,
    OpAmpWithRi,
}

/// Weighted analog mixer with input coupling caps, an output low pass and
/// an amp coupling cap.
///
/// Inputs: `enable, in0..inN-1`, plus one internal slot per `r_node`
/// channel wired by the graph builder.
#[derive(Debug, Clone)]
pub struct Mixer {
    desc: MixerDesc,
    topology: Topology,
    /// Sum of 1/r over fixed connected channels plus r_f / r_i terms.
    r_total_static: f64,
    gain_ri: f64,
    exponent_rc: Vec<f64>,
    v_cap: Vec<f64>,
    exponent_c_f: f64,
    v_cap_f: f64,
    exponent_c_amp: f64,
    v_cap_amp: f64,
    has_r_node: bool,
}

impl Mixer {
    pub(crate) fn new(desc: MixerDesc) -> Result<Self> {
        let size = desc.r.len();
        if size == 0 || size > MIXER_MAX_INPUTS {
            return Err(DiscreteError::invalid_parameter(
                "mixer",
                format!("channel count {} not in 1..={}", size, MIXER_MAX_INPUTS),
            ));
        }
        if desc.r_node.len() != size || desc.c.len() != size {
            return Err(DiscreteError::invalid_parameter(
                "mixer",
                "r, r_node and c tables must have the same length",
            ));
        }
        if desc.kind == MixerKind::OpAmp && desc.r_f == 0.0 {
            return Err(DiscreteError::invalid_parameter(
                "mixer",
                "op-amp mixer needs a feedback resistor",
            ));
        }
        for (ch, &r) in desc.r.iter().enumerate() {
            if r == 0.0 && desc.r_node[ch].is_none() {
                return Err(DiscreteError::invalid_parameter(
                    "mixer",
                    format!("channel {ch} has no resistance"),
                ));
            }
        }

        let topology = match desc.kind {
            MixerKind::Resistor => Topology::Resistor,
            MixerKind::OpAmp if desc.r_i != 0.0 => Topology::OpAmpWithRi,
            MixerKind::OpAmp => Topology::OpAmp,
        };
        Ok(Self {
            desc,
            topology,
            r_total_static: 0.0,
            gain_ri: 0.0,
            exponent_rc: vec![0.0; size],
            v_cap: vec![0.0; size],
            exponent_c_f: 0.0,
            v_cap_f: 0.0,
            exponent_c_amp: 0.0,
            v_cap_amp: 0.0,
            has_r_node: false,
        })
    }

    fn size(&self) -> usize {
        self.desc.r.len()
    }

    pub(crate) fn input_range(&self) -> (usize, usize) {
        let n = 1 + self.size();
        (n, n)
    }

    /// Resistor-node outputs ride in as extra inputs after the signal slots.
    pub(crate) fn hidden_inputs(&self) -> Vec<Input> {
        self.desc
            .r_node
            .iter()
            .filter_map(|r| r.map(Input::Node))
            .collect()
    }

    /// The series resistance seen by channel `ch`'s coupling cap.
    fn cap_series_r(&self, r_ch: f64) -> f64 {
        match self.topology {
            Topology::Resistor => {
                if self.desc.r_f != 0.0 {
                    1.0 / (1.0 / r_ch + 1.0 / self.desc.r_f)
                } else {
                    r_ch
                }
            }
            Topology::OpAmp => r_ch,
            Topology::OpAmpWithRi => r_ch + self.desc.r_i,
        }
    }

    pub(crate) fn reset(&mut self, params: &SimParams) -> f64 {
        self.has_r_node = self.desc.r_node.iter().any(Option::is_some);

        // Combined resistance of the fixed voltage sources. Channels fed
        // through a resistor node contribute at step time instead.
        self.r_total_static = 0.0;
        for ch in 0..self.size() {
            self.v_cap[ch] = 0.0;
            self.exponent_rc[ch] = 0.0;
            if self.desc.r_node[ch].is_some() {
                continue;
            }
            if self.desc.r[ch] != 0.0 {
                self.r_total_static += 1.0 / self.desc.r[ch];
            }
            if self.desc.c[ch] != 0.0 {
                let r = self.cap_series_r(self.desc.r[ch]);
                self.exponent_rc[ch] = rc_exponent(r, self.desc.c[ch], params.sample_rate);
            }
        }
        if self.topology == Topology::Resistor && self.desc.r_f != 0.0 {
            self.r_total_static += 1.0 / self.desc.r_f;
        }
        if self.topology == Topology::OpAmpWithRi {
            self.r_total_static += 1.0 / self.desc.r_i;
            self.gain_ri = self.desc.r_f / self.desc.r_i;
        }

        self.v_cap_f = 0.0;
        self.exponent_c_f = 0.0;
        if self.desc.c_f != 0.0 {
            // Both op-amp variants see r_f as the cap's series resistance
            // here; only the resistor network uses the parallel total.
            let r = match self.topology {
                Topology::Resistor => 1.0 / self.r_total_static,
                Topology::OpAmp | Topology::OpAmpWithRi => self.desc.r_f,
            };
            self.exponent_c_f = rc_exponent(r, self.desc.c_f, params.sample_rate);
        }

        self.v_cap_amp = 0.0;
        self.exponent_c_amp = 0.0;
        if self.desc.c_amp != 0.0 {
            self.exponent_c_amp = rc_exponent(AMP_IMPEDANCE, self.desc.c_amp, params.sample_rate);
        }

        0.0
    }

    pub(crate) fn step(&mut self, ins: &[f64], params: &SimParams) -> f64 {
        if ins[0] == 0.0 {
            return 0.0;
        }

        let size = self.size();
        let summing = self.topology == Topology::OpAmp;
        let mut r_total = self.r_total_static;
        let mut i = 0.0;

        // Resistor-node values arrive after the signal inputs, in channel
        // order.
        let mut r_node_slot = 1 + size;

        for ch in 0..size {
            let mut r_ch = self.desc.r[ch];
            let mut v = ins[1 + ch];
            let mut connected = true;

            if self.desc.r_node[ch].is_some() {
                let r_live = ins[r_node_slot];
                r_node_slot += 1;
                // A zero variable resistance disconnects the channel.
                if r_live == 0.0 {
                    connected = false;
                } else {
                    r_ch += r_live;
                    r_total += 1.0 / r_ch;
                    if self.desc.c[ch] != 0.0 {
                        let r = self.cap_series_r(r_ch);
                        self.exponent_rc[ch] =
                            rc_exponent(r, self.desc.c[ch], params.sample_rate);
                    }
                }
            }

            if connected {
                if self.desc.c[ch] != 0.0 {
                    // Input high pass.
                    self.v_cap[ch] +=
                        (v - self.desc.v_ref - self.v_cap[ch]) * self.exponent_rc[ch];
                    v -= self.v_cap[ch];
                }
                i += if summing { self.desc.v_ref - v } else { v } / r_ch;
            }
        }

        if self.topology == Topology::OpAmpWithRi {
            i += self.desc.v_ref / self.desc.r_i;
        }

        r_total = 1.0 / r_total;

        // Millman for the networks, summing formula for the plain op amp.
        let mut v = i * if summing { self.desc.r_f } else { r_total };

        if self.topology == Topology::OpAmpWithRi {
            v = self.desc.v_ref + self.gain_ri * (self.desc.v_ref - v);
        }

        if self.desc.c_f != 0.0 {
            if self.has_r_node {
                self.exponent_c_f = rc_exponent(r_total, self.desc.c_f, params.sample_rate);
            }
            self.v_cap_f += (v - self.desc.v_ref - self.v_cap_f) * self.exponent_c_f;
            v = self.v_cap_f;
        }

        if self.desc.c_amp != 0.0 {
            self.v_cap_amp += (v - self.v_cap_amp) * self.exponent_c_amp;
            v -= self.v_cap_amp;
        }

        v * self.desc.gain
    }
}

/// Diode OR mixer.
///
/// Inputs: `enable, junction drop, in0..` (up to 8). Output is the highest
/// input minus the diode junction voltage, floored at zero.
#[derive(Debug, Clone, Copy)]
pub struct DiodeMixer;

impl DiodeMixer {
    pub(crate) fn reset(&mut self, ins: &[f64]) -> f64 {
        self.step(ins)
    }

    pub(crate) fn step(&mut self, ins: &[f64]) -> f64 {
        if ins[0] == 0.0 {
            return 0.0;
        }
        let max = ins[2..].iter().cloned().fold(0.0, f64::max);
        (max - ins[1]).max(0.0)
    }
}
