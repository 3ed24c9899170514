//! Norton op-amp stages: integrator, general amp, one-shot and the
//! triggered VCA.
//!
//! Norton amps balance currents, not voltages. Every input pin sits one
//! base-emitter drop above ground, so a source `v` through `r` injects
//! `(v - OP_AMP_NORTON_VBE) / r`, floored at zero because the input
//! transistor cannot conduct backwards. Output current times the load
//! resistor gives the voltage, clamped below the positive rail.

use crate::graph::SimParams;
use crate::nodes::rc_exponent;

/// Base-emitter drop of a Norton amp input pin.
pub const OP_AMP_NORTON_VBE: f64 = 0.5;

/// How far below the positive rail a conventional op-amp output swings.
pub const OP_AMP_VP_RAIL_OFFSET: f64 = 1.5;

/// Selects how a stage combines its trigger inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TriggerFn {
    #[default]
    Trig0,
    Trig0Inv,
    Trig1,
    Trig1Inv,
    Trig2,
    Trig2Inv,
    Trig01And,
    Trig01Nand,
}

impl TriggerFn {
    pub fn eval(self, trig0: bool, trig1: bool, trig2: bool) -> bool {
        match self {
            TriggerFn::Trig0 => trig0,
            TriggerFn::Trig0Inv => !trig0,
            TriggerFn::Trig1 => trig1,
            TriggerFn::Trig1Inv => !trig1,
            TriggerFn::Trig2 => trig2,
            TriggerFn::Trig2Inv => !trig2,
            TriggerFn::Trig01And => trig0 && trig1,
            TriggerFn::Trig01Nand => !(trig0 && trig1),
        }
    }
}

/// Integrator circuit variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegrateKind {
    /// Conventional op amp, one trigger: trigger high slams the output to
    /// its maximum, low lets the cap discharge at a fixed rate.
    OpAmp1,
    /// Norton amp, one trigger used as the charging voltage.
    OpAmp1Norton,
    /// Norton amp, two triggers gated through [`TriggerFn`]s.
    OpAmp2Norton,
}

/// Static description of an [`Integrate`] stage.
#[derive(Debug, Clone, Copy)]
pub struct IntegrateInfo {
    pub kind: IntegrateKind,
    pub r1: f64,
    pub r2: f64,
    pub r3: f64,
    pub c: f64,
    /// Voltage of the input source.
    pub v1: f64,
    /// Positive supply rail.
    pub v_p: f64,
    pub f0: TriggerFn,
    pub f1: TriggerFn,
    pub f2: TriggerFn,
}

/// Op-amp integrator. Inputs: `trig0` (and `trig1` for the two-trigger
/// Norton variant).
#[derive(Debug, Clone, Copy)]
pub struct Integrate {
    info: IntegrateInfo,
    v_max_out: f64,
    v_max_in: f64,
    v_max_in_d: f64,
    /// Discharge per tick of the conventional variant.
    change: f64,
}

impl Integrate {
    pub(crate) fn new(info: IntegrateInfo) -> Self {
        Self {
            info,
            v_max_out: 0.0,
            v_max_in: 0.0,
            v_max_in_d: 0.0,
            change: 0.0,
        }
    }

    pub(crate) fn input_range(&self) -> (usize, usize) {
        match self.info.kind {
            IntegrateKind::OpAmp2Norton => (2, 2),
            _ => (1, 1),
        }
    }

    pub(crate) fn reset(&mut self, params: &SimParams) -> f64 {
        let info = self.info;
        match info.kind {
            IntegrateKind::OpAmp1 => {
                self.v_max_out = info.v_p - OP_AMP_VP_RAIL_OFFSET;
                // r2/r3 divider sets the reference, r1 the charge current.
                let v_ref = info.v1 * info.r3 / (info.r2 + info.r3);
                let i = (info.v1 - v_ref) / info.r1;
                self.change = i / params.sample_rate / info.c;
            }
            IntegrateKind::OpAmp1Norton | IntegrateKind::OpAmp2Norton => {
                self.v_max_out = info.v_p - OP_AMP_NORTON_VBE;
                self.v_max_in = info.v1 - OP_AMP_NORTON_VBE;
                self.v_max_in_d = self.v_max_in - OP_AMP_NORTON_VBE;
            }
        }
        0.0
    }

    pub(crate) fn step(&mut self, ins: &[f64], out: f64, params: &SimParams) -> f64 {
        let info = self.info;
        let mut out = out;
        match info.kind {
            IntegrateKind::OpAmp1 => {
                if ins[0] != 0.0 {
                    // Cap forced to full charge.
                    return self.v_max_out;
                }
                out -= self.change;
            }
            IntegrateKind::OpAmp1Norton => {
                let i_neg = self.v_max_in / info.r1;
                let i_pos = ((ins[0] - OP_AMP_NORTON_VBE) / info.r2).max(0.0);
                out += (i_pos - i_neg) / params.sample_rate / info.c;
            }
            IntegrateKind::OpAmp2Norton => {
                let trig0 = ins[0] as i32 != 0;
                let trig1 = ins[1] as i32 != 0;
                let i_neg = if info.f0.eval(trig0, trig1, false) {
                    self.v_max_in_d / info.r1
                } else {
                    0.0
                };
                let mut i_pos = if info.f1.eval(trig0, trig1, false) {
                    self.v_max_in / info.r2
                } else {
                    0.0
                };
                if info.f2.eval(trig0, trig1, false) {
                    i_pos += self.v_max_in_d / info.r3;
                }
                out += (i_pos - i_neg) / params.sample_rate / info.c;
            }
        }
        out.clamp(0.0, self.v_max_out)
    }
}

/// Static description of an [`OpAmp`] stage.
///
/// `r1` of 0 drops the inverting signal path, `r4` of 0 makes the cap
/// charge linear, `c` of 0 removes the cap entirely.
#[derive(Debug, Clone, Copy)]
pub struct OpAmpInfo {
    pub r1: f64,
    pub r2: f64,
    pub r3: f64,
    pub r4: f64,
    pub c: f64,
    /// Negative output clamp.
    pub v_n: f64,
    /// Positive supply rail.
    pub v_p: f64,
}

/// General Norton op-amp stage. Inputs: `enable, in0, in1`.
#[derive(Debug, Clone, Copy)]
pub struct OpAmp {
    info: OpAmpInfo,
    i_fixed: f64,
    v_max: f64,
    v_cap: f64,
    exponent: f64,
}

impl OpAmp {
    pub(crate) fn new(info: OpAmpInfo) -> Self {
        Self {
            info,
            i_fixed: 0.0,
            v_max: 0.0,
            v_cap: 0.0,
            exponent: 0.0,
        }
    }

    pub(crate) fn reset(&mut self, params: &SimParams) -> f64 {
        let info = self.info;
        self.v_max = info.v_p - OP_AMP_NORTON_VBE;
        self.v_cap = 0.0;
        if info.c > 0.0 {
            if info.r4 > 0.0 {
                self.exponent = rc_exponent(info.r4, info.c, params.sample_rate);
            } else {
                // Linear charge, amps per volt per tick.
                self.exponent = params.sample_rate * info.c;
            }
        }
        self.i_fixed = if info.r3 > 0.0 {
            (info.v_p - OP_AMP_NORTON_VBE) / info.r3
        } else {
            0.0
        };
        0.0
    }

    pub(crate) fn step(&mut self, ins: &[f64]) -> f64 {
        let info = self.info;
        if ins[0] == 0.0 {
            return 0.0;
        }

        let mut i_neg = 0.0;
        if info.r1 > 0.0 {
            i_neg = ((ins[1] - OP_AMP_NORTON_VBE) / info.r1).max(0.0);
        }
        i_neg += self.i_fixed;

        let i_pos = ((ins[2] - OP_AMP_NORTON_VBE) / info.r2).max(0.0);

        let mut i = i_pos - i_neg;
        let mut out;
        if info.c > 0.0 {
            if info.r4 > 0.0 {
                // Voltage across r4 charges the cap exponentially.
                i *= info.r4;
                self.v_cap += (i - self.v_cap) * self.exponent;
            } else {
                self.v_cap += i / self.exponent;
            }
            out = self.v_cap;
        } else {
            out = i * info.r4;
        }

        if out > self.v_max {
            out = self.v_max;
        } else if out < info.v_n {
            out = info.v_n;
        }
        self.v_cap = out;
        out
    }
}

/// Static description of an [`OpAmpOneShot`].
#[derive(Debug, Clone, Copy)]
pub struct OpAmpOneShotInfo {
    pub r1: f64,
    pub r2: f64,
    pub r3: f64,
    pub r4: f64,
    pub r5: f64,
    pub c1: f64,
    pub c2: f64,
    /// Negative output clamp.
    pub v_n: f64,
    /// Positive supply rail.
    pub v_p: f64,
}

/// Norton op-amp one-shot. Input: `trigger`.
///
/// The trigger couples in through c2/r2, feedback through r5 holds the
/// output up while the timing cap c1 charges through r3/r4 toward the
/// level that flips it back.
#[derive(Debug, Clone, Copy)]
pub struct OpAmpOneShot {
    info: OpAmpOneShotInfo,
    i_fixed: f64,
    v_max: f64,
    r34_ratio: f64,
    v_cap1: f64,
    v_cap2: f64,
    exponent1c: f64,
    exponent1d: f64,
    exponent2: f64,
}

impl OpAmpOneShot {
    pub(crate) fn new(info: OpAmpOneShotInfo) -> Self {
        Self {
            info,
            i_fixed: 0.0,
            v_max: 0.0,
            r34_ratio: 0.0,
            v_cap1: 0.0,
            v_cap2: 0.0,
            exponent1c: 0.0,
            exponent1d: 0.0,
            exponent2: 0.0,
        }
    }

    pub(crate) fn reset(&mut self, params: &SimParams) -> f64 {
        let info = self.info;
        let r34 = 1.0 / (1.0 / info.r3 + 1.0 / info.r4);
        self.exponent1c = rc_exponent(r34, info.c1, params.sample_rate);
        self.exponent1d = rc_exponent(info.r4, info.c1, params.sample_rate);
        self.exponent2 = rc_exponent(info.r2, info.c2, params.sample_rate);
        self.i_fixed = (info.v_p - OP_AMP_NORTON_VBE) / info.r1;
        self.v_cap1 = 0.0;
        self.v_cap2 = 0.0;
        self.v_max = info.v_p - OP_AMP_NORTON_VBE;
        self.r34_ratio = info.r3 / (info.r3 + info.r4);
        0.0
    }

    pub(crate) fn step(&mut self, ins: &[f64], out: f64) -> f64 {
        let info = self.info;
        let trigger = ins[0];

        // Trigger edge couples through c2; r5 feeds the output back.
        let mut i_pos = (trigger - self.v_cap2) / info.r2;
        i_pos += out / info.r5;
        self.v_cap2 += (trigger - self.v_cap2) * self.exponent2;

        let mut i_neg = ((self.v_cap1 - OP_AMP_NORTON_VBE) / info.r3).max(0.0);
        i_neg += self.i_fixed;

        let out = if i_pos > i_neg { self.v_max } else { info.v_n };

        // Voltage at the diode anode while discharging.
        let v = out + 0.6;
        if self.v_cap1 > out {
            if self.v_cap1 > v {
                // Diode shorts the cap down to one drop above the output.
                self.v_cap1 = v;
            } else {
                self.v_cap1 += (out - self.v_cap1) * self.exponent1d;
            }
        } else {
            self.v_cap1 += ((out - OP_AMP_NORTON_VBE) * self.r34_ratio + OP_AMP_NORTON_VBE
                - self.v_cap1)
                * self.exponent1c;
        }
        out
    }
}

/// Static description of a [`TvcaOpAmp`].
///
/// `r9` of 0 drops the second trigger-shaped current path, `r11` the
/// third. `r6` of 0 leaves the fast-discharge exponent unused.
#[derive(Debug, Clone, Copy)]
pub struct TvcaInfo {
    pub r1: f64,
    pub r2: f64,
    pub r3: f64,
    pub r4: f64,
    pub r5: f64,
    pub r6: f64,
    pub r7: f64,
    pub r8: f64,
    pub r9: f64,
    pub r10: f64,
    pub r11: f64,
    pub c1: f64,
    pub c2: f64,
    pub c3: f64,
    pub v1: f64,
    pub v2: f64,
    pub v3: f64,
    /// Positive supply rail.
    pub v_p: f64,
    pub f0: TriggerFn,
    pub f1: TriggerFn,
    pub f2: TriggerFn,
    pub f3: TriggerFn,
    pub f4: TriggerFn,
    pub f5: TriggerFn,
}

/// Triggered Norton op-amp VCA. Inputs: `trig0, trig1, trig2, in0, in1`.
///
/// The envelope cap c1 charges through r5 while f2 holds the charge path
/// up and discharges through r6 (f3 low) or r6+r7 (f3 high). Its current
/// into the + pin scales the gated input currents to shape the output.
#[derive(Debug, Clone)]
pub struct TvcaOpAmp {
    info: TvcaInfo,
    r67: f64,
    i_fixed: f64,
    v_out_max: f64,
    v_trig: [f64; 2],
    v_trig2: f64,
    v_trig3: f64,
    v_cap1: f64,
    v_cap2: f64,
    v_cap3: f64,
    exponent_c: [f64; 2],
    exponent_d: [f64; 2],
    exponent2: [f64; 2],
    exponent3: [f64; 2],
}

impl TvcaOpAmp {
    pub(crate) fn new(info: TvcaInfo) -> Self {
        Self {
            info,
            r67: 0.0,
            i_fixed: 0.0,
            v_out_max: 0.0,
            v_trig: [0.0; 2],
            v_trig2: 0.0,
            v_trig3: 0.0,
            v_cap1: 0.0,
            v_cap2: 0.0,
            v_cap3: 0.0,
            exponent_c: [0.0; 2],
            exponent_d: [0.0; 2],
            exponent2: [0.0; 2],
            exponent3: [0.0; 2],
        }
    }

    pub(crate) fn reset(&mut self, ins: &[f64], params: &SimParams) -> f64 {
        let info = self.info;
        self.r67 = info.r6 + info.r7;
        self.v_out_max = info.v_p - OP_AMP_NORTON_VBE;

        // Trigger voltage after the diode drop, divided down by r5 against
        // the discharge network (f3 low: r6 to ground, f3 high: r6+r7 one
        // VBE up).
        self.v_trig[0] = (info.v1 - 0.6) * (info.r6 / (info.r6 + info.r5));
        self.v_trig[1] = (info.v1 - 0.6 - OP_AMP_NORTON_VBE) * (self.r67 / (self.r67 + info.r5))
            + OP_AMP_NORTON_VBE;
        self.i_fixed = self.v_out_max / info.r1;

        self.v_cap1 = 0.0;
        let r5_r6 = 1.0 / (1.0 / info.r5 + 1.0 / info.r6);
        let r5_r67 = 1.0 / (1.0 / info.r5 + 1.0 / self.r67);
        self.exponent_c[0] = rc_exponent(r5_r6, info.c1, params.sample_rate);
        self.exponent_c[1] = rc_exponent(r5_r67, info.c1, params.sample_rate);
        self.exponent_d[1] = rc_exponent(self.r67, info.c1, params.sample_rate);
        if info.r6 != 0.0 {
            self.exponent_d[0] = rc_exponent(info.r6, info.c1, params.sample_rate);
        }

        self.v_cap2 = 0.0;
        if info.r9 != 0.0 {
            self.v_trig2 = (info.v2 - 0.6 - OP_AMP_NORTON_VBE) * (info.r9 / (info.r8 + info.r9));
            self.exponent2[0] = rc_exponent(info.r9, info.c2, params.sample_rate);
            let r8_r9 = 1.0 / (1.0 / info.r8 + 1.0 / info.r9);
            self.exponent2[1] = rc_exponent(r8_r9, info.c2, params.sample_rate);
        }

        self.v_cap3 = 0.0;
        if info.r11 != 0.0 {
            self.v_trig3 =
                (info.v3 - 0.6 - OP_AMP_NORTON_VBE) * (info.r11 / (info.r10 + info.r11));
            self.exponent3[0] = rc_exponent(info.r11, info.c3, params.sample_rate);
            let r10_r11 = 1.0 / (1.0 / info.r10 + 1.0 / info.r11);
            self.exponent3[1] = rc_exponent(r10_r11, info.c3, params.sample_rate);
        }

        self.step(ins)
    }

    pub(crate) fn step(&mut self, ins: &[f64]) -> f64 {
        let info = self.info;
        let trig0 = ins[0] as i32 != 0;
        let trig1 = ins[1] as i32 != 0;
        let trig2 = ins[2] as i32 != 0;
        let f3 = info.f3.eval(trig0, trig1, trig2);
        let f3_idx = f3 as usize;

        let mut i_neg = self.i_fixed;
        if info.r2 != 0.0 && info.f0.eval(trig0, trig1, trig2) {
            i_neg += ((ins[3] - OP_AMP_NORTON_VBE) / info.r2).max(0.0);
        }
        if info.r3 != 0.0 && info.f1.eval(trig0, trig1, trig2) {
            i_neg += ((ins[4] - OP_AMP_NORTON_VBE) / info.r3).max(0.0);
        }

        if info.f2.eval(trig0, trig1, trig2) {
            // Charge path through r5 is up.
            self.v_cap1 += (self.v_trig[f3_idx] - self.v_cap1) * self.exponent_c[f3_idx];
        } else {
            // The diode takes r5 out of circuit. Discharge through r6 to
            // ground, or r6+r7 to one VBE when f3 is high.
            let target = if f3 { OP_AMP_NORTON_VBE } else { 0.0 };
            self.v_cap1 += (target - self.v_cap1) * self.exponent_d[f3_idx];
        }

        let mut i_pos = (self.v_cap1 - OP_AMP_NORTON_VBE) / self.r67;
        if i_pos < 0.0 || !f3 {
            i_pos = 0.0;
        }

        if info.r9 != 0.0 {
            let f4 = info.f4.eval(trig0, trig1, trig2);
            let target = if f4 { self.v_trig2 } else { 0.0 };
            self.v_cap2 += (target - self.v_cap2) * self.exponent2[f4 as usize];
            i_pos += self.v_cap2 / info.r9;
        }

        if info.r11 != 0.0 {
            let f5 = info.f5.eval(trig0, trig1, trig2);
            let target = if f5 { self.v_trig3 } else { 0.0 };
            self.v_cap3 += (target - self.v_cap3) * self.exponent3[f5 as usize];
            i_pos += self.v_cap3 / info.r11;
        }

        let i_out = (i_pos - i_neg).max(0.0);
        (i_out * info.r4).min(self.v_out_max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::test_util::run_element;
    use crate::nodes::Element;
    use approx::assert_relative_eq;

    const SR: f64 = 48_000.0;

    #[test]
    fn trigger_functions_cover_the_selector_table() {
        use TriggerFn::*;
        assert!(Trig0.eval(true, false, false));
        assert!(!Trig0Inv.eval(true, false, false));
        assert!(Trig1.eval(false, true, false));
        assert!(Trig2Inv.eval(false, false, false));
        assert!(Trig01And.eval(true, true, false));
        assert!(!Trig01And.eval(true, false, false));
        assert!(Trig01Nand.eval(true, false, false));
        assert!(!Trig01Nand.eval(true, true, false));
    }

    fn norton1_info() -> IntegrateInfo {
        IntegrateInfo {
            kind: IntegrateKind::OpAmp1Norton,
            r1: 100_000.0,
            r2: 10_000.0,
            r3: 0.0,
            c: 1e-6,
            v1: 12.0,
            v_p: 12.0,
            f0: TriggerFn::Trig0,
            f1: TriggerFn::Trig0,
            f2: TriggerFn::Trig0,
        }
    }

    #[test]
    fn norton_integrator_ramps_linearly() {
        let mut e = Element::integrate(norton1_info());
        // i_neg = 11.5/100k = 115 uA, i_pos = (5 - 0.5)/10k = 450 uA,
        // so dv/tick = 335e-6 / 48000 / 1e-6.
        let rows: Vec<Vec<f64>> = (0..10).map(|_| vec![5.0]).collect();
        let out = run_element(&mut e, &rows, SR);
        let dv = (450e-6 - 115e-6) / SR / 1e-6;
        assert_relative_eq!(out[0], dv, max_relative = 1e-9);
        assert_relative_eq!(out[9], 10.0 * dv, max_relative = 1e-9);
    }

    #[test]
    fn norton_integrator_clamps_at_zero_and_rail() {
        let mut e = Element::integrate(norton1_info());
        // No trigger voltage: i_pos would be negative, so it is floored
        // and only i_neg pulls the output down. Already at 0, it stays.
        let out = run_element(&mut e, &[vec![0.0], vec![0.0]], SR);
        assert_eq!(out[1], 0.0);

        // Saturate upward against vP - VBE.
        let rows: Vec<Vec<f64>> = (0..2_000).map(|_| vec![12.0]).collect();
        let out = run_element(&mut e, &rows, SR);
        assert_relative_eq!(*out.last().unwrap(), 11.5, max_relative = 1e-12);
    }

    #[test]
    fn conventional_integrator_forces_full_charge_on_trigger() {
        let info = IntegrateInfo {
            kind: IntegrateKind::OpAmp1,
            r1: 10_000.0,
            r2: 10_000.0,
            r3: 10_000.0,
            c: 1e-5,
            v1: 12.0,
            v_p: 12.0,
            f0: TriggerFn::Trig0,
            f1: TriggerFn::Trig0,
            f2: TriggerFn::Trig0,
        };
        let mut e = Element::integrate(info);
        let out = run_element(
            &mut e,
            &[vec![1.0], vec![1.0], vec![0.0], vec![0.0]],
            SR,
        );
        assert_eq!(out[0], 10.5);
        assert_eq!(out[1], 10.5);
        // v_ref = 6 V, charge current 0.6 mA, discharge per tick follows.
        let change = (12.0 - 6.0) / 10_000.0 / SR / 1e-5;
        assert_relative_eq!(out[2], 10.5 - change, max_relative = 1e-9);
        assert_relative_eq!(out[3], 10.5 - 2.0 * change, max_relative = 1e-9);
    }

    #[test]
    fn two_trigger_integrator_gates_its_current_sources() {
        let info = IntegrateInfo {
            kind: IntegrateKind::OpAmp2Norton,
            r1: 100_000.0,
            r2: 10_000.0,
            r3: 20_000.0,
            c: 1e-6,
            v1: 12.0,
            v_p: 12.0,
            f0: TriggerFn::Trig0,
            f1: TriggerFn::Trig1,
            f2: TriggerFn::Trig01And,
        };
        let mut e = Element::integrate(info);
        // trig1 only: the charge source through r2 runs alone.
        let out = run_element(&mut e, &[vec![0.0, 1.0]], SR);
        let dv = (11.5 / 10_000.0) / SR / 1e-6;
        assert_relative_eq!(out[0], dv, max_relative = 1e-9);
    }

    fn amp_info() -> OpAmpInfo {
        OpAmpInfo {
            r1: 10_000.0,
            r2: 10_000.0,
            r3: 100_000.0,
            r4: 20_000.0,
            c: 0.0,
            v_n: 0.0,
            v_p: 12.0,
        }
    }

    #[test]
    fn norton_amp_converts_current_difference_to_voltage() {
        let mut e = Element::op_amp(amp_info());
        // i_neg = (1 - 0.5)/10k + 11.5/100k, i_pos = (4.5 - 0.5)/10k.
        let out = run_element(&mut e, &[vec![1.0, 1.0, 4.5]], SR);
        let i = 400e-6 - (50e-6 + 115e-6);
        assert_relative_eq!(out[0], i * 20_000.0, max_relative = 1e-9);
    }

    #[test]
    fn norton_amp_clamps_to_rails() {
        let mut e = Element::op_amp(amp_info());
        // Heavy positive drive saturates at vP - VBE.
        let out = run_element(&mut e, &[vec![1.0, 0.0, 12.0]], SR);
        assert_eq!(out[0], 11.5);
        // Net negative drive clamps at vN.
        let out = run_element(&mut e, &[vec![1.0, 12.0, 0.0]], SR);
        assert_eq!(out[0], 0.0);
    }

    #[test]
    fn norton_amp_cap_smooths_the_response() {
        let mut info = amp_info();
        info.c = 1e-6;
        let mut e = Element::op_amp(info);
        let rows: Vec<Vec<f64>> = (0..20_000).map(|_| vec![1.0, 1.0, 4.5]).collect();
        let out = run_element(&mut e, &rows, SR);
        let target = (400e-6 - 165e-6) * 20_000.0;
        // First tick is one exponential charge step.
        let exp = crate::nodes::rc_exponent(20_000.0, 1e-6, SR);
        assert_relative_eq!(out[0], target * exp, max_relative = 1e-9);
        assert_relative_eq!(*out.last().unwrap(), target, max_relative = 1e-6);
    }

    fn one_shot_info() -> OpAmpOneShotInfo {
        OpAmpOneShotInfo {
            r1: 10_000.0,
            r2: 10_000.0,
            r3: 10_000.0,
            r4: 10_000.0,
            r5: 10_000.0,
            c1: 1e-6,
            c2: 1e-7,
            v_n: 0.0,
            v_p: 5.0,
        }
    }

    #[test]
    fn op_amp_one_shot_pulses_and_self_resets() {
        let mut e = Element::op_amp_one_shot(one_shot_info());
        let mut rows = vec![vec![0.0]; 5];
        rows.extend(std::iter::repeat(vec![5.0]).take(1000));
        let out = run_element(&mut e, &rows, SR);
        // Quiet before the trigger.
        assert!(out[..5].iter().all(|&v| v == 0.0));
        // The trigger edge flips the output to the rail.
        assert_eq!(out[5], 4.5);
        assert_eq!(out[6], 4.5);
        // The timing cap eventually flips it back, trigger still held.
        assert_eq!(*out.last().unwrap(), 0.0);
        // And it is a single pulse, no re-fire while held high.
        let first_low = out[5..].iter().position(|&v| v == 0.0).unwrap() + 5;
        assert!(out[first_low..].iter().all(|&v| v == 0.0));
    }

    fn tvca_envelope_info() -> TvcaInfo {
        // Only the envelope path: no input resistors, no extra trigger
        // caps, negligible fixed current.
        TvcaInfo {
            r1: 1e9,
            r2: 0.0,
            r3: 0.0,
            r4: 10_000.0,
            r5: 1_000.0,
            r6: 10_000.0,
            r7: 10_000.0,
            r8: 0.0,
            r9: 0.0,
            r10: 0.0,
            r11: 0.0,
            c1: 1e-5,
            c2: 0.0,
            c3: 0.0,
            v1: 5.0,
            v2: 0.0,
            v3: 0.0,
            v_p: 5.0,
            f0: TriggerFn::Trig0,
            f1: TriggerFn::Trig0,
            f2: TriggerFn::Trig0,
            f3: TriggerFn::Trig0,
            f4: TriggerFn::Trig0,
            f5: TriggerFn::Trig0,
        }
    }

    #[test]
    fn tvca_envelope_attacks_toward_its_trigger_level() {
        let mut e = Element::tvca_op_amp(tvca_envelope_info());
        let rows: Vec<Vec<f64>> = (0..20_000).map(|_| vec![1.0, 0.0, 0.0, 0.0, 0.0]).collect();
        let out = run_element(&mut e, &rows, SR);
        // Monotone attack.
        assert!(out[0] < out[100]);
        assert!(out[100] < out[1000]);
        // Steady state: cap at v_trig[1], its current through r6+r7 minus
        // the (negligible) fixed current, times r4.
        let r67 = 20_000.0;
        let v_trig1 = (5.0 - 0.6 - 0.5) * (r67 / (r67 + 1_000.0)) + 0.5;
        let target = ((v_trig1 - 0.5) / r67 - 4.5 / 1e9) * 10_000.0;
        assert_relative_eq!(*out.last().unwrap(), target, max_relative = 1e-3);
    }

    #[test]
    fn tvca_decays_to_silence_when_the_trigger_drops() {
        let mut e = Element::tvca_op_amp(tvca_envelope_info());
        let mut rows: Vec<Vec<f64>> = (0..5_000).map(|_| vec![1.0, 0.0, 0.0, 0.0, 0.0]).collect();
        rows.extend((0..5_000).map(|_| vec![0.0, 0.0, 0.0, 0.0, 0.0]));
        let out = run_element(&mut e, &rows, SR);
        assert!(out[4_999] > 0.5);
        // f3 low forces the + pin current to zero immediately.
        assert_eq!(out[5_000], 0.0);
        assert_eq!(*out.last().unwrap(), 0.0);
    }
}
