//! Logic gates and flip-flops.
//!
//! Gate outputs are 0.0 / 1.0 voltages; any non-zero input reads as logic
//! high. Clocked types store the previous tick's clock level every tick so
//! edges survive enable changes.

/// The boolean function a [`LogicGate`] computes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateOp {
    Inv,
    And,
    Nand,
    Or,
    Nor,
    Xor,
    Xnor,
}

/// Combinational logic gate with enable.
///
/// Inputs: `enable, in0..`. AND-family and OR-family gates take 1 to 4
/// inputs; unwired slots behave as the gate's identity value. XOR and XNOR
/// take exactly 2.
#[derive(Debug, Clone, Copy)]
pub struct LogicGate {
    op: GateOp,
}

impl LogicGate {
    pub(crate) fn new(op: GateOp) -> Self {
        Self { op }
    }

    pub(crate) fn name(&self) -> &'static str {
        match self.op {
            GateOp::Inv => "logic inverter",
            GateOp::And => "logic AND",
            GateOp::Nand => "logic NAND",
            GateOp::Or => "logic OR",
            GateOp::Nor => "logic NOR",
            GateOp::Xor => "logic XOR",
            GateOp::Xnor => "logic XNOR",
        }
    }

    pub(crate) fn input_range(&self) -> (usize, usize) {
        match self.op {
            GateOp::Inv => (2, 2),
            GateOp::Xor | GateOp::Xnor => (3, 3),
            _ => (2, 5),
        }
    }

    pub(crate) fn step(&self, ins: &[f64]) -> f64 {
        if ins[0] == 0.0 {
            return 0.0;
        }
        let bits = ins[1..].iter().map(|&v| v != 0.0);
        let result = match self.op {
            GateOp::Inv => ins[1] == 0.0,
            GateOp::And => bits.fold(true, |acc, b| acc && b),
            GateOp::Nand => !ins[1..].iter().all(|&v| v != 0.0),
            GateOp::Or => bits.fold(false, |acc, b| acc || b),
            GateOp::Nor => !ins[1..].iter().any(|&v| v != 0.0),
            GateOp::Xor => (ins[1] != 0.0) ^ (ins[2] != 0.0),
            GateOp::Xnor => !((ins[1] != 0.0) ^ (ins[2] != 0.0)),
        };
        if result {
            1.0
        } else {
            0.0
        }
    }
}

/// D-type flip-flop.
///
/// Inputs: `enable, /reset, /set, clock, data`. Reset and set are
/// asynchronous, active low, and take priority over the clock. The data
/// voltage is latched unmodified on the rising clock edge, so a 5 V data
/// line yields a 5 V output.
#[derive(Debug, Clone, Copy)]
pub struct DFlipFlop {
    last_clk: i32,
}

impl DFlipFlop {
    pub(crate) fn new() -> Self {
        Self { last_clk: 0 }
    }

    pub(crate) fn reset(&mut self) -> f64 {
        self.last_clk = 0;
        0.0
    }

    pub(crate) fn step(&mut self, ins: &[f64], out: f64) -> f64 {
        let clk = ins[3] as i32;
        let new_out = if ins[0] != 0.0 {
            if ins[1] == 0.0 {
                // /reset asserted
                0.0
            } else if ins[2] == 0.0 {
                // /set asserted
                1.0
            } else if self.last_clk == 0 && clk != 0 {
                // low to high; the data voltage is latched as-is
                ins[4]
            } else {
                out
            }
        } else {
            0.0
        };
        self.last_clk = clk;
        new_out
    }
}

/// JK-type flip-flop.
///
/// Inputs: `enable, /reset, /set, clock, J, K`. Reset and set are
/// asynchronous, active low, with priority over the clock. The JK table
/// (hold / reset / set / toggle) is evaluated on the *falling* clock edge,
/// the opposite polarity from the D-type, as in the original circuits.
#[derive(Debug, Clone, Copy)]
pub struct JkFlipFlop {
    last_clk: i32,
}

impl JkFlipFlop {
    pub(crate) fn new() -> Self {
        Self { last_clk: 0 }
    }

    pub(crate) fn reset(&mut self) -> f64 {
        self.last_clk = 0;
        0.0
    }

    pub(crate) fn step(&mut self, ins: &[f64], out: f64) -> f64 {
        let clk = ins[3] as i32;
        let j = ins[4] != 0.0;
        let k = ins[5] != 0.0;
        let new_out = if ins[0] != 0.0 {
            if ins[1] == 0.0 {
                0.0
            } else if ins[2] == 0.0 {
                1.0
            } else if self.last_clk != 0 && clk == 0 {
                // high to low
                match (j, k) {
                    (false, false) => out,                                    // hold
                    (false, true) => 0.0,                                     // reset
                    (true, false) => 1.0,                                     // set
                    (true, true) => {
                        if out as i32 != 0 {
                            0.0
                        } else {
                            1.0
                        }
                    }                                                          // toggle
                }
            } else {
                out
            }
        } else {
            0.0
        };
        self.last_clk = clk;
        new_out
    }
}
