//! R1-ladder DAC with capacitor smoothing.

use crate::error::{DiscreteError, Result};
use crate::graph::SimParams;
use crate::nodes::rc_exponent;

/// Most resistors a ladder table may carry.
pub const LADDER_MAX_RES: usize = 8;

/// Static description of an R1 resistor ladder.
///
/// A zero resistor means "no resistor present" for that bit; a zero
/// `r_bias`/`r_gnd`/`c_filter` disables that part of the circuit.
#[derive(Debug, Clone)]
pub struct DacR1Ladder {
    /// One resistor per data bit, lowest bit first.
    pub r: Vec<f64>,
    /// Bias resistor to `v_bias` (0 for none).
    pub r_bias: f64,
    /// Bias voltage.
    pub v_bias: f64,
    /// Resistor to ground (0 for none).
    pub r_gnd: f64,
    /// Smoothing capacitor on the summing node (0 for none).
    pub c_filter: f64,
}

/// R1 Ladder DAC with cap smoothing.
///
/// Inputs: `enable, data, vON` (the data-on voltage, 3.4 for TTL). The
/// fractional part of the data input is treated as intra-sample switch time
/// and used to anti-alias bits that changed this tick.
///
/// When disabled the output voltage is left where it was.
#[derive(Debug, Clone)]
pub struct DacR1 {
    ladder: DacR1Ladder,
    // derived at reset
    i_bias: f64,
    exponent: f64,
    r_total: f64,
    last_data: i64,
}

impl DacR1 {
    pub(crate) fn new(ladder: DacR1Ladder) -> Result<Self> {
        // You need at least 2 resistors for a ladder.
        if ladder.r.len() < 2 || ladder.r.len() > LADDER_MAX_RES {
            return Err(DiscreteError::LadderLength {
                len: ladder.r.len(),
                max: LADDER_MAX_RES,
            });
        }
        Ok(Self {
            ladder,
            i_bias: 0.0,
            exponent: 0.0,
            r_total: 0.0,
            last_data: 0,
        })
    }

    pub(crate) fn reset(&mut self, params: &SimParams) -> f64 {
        let info = &self.ladder;

        // Millman current of the bias circuit.
        self.i_bias = if info.r_bias != 0.0 {
            info.v_bias / info.r_bias
        } else {
            0.0
        };

        // Total of all resistors in parallel: the combined resistance of the
        // voltage sources, used for the charging curve.
        let mut r_total = 0.0;
        for &r in &info.r {
            if r != 0.0 {
                r_total += 1.0 / r;
            }
        }
        if info.r_bias != 0.0 {
            r_total += 1.0 / info.r_bias;
        }
        if info.r_gnd != 0.0 {
            r_total += 1.0 / info.r_gnd;
        }
        self.r_total = 1.0 / r_total;

        if info.c_filter != 0.0 {
            self.exponent = rc_exponent(self.r_total, info.c_filter, params.sample_rate);
        }

        self.last_data = 0;
        0.0
    }

    pub(crate) fn step(&mut self, ins: &[f64], out: f64) -> f64 {
        if ins[0] == 0.0 {
            // Disabled: leave the voltage where it was.
            return out;
        }

        let info = &self.ladder;
        let data = ins[1] as i64;
        let x_time = ins[1] - data as f64;
        let v_on = ins[2];

        let mut i_total = self.i_bias;
        for (bit, &r) in info.r.iter().enumerate() {
            // Add up currents of ON circuits per Millman; no resistor means
            // no contribution.
            if r == 0.0 {
                continue;
            }
            let mut i_bit = v_on / r;
            let bit_val = (data >> bit) & 1;
            if x_time != 0.0 && bit_val != (self.last_data >> bit) & 1 {
                // The bit switched partway through the sample: weight the
                // current by the time it spent on.
                i_bit *= if bit_val != 0 { x_time } else { 1.0 - x_time };
            } else if bit_val == 0 {
                i_bit = 0.0;
            }
            i_total += i_bit;
        }
        self.last_data = data;

        let v = i_total * self.r_total;

        // Filter if needed, else just output the voltage.
        if info.c_filter != 0.0 {
            out + (v - out) * self.exponent
        } else {
            v
        }
    }
}
