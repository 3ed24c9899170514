//! Signal routing: switches, multiplexer and sample & hold.

use crate::diag::Diagnostics;

/// Two-pole switch with enable.
///
/// Inputs: `enable, select, in0, in1`.
#[derive(Debug, Clone, Copy)]
pub struct Switch;

impl Switch {
    pub(crate) fn step(&self, ins: &[f64]) -> f64 {
        if ins[0] != 0.0 {
            if ins[1] != 0.0 {
                ins[3]
            } else {
                ins[2]
            }
        } else {
            0.0
        }
    }
}

/// Analog switch: passes the input while the control exceeds a threshold.
///
/// Inputs: `enable, control, in, threshold`.
#[derive(Debug, Clone, Copy)]
pub struct AnalogSwitch;

impl AnalogSwitch {
    pub(crate) fn step(&self, ins: &[f64]) -> f64 {
        if ins[0] != 0.0 {
            if ins[1] > ins[3] {
                ins[2]
            } else {
                0.0
            }
        } else {
            0.0
        }
    }
}

/// 1-of-x multiplexer.
///
/// Inputs: `enable, address, in0..` (up to 8 channels). An address outside
/// the wired channels leaves the output untouched and reports a diagnostic.
#[derive(Debug, Clone, Copy)]
pub struct Multiplex {
    size: usize,
}

impl Multiplex {
    pub(crate) fn new() -> Self {
        Self { size: 0 }
    }

    pub(crate) fn reset(&mut self, ins: &[f64], diag: &mut Diagnostics<'_>) -> f64 {
        self.size = ins.len() - 2;
        self.step(ins, 0.0, diag)
    }

    pub(crate) fn step(&self, ins: &[f64], out: f64, diag: &mut Diagnostics<'_>) -> f64 {
        if ins[0] != 0.0 {
            let addr = ins[1] as i64;
            if addr >= 0 && (addr as usize) < self.size {
                ins[2 + addr as usize]
            } else {
                // Bad address. We will leave the output alone.
                diag.report(format_args!("address = {addr}, out of bounds"));
                out
            }
        } else {
            0.0
        }
    }
}

/// Clock type: track the input while the clock is rising.
pub const SAMPHOLD_REDGE: f64 = 0.0;
/// Clock type: track the input while the clock is falling.
pub const SAMPHOLD_FEDGE: f64 = 1.0;
/// Clock type: output follows the input while the clock is high.
pub const SAMPHOLD_HLATCH: f64 = 2.0;
/// Clock type: output follows the input while the clock is low.
pub const SAMPHOLD_LLATCH: f64 = 3.0;

/// Sample & hold.
///
/// Inputs: `enable, in, clock, clock type`. The clock type is latched at
/// reset; an unrecognized value reports a diagnostic on every active tick
/// and leaves the output unchanged.
#[derive(Debug, Clone, Copy)]
pub struct SampleHold {
    last_input: f64,
    clock_type: i32,
}

impl SampleHold {
    pub(crate) fn new() -> Self {
        Self {
            last_input: -1.0,
            clock_type: 0,
        }
    }

    pub(crate) fn reset(&mut self, ins: &[f64], diag: &mut Diagnostics<'_>) -> f64 {
        self.last_input = -1.0;
        // Latched here to save the cast every tick.
        self.clock_type = ins[3] as i32;
        self.step(ins, 0.0, diag)
    }

    pub(crate) fn step(&mut self, ins: &[f64], out: f64, diag: &mut Diagnostics<'_>) -> f64 {
        let clock = ins[2];
        let new_out = if ins[0] != 0.0 {
            match self.clock_type {
                0 if clock > self.last_input => ins[1],
                1 if clock < self.last_input => ins[1],
                2 if clock != 0.0 => ins[1],
                3 if clock == 0.0 => ins[1],
                0..=3 => out,
                other => {
                    diag.report(format_args!("invalid clock type {other}"));
                    out
                }
            }
        } else {
            0.0
        };
        self.last_input = clock;
        new_out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diag::CollectSink;
    use crate::nodes::test_util::{run_element, run_element_with_sink};
    use crate::nodes::Element;

    #[test]
    fn switch_selects_between_poles() {
        let mut e = Element::switch();
        let rows = [
            vec![1.0, 0.0, 3.0, 7.0],
            vec![1.0, 1.0, 3.0, 7.0],
            vec![0.0, 1.0, 3.0, 7.0],
        ];
        let out = run_element(&mut e, &rows, 48000.0);
        assert_eq!(out, vec![3.0, 7.0, 0.0]);
    }

    #[test]
    fn analog_switch_gates_on_threshold() {
        let mut e = Element::analog_switch();
        let rows = [
            vec![1.0, 2.5, 4.0, 2.0],
            vec![1.0, 1.5, 4.0, 2.0],
            vec![0.0, 2.5, 4.0, 2.0],
        ];
        let out = run_element(&mut e, &rows, 48000.0);
        assert_eq!(out, vec![4.0, 0.0, 0.0]);
    }

    #[test]
    fn multiplex_routes_by_address() {
        let mut e = Element::multiplex();
        let rows = [
            vec![1.0, 0.0, 10.0, 20.0, 30.0],
            vec![1.0, 2.0, 10.0, 20.0, 30.0],
        ];
        let out = run_element(&mut e, &rows, 48000.0);
        assert_eq!(out, vec![10.0, 30.0]);
    }

    #[test]
    fn multiplex_bad_address_holds_output_and_reports() {
        let mut e = Element::multiplex();
        let mut sink = CollectSink::new();
        let rows = [
            vec![1.0, 1.0, 10.0, 20.0, 30.0],
            vec![1.0, 5.0, 10.0, 20.0, 30.0],
            vec![1.0, -1.0, 10.0, 20.0, 30.0],
        ];
        let out = run_element_with_sink(&mut e, &rows, 48000.0, &mut sink);
        assert_eq!(out, vec![20.0, 20.0, 20.0]);
        // One diagnostic per bad tick.
        assert_eq!(sink.len(), 2);
        assert!(sink.messages()[0].contains("out of bounds"));
    }

    #[test]
    fn samphold_high_latch_tracks_while_clock_high() {
        let mut e = Element::sample_hold();
        let rows = [
            vec![1.0, 1.5, 1.0, SAMPHOLD_HLATCH],
            vec![1.0, 2.5, 1.0, SAMPHOLD_HLATCH],
            vec![1.0, 3.5, 0.0, SAMPHOLD_HLATCH],
        ];
        let out = run_element(&mut e, &rows, 48000.0);
        assert_eq!(out, vec![1.5, 2.5, 2.5]);
    }

    #[test]
    fn samphold_low_latch_tracks_while_clock_low() {
        let mut e = Element::sample_hold();
        let rows = [
            vec![1.0, 1.5, 0.0, SAMPHOLD_LLATCH],
            vec![1.0, 2.5, 1.0, SAMPHOLD_LLATCH],
        ];
        let out = run_element(&mut e, &rows, 48000.0);
        assert_eq!(out, vec![1.5, 1.5]);
    }

    #[test]
    fn samphold_rising_edge_tracks_while_clock_rises() {
        let mut e = Element::sample_hold();
        let rows = [
            vec![1.0, 1.0, 0.0, SAMPHOLD_REDGE],
            vec![1.0, 2.0, 1.0, SAMPHOLD_REDGE], // clock rising: track
            vec![1.0, 3.0, 1.0, SAMPHOLD_REDGE], // clock flat: hold
            vec![1.0, 4.0, 0.0, SAMPHOLD_REDGE], // clock falling: hold
        ];
        let out = run_element(&mut e, &rows, 48000.0);
        assert_eq!(out[1], 2.0);
        assert_eq!(out[2], 2.0);
        assert_eq!(out[3], 2.0);
    }

    #[test]
    fn samphold_falling_edge_tracks_while_clock_falls() {
        let mut e = Element::sample_hold();
        let rows = [
            vec![1.0, 1.0, 1.0, SAMPHOLD_FEDGE],
            vec![1.0, 2.0, 0.0, SAMPHOLD_FEDGE], // falling: track
            vec![1.0, 3.0, 1.0, SAMPHOLD_FEDGE], // rising: hold
        ];
        let out = run_element(&mut e, &rows, 48000.0);
        assert_eq!(out[1], 2.0);
        assert_eq!(out[2], 2.0);
    }

    #[test]
    fn samphold_unknown_clock_type_reports_and_holds() {
        let mut e = Element::sample_hold();
        let mut sink = CollectSink::new();
        let rows = [vec![1.0, 1.0, 1.0, 9.0], vec![1.0, 2.0, 0.0, 9.0]];
        let out = run_element_with_sink(&mut e, &rows, 48000.0, &mut sink);
        assert_eq!(out, vec![0.0, 0.0]);
        // reset() invokes one step, plus the two driven ticks
        assert_eq!(sink.len(), 3);
        assert!(sink.messages()[0].contains("invalid clock type"));
    }
}
