//! Arithmetic primitives: adder, component adder, clamp, divide, gain and
//! table lookup.
//!
//! All of these gate on input slot 0: when the enable is low the output is
//! forced to the type's disabled value (0 for everything here except the
//! clamp, which emits its dedicated clamp input).

use crate::diag::Diagnostics;
use crate::error::{DiscreteError, Result};

/// Multichannel adder with enable.
///
/// Inputs: `enable, in0..` (1 to 4 channels).
#[derive(Debug, Clone, Copy)]
pub struct Adder;

impl Adder {
    pub(crate) fn step(&self, ins: &[f64]) -> f64 {
        if ins[0] != 0.0 {
            ins[1..].iter().sum()
        } else {
            0.0
        }
    }
}

/// Which way the component-adder network combines its selected parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompAdderKind {
    /// Parallel capacitors: selected values add directly.
    ParallelCapacitor,
    /// Parallel resistors: selected values combine as 1 / Σ(1/r).
    ParallelResistor,
}

/// Static description of a selectable parallel component network.
#[derive(Debug, Clone)]
pub struct CompAdderTable {
    pub kind: CompAdderKind,
    /// Component always in circuit (0 for none).
    pub default: f64,
    /// One component per select bit, lowest bit first.
    pub values: Vec<f64>,
}

/// Selectable parallel component circuit.
///
/// Inputs: `enable, bit select`. Each set bit of the select value switches
/// the corresponding table component into the network.
#[derive(Debug, Clone)]
pub struct ComponentAdder {
    table: CompAdderTable,
}

impl ComponentAdder {
    pub(crate) fn new(table: CompAdderTable) -> Result<Self> {
        if table.values.is_empty() {
            return Err(DiscreteError::invalid_parameter(
                "component adder",
                "component table is empty",
            ));
        }
        Ok(Self { table })
    }

    pub(crate) fn step(&self, ins: &[f64]) -> f64 {
        if ins[0] == 0.0 {
            return 0.0;
        }
        let select = ins[1] as i64;
        match self.table.kind {
            CompAdderKind::ParallelCapacitor => {
                let mut total = self.table.default;
                for (bit, &c) in self.table.values.iter().enumerate() {
                    if select & (1 << bit) != 0 {
                        total += c;
                    }
                }
                total
            }
            CompAdderKind::ParallelResistor => {
                let mut total = if self.table.default != 0.0 {
                    1.0 / self.table.default
                } else {
                    0.0
                };
                for (bit, &r) in self.table.values.iter().enumerate() {
                    if select & (1 << bit) != 0 {
                        total += 1.0 / r;
                    }
                }
                if total != 0.0 {
                    1.0 / total
                } else {
                    0.0
                }
            }
        }
    }
}

/// Simple signal clamping circuit.
///
/// Inputs: `enable, in, min, max, clamp-when-disabled`.
#[derive(Debug, Clone, Copy)]
pub struct Clamp;

impl Clamp {
    pub(crate) fn step(&self, ins: &[f64]) -> f64 {
        if ins[0] != 0.0 {
            let (v, min, max) = (ins[1], ins[2], ins[3]);
            if v < min {
                min
            } else if v > max {
                max
            } else {
                v
            }
        } else {
            ins[4]
        }
    }
}

/// Programmable divider with enable.
///
/// Inputs: `enable, in, divisor`. A zero divisor maxes the output out
/// instead of breaking, and reports one diagnostic per occurrence.
#[derive(Debug, Clone, Copy)]
pub struct Divide;

impl Divide {
    pub(crate) fn step(&self, ins: &[f64], diag: &mut Diagnostics<'_>) -> f64 {
        if ins[0] != 0.0 {
            if ins[2] == 0.0 {
                diag.report(format_args!("divide by zero attempted"));
                f64::MAX
            } else {
                ins[1] / ins[2]
            }
        } else {
            0.0
        }
    }
}

/// Programmable gain with enable.
///
/// Inputs: `enable, in, gain, offset`.
#[derive(Debug, Clone, Copy)]
pub struct Gain;

impl Gain {
    pub(crate) fn step(&self, ins: &[f64]) -> f64 {
        if ins[0] != 0.0 {
            ins[1] * ins[2] + ins[3]
        } else {
            0.0
        }
    }
}

/// Table lookup.
///
/// Inputs: `enable, address`. An address outside the table outputs 0 and
/// reports a diagnostic.
#[derive(Debug, Clone)]
pub struct LookupTable {
    table: Vec<f64>,
}

impl LookupTable {
    pub(crate) fn new(table: Vec<f64>) -> Result<Self> {
        if table.is_empty() {
            return Err(DiscreteError::invalid_parameter(
                "lookup table",
                "table is empty",
            ));
        }
        Ok(Self { table })
    }

    pub(crate) fn step(&self, ins: &[f64], diag: &mut Diagnostics<'_>) -> f64 {
        if ins[0] == 0.0 {
            return 0.0;
        }
        let addr = ins[1] as i64;
        if addr < 0 || addr as usize >= self.table.len() {
            diag.report(format_args!(
                "address {} outside table of {}",
                addr,
                self.table.len()
            ));
            return 0.0;
        }
        self.table[addr as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::test_util::{run_element, run_element_with_sink};
    use crate::diag::CollectSink;
    use crate::nodes::Element;

    #[test]
    fn adder_sums_when_enabled() {
        let mut e = Element::adder();
        let out = run_element(&mut e, &[vec![1.0, 1.5, 2.5, -1.0, 0.5]], 48000.0);
        assert!((out[0] - 3.5).abs() < 1e-12);
    }

    #[test]
    fn adder_disabled_outputs_zero() {
        let mut e = Element::adder();
        let out = run_element(&mut e, &[vec![0.0, 1.5, 2.5, 3.0, 4.0]], 48000.0);
        assert_eq!(out[0], 0.0);
    }

    #[test]
    fn comp_adder_parallel_resistors() {
        let mut e = Element::component_adder(CompAdderTable {
            kind: CompAdderKind::ParallelResistor,
            default: 0.0,
            values: vec![1000.0, 1000.0],
        })
        .unwrap();
        // Both bits set: two 1k resistors in parallel = 500 ohms.
        let out = run_element(&mut e, &[vec![1.0, 3.0]], 48000.0);
        assert!((out[0] - 500.0).abs() < 1e-9);
    }

    #[test]
    fn comp_adder_parallel_capacitors() {
        let mut e = Element::component_adder(CompAdderTable {
            kind: CompAdderKind::ParallelCapacitor,
            default: 1e-7,
            values: vec![1e-6, 2e-6],
        })
        .unwrap();
        let out = run_element(&mut e, &[vec![1.0, 2.0]], 48000.0);
        // Bit 1 selected: default + c[1].
        assert!((out[0] - 2.1e-6).abs() < 1e-15);
    }

    #[test]
    fn comp_adder_rejects_empty_table() {
        let err = Element::component_adder(CompAdderTable {
            kind: CompAdderKind::ParallelResistor,
            default: 0.0,
            values: vec![],
        })
        .unwrap_err();
        assert!(matches!(err, DiscreteError::InvalidParameter { .. }));
    }

    #[test]
    fn clamp_limits_and_passes() {
        let mut e = Element::clamp();
        let rows = [
            vec![1.0, -3.0, -1.0, 1.0, 9.0],
            vec![1.0, 0.5, -1.0, 1.0, 9.0],
            vec![1.0, 2.0, -1.0, 1.0, 9.0],
            vec![0.0, 2.0, -1.0, 1.0, 9.0],
        ];
        let out = run_element(&mut e, &rows, 48000.0);
        assert_eq!(out, vec![-1.0, 0.5, 1.0, 9.0]);
    }

    #[test]
    fn divide_by_zero_maxes_out_and_reports_once_per_tick() {
        let mut e = Element::divide();
        let mut sink = CollectSink::new();
        let rows = [
            vec![1.0, 10.0, 2.0],
            vec![1.0, 10.0, 0.0],
            vec![1.0, 10.0, 4.0],
        ];
        let out = run_element_with_sink(&mut e, &rows, 48000.0, &mut sink);
        assert_eq!(out[0], 5.0);
        assert_eq!(out[1], f64::MAX);
        assert_eq!(out[2], 2.5); // simulation continues
        assert_eq!(sink.len(), 1);
        assert!(sink.messages()[0].contains("divide by zero"));
    }

    #[test]
    fn gain_applies_factor_and_offset() {
        let mut e = Element::gain();
        let out = run_element(&mut e, &[vec![1.0, 2.0, 3.0, 0.5], vec![0.0, 2.0, 3.0, 0.5]], 48000.0);
        assert_eq!(out, vec![6.5, 0.0]);
    }

    #[test]
    fn lookup_table_reads_and_reports_out_of_range() {
        let mut e = Element::lookup_table(vec![0.25, 0.5, 0.75]).unwrap();
        let mut sink = CollectSink::new();
        let rows = [vec![1.0, 1.0], vec![1.0, 5.0], vec![1.0, 2.0]];
        let out = run_element_with_sink(&mut e, &rows, 48000.0, &mut sink);
        assert_eq!(out, vec![0.5, 0.0, 0.75]);
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn lookup_table_rejects_empty() {
        assert!(Element::lookup_table(vec![]).is_err());
    }
}
