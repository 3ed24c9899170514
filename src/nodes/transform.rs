//! Reverse-polish transform node.

use crate::error::{DiscreteError, Result};

/// Maximum working stack depth of an RPN program.
pub const RPN_MAX_STACK: usize = 16;

/// One opcode of a compiled RPN program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RpnOp {
    /// `0`..`4`: push the register, load input slot n.
    PushIn(u8),
    /// `P`: push a copy of the register.
    Dup,
    /// `+`
    Add,
    /// `-`: pop a, register = a - register.
    Sub,
    /// `*`
    Mul,
    /// `/`: pop a, register = a / register.
    Div,
    /// `i`: negate the register.
    Neg,
    /// `!`: logical not.
    Not,
    /// `=`: integer equality, result 0 or 1.
    Eq,
    /// `>`, `<`: double comparisons, result 0 or 1.
    Gt,
    Lt,
    /// `&`, `|`, `^`: integer bitwise ops.
    And,
    Or,
    Xor,
}

/// A validated RPN program.
///
/// Programs are checked when built, so evaluation can never underflow or
/// overflow the stack.
#[derive(Debug, Clone)]
pub struct RpnProgram {
    source: String,
    ops: Vec<RpnOp>,
}

impl RpnProgram {
    pub fn parse(source: &str) -> Result<Self> {
        let mut ops = Vec::with_capacity(source.len());
        let mut depth = 0usize;
        for (at, ch) in source.chars().enumerate() {
            let op = match ch {
                '0'..='4' => RpnOp::PushIn(ch as u8 - b'0'),
                'P' => RpnOp::Dup,
                '+' => RpnOp::Add,
                '-' => RpnOp::Sub,
                '*' => RpnOp::Mul,
                '/' => RpnOp::Div,
                'i' => RpnOp::Neg,
                '!' => RpnOp::Not,
                '=' => RpnOp::Eq,
                '>' => RpnOp::Gt,
                '<' => RpnOp::Lt,
                '&' => RpnOp::And,
                '|' => RpnOp::Or,
                '^' => RpnOp::Xor,
                _ => {
                    return Err(DiscreteError::RpnUnknownOp {
                        program: source.to_owned(),
                        op: ch,
                    })
                }
            };
            match op {
                RpnOp::PushIn(_) | RpnOp::Dup => {
                    depth += 1;
                    if depth > RPN_MAX_STACK {
                        return Err(DiscreteError::RpnStackOverflow {
                            program: source.to_owned(),
                            at,
                        });
                    }
                }
                RpnOp::Add
                | RpnOp::Sub
                | RpnOp::Mul
                | RpnOp::Div
                | RpnOp::Eq
                | RpnOp::Gt
                | RpnOp::Lt
                | RpnOp::And
                | RpnOp::Or
                | RpnOp::Xor => {
                    if depth == 0 {
                        return Err(DiscreteError::RpnStackUnderflow {
                            program: source.to_owned(),
                            at,
                        });
                    }
                    depth -= 1;
                }
                RpnOp::Neg | RpnOp::Not => {}
            }
            ops.push(op);
        }
        Ok(Self {
            source: source.to_owned(),
            ops,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Highest input slot the program reads, if any.
    pub(crate) fn max_input(&self) -> Option<u8> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                RpnOp::PushIn(n) => Some(*n),
                _ => None,
            })
            .max()
    }
}

/// Applies an RPN program to up to five data inputs.
///
/// Inputs: `enable, in0..in4`. The working register starts at infinity,
/// matching a register that has never been loaded; a program that emits
/// it without loading an input produces infinity, not an error.
#[derive(Debug, Clone)]
pub struct Transform {
    program: RpnProgram,
}

impl Transform {
    pub(crate) fn new(program: RpnProgram) -> Self {
        Self { program }
    }

    pub(crate) fn input_range(&self) -> (usize, usize) {
        let data = self.program.max_input().map_or(0, |n| n as usize + 1);
        (1 + data, 6)
    }

    pub(crate) fn step(&mut self, ins: &[f64]) -> f64 {
        if ins[0] == 0.0 {
            return 0.0;
        }

        let mut stack = [0.0f64; RPN_MAX_STACK];
        let mut sp = 0usize;
        let mut top = f64::INFINITY;

        for op in &self.program.ops {
            match op {
                RpnOp::PushIn(n) => {
                    stack[sp] = top;
                    sp += 1;
                    top = ins[1 + *n as usize];
                }
                RpnOp::Dup => {
                    stack[sp] = top;
                    sp += 1;
                }
                RpnOp::Neg => top = -top,
                RpnOp::Not => top = if top == 0.0 { 1.0 } else { 0.0 },
                _ => {
                    sp -= 1;
                    let a = stack[sp];
                    top = match op {
                        RpnOp::Add => a + top,
                        RpnOp::Sub => a - top,
                        RpnOp::Mul => a * top,
                        RpnOp::Div => a / top,
                        RpnOp::Eq => ((a as i64 == top as i64) as i64) as f64,
                        RpnOp::Gt => ((a > top) as i64) as f64,
                        RpnOp::Lt => ((a < top) as i64) as f64,
                        RpnOp::And => (a as i64 & top as i64) as f64,
                        RpnOp::Or => (a as i64 | top as i64) as f64,
                        RpnOp::Xor => (a as i64 ^ top as i64) as f64,
                        _ => unreachable!(),
                    };
                }
            }
        }
        top
    }
}
