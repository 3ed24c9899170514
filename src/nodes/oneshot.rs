//! One-shot pulse generator and ramp.

use crate::graph::SimParams;

/// Static configuration of a [`OneShot`].
#[derive(Debug, Clone, Copy)]
pub struct OneShotMode {
    /// Trigger on the rising edge (false: falling edge).
    pub rising_edge: bool,
    /// A trigger during the pulse restarts the countdown.
    pub retrigger: bool,
    /// Pulse drives the output low instead of high.
    pub active_low: bool,
}

impl Default for OneShotMode {
    fn default() -> Self {
        Self {
            rising_edge: true,
            retrigger: false,
            active_low: false,
        }
    }
}

/// One-shot pulse generator.
///
/// Inputs: `reset, trigger, amplitude, width`. Slot 0 is a reset, not an
/// enable: while high it holds the output at 0 and clears the pulse state.
/// The pulse width is a countdown in seconds, decremented by the sample
/// time each tick the pulse is active.
#[derive(Debug, Clone, Copy)]
pub struct OneShot {
    mode: OneShotMode,
    countdown: f64,
    state: bool,
    last_trig: bool,
}

impl OneShot {
    pub(crate) fn new(mode: OneShotMode) -> Self {
        Self {
            mode,
            countdown: 0.0,
            state: false,
            last_trig: false,
        }
    }

    pub(crate) fn reset(&mut self, ins: &[f64]) -> f64 {
        self.countdown = 0.0;
        self.state = false;
        self.last_trig = false;
        if self.mode.active_low {
            ins[2]
        } else {
            0.0
        }
    }

    pub(crate) fn step(&mut self, ins: &[f64], out: f64, params: &SimParams) -> f64 {
        let trigger = ins[1] != 0.0;
        let amplitude = ins[2];
        let width = ins[3];

        // If already triggered we will need to count down later.
        let mut do_count = self.state;
        let mut out = out;

        if ins[0] != 0.0 {
            // Hold in reset.
            self.state = false;
            return 0.0;
        }

        if trigger != self.last_trig {
            // There has been a trigger edge.
            self.last_trig = trigger;

            if trigger == self.mode.rising_edge {
                if !self.state {
                    // First trigger.
                    self.state = true;
                    out = if self.mode.active_low { 0.0 } else { amplitude };
                    self.countdown = width;
                } else if self.mode.retrigger {
                    self.countdown = width;
                    do_count = false;
                }
            }
        }

        if do_count {
            self.countdown -= params.sample_time;
            if self.countdown <= 0.0 {
                out = if self.mode.active_low { amplitude } else { 0.0 };
                self.countdown = 0.0;
                self.state = false;
            }
        }

        out
    }
}

/// Ramp up/down.
///
/// Inputs: `enable, direction, gradient, start, end, clamp-when-disabled`.
/// The gradient is change per second; the per-tick step and the ramp
/// direction are derived at reset. While disabled the output sits on the
/// clamp input; enabling restarts from the start value.
#[derive(Debug, Clone, Copy)]
pub struct Ramp {
    step: f64,
    /// End is higher than start.
    dir: bool,
    last_en: bool,
}

impl Ramp {
    pub(crate) fn new() -> Self {
        Self {
            step: 0.0,
            dir: false,
            last_en: false,
        }
    }

    pub(crate) fn reset(&mut self, ins: &[f64], params: &SimParams) -> f64 {
        self.step = ins[2] / params.sample_rate;
        self.dir = ins[4] >= ins[3];
        self.last_en = false;
        ins[5]
    }

    pub(crate) fn step(&mut self, ins: &[f64], out: f64) -> f64 {
        if ins[0] == 0.0 {
            self.last_en = false;
            // Disabled, so clamp the output.
            return ins[5];
        }

        let (start, end) = (ins[3], ins[4]);
        let mut out = out;
        if !self.last_en {
            self.last_en = true;
            out = start;
        }
        let forward = if self.dir { ins[1] != 0.0 } else { ins[1] == 0.0 };
        if forward {
            out += self.step;
        } else {
            out -= self.step;
        }
        // Clamp to min/max.
        if self.dir {
            out = out.max(start).min(end);
        } else {
            out = out.min(start).max(end);
        }
        out
    }
}
