/*
    MartyPC
    https://github.com/dbalsom/martypc

    Copyright 2022-2025 Daniel Balsom

    Permission is hereby granted, free of charge, to any person obtaining a
    copy of this software and associated documentation files (the “Software”),
    to deal in the Software without restriction, including without limitation
    the rights to use, copy, modify, merge, publish, distribute, sublicense,
    and/or sell copies of the Software, and to permit persons to whom the
    Software is furnished to do so, subject to the following conditions:

    The above copyright notice and this permission notice shall be included in
    all copies or substantial portions of the Software.

    THE SOFTWARE IS PROVIDED “AS IS”, WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
    IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
    FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
    AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
    LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING
    FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER
    DEALINGS IN THE SOFTWARE.

    --------------------------------------------------------------------------

    clock.rs

    Defines the tick source consumed by the hard disk timing engine.
*/

//! The clock collaborator.
//!
//! The timing engine never sleeps. It only reads a monotonic tick counter and converts tick
//! deltas to microseconds and back again.

/// The base clock of the IBM PC, from which the 8088 clock is derived.
pub const IBM_PC_SYSTEM_CLOCK: f64 = 157.5 / 11.0 * 1_000_000.0;
/// The 8088 CPU clock of the IBM PC/XT (one third of the system crystal).
pub const DEFAULT_CLOCK_HZ: f64 = IBM_PC_SYSTEM_CLOCK / 3.0;

pub trait TickSource {
    /// Return the current value of the monotonic tick counter.
    fn ticks(&self) -> u64;
    /// Return the number of ticks per microsecond.
    fn ticks_per_usec(&self) -> f64;

    #[inline]
    fn ticks_to_usec(&self, ticks: u64) -> f64 {
        ticks as f64 / self.ticks_per_usec()
    }

    #[inline]
    fn usec_to_ticks(&self, us: f64) -> u64 {
        (us * self.ticks_per_usec()) as u64
    }
}

/// A tick counter advanced explicitly by the machine's run loop.
#[derive(Copy, Clone, Debug)]
pub struct SystemTicks {
    ticks: u64,
    ticks_per_usec: f64,
}

impl Default for SystemTicks {
    fn default() -> Self {
        Self::new(DEFAULT_CLOCK_HZ)
    }
}

impl SystemTicks {
    /// Create a new counter at tick 0 running at `clock_hz`. Frequencies below 1Hz are clamped.
    pub fn new(clock_hz: f64) -> Self {
        let clock_hz = if clock_hz.is_finite() { clock_hz.max(1.0) } else { DEFAULT_CLOCK_HZ };
        Self {
            ticks: 0,
            ticks_per_usec: clock_hz / 1_000_000.0,
        }
    }

    pub fn clock_hz(&self) -> f64 {
        self.ticks_per_usec * 1_000_000.0
    }

    #[inline]
    pub fn advance(&mut self, ticks: u64) {
        self.ticks = self.ticks.saturating_add(ticks);
    }

    /// Advance the counter by the number of whole ticks elapsed in `us` microseconds.
    /// Returns the number of ticks advanced.
    pub fn advance_usec(&mut self, us: f64) -> u64 {
        let ticks = self.usec_to_ticks(us.max(0.0));
        self.advance(ticks);
        ticks
    }
}

impl TickSource for SystemTicks {
    #[inline]
    fn ticks(&self) -> u64 {
        self.ticks
    }
    #[inline]
    fn ticks_per_usec(&self) -> f64 {
        self.ticks_per_usec
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usec_conversion_round_trips_whole_ticks() {
        let mut clock = SystemTicks::new(4_000_000.0);
        assert_eq!(clock.ticks_per_usec(), 4.0);

        let advanced = clock.advance_usec(250.0);
        assert_eq!(advanced, 1000);
        assert_eq!(clock.ticks(), 1000);
        assert_eq!(clock.ticks_to_usec(clock.ticks()), 250.0);
    }

    #[test]
    fn negative_advance_is_ignored() {
        let mut clock = SystemTicks::new(1_000_000.0);
        clock.advance_usec(-5.0);
        assert_eq!(clock.ticks(), 0);
    }
}
