//! Periodic counters for oscillators and modulators.
//!
//! A [`PeriodicCounter`] produces the phase increments that drive a sawtooth
//! accumulator (oscillator role) or the trigger pulses that retune the
//! filter response for one cycle (modulator role). The voice core only
//! depends on the trait, so alternative counter models and scripted test
//! counters plug in without touching the update engine.

use crate::constants::{FLOAT_PERIOD_MAX, PERIOD_BITS};

/// Mantissa width of the floating period format.
const MANTISSA_BITS: u32 = PERIOD_BITS - 1;

/// Mantissa extraction mask.
const MANTISSA_MASK: u32 = (1 << MANTISSA_BITS) - 1;

/// Counter interface consumed by the voice core.
pub trait PeriodicCounter {
    /// Current octave level in `[0, 1 << OCT_BITS)`.
    fn current_octave(&self) -> u32;

    /// Advance one tick under the given octave-enable mask.
    ///
    /// Returns the phase increment to fold into a sawtooth accumulator; in
    /// the modulator role any nonzero return is latched as a trigger.
    fn advance(&mut self, oct_enables: u32) -> u32;

    /// Floating-format period: octave exponent in the high bits, mantissa
    /// below. Adjustable from the outside only through the sweep path.
    fn period(&self) -> u32;

    /// Reprogram the period. Out-of-range values are masked into the
    /// representable range.
    fn set_period(&mut self, period: u32);

    /// Return to the initial counting phase. The programmed period is
    /// host configuration and survives.
    fn reset(&mut self);
}

/// Default counter: a countdown divider over the floating period format.
///
/// The period register packs an octave exponent above a mantissa. The
/// divider counts only on ticks where its own octave's enable bit is set,
/// so the effective rate halves per octave step; on expiry it reloads
/// `mantissa | implicit lead` and emits a single-step increment, which in
/// the modulator role doubles as the trigger flag.
#[derive(Clone, Debug, Default)]
pub struct FloatPeriodCounter {
    float_period: u32,
    counter: u32,
}

impl FloatPeriodCounter {
    /// Counter with period zero (octave 0, shortest mantissa).
    pub fn new() -> Self {
        Self::default()
    }

    /// Counter with an initial floating period.
    pub fn with_period(float_period: u32) -> Self {
        let mut counter = Self::default();
        counter.set_period(float_period);
        counter
    }

    #[inline]
    fn reload(&self) -> u32 {
        (self.float_period & MANTISSA_MASK) | (1 << MANTISSA_BITS)
    }
}

impl PeriodicCounter for FloatPeriodCounter {
    #[inline]
    fn current_octave(&self) -> u32 {
        self.float_period >> MANTISSA_BITS
    }

    #[inline]
    fn advance(&mut self, oct_enables: u32) -> u32 {
        if oct_enables & (1 << self.current_octave()) == 0 {
            return 0;
        }
        if self.counter == 0 {
            self.counter = self.reload();
            1
        } else {
            self.counter -= 1;
            0
        }
    }

    #[inline]
    fn period(&self) -> u32 {
        self.float_period
    }

    #[inline]
    fn set_period(&mut self, period: u32) {
        self.float_period = period & FLOAT_PERIOD_MAX;
    }

    fn reset(&mut self) {
        self.counter = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{OCT_ENABLE_FIELD, OCT_MAX};

    #[test]
    fn test_octave_extraction() {
        assert_eq!(FloatPeriodCounter::with_period(0).current_octave(), 0);
        assert_eq!(
            FloatPeriodCounter::with_period(1 << MANTISSA_BITS).current_octave(),
            1
        );
        assert_eq!(
            FloatPeriodCounter::with_period(FLOAT_PERIOD_MAX).current_octave(),
            OCT_MAX
        );
    }

    #[test]
    fn test_set_period_masks_out_of_range() {
        let mut counter = FloatPeriodCounter::new();
        counter.set_period(u32::MAX);
        assert_eq!(counter.period(), FLOAT_PERIOD_MAX);
    }

    #[test]
    fn test_gated_counter_holds() {
        let mut counter = FloatPeriodCounter::with_period(2 << MANTISSA_BITS);
        // Octave 2 enable bit clear: nothing moves, no increment.
        for _ in 0..100 {
            assert_eq!(counter.advance(!(1 << 2) & OCT_ENABLE_FIELD), 0);
        }
        // Enable bit set: the zeroed countdown fires immediately.
        assert_eq!(counter.advance(OCT_ENABLE_FIELD), 1);
    }

    #[test]
    fn test_expiry_cadence_follows_mantissa() {
        let mantissa = 5;
        let mut counter = FloatPeriodCounter::with_period(mantissa);
        let mut fires = Vec::new();
        for tick in 0..2100 {
            if counter.advance(OCT_ENABLE_FIELD) != 0 {
                fires.push(tick);
            }
        }
        // First expiry is immediate, then one per reload+1 enabled ticks.
        let reload = (1 << MANTISSA_BITS) + mantissa;
        assert_eq!(fires[0], 0);
        assert_eq!(fires[1], reload + 1);
        assert_eq!(fires[2], 2 * (reload + 1));
    }

    #[test]
    fn test_reset_clears_countdown_keeps_period() {
        let mut counter = FloatPeriodCounter::with_period(42);
        counter.advance(OCT_ENABLE_FIELD);
        counter.advance(OCT_ENABLE_FIELD);
        counter.reset();
        assert_eq!(counter.period(), 42);
        // Fires immediately again after reset.
        assert_eq!(counter.advance(OCT_ENABLE_FIELD), 1);
    }
}
