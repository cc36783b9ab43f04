//! The per-tick voice update engine.
//!
//! [`VoiceModel`] is the state machine at the heart of the chip: one call to
//! [`VoiceModel::update`] advances exactly one micro-step ("tick"), and a
//! full cycle of [`NUM_STATES`] consecutive ticks services every sub-unit
//! once — five filter sub-states, the two sawtooth oscillators, the three
//! modulation counters and the five sweep units, plus a pad tick that only
//! carries the octave-counter cadence.
//!
//! All arithmetic is shifts, adds and bitwise complement over fixed-width
//! integers. Overflow is handled by explicit saturation (filter
//! accumulators) or explicit wraparound (phase accumulators); both are part
//! of the model, not error conditions.

use crate::constants::{
    CUTOFF_INDEX, DAMP_INDEX, FEED_ROUND, FEED_SHL, FLOAT_PERIOD_MAX, FSTATE_CUTOFF_V,
    FSTATE_CUTOFF_Y, FSTATE_DAMP, FSTATE_VOL0, FSTATE_VOL1, LEAST_SHR, LOG2_SWEEP_UPDATE_PERIOD,
    MOD_STATE_BASE, NUM_FSTATES, NUM_MODS, NUM_OSCS, NUM_STATES, NUM_SWEEPS, OCT_COUNTER_MASK,
    OCT_ENABLE_FIELD, OCT_ENABLE_MASK, OCT_MAX, OSC_STATE_BASE, OUTPUT_MASK, OUTPUT_SHIFT,
    STATE_BITS, SWEEP_STATE_BASE, VOL_INDEX, WAVE_BITS, WAVE_MASK,
};
use crate::counter::{FloatPeriodCounter, PeriodicCounter};
use crate::sweep::{SweepEvaluator, SweepUnit};
use crate::util::saturate;
use crate::{Result, VoiceError};

/// Derive the per-octave clock-enable mask from the free-running counter.
///
/// The lowest zero bit of the counter is the bit about to receive a carry;
/// isolating it and shifting up one place sets bit `k` exactly once every
/// `2^k` counter steps, giving `log2(n)` independently phased divided clocks
/// from a single binary counter. Bit 0 is unconditionally set. The
/// computation runs at the exact width of the enable register: an isolate
/// that would land above the field wraps away, just as it does in a
/// hardware register of that width.
#[inline]
pub fn octave_enables(oct_counter: u32) -> u32 {
    let counter = oct_counter & OCT_COUNTER_MASK;
    let carry_isolate = (counter + 1) & !counter;
    ((carry_isolate << 1) | 1) & OCT_ENABLE_FIELD
}

/// Fold the high-resolution filter accumulator down to the output width.
///
/// Adds a half-scale bias (two's-complement to offset-binary) before the
/// narrowing shift.
#[inline]
fn quantize(y: i32) -> u8 {
    let biased = y + (1 << (STATE_BITS - 1));
    ((biased >> OUTPUT_SHIFT) as u32 & OUTPUT_MASK) as u8
}

/// One synthesizer voice: oscillators, modulation counters, sweeps, and the
/// shift-only resonant lowpass filter, advanced one sub-state per tick.
///
/// The caller owns the tick sequencing and must present every `state` in
/// `[0, NUM_STATES)` once per cycle, in increasing order; the trigger
/// latching and the octave cadence depend on it. Out-of-range indices are
/// rejected with [`VoiceError::InvalidState`]; out-of-sequence indices trip
/// a debug assertion.
///
/// The counter and sweep collaborators are generic so hosts can substitute
/// alternative models (tests script them deterministically); the defaults
/// are [`FloatPeriodCounter`] and [`SweepUnit`].
///
/// # Example
///
/// ```
/// use sawvoice::VoiceModel;
///
/// let mut voice = VoiceModel::new();
/// voice.set_osc_period(0, 0x2A0);
/// voice.set_mod_period(0, 0x150);
///
/// let sample = voice.run_cycle();
/// # let _ = sample;
/// ```
#[derive(Clone)]
pub struct VoiceModel<C = FloatPeriodCounter, S = SweepUnit> {
    // Clock derivation
    oct_counter: u32,
    oct_enables: u32,

    // Oscillator phases
    saw: [u32; NUM_OSCS],

    // Filter accumulators (signed, STATE_BITS wide)
    v: i32,
    y: i32,

    // Trigger flags latched on modulator ticks, consumed next cycle
    mod_trigger: [bool; NUM_MODS],

    // Sweep direction inputs (host-supplied)
    sweep_up: [bool; NUM_SWEEPS],

    // Last quantized sample
    out: u8,

    // Collaborators
    oscs: [C; NUM_OSCS],
    mods: [C; NUM_MODS],
    sweeps: [S; NUM_SWEEPS],

    // Expected next tick index, checked in debug builds
    next_state: usize,
}

impl VoiceModel {
    /// Voice with the default collaborators, all state zeroed.
    pub fn new() -> Self {
        Self::with_parts(
            std::array::from_fn(|_| FloatPeriodCounter::new()),
            std::array::from_fn(|_| FloatPeriodCounter::new()),
            std::array::from_fn(|_| SweepUnit::new()),
        )
    }

    /// Program sweep unit `sweep`: gate octave, step period, and direction.
    pub fn configure_sweep(&mut self, sweep: usize, octave: u32, step_period: u32, up: bool) {
        if sweep < NUM_SWEEPS {
            self.sweeps[sweep] = SweepUnit::with_rate(octave, step_period);
            self.sweep_up[sweep] = up;
        }
    }
}

impl<C: PeriodicCounter, S: SweepEvaluator> VoiceModel<C, S> {
    /// Voice built around caller-supplied collaborators.
    pub fn with_parts(oscs: [C; NUM_OSCS], mods: [C; NUM_MODS], sweeps: [S; NUM_SWEEPS]) -> Self {
        Self {
            oct_counter: 0,
            oct_enables: 0,
            saw: [0; NUM_OSCS],
            v: 0,
            y: 0,
            mod_trigger: [false; NUM_MODS],
            sweep_up: [false; NUM_SWEEPS],
            out: 0,
            oscs,
            mods,
            sweeps,
            next_state: 0,
        }
    }

    /// Advance one tick.
    ///
    /// Recomputes the octave-enable mask, services the sub-unit that owns
    /// `state`, advances the octave counter on the cycle's last tick, and
    /// returns the requantized output sample.
    pub fn update(&mut self, state: usize) -> Result<u8> {
        if state >= NUM_STATES {
            return Err(VoiceError::InvalidState(state));
        }
        Ok(self.step(state))
    }

    /// Run one full cycle of ticks in order and return the cycle's sample.
    pub fn run_cycle(&mut self) -> u8 {
        for state in 0..NUM_STATES {
            self.step(state);
        }
        self.out
    }

    /// Render samples into a caller-provided buffer, one per full cycle.
    ///
    /// This avoids per-call allocations; prefer this in hot paths.
    pub fn render_into(&mut self, buffer: &mut [u8]) {
        for sample in buffer.iter_mut() {
            *sample = self.run_cycle();
        }
    }

    /// Render `cycles` full cycles and collect the samples.
    pub fn render(&mut self, cycles: usize) -> Vec<u8> {
        let mut samples = vec![0; cycles];
        self.render_into(&mut samples);
        samples
    }

    /// Return to the zero-initialized power-on state.
    ///
    /// Programmed periods, sweep rates and sweep directions are host
    /// configuration and survive; only counting phases and the audio state
    /// are cleared.
    pub fn reset(&mut self) {
        self.oct_counter = 0;
        self.oct_enables = 0;
        self.saw = [0; NUM_OSCS];
        self.v = 0;
        self.y = 0;
        self.mod_trigger = [false; NUM_MODS];
        self.out = 0;
        self.next_state = 0;
        for osc in &mut self.oscs {
            osc.reset();
        }
        for modulator in &mut self.mods {
            modulator.reset();
        }
        for sweep in &mut self.sweeps {
            sweep.reset();
        }
    }

    /// Last quantized output sample.
    #[inline]
    pub fn output(&self) -> u8 {
        self.out
    }

    /// Current phase of oscillator `osc`, in `[0, 1 << WAVE_BITS)`.
    pub fn saw_phase(&self, osc: usize) -> u32 {
        self.saw.get(osc).copied().unwrap_or(0)
    }

    /// Current filter accumulators `(v, y)`, for diagnostics and tests.
    pub fn filter_accumulators(&self) -> (i32, i32) {
        (self.v, self.y)
    }

    /// Floating-format period of oscillator `osc` (0 for invalid indices).
    pub fn osc_period(&self, osc: usize) -> u32 {
        self.oscs.get(osc).map(|c| c.period()).unwrap_or(0)
    }

    /// Reprogram oscillator `osc`'s period. Invalid indices are ignored.
    pub fn set_osc_period(&mut self, osc: usize, period: u32) {
        if osc < NUM_OSCS {
            self.oscs[osc].set_period(period);
        }
    }

    /// Floating-format period of modulator `modulator` (0 for invalid
    /// indices).
    pub fn mod_period(&self, modulator: usize) -> u32 {
        self.mods.get(modulator).map(|c| c.period()).unwrap_or(0)
    }

    /// Reprogram modulator `modulator`'s period. Invalid indices are
    /// ignored.
    pub fn set_mod_period(&mut self, modulator: usize, period: u32) {
        if modulator < NUM_MODS {
            self.mods[modulator].set_period(period);
        }
    }

    /// Set the direction input of sweep `sweep`. Invalid indices are
    /// ignored.
    pub fn set_sweep_direction(&mut self, sweep: usize, up: bool) {
        if sweep < NUM_SWEEPS {
            self.sweep_up[sweep] = up;
        }
    }

    /// Direction input of sweep `sweep` (false for invalid indices).
    pub fn sweep_direction(&self, sweep: usize) -> bool {
        self.sweep_up.get(sweep).copied().unwrap_or(false)
    }

    /// The infallible tick body. `state` must already be range-checked.
    fn step(&mut self, state: usize) -> u8 {
        debug_assert_eq!(
            state, self.next_state,
            "tick out of sequence: every state in 0..NUM_STATES must be \
             presented once per cycle, in increasing order"
        );
        self.next_state = (state + 1) % NUM_STATES;

        self.oct_enables = octave_enables(self.oct_counter);

        if state < NUM_FSTATES {
            self.filter_stage(state);
        } else if state < MOD_STATE_BASE {
            self.update_osc(state - OSC_STATE_BASE);
        } else if state < SWEEP_STATE_BASE {
            self.update_mod(state - MOD_STATE_BASE);
        } else if state < SWEEP_STATE_BASE + NUM_SWEEPS {
            self.update_sweep(state - SWEEP_STATE_BASE);
        }
        // Remaining states are pad ticks: only the cycle cadence below.

        if state == NUM_STATES - 1 {
            self.oct_counter = (self.oct_counter + 1) & OCT_COUNTER_MASK;
        }

        self.out = quantize(self.y);
        self.out
    }

    /// One filter sub-state: volume feed, damping leak, or one of the two
    /// cutoff half-steps. Every write saturates to `STATE_BITS`.
    fn filter_stage(&mut self, state: usize) {
        let nf = self.effective_octaves();

        match state {
            FSTATE_VOL0 | FSTATE_VOL1 => {
                // Volume is a shift amount: louder = fewer right-shifts.
                let saw_index = state & 1;
                let saw_signed = self.saw[saw_index] as i32 - (1 << WAVE_BITS);
                let feed = (saw_signed << FEED_SHL) + FEED_ROUND;
                self.v = saturate(self.v + (feed >> nf[VOL_INDEX]), STATE_BITS);
            }
            FSTATE_DAMP => {
                // Adding the complement realizes v -= (v >> k) + 1: a
                // one-pole leak toward a small negative bias.
                let leak = !(self.v >> (LEAST_SHR + nf[DAMP_INDEX]));
                self.v = saturate(self.v + leak, STATE_BITS);
            }
            FSTATE_CUTOFF_Y => {
                // Lowpass pole: leaky integration of v into y.
                let step = self.v >> (LEAST_SHR + nf[CUTOFF_INDEX]);
                self.y = saturate(self.y + step, STATE_BITS);
            }
            FSTATE_CUTOFF_V => {
                // Resonant feedback from y back into v closes the loop.
                let feedback = !(self.y >> (LEAST_SHR + nf[CUTOFF_INDEX]));
                self.v = saturate(self.v + feedback, STATE_BITS);
            }
            _ => unreachable!("filter stage invoked for state {state}"),
        }
    }

    /// Per-role effective octaves for this tick.
    ///
    /// A trigger latched on the previous cycle drops the shift amount by
    /// one, giving one cycle of faster response after each modulator pulse.
    fn effective_octaves(&self) -> [u32; NUM_MODS] {
        let mut nf = [0u32; NUM_MODS];
        for (role, counter) in self.mods.iter().enumerate() {
            let trigger = self.mod_trigger[role] as u32;
            nf[role] = (counter.current_octave() + 1 - trigger).min(OCT_MAX);
        }
        nf
    }

    fn update_osc(&mut self, osc: usize) {
        let increment = self.oscs[osc].advance(self.oct_enables & OCT_ENABLE_MASK);
        // TODO: hard sync between the two saws.
        self.saw[osc] = self.saw[osc].wrapping_add(increment) & WAVE_MASK;
    }

    fn update_mod(&mut self, modulator: usize) {
        // Modulators run ungated: every octave clock is offered.
        self.mod_trigger[modulator] = self.mods[modulator].advance(OCT_ENABLE_FIELD) != 0;
    }

    fn update_sweep(&mut self, sweep: usize) {
        let gate = (self.oct_enables >> LOG2_SWEEP_UPDATE_PERIOD) & OCT_ENABLE_MASK;
        if !self.sweeps[sweep].advance(gate) {
            return;
        }

        let delta = if self.sweep_up[sweep] { 1 } else { -1 };
        let target = if sweep < NUM_OSCS {
            &mut self.oscs[sweep]
        } else {
            &mut self.mods[sweep - NUM_OSCS]
        };
        let stepped = (target.period() as i32 + delta).clamp(0, FLOAT_PERIOD_MAX as i32);
        target.set_period(stepped as u32);
    }
}

impl Default for VoiceModel {
    fn default() -> Self {
        Self::new()
    }
}

impl<C, S> std::fmt::Debug for VoiceModel<C, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VoiceModel")
            .field("oct_counter", &self.oct_counter)
            .field("saw", &self.saw)
            .field("v", &self.v)
            .field("y", &self.y)
            .field("out", &self.out)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{FSTATE_VOL0, NUM_FSTATES, OCT_LEVELS, OUTPUT_BITS};

    #[test]
    fn test_enable_mask_bit0_always_set() {
        for counter in 0..=2 * OCT_COUNTER_MASK {
            assert_eq!(octave_enables(counter) & 1, 1);
        }
    }

    #[test]
    fn test_enable_mask_top_octaves_gated() {
        for counter in 0..=OCT_COUNTER_MASK {
            let masked = octave_enables(counter) & OCT_ENABLE_MASK;
            assert_eq!(masked & (1 << OCT_MAX), 0);
            assert_eq!(masked & (1 << (OCT_MAX - 1)), 0);
        }
    }

    #[test]
    fn test_enable_mask_octave_cadence() {
        // Over one full counter revolution, bit k fires once per 2^k steps.
        let period = OCT_COUNTER_MASK + 1;
        for bit in 1..OCT_LEVELS {
            let fires = (0..period)
                .filter(|&c| octave_enables(c) & (1 << bit) != 0)
                .count() as u32;
            assert_eq!(fires, period >> bit, "octave bit {bit}");
        }
    }

    #[test]
    fn test_enable_isolate_wraps_above_field() {
        // At the all-ones counter the carry isolate leaves the register:
        // only octave 0 fires.
        assert_eq!(octave_enables(OCT_COUNTER_MASK), 1);
    }

    #[test]
    fn test_invalid_state_rejected() {
        let mut voice = VoiceModel::new();
        assert!(matches!(
            voice.update(NUM_STATES),
            Err(VoiceError::InvalidState(n)) if n == NUM_STATES
        ));
        assert!(voice.update(usize::MAX).is_err());
        // The failed calls must not have consumed the tick sequence.
        assert!(voice.update(0).is_ok());
    }

    #[test]
    fn test_first_cycle_trace() {
        // Hand-computed through the recurrence: zeroed voice, default
        // counters (octave 0, no triggers latched yet, so nf = 1 for every
        // role), saws at 0 during the filter states.
        let mut voice = VoiceModel::new();
        let sample = voice.run_cycle();

        assert_eq!(voice.v, -451_530);
        assert_eq!(voice.y, -57_338);
        assert_eq!(sample, 121);
        // Both oscillator counters fired on their first enabled tick.
        assert_eq!(voice.saw, [1, 1]);
        // All three modulators latched a trigger for the next cycle.
        assert_eq!(voice.mod_trigger, [true; NUM_MODS]);
        assert_eq!(voice.oct_counter, 1);
    }

    #[test]
    fn test_second_cycle_consumes_triggers() {
        // Cycle 2 runs with nf = 0 (trigger drops each effective octave),
        // which both deepens the volume feed enough to clip v at the
        // saturation floor mid-cycle and widens the cutoff step.
        let mut voice = VoiceModel::new();
        voice.run_cycle();
        let sample = voice.run_cycle();

        assert_eq!(voice.v, -722_947);
        assert_eq!(voice.y, -253_947);
        assert_eq!(sample, 97);
        // Triggers were consumed; none re-latched this cycle.
        assert_eq!(voice.mod_trigger, [false; NUM_MODS]);
    }

    #[test]
    fn test_saturation_clips_instead_of_wrapping() {
        let mut voice = VoiceModel::new();
        voice.v = -(1 << (STATE_BITS - 1)) + 100;
        voice.mod_trigger = [true; NUM_MODS]; // nf = 0: strongest feed
        voice.filter_stage(FSTATE_VOL0);
        assert_eq!(voice.v, -(1 << (STATE_BITS - 1)));
        voice.filter_stage(FSTATE_VOL0);
        assert_eq!(voice.v, -(1 << (STATE_BITS - 1)));
    }

    #[test]
    fn test_quantize_midpoints() {
        assert_eq!(quantize(0), 1u8 << (OUTPUT_BITS - 1));
        assert_eq!(quantize(-(1 << (STATE_BITS - 1))), 0);
        assert_eq!(quantize((1 << (STATE_BITS - 1)) - 1), ((1u32 << OUTPUT_BITS) - 1) as u8);
    }

    #[test]
    fn test_output_recomputed_every_tick() {
        // out tracks y on every tick even though y moves once per cycle.
        let mut voice = VoiceModel::new();
        let mut outputs = Vec::new();
        for state in 0..NUM_STATES {
            outputs.push(voice.update(state).unwrap());
        }
        // After the CUTOFF_Y tick the sample is stable to the cycle's end.
        let settled = outputs[NUM_FSTATES - 1];
        assert!(outputs[NUM_FSTATES..].iter().all(|&s| s == settled));
    }

    #[test]
    fn test_reset_restores_power_on_state() {
        let mut voice = VoiceModel::new();
        voice.set_osc_period(0, 0x123);
        // Sweep parked on a slow gate so it cannot retune anything here.
        voice.configure_sweep(0, 2, 50, true);
        for _ in 0..5 {
            voice.run_cycle();
        }
        voice.reset();

        assert_eq!(voice.filter_accumulators(), (0, 0));
        assert_eq!(voice.saw_phase(0), 0);
        assert_eq!(voice.output(), 0);
        // Host configuration survives a reset.
        assert_eq!(voice.osc_period(0), 0x123);
        assert!(voice.sweep_direction(0));
        // The trace after reset matches a fresh voice with the same config.
        let mut fresh = VoiceModel::new();
        fresh.set_osc_period(0, 0x123);
        fresh.configure_sweep(0, 2, 50, true);
        for _ in 0..5 {
            assert_eq!(voice.run_cycle(), fresh.run_cycle());
        }
    }

    #[test]
    fn test_run_cycle_matches_manual_ticks() {
        let mut by_cycle = VoiceModel::new();
        let mut by_tick = VoiceModel::new();
        for _ in 0..8 {
            let cycle_sample = by_cycle.run_cycle();
            let mut tick_sample = 0;
            for state in 0..NUM_STATES {
                tick_sample = by_tick.update(state).unwrap();
            }
            assert_eq!(cycle_sample, tick_sample);
        }
        assert_eq!(
            by_cycle.filter_accumulators(),
            by_tick.filter_accumulators()
        );
    }
}
