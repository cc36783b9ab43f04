//! Voice configuration constants.
//!
//! The synth core is fully determined by a small set of compile-time
//! constants. Everything in the derived section follows from the base set
//! and is not independently configurable; the test module pins the
//! relationships so an edit to one constant cannot silently skew another.

/// log2 of the number of octave levels.
pub const OCT_BITS: u32 = 3;

/// Width of each sawtooth phase accumulator.
pub const WAVE_BITS: u32 = 12;

/// Minimum right-shift applied in the damping and cutoff paths.
pub const LEAST_SHR: u32 = 2;

/// Width of the quantized output sample.
pub const OUTPUT_BITS: u32 = 8;

/// Width of the floating period format: one implicit-lead bit plus mantissa.
pub const PERIOD_BITS: u32 = 10;

/// Sawtooth oscillators per voice.
pub const NUM_OSCS: usize = 2;

/// Modulation counters per voice (volume, damping, cutoff).
pub const NUM_MODS: usize = 3;

/// Sweep units per voice: one per oscillator, one per modulator.
pub const NUM_SWEEPS: usize = NUM_OSCS + NUM_MODS;

/// Filter sub-states per cycle.
pub const NUM_FSTATES: usize = 5;

/// Ticks per full update cycle.
pub const NUM_STATES: usize = 16;

/// Extra clock division applied to sweep updates (log2).
pub const LOG2_SWEEP_UPDATE_PERIOD: u32 = 3;

/// Modulator driving the volume shift.
pub const VOL_INDEX: usize = 0;

/// Modulator driving the damping leak.
pub const DAMP_INDEX: usize = 1;

/// Modulator driving the lowpass cutoff.
pub const CUTOFF_INDEX: usize = 2;

// ---------------------------------------------------------------------------
// Filter sub-state indices
// ---------------------------------------------------------------------------

/// Volume feed from the first oscillator into `v`.
pub const FSTATE_VOL0: usize = 0;

/// Volume feed from the second oscillator into `v`.
pub const FSTATE_VOL1: usize = 1;

/// Damping leak on `v`.
pub const FSTATE_DAMP: usize = 2;

/// Lowpass integration of `v` into `y`.
pub const FSTATE_CUTOFF_Y: usize = 3;

/// Resonant feedback from `y` into `v`.
pub const FSTATE_CUTOFF_V: usize = 4;

// ---------------------------------------------------------------------------
// State layout
// ---------------------------------------------------------------------------

/// First oscillator state.
pub const OSC_STATE_BASE: usize = NUM_FSTATES;

/// First modulator state.
pub const MOD_STATE_BASE: usize = OSC_STATE_BASE + NUM_OSCS;

/// First sweep state.
pub const SWEEP_STATE_BASE: usize = MOD_STATE_BASE + NUM_MODS;

// ---------------------------------------------------------------------------
// Derived constants
// ---------------------------------------------------------------------------

/// Number of octave levels.
pub const OCT_LEVELS: u32 = 1 << OCT_BITS;

/// Highest octave level, and the largest legal per-octave shift amount.
pub const OCT_MAX: u32 = OCT_LEVELS - 1;

/// Wrap mask of the free-running octave counter.
pub const OCT_COUNTER_MASK: u32 = (1 << (OCT_LEVELS - 1)) - 1;

/// Full width of the octave-enable bitmask register.
pub const OCT_ENABLE_FIELD: u32 = (1 << OCT_LEVELS) - 1;

/// Enable mask with the top octaves gated off. Per-octave consumers apply
/// this so the highest octave level never fires.
pub const OCT_ENABLE_MASK: u32 = (1 << (OCT_LEVELS - 2)) - 1;

/// Width of the signed filter accumulators.
pub const STATE_BITS: u32 = WAVE_BITS + LEAST_SHR + OCT_LEVELS - 1;

/// Left shift applied to the recentered saw before the volume shift.
pub const FEED_SHL: u32 = OCT_LEVELS - 1;

/// Rounding bias added after the volume feed shift.
pub const FEED_ROUND: i32 = 1 << (FEED_SHL - 1);

/// Phase accumulator wrap mask.
pub const WAVE_MASK: u32 = (1 << WAVE_BITS) - 1;

/// Largest representable floating period (octave exponent plus mantissa).
pub const FLOAT_PERIOD_MAX: u32 = (1 << (OCT_BITS + PERIOD_BITS - 1)) - 1;

/// Right shift folding a filter accumulator down to the output width.
pub const OUTPUT_SHIFT: u32 = STATE_BITS - OUTPUT_BITS;

/// Output sample wrap mask.
pub const OUTPUT_MASK: u32 = (1 << OUTPUT_BITS) - 1;
