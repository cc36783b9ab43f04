//! Bit-accurate voice model of a time-multiplexed sawtooth synth chip.
//!
//! One voice owns two sawtooth oscillators, three modulation counters, five
//! frequency sweeps and a resonant lowpass filter built entirely from
//! shifts, adds and bitwise complement — no multiplies, no floating point.
//! The chip services one sub-unit per system clock tick; a full cycle of
//! [`constants::NUM_STATES`] ticks advances everything once and produces
//! one quantized output sample, bit-identical to the hardware it models.
//!
//! # Features
//! - Octave-divided clock enables derived from a single binary counter
//! - Log-law volume and cutoff control via shift amounts
//! - Saturating filter accumulators (clip, never wrap)
//! - Trigger-coupled filter response: a modulator pulse speeds the filter
//!   up for exactly one cycle
//! - Pluggable counter/sweep collaborators for host integration and testing
//!
//! # Crate feature flags
//! - `export-wav` (optional): WAV rendering of voice output via hound
//!
//! # Quick start
//! ```
//! use sawvoice::VoiceModel;
//!
//! let mut voice = VoiceModel::new();
//! voice.set_osc_period(0, 0x2A0); // Oscillator 0 pitch
//! voice.set_mod_period(0, 0x150); // Volume response
//!
//! let sample = voice.run_cycle();
//! # let _ = sample;
//! ```
//!
//! ## Tick-level driving
//!
//! Hosts that multiplex several voices drive the tick sequence themselves;
//! every state in `[0, NUM_STATES)` must be presented once per cycle, in
//! increasing order:
//! ```
//! use sawvoice::constants::NUM_STATES;
//! use sawvoice::VoiceModel;
//!
//! let mut voice = VoiceModel::new();
//! for state in 0..NUM_STATES {
//!     let sample = voice.update(state).expect("state index in range");
//!     # let _ = sample;
//! }
//! ```

#![warn(missing_docs)]

pub mod constants;
pub mod counter;
pub mod patch;
pub mod sweep;
pub mod util;
pub mod voice;

#[cfg(feature = "export-wav")]
pub mod export;

/// Error types for voice model operations.
///
/// The update engine itself is pure arithmetic; the only failure modes are
/// caller contract violations and (behind the `export-wav` feature) file
/// I/O. Numeric overflow is never an error — saturation and wraparound are
/// part of the model.
#[derive(thiserror::Error, Debug)]
pub enum VoiceError {
    /// Tick index outside the valid state range.
    #[error("state index {0} out of range (valid: 0..{})", crate::constants::NUM_STATES)]
    InvalidState(usize),

    /// Rejected parameter snapshot.
    #[error("invalid patch: {0}")]
    InvalidPatch(String),

    /// IO error from filesystem or device.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error.
    #[error("{0}")]
    Other(String),
}

impl From<String> for VoiceError {
    /// Converts a String into `VoiceError::Other`.
    ///
    /// Convenience conversion for generic string errors; prefer the
    /// specific variant constructors where the error class is known.
    fn from(msg: String) -> Self {
        VoiceError::Other(msg)
    }
}

impl From<&str> for VoiceError {
    /// Converts a string slice into `VoiceError::Other`.
    fn from(msg: &str) -> Self {
        VoiceError::Other(msg.to_string())
    }
}

/// Result type for voice model operations.
pub type Result<T> = std::result::Result<T, VoiceError>;

// Public API exports
pub use counter::{FloatPeriodCounter, PeriodicCounter};
pub use patch::{SweepConfig, VoicePatch};
pub use sweep::{SweepEvaluator, SweepUnit};
pub use voice::{octave_enables, VoiceModel};

#[cfg(feature = "export-wav")]
pub use export::export_to_wav;
