//! Voice parameter snapshots.
//!
//! A [`VoicePatch`] captures every host-tunable input of a voice — counter
//! periods, sweep rates and sweep directions — as a serializable value, so
//! sound presets can live in configuration files and round-trip through
//! JSON.

use serde::{Deserialize, Serialize};

use crate::constants::{FLOAT_PERIOD_MAX, NUM_MODS, NUM_OSCS, NUM_SWEEPS, OCT_MAX};
use crate::voice::VoiceModel;
use crate::{Result, VoiceError};

/// Configuration of one sweep unit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepConfig {
    /// Octave whose clock gates this sweep.
    pub octave: u32,
    /// Enabled ticks between sweep steps (0 behaves as 1).
    pub step_period: u32,
    /// Step direction: true raises the target period.
    pub up: bool,
}

/// A complete snapshot of a voice's host-tunable inputs.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoicePatch {
    /// Floating-format periods of the sawtooth oscillators.
    pub osc_periods: [u32; NUM_OSCS],
    /// Floating-format periods of the modulation counters.
    pub mod_periods: [u32; NUM_MODS],
    /// Sweep unit configurations, one per oscillator then per modulator.
    pub sweeps: [SweepConfig; NUM_SWEEPS],
}

impl VoicePatch {
    /// Check every field against its representable range.
    pub fn validate(&self) -> Result<()> {
        for (i, &period) in self.osc_periods.iter().enumerate() {
            if period > FLOAT_PERIOD_MAX {
                return Err(VoiceError::InvalidPatch(format!(
                    "oscillator {i} period {period} exceeds {FLOAT_PERIOD_MAX}"
                )));
            }
        }
        for (j, &period) in self.mod_periods.iter().enumerate() {
            if period > FLOAT_PERIOD_MAX {
                return Err(VoiceError::InvalidPatch(format!(
                    "modulator {j} period {period} exceeds {FLOAT_PERIOD_MAX}"
                )));
            }
        }
        for (k, sweep) in self.sweeps.iter().enumerate() {
            if sweep.octave > OCT_MAX {
                return Err(VoiceError::InvalidPatch(format!(
                    "sweep {k} octave {} exceeds {OCT_MAX}",
                    sweep.octave
                )));
            }
        }
        Ok(())
    }

    /// Program a voice with this patch.
    pub fn apply_to(&self, voice: &mut VoiceModel) -> Result<()> {
        self.validate()?;
        for (i, &period) in self.osc_periods.iter().enumerate() {
            voice.set_osc_period(i, period);
        }
        for (j, &period) in self.mod_periods.iter().enumerate() {
            voice.set_mod_period(j, period);
        }
        for (k, sweep) in self.sweeps.iter().enumerate() {
            voice.configure_sweep(k, sweep.octave, sweep.step_period, sweep.up);
        }
        Ok(())
    }

    /// Parse and validate a patch from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let patch: VoicePatch =
            serde_json::from_str(json).map_err(|e| VoiceError::InvalidPatch(e.to_string()))?;
        patch.validate()?;
        Ok(patch)
    }

    /// Serialize the patch to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| VoiceError::Other(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_patch() -> VoicePatch {
        VoicePatch {
            osc_periods: [0x2A0, 0x2A4],
            mod_periods: [0x150, 0x3FF, 0x7FF],
            sweeps: [
                SweepConfig {
                    octave: 1,
                    step_period: 4,
                    up: true,
                },
                SweepConfig {
                    octave: 1,
                    step_period: 4,
                    up: false,
                },
                SweepConfig::default(),
                SweepConfig::default(),
                SweepConfig {
                    octave: 2,
                    step_period: 16,
                    up: true,
                },
            ],
        }
    }

    #[test]
    fn test_json_round_trip() {
        let patch = sample_patch();
        let json = patch.to_json().unwrap();
        let parsed = VoicePatch::from_json(&json).unwrap();
        assert_eq!(parsed, patch);
    }

    #[test]
    fn test_validate_rejects_oversized_period() {
        let mut patch = sample_patch();
        patch.osc_periods[1] = FLOAT_PERIOD_MAX + 1;
        assert!(matches!(
            patch.validate(),
            Err(VoiceError::InvalidPatch(_))
        ));
    }

    #[test]
    fn test_validate_rejects_oversized_sweep_octave() {
        let mut patch = sample_patch();
        patch.sweeps[0].octave = OCT_MAX + 1;
        assert!(patch.validate().is_err());
    }

    #[test]
    fn test_apply_programs_voice() {
        let patch = sample_patch();
        let mut voice = VoiceModel::new();
        patch.apply_to(&mut voice).unwrap();

        assert_eq!(voice.osc_period(0), 0x2A0);
        assert_eq!(voice.osc_period(1), 0x2A4);
        assert_eq!(voice.mod_period(2), 0x7FF);
        assert!(voice.sweep_direction(0));
        assert!(!voice.sweep_direction(1));
    }

    #[test]
    fn test_from_json_rejects_invalid_values() {
        let mut patch = sample_patch();
        patch.mod_periods[0] = FLOAT_PERIOD_MAX + 7;
        let json = patch.to_json().unwrap();
        assert!(VoicePatch::from_json(&json).is_err());
    }

    #[test]
    fn test_from_json_rejects_malformed_input() {
        assert!(VoicePatch::from_json("{not json").is_err());
    }
}
