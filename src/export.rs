//! WAV rendering of voice output.
//!
//! Renders full update cycles (one sample per cycle) and writes them as a
//! 16-bit mono WAV file. Only available with the `export-wav` feature.

use std::path::Path;

use crate::counter::PeriodicCounter;
use crate::sweep::SweepEvaluator;
use crate::voice::VoiceModel;
use crate::Result;

/// Render `cycles` full update cycles to a 16-bit mono WAV file.
///
/// # Arguments
///
/// * `voice` - Voice to render (advanced in place from its current state)
/// * `cycles` - Number of full cycles; one output sample each
/// * `sample_rate` - Sample rate to declare in the WAV header, in Hz
/// * `output_path` - Path where the WAV file will be written
///
/// # Example
///
/// ```no_run
/// use sawvoice::{export_to_wav, VoiceModel};
///
/// # fn main() -> sawvoice::Result<()> {
/// let mut voice = VoiceModel::new();
/// voice.set_osc_period(0, 0x2A0);
/// export_to_wav(&mut voice, 44_100, 44_100, "voice.wav")?;
/// # Ok(())
/// # }
/// ```
pub fn export_to_wav<C, S, P>(
    voice: &mut VoiceModel<C, S>,
    cycles: usize,
    sample_rate: u32,
    output_path: P,
) -> Result<()>
where
    C: PeriodicCounter,
    S: SweepEvaluator,
    P: AsRef<Path>,
{
    let samples = voice.render(cycles);
    write_wav_file(output_path.as_ref(), &samples, sample_rate)
}

/// Widen an offset-binary sample to signed 16 bits.
#[inline]
fn widen_sample(sample: u8) -> i16 {
    ((sample as i16) - 128) << 8
}

/// Write samples to a mono WAV file.
fn write_wav_file(path: &Path, samples: &[u8], sample_rate: u32) -> Result<()> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path, spec)
        .map_err(|e| format!("Failed to create WAV file: {e}"))?;

    for &sample in samples {
        writer
            .write_sample(widen_sample(sample))
            .map_err(|e| format!("Failed to write sample: {e}"))?;
    }

    writer
        .finalize()
        .map_err(|e| format!("Failed to finalize WAV file: {e}"))?;

    Ok(())
}
