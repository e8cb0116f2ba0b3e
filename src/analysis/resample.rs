//! Sample rate conversion to the analysis rate

use crate::error::{AffectError, Result};
use rubato::{FftFixedIn, Resampler};

/// Input chunk size for the FFT resampler
const CHUNK_SIZE: usize = 1024;

/// Resample mono audio using rubato's FFT resampler
///
/// The resampler delay is trimmed from the front and the output is cut to
/// `len * to_rate / from_rate` samples.
pub fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> Result<Vec<f32>> {
    if from_rate == to_rate || samples.is_empty() {
        return Ok(samples.to_vec());
    }

    let mut resampler =
        FftFixedIn::<f32>::new(from_rate as usize, to_rate as usize, CHUNK_SIZE, 2, 1)
            .map_err(|e| AffectError::Feature(format!("resampler init failed: {e}")))?;

    let expected_len = (samples.len() as u64 * to_rate as u64 / from_rate as u64) as usize;
    let delay = resampler.output_delay();

    log::debug!(
        "Resampling {} samples {}Hz -> {}Hz (delay {})",
        samples.len(),
        from_rate,
        to_rate,
        delay
    );

    let mut output = Vec::with_capacity(expected_len + delay + CHUNK_SIZE * 2);
    let mut position = 0;

    // Keep feeding zero chunks past the end until the delayed tail is flushed
    while output.len() < expected_len + delay {
        let chunk_size = resampler.input_frames_next();
        let end = (position + chunk_size).min(samples.len());
        let mut chunk = if position < samples.len() {
            samples[position..end].to_vec()
        } else {
            Vec::new()
        };
        chunk.resize(chunk_size, 0.0);
        position += chunk_size;

        let input = vec![chunk];
        let resampled = resampler
            .process(&input, None)
            .map_err(|e| AffectError::Feature(format!("resample failed: {e}")))?;

        if let Some(channel) = resampled.first() {
            output.extend_from_slice(channel);
        }
    }

    output.drain(..delay);
    output.truncate(expected_len);
    Ok(output)
}
