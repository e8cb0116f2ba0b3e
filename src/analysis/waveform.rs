//! Fixed-window waveform loading
//!
//! Decodes an audio file to mono f32 PCM with symphonia, resamples it to
//! the analysis rate and pads or truncates it to exactly 45 seconds.

use super::resample::resample;
use crate::error::{AffectError, Result};
use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// Analysis sample rate in Hz
pub const SAMPLE_RATE: u32 = 44100;
/// Analysis window length in seconds
pub const WINDOW_SECONDS: u32 = 45;
/// Analysis window length in samples (1,984,500)
pub const WINDOW_SAMPLES: usize = (SAMPLE_RATE * WINDOW_SECONDS) as usize;

/// Mono waveform at [`SAMPLE_RATE`], always exactly [`WINDOW_SAMPLES`] long
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    samples: Vec<f32>,
}

impl Waveform {
    /// Wrap in-memory samples already at [`SAMPLE_RATE`], fixing the window
    pub fn from_samples(samples: Vec<f32>) -> Self {
        Self {
            samples: fit_to_window(samples, WINDOW_SAMPLES),
        }
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        SAMPLE_RATE
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Zero-pad at the end or truncate the tail so `samples.len() == window`
pub fn fit_to_window(mut samples: Vec<f32>, window: usize) -> Vec<f32> {
    samples.resize(window, 0.0);
    samples
}

/// Decode `path` into a fixed-length analysis waveform
pub fn load_waveform(path: &Path) -> Result<Waveform> {
    log::debug!("Loading waveform: {:?}", path);

    let (samples, source_rate) = decode_to_mono(path)?;

    log::debug!(
        "Decoded {} samples ({:.1}s) at {}Hz",
        samples.len(),
        samples.len() as f32 / source_rate as f32,
        source_rate
    );

    if samples.is_empty() {
        log::warn!("No audio samples decoded from {:?}, using silence", path);
    }

    let samples = if source_rate == SAMPLE_RATE {
        samples
    } else {
        resample(&samples, source_rate, SAMPLE_RATE)?
    };

    Ok(Waveform::from_samples(samples))
}

/// Number of source-rate samples needed to cover the analysis window
fn source_samples_needed(source_rate: u32) -> usize {
    let exact = WINDOW_SAMPLES as u64 * source_rate as u64;
    let needed = exact.div_ceil(SAMPLE_RATE as u64) as usize;
    // A little extra so the resampler has real signal at the window edge
    if source_rate == SAMPLE_RATE {
        needed
    } else {
        needed + source_rate as usize / 10
    }
}

/// Decode audio file to mono f32 samples, stopping once the window is full
fn decode_to_mono(path: &Path) -> Result<(Vec<f32>, u32)> {
    // Open the audio file
    let file = std::fs::File::open(path).map_err(|e| AffectError::decode(path, e))?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension() {
        hint.with_extension(ext.to_str().unwrap_or(""));
    }

    // Probe the container
    let format_opts = FormatOptions::default();
    let metadata_opts = MetadataOptions::default();

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &format_opts, &metadata_opts)
        .map_err(|e| AffectError::decode(path, format!("unsupported container: {}", e)))?;

    let mut format = probed.format;

    // First track a codec can handle
    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != symphonia::core::codecs::CODEC_TYPE_NULL)
        .ok_or_else(|| AffectError::decode(path, "no audio track found"))?;

    let track_id = track.id;
    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| AffectError::decode(path, "no sample rate in audio track"))?;

    // Create decoder
    let dec_opts = DecoderOptions::default();
    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &dec_opts)
        .map_err(|e| AffectError::decode(path, format!("no decoder: {}", e)))?;

    // Only as much source audio as the window needs
    let mut all_samples: Vec<f32> = Vec::new();
    let max_samples = source_samples_needed(sample_rate);

    loop {
        let packet = match format.next_packet() {
            Ok(p) => p,
            Err(symphonia::core::errors::Error::IoError(e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break; // End of file
            }
            Err(e) => {
                log::warn!("Error reading packet: {:?}", e);
                break;
            }
        };

        if packet.track_id() != track_id {
            continue;
        }

        // A corrupt packet is skipped, not fatal
        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(e) => {
                log::warn!("Skipping undecodable packet in {:?}: {}", path, e);
                continue;
            }
        };

        let spec = *decoded.spec();
        let mut sample_buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
        sample_buf.copy_interleaved_ref(decoded);

        downmix_into(sample_buf.samples(), spec.channels.count(), &mut all_samples);

        if all_samples.len() >= max_samples {
            break;
        }
    }

    all_samples.truncate(max_samples);
    Ok((all_samples, sample_rate))
}

/// Append interleaved frames to `out` as the mean of their channels
fn downmix_into(interleaved: &[f32], channels: usize, out: &mut Vec<f32>) {
    if channels <= 1 {
        out.extend_from_slice(interleaved);
        return;
    }
    out.extend(
        interleaved
            .chunks_exact(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_constant() {
        assert_eq!(WINDOW_SAMPLES, 1_984_500);
    }

    #[test]
    fn test_short_input_is_zero_padded() {
        let waveform = Waveform::from_samples(vec![0.5; 1000]);
        assert_eq!(waveform.len(), WINDOW_SAMPLES);
        assert_eq!(waveform.samples()[999], 0.5);
        assert!(waveform.samples()[1000..].iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_long_input_is_truncated_from_the_end() {
        let mut samples = vec![0.25; WINDOW_SAMPLES];
        samples.extend(std::iter::repeat(1.0).take(5000));
        let waveform = Waveform::from_samples(samples);
        assert_eq!(waveform.len(), WINDOW_SAMPLES);
        assert!(waveform.samples().iter().all(|&s| s == 0.25));
    }

    #[test]
    fn test_source_samples_needed() {
        assert_eq!(source_samples_needed(SAMPLE_RATE), WINDOW_SAMPLES);
        assert!(source_samples_needed(22050) >= WINDOW_SAMPLES / 2);
        assert!(source_samples_needed(48000) > WINDOW_SAMPLES);
    }

    #[test]
    fn test_downmix() {
        let mut out = vec![9.0];
        downmix_into(&[1.0, 0.0, -0.5, 0.5], 2, &mut out);
        assert_eq!(out, vec![9.0, 0.5, 0.0]);

        downmix_into(&[0.25], 1, &mut out);
        assert_eq!(out.last(), Some(&0.25));
    }

    #[test]
    fn test_missing_file_is_decode_error() {
        let result = load_waveform(Path::new("/nonexistent/file.mp3"));
        assert!(matches!(result, Err(AffectError::Decode { .. })));
    }
}
