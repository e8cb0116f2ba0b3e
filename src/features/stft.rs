//! Centered short-time Fourier transform

use crate::error::{AffectError, Result};
use ndarray::Array2;
use rayon::prelude::*;
use realfft::RealFftPlanner;

/// Frame layout shared by every spectral descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StftParams {
    pub n_fft: usize,
    pub hop_length: usize,
    pub win_length: usize,
}

impl StftParams {
    pub fn new(n_fft: usize, hop_length: usize, win_length: usize) -> Result<Self> {
        if n_fft == 0 {
            return Err(AffectError::Feature("FFT size must be non-zero".into()));
        }
        if hop_length == 0 {
            return Err(AffectError::Feature("hop length must be non-zero".into()));
        }
        if win_length == 0 || win_length > n_fft {
            return Err(AffectError::Feature(format!(
                "window length {} must be in 1..={}",
                win_length, n_fft
            )));
        }
        Ok(Self {
            n_fft,
            hop_length,
            win_length,
        })
    }

    pub fn n_bins(&self) -> usize {
        self.n_fft / 2 + 1
    }

    /// Frames produced for a signal of `len` samples with centered framing
    pub fn n_frames(&self, len: usize) -> usize {
        1 + len / self.hop_length
    }

    /// Periodic Hann window of `win_length`, zero-padded to `n_fft` centered
    pub fn window(&self) -> Vec<f32> {
        let mut window = vec![0.0f32; self.n_fft];
        let offset = (self.n_fft - self.win_length) / 2;
        let n = self.win_length as f64;
        for i in 0..self.win_length {
            let w = 0.5 - 0.5 * (2.0 * std::f64::consts::PI * i as f64 / n).cos();
            window[offset + i] = w as f32;
        }
        window
    }
}

/// Power spectrogram `|STFT|^2`, laid out as `(frames, bins)`
pub fn power_spectrogram(samples: &[f32], params: &StftParams) -> Result<Array2<f32>> {
    if samples.is_empty() {
        return Err(AffectError::Feature("cannot transform an empty waveform".into()));
    }

    let n_fft = params.n_fft;
    let n_bins = params.n_bins();
    let n_frames = params.n_frames(samples.len());
    let pad = n_fft / 2;
    let window = params.window();

    let mut planner = RealFftPlanner::<f32>::new();
    let fft = planner.plan_fft_forward(n_fft);

    let frames: Vec<Vec<f32>> = (0..n_frames)
        .into_par_iter()
        .map_init(
            || {
                (
                    fft.make_input_vec(),
                    fft.make_output_vec(),
                    fft.make_scratch_vec(),
                )
            },
            |(input, output, scratch), frame| -> Result<Vec<f32>> {
                // Frame start in padded coordinates; padding is implicit zeros
                let start = frame * params.hop_length;
                for (i, slot) in input.iter_mut().enumerate() {
                    let padded_idx = start + i;
                    let sample = if padded_idx >= pad && padded_idx - pad < samples.len() {
                        samples[padded_idx - pad]
                    } else {
                        0.0
                    };
                    *slot = sample * window[i];
                }
                fft.process_with_scratch(input, output, scratch)
                    .map_err(|e| AffectError::Feature(format!("FFT failed: {e}")))?;
                Ok(output.iter().map(|c| c.norm_sqr()).collect::<Vec<f32>>())
            },
        )
        .collect::<Result<Vec<_>>>()?;

    let flat: Vec<f32> = frames.into_iter().flatten().collect();
    Array2::from_shape_vec((n_frames, n_bins), flat)
        .map_err(|e| AffectError::Feature(format!("spectrogram layout: {e}")))
}

/// `10 * log10(max(x, amin))` clipped to `top_db` below the array maximum
pub fn power_to_db(values: &mut Array2<f32>) {
    const AMIN: f32 = 1e-10;
    const TOP_DB: f32 = 80.0;

    values.mapv_inplace(|v| 10.0 * v.max(AMIN).log10());
    let max = values.fold(f32::NEG_INFINITY, |m, &v| m.max(v));
    let floor = max - TOP_DB;
    values.mapv_inplace(|v| v.max(floor));
}

/// Center frequency of every FFT bin
pub fn fft_frequencies(sample_rate: u32, n_fft: usize) -> Vec<f64> {
    (0..=n_fft / 2)
        .map(|k| k as f64 * sample_rate as f64 / n_fft as f64)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_params_rejected() {
        assert!(StftParams::new(0, 441, 0).is_err());
        assert!(StftParams::new(2048, 0, 2048).is_err());
        assert!(StftParams::new(2048, 441, 4096).is_err());
    }

    #[test]
    fn test_frame_count_for_analysis_window() {
        let params = StftParams::new(2048, 441, 1102).unwrap();
        assert_eq!(params.n_frames(1_984_500), 4501);
        assert_eq!(params.n_bins(), 1025);
    }

    #[test]
    fn test_window_is_centered() {
        let params = StftParams::new(2048, 441, 1102).unwrap();
        let window = params.window();
        assert_eq!(window.len(), 2048);
        assert_eq!(window[472], 0.0);
        assert_eq!(window[473], 0.0); // periodic Hann starts at zero
        assert!(window[473 + 551] > 0.999);
        assert_eq!(window[473 + 1102], 0.0);
    }

    #[test]
    fn test_sine_peaks_at_its_bin() {
        let sr = 44100u32;
        let params = StftParams::new(2048, 441, 2048).unwrap();
        let bin = 100usize;
        let freq = bin as f32 * sr as f32 / 2048.0;
        let samples: Vec<f32> = (0..sr as usize / 4)
            .map(|i| (2.0 * std::f32::consts::PI * freq * i as f32 / sr as f32).sin())
            .collect();
        let spec = power_spectrogram(&samples, &params).unwrap();
        let row = spec.row(spec.nrows() / 2);
        let argmax = row
            .iter()
            .enumerate()
            .fold((0, f32::MIN), |(bi, bv), (i, &v)| if v > bv { (i, v) } else { (bi, bv) })
            .0;
        assert_eq!(argmax, bin);
    }

    #[test]
    fn test_empty_waveform_rejected() {
        let params = StftParams::new(2048, 441, 2048).unwrap();
        assert!(matches!(
            power_spectrogram(&[], &params),
            Err(AffectError::Feature(_))
        ));
    }

    #[test]
    fn test_power_to_db_floor() {
        let mut values = Array2::from_shape_vec((1, 3), vec![1.0, 0.0, 1e-12]).unwrap();
        power_to_db(&mut values);
        assert_eq!(values[[0, 0]], 0.0);
        assert_eq!(values[[0, 1]], -80.0);
        assert_eq!(values[[0, 2]], -80.0);
    }
}
