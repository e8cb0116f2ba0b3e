//! Mel-frequency cepstral coefficients
//!
//! Slaney-style mel filter bank over the power spectrogram, converted to
//! decibels and projected onto an orthonormal DCT-II basis.

use super::stft::{fft_frequencies, power_to_db};
use ndarray::Array2;

/// Number of mel bands before the DCT
pub const N_MELS: usize = 128;
/// Number of cepstral coefficients kept
pub const N_MFCC: usize = 20;

const F_SP: f64 = 200.0 / 3.0;
const MIN_LOG_HZ: f64 = 1000.0;
const MIN_LOG_MEL: f64 = MIN_LOG_HZ / F_SP;

fn log_step() -> f64 {
    6.4f64.ln() / 27.0
}

/// Hz to mel on the Slaney scale (linear below 1 kHz, logarithmic above)
pub fn hz_to_mel(hz: f64) -> f64 {
    if hz >= MIN_LOG_HZ {
        MIN_LOG_MEL + (hz / MIN_LOG_HZ).ln() / log_step()
    } else {
        hz / F_SP
    }
}

/// Inverse of [`hz_to_mel`]
pub fn mel_to_hz(mel: f64) -> f64 {
    if mel >= MIN_LOG_MEL {
        MIN_LOG_HZ * (log_step() * (mel - MIN_LOG_MEL)).exp()
    } else {
        F_SP * mel
    }
}

/// One triangular mel filter, stored as its non-zero bin range
#[derive(Debug, Clone)]
struct MelFilter {
    start: usize,
    weights: Vec<f32>,
}

/// Area-normalized mel filter bank spanning 0 Hz to Nyquist
#[derive(Debug, Clone)]
pub struct MelFilterBank {
    filters: Vec<MelFilter>,
    n_bins: usize,
}

impl MelFilterBank {
    pub fn new(sample_rate: u32, n_fft: usize, n_mels: usize) -> Self {
        let fft_freqs = fft_frequencies(sample_rate, n_fft);
        let max_mel = hz_to_mel(sample_rate as f64 / 2.0);
        let min_mel = hz_to_mel(0.0);

        // n_mels + 2 edge frequencies, evenly spaced in mel
        let edges: Vec<f64> = (0..n_mels + 2)
            .map(|i| {
                let mel = min_mel + (max_mel - min_mel) * i as f64 / (n_mels + 1) as f64;
                mel_to_hz(mel)
            })
            .collect();

        let filters = (0..n_mels)
            .map(|m| {
                let (lo, center, hi) = (edges[m], edges[m + 1], edges[m + 2]);
                let enorm = 2.0 / (hi - lo);
                let dense: Vec<f32> = fft_freqs
                    .iter()
                    .map(|&f| {
                        let lower = (f - lo) / (center - lo);
                        let upper = (hi - f) / (hi - center);
                        (lower.min(upper).max(0.0) * enorm) as f32
                    })
                    .collect();

                let start = dense.iter().position(|&w| w > 0.0).unwrap_or(0);
                let end = dense
                    .iter()
                    .rposition(|&w| w > 0.0)
                    .map(|i| i + 1)
                    .unwrap_or(start);
                MelFilter {
                    start,
                    weights: dense[start..end].to_vec(),
                }
            })
            .collect();

        Self {
            filters,
            n_bins: fft_freqs.len(),
        }
    }

    pub fn n_mels(&self) -> usize {
        self.filters.len()
    }

    /// Dense `(n_mels, n_bins)` weight matrix
    #[cfg(test)]
    fn to_dense(&self) -> Array2<f32> {
        let mut dense = Array2::zeros((self.filters.len(), self.n_bins));
        for (m, filter) in self.filters.iter().enumerate() {
            for (i, &w) in filter.weights.iter().enumerate() {
                dense[[m, filter.start + i]] = w;
            }
        }
        dense
    }

    /// Project a `(frames, bins)` power spectrogram to `(frames, n_mels)`
    pub fn apply(&self, power: &Array2<f32>) -> Array2<f32> {
        let n_frames = power.nrows();
        let mut mel = Array2::zeros((n_frames, self.filters.len()));
        for (t, frame) in power.outer_iter().enumerate() {
            for (m, filter) in self.filters.iter().enumerate() {
                let bins = frame.slice(ndarray::s![filter.start..filter.start + filter.weights.len()]);
                mel[[t, m]] = bins
                    .iter()
                    .zip(filter.weights.iter())
                    .map(|(&p, &w)| p * w)
                    .sum();
            }
        }
        mel
    }
}

/// Orthonormal DCT-II basis, `(n_out, n_in)`
pub fn dct_basis(n_out: usize, n_in: usize) -> Array2<f32> {
    let n = n_in as f64;
    Array2::from_shape_fn((n_out, n_in), |(k, i)| {
        let scale = if k == 0 { (1.0 / n).sqrt() } else { (2.0 / n).sqrt() };
        let angle = std::f64::consts::PI * k as f64 * (2.0 * i as f64 + 1.0) / (2.0 * n);
        (scale * angle.cos()) as f32
    })
}

/// MFCC stage: mel projection, dB conversion and DCT
#[derive(Debug, Clone)]
pub struct Mfcc {
    mel_bank: MelFilterBank,
    dct: Array2<f32>,
}

impl Mfcc {
    pub fn new(sample_rate: u32, n_fft: usize) -> Self {
        Self {
            mel_bank: MelFilterBank::new(sample_rate, n_fft, N_MELS),
            dct: dct_basis(N_MFCC, N_MELS),
        }
    }

    /// `(frames, bins)` power spectrogram in, `(N_MFCC, frames)` out
    pub fn compute(&self, power: &Array2<f32>) -> Array2<f32> {
        let mut mel = self.mel_bank.apply(power);
        power_to_db(&mut mel);
        self.dct.dot(&mel.t())
    }
}
