//! Octave-band spectral contrast

use super::stft::{fft_frequencies, power_to_db};
use ndarray::Array2;

/// Number of octave bands above the bottom band
pub const N_BANDS: usize = 6;
/// Rows produced (octave bands plus the bottom band)
pub const N_CONTRAST: usize = N_BANDS + 1;

const FMIN: f64 = 200.0;
const QUANTILE: f64 = 0.02;

/// Bin range of one band; rows `start..end` are ranked, `count` sets the quantile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Band {
    start: usize,
    end: usize,
    count: usize,
}

/// Spectral contrast stage
#[derive(Debug, Clone)]
pub struct SpectralContrast {
    bands: Vec<Band>,
}

impl SpectralContrast {
    pub fn new(sample_rate: u32, n_fft: usize) -> Self {
        let freqs = fft_frequencies(sample_rate, n_fft);
        let n_bins = freqs.len();

        let mut edges = vec![0.0f64];
        edges.extend((0..=N_BANDS).map(|i| FMIN * 2f64.powi(i as i32)));

        let bands = edges
            .windows(2)
            .enumerate()
            .map(|(k, w)| {
                let (f_low, f_high) = (w[0], w[1]);
                let in_band: Vec<usize> = (0..n_bins)
                    .filter(|&i| freqs[i] >= f_low && freqs[i] <= f_high)
                    .collect();
                let first = in_band.first().copied().unwrap_or(0);
                let last = in_band.last().copied().unwrap_or(first);

                // Every band above the first also takes the bin just below it,
                // the top band runs to Nyquist
                let start = if k > 0 { first.saturating_sub(1) } else { first };
                let end = if k == N_BANDS { n_bins } else { last + 1 };
                let count = end - start;
                // Only the top band keeps its final bin in the ranking
                let ranked_end = if k < N_BANDS { end - 1 } else { end };

                Band {
                    start,
                    end: ranked_end,
                    count,
                }
            })
            .collect();

        Self { bands }
    }

    /// `(frames, bins)` power spectrogram in, `(N_CONTRAST, frames)` out
    ///
    /// Contrast is measured on magnitudes, so the power input is square-rooted.
    pub fn compute(&self, power: &Array2<f32>) -> Array2<f32> {
        let n_frames = power.nrows();
        let mut peak = Array2::<f32>::zeros((N_CONTRAST, n_frames));
        let mut valley = Array2::<f32>::zeros((N_CONTRAST, n_frames));

        let mut sorted: Vec<f32> = Vec::new();
        for (t, frame) in power.outer_iter().enumerate() {
            for (k, band) in self.bands.iter().enumerate() {
                sorted.clear();
                sorted.extend((band.start..band.end).map(|i| frame[i].sqrt()));
                sorted.sort_by(|a, b| a.total_cmp(b));

                let take = ((QUANTILE * band.count as f64).round_ties_even() as usize)
                    .max(1)
                    .min(sorted.len().max(1));
                if sorted.is_empty() {
                    continue;
                }

                let low: f32 = sorted[..take].iter().sum::<f32>() / take as f32;
                let high: f32 = sorted[sorted.len() - take..].iter().sum::<f32>() / take as f32;
                valley[[k, t]] = low;
                peak[[k, t]] = high;
            }
        }

        power_to_db(&mut peak);
        power_to_db(&mut valley);
        peak - valley
    }
}
