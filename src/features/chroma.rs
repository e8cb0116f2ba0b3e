//! Pitch-class (chroma) energy from the power spectrogram
//!
//! The filter bank is shifted by an estimated tuning offset so that
//! slightly detuned recordings still land on the right pitch classes.

use super::stft::fft_frequencies;
use ndarray::Array2;

/// Number of pitch classes
pub const N_CHROMA: usize = 12;

const PITCH_FMIN: f64 = 150.0;
const PITCH_FMAX: f64 = 4000.0;
const PITCH_THRESHOLD: f32 = 0.1;
const TUNING_RESOLUTION: f64 = 0.01;
const CENTER_OCTAVE: f64 = 5.0;
const OCTAVE_WIDTH: f64 = 2.0;

/// Octave number of `hz` relative to C0 (A440 shifted by `tuning` bins)
fn hz_to_octs(hz: f64, tuning: f64, bins_per_octave: usize) -> f64 {
    let a440 = 440.0 * 2f64.powf(tuning / bins_per_octave as f64);
    (hz / (a440 / 16.0)).log2()
}

/// Estimate the tuning deviation, in fractions of a chroma bin, in [-0.5, 0.5)
///
/// Spectral peaks between 150 Hz and 4 kHz are located with parabolic
/// interpolation; peaks at or above the median peak magnitude vote into a
/// 1/100-bin histogram of their deviation from equal temperament.
pub fn estimate_tuning(power: &Array2<f32>, sample_rate: u32, n_fft: usize) -> f64 {
    let fft_freqs = fft_frequencies(sample_rate, n_fft);
    let fmax = PITCH_FMAX.min(sample_rate as f64 / 2.0);
    let n_bins = fft_freqs.len();

    let mut pitches: Vec<(f64, f32)> = Vec::new();

    for frame in power.outer_iter() {
        let frame_max = frame.fold(0.0f32, |m, &v| m.max(v));
        let ref_value = PITCH_THRESHOLD * frame_max;
        let gated = |k: usize| {
            let v = frame[k];
            if v > ref_value {
                v
            } else {
                0.0
            }
        };

        for k in 1..n_bins - 1 {
            if !(PITCH_FMIN <= fft_freqs[k] && fft_freqs[k] < fmax) {
                continue;
            }
            let x = gated(k);
            if !(x > gated(k - 1) && x >= gated(k + 1)) {
                continue;
            }

            let (prev, cur, next) = (frame[k - 1], frame[k], frame[k + 1]);
            let avg = 0.5 * (next - prev);
            let curvature = 2.0 * cur - next - prev;
            let denom = if curvature.abs() < f32::MIN_POSITIVE {
                curvature + 1.0
            } else {
                curvature
            };
            let shift = avg / denom;
            let pitch = (k as f32 + shift) as f64 * sample_rate as f64 / n_fft as f64;
            let mag = cur + 0.5 * avg * shift;
            if pitch > 0.0 {
                pitches.push((pitch, mag));
            }
        }
    }

    if pitches.is_empty() {
        return 0.0;
    }

    let mut mags: Vec<f32> = pitches.iter().map(|&(_, m)| m).collect();
    mags.sort_by(|a, b| a.total_cmp(b));
    let mid = mags.len() / 2;
    let threshold = if mags.len() % 2 == 0 {
        (mags[mid - 1] + mags[mid]) / 2.0
    } else {
        mags[mid]
    };

    let selected: Vec<f64> = pitches
        .iter()
        .filter(|&&(_, m)| m >= threshold)
        .map(|&(p, _)| p)
        .collect();

    pitch_tuning(&selected, N_CHROMA)
}

/// Most common deviation from equal temperament among `frequencies`
pub fn pitch_tuning(frequencies: &[f64], bins_per_octave: usize) -> f64 {
    let n_hist = (1.0 / TUNING_RESOLUTION).ceil() as usize;
    let mut counts = vec![0usize; n_hist];
    let mut any = false;

    for &f in frequencies.iter().filter(|&&f| f > 0.0) {
        any = true;
        let mut residual = (bins_per_octave as f64 * hz_to_octs(f, 0.0, bins_per_octave)).rem_euclid(1.0);
        if residual >= 0.5 {
            residual -= 1.0;
        }
        let idx = (((residual + 0.5) / TUNING_RESOLUTION).floor() as usize).min(n_hist - 1);
        counts[idx] += 1;
    }

    if !any {
        return 0.0;
    }

    let mut best = 0;
    for (i, &c) in counts.iter().enumerate() {
        if c > counts[best] {
            best = i;
        }
    }
    -0.5 + best as f64 * TUNING_RESOLUTION
}

/// Chroma filter bank, `(N_CHROMA, n_fft / 2 + 1)`, rows starting at C
pub fn chroma_filter_bank(sample_rate: u32, n_fft: usize, tuning: f64) -> Array2<f32> {
    let n_chroma = N_CHROMA as f64;

    // Fractional chroma bin of each FFT bin; DC gets a placeholder 1.5 octaves down
    let mut frqbins: Vec<f64> = Vec::with_capacity(n_fft);
    for k in 1..n_fft {
        let hz = k as f64 * sample_rate as f64 / n_fft as f64;
        frqbins.push(n_chroma * hz_to_octs(hz, tuning, N_CHROMA));
    }
    frqbins.insert(0, frqbins[0] - 1.5 * n_chroma);

    let mut binwidth: Vec<f64> = frqbins
        .windows(2)
        .map(|w| (w[1] - w[0]).max(1.0))
        .collect();
    binwidth.push(1.0);

    let half = (n_chroma / 2.0).round();
    let mut wts = Array2::<f64>::zeros((N_CHROMA, n_fft));
    for c in 0..N_CHROMA {
        for k in 0..n_fft {
            let d = (frqbins[k] - c as f64 + half + 10.0 * n_chroma).rem_euclid(n_chroma) - half;
            wts[[c, k]] = (-0.5 * (2.0 * d / binwidth[k]).powi(2)).exp();
        }
    }

    // L2-normalize each column
    for k in 0..n_fft {
        let norm = wts.column(k).iter().map(|v| v * v).sum::<f64>().sqrt();
        if norm >= f64::MIN_POSITIVE {
            wts.column_mut(k).mapv_inplace(|v| v / norm);
        }
    }

    // Gaussian octave weighting
    for k in 0..n_fft {
        let octave_weight =
            (-0.5 * ((frqbins[k] / n_chroma - CENTER_OCTAVE) / OCTAVE_WIDTH).powi(2)).exp();
        wts.column_mut(k).mapv_inplace(|v| v * octave_weight);
    }

    // Roll so that row 0 is C rather than A
    let n_bins = n_fft / 2 + 1;
    Array2::from_shape_fn((N_CHROMA, n_bins), |(c, k)| {
        wts[[(c + 3) % N_CHROMA, k]] as f32
    })
}

/// Chroma stage: tuning estimate, filter bank projection, per-frame max normalization
#[derive(Debug, Clone)]
pub struct Chroma {
    sample_rate: u32,
    n_fft: usize,
}

impl Chroma {
    pub fn new(sample_rate: u32, n_fft: usize) -> Self {
        Self { sample_rate, n_fft }
    }

    /// `(frames, bins)` power spectrogram in, `(N_CHROMA, frames)` out
    pub fn compute(&self, power: &Array2<f32>) -> Array2<f32> {
        let tuning = estimate_tuning(power, self.sample_rate, self.n_fft);
        log::debug!("Estimated tuning: {:+.2} bins", tuning);

        let bank = chroma_filter_bank(self.sample_rate, self.n_fft, tuning);
        let mut chroma = bank.dot(&power.t());

        for mut frame in chroma.columns_mut() {
            let peak = frame.fold(0.0f32, |m, &v| m.max(v.abs()));
            if peak >= f32::MIN_POSITIVE {
                frame.mapv_inplace(|v| v / peak);
            }
        }
        chroma
    }
}
