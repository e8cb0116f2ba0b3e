//! Feature extraction layer
//!
//! Converts the fixed analysis window into a 39-channel descriptor:
//! 20 MFCC, 12 chroma and 7 spectral-contrast rows sharing one frame grid
//! (FFT size 2048, hop of 10 ms).

mod chroma;
mod contrast;
mod mfcc;
mod stft;

pub use chroma::{chroma_filter_bank, estimate_tuning, pitch_tuning, Chroma, N_CHROMA};
pub use contrast::{SpectralContrast, N_CONTRAST};
pub use mfcc::{dct_basis, hz_to_mel, mel_to_hz, MelFilterBank, Mfcc, N_MELS, N_MFCC};
pub use stft::{power_spectrogram, power_to_db, StftParams};

use crate::analysis::Waveform;
use crate::error::{AffectError, Result};
use ndarray::{concatenate, Array2, Axis};

/// FFT size shared by every descriptor
pub const N_FFT: usize = 2048;
/// Total descriptor channels
pub const N_CHANNELS: usize = N_MFCC + N_CHROMA + N_CONTRAST;

/// Stacked `(channels, frames)` descriptor consumed by the regressors
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureDescriptor {
    data: Array2<f32>,
}

impl FeatureDescriptor {
    /// Wrap an existing `(channels, frames)` array
    pub fn new(data: Array2<f32>) -> Self {
        Self { data }
    }

    pub fn channels(&self) -> usize {
        self.data.nrows()
    }

    pub fn frames(&self) -> usize {
        self.data.ncols()
    }

    pub fn data(&self) -> &Array2<f32> {
        &self.data
    }

    /// Row-major copy of the values, channel by channel
    pub fn to_vec(&self) -> Vec<f32> {
        self.data.as_standard_layout().iter().copied().collect()
    }
}

/// Computes [`FeatureDescriptor`]s with precomputed filter banks
#[derive(Debug, Clone)]
pub struct FeatureExtractor {
    sample_rate: u32,
    mfcc_stft: StftParams,
    spectral_stft: StftParams,
    mfcc: Mfcc,
    chroma: Chroma,
    contrast: SpectralContrast,
}

impl FeatureExtractor {
    /// Extractor for audio at `sample_rate`; hop is 10 ms, MFCC window 25 ms
    pub fn new(sample_rate: u32) -> Result<Self> {
        let hop_length = (sample_rate as f64 * 0.01) as usize;
        let win_length = (sample_rate as f64 * 0.025) as usize;

        Ok(Self {
            sample_rate,
            mfcc_stft: StftParams::new(N_FFT, hop_length, win_length)?,
            spectral_stft: StftParams::new(N_FFT, hop_length, N_FFT)?,
            mfcc: Mfcc::new(sample_rate, N_FFT),
            chroma: Chroma::new(sample_rate, N_FFT),
            contrast: SpectralContrast::new(sample_rate, N_FFT),
        })
    }

    /// Descriptor for a loaded analysis window
    pub fn extract_waveform(&self, waveform: &Waveform) -> Result<FeatureDescriptor> {
        if waveform.sample_rate() != self.sample_rate {
            return Err(AffectError::Feature(format!(
                "waveform is {}Hz, extractor expects {}Hz",
                waveform.sample_rate(),
                self.sample_rate
            )));
        }
        self.extract(waveform.samples())
    }

    /// Descriptor for raw samples at the extractor's rate
    pub fn extract(&self, samples: &[f32]) -> Result<FeatureDescriptor> {
        if samples.is_empty() {
            return Err(AffectError::Feature("waveform is empty".into()));
        }

        log::debug!("Extracting features from {} samples", samples.len());

        let mfcc_power = power_spectrogram(samples, &self.mfcc_stft)?;
        let mfcc = self.mfcc.compute(&mfcc_power);
        drop(mfcc_power);

        let power = power_spectrogram(samples, &self.spectral_stft)?;
        let chroma = self.chroma.compute(&power);
        let contrast = self.contrast.compute(&power);
        drop(power);

        let data = concatenate(Axis(0), &[mfcc.view(), chroma.view(), contrast.view()])
            .map_err(|e| AffectError::Feature(format!("descriptor frames misaligned: {e}")))?;

        if let Some(bad) = data.iter().position(|v| !v.is_finite()) {
            let (row, col) = (bad / data.ncols(), bad % data.ncols());
            return Err(AffectError::Feature(format!(
                "non-finite value at channel {} frame {}",
                row, col
            )));
        }

        log::debug!("Descriptor shape: {:?}", data.dim());
        Ok(FeatureDescriptor::new(data))
    }
}
