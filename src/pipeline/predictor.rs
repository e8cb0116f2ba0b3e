//! Audio file to (valence, arousal)

use super::config::PipelineConfig;
use crate::analysis::{load_waveform, Waveform, SAMPLE_RATE};
use crate::error::Result;
use crate::features::{FeatureDescriptor, FeatureExtractor};
use crate::network::{AffectModel, AudioNet};
use candle_core::Device;
use serde::Serialize;
use std::path::Path;

/// Unbounded regression outputs for one track
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AffectPair {
    pub valence: f64,
    pub arousal: f64,
}

/// Runs one descriptor through both regressors
pub struct Predictor<V: AffectModel, A: AffectModel> {
    extractor: FeatureExtractor,
    valence: V,
    arousal: A,
}

impl<V: AffectModel, A: AffectModel> Predictor<V, A> {
    pub fn new(valence: V, arousal: A) -> Result<Self> {
        Ok(Self {
            extractor: FeatureExtractor::new(SAMPLE_RATE)?,
            valence,
            arousal,
        })
    }

    /// Load the analysis window of `path` and predict its affect
    pub fn predict(&self, path: &Path) -> Result<AffectPair> {
        log::debug!("Predicting affect for {:?}", path);
        let waveform = load_waveform(path)?;
        self.predict_waveform(&waveform)
    }

    pub fn predict_waveform(&self, waveform: &Waveform) -> Result<AffectPair> {
        let descriptor = self.extractor.extract_waveform(waveform)?;
        self.predict_descriptor(&descriptor)
    }

    /// Both regressors on the same descriptor, in parallel
    pub fn predict_descriptor(&self, descriptor: &FeatureDescriptor) -> Result<AffectPair> {
        let (valence, arousal) = rayon::join(
            || self.valence.predict(descriptor),
            || self.arousal.predict(descriptor),
        );

        Ok(AffectPair {
            valence: f64::from(valence?),
            arousal: f64::from(arousal?),
        })
    }
}

impl Predictor<AudioNet, AudioNet> {
    /// Load both trained networks on the CPU
    pub fn from_config(config: &PipelineConfig) -> Result<Self> {
        let device = Device::Cpu;

        log::info!("Loading valence model: {:?}", config.valence_model);
        let valence = AudioNet::load(&config.valence_model, config.valence_params, &device)?;

        log::info!("Loading arousal model: {:?}", config.arousal_model);
        let arousal = AudioNet::load(&config.arousal_model, config.arousal_params, &device)?;

        Self::new(valence, arousal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::WINDOW_SAMPLES;
    use crate::error::AffectError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Mean of one descriptor row, scaled
    struct RowMean {
        row: usize,
        scale: f32,
        calls: AtomicUsize,
    }

    impl RowMean {
        fn new(row: usize, scale: f32) -> Self {
            Self {
                row,
                scale,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl AffectModel for RowMean {
        fn predict(&self, descriptor: &FeatureDescriptor) -> Result<f32> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let row = descriptor.data().row(self.row);
            Ok(self.scale * row.sum() / row.len() as f32)
        }
    }

    struct Failing;

    impl AffectModel for Failing {
        fn predict(&self, _: &FeatureDescriptor) -> Result<f32> {
            Err(AffectError::shape("39 channels", "0 channels"))
        }
    }

    #[test]
    fn test_models_share_one_descriptor() {
        let predictor = Predictor::new(RowMean::new(0, 1.0), RowMean::new(0, 2.0)).unwrap();
        let waveform = Waveform::from_samples(vec![0.0; 44100]);
        let pair = predictor.predict_waveform(&waveform).unwrap();

        assert_eq!(pair.arousal, 2.0 * pair.valence);
        assert_eq!(predictor.valence.calls.load(Ordering::SeqCst), 1);
        assert_eq!(predictor.arousal.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_silence_window_is_finite() {
        let predictor = Predictor::new(RowMean::new(0, 1.0), RowMean::new(38, 1.0)).unwrap();
        let waveform = Waveform::from_samples(Vec::new());
        assert_eq!(waveform.len(), WINDOW_SAMPLES);

        let pair = predictor.predict_waveform(&waveform).unwrap();
        assert!(pair.valence.is_finite());
        assert!(pair.arousal.is_finite());
    }

    #[test]
    fn test_model_error_propagates() {
        let predictor = Predictor::new(RowMean::new(0, 1.0), Failing).unwrap();
        let descriptor = FeatureDescriptor::new(ndarray::Array2::zeros((39, 10)));
        let result = predictor.predict_descriptor(&descriptor);
        assert!(matches!(result, Err(AffectError::Shape { .. })));
    }

    #[test]
    fn test_missing_file_is_decode_error() {
        let predictor = Predictor::new(RowMean::new(0, 1.0), RowMean::new(1, 1.0)).unwrap();
        let result = predictor.predict(Path::new("/nonexistent/track.mp3"));
        assert!(matches!(result, Err(AffectError::Decode { .. })));
    }

    #[test]
    fn test_from_config_missing_weights() {
        let config = PipelineConfig::new("/nonexistent/v.pth".into(), "/nonexistent/a.pth".into());
        assert!(matches!(
            Predictor::from_config(&config),
            Err(AffectError::ModelNotFound(_))
        ));
    }
}
