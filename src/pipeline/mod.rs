//! End-to-end prediction
//!
//! Waveform → descriptor → (valence, arousal). Emotion lookup happens in
//! [`crate::emotion`] on the returned pair.

mod config;
mod predictor;

pub use config::PipelineConfig;
pub use predictor::{AffectPair, Predictor};
