//! Moodify - music emotion recognition
//!
//! This library estimates the valence and arousal of a track from 45 seconds
//! of audio and maps the pair to a named emotion and a color category.

pub mod analysis;
pub mod emotion;
pub mod error;
pub mod features;
pub mod network;
pub mod pipeline;
pub mod scan;
pub mod tagging;

pub use emotion::{Color, EmotionMapper, EmotionMatch};
pub use error::{AffectError, Result};
pub use pipeline::{AffectPair, PipelineConfig, Predictor};
