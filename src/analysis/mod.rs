//! Audio loading layer
//!
//! Turns an audio file into the fixed 45-second, 44.1 kHz mono window the
//! feature extractor consumes. Decoding is powered by symphonia, rate
//! conversion by rubato.

mod resample;
mod waveform;

pub use resample::resample;
pub use waveform::{
    fit_to_window, load_waveform, Waveform, SAMPLE_RATE, WINDOW_SAMPLES, WINDOW_SECONDS,
};
