//! Affect regression networks
//!
//! One convolutional-attention architecture, instantiated twice with
//! independent weights for valence and arousal. Inference runs on candle.

mod attention;
mod audio_net;
mod params;
mod traits;

pub use attention::AttentionPool;
pub use audio_net::AudioNet;
pub use params::{NetworkParams, ANALYSIS_FRAMES, ATTENTION_HIDDEN, KERNEL_SIZE};
pub use traits::AffectModel;
