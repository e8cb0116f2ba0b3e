//! Per-instance hyperparameters of the regression network

use crate::error::{AffectError, Result};
use crate::features::N_CHANNELS;
use serde::{Deserialize, Serialize};

/// Convolution kernel width
pub const KERNEL_SIZE: usize = 10;
/// Pool width and stride after each convolution block
pub const BLOCK_POOL: usize = 2;
/// Width and stride of the final pooling layer
pub const FINAL_POOL: usize = 10;
/// Hidden width of the attention scorer
pub const ATTENTION_HIDDEN: usize = 64;
/// Dropout probability between the fully connected layers (training only)
pub const DROPOUT: f32 = 0.5;
/// Frames in a full analysis-window descriptor
pub const ANALYSIS_FRAMES: usize = 4501;

/// Network shape options; valence and arousal differ only in these
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkParams {
    pub in_channels: usize,
    pub filters1: usize,
    pub filters2: usize,
    pub hidden: usize,
    pub out_size: usize,
    /// Descriptor frame count the flattened width is derived from
    pub input_frames: usize,
}

impl NetworkParams {
    /// Shape of the trained valence model
    pub fn valence() -> Self {
        Self {
            in_channels: N_CHANNELS,
            filters1: 32,
            filters2: 64,
            hidden: 64,
            out_size: 1,
            input_frames: ANALYSIS_FRAMES,
        }
    }

    /// Shape of the trained arousal model
    pub fn arousal() -> Self {
        Self {
            in_channels: N_CHANNELS,
            filters1: 32,
            filters2: 32,
            hidden: 128,
            out_size: 1,
            input_frames: ANALYSIS_FRAMES,
        }
    }

    /// Temporal length left after both convolution blocks and the final pool
    pub fn pooled_frames(&self) -> Result<usize> {
        let mut t = self.input_frames;
        for block in 1..=2 {
            if t < KERNEL_SIZE {
                return Err(AffectError::shape(
                    format!("at least {} frames into conv block {}", KERNEL_SIZE, block),
                    format!("{} frames", t),
                ));
            }
            t = (t - KERNEL_SIZE + 1) / BLOCK_POOL;
        }
        if t < FINAL_POOL {
            return Err(AffectError::shape(
                format!("at least {} frames into the final pool", FINAL_POOL),
                format!("{} frames", t),
            ));
        }
        Ok(t / FINAL_POOL)
    }

    /// Width of the flattened vector fed to attention and `fc1`
    pub fn flat_dim(&self) -> Result<usize> {
        Ok(self.filters2 * self.pooled_frames()?)
    }

    /// Every weight tensor name with its expected shape, in state-dict layout
    pub fn weight_shapes(&self) -> Result<Vec<(String, Vec<usize>)>> {
        let flat = self.flat_dim()?;
        let mut shapes = Vec::new();

        for (name, c_in, c_out) in [
            ("conv1", self.in_channels, self.filters1),
            ("conv2", self.filters1, self.filters2),
        ] {
            shapes.push((format!("{name}.0.weight"), vec![c_out, c_in, KERNEL_SIZE]));
            shapes.push((format!("{name}.0.bias"), vec![c_out]));
            for stat in ["weight", "bias", "running_mean", "running_var"] {
                shapes.push((format!("{name}.1.{stat}"), vec![c_out]));
            }
        }

        shapes.push(("attention.attention.0.weight".into(), vec![ATTENTION_HIDDEN, flat]));
        shapes.push(("attention.attention.0.bias".into(), vec![ATTENTION_HIDDEN]));
        shapes.push(("attention.attention.2.weight".into(), vec![1, ATTENTION_HIDDEN]));
        shapes.push(("attention.attention.2.bias".into(), vec![1]));
        shapes.push(("fc1.weight".into(), vec![self.hidden, flat]));
        shapes.push(("fc1.bias".into(), vec![self.hidden]));
        shapes.push(("fc2.weight".into(), vec![self.out_size, self.hidden]));
        shapes.push(("fc2.bias".into(), vec![self.out_size]));

        Ok(shapes)
    }
}
