//! Soft attention pooling over the flattened convolution features

use super::params::ATTENTION_HIDDEN;
use candle_core::{Module, Result, Tensor};
use candle_nn::{linear, Linear, VarBuilder};

/// Two-layer scorer whose softmax-normalized output rescales its input
///
/// The scorer maps each row of `(batch, features)` to a single score, the
/// softmax runs over dimension 1 of that `(batch, 1)` score and the result is
/// broadcast back over the features. This is the layout the trained weights
/// were fit against.
#[derive(Debug, Clone)]
pub struct AttentionPool {
    score_hidden: Linear,
    score_out: Linear,
    feature_dim: usize,
}

impl AttentionPool {
    /// Load from `attention.{0,2}.*` under `vb`
    pub fn load(feature_dim: usize, vb: VarBuilder) -> Result<Self> {
        let vb = vb.pp("attention");
        Ok(Self {
            score_hidden: linear(feature_dim, ATTENTION_HIDDEN, vb.pp("0"))?,
            score_out: linear(ATTENTION_HIDDEN, 1, vb.pp("2"))?,
            feature_dim,
        })
    }

    /// Normalized attention weights, `(batch, 1)`
    pub fn weights(&self, xs: &Tensor) -> Result<Tensor> {
        let scores = self.score_hidden.forward(xs)?.relu()?;
        let scores = self.score_out.forward(&scores)?;
        candle_nn::ops::softmax(&scores, 1)
    }
}

impl Module for AttentionPool {
    fn forward(&self, xs: &Tensor) -> Result<Tensor> {
        let alpha = self.weights(xs)?;
        xs.broadcast_mul(&alpha)?.reshape(((), self.feature_dim))
    }
}
