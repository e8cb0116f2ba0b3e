//! Convolutional-attention regression network

use super::attention::AttentionPool;
use super::params::{NetworkParams, BLOCK_POOL, DROPOUT, FINAL_POOL, KERNEL_SIZE};
use super::traits::AffectModel;
use crate::error::{AffectError, Result};
use crate::features::FeatureDescriptor;
use candle_core::{DType, Device, Module, ModuleT, Tensor};
use candle_nn::{
    batch_norm, conv1d, linear, BatchNorm, BatchNormConfig, Conv1d, Conv1dConfig, Dropout, Linear,
    VarBuilder,
};
use std::path::Path;

/// Average pooling along the last axis of a `(batch, channels, time)` tensor
fn avg_pool1d(xs: &Tensor, size: usize) -> candle_core::Result<Tensor> {
    xs.unsqueeze(2)?
        .avg_pool2d_with_stride((1, size), (1, size))?
        .squeeze(2)
}

/// Conv1d → BatchNorm → ReLU → AvgPool(2)
#[derive(Debug, Clone)]
struct ConvBlock {
    conv: Conv1d,
    norm: BatchNorm,
}

impl ConvBlock {
    fn load(in_channels: usize, out_channels: usize, vb: VarBuilder) -> candle_core::Result<Self> {
        let conv = conv1d(
            in_channels,
            out_channels,
            KERNEL_SIZE,
            Conv1dConfig::default(),
            vb.pp("0"),
        )?;
        let norm = batch_norm(out_channels, BatchNormConfig::default(), vb.pp("1"))?;
        Ok(Self { conv, norm })
    }

    fn forward_t(&self, xs: &Tensor, train: bool) -> candle_core::Result<Tensor> {
        let xs = self.conv.forward(xs)?;
        let xs = self.norm.forward_t(&xs, train)?.relu()?;
        avg_pool1d(&xs, BLOCK_POOL)
    }
}

/// One valence or arousal regressor
///
/// Both instances share this definition; [`NetworkParams`] carries the
/// filter counts and hidden width that differ between them.
#[derive(Debug, Clone)]
pub struct AudioNet {
    params: NetworkParams,
    conv1: ConvBlock,
    conv2: ConvBlock,
    attention: AttentionPool,
    fc1: Linear,
    fc2: Linear,
    dropout: Dropout,
    device: Device,
}

impl AudioNet {
    /// Load trained weights from a `.safetensors` file or a PyTorch `.pth`/`.pt` state dict
    pub fn load(path: &Path, params: NetworkParams, device: &Device) -> Result<Self> {
        if !path.exists() {
            return Err(AffectError::ModelNotFound(path.to_path_buf()));
        }

        log::debug!("Loading network weights from {:?}", path);

        let mismatch = |e: candle_core::Error| AffectError::WeightMismatch {
            path: path.to_path_buf(),
            reason: e.to_string(),
        };

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        let vb = match extension.as_deref() {
            Some("safetensors") => {
                let tensors = candle_core::safetensors::load(path, device).map_err(mismatch)?;
                VarBuilder::from_tensors(tensors, DType::F32, device)
            }
            _ => VarBuilder::from_pth(path, DType::F32, device).map_err(mismatch)?,
        };

        match Self::from_var_builder(params, vb) {
            Err(AffectError::Tensor(e)) => Err(mismatch(e)),
            other => other,
        }
    }

    /// Build from any variable source whose keys follow the state-dict layout
    pub fn from_var_builder(params: NetworkParams, vb: VarBuilder) -> Result<Self> {
        let flat_dim = params.flat_dim()?;
        let device = vb.device().clone();

        let conv1 = ConvBlock::load(params.in_channels, params.filters1, vb.pp("conv1"))?;
        let conv2 = ConvBlock::load(params.filters1, params.filters2, vb.pp("conv2"))?;
        let attention = AttentionPool::load(flat_dim, vb.pp("attention"))?;
        let fc1 = linear(flat_dim, params.hidden, vb.pp("fc1"))?;
        let fc2 = linear(params.hidden, params.out_size, vb.pp("fc2"))?;

        Ok(Self {
            params,
            conv1,
            conv2,
            attention,
            fc1,
            fc2,
            dropout: Dropout::new(DROPOUT),
            device,
        })
    }

    /// Forward pass over `(batch, channels, frames)`; `train` enables dropout
    /// and batch statistics
    pub fn forward_t(&self, xs: &Tensor, train: bool) -> candle_core::Result<Tensor> {
        let xs = self.conv1.forward_t(xs, train)?;
        let xs = self.conv2.forward_t(&xs, train)?;
        let xs = avg_pool1d(&xs, FINAL_POOL)?;
        let xs = xs.flatten_from(1)?;
        let xs = self.attention.forward(&xs)?;
        let xs = self.fc1.forward(&xs)?;
        let xs = self.dropout.forward_t(&xs, train)?.relu()?;
        self.fc2.forward(&xs)
    }

    /// Descriptor as a `(1, channels, frames)` tensor, after shape checks
    fn input_tensor(&self, descriptor: &FeatureDescriptor) -> Result<Tensor> {
        if descriptor.channels() != self.params.in_channels {
            return Err(AffectError::shape(
                format!("{} channels", self.params.in_channels),
                format!("{} channels", descriptor.channels()),
            ));
        }
        if descriptor.frames() != self.params.input_frames {
            return Err(AffectError::shape(
                format!("{} frames", self.params.input_frames),
                format!("{} frames", descriptor.frames()),
            ));
        }

        let tensor = Tensor::from_vec(
            descriptor.to_vec(),
            (1, descriptor.channels(), descriptor.frames()),
            &self.device,
        )?;
        Ok(tensor)
    }
}

impl AffectModel for AudioNet {
    fn predict(&self, descriptor: &FeatureDescriptor) -> Result<f32> {
        let input = self.input_tensor(descriptor)?;
        let output = self.forward_t(&input, false)?;
        let values: Vec<f32> = output.flatten_all()?.to_vec1()?;
        match values.as_slice() {
            [value] => Ok(*value),
            _ => Err(AffectError::shape(
                "a single output value",
                format!("{} values", values.len()),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;
    use std::collections::HashMap;

    const FRAMES: usize = 120;

    fn small_params() -> NetworkParams {
        NetworkParams {
            in_channels: 39,
            filters1: 4,
            filters2: 6,
            hidden: 8,
            out_size: 1,
            input_frames: FRAMES,
        }
    }

    fn weights(params: &NetworkParams) -> HashMap<String, Tensor> {
        params
            .weight_shapes()
            .unwrap()
            .into_iter()
            .enumerate()
            .map(|(n, (name, shape))| {
                let len: usize = shape.iter().product();
                let values: Vec<f32> = if name.ends_with("running_var") {
                    vec![1.0; len]
                } else {
                    (0..len)
                        .map(|i| (((i * 31 + n * 17) % 23) as f32 - 11.0) / 50.0)
                        .collect()
                };
                let tensor = Tensor::from_vec(values, shape, &Device::Cpu).unwrap();
                (name, tensor)
            })
            .collect()
    }

    fn network(params: NetworkParams) -> AudioNet {
        let vb = VarBuilder::from_tensors(weights(&params), DType::F32, &Device::Cpu);
        AudioNet::from_var_builder(params, vb).unwrap()
    }

    fn descriptor(channels: usize, frames: usize) -> FeatureDescriptor {
        FeatureDescriptor::new(Array2::from_shape_fn((channels, frames), |(c, t)| {
            ((c * 13 + t * 7) % 19) as f32 / 19.0 - 0.5
        }))
    }

    #[test]
    fn test_inference_is_deterministic() {
        let net = network(small_params());
        let input = descriptor(39, FRAMES);
        let a = net.predict(&input).unwrap();
        let b = net.predict(&input).unwrap();
        assert!(a.is_finite());
        assert_eq!(a.to_bits(), b.to_bits());
    }

    #[test]
    fn test_wrong_channel_count_is_shape_error() {
        let net = network(small_params());
        let result = net.predict(&descriptor(38, FRAMES));
        assert!(matches!(result, Err(AffectError::Shape { .. })));
    }

    #[test]
    fn test_wrong_frame_count_is_shape_error() {
        let net = network(small_params());
        let result = net.predict(&descriptor(39, FRAMES + 1));
        assert!(matches!(result, Err(AffectError::Shape { .. })));
    }

    #[test]
    fn test_multi_output_is_shape_error() {
        let params = NetworkParams {
            out_size: 2,
            ..small_params()
        };
        let net = network(params);
        let result = net.predict(&descriptor(39, FRAMES));
        assert!(matches!(result, Err(AffectError::Shape { .. })));
    }

    #[test]
    fn test_missing_tensor_is_rejected() {
        let params = small_params();
        let mut tensors = weights(&params);
        tensors.remove("fc2.bias");
        let vb = VarBuilder::from_tensors(tensors, DType::F32, &Device::Cpu);
        assert!(AudioNet::from_var_builder(params, vb).is_err());
    }

    #[test]
    fn test_intermediate_shapes() {
        let net = network(small_params());
        let input = Tensor::zeros((1, 39, FRAMES), DType::F32, &Device::Cpu).unwrap();
        let xs = net.conv1.forward_t(&input, false).unwrap();
        assert_eq!(xs.dims(), &[1, 4, 55]);
        let xs = net.conv2.forward_t(&xs, false).unwrap();
        assert_eq!(xs.dims(), &[1, 6, 23]);
        let xs = avg_pool1d(&xs, FINAL_POOL).unwrap();
        assert_eq!(xs.dims(), &[1, 6, 2]);
        assert_eq!(xs.flatten_from(1).unwrap().dims(), &[1, 12]);
    }

    #[test]
    fn test_missing_file_is_model_not_found() {
        let result = AudioNet::load(
            Path::new("/nonexistent/valence.pth"),
            NetworkParams::valence(),
            &Device::Cpu,
        );
        assert!(matches!(result, Err(AffectError::ModelNotFound(_))));
    }
}
