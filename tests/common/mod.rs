//! Shared fixtures for integration tests

#![allow(dead_code)]

use candle_core::{Device, Tensor};
use moodify::network::NetworkParams;
use std::collections::HashMap;
use std::path::Path;

/// Deterministic weights covering every tensor the network expects
///
/// Small magnitudes keep activations finite through both conv blocks;
/// running variances are 1 so batch norm stays well conditioned.
pub fn synthetic_weights(params: &NetworkParams, seed: usize) -> HashMap<String, Tensor> {
    params
        .weight_shapes()
        .expect("params fit the analysis window")
        .into_iter()
        .enumerate()
        .map(|(n, (name, shape))| {
            let len: usize = shape.iter().product();
            let values: Vec<f32> = if name.ends_with("running_var") {
                vec![1.0; len]
            } else if name.ends_with("running_mean") {
                vec![0.0; len]
            } else {
                (0..len)
                    .map(|i| ((((i + seed) * 7919 + n * 104_729) % 2003) as f32 - 1001.0) * 1e-5)
                    .collect()
            };
            let tensor = Tensor::from_vec(values, shape, &Device::Cpu).expect("tensor shape");
            (name, tensor)
        })
        .collect()
}

/// Write synthetic weights for `params` to a safetensors file
pub fn write_weights(path: &Path, params: &NetworkParams, seed: usize) {
    candle_core::safetensors::save(&synthetic_weights(params, seed), path)
        .expect("Failed to write weights");
}

/// Write a 16-bit PCM WAV with one sample per frame replicated across channels
pub fn write_wav(path: &Path, sample_rate: u32, channels: u16, samples: &[f32]) {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).expect("Failed to create WAV");
    for &sample in samples {
        let value = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
        for _ in 0..channels {
            writer.write_sample(value).expect("Failed to write sample");
        }
    }
    writer.finalize().expect("Failed to finalize WAV");
}

/// `seconds` of a sine tone at `freq` Hz
pub fn sine(freq: f32, sample_rate: u32, seconds: f32, amplitude: f32) -> Vec<f32> {
    let len = (sample_rate as f32 * seconds) as usize;
    (0..len)
        .map(|i| amplitude * (2.0 * std::f32::consts::PI * freq * i as f32 / sample_rate as f32).sin())
        .collect()
}
