//! Pipeline configuration

use crate::emotion::{EmotionMapper, EmotionTables};
use crate::error::Result;
use crate::network::NetworkParams;
use std::path::PathBuf;

/// Where the models and emotion tables come from
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Valence network weights (`.pth`/`.pt` state dict or `.safetensors`)
    pub valence_model: PathBuf,

    /// Arousal network weights
    pub arousal_model: PathBuf,

    pub valence_params: NetworkParams,
    pub arousal_params: NetworkParams,

    /// Custom emotion tables (None = builtin catalog)
    pub catalog: Option<PathBuf>,
}

impl PipelineConfig {
    /// Create a configuration with the stock network shapes
    pub fn new(valence_model: PathBuf, arousal_model: PathBuf) -> Self {
        Self {
            valence_model,
            arousal_model,
            valence_params: NetworkParams::valence(),
            arousal_params: NetworkParams::arousal(),
            catalog: None,
        }
    }

    /// Load emotion tables from a JSON file instead of the builtin set
    pub fn with_catalog(mut self, path: PathBuf) -> Self {
        self.catalog = Some(path);
        self
    }

    /// Emotion mapper for this configuration
    ///
    /// Builtin and custom tables pass the same integrity checks, so a bad
    /// table fails here before any audio is read.
    pub fn emotion_mapper(&self) -> Result<EmotionMapper> {
        match &self.catalog {
            Some(path) => {
                log::info!("Loading emotion tables from {:?}", path);
                EmotionMapper::from_tables(EmotionTables::from_json_file(path)?)
            }
            None => EmotionMapper::builtin(),
        }
    }
}
