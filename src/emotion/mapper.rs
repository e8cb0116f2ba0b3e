//! Raw affect scores to named emotions

use super::catalog::{ClusterMap, Color, Emotion, EmotionCatalog, EmotionTables};
use crate::error::{AffectError, Result};
use crate::pipeline::AffectPair;
use serde::Serialize;

/// Rescale a raw regressor output from the 1..9 rating scale to the
/// catalog's coordinate space
///
/// `normalize_value(1) == -1`, `normalize_value(5) == 0`.
pub fn normalize_value(value: f64) -> f64 {
    (value - 1.0) / 4.0 - 1.0
}

/// Nearest emotion for a raw (valence, arousal) pair
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmotionMatch {
    pub label: String,
    pub color: Option<Color>,
    /// Raw regressor outputs
    pub valence: f64,
    pub arousal: f64,
    /// Distance from the normalized pair to the winning reference point
    pub distance: f64,
}

#[derive(Debug, Clone)]
pub struct EmotionMapper {
    catalog: EmotionCatalog,
    clusters: ClusterMap,
}

impl EmotionMapper {
    /// Mapper over custom tables; fails unless every emotion has exactly one color
    pub fn new(catalog: EmotionCatalog, clusters: ClusterMap) -> Result<Self> {
        if catalog.is_empty() {
            return Err(AffectError::Config("emotion catalog is empty".into()));
        }
        clusters.validate(&catalog)?;
        Ok(Self { catalog, clusters })
    }

    /// Mapper over the stock tables, checked like any custom set
    pub fn builtin() -> Result<Self> {
        Self::from_tables(EmotionTables::builtin())
    }

    pub fn from_tables(tables: EmotionTables) -> Result<Self> {
        let catalog = EmotionCatalog::new(tables.emotions)?;
        Self::new(catalog, ClusterMap::new(tables.clusters))
    }

    pub fn catalog(&self) -> &EmotionCatalog {
        &self.catalog
    }

    /// Nearest catalog entry for a raw pair
    fn nearest(&self, valence: f64, arousal: f64) -> Result<(&Emotion, f64)> {
        if !valence.is_finite() || !arousal.is_finite() {
            return Err(AffectError::Feature(format!(
                "non-finite affect pair ({}, {})",
                valence, arousal
            )));
        }

        self.catalog
            .find_emotion(normalize_value(valence), normalize_value(arousal))
            .ok_or_else(|| AffectError::Config("emotion catalog is empty".into()))
    }

    /// Map raw regressor outputs to the nearest catalog emotion
    pub fn map(&self, pair: AffectPair) -> Result<EmotionMatch> {
        let (emotion, distance) = self.nearest(pair.valence, pair.arousal)?;
        log::debug!(
            "({:.3}, {:.3}) -> {} at {:.4}",
            pair.valence,
            pair.arousal,
            emotion.name,
            distance
        );

        Ok(EmotionMatch {
            label: emotion.name.clone(),
            color: self.clusters.color_of(&emotion.name),
            valence: pair.valence,
            arousal: pair.arousal,
            distance,
        })
    }

    /// Color of the emotion nearest to a raw pair
    ///
    /// `None` only when the winning emotion sits in no cluster.
    pub fn get_colormap(&self, valence: f64, arousal: f64) -> Result<Option<Color>> {
        let (emotion, _) = self.nearest(valence, arousal)?;
        Ok(self.clusters.color_of(&emotion.name))
    }
}
