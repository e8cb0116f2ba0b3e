//! Emotion lookup
//!
//! Maps a (valence, arousal) pair to the nearest named reference point and
//! the color cluster that point belongs to.

mod catalog;
mod mapper;

pub use catalog::{Cluster, ClusterMap, Color, Emotion, EmotionCatalog, EmotionTables};
pub use mapper::{normalize_value, EmotionMapper, EmotionMatch};
