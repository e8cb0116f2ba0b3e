//! Emotion reference points and color clusters

use crate::error::{AffectError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;

/// Color category an emotion resolves to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Blue,
    Red,
    Green,
    Purple,
}

impl Color {
    pub fn name(&self) -> &'static str {
        match self {
            Color::Blue => "blue",
            Color::Red => "red",
            Color::Green => "green",
            Color::Purple => "purple",
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A labeled reference point in (valence, arousal) space
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Emotion {
    pub name: String,
    pub valence: f64,
    pub arousal: f64,
}

/// Reference points in the order used for tie-breaking
const BUILTIN_EMOTIONS: &[(&str, f64, f64)] = &[
    ("Sleepy", 0.01, -1.00),
    ("Tired", -0.01, -1.00),
    ("Afraid", -0.12, 0.79),
    ("Angry", -0.40, 0.79),
    ("Calm", 0.78, -0.68),
    ("Relaxed", 0.71, -0.65),
    ("Content", 0.81, -0.55),
    ("Depressed", -0.81, -0.48),
    ("Discontent", -0.68, -0.32),
    ("Determined", 0.73, 0.26),
    ("Happy", 0.89, 0.17),
    ("Anxious", -0.72, -0.80),
    ("Good", 0.90, -0.08),
    ("Pensive", 0.03, -0.60),
    ("Impressed", 0.39, -0.06),
    ("Frustrated", -0.60, 0.40),
    ("Disappointed", -0.80, -0.03),
    ("Bored", -0.35, -0.78),
    ("Annoyed", -0.44, 0.76),
    ("Enraged", -0.18, 0.83),
    ("Excited", 0.70, 0.71),
    ("Melancholy", -0.05, -0.65),
    ("Satisfied", 0.77, -0.63),
    ("Distressed", -0.71, 0.55),
    ("Uncomfortable", -0.68, -0.37),
    ("Worried", -0.07, -0.32),
    ("Amused", 0.55, 0.19),
    ("Apathetic", -0.20, -0.12),
    ("Peaceful", 0.55, -0.80),
    ("Contemplative", 0.58, -0.60),
    ("Embarrassed", -0.31, -0.60),
    ("Sad", -0.81, -0.40),
    ("Hopeful", 0.61, -0.30),
    ("Pleased", 0.89, -0.10),
];

const BUILTIN_CLUSTERS: &[(Color, &[&str])] = &[
    (
        Color::Blue,
        &["Determined", "Happy", "Good", "Impressed", "Excited", "Amused", "Hopeful", "Pleased"],
    ),
    (
        Color::Red,
        &[
            "Depressed",
            "Discontent",
            "Anxious",
            "Disappointed",
            "Bored",
            "Uncomfortable",
            "Worried",
            "Apathetic",
            "Embarrassed",
            "Sad",
        ],
    ),
    (
        Color::Green,
        &["Afraid", "Angry", "Frustrated", "Annoyed", "Enraged", "Distressed"],
    ),
    (
        Color::Purple,
        &[
            "Sleepy",
            "Tired",
            "Calm",
            "Relaxed",
            "Content",
            "Pensive",
            "Melancholy",
            "Satisfied",
            "Peaceful",
            "Contemplative",
        ],
    ),
];

/// Ordered catalog of emotion reference points with unique names
#[derive(Debug, Clone, PartialEq)]
pub struct EmotionCatalog {
    emotions: Vec<Emotion>,
}

impl EmotionCatalog {
    /// Build a catalog, rejecting duplicate names and non-finite coordinates
    pub fn new(emotions: Vec<Emotion>) -> Result<Self> {
        let mut seen = HashSet::new();
        for emotion in &emotions {
            if !seen.insert(emotion.name.as_str()) {
                return Err(AffectError::Config(format!(
                    "duplicate emotion '{}' in catalog",
                    emotion.name
                )));
            }
            if !emotion.valence.is_finite() || !emotion.arousal.is_finite() {
                return Err(AffectError::Config(format!(
                    "emotion '{}' has a non-finite coordinate",
                    emotion.name
                )));
            }
        }
        Ok(Self { emotions })
    }

    /// The stock 34-entry catalog
    pub fn builtin() -> Self {
        Self {
            emotions: BUILTIN_EMOTIONS
                .iter()
                .map(|&(name, valence, arousal)| Emotion {
                    name: name.to_string(),
                    valence,
                    arousal,
                })
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.emotions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.emotions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Emotion> {
        self.emotions.iter()
    }

    pub fn get(&self, name: &str) -> Option<&Emotion> {
        self.emotions.iter().find(|e| e.name == name)
    }

    /// Nearest reference point to an already-normalized pair, with its distance
    ///
    /// Only a strictly smaller distance replaces the current best, so among
    /// equidistant entries the earliest one wins.
    pub fn find_emotion(&self, valence: f64, arousal: f64) -> Option<(&Emotion, f64)> {
        let mut closest = None;
        let mut min_distance = f64::INFINITY;

        for emotion in &self.emotions {
            let distance =
                ((valence - emotion.valence).powi(2) + (arousal - emotion.arousal).powi(2)).sqrt();
            if distance < min_distance {
                min_distance = distance;
                closest = Some(emotion);
            }
        }

        closest.map(|e| (e, min_distance))
    }
}

/// Color clusters partitioning the catalog names
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    pub color: Color,
    pub emotions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClusterMap {
    clusters: Vec<Cluster>,
}

impl ClusterMap {
    pub fn new(clusters: Vec<Cluster>) -> Self {
        Self { clusters }
    }

    pub fn builtin() -> Self {
        Self {
            clusters: BUILTIN_CLUSTERS
                .iter()
                .map(|&(color, names)| Cluster {
                    color,
                    emotions: names.iter().map(|n| n.to_string()).collect(),
                })
                .collect(),
        }
    }

    /// Color of the first cluster listing `name`
    pub fn color_of(&self, name: &str) -> Option<Color> {
        self.clusters
            .iter()
            .find(|c| c.emotions.iter().any(|e| e == name))
            .map(|c| c.color)
    }

    /// Check that every catalog name sits in exactly one cluster and that
    /// clusters name nothing outside the catalog
    pub fn validate(&self, catalog: &EmotionCatalog) -> Result<()> {
        let mut colors = HashSet::new();
        for cluster in &self.clusters {
            if !colors.insert(cluster.color) {
                return Err(AffectError::Config(format!(
                    "color '{}' has more than one cluster",
                    cluster.color
                )));
            }
            for name in &cluster.emotions {
                if catalog.get(name).is_none() {
                    return Err(AffectError::Config(format!(
                        "cluster '{}' lists unknown emotion '{}'",
                        cluster.color, name
                    )));
                }
            }
        }

        for emotion in catalog.iter() {
            let homes: Vec<Color> = self
                .clusters
                .iter()
                .flat_map(|c| c.emotions.iter().filter(|e| **e == emotion.name).map(move |_| c.color))
                .collect();
            match homes.len() {
                1 => {}
                0 => {
                    return Err(AffectError::Config(format!(
                        "emotion '{}' belongs to no color cluster",
                        emotion.name
                    )))
                }
                _ => {
                    return Err(AffectError::Config(format!(
                        "emotion '{}' appears {} times across clusters {:?}",
                        emotion.name,
                        homes.len(),
                        homes
                    )))
                }
            }
        }

        Ok(())
    }
}

/// On-disk form of custom emotion tables
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmotionTables {
    pub emotions: Vec<Emotion>,
    pub clusters: Vec<Cluster>,
}

impl EmotionTables {
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| AffectError::Config(format!("malformed emotion tables: {e}")))
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| AffectError::Config(format!("cannot read {:?}: {}", path, e)))?;
        Self::from_json_str(&json)
    }

    pub fn builtin() -> Self {
        Self {
            emotions: EmotionCatalog::builtin().emotions,
            clusters: ClusterMap::builtin().clusters,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn emotion(name: &str, valence: f64, arousal: f64) -> Emotion {
        Emotion {
            name: name.to_string(),
            valence,
            arousal,
        }
    }

    #[test]
    fn test_builtin_catalog_size() {
        assert_eq!(EmotionCatalog::builtin().len(), 34);
        let clustered: usize = ClusterMap::builtin()
            .clusters
            .iter()
            .map(|c| c.emotions.len())
            .sum();
        assert_eq!(clustered, 34);
    }

    #[test]
    fn test_builtin_tables_validate() {
        ClusterMap::builtin()
            .validate(&EmotionCatalog::builtin())
            .unwrap();
    }

    #[test]
    fn test_exact_match_has_zero_distance() {
        let catalog = EmotionCatalog::builtin();
        let (emotion, distance) = catalog.find_emotion(0.89, 0.17).unwrap();
        assert_eq!(emotion.name, "Happy");
        assert_eq!(distance, 0.0);
    }

    #[test]
    fn test_tie_keeps_earlier_entry() {
        // Sleepy (0.01, -1) and Tired (-0.01, -1) are equidistant from (0, -1)
        let catalog = EmotionCatalog::builtin();
        let (emotion, _) = catalog.find_emotion(0.0, -1.0).unwrap();
        assert_eq!(emotion.name, "Sleepy");

        let reversed = EmotionCatalog::new(vec![
            emotion_at("B", 0.5),
            emotion_at("A", -0.5),
        ])
        .unwrap();
        assert_eq!(reversed.find_emotion(0.0, 0.0).unwrap().0.name, "B");
    }

    fn emotion_at(name: &str, valence: f64) -> Emotion {
        emotion(name, valence, 0.0)
    }

    #[test]
    fn test_empty_catalog_finds_nothing() {
        let catalog = EmotionCatalog::new(Vec::new()).unwrap();
        assert!(catalog.find_emotion(0.0, 0.0).is_none());
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let result = EmotionCatalog::new(vec![emotion("Calm", 0.1, 0.1), emotion("Calm", 0.2, 0.2)]);
        assert!(matches!(result, Err(AffectError::Config(_))));
    }

    #[test]
    fn test_every_builtin_emotion_has_a_color() {
        let catalog = EmotionCatalog::builtin();
        let clusters = ClusterMap::builtin();
        for emotion in catalog.iter() {
            assert!(clusters.color_of(&emotion.name).is_some(), "{}", emotion.name);
        }
        assert_eq!(clusters.color_of("Happy"), Some(Color::Blue));
        assert_eq!(clusters.color_of("Sad"), Some(Color::Red));
        assert_eq!(clusters.color_of("Angry"), Some(Color::Green));
        assert_eq!(clusters.color_of("Calm"), Some(Color::Purple));
        assert_eq!(clusters.color_of("Nostalgic"), None);
    }

    #[test]
    fn test_validation_rejects_orphan() {
        let catalog = EmotionCatalog::new(vec![emotion("Calm", 0.1, 0.1), emotion("Sad", -0.8, -0.4)])
            .unwrap();
        let clusters = ClusterMap::new(vec![Cluster {
            color: Color::Purple,
            emotions: vec!["Calm".into()],
        }]);
        let err = clusters.validate(&catalog).unwrap_err();
        assert!(err.to_string().contains("Sad"));
    }

    #[test]
    fn test_validation_rejects_double_membership() {
        let catalog = EmotionCatalog::new(vec![emotion("Calm", 0.1, 0.1)]).unwrap();
        let clusters = ClusterMap::new(vec![
            Cluster {
                color: Color::Purple,
                emotions: vec!["Calm".into()],
            },
            Cluster {
                color: Color::Blue,
                emotions: vec!["Calm".into()],
            },
        ]);
        assert!(matches!(clusters.validate(&catalog), Err(AffectError::Config(_))));
    }

    #[test]
    fn test_validation_rejects_unknown_member() {
        let catalog = EmotionCatalog::new(vec![emotion("Calm", 0.1, 0.1)]).unwrap();
        let clusters = ClusterMap::new(vec![Cluster {
            color: Color::Purple,
            emotions: vec!["Calm".into(), "Serene".into()],
        }]);
        let err = clusters.validate(&catalog).unwrap_err();
        assert!(err.to_string().contains("Serene"));
    }

    #[test]
    fn test_tables_from_json() {
        let json = r#"{
            "emotions": [
                {"name": "Up", "valence": 0.5, "arousal": 0.5},
                {"name": "Down", "valence": -0.5, "arousal": -0.5}
            ],
            "clusters": [
                {"color": "blue", "emotions": ["Up"]},
                {"color": "red", "emotions": ["Down"]}
            ]
        }"#;
        let tables = EmotionTables::from_json_str(json).unwrap();
        assert_eq!(tables.emotions[1].name, "Down");
        assert_eq!(tables.clusters[1].color, Color::Red);
    }

    #[test]
    fn test_malformed_json_is_config_error() {
        let result = EmotionTables::from_json_str("{\"emotions\": 3}");
        assert!(matches!(result, Err(AffectError::Config(_))));
    }
}
