//! Rebuild parameters and layout selection.
//!
//! [`GraphParams`] controls graph construction and is validated up front:
//! an invalid value is an input error and no graph is produced.
//! [`LayoutStrategy`] and [`Dimensionality`] parse from their user-facing
//! spellings and reject anything unknown rather than defaulting.
//! [`MapConfig`] bundles everything a rebuild needs and loads from JSON with
//! per-field defaults.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, SourceError};

/// Parameters for [`SimilarityGraphBuilder`](crate::builder::SimilarityGraphBuilder).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphParams {
    /// Minimum cosine similarity for an edge, exclusive range `(0, 1)`.
    pub min_similarity: f32,
    /// Per-node neighbour cap, at least 1.
    pub top_k: usize,
    /// Node cap, at least 1.
    pub max_nodes: usize,
    /// Keep degree-0 nodes.
    pub include_isolates: bool,
    /// Keep only notes sharing at least one of these tags.
    pub tag_filter: Option<Vec<String>>,
}

impl Default for GraphParams {
    fn default() -> Self {
        GraphParams {
            min_similarity: 0.45,
            top_k: 3,
            max_nodes: 200,
            include_isolates: true,
            tag_filter: None,
        }
    }
}

impl GraphParams {
    pub fn validate(&self) -> Result<(), CoreError> {
        if !(self.min_similarity > 0.0 && self.min_similarity < 1.0) {
            return Err(CoreError::InvalidConfig {
                field: "min_similarity",
                reason: format!("must be within (0, 1), got {}", self.min_similarity),
            });
        }
        if self.top_k < 1 {
            return Err(CoreError::InvalidConfig {
                field: "top_k",
                reason: "must be at least 1".into(),
            });
        }
        if self.max_nodes < 1 {
            return Err(CoreError::InvalidConfig {
                field: "max_nodes",
                reason: "must be at least 1".into(),
            });
        }
        Ok(())
    }

    /// The tag filter as a slice, treating an empty list like no filter.
    pub fn tags(&self) -> Option<&[String]> {
        self.tag_filter.as_deref().filter(|t| !t.is_empty())
    }
}

/// Layout strategy selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutStrategy {
    /// Free-form physics relaxation.
    #[default]
    Force,
    /// Breadth-first levels from the highest-degree roots.
    Tree,
    /// Concentric degree rings around the highest-degree node.
    Radial,
    /// Rank-ordered golden-angle spiral.
    Spiral,
}

impl LayoutStrategy {
    pub const ALL: [LayoutStrategy; 4] = [
        LayoutStrategy::Force,
        LayoutStrategy::Tree,
        LayoutStrategy::Radial,
        LayoutStrategy::Spiral,
    ];

    pub fn name(self) -> &'static str {
        match self {
            LayoutStrategy::Force => "force",
            LayoutStrategy::Tree => "tree",
            LayoutStrategy::Radial => "radial",
            LayoutStrategy::Spiral => "spiral",
        }
    }

    /// Structured strategies hold their placement before smoothing.
    pub fn is_structured(self) -> bool {
        !matches!(self, LayoutStrategy::Force)
    }
}

impl fmt::Display for LayoutStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for LayoutStrategy {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "force" => Ok(LayoutStrategy::Force),
            "tree" => Ok(LayoutStrategy::Tree),
            "radial" => Ok(LayoutStrategy::Radial),
            "spiral" => Ok(LayoutStrategy::Spiral),
            _ => Err(CoreError::UnknownStrategy { name: s.to_string() }),
        }
    }
}

/// Number of spatial axes in a layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Dimensionality {
    #[default]
    Two,
    Three,
}

impl Dimensionality {
    pub fn axes(self) -> u8 {
        match self {
            Dimensionality::Two => 2,
            Dimensionality::Three => 3,
        }
    }

    pub fn is_3d(self) -> bool {
        matches!(self, Dimensionality::Three)
    }
}

impl TryFrom<u8> for Dimensionality {
    type Error = CoreError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            2 => Ok(Dimensionality::Two),
            3 => Ok(Dimensionality::Three),
            _ => Err(CoreError::UnsupportedDimensionality { value }),
        }
    }
}

impl From<Dimensionality> for u8 {
    fn from(d: Dimensionality) -> u8 {
        d.axes()
    }
}

impl fmt::Display for Dimensionality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}d", self.axes())
    }
}

/// Full per-rebuild configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    pub graph: GraphParams,
    pub strategy: LayoutStrategy,
    pub dimensionality: Dimensionality,
    /// Base seed for layout randomness.
    pub seed: u64,
}

impl MapConfig {
    pub fn validate(&self) -> Result<(), CoreError> {
        self.graph.validate()
    }

    pub fn from_json(json: &str) -> Result<Self, SourceError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, SourceError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let params = GraphParams::default();
        assert!(params.validate().is_ok());
        assert_eq!(params.min_similarity, 0.45);
        assert_eq!(params.top_k, 3);
        assert_eq!(params.max_nodes, 200);
        assert!(params.include_isolates);
    }

    #[test]
    fn rejects_out_of_range_similarity() {
        for bad in [0.0, 1.0, -0.2, 1.5, f32::NAN] {
            let params = GraphParams {
                min_similarity: bad,
                ..GraphParams::default()
            };
            let err = params.validate().unwrap_err();
            assert!(err.is_input_error(), "{bad} should be rejected");
        }
    }

    #[test]
    fn rejects_zero_caps() {
        let params = GraphParams {
            top_k: 0,
            ..GraphParams::default()
        };
        assert!(matches!(
            params.validate(),
            Err(CoreError::InvalidConfig { field: "top_k", .. })
        ));

        let params = GraphParams {
            max_nodes: 0,
            ..GraphParams::default()
        };
        assert!(matches!(
            params.validate(),
            Err(CoreError::InvalidConfig { field: "max_nodes", .. })
        ));
    }

    #[test]
    fn empty_tag_filter_is_no_filter() {
        let params = GraphParams {
            tag_filter: Some(vec![]),
            ..GraphParams::default()
        };
        assert!(params.tags().is_none());
    }

    #[test]
    fn strategy_parsing() {
        assert_eq!("radial".parse::<LayoutStrategy>().unwrap(), LayoutStrategy::Radial);
        assert_eq!(" Tree ".parse::<LayoutStrategy>().unwrap(), LayoutStrategy::Tree);
        let err = "grid".parse::<LayoutStrategy>().unwrap_err();
        assert!(matches!(err, CoreError::UnknownStrategy { ref name } if name == "grid"));
        for s in LayoutStrategy::ALL {
            assert_eq!(s.name().parse::<LayoutStrategy>().unwrap(), s);
        }
    }

    #[test]
    fn dimensionality_parsing() {
        assert_eq!(Dimensionality::try_from(3).unwrap(), Dimensionality::Three);
        assert!(Dimensionality::try_from(4).is_err());
        let d: Dimensionality = serde_json::from_str("2").unwrap();
        assert_eq!(d, Dimensionality::Two);
        assert!(serde_json::from_str::<Dimensionality>("1").is_err());
    }

    #[test]
    fn map_config_fills_defaults() {
        let config = MapConfig::from_json(r#"{"strategy":"spiral","graph":{"top_k":5}}"#).unwrap();
        assert_eq!(config.strategy, LayoutStrategy::Spiral);
        assert_eq!(config.graph.top_k, 5);
        assert_eq!(config.graph.max_nodes, 200);
        assert_eq!(config.dimensionality, Dimensionality::Two);

        assert!(MapConfig::from_json(r#"{"strategy":"grid"}"#).is_err());
    }
}
