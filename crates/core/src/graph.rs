//! Graph documents for the visualization engine.
//!
//! [`from_scored_entities`] and [`from_image_entities`] turn ranked
//! entities into a node/edge/combo document. Both are pure: they never
//! touch job state, so a failed build leaves nothing half-written.

use std::collections::HashSet;

use serde::Serialize;

use crate::entity::ScoredEntity;
use crate::error::CoreError;
use crate::palette::{assign_colors, Rgb};
use crate::types::ImageFile;

/// Default label length before truncation.
pub const DEFAULT_LABEL_CHARS: usize = 30;

/// Base added to the normalised score before scaling to a node size.
const SIZE_OFFSET: f64 = 2.0;

/// Multiplier applied to the offset, normalised score.
const SIZE_SCALE: f64 = 5.0;

/// Visual parameters applied when building a document.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphStyle {
    /// Colour of the lowest-scoring node.
    pub low_color: Rgb,
    /// Colour of the highest-scoring node.
    pub high_color: Rgb,
    /// Labels longer than this many characters are truncated.
    pub label_chars: usize,
}

impl Default for GraphStyle {
    fn default() -> Self {
        Self {
            low_color: Rgb::new(0x5b, 0x8f, 0xf9),
            high_color: Rgb::new(0xf4, 0x66, 0x4a),
            label_chars: DEFAULT_LABEL_CHARS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphNode {
    pub id: String,
    pub label: String,
    pub score: f64,
    pub size: f64,
    /// The untruncated label.
    pub tooltip: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<Rgb>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub combo_id: Option<String>,
    /// Image reference used as the node icon.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub img: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Combo {
    pub id: String,
}

/// A node/edge/combo document.
///
/// Every edge endpoint names a node in `nodes`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GraphDocument {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub combos: Option<Vec<Combo>>,
}

impl GraphDocument {
    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.id == id)
    }
}

/// Build a document from scored keywords or sentences.
///
/// One node per entity, in input order. Each `(entity, connected)` pair
/// becomes one edge; reciprocal and duplicate pairs are kept.
pub fn from_scored_entities(entities: &[ScoredEntity], style: &GraphStyle) -> GraphDocument {
    let nodes = build_nodes(entities, style);
    let edges = build_edges(entities);
    GraphDocument {
        nodes,
        edges,
        combos: None,
    }
}

/// Build a document pairing each uploaded image with its ranked node.
///
/// `files[i]` supplies the icon for `ranked[i]`. When `clusters` is given,
/// each node joins the combo of the first cluster containing its id.
pub fn from_image_entities(
    files: &[ImageFile],
    ranked: &[ScoredEntity],
    clusters: Option<&[Vec<String>]>,
    style: &GraphStyle,
) -> Result<GraphDocument, CoreError> {
    if files.len() != ranked.len() {
        return Err(CoreError::LengthMismatch {
            files: files.len(),
            nodes: ranked.len(),
        });
    }

    let mut nodes = build_nodes(ranked, style);
    for (node, file) in nodes.iter_mut().zip(files) {
        node.img = Some(file.image_ref().to_string());
    }

    let combos = clusters.map(|clusters| {
        for node in &mut nodes {
            node.combo_id = cluster_of(&node.id, clusters).map(combo_id);
        }
        (0..clusters.len())
            .map(|index| Combo {
                id: combo_id(index),
            })
            .collect()
    });

    Ok(GraphDocument {
        nodes,
        edges: build_edges(ranked),
        combos,
    })
}

/// Index of the first cluster containing `id`.
pub fn cluster_of(id: &str, clusters: &[Vec<String>]) -> Option<usize> {
    clusters
        .iter()
        .position(|group| group.iter().any(|member| member == id))
}

/// Node size for `score` relative to the mean of all scores.
///
/// A zero or non-finite mean treats every node as average-sized.
pub fn node_size(score: f64, mean: f64) -> f64 {
    let ratio = if mean != 0.0 && mean.is_finite() {
        score / mean
    } else {
        1.0
    };
    (ratio + SIZE_OFFSET) * SIZE_SCALE
}

/// Truncate to at most `max_chars` characters, on a char boundary.
pub fn truncate_label(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

fn combo_id(index: usize) -> String {
    format!("cluster-{index}")
}

fn mean(scores: &[f64]) -> f64 {
    if scores.is_empty() {
        return 0.0;
    }
    scores.iter().sum::<f64>() / scores.len() as f64
}

fn build_nodes(entities: &[ScoredEntity], style: &GraphStyle) -> Vec<GraphNode> {
    let scores: Vec<f64> = entities.iter().map(|e| e.score).collect();
    let mean = mean(&scores);
    let colors = assign_colors(&scores, style.low_color, style.high_color);

    entities
        .iter()
        .zip(colors)
        .map(|(entity, color)| {
            let full = entity.tooltip.clone().unwrap_or_else(|| entity.name.clone());
            GraphNode {
                id: entity.id.clone(),
                label: truncate_label(&entity.name, style.label_chars),
                score: entity.score,
                size: node_size(entity.score, mean),
                tooltip: full,
                color: Some(color),
                combo_id: None,
                img: None,
            }
        })
        .collect()
}

fn build_edges(entities: &[ScoredEntity]) -> Vec<GraphEdge> {
    let known: HashSet<&str> = entities.iter().map(|e| e.id.as_str()).collect();
    entities
        .iter()
        .flat_map(|entity| {
            entity
                .connected
                .iter()
                .filter(|other| known.contains(other.as_str()))
                .map(move |other| GraphEdge {
                    source: entity.id.clone(),
                    target: other.clone(),
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn keywords() -> Vec<ScoredEntity> {
        vec![
            ScoredEntity::new("1", "alpha", 2.0).connected_to(["2"]),
            ScoredEntity::new("2", "beta", 1.0),
        ]
    }

    fn images(n: usize) -> Vec<ImageFile> {
        (0..n)
            .map(|i| ImageFile::new(format!("img{i}.png"), vec![0]).unwrap())
            .collect()
    }

    #[test]
    fn one_node_per_entity_and_edges_from_connections() {
        let doc = from_scored_entities(&keywords(), &GraphStyle::default());
        assert_eq!(doc.nodes.len(), 2);
        assert_eq!(
            doc.edges,
            vec![GraphEdge {
                source: "1".into(),
                target: "2".into()
            }]
        );
        assert!(doc.combos.is_none());
    }

    #[test]
    fn size_is_relative_to_mean_score() {
        let entities = vec![
            ScoredEntity::new("a", "a", 3.0),
            ScoredEntity::new("b", "b", 1.0),
        ];
        let doc = from_scored_entities(&entities, &GraphStyle::default());
        // mean = 2.0
        assert!((doc.nodes[0].size - (3.0 / 2.0 + 2.0) * 5.0).abs() < 1e-9);
        assert!((doc.nodes[1].size - (1.0 / 2.0 + 2.0) * 5.0).abs() < 1e-9);
    }

    #[test]
    fn zero_mean_keeps_sizes_finite() {
        let entities = vec![ScoredEntity::new("a", "a", 0.0)];
        let doc = from_scored_entities(&entities, &GraphStyle::default());
        assert_eq!(doc.nodes[0].size, 15.0);
    }

    #[test]
    fn highest_score_gets_high_colour() {
        let style = GraphStyle::default();
        let doc = from_scored_entities(&keywords(), &style);
        assert_eq!(doc.nodes[0].color, Some(style.high_color));
        assert_eq!(doc.nodes[1].color, Some(style.low_color));
    }

    #[test]
    fn long_labels_are_truncated_but_tooltip_is_full() {
        let text = "a sentence that is clearly longer than thirty characters";
        let entities = vec![ScoredEntity::new("s", text, 1.0)];
        let doc = from_scored_entities(&entities, &GraphStyle::default());
        assert_eq!(doc.nodes[0].label.chars().count(), DEFAULT_LABEL_CHARS);
        assert_eq!(doc.nodes[0].tooltip, text);
    }

    #[test]
    fn reciprocal_edges_are_kept_and_dangling_ones_dropped() {
        let entities = vec![
            ScoredEntity::new("1", "x", 1.0).connected_to(["2", "99"]),
            ScoredEntity::new("2", "y", 1.0).connected_to(["1"]),
        ];
        let doc = from_scored_entities(&entities, &GraphStyle::default());
        assert_eq!(doc.edges.len(), 2);
        assert!(doc
            .edges
            .iter()
            .all(|e| doc.node(&e.source).is_some() && doc.node(&e.target).is_some()));
    }

    #[test]
    fn image_nodes_pair_files_by_index() {
        let doc =
            from_image_entities(&images(2), &keywords(), None, &GraphStyle::default()).unwrap();
        assert_eq!(doc.nodes.len(), 2);
        assert_eq!(doc.nodes[0].img.as_deref(), Some("img0.png"));
        assert_eq!(doc.nodes[1].img.as_deref(), Some("img1.png"));
        assert!(doc.combos.is_none());
    }

    #[test]
    fn image_length_mismatch_is_an_error() {
        let result = from_image_entities(&images(3), &keywords(), None, &GraphStyle::default());
        assert_matches!(result, Err(CoreError::LengthMismatch { files: 3, nodes: 2 }));
    }

    #[test]
    fn clusters_become_combos() {
        let clusters = vec![vec!["2".to_string()], vec!["1".to_string(), "7".to_string()]];
        let doc = from_image_entities(
            &images(2),
            &keywords(),
            Some(&clusters),
            &GraphStyle::default(),
        )
        .unwrap();
        let combos = doc.combos.as_ref().unwrap();
        assert_eq!(combos.len(), 2);
        assert_eq!(doc.nodes[0].combo_id.as_deref(), Some("cluster-1"));
        assert_eq!(doc.nodes[1].combo_id.as_deref(), Some("cluster-0"));
    }

    #[test]
    fn cluster_lookup_misses_unknown_ids() {
        let clusters = vec![vec!["a".to_string()]];
        assert_eq!(cluster_of("a", &clusters), Some(0));
        assert_eq!(cluster_of("b", &clusters), None);
    }

    #[test]
    fn document_serializes_combo_id_in_camel_case() {
        let clusters = vec![vec!["1".to_string(), "2".to_string()]];
        let doc = from_image_entities(
            &images(2),
            &keywords(),
            Some(&clusters),
            &GraphStyle::default(),
        )
        .unwrap();
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["nodes"][0]["comboId"], "cluster-0");
        assert_eq!(json["combos"][0]["id"], "cluster-0");
        assert!(json["nodes"][0]["color"].is_string());
    }
}
