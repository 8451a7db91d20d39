use serde::{Deserialize, Serialize};

use crate::taxonomy::{EntityKind, RelationKind};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphNode {
    pub id: String,
    pub code: String,
    pub label: String,
    #[serde(rename = "type")]
    pub kind: EntityKind,
    /// Hop count from the center, fixed once assigned within a build.
    pub distance: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signalling_value: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub centrality: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub degree: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vx: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vy: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fx: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fy: Option<f32>,
}

impl GraphNode {
    pub fn position(&self) -> Option<(f32, f32)> {
        Some((self.x?, self.y?))
    }

    pub fn is_fixed(&self) -> bool {
        self.fx.is_some() || self.fy.is_some()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphEdge {
    pub id: String,
    /// Lower-hop endpoint.
    pub source: String,
    /// Higher-hop endpoint.
    pub target: String,
    pub relation_type: RelationKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signalling_value: Option<f32>,
}

/// Canonical id of the relation between an occupation and a skill, independent
/// of the direction it was discovered in.
pub fn edge_id(occupation_id: &str, skill_id: &str) -> String {
    format!("{occupation_id}-{skill_id}")
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub kind: EntityKind,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelStats {
    pub shown: usize,
    pub total: usize,
}

impl LevelStats {
    pub fn is_truncated(self) -> bool {
        self.shown < self.total
    }

    pub(crate) fn record(&mut self, shown: usize, total: usize) {
        self.shown += shown;
        self.total += total;
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TruncationStats {
    pub dist1: LevelStats,
    pub dist2: LevelStats,
    pub dist3: LevelStats,
}

impl TruncationStats {
    pub fn any_truncated(&self) -> bool {
        self.dist1.is_truncated() || self.dist2.is_truncated() || self.dist3.is_truncated()
    }

    pub fn level(&self, distance: u8) -> Option<LevelStats> {
        match distance {
            1 => Some(self.dist1),
            2 => Some(self.dist2),
            3 => Some(self.dist3),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphState {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
    pub center_node_id: String,
    pub center_node_type: EntityKind,
    pub history: Vec<HistoryEntry>,
    pub is_truncated: bool,
    pub truncation_stats: TruncationStats,
}

impl GraphState {
    pub fn empty(center_id: &str, center_kind: EntityKind) -> Self {
        Self {
            nodes: Vec::new(),
            edges: Vec::new(),
            center_node_id: center_id.to_owned(),
            center_node_type: center_kind,
            history: Vec::new(),
            is_truncated: false,
            truncation_stats: TruncationStats::default(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// A graph with at most the center has nothing to explore.
    pub fn has_connections(&self) -> bool {
        self.nodes.len() > 1
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|node| node.id == id)
    }

    pub fn center(&self) -> Option<&GraphNode> {
        self.nodes.iter().find(|node| node.distance == 0)
    }

    pub fn count_at_distance(&self, distance: u8) -> usize {
        self.nodes
            .iter()
            .filter(|node| node.distance == distance)
            .count()
    }
}
