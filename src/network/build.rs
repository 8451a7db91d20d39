use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::taxonomy::{CentralityIndex, EntityKind, Related, TaxonomyData};

use super::types::{
    GraphEdge, GraphNode, GraphState, HistoryEntry, LevelStats, TruncationStats, edge_id,
};

/// Per-level caps on how many ranked partners survive truncation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    pub dist1: usize,
    pub dist2: usize,
    pub dist3: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            dist1: 20,
            dist2: 15,
            dist3: 10,
        }
    }
}

impl Limits {
    /// Worst-case node count before deduplication.
    pub fn max_nodes(&self) -> usize {
        let dist2 = self.dist1.saturating_mul(self.dist2);
        let dist3 = dist2.saturating_mul(self.dist3);
        1usize
            .saturating_add(self.dist1)
            .saturating_add(dist2)
            .saturating_add(dist3)
    }
}

struct Candidate<'a> {
    related: Related<'a>,
    centrality: Option<f64>,
    degree: Option<u32>,
}

impl Candidate<'_> {
    fn score(&self) -> f64 {
        self.centrality.unwrap_or(0.0)
    }
}

struct GraphBuilder<'a> {
    data: &'a TaxonomyData,
    centrality: Option<&'a CentralityIndex>,
    nodes: Vec<GraphNode>,
    index_by_id: HashMap<String, usize>,
    edges: Vec<GraphEdge>,
    edge_ids: HashSet<String>,
    stats: TruncationStats,
}

impl<'a> GraphBuilder<'a> {
    fn new(data: &'a TaxonomyData, centrality: Option<&'a CentralityIndex>, limits: Limits) -> Self {
        let capacity = limits
            .max_nodes()
            .min(data.occupation_count() + data.skill_count());
        Self {
            data,
            centrality,
            nodes: Vec::with_capacity(capacity),
            index_by_id: HashMap::with_capacity(capacity),
            edges: Vec::new(),
            edge_ids: HashSet::new(),
            stats: TruncationStats::default(),
        }
    }

    fn ranked_partners(
        &self,
        id: &str,
        kind: EntityKind,
        excluded: impl Fn(&str) -> bool,
        limit: usize,
    ) -> (Vec<Candidate<'a>>, usize) {
        let data = self.data;
        let centrality = self.centrality;
        let mut candidates = data
            .partners(id, kind)
            .into_iter()
            .filter(|related| !excluded(related.entity.id.as_str()))
            .map(|related| {
                let entity = related.entity;
                Candidate {
                    related,
                    centrality: centrality
                        .and_then(|index| index.centrality(&entity.id, entity.kind)),
                    degree: centrality.and_then(|index| index.degree(&entity.id, entity.kind)),
                }
            })
            .collect::<Vec<_>>();

        let total = candidates.len();
        // Stable: equal or missing centrality keeps enumeration order.
        candidates.sort_by(|a, b| b.score().total_cmp(&a.score()));
        candidates.truncate(limit);
        (candidates, total)
    }

    fn add_center(&mut self, id: &str, kind: EntityKind) -> Option<HistoryEntry> {
        let data = self.data;
        let entity = data.entity_by_id(id, kind)?;
        self.index_by_id.insert(entity.id.clone(), self.nodes.len());
        self.nodes.push(GraphNode {
            id: entity.id.clone(),
            code: entity.code.clone(),
            label: entity.label.clone(),
            kind,
            distance: 0,
            signalling_value: None,
            centrality: self.centrality.and_then(|index| index.centrality(id, kind)),
            degree: self.centrality.and_then(|index| index.degree(id, kind)),
            x: None,
            y: None,
            vx: None,
            vy: None,
            fx: None,
            fy: None,
        });

        Some(HistoryEntry {
            id: entity.id.clone(),
            label: entity.label.clone(),
            kind,
        })
    }

    /// Places the candidate at `distance` unless it already has a node.
    fn add_node(&mut self, candidate: &Candidate<'_>, distance: u8) -> bool {
        let entity = candidate.related.entity;
        if self.index_by_id.contains_key(&entity.id) {
            return false;
        }

        self.index_by_id.insert(entity.id.clone(), self.nodes.len());
        self.nodes.push(GraphNode {
            id: entity.id.clone(),
            code: entity.code.clone(),
            label: entity.label.clone(),
            kind: entity.kind,
            distance,
            signalling_value: if distance == 1 {
                candidate.related.relation.signalling_value
            } else {
                None
            },
            centrality: candidate.centrality,
            degree: candidate.degree,
            x: None,
            y: None,
            vx: None,
            vy: None,
            fx: None,
            fy: None,
        });
        true
    }

    fn add_edge(&mut self, source_id: &str, candidate: &Candidate<'_>) {
        let relation = candidate.related.relation;
        let id = edge_id(&relation.occupation_id, &relation.skill_id);
        if !self.edge_ids.insert(id.clone()) {
            return;
        }

        self.edges.push(GraphEdge {
            id,
            source: source_id.to_owned(),
            target: candidate.related.entity.id.clone(),
            relation_type: relation.relation_type,
            signalling_value: relation.signalling_value,
        });
    }

    /// Expands one node and returns the ids newly placed at `distance`.
    fn expand(
        &mut self,
        source_id: &str,
        source_kind: EntityKind,
        distance: u8,
        limit: usize,
        excluded: impl Fn(&str) -> bool,
    ) -> (Vec<String>, LevelStats) {
        let (candidates, total) = self.ranked_partners(source_id, source_kind, excluded, limit);
        let stats = LevelStats {
            shown: candidates.len(),
            total,
        };

        let mut placed = Vec::new();
        for candidate in &candidates {
            if self.add_node(candidate, distance) {
                placed.push(candidate.related.entity.id.clone());
            }
            self.add_edge(source_id, candidate);
        }
        (placed, stats)
    }

    fn finish(self, center_id: &str, center_kind: EntityKind, history: HistoryEntry) -> GraphState {
        debug_assert_eq!(
            self.nodes.iter().filter(|node| node.distance == 0).count(),
            1,
            "graph must have exactly one center"
        );

        let mut counts = [0usize; 4];
        for node in &self.nodes {
            if let Some(count) = counts.get_mut(node.distance as usize) {
                *count += 1;
            }
        }
        let truncation = format!(
            "dist1={}/{} dist2={}/{} dist3={}/{}",
            self.stats.dist1.shown,
            self.stats.dist1.total,
            self.stats.dist2.shown,
            self.stats.dist2.total,
            self.stats.dist3.shown,
            self.stats.dist3.total
        );
        debug!(
            center = center_id,
            dist1 = counts[1],
            dist2 = counts[2],
            dist3 = counts[3],
            nodes = self.nodes.len(),
            edges = self.edges.len(),
            %truncation,
            "built network graph"
        );

        GraphState {
            nodes: self.nodes,
            edges: self.edges,
            center_node_id: center_id.to_owned(),
            center_node_type: center_kind,
            history: vec![history],
            is_truncated: self.stats.any_truncated(),
            truncation_stats: self.stats,
        }
    }
}

/// Builds the graded 3-hop neighbourhood of `center_id`.
///
/// Level 1 keeps the top `limits.dist1` partners of the center, level 2 the
/// top `limits.dist2` partners of each distance-1 node (excluding the center)
/// and level 3 the top `limits.dist3` partners of each distance-2 node
/// (excluding the center and every distance-1 node). Partners are ranked by
/// centrality; without a centrality index they keep the relation index's
/// enumeration order. A node keeps the distance it was first placed at.
///
/// An unknown center yields an empty graph with an empty history.
pub fn build_graph(
    center_id: &str,
    center_kind: EntityKind,
    data: &TaxonomyData,
    centrality: Option<&CentralityIndex>,
    limits: Limits,
) -> GraphState {
    let mut builder = GraphBuilder::new(data, centrality, limits);
    let Some(history) = builder.add_center(center_id, center_kind) else {
        debug!(center = center_id, kind = %center_kind, "center entity not found");
        return GraphState::empty(center_id, center_kind);
    };

    let partner_kind = center_kind.partner();

    let (dist1_ids, stats) = builder.expand(center_id, center_kind, 1, limits.dist1, |_| false);
    builder.stats.dist1 = stats;
    let dist1_set = dist1_ids.iter().map(String::as_str).collect::<HashSet<_>>();

    let mut dist2_ids = Vec::new();
    for source_id in &dist1_ids {
        let (placed, stats) = builder.expand(source_id, partner_kind, 2, limits.dist2, |id| {
            id == center_id
        });
        builder.stats.dist2.record(stats.shown, stats.total);
        dist2_ids.extend(placed);
    }

    for source_id in &dist2_ids {
        let (_, stats) = builder.expand(source_id, center_kind, 3, limits.dist3, |id| {
            id == center_id || dist1_set.contains(id)
        });
        builder.stats.dist3.record(stats.shown, stats.total);
    }

    builder.finish(center_id, center_kind, history)
}
