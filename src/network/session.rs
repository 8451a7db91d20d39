use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info};

use crate::taxonomy::{CentralityIndex, EntityKind, TaxonomyData};

use super::build::{Limits, build_graph};
use super::types::{GraphState, HistoryEntry};

/// Navigation state of one network view.
///
/// Every center change builds a fresh [`GraphState`]; only the `x`/`y` of
/// nodes present in both the old and the new graph are carried forward as
/// layout seeds.
#[derive(Clone, Debug)]
pub struct NetworkSession {
    state: GraphState,
    centrality: Option<Arc<CentralityIndex>>,
    limits: Limits,
    initialized: bool,
}

impl NetworkSession {
    pub fn new(limits: Limits) -> Self {
        Self {
            state: GraphState::empty("", EntityKind::Occupation),
            centrality: None,
            limits,
            initialized: false,
        }
    }

    pub fn state(&self) -> &GraphState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut GraphState {
        &mut self.state
    }

    pub fn limits(&self) -> Limits {
        self.limits
    }

    pub fn centrality(&self) -> Option<&CentralityIndex> {
        self.centrality.as_deref()
    }

    /// True once a graph has been built with the centrality index available.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.state.history
    }

    pub fn can_go_back(&self) -> bool {
        self.state.history.len() > 1
    }

    fn build(&self, data: &TaxonomyData, center_id: &str, kind: EntityKind) -> GraphState {
        build_graph(center_id, kind, data, self.centrality.as_deref(), self.limits)
    }

    /// Starts a new exploration, discarding history and positions.
    pub fn open(&mut self, data: &TaxonomyData, center_id: &str, kind: EntityKind) {
        self.state = self.build(data, center_id, kind);
        if self.centrality.is_some() && !self.state.is_empty() {
            self.initialized = true;
        }
        info!(
            center = center_id,
            %kind,
            nodes = self.state.nodes.len(),
            edges = self.state.edges.len(),
            "opened network view"
        );
    }

    /// Rebuilds the graph around a node of the current graph.
    ///
    /// Returns false when the node is unknown or already the center.
    pub fn recenter(&mut self, data: &TaxonomyData, node_id: &str) -> bool {
        let Some(node) = self.state.node(node_id) else {
            return false;
        };
        if node.distance == 0 {
            return false;
        }

        let entry = HistoryEntry {
            id: node.id.clone(),
            label: node.label.clone(),
            kind: node.kind,
        };
        let mut next = self.build(data, &entry.id, entry.kind);
        if next.is_empty() {
            return false;
        }

        carry_positions(&self.state, &mut next);
        let mut history = std::mem::take(&mut self.state.history);
        history.push(entry);
        next.history = history;

        debug!(center = node_id, depth = next.history.len(), "recentered network view");
        self.state = next;
        true
    }

    pub fn go_back(&mut self, data: &TaxonomyData) -> bool {
        if !self.can_go_back() {
            return false;
        }
        let index = self.state.history.len() - 2;
        self.go_to_history(data, index)
    }

    /// Returns to the history entry at `index`, dropping everything after it.
    pub fn go_to_history(&mut self, data: &TaxonomyData, index: usize) -> bool {
        if index + 1 >= self.state.history.len() {
            return false;
        }

        let mut history = self.state.history.clone();
        history.truncate(index + 1);
        let Some(target) = history.last() else {
            return false;
        };

        let mut next = self.build(data, &target.id, target.kind);
        if next.is_empty() {
            return false;
        }
        carry_positions(&self.state, &mut next);
        next.history = history;

        debug!(depth = next.history.len(), "navigated network history");
        self.state = next;
        true
    }

    /// Applies a centrality index that arrived after the graph was built.
    ///
    /// A graph that was built without an index is rebuilt around the same
    /// center so its neighbours are ranked; history and the positions of
    /// surviving nodes are kept. Once the session is initialized, existing
    /// nodes only get their ranking fields refreshed in place.
    ///
    /// Returns true when the graph was rebuilt.
    pub fn attach_centrality(
        &mut self,
        data: &TaxonomyData,
        centrality: Arc<CentralityIndex>,
    ) -> bool {
        if self.state.is_empty() {
            self.centrality = Some(centrality);
            debug!("stored centrality index before any graph was built");
            return false;
        }

        if self.initialized {
            for node in &mut self.state.nodes {
                node.centrality = centrality.centrality(&node.id, node.kind);
                node.degree = centrality.degree(&node.id, node.kind);
            }
            self.centrality = Some(centrality);
            debug!(nodes = self.state.nodes.len(), "refreshed centrality fields");
            return false;
        }

        self.centrality = Some(centrality);
        let mut next = self.build(data, &self.state.center_node_id, self.state.center_node_type);
        self.initialized = true;
        if next.is_empty() {
            return false;
        }
        carry_positions(&self.state, &mut next);
        next.history = std::mem::take(&mut self.state.history);

        debug!(
            center = next.center_node_id.as_str(),
            nodes = next.nodes.len(),
            "re-ranked network view with centrality"
        );
        self.state = next;
        true
    }
}

fn carry_positions(previous: &GraphState, next: &mut GraphState) {
    let positions = previous
        .nodes
        .iter()
        .filter_map(|node| Some((node.id.as_str(), node.position()?)))
        .collect::<HashMap<_, _>>();

    for node in &mut next.nodes {
        if let Some(&(x, y)) = positions.get(node.id.as_str()) {
            node.x = Some(x);
            node.y = Some(y);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::taxonomy::{Entity, Relation, RelationKind};

    fn data() -> TaxonomyData {
        TaxonomyData::new(
            [
                Entity::new("o1", "1", "first", EntityKind::Occupation),
                Entity::new("o2", "2", "second", EntityKind::Occupation),
            ],
            [
                Entity::new("s1", "S1", "alpha", EntityKind::Skill),
                Entity::new("s2", "S2", "beta", EntityKind::Skill),
            ],
            vec![
                Relation::new("o1", "s1", RelationKind::Essential),
                Relation::new("o1", "s2", RelationKind::Optional),
                Relation::new("o2", "s2", RelationKind::Essential),
            ],
        )
    }

    #[test]
    fn recenter_appends_history_and_ignores_the_center() {
        let data = data();
        let mut session = NetworkSession::new(Limits::default());
        session.open(&data, "o1", EntityKind::Occupation);
        assert!(!session.can_go_back());
        assert!(!session.recenter(&data, "o1"));
        assert!(!session.recenter(&data, "nope"));

        assert!(session.recenter(&data, "s2"));
        let ids = session
            .history()
            .iter()
            .map(|entry| entry.id.as_str())
            .collect::<Vec<_>>();
        assert_eq!(ids, ["o1", "s2"]);
        assert_eq!(session.state().center_node_id, "s2");
        assert_eq!(session.state().center_node_type, EntityKind::Skill);
    }

    #[test]
    fn go_back_rebuilds_previous_center() {
        let data = data();
        let mut session = NetworkSession::new(Limits::default());
        session.open(&data, "o1", EntityKind::Occupation);
        assert!(session.recenter(&data, "s2"));
        assert!(session.recenter(&data, "o2"));
        assert_eq!(session.history().len(), 3);

        assert!(session.go_back(&data));
        assert_eq!(session.state().center_node_id, "s2");
        assert_eq!(session.history().len(), 2);

        assert!(session.go_to_history(&data, 0));
        assert_eq!(session.state().center_node_id, "o1");
        assert_eq!(session.history().len(), 1);
        assert!(!session.go_back(&data));
        assert!(!session.go_to_history(&data, 0));
    }

    #[test]
    fn late_centrality_reranks_the_open_graph() {
        let data = TaxonomyData::new(
            [
                Entity::new("o1", "1", "first", EntityKind::Occupation),
                Entity::new("o2", "2", "second", EntityKind::Occupation),
                Entity::new("o3", "3", "third", EntityKind::Occupation),
                Entity::new("o4", "4", "fourth", EntityKind::Occupation),
            ],
            [
                Entity::new("sa", "A", "rare", EntityKind::Skill),
                Entity::new("sb", "B", "popular", EntityKind::Skill),
            ],
            vec![
                Relation::new("o1", "sa", RelationKind::Essential),
                Relation::new("o1", "sb", RelationKind::Optional),
                Relation::new("o2", "sb", RelationKind::Essential),
                Relation::new("o3", "sb", RelationKind::Essential),
                Relation::new("o4", "sb", RelationKind::Essential),
            ],
        );
        let limits = Limits {
            dist1: 1,
            ..Limits::default()
        };
        let dist1 = |session: &NetworkSession| {
            session
                .state()
                .nodes
                .iter()
                .filter(|node| node.distance == 1)
                .map(|node| node.id.clone())
                .collect::<Vec<_>>()
        };

        let mut session = NetworkSession::new(limits);
        session.open(&data, "o1", EntityKind::Occupation);
        assert_eq!(dist1(&session), ["sa"]);
        session.state_mut().nodes[0].x = Some(7.0);
        session.state_mut().nodes[0].y = Some(9.0);

        let rebuilt =
            session.attach_centrality(&data, Arc::new(CentralityIndex::from_taxonomy(&data)));
        assert!(rebuilt);
        assert!(session.is_initialized());
        assert_eq!(dist1(&session), ["sb"]);
        assert_eq!(session.state().node("sb").and_then(|node| node.degree), Some(4));
        assert_eq!(session.state().center().and_then(|node| node.position()), Some((7.0, 9.0)));
        let history = session
            .history()
            .iter()
            .map(|entry| entry.id.as_str())
            .collect::<Vec<_>>();
        assert_eq!(history, ["o1"]);
    }

    #[test]
    fn replacing_centrality_refreshes_nodes_in_place() {
        let data = data();
        let mut session = NetworkSession::new(Limits::default());
        assert!(!session.attach_centrality(&data, Arc::new(CentralityIndex::default())));
        session.open(&data, "o1", EntityKind::Occupation);
        assert!(session.is_initialized());
        assert_eq!(session.state().node("s2").and_then(|node| node.degree), None);

        session.state_mut().nodes[1].x = Some(12.0);
        let ids_before = session
            .state()
            .nodes
            .iter()
            .map(|node| node.id.clone())
            .collect::<Vec<_>>();

        let rebuilt =
            session.attach_centrality(&data, Arc::new(CentralityIndex::from_taxonomy(&data)));
        assert!(!rebuilt);
        let ids_after = session
            .state()
            .nodes
            .iter()
            .map(|node| node.id.clone())
            .collect::<Vec<_>>();
        assert_eq!(ids_before, ids_after);
        assert_eq!(session.state().nodes[1].x, Some(12.0));
        assert_eq!(session.state().node("s2").and_then(|node| node.degree), Some(2));
    }
}
