mod build;
mod session;
mod types;

pub use build::{Limits, build_graph};
pub use session::NetworkSession;
pub use types::{
    GraphEdge, GraphNode, GraphState, HistoryEntry, LevelStats, TruncationStats, edge_id,
};
