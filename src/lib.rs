//! Occupation/skill taxonomy explorer: a graded 3-hop network builder and a
//! force-directed layout engine, plus the dataset and centrality loaders that
//! feed them.

pub mod config;
pub mod layout;
pub mod network;
pub mod taxonomy;
pub mod util;

pub use config::ExplorerConfig;
pub use layout::{LayoutConfig, LayoutEngine, LayoutPass, LayoutStatus};
pub use network::{GraphEdge, GraphNode, GraphState, Limits, NetworkSession, build_graph};
pub use taxonomy::{CentralityIndex, EntityKind, TaxonomyData};
