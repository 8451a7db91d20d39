mod centrality;
mod model;
mod parse;
mod search;

pub use centrality::{
    CentralityIndex, CentralityMetadata, OccupationCentrality, SkillCentrality, load_centrality,
    write_centrality,
};
pub use model::{
    Entity, EntityKind, Related, Relation, RelationKind, SignallingLabel, TaxonomyData,
};
pub use parse::{TaxonomyError, TaxonomyResult, load_taxonomy, parse_taxonomy_json};
