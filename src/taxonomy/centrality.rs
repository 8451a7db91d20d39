use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::model::{EntityKind, TaxonomyData};
use super::parse::{TaxonomyError, TaxonomyResult};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillCentrality {
    pub degree: u32,
    #[serde(default)]
    pub normalized_degree: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OccupationCentrality {
    pub avg_skill_degree: f64,
    #[serde(default)]
    pub skill_count: u32,
    #[serde(default)]
    pub normalized_centrality: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CentralityMetadata {
    pub skill_count: usize,
    pub occupation_count: usize,
    pub max_skill_degree: u32,
    pub max_occupation_avg_degree: f64,
    pub relation_count: usize,
}

/// Popularity signal per entity, used only to rank neighbours.
///
/// Skill centrality is the skill's degree (number of occupations requiring
/// it); occupation centrality is the mean degree of the occupation's skills.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CentralityIndex {
    #[serde(default)]
    skills: HashMap<String, SkillCentrality>,
    #[serde(default)]
    occupations: HashMap<String, OccupationCentrality>,
    #[serde(default)]
    metadata: CentralityMetadata,
}

fn normalize_log(value: f64, max: f64) -> f64 {
    if max <= 0.0 {
        return 0.0;
    }
    let normalized = value.ln_1p() / max.ln_1p();
    (normalized * 1000.0).round() / 1000.0
}

impl CentralityIndex {
    pub fn from_taxonomy(data: &TaxonomyData) -> Self {
        let mut skill_degrees: BTreeMap<&str, u32> = BTreeMap::new();
        let mut occupation_skills: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        let mut relation_count = 0usize;

        for relation in data.relations() {
            if relation.occupation_id.is_empty() || relation.skill_id.is_empty() {
                continue;
            }
            relation_count += 1;
            *skill_degrees.entry(relation.skill_id.as_str()).or_default() += 1;
            occupation_skills
                .entry(relation.occupation_id.as_str())
                .or_default()
                .push(relation.skill_id.as_str());
        }

        let max_skill_degree = skill_degrees.values().copied().max().unwrap_or(0);
        let averages = occupation_skills
            .iter()
            .map(|(&occupation_id, skills)| {
                let total = skills
                    .iter()
                    .map(|skill_id| skill_degrees.get(skill_id).copied().unwrap_or(0) as f64)
                    .sum::<f64>();
                (occupation_id, total / skills.len() as f64, skills.len() as u32)
            })
            .collect::<Vec<_>>();
        let max_average = averages
            .iter()
            .map(|(_, average, _)| *average)
            .fold(0.0_f64, f64::max);

        let skills = skill_degrees
            .iter()
            .map(|(&skill_id, &degree)| {
                (
                    skill_id.to_owned(),
                    SkillCentrality {
                        degree,
                        normalized_degree: normalize_log(degree as f64, max_skill_degree as f64),
                    },
                )
            })
            .collect::<HashMap<_, _>>();
        let occupations = averages
            .into_iter()
            .map(|(occupation_id, average, skill_count)| {
                (
                    occupation_id.to_owned(),
                    OccupationCentrality {
                        avg_skill_degree: (average * 100.0).round() / 100.0,
                        skill_count,
                        normalized_centrality: normalize_log(average, max_average),
                    },
                )
            })
            .collect::<HashMap<_, _>>();

        let metadata = CentralityMetadata {
            skill_count: skills.len(),
            occupation_count: occupations.len(),
            max_skill_degree,
            max_occupation_avg_degree: (max_average * 100.0).round() / 100.0,
            relation_count,
        };

        Self {
            skills,
            occupations,
            metadata,
        }
    }

    pub fn metadata(&self) -> &CentralityMetadata {
        &self.metadata
    }

    pub fn skill_centrality(&self, skill_id: &str) -> Option<f64> {
        self.skills.get(skill_id).map(|entry| entry.degree as f64)
    }

    pub fn occupation_centrality(&self, occupation_id: &str) -> Option<f64> {
        self.occupations
            .get(occupation_id)
            .map(|entry| entry.avg_skill_degree)
    }

    pub fn skill_degree(&self, skill_id: &str) -> Option<u32> {
        self.skills.get(skill_id).map(|entry| entry.degree)
    }

    pub fn occupation_degree(&self, occupation_id: &str) -> Option<u32> {
        self.occupations
            .get(occupation_id)
            .map(|entry| entry.skill_count)
            .filter(|count| *count > 0)
    }

    pub fn centrality(&self, id: &str, kind: EntityKind) -> Option<f64> {
        match kind {
            EntityKind::Occupation => self.occupation_centrality(id),
            EntityKind::Skill => self.skill_centrality(id),
        }
    }

    pub fn degree(&self, id: &str, kind: EntityKind) -> Option<u32> {
        match kind {
            EntityKind::Occupation => self.occupation_degree(id),
            EntityKind::Skill => self.skill_degree(id),
        }
    }
}

pub fn load_centrality(path: &Path) -> TaxonomyResult<CentralityIndex> {
    let raw = fs::read_to_string(path).map_err(|source| TaxonomyError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let index: CentralityIndex = serde_json::from_str(&raw)?;
    info!(
        path = %path.display(),
        skills = index.skills.len(),
        occupations = index.occupations.len(),
        "loaded centrality index"
    );
    Ok(index)
}

pub fn write_centrality(index: &CentralityIndex, path: &Path) -> TaxonomyResult<()> {
    let encoded = serde_json::to_string_pretty(index)?;
    fs::write(path, encoded).map_err(|source| TaxonomyError::Io {
        path: path.display().to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::taxonomy::{Entity, Relation, RelationKind};

    fn data() -> TaxonomyData {
        TaxonomyData::new(
            [
                Entity::new("o1", "1", "one", EntityKind::Occupation),
                Entity::new("o2", "2", "two", EntityKind::Occupation),
            ],
            [
                Entity::new("s1", "S1", "shared", EntityKind::Skill),
                Entity::new("s2", "S2", "niche", EntityKind::Skill),
            ],
            vec![
                Relation::new("o1", "s1", RelationKind::Essential),
                Relation::new("o1", "s2", RelationKind::Optional),
                Relation::new("o2", "s1", RelationKind::Essential),
            ],
        )
    }

    #[test]
    fn skill_centrality_is_its_degree() {
        let index = CentralityIndex::from_taxonomy(&data());
        assert_eq!(index.skill_degree("s1"), Some(2));
        assert_eq!(index.skill_centrality("s2"), Some(1.0));
        assert_eq!(index.skill_centrality("unknown"), None);
    }

    #[test]
    fn occupation_centrality_is_mean_skill_degree() {
        let index = CentralityIndex::from_taxonomy(&data());
        assert_eq!(index.occupation_centrality("o1"), Some(1.5));
        assert_eq!(index.occupation_centrality("o2"), Some(2.0));
        assert_eq!(index.occupation_degree("o1"), Some(2));
        assert_eq!(index.metadata().max_skill_degree, 2);
        assert_eq!(index.metadata().relation_count, 3);
    }

    #[test]
    fn normalization_is_log_scaled() {
        assert_eq!(normalize_log(0.0, 10.0), 0.0);
        assert_eq!(normalize_log(10.0, 10.0), 1.0);
        assert_eq!(normalize_log(5.0, 0.0), 0.0);
    }

    #[test]
    fn reads_files_without_optional_fields() {
        let raw = r#"{
            "skills": {"s1": {"degree": 7}},
            "occupations": {"o1": {"avgSkillDegree": 3.25}}
        }"#;
        let index: CentralityIndex = serde_json::from_str(raw).unwrap();
        assert_eq!(index.skill_centrality("s1"), Some(7.0));
        assert_eq!(index.occupation_centrality("o1"), Some(3.25));
        assert_eq!(index.occupation_degree("o1"), None);
    }
}
