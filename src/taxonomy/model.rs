use std::cmp::Ordering;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Occupation,
    Skill,
}

impl EntityKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Occupation => "occupation",
            Self::Skill => "skill",
        }
    }

    /// The kind on the other side of the bipartite relation.
    pub fn partner(self) -> Self {
        match self {
            Self::Occupation => Self::Skill,
            Self::Skill => Self::Occupation,
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for EntityKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "occupation" => Ok(Self::Occupation),
            "skill" => Ok(Self::Skill),
            other => Err(format!("unknown entity kind `{other}`")),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationKind {
    Essential,
    #[default]
    Optional,
}

impl RelationKind {
    /// Blank or unrecognised relation types read as optional.
    pub fn from_raw(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("essential") {
            Self::Essential
        } else {
            Self::Optional
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignallingLabel {
    High,
    Medium,
    Low,
}

impl SignallingLabel {
    pub fn from_raw(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "high" => Some(Self::High),
            "medium" => Some(Self::Medium),
            "low" => Some(Self::Low),
            _ => None,
        }
    }

    fn rank(label: Option<Self>) -> u8 {
        match label {
            Some(Self::High) => 0,
            Some(Self::Medium) => 1,
            Some(Self::Low) => 2,
            None => 3,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Entity {
    pub id: String,
    pub code: String,
    pub label: String,
    pub kind: EntityKind,
}

impl Entity {
    pub fn new(
        id: impl Into<String>,
        code: impl Into<String>,
        label: impl Into<String>,
        kind: EntityKind,
    ) -> Self {
        Self {
            id: id.into(),
            code: code.into(),
            label: label.into(),
            kind,
        }
    }

    /// ICATUS-based codes mark occupations of the unseen economy.
    pub fn is_unseen_economy(&self) -> bool {
        self.code.starts_with('I')
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Relation {
    pub occupation_id: String,
    pub skill_id: String,
    pub relation_type: RelationKind,
    pub signalling_value: Option<f32>,
    pub signalling_label: Option<SignallingLabel>,
}

impl Relation {
    pub fn new(
        occupation_id: impl Into<String>,
        skill_id: impl Into<String>,
        relation_type: RelationKind,
    ) -> Self {
        Self {
            occupation_id: occupation_id.into(),
            skill_id: skill_id.into(),
            relation_type,
            signalling_value: None,
            signalling_label: None,
        }
    }

    pub fn with_signalling(mut self, value: f32, label: Option<SignallingLabel>) -> Self {
        self.signalling_value = Some(value);
        self.signalling_label = label;
        self
    }
}

/// A partner entity reached through one relation.
#[derive(Clone, Copy, Debug)]
pub struct Related<'a> {
    pub entity: &'a Entity,
    pub relation: &'a Relation,
}

#[derive(Clone, Debug, Default)]
pub struct TaxonomyData {
    occupations: HashMap<String, Entity>,
    skills: HashMap<String, Entity>,
    relations: Vec<Relation>,
    by_occupation: HashMap<String, Vec<usize>>,
    by_skill: HashMap<String, Vec<usize>>,
}

impl TaxonomyData {
    pub fn new(
        occupations: impl IntoIterator<Item = Entity>,
        skills: impl IntoIterator<Item = Entity>,
        relations: Vec<Relation>,
    ) -> Self {
        let occupations = occupations
            .into_iter()
            .map(|entity| {
                let entity = Entity {
                    kind: EntityKind::Occupation,
                    ..entity
                };
                (entity.id.clone(), entity)
            })
            .collect::<HashMap<_, _>>();
        let skills = skills
            .into_iter()
            .map(|entity| {
                let entity = Entity {
                    kind: EntityKind::Skill,
                    ..entity
                };
                (entity.id.clone(), entity)
            })
            .collect::<HashMap<_, _>>();

        let mut by_occupation: HashMap<String, Vec<usize>> = HashMap::new();
        let mut by_skill: HashMap<String, Vec<usize>> = HashMap::new();
        for (index, relation) in relations.iter().enumerate() {
            if !occupations.contains_key(&relation.occupation_id)
                || !skills.contains_key(&relation.skill_id)
            {
                continue;
            }
            by_occupation
                .entry(relation.occupation_id.clone())
                .or_default()
                .push(index);
            by_skill
                .entry(relation.skill_id.clone())
                .or_default()
                .push(index);
        }

        let mut data = Self {
            occupations,
            skills,
            relations,
            by_occupation,
            by_skill,
        };
        data.sort_indices();
        data
    }

    fn sort_indices(&mut self) {
        let relations = &self.relations;
        let occupations = &self.occupations;
        let skills = &self.skills;

        for indices in self.by_occupation.values_mut() {
            indices.sort_by(|&a, &b| {
                let (a, b) = (&relations[a], &relations[b]);
                let by_kind = if a.signalling_label.is_some() || b.signalling_label.is_some() {
                    SignallingLabel::rank(a.signalling_label)
                        .cmp(&SignallingLabel::rank(b.signalling_label))
                } else {
                    essential_first(a.relation_type, b.relation_type)
                };
                by_kind.then_with(|| {
                    label_of(skills, &a.skill_id).cmp(&label_of(skills, &b.skill_id))
                })
            });
        }

        for indices in self.by_skill.values_mut() {
            indices.sort_by(|&a, &b| {
                label_of(occupations, &relations[a].occupation_id)
                    .cmp(&label_of(occupations, &relations[b].occupation_id))
            });
        }
    }

    pub fn occupation_count(&self) -> usize {
        self.occupations.len()
    }

    pub fn skill_count(&self) -> usize {
        self.skills.len()
    }

    pub fn relations(&self) -> &[Relation] {
        &self.relations
    }

    pub fn occupations(&self) -> impl Iterator<Item = &Entity> {
        self.occupations.values()
    }

    pub fn skills(&self) -> impl Iterator<Item = &Entity> {
        self.skills.values()
    }

    pub fn entity_by_id(&self, id: &str, kind: EntityKind) -> Option<&Entity> {
        match kind {
            EntityKind::Occupation => self.occupations.get(id),
            EntityKind::Skill => self.skills.get(id),
        }
    }

    /// Looks the id up as an occupation first, then as a skill.
    pub fn find_entity(&self, id: &str) -> Option<&Entity> {
        self.occupations.get(id).or_else(|| self.skills.get(id))
    }

    pub fn related_skills(&self, occupation_id: &str) -> Vec<Related<'_>> {
        self.by_occupation
            .get(occupation_id)
            .into_iter()
            .flatten()
            .filter_map(|&index| {
                let relation = &self.relations[index];
                let entity = self.skills.get(&relation.skill_id)?;
                Some(Related { entity, relation })
            })
            .collect()
    }

    pub fn related_occupations(&self, skill_id: &str) -> Vec<Related<'_>> {
        self.by_skill
            .get(skill_id)
            .into_iter()
            .flatten()
            .filter_map(|&index| {
                let relation = &self.relations[index];
                let entity = self.occupations.get(&relation.occupation_id)?;
                Some(Related { entity, relation })
            })
            .collect()
    }

    /// Bipartite partners of an entity of the given kind, in enumeration order.
    pub fn partners(&self, id: &str, kind: EntityKind) -> Vec<Related<'_>> {
        match kind {
            EntityKind::Occupation => self.related_skills(id),
            EntityKind::Skill => self.related_occupations(id),
        }
    }

    pub fn partner_count(&self, id: &str, kind: EntityKind) -> usize {
        let index = match kind {
            EntityKind::Occupation => &self.by_occupation,
            EntityKind::Skill => &self.by_skill,
        };
        index.get(id).map_or(0, Vec::len)
    }
}

fn essential_first(a: RelationKind, b: RelationKind) -> Ordering {
    match (a, b) {
        (RelationKind::Essential, RelationKind::Optional) => Ordering::Less,
        (RelationKind::Optional, RelationKind::Essential) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}

fn label_of<'a>(entities: &'a HashMap<String, Entity>, id: &str) -> &'a str {
    entities.get(id).map_or("", |entity| entity.label.as_str())
}
