use std::fs;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::model::{Entity, EntityKind, Relation, RelationKind, SignallingLabel, TaxonomyData};

#[derive(Debug, Error)]
pub enum TaxonomyError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid taxonomy JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("taxonomy JSON has no `{0}` table")]
    MissingTable(&'static str),

    #[error("relation {occupation_id} -> {skill_id} has invalid signalling value `{value}`")]
    InvalidSignallingValue {
        occupation_id: String,
        skill_id: String,
        value: String,
    },
}

pub type TaxonomyResult<T> = Result<T, TaxonomyError>;

#[derive(Debug, Deserialize)]
struct RawTaxonomy {
    #[serde(default)]
    occupations: Option<Vec<RawEntityRow>>,
    #[serde(default)]
    skills: Option<Vec<RawEntityRow>>,
    #[serde(default, rename = "occupationtoskillrelations")]
    relations: Option<Vec<RawRelationRow>>,
}

#[derive(Debug, Deserialize)]
struct RawEntityRow {
    #[serde(rename = "ID")]
    id: String,
    #[serde(default, rename = "CODE")]
    code: String,
    #[serde(default, rename = "PREFERREDLABEL")]
    preferred_label: String,
}

#[derive(Debug, Deserialize)]
struct RawRelationRow {
    #[serde(rename = "OCCUPATIONID")]
    occupation_id: String,
    #[serde(rename = "SKILLID")]
    skill_id: String,
    #[serde(default, rename = "RELATIONTYPE")]
    relation_type: String,
    #[serde(default, rename = "SIGNALLINGVALUE")]
    signalling_value: Option<RawNumber>,
    #[serde(default, rename = "SIGNALLINGVALUELABEL")]
    signalling_value_label: String,
}

/// CSV conversions keep numbers as strings; hand-written files may not.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawNumber {
    Number(f32),
    Text(String),
}

impl RawRelationRow {
    fn signalling_value(&self) -> TaxonomyResult<Option<f32>> {
        let value = match &self.signalling_value {
            None => return Ok(None),
            Some(RawNumber::Number(value)) => *value,
            Some(RawNumber::Text(text)) => {
                let text = text.trim();
                if text.is_empty() {
                    return Ok(None);
                }
                text.parse::<f32>()
                    .map_err(|_| self.invalid_signalling(text))?
            }
        };

        if value.is_finite() {
            Ok(Some(value.clamp(0.0, 1.0)))
        } else {
            Err(self.invalid_signalling(&value.to_string()))
        }
    }

    fn invalid_signalling(&self, value: &str) -> TaxonomyError {
        TaxonomyError::InvalidSignallingValue {
            occupation_id: self.occupation_id.clone(),
            skill_id: self.skill_id.clone(),
            value: value.to_owned(),
        }
    }
}

fn entities(rows: Vec<RawEntityRow>, kind: EntityKind) -> impl Iterator<Item = Entity> {
    rows.into_iter()
        .filter(|row| !row.id.trim().is_empty())
        .map(move |row| Entity::new(row.id.trim(), row.code, row.preferred_label, kind))
}

pub fn parse_taxonomy_json(raw: &str) -> TaxonomyResult<TaxonomyData> {
    let parsed: RawTaxonomy = serde_json::from_str(raw)?;
    let occupations = parsed
        .occupations
        .ok_or(TaxonomyError::MissingTable("occupations"))?;
    let skills = parsed.skills.ok_or(TaxonomyError::MissingTable("skills"))?;
    let relation_rows = parsed
        .relations
        .ok_or(TaxonomyError::MissingTable("occupationtoskillrelations"))?;

    let mut relations = Vec::with_capacity(relation_rows.len());
    let mut skipped = 0usize;
    for row in &relation_rows {
        let occupation_id = row.occupation_id.trim();
        let skill_id = row.skill_id.trim();
        if occupation_id.is_empty() || skill_id.is_empty() {
            skipped += 1;
            continue;
        }

        relations.push(Relation {
            occupation_id: occupation_id.to_owned(),
            skill_id: skill_id.to_owned(),
            relation_type: RelationKind::from_raw(&row.relation_type),
            signalling_value: row.signalling_value()?,
            signalling_label: SignallingLabel::from_raw(&row.signalling_value_label),
        });
    }
    if skipped > 0 {
        warn!(skipped, "ignored relation rows without both endpoints");
    }

    let data = TaxonomyData::new(
        entities(occupations, EntityKind::Occupation),
        entities(skills, EntityKind::Skill),
        relations,
    );
    debug!(
        occupations = data.occupation_count(),
        skills = data.skill_count(),
        relations = data.relations().len(),
        "parsed taxonomy"
    );
    Ok(data)
}

pub fn load_taxonomy(path: &Path) -> TaxonomyResult<TaxonomyData> {
    let raw = fs::read_to_string(path).map_err(|source| TaxonomyError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let data = parse_taxonomy_json(&raw)?;
    info!(
        path = %path.display(),
        occupations = data.occupation_count(),
        skills = data.skill_count(),
        "loaded taxonomy"
    );
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DATASET: &str = r#"{
        "occupations": [
            {"ID": "o1", "CODE": "2511.1", "PREFERREDLABEL": "data analyst", "OCCUPATIONTYPE": "escooccupation"}
        ],
        "skills": [
            {"ID": "s1", "PREFERREDLABEL": "statistics"},
            {"ID": "s2", "PREFERREDLABEL": "python"}
        ],
        "occupationtoskillrelations": [
            {"OCCUPATIONID": "o1", "SKILLID": "s1", "RELATIONTYPE": "essential", "SIGNALLINGVALUE": "", "SIGNALLINGVALUELABEL": ""},
            {"OCCUPATIONID": "o1", "SKILLID": "s2", "RELATIONTYPE": "", "SIGNALLINGVALUE": "0.75", "SIGNALLINGVALUELABEL": "high"},
            {"OCCUPATIONID": "", "SKILLID": "s2", "RELATIONTYPE": "optional"}
        ],
        "skillhierarchy": []
    }"#;

    #[test]
    fn parses_converted_csv_rows() {
        let data = parse_taxonomy_json(DATASET).unwrap();
        assert_eq!(data.occupation_count(), 1);
        assert_eq!(data.skill_count(), 2);
        assert_eq!(data.relations().len(), 2);

        let related = data.related_skills("o1");
        assert_eq!(related[0].entity.id, "s2");
        assert_eq!(related[0].relation.relation_type, RelationKind::Optional);
        assert_eq!(related[0].relation.signalling_value, Some(0.75));
        assert_eq!(related[1].relation.signalling_value, None);
        assert_eq!(related[1].relation.relation_type, RelationKind::Essential);
    }

    #[test]
    fn rejects_garbage_signalling_values() {
        let raw = r#"{
            "occupations": [{"ID": "o1"}],
            "skills": [{"ID": "s1"}],
            "occupationtoskillrelations": [
                {"OCCUPATIONID": "o1", "SKILLID": "s1", "SIGNALLINGVALUE": "lots"}
            ]
        }"#;
        let error = parse_taxonomy_json(raw).unwrap_err();
        assert!(matches!(error, TaxonomyError::InvalidSignallingValue { .. }));
    }

    #[test]
    fn reports_missing_tables() {
        let error = parse_taxonomy_json(r#"{"occupations": [], "skills": []}"#).unwrap_err();
        assert!(matches!(
            error,
            TaxonomyError::MissingTable("occupationtoskillrelations")
        ));
    }

    #[test]
    fn accepts_numeric_signalling_values() {
        let raw = r#"{
            "occupations": [{"ID": "o1"}],
            "skills": [{"ID": "s1"}],
            "occupationtoskillrelations": [
                {"OCCUPATIONID": "o1", "SKILLID": "s1", "SIGNALLINGVALUE": 0.4}
            ]
        }"#;
        let data = parse_taxonomy_json(raw).unwrap();
        assert_eq!(data.relations()[0].signalling_value, Some(0.4));
    }
}
