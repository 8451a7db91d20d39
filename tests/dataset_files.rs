//! Loading the converted dataset and centrality files from disk.

use std::fs;

use taxonomy_network::config::ExplorerConfig;
use taxonomy_network::network::{Limits, build_graph};
use taxonomy_network::taxonomy::{
    CentralityIndex, EntityKind, RelationKind, SignallingLabel, TaxonomyError, load_centrality,
    load_taxonomy, write_centrality,
};

const DATASET: &str = r#"{
  "occupations": [
    {"ID": "occ-a", "CODE": "2166", "PREFERREDLABEL": "graphic designer", "ORIGINURI": "x"},
    {"ID": "occ-b", "CODE": "I41_1", "PREFERREDLABEL": "caregiver"},
    {"ID": "occ-c", "CODE": "2512", "PREFERREDLABEL": "software developer"}
  ],
  "skills": [
    {"ID": "sk-1", "CODE": "", "PREFERREDLABEL": "use design software"},
    {"ID": "sk-2", "CODE": "", "PREFERREDLABEL": "communicate with clients"},
    {"ID": "sk-3", "CODE": "", "PREFERREDLABEL": "write code"}
  ],
  "occupationtoskillrelations": [
    {"OCCUPATIONID": "occ-a", "SKILLID": "sk-1", "RELATIONTYPE": "essential", "SIGNALLINGVALUE": ""},
    {"OCCUPATIONID": "occ-a", "SKILLID": "sk-2", "RELATIONTYPE": "optional"},
    {"OCCUPATIONID": "occ-b", "SKILLID": "sk-2", "RELATIONTYPE": "", "SIGNALLINGVALUE": "0.75", "SIGNALLINGVALUELABEL": "high"},
    {"OCCUPATIONID": "occ-c", "SKILLID": "sk-3", "RELATIONTYPE": "essential"},
    {"OCCUPATIONID": "occ-c", "SKILLID": "sk-2", "RELATIONTYPE": "essential"},
    {"OCCUPATIONID": "", "SKILLID": "sk-3", "RELATIONTYPE": "essential"}
  ],
  "skillgroups": []
}"#;

#[test]
fn loads_dataset_and_builds_a_graph() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("taxonomy.json");
    fs::write(&path, DATASET).unwrap();

    let data = load_taxonomy(&path).unwrap();
    assert_eq!(data.occupation_count(), 3);
    assert_eq!(data.skill_count(), 3);
    assert_eq!(data.relations().len(), 5);

    let caregiver = data.entity_by_id("occ-b", EntityKind::Occupation).unwrap();
    assert!(caregiver.is_unseen_economy());
    let relation = &data.related_skills("occ-b")[0].relation;
    assert_eq!(relation.relation_type, RelationKind::Optional);
    assert_eq!(relation.signalling_value, Some(0.75));
    assert_eq!(relation.signalling_label, Some(SignallingLabel::High));

    let state = build_graph("sk-2", EntityKind::Skill, &data, None, Limits::default());
    assert_eq!(state.count_at_distance(1), 3);
    assert_eq!(state.node("sk-1").map(|node| node.distance), Some(2));
    assert_eq!(state.node("sk-3").map(|node| node.distance), Some(2));
    assert!(!state.is_truncated);
}

#[test]
fn reports_missing_files_and_tables() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.json");
    assert!(matches!(load_taxonomy(&missing), Err(TaxonomyError::Io { .. })));

    let partial = dir.path().join("partial.json");
    fs::write(&partial, r#"{"occupations": [], "skills": []}"#).unwrap();
    assert!(matches!(
        load_taxonomy(&partial),
        Err(TaxonomyError::MissingTable("occupationtoskillrelations"))
    ));

    let bad_value = dir.path().join("bad.json");
    fs::write(
        &bad_value,
        r#"{"occupations": [], "skills": [], "occupationtoskillrelations": [
            {"OCCUPATIONID": "o", "SKILLID": "s", "SIGNALLINGVALUE": "lots"}
        ]}"#,
    )
    .unwrap();
    assert!(matches!(
        load_taxonomy(&bad_value),
        Err(TaxonomyError::InvalidSignallingValue { .. })
    ));
}

#[test]
fn centrality_file_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let dataset = dir.path().join("taxonomy.json");
    fs::write(&dataset, DATASET).unwrap();
    let data = load_taxonomy(&dataset).unwrap();

    let index = CentralityIndex::from_taxonomy(&data);
    assert_eq!(index.skill_degree("sk-2"), Some(3));
    assert_eq!(index.occupation_centrality("occ-a"), Some(2.0));

    let output = dir.path().join("centrality.json");
    write_centrality(&index, &output).unwrap();
    let raw = fs::read_to_string(&output).unwrap();
    assert!(raw.contains("\"normalizedDegree\""));
    assert!(raw.contains("\"avgSkillDegree\""));

    let loaded = load_centrality(&output).unwrap();
    assert_eq!(loaded, index);
    assert_eq!(loaded.centrality("occ-c", EntityKind::Occupation), Some(2.0));
}

#[test]
fn config_file_overrides_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("explorer.toml");
    fs::write(
        &path,
        "[limits]\ndist1 = 8\ndist3 = 4\n\n[layout]\nreheat_iterations = 60\nseed = 9\n",
    )
    .unwrap();

    let config = ExplorerConfig::load(Some(&path)).unwrap();
    assert_eq!(
        config.limits,
        Limits {
            dist1: 8,
            dist2: 15,
            dist3: 4
        }
    );
    assert_eq!(config.layout.reheat_iterations, 60);
    assert_eq!(config.layout.seed, 9);
    assert_eq!(config.layout.iterations, 300);
}
