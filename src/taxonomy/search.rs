use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use super::model::{Entity, TaxonomyData};

fn fuzzy_match_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_ascii_lowercase(), &query.to_ascii_lowercase()))
}

impl TaxonomyData {
    /// Entities whose label or code fuzzily matches `query`, best first.
    pub fn search(&self, query: &str, limit: usize) -> Vec<&Entity> {
        let query = query.trim();
        if query.is_empty() || limit == 0 {
            return Vec::new();
        }

        let matcher = SkimMatcherV2::default();
        let mut ranked = self
            .occupations()
            .chain(self.skills())
            .filter_map(|entity| {
                let score = fuzzy_match_score(&matcher, &entity.label, query)
                    .into_iter()
                    .chain(fuzzy_match_score(&matcher, &entity.code, query))
                    .max()?;
                Some((score, entity))
            })
            .collect::<Vec<_>>();

        ranked.sort_by(|a, b| {
            b.0.cmp(&a.0)
                .then_with(|| a.1.label.len().cmp(&b.1.label.len()))
                .then_with(|| a.1.label.cmp(&b.1.label))
                .then_with(|| a.1.id.cmp(&b.1.id))
        });
        ranked.truncate(limit);
        ranked.into_iter().map(|(_, entity)| entity).collect()
    }
}

#[cfg(test)]
mod tests {
    use crate::taxonomy::{Entity, EntityKind, TaxonomyData};

    #[test]
    fn finds_occupations_and_skills_by_label() {
        let data = TaxonomyData::new(
            [Entity::new("o1", "2511", "software developer", EntityKind::Occupation)],
            [
                Entity::new("s1", "S1", "develop software prototype", EntityKind::Skill),
                Entity::new("s2", "S2", "bake bread", EntityKind::Skill),
            ],
            Vec::new(),
        );

        let hits = data.search("softw", 10);
        let ids = hits.iter().map(|entity| entity.id.as_str()).collect::<Vec<_>>();
        assert!(ids.contains(&"o1"));
        assert!(ids.contains(&"s1"));
        assert!(!ids.contains(&"s2"));
        assert!(data.search("   ", 10).is_empty());
        assert_eq!(data.search("2511", 1)[0].id, "o1");
    }
}
