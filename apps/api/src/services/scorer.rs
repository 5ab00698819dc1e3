use crate::{
    config::ScoringConfig,
    models::{OutfitRecord, Preferences},
};

/// Which preference boosts applied to a candidate
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BoostBreakdown {
    pub activity: bool,
    pub comfort: bool,
    pub formality: bool,
}

/// Blends visual similarity with rule-based preference boosts.
#[derive(Debug, Clone)]
pub struct PreferenceScorer {
    config: ScoringConfig,
}

impl PreferenceScorer {
    pub fn new(mut config: ScoringConfig) -> Self {
        config.activity_synonyms = config
            .activity_synonyms
            .into_iter()
            .map(|(activity, synonyms)| {
                (
                    activity.trim().to_lowercase(),
                    synonyms
                        .into_iter()
                        .map(|s| s.trim().to_lowercase())
                        .filter(|s| !s.is_empty())
                        .collect(),
                )
            })
            .collect();

        Self { config }
    }

    /// Activity tags equivalent to `requested`, lower-cased, requested first.
    ///
    /// Unknown activities expand to themselves.
    pub fn expand_activity(&self, requested: &str) -> Vec<String> {
        let requested = requested.trim().to_lowercase();
        let mut expanded = vec![requested.clone()];

        if let Some(synonyms) = self.config.activity_synonyms.get(&requested) {
            for synonym in synonyms {
                if !expanded.contains(synonym) {
                    expanded.push(synonym.clone());
                }
            }
        }

        expanded.retain(|s| !s.is_empty());
        expanded
    }

    pub fn breakdown(&self, record: &OutfitRecord, preferences: &Preferences) -> BoostBreakdown {
        BoostBreakdown {
            activity: self.matches_activity(&record.activity, &preferences.activity),
            comfort: preferences.is_layered()
                && record.outfit_items.len() > self.config.layered_min_items,
            formality: matches_formality(&record.formality, &preferences.formality),
        }
    }

    /// Final confidence in [0, 1]. Never fails; absent data means no boost.
    pub fn score(&self, record: &OutfitRecord, similarity: f32, preferences: &Preferences) -> f32 {
        let boosts = self.breakdown(record, preferences);

        let mut score = similarity;
        if boosts.activity {
            score *= self.config.activity_boost;
        }
        if boosts.comfort {
            score *= self.config.comfort_boost;
        }
        if boosts.formality {
            score *= self.config.formality_boost;
        }

        if score.is_nan() {
            return 0.0;
        }
        score.clamp(0.0, 1.0)
    }

    /// The candidate tag must contain one of the requested activity's synonyms.
    fn matches_activity(&self, candidate: &str, requested: &str) -> bool {
        let candidate = candidate.trim().to_lowercase();
        if candidate.is_empty() {
            return false;
        }

        let requested_key = requested.trim().to_lowercase();
        match self.config.activity_synonyms.get(&requested_key) {
            Some(synonyms) => synonyms
                .iter()
                .any(|synonym| candidate.contains(synonym.as_str())),
            None => candidate == requested_key,
        }
    }
}

impl Default for PreferenceScorer {
    fn default() -> Self {
        Self::new(ScoringConfig::default())
    }
}

fn matches_formality(candidate: &str, requested: &str) -> bool {
    let candidate = candidate.trim();
    !candidate.is_empty() && candidate.eq_ignore_ascii_case(requested.trim())
}
