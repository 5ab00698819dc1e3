use crate::{
    error::Result,
    models::{Gender, OutfitRecord},
};
use async_trait::async_trait;
use serde_json::{json, Value};

/// A queryable collection of outfit records.
#[async_trait]
pub trait CandidateStore: Send + Sync {
    /// Records matching `filter`, in the store's natural order.
    async fn query(&self, filter: &CandidateFilter) -> Result<Vec<OutfitRecord>>;
}

/// Activity/formality half of the primary filter. Values are lower-cased.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeFilter {
    pub activities: Vec<String>,
    pub formality: String,
}

/// Candidate filter: gender must be admitted and, unless this is the
/// gender-only fallback, the activity or the formality must match.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateFilter {
    pub gender: Gender,
    pub attributes: Option<AttributeFilter>,
}

impl CandidateFilter {
    pub fn primary<I, S>(gender: Gender, activities: I, formality: &str) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut normalized: Vec<String> = Vec::new();
        for activity in activities {
            let activity = activity.as_ref().trim().to_lowercase();
            if !activity.is_empty() && !normalized.contains(&activity) {
                normalized.push(activity);
            }
        }

        Self {
            gender,
            attributes: Some(AttributeFilter {
                activities: normalized,
                formality: formality.trim().to_lowercase(),
            }),
        }
    }

    pub fn gender_only(gender: Gender) -> Self {
        Self {
            gender,
            attributes: None,
        }
    }

    pub fn is_gender_only(&self) -> bool {
        self.attributes.is_none()
    }

    /// Render as a MongoDB query document. String predicates are anchored,
    /// escaped, case-insensitive regexes.
    pub fn to_mongo_filter(&self) -> Value {
        let gender_clause = json!({ "gender": exact_ci(self.gender.admitted_values()) });

        let Some(attributes) = &self.attributes else {
            return gender_clause;
        };

        let mut alternatives = Vec::new();
        if !attributes.activities.is_empty() {
            alternatives.push(json!({ "activity": exact_ci(&attributes.activities) }));
        }
        if !attributes.formality.is_empty() {
            alternatives.push(json!({ "formality": exact_ci([&attributes.formality]) }));
        }

        if alternatives.is_empty() {
            return gender_clause;
        }

        json!({ "$and": [gender_clause, { "$or": alternatives }] })
    }

    /// Evaluate the filter against a record in memory, with the same
    /// semantics as [`CandidateFilter::to_mongo_filter`].
    pub fn matches(&self, record: &OutfitRecord) -> bool {
        if !self.gender.admits(&record.gender) {
            return false;
        }

        let Some(attributes) = &self.attributes else {
            return true;
        };

        if attributes.activities.is_empty() && attributes.formality.is_empty() {
            return true;
        }

        let activity = record.activity.trim().to_lowercase();
        let formality = record.formality.trim().to_lowercase();

        attributes.activities.contains(&activity)
            || (!attributes.formality.is_empty() && attributes.formality == formality)
    }
}

/// `{"$regex": "^\\s*(?:a|b)\\s*$", "$options": "i"}` over the given
/// literals. Surrounding whitespace is tolerated, as in [`CandidateFilter::matches`].
fn exact_ci<I, S>(values: I) -> Value
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let alternation = values
        .into_iter()
        .map(|v| regex::escape(v.as_ref()))
        .collect::<Vec<_>>()
        .join("|");

    json!({ "$regex": format!(r"^\s*(?:{})\s*$", alternation), "$options": "i" })
}
