use crate::{
    error::{ApiError, Result},
    models::OutfitRecord,
    services::candidate_store::{CandidateFilter, CandidateStore},
};
use async_trait::async_trait;
use std::path::Path;
use tracing::info;

/// Outfit catalog held in memory, loaded from a JSON array of documents.
#[derive(Debug, Clone, Default)]
pub struct InMemoryOutfitStore {
    records: Vec<OutfitRecord>,
}

impl InMemoryOutfitStore {
    pub fn new(records: Vec<OutfitRecord>) -> Self {
        Self { records }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let records: Vec<OutfitRecord> = serde_json::from_str(json)?;
        Ok(Self::new(records))
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            ApiError::ConfigError(format!("Failed to read catalog {}: {}", path.display(), e))
        })?;
        let store = Self::from_json(&json)?;
        info!("Loaded {} outfits from {}", store.len(), path.display());
        Ok(store)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl CandidateStore for InMemoryOutfitStore {
    async fn query(&self, filter: &CandidateFilter) -> Result<Vec<OutfitRecord>> {
        Ok(self
            .records
            .iter()
            .filter(|record| filter.matches(record))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Gender;

    const CATALOG: &str = r#"[
        { "_id": "1", "gender": "female", "activity": "gym", "formality": "casual" },
        { "_id": "2", "gender": "male", "activity": "gym", "formality": "casual" },
        { "_id": "3", "gender": "gender neutral", "activity": "lounging", "formality": "casual" },
        { "_id": "4", "gender": "female", "activity": "work", "formality": "formal" }
    ]"#;

    #[tokio::test]
    async fn test_query_preserves_catalog_order() {
        let store = InMemoryOutfitStore::from_json(CATALOG).unwrap();
        assert_eq!(store.len(), 4);

        let filter = CandidateFilter::primary(Gender::Female, ["gym", "lounging"], "formal");
        let ids: Vec<_> = store
            .query(&filter)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec!["1", "3", "4"]);
    }

    #[tokio::test]
    async fn test_gender_only_query() {
        let store = InMemoryOutfitStore::from_json(CATALOG).unwrap();
        let records = store
            .query(&CandidateFilter::gender_only(Gender::Male))
            .await
            .unwrap();
        let ids: Vec<_> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "3"]);
    }

    #[test]
    fn test_invalid_catalog_rejected() {
        assert!(InMemoryOutfitStore::from_json("{ not json").is_err());
        assert!(InMemoryOutfitStore::from_path("/nonexistent/catalog.json").is_err());
    }
}
