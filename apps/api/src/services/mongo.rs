use crate::{
    config::MongoConfig,
    error::{ApiError, Result},
    models::OutfitRecord,
    services::candidate_store::{CandidateFilter, CandidateStore},
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error};

/// Outfit collection reached through the MongoDB Atlas Data API.
#[derive(Debug, Clone)]
pub struct MongoDataApiClient {
    client: Client,
    base_url: String,
    api_key: String,
    data_source: String,
    database: String,
    collection: String,
    limit: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FindRequest<'a> {
    data_source: &'a str,
    database: &'a str,
    collection: &'a str,
    filter: serde_json::Value,
    limit: usize,
}

#[derive(Debug, Deserialize)]
struct FindResponse {
    #[serde(default)]
    documents: Vec<OutfitRecord>,
}

impl MongoDataApiClient {
    pub fn new(config: &MongoConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| ApiError::InternalError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.data_api_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            data_source: config.data_source.clone(),
            database: config.database.clone(),
            collection: config.collection.clone(),
            limit: config.candidate_limit,
        })
    }

    pub async fn find(&self, filter: serde_json::Value) -> Result<Vec<OutfitRecord>> {
        let url = format!("{}/action/find", self.base_url);
        let request = FindRequest {
            data_source: &self.data_source,
            database: &self.database,
            collection: &self.collection,
            filter,
            limit: self.limit,
        };

        debug!("Querying {}.{} with filter {}", self.database, self.collection, request.filter);

        let response = self
            .client
            .post(&url)
            .header("api-key", &self.api_key)
            .header("Accept", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| ApiError::StoreQuery(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            error!("Data API error ({}): {}", status, text);
            return Err(ApiError::StoreQuery(format!(
                "Unexpected status code: {} - {}",
                status, text
            )));
        }

        let body: FindResponse = response
            .json()
            .await
            .map_err(|e| ApiError::SerializationError(e.to_string()))?;

        Ok(body.documents)
    }
}

#[async_trait]
impl CandidateStore for MongoDataApiClient {
    async fn query(&self, filter: &CandidateFilter) -> Result<Vec<OutfitRecord>> {
        self.find(filter.to_mongo_filter()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Gender;
    use serde_json::json;
    use wiremock::{
        matchers::{body_partial_json, header, method, path},
        Mock, MockServer, ResponseTemplate,
    };

    fn test_config(base_url: &str) -> MongoConfig {
        MongoConfig {
            data_api_url: format!("{}/", base_url),
            api_key: "data-api-key".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_query_sends_filter_and_parses_documents() {
        let server = MockServer::start().await;
        let filter = CandidateFilter::primary(Gender::Female, ["work"], "formal");

        Mock::given(method("POST"))
            .and(path("/action/find"))
            .and(header("api-key", "data-api-key"))
            .and(body_partial_json(json!({
                "dataSource": "Cluster0",
                "database": "test",
                "collection": "outfits",
                "limit": 100,
                "filter": filter.to_mongo_filter(),
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "documents": [
                    {
                        "_id": { "$oid": "6650f1c2a4e3b9d1c8a7e001" },
                        "prompt": "A woman wearing a Blazer, Chinos, Loafers",
                        "image_url": "https://storage.example.com/1.png",
                        "outfit_items": { "top": "Blazer", "bottom": "Chinos", "shoes": "Loafers" },
                        "gender": "female",
                        "activity": "work",
                        "formality": "formal"
                    }
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = MongoDataApiClient::new(&test_config(&server.uri())).unwrap();
        let records = client.query(&filter).await.unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "6650f1c2a4e3b9d1c8a7e001");
        assert_eq!(records[0].outfit_items.len(), 3);
    }

    #[tokio::test]
    async fn test_non_success_status_is_store_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/action/find"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
            .mount(&server)
            .await;

        let client = MongoDataApiClient::new(&test_config(&server.uri())).unwrap();
        let result = client
            .query(&CandidateFilter::gender_only(Gender::Male))
            .await;

        assert!(matches!(result, Err(ApiError::StoreQuery(_))));
    }
}
