use actix_web::{test, web, App};
use async_trait::async_trait;
use outfit_recommender_api::{
    app::json_config,
    error::{ApiError, Result},
    ml::{Embedding, FeatureExtractor},
    routes::{api_routes, openapi_route},
    services::{InMemoryOutfitStore, PreferenceScorer, RecommendationService},
};
use serde_json::{json, Value};
use std::{collections::HashMap, sync::Arc};

const CATALOG: &str = r#"[
    { "_id": "1", "prompt": "A woman wearing a Sports Bra, Leggings, Running Shoes",
      "image_url": "img://1", "outfit_items": { "top": "Sports Bra", "bottom": "Leggings", "shoes": "Running Shoes" },
      "gender": "female", "activity": "gym", "formality": "casual" },
    { "_id": "2", "prompt": "A man wearing a Tank Top, Shorts, Sneakers",
      "image_url": "img://2", "outfit_items": { "top": "Tank Top", "bottom": "Shorts" },
      "gender": "male", "activity": "gym", "formality": "casual" },
    { "_id": "3", "prompt": "A person wearing a Hoodie, Joggers",
      "image_url": "img://3", "outfit_items": { "top": "Hoodie", "bottom": "Joggers" },
      "gender": "gender neutral", "activity": "lounging", "formality": "casual" },
    { "_id": "4", "prompt": "A woman wearing a Blazer, Trousers, Loafers",
      "image_url": "img://4", "outfit_items": { "top": "Blazer", "bottom": "Trousers", "shoes": "Loafers" },
      "gender": "female", "activity": "work", "formality": "formal" },
    { "_id": "5", "prompt": "A woman wearing a Windbreaker, Hiking Pants, Boots",
      "image_url": "img://5", "outfit_items": { "outerwear": "Windbreaker", "bottom": "Hiking Pants", "shoes": "Boots" },
      "gender": "female", "activity": "casual outing", "formality": "casual" },
    { "_id": "6", "prompt": "A woman wearing a T-Shirt, Jeans",
      "image_url": "img://missing", "outfit_items": { "top": "T-Shirt", "bottom": "Jeans" },
      "gender": "female", "activity": "gym", "formality": "casual" }
]"#;

struct FixedExtractor {
    embeddings: HashMap<&'static str, Embedding>,
}

#[async_trait]
impl FeatureExtractor for FixedExtractor {
    async fn extract(&self, image_url: &str) -> Result<Embedding> {
        self.embeddings
            .get(image_url)
            .cloned()
            .ok_or_else(|| ApiError::ExtractionFailed(format!("unreachable image {}", image_url)))
    }
}

fn recommendation_service(catalog: &str) -> RecommendationService {
    let extractor = FixedExtractor {
        embeddings: HashMap::from([
            ("img://1", vec![1.0, 0.0, 0.0]),
            ("img://2", vec![0.9, 0.1, 0.0]),
            ("img://3", vec![0.5, 0.5, 0.1]),
            ("img://4", vec![0.1, 0.9, 0.3]),
            ("img://5", vec![0.7, 0.2, 0.2]),
        ]),
    };
    let store = InMemoryOutfitStore::from_json(catalog).unwrap();

    RecommendationService::new(Arc::new(extractor), Arc::new(store), PreferenceScorer::default())
}

macro_rules! init_app {
    ($catalog:expr) => {
        test::init_service(
            App::new()
                .app_data(json_config())
                .app_data(web::Data::new(recommendation_service($catalog)))
                .service(api_routes())
                .service(openapi_route()),
        )
        .await
    };
}

#[actix_web::test]
async fn test_recommend_returns_ranked_outfits() {
    let app = init_app!(CATALOG);

    let req = test::TestRequest::post()
        .uri("/api/recommend")
        .set_json(json!({
            "user_profile": { "gender": "female" },
            "preferences": {
                "weather": { "temp": 18, "description": "clear sky" },
                "activity": "Gym",
                "comfortLevel": "Layered",
                "formality": "Casual"
            }
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());

    let body: Vec<Value> = test::read_body_json(resp).await;
    assert!(!body.is_empty() && body.len() <= 5);

    let ids: Vec<&str> = body.iter().map(|r| r["_id"].as_str().unwrap()).collect();
    assert_eq!(ids[0], "1");
    // male outfit is filtered out and the unreachable image is skipped
    assert!(!ids.contains(&"2"));
    assert!(!ids.contains(&"6"));

    let scores: Vec<f64> = body
        .iter()
        .map(|r| r["confidence_score"].as_f64().unwrap())
        .collect();
    assert!(scores.windows(2).all(|w| w[0] >= w[1]));
    assert!(scores.iter().all(|s| (0.0..=1.0).contains(s)));

    for recommendation in &body {
        let gender = recommendation["gender"].as_str().unwrap();
        assert!(gender == "female" || gender == "gender neutral");
        assert!(recommendation["image_url"].as_str().unwrap().starts_with("img://"));
    }
}

#[actix_web::test]
async fn test_recommend_with_no_candidates_returns_empty_array() {
    let app = init_app!(r#"[{ "_id": "2", "image_url": "img://2", "gender": "male", "activity": "gym" }]"#);

    let req = test::TestRequest::post()
        .uri("/api/recommend")
        .set_json(json!({
            "user_profile": { "gender": "female" },
            "preferences": { "activity": "work", "formality": "formal" }
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!([]));
}

#[actix_web::test]
async fn test_malformed_payloads_are_rejected() {
    let app = init_app!(CATALOG);

    let payloads = [
        "{ not json".to_string(),
        json!({ "user_profile": { "gender": "female" } }).to_string(),
        json!({
            "user_profile": { "gender": "robot" },
            "preferences": { "activity": "gym", "formality": "casual" }
        })
        .to_string(),
        json!({
            "user_profile": { "gender": "male" },
            "preferences": { "activity": " ", "formality": "casual" }
        })
        .to_string(),
    ];

    for payload in payloads {
        let req = test::TestRequest::post()
            .uri("/api/recommend")
            .insert_header(("Content-Type", "application/json"))
            .set_payload(payload.clone())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400, "payload: {}", payload);

        let body: Value = test::read_body_json(resp).await;
        assert!(body["error"].is_string(), "payload: {}", payload);
    }
}

#[actix_web::test]
async fn test_health_and_openapi() {
    let app = init_app!(CATALOG);

    let req = test::TestRequest::get().uri("/api/health").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["status"], "ok");

    let req = test::TestRequest::get()
        .uri("/api-docs/openapi.json")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let recommend = &body["paths"]["/api/recommend"]["post"];
    assert_eq!(recommend["summary"], "Get outfit recommendations");
    assert!(recommend["description"]
        .as_str()
        .unwrap()
        .contains("at most five outfits"));
    assert_eq!(
        body["paths"]["/api/prewarm"]["get"]["summary"],
        "Prewarm the outfit store and feature extractor"
    );
}

#[actix_web::test]
async fn test_prewarm_reports_first_run() {
    let app = init_app!(CATALOG);

    let req = test::TestRequest::get().uri("/api/prewarm").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["first_prewarm"], true);

    let req = test::TestRequest::get().uri("/api/prewarm").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["first_prewarm"], false);
}
