//! Prewarm endpoint to address cold starts of the inference model

use crate::{error::Result, services::RecommendationService};
use actix_web::{web, HttpResponse};
use log::info;
use serde_json::json;

/// Prewarm the outfit store and feature extractor
///
/// Loads the inference model, issues a probe query against the outfit catalog
/// and embeds the first image it returns, so the first real request does not
/// pay for a cold start.
#[utoipa::path(
    get,
    path = "/api/prewarm",
    tag = "System",
    responses(
        (status = 200, description = "Services prewarmed, fully or partially", body = serde_json::Value)
    )
)]
#[actix_web::get("/prewarm")]
pub async fn prewarm(
    recommendation_service: web::Data<RecommendationService>,
) -> Result<HttpResponse> {
    info!("Prewarming API services...");

    match recommendation_service.prewarm().await {
        Ok(was_first) => {
            let message = if was_first {
                "API services successfully prewarmed for the first time"
            } else {
                "API services already prewarmed"
            };

            Ok(HttpResponse::Ok().json(json!({
                "status": "ok",
                "message": message,
                "first_prewarm": was_first,
                "timestamp": chrono::Utc::now().to_rfc3339(),
            })))
        }
        Err(e) => {
            // the service may still answer requests once the model is up
            info!("Prewarm partially completed with warning: {}", e);

            Ok(HttpResponse::Ok().json(json!({
                "status": "partial",
                "message": "API services partially prewarmed",
                "warning": e.to_string(),
                "timestamp": chrono::Utc::now().to_rfc3339(),
            })))
        }
    }
}
