use crate::{
    error::ApiError,
    models::{ErrorResponse, Recommendation, RecommendationRequest},
    services::RecommendationService,
};
use actix_web::{
    web::{self, Json},
    HttpResponse,
};

pub fn recommendations_config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/recommend").route(web::post().to(recommend_outfits)));
}

/// Get outfit recommendations
///
/// Retrieves catalog outfits matching the user's gender and preferences, ranks
/// them by visual similarity to a reference outfit and boosts matches on
/// activity, comfort and formality. Returns at most five outfits.
#[utoipa::path(
    post,
    path = "/api/recommend",
    tag = "Recommendations",
    request_body = RecommendationRequest,
    responses(
        (status = 200, description = "Ranked outfits, best first; may be empty", body = [Recommendation]),
        (status = 400, description = "Malformed or incomplete request", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    )
)]
pub async fn recommend_outfits(
    request: Json<RecommendationRequest>,
    recommendation_service: web::Data<RecommendationService>,
) -> Result<HttpResponse, ApiError> {
    request.validate()?;

    let recommendations = recommendation_service
        .rank(&request.user_profile, &request.preferences)
        .await?;

    Ok(HttpResponse::Ok().json(recommendations))
}
