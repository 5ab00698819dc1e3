use crate::error::{ApiError, Result};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub use outfit::{OutfitRecord, Recommendation};
pub use preferences::{Gender, Preferences, UserProfile, Weather};

mod outfit;
mod preferences;

/// Request payload for outfit recommendations
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RecommendationRequest {
    pub user_profile: UserProfile,
    pub preferences: Preferences,
}

impl RecommendationRequest {
    /// Reject payloads that deserialized but carry blank required fields.
    pub fn validate(&self) -> Result<()> {
        if self.preferences.activity.trim().is_empty() {
            return Err(ApiError::InvalidInput(
                "preferences.activity cannot be empty".to_string(),
            ));
        }
        if self.preferences.formality.trim().is_empty() {
            return Err(ApiError::InvalidInput(
                "preferences.formality cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Health check response structure
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Status of the service
    #[schema(example = "ok")]
    pub status: String,
    /// Current timestamp in RFC3339 format
    #[schema(example = "2024-01-15T10:30:00Z")]
    pub timestamp: String,
}

/// Error response structure
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message
    #[schema(example = "Invalid input: preferences.activity cannot be empty")]
    pub error: String,
}
