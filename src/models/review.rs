use mongodb::bson::{oid::ObjectId, DateTime};
use rocket_okapi::okapi::schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

pub const MIN_RATING: f64 = 1.0;
pub const MAX_RATING: f64 = 5.0;

/// Immutable once stored.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Review {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub employer_id: ObjectId,
    pub housekeeper_id: ObjectId,
    pub rating: f64, // 1-5
    pub comment: Option<String>,
    pub created_at: DateTime,
}

/// Range checks on `rating` belong to the rating aggregator.
#[derive(Debug, Deserialize, Validate, JsonSchema)]
pub struct CreateReviewDto {
    pub employer_id: String,
    pub housekeeper_id: String,
    pub rating: f64,
    #[validate(length(max = 2000))]
    pub comment: Option<String>,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct ReviewResponse {
    pub id: String,
    pub employer_id: String,
    pub housekeeper_id: String,
    pub rating: f64,
    pub comment: Option<String>,
    pub created_at: String,
}

impl From<Review> for ReviewResponse {
    fn from(review: Review) -> Self {
        ReviewResponse {
            id: review.id.map(|id| id.to_hex()).unwrap_or_default(),
            employer_id: review.employer_id.to_hex(),
            housekeeper_id: review.housekeeper_id.to_hex(),
            rating: review.rating,
            comment: review.comment,
            created_at: super::to_rfc3339(review.created_at),
        }
    }
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct ReviewsResponse {
    pub reviews: Vec<ReviewResponse>,
}
