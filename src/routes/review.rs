use mongodb::bson::doc;
use mongodb::options::FindOptions;
use rocket::futures::TryStreamExt;
use rocket::serde::json::Json;
use rocket::State;
use rocket_okapi::openapi;

use crate::db::Db;
use crate::guards::AuthGuard;
use crate::models::{CreateReviewDto, ReviewResponse, ReviewsResponse};
use crate::services::{NewReview, RatingService};
use crate::utils::{parse_object_id, ApiError, Created, JsonBody, MessageResponse};

/// Stores the review and refreshes the housekeeper's rating in one unit.
#[openapi(tag = "Ratings")]
#[post("/ratings", data = "<dto>")]
pub async fn create_review(
    ratings: &State<RatingService>,
    auth: AuthGuard,
    dto: JsonBody<CreateReviewDto>,
) -> Result<Created<MessageResponse>, ApiError> {
    let dto = dto.validated()?;

    let review_id = ratings
        .submit_review(NewReview {
            employer_id: parse_object_id(&dto.employer_id, "employer")?,
            housekeeper_id: parse_object_id(&dto.housekeeper_id, "housekeeper")?,
            rating: dto.rating,
            comment: dto.comment,
        })
        .await?;

    log::debug!("Review {} submitted by {} {}", review_id, auth.role, auth.user_id);
    Ok(Created(MessageResponse::with_id(
        "Review submitted successfully",
        review_id,
    )))
}

#[openapi(tag = "Ratings")]
#[get("/ratings/housekeeper/<housekeeper_id>")]
pub async fn get_housekeeper_reviews(
    db: &State<Db>,
    _auth: AuthGuard,
    housekeeper_id: String,
) -> Result<Json<ReviewsResponse>, ApiError> {
    let housekeeper_id = parse_object_id(&housekeeper_id, "housekeeper")?;

    let find_options = FindOptions::builder()
        .sort(doc! { "created_at": -1 })
        .build();

    let reviews: Vec<ReviewResponse> = db
        .reviews()
        .find(doc! { "housekeeper_id": housekeeper_id }, find_options)
        .await
        .map_err(|e| ApiError::storage("Failed to fetch reviews", e))?
        .map_ok(ReviewResponse::from)
        .try_collect()
        .await
        .map_err(|e| ApiError::storage("Failed to read reviews", e))?;

    Ok(Json(ReviewsResponse { reviews }))
}
