use mongodb::bson::doc;
use rocket::serde::json::Json;
use rocket::State;
use rocket_okapi::openapi;

use crate::db::Db;
use crate::guards::AuthGuard;
use crate::models::{EmployerResponse, EmployerUpdate};
use crate::utils::{parse_object_id, ApiError, JsonBody, MessageResponse};

#[openapi(tag = "Employers")]
#[get("/employers/<id>")]
pub async fn get_employer(
    db: &State<Db>,
    _auth: AuthGuard,
    id: String,
) -> Result<Json<EmployerResponse>, ApiError> {
    let id = parse_object_id(&id, "employer")?;

    let employer = db
        .employers()
        .find_one(doc! { "_id": id }, None)
        .await
        .map_err(|e| ApiError::storage("Failed to fetch employer", e))?
        .ok_or_else(|| ApiError::not_found("Employer not found"))?;

    Ok(Json(employer.into()))
}

#[openapi(tag = "Employers")]
#[put("/employers/<id>", data = "<dto>")]
pub async fn update_employer(
    db: &State<Db>,
    _auth: AuthGuard,
    id: String,
    dto: JsonBody<EmployerUpdate>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = parse_object_id(&id, "employer")?;
    let update = dto
        .validated()?
        .to_update_document()
        .ok_or_else(|| ApiError::bad_request("No fields to update"))?;

    let result = db
        .employers()
        .update_one(doc! { "_id": id }, update, None)
        .await
        .map_err(|e| ApiError::storage("Failed to update employer", e))?;

    if result.matched_count == 0 {
        return Err(ApiError::not_found("Employer not found"));
    }

    Ok(Json(MessageResponse::with_id("Employer updated successfully", id)))
}
