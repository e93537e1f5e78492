use mongodb::bson::doc;
use mongodb::options::FindOptions;
use rocket::futures::TryStreamExt;
use rocket::serde::json::Json;
use rocket::State;
use rocket_okapi::openapi;

use crate::db::Db;
use crate::guards::AuthGuard;
use crate::models::{HousekeeperFilter, HousekeeperQuery, HousekeeperResponse, HousekeeperUpdate};
use crate::utils::{parse_object_id, ApiError, JsonBody, MessageResponse};

/// Available housekeepers matching the filters, best rated first.
#[openapi(tag = "Housekeepers")]
#[get("/housekeepers?<query..>")]
pub async fn list_housekeepers(
    db: &State<Db>,
    _auth: AuthGuard,
    query: HousekeeperQuery,
) -> Result<Json<Vec<HousekeeperResponse>>, ApiError> {
    let filter = HousekeeperFilter::try_from(query).map_err(ApiError::bad_request)?;

    let find_options = FindOptions::builder()
        .sort(HousekeeperFilter::sort_document())
        .build();

    let housekeepers: Vec<HousekeeperResponse> = db
        .housekeepers()
        .find(filter.to_document(), find_options)
        .await
        .map_err(|e| ApiError::storage("Failed to fetch housekeepers", e))?
        .map_ok(HousekeeperResponse::from)
        .try_collect()
        .await
        .map_err(|e| ApiError::storage("Failed to read housekeepers", e))?;

    Ok(Json(housekeepers))
}

#[openapi(tag = "Housekeepers")]
#[get("/housekeepers/<id>")]
pub async fn get_housekeeper(
    db: &State<Db>,
    _auth: AuthGuard,
    id: String,
) -> Result<Json<HousekeeperResponse>, ApiError> {
    let id = parse_object_id(&id, "housekeeper")?;

    let housekeeper = db
        .housekeepers()
        .find_one(doc! { "_id": id }, None)
        .await
        .map_err(|e| ApiError::storage("Failed to fetch housekeeper", e))?
        .ok_or_else(|| ApiError::not_found("Housekeeper not found"))?;

    Ok(Json(housekeeper.into()))
}

/// Partial update; `rating` is not writable here.
#[openapi(tag = "Housekeepers")]
#[put("/housekeepers/<id>", data = "<dto>")]
pub async fn update_housekeeper(
    db: &State<Db>,
    _auth: AuthGuard,
    id: String,
    dto: JsonBody<HousekeeperUpdate>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = parse_object_id(&id, "housekeeper")?;
    let update = dto
        .validated()?
        .to_update_document()
        .ok_or_else(|| ApiError::bad_request("No fields to update"))?;

    let result = db
        .housekeepers()
        .update_one(doc! { "_id": id }, update, None)
        .await
        .map_err(|e| ApiError::storage("Failed to update housekeeper", e))?;

    if result.matched_count == 0 {
        return Err(ApiError::not_found("Housekeeper not found"));
    }

    Ok(Json(MessageResponse::with_id("Housekeeper updated successfully", id)))
}

#[openapi(tag = "Housekeepers")]
#[delete("/housekeepers/<id>")]
pub async fn delete_housekeeper(
    db: &State<Db>,
    _auth: AuthGuard,
    id: String,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = parse_object_id(&id, "housekeeper")?;

    let result = db
        .housekeepers()
        .delete_one(doc! { "_id": id }, None)
        .await
        .map_err(|e| ApiError::storage("Failed to delete housekeeper", e))?;

    if result.deleted_count == 0 {
        return Err(ApiError::not_found("Housekeeper not found"));
    }

    log::info!("Housekeeper deleted: {}", id);
    Ok(Json(MessageResponse::with_id("Housekeeper deleted successfully", id)))
}
