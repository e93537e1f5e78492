use mongodb::bson::{doc, DateTime};
use mongodb::options::FindOptions;
use rocket::futures::TryStreamExt;
use rocket::serde::json::Json;
use rocket::State;
use rocket_okapi::openapi;

use crate::db::Db;
use crate::guards::AuthGuard;
use crate::models::{
    parse_start_date, CreateHiringDto, Hiring, HiringResponse, HiringStatus, UpdateHiringStatusDto,
};
use crate::services::{HiringNotice, Notifier};
use crate::utils::{parse_object_id, ApiError, Created, JsonBody, MessageResponse};

/// Creates a pending hiring request and queues the operator email. The
/// response does not wait for, or depend on, the email.
#[openapi(tag = "Hiring")]
#[post("/hiring", data = "<dto>")]
pub async fn create_hiring(
    db: &State<Db>,
    notifier: &State<Notifier>,
    auth: AuthGuard,
    dto: JsonBody<CreateHiringDto>,
) -> Result<Created<MessageResponse>, ApiError> {
    let dto = dto.validated()?;
    let employer_id = parse_object_id(&dto.employer_id, "employer")?;
    let housekeeper_id = parse_object_id(&dto.housekeeper_id, "housekeeper")?;
    let start_date = parse_start_date(&dto.start_date).map_err(ApiError::bad_request)?;

    let employer = db
        .employers()
        .find_one(doc! { "_id": employer_id }, None)
        .await
        .map_err(|e| ApiError::storage("Failed to fetch employer", e))?
        .ok_or_else(|| ApiError::bad_request("Employer not found"))?;

    let housekeeper = db
        .housekeepers()
        .find_one(doc! { "_id": housekeeper_id }, None)
        .await
        .map_err(|e| ApiError::storage("Failed to fetch housekeeper", e))?
        .ok_or_else(|| ApiError::bad_request("Housekeeper not found"))?;

    let now = DateTime::now();
    let mut hiring = Hiring {
        id: None,
        employer_id,
        housekeeper_id,
        status: HiringStatus::Pending,
        requirements: dto.requirements,
        salary_offer: dto.salary_offer,
        start_date,
        delivery_type: dto.delivery_type,
        created_at: now,
        updated_at: now,
    };

    let result = db
        .hirings()
        .insert_one(&hiring, None)
        .await
        .map_err(|e| ApiError::storage("Failed to create hiring request", e))?;
    let id = result
        .inserted_id
        .as_object_id()
        .ok_or_else(|| ApiError::internal_error("Inserted document has no object id"))?;
    hiring.id = Some(id);
    log::info!("Hiring request {} created by {} {}", id, auth.role, auth.user_id);

    // Best effort: never fails this request.
    notifier.notify_hiring_created(HiringNotice {
        employer,
        housekeeper,
        hiring,
    });

    Ok(Created(MessageResponse::with_id(
        "Hiring request created successfully",
        id,
    )))
}

#[openapi(tag = "Hiring")]
#[get("/hiring/<id>")]
pub async fn get_hiring(
    db: &State<Db>,
    _auth: AuthGuard,
    id: String,
) -> Result<Json<HiringResponse>, ApiError> {
    let id = parse_object_id(&id, "hiring")?;

    let hiring = db
        .hirings()
        .find_one(doc! { "_id": id }, None)
        .await
        .map_err(|e| ApiError::storage("Failed to fetch hiring request", e))?
        .ok_or_else(|| ApiError::not_found("Hiring request not found"))?;

    Ok(Json(hiring.into()))
}

/// Moves a hiring along its lifecycle. The write only lands if the status is
/// still the one the transition was checked against.
#[openapi(tag = "Hiring")]
#[put("/hiring/<id>/status", data = "<dto>")]
pub async fn update_hiring_status(
    db: &State<Db>,
    _auth: AuthGuard,
    id: String,
    dto: JsonBody<UpdateHiringStatusDto>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = parse_object_id(&id, "hiring")?;
    let requested = dto.into_inner().status;

    let hiring = db
        .hirings()
        .find_one(doc! { "_id": id }, None)
        .await
        .map_err(|e| ApiError::storage("Failed to fetch hiring request", e))?
        .ok_or_else(|| ApiError::not_found("Hiring request not found"))?;

    let next = hiring
        .status
        .transition(requested)
        .map_err(|e| ApiError::bad_request(e.to_string()))?;

    let result = db
        .hirings()
        .update_one(
            doc! { "_id": id, "status": hiring.status.as_str() },
            doc! { "$set": { "status": next.as_str(), "updated_at": DateTime::now() } },
            None,
        )
        .await
        .map_err(|e| ApiError::storage("Failed to update hiring status", e))?;

    if result.matched_count == 0 {
        return Err(ApiError::bad_request(
            "Hiring status changed while updating, fetch it and retry",
        ));
    }

    log::info!("Hiring {} moved {} -> {}", id, hiring.status, next);
    Ok(Json(MessageResponse::with_id(
        format!("Hiring status updated to {}", next),
        id,
    )))
}

/// An employer's hiring history, newest first.
#[openapi(tag = "Hiring")]
#[get("/hiring/employer/<employer_id>")]
pub async fn get_employer_hirings(
    db: &State<Db>,
    _auth: AuthGuard,
    employer_id: String,
) -> Result<Json<Vec<HiringResponse>>, ApiError> {
    let employer_id = parse_object_id(&employer_id, "employer")?;

    let find_options = FindOptions::builder()
        .sort(doc! { "created_at": -1 })
        .build();

    let hirings: Vec<HiringResponse> = db
        .hirings()
        .find(doc! { "employer_id": employer_id }, find_options)
        .await
        .map_err(|e| ApiError::storage("Failed to fetch hiring history", e))?
        .map_ok(HiringResponse::from)
        .try_collect()
        .await
        .map_err(|e| ApiError::storage("Failed to read hiring history", e))?;

    Ok(Json(hirings))
}
