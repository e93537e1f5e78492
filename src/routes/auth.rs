use mongodb::bson::doc;
use rocket::serde::json::Json;
use rocket::State;
use rocket_okapi::openapi;

use crate::db::Db;
use crate::models::{
    Employer, Housekeeper, LoginDto, RegisterEmployerDto, RegisterHousekeeperDto, TokenResponse,
    UserRole,
};
use crate::services::password::{hash_password, verify_password};
use crate::services::JwtService;
use crate::utils::{ApiError, Created, JsonBody, MessageResponse};

const INVALID_CREDENTIALS: &str = "Invalid email or password";

fn inserted_id(result: mongodb::results::InsertOneResult) -> Result<mongodb::bson::oid::ObjectId, ApiError> {
    result
        .inserted_id
        .as_object_id()
        .ok_or_else(|| ApiError::internal_error("Inserted document has no object id"))
}

/// --------------------
/// Registration
/// --------------------
#[openapi(tag = "Auth")]
#[post("/auth/register/housekeeper", data = "<dto>")]
pub async fn register_housekeeper(
    db: &State<Db>,
    dto: JsonBody<RegisterHousekeeperDto>,
) -> Result<Created<MessageResponse>, ApiError> {
    let mut dto = dto.validated()?;
    dto.email = dto.email.trim().to_lowercase();

    let existing = db
        .housekeepers()
        .find_one(doc! { "email": &dto.email }, None)
        .await
        .map_err(|e| ApiError::storage("Failed to check email", e))?;
    if existing.is_some() {
        return Err(ApiError::bad_request("Email already registered"));
    }

    let password_hash = hash_password(dto.password.clone()).await?;
    let housekeeper = Housekeeper::register(dto, password_hash);

    let result = db
        .housekeepers()
        .insert_one(&housekeeper, None)
        .await
        .map_err(|e| ApiError::storage("Failed to create housekeeper", e))?;
    let id = inserted_id(result)?;

    log::info!("Housekeeper registered: {}", id);
    Ok(Created(MessageResponse::with_id(
        "Housekeeper registered successfully",
        id,
    )))
}

#[openapi(tag = "Auth")]
#[post("/auth/register/employer", data = "<dto>")]
pub async fn register_employer(
    db: &State<Db>,
    dto: JsonBody<RegisterEmployerDto>,
) -> Result<Created<MessageResponse>, ApiError> {
    let mut dto = dto.validated()?;
    dto.email = dto.email.trim().to_lowercase();

    let existing = db
        .employers()
        .find_one(doc! { "email": &dto.email }, None)
        .await
        .map_err(|e| ApiError::storage("Failed to check email", e))?;
    if existing.is_some() {
        return Err(ApiError::bad_request("Email already registered"));
    }

    let password_hash = hash_password(dto.password.clone()).await?;
    let employer = Employer::register(dto, password_hash);

    let result = db
        .employers()
        .insert_one(&employer, None)
        .await
        .map_err(|e| ApiError::storage("Failed to create employer", e))?;
    let id = inserted_id(result)?;

    log::info!("Employer registered: {}", id);
    Ok(Created(MessageResponse::with_id(
        "Employer registered successfully",
        id,
    )))
}

/// --------------------
/// Login
/// --------------------
#[openapi(tag = "Auth")]
#[post("/auth/login", data = "<dto>")]
pub async fn login(
    db: &State<Db>,
    jwt: &State<JwtService>,
    dto: JsonBody<LoginDto>,
) -> Result<Json<TokenResponse>, ApiError> {
    let dto = dto.validated()?;
    let email = dto.email.trim().to_lowercase();

    // (id, stored hash) from the collection named by user_type
    let account = match dto.user_type {
        UserRole::Housekeeper => db
            .housekeepers()
            .find_one(doc! { "email": &email }, None)
            .await
            .map(|found| found.and_then(|h| h.id.map(|id| (id, h.password)))),
        UserRole::Employer => db
            .employers()
            .find_one(doc! { "email": &email }, None)
            .await
            .map(|found| found.and_then(|e| e.id.map(|id| (id, e.password)))),
    }
    .map_err(|e| ApiError::storage("Failed to look up account", e))?;

    let Some((id, password_hash)) = account else {
        return Err(ApiError::unauthorized(INVALID_CREDENTIALS));
    };

    if !verify_password(dto.password, password_hash).await? {
        return Err(ApiError::unauthorized(INVALID_CREDENTIALS));
    }

    let token = jwt
        .issue_token(&id, dto.user_type)
        .map_err(|e| ApiError::storage("Failed to issue token", e))?;

    Ok(Json(TokenResponse { token }))
}
