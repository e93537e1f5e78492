use mongodb::bson::oid::ObjectId;
use rocket::http::Status;
use rocket::response::{self, Responder, Response};
use rocket::serde::json::Json;
use rocket::Request;
use rocket_okapi::okapi::Map;
use rocket_okapi::okapi::openapi3::{MediaType, Response as OpenApiResponse, Responses};
use rocket_okapi::okapi::schemars::JsonSchema;
use rocket_okapi::r#gen::OpenApiGenerator;
use rocket_okapi::response::OpenApiResponderInner;
use serde::Serialize;
use std::io::Cursor;
use validator::ValidationErrors;

/// -----------------------------
/// Response bodies
/// -----------------------------
#[derive(Debug, Serialize, JsonSchema)]
pub struct MessageResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl MessageResponse {
    pub fn with_id(message: impl Into<String>, id: ObjectId) -> Self {
        MessageResponse {
            message: message.into(),
            id: Some(id.to_hex()),
        }
    }
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        ErrorBody { error: error.into() }
    }
}

/// Message left in the request-local cache by a failing guard, picked up by
/// the catcher that renders the error body.
#[derive(Debug, Default)]
pub struct GuardFailure(pub Option<String>);

impl GuardFailure {
    pub fn record(req: &Request<'_>, message: impl Into<String>) {
        let message = message.into();
        req.local_cache(|| GuardFailure(Some(message)));
    }

    pub fn message<'a>(req: &'a Request<'_>, fallback: &'a str) -> &'a str {
        req.local_cache(GuardFailure::default)
            .0
            .as_deref()
            .unwrap_or(fallback)
    }
}

/// -----------------------------
/// API Error
/// -----------------------------
#[derive(Debug)]
pub struct ApiError {
    pub status: Status,
    pub message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError {
            status: Status::BadRequest,
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError {
            status: Status::Unauthorized,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError {
            status: Status::NotFound,
            message: message.into(),
        }
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        ApiError {
            status: Status::InternalServerError,
            message: message.into(),
        }
    }

    /// Logs the upstream failure and hides its detail from the caller.
    pub fn storage(context: &str, err: impl std::fmt::Display) -> Self {
        log::error!("{}: {}", context, err);
        ApiError::internal_error(context)
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        let mut fields: Vec<&str> = errors.field_errors().into_keys().collect();
        fields.sort_unstable();
        ApiError::bad_request(format!("Invalid or missing fields: {}", fields.join(", ")))
    }
}

/// -----------------------------
/// Rocket Responders
/// -----------------------------
impl<'r> Responder<'r, 'static> for ApiError {
    fn respond_to(self, _: &'r Request<'_>) -> response::Result<'static> {
        let body = serde_json::to_string(&ErrorBody::new(self.message))
            .unwrap_or_else(|_| r#"{"error":"Internal error"}"#.to_string());

        Response::build()
            .status(self.status)
            .header(rocket::http::ContentType::JSON)
            .sized_body(body.len(), Cursor::new(body))
            .ok()
    }
}

/// JSON body answered with `201 Created`.
#[derive(Debug)]
pub struct Created<T>(pub T);

impl<'r, T: Serialize> Responder<'r, 'static> for Created<T> {
    fn respond_to(self, req: &'r Request<'_>) -> response::Result<'static> {
        Response::build_from(Json(self.0).respond_to(req)?)
            .status(Status::Created)
            .ok()
    }
}

/// -----------------------------
/// OpenAPI integration
/// -----------------------------
impl OpenApiResponderInner for ApiError {
    fn responses(generator: &mut OpenApiGenerator) -> rocket_okapi::Result<Responses> {
        let schema = generator.json_schema::<ErrorBody>();

        let mut content = Map::new();
        content.insert(
            "application/json".to_owned(),
            MediaType {
                schema: Some(schema),
                ..Default::default()
            },
        );

        let mut responses = Responses::default();

        for (code, description) in [
            ("400", "Bad request"),
            ("401", "Unauthorized"),
            ("404", "Not found"),
            ("500", "Internal server error"),
        ] {
            responses.responses.insert(
                code.to_string(),
                rocket_okapi::okapi::openapi3::RefOr::Object(OpenApiResponse {
                    description: description.to_string(),
                    content: content.clone(),
                    ..Default::default()
                }),
            );
        }

        Ok(responses)
    }
}

impl<T: Serialize + JsonSchema + Send> OpenApiResponderInner for Created<T> {
    fn responses(generator: &mut OpenApiGenerator) -> rocket_okapi::Result<Responses> {
        let mut responses = <Json<T> as OpenApiResponderInner>::responses(generator)?;
        if let Some(ok) = responses.responses.remove("200") {
            responses.responses.insert("201".to_owned(), ok);
        }
        Ok(responses)
    }
}
